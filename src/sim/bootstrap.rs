//! Well-known classes installed into every [`SimRuntime`].

use narcissus_core::{
    HostError, HostRuntime, Modifiers, PrimitiveKind, PrimitiveValue, ReturnValue,
    Slot,
};

use super::class::ClassBuilder;
use super::runtime::{CLASS, OBJECT, STRING, THROWABLE};
use super::{ArrayElements, SimRuntime, arg_ref, receiver};

const PUBLIC: Modifiers = Modifiers::PUBLIC;
const PUBLIC_STATIC: Modifiers = Modifiers::PUBLIC.union(Modifiers::STATIC);
const PUBLIC_STATIC_FINAL: Modifiers = PUBLIC_STATIC.union(Modifiers::FINAL);
const PRIVATE_FINAL: Modifiers = Modifiers::PRIVATE.union(Modifiers::FINAL);

/// Internal name of the boxed wrapper of `kind`.
pub(crate) fn wrapper_name(kind: PrimitiveKind) -> String {
    format!("java/lang/{}", kind.boxed_name())
}

fn object_result(obj: Option<narcissus_core::ObjectRef>) -> Result<ReturnValue, HostError> {
    Ok(ReturnValue::Reference(obj))
}

pub(super) fn install(rt: &SimRuntime) -> Result<(), HostError> {
    install_object(rt)?;
    install_class(rt)?;

    rt.define(
        ClassBuilder::new("java/lang/CharSequence")
            .interface()
            .abstract_method("length", &[], "int", PUBLIC),
    )?;
    rt.define(
        ClassBuilder::new("java/lang/Comparable")
            .interface()
            .abstract_method("compareTo", &[OBJECT], "int", PUBLIC),
    )?;
    install_string(rt)?;

    rt.define(ClassBuilder::new("java/lang/Number").abstract_class())?;
    for kind in PrimitiveKind::VALUE_KINDS {
        install_wrapper(rt, kind)?;
    }

    let void = rt.define(
        ClassBuilder::new("java/lang/Void")
            .modifiers(PUBLIC | Modifiers::FINAL)
            .field("TYPE", CLASS, PUBLIC_STATIC_FINAL)
            .constructor(&[], Modifiers::PRIVATE, |_, _, _| Ok(ReturnValue::Void)),
    )?;
    let void_class = rt.class_object(rt.type_named("void"));
    rt.set_static(void, "TYPE", Slot::Reference(Some(void_class)))?;

    install_throwables(rt)
}

fn install_object(rt: &SimRuntime) -> Result<(), HostError> {
    rt.define(
        ClassBuilder::new(OBJECT)
            .method("hashCode", &[], "int", PUBLIC, |_, this, _| {
                let hash = receiver(this)?.index as i32;
                Ok(ReturnValue::Primitive(PrimitiveValue::Int(hash)))
            })
            .method("equals", &[OBJECT], "boolean", PUBLIC, |_, this, args| {
                let same = this.is_some() && this == arg_ref(args, 0)?;
                Ok(ReturnValue::Primitive(PrimitiveValue::Boolean(same)))
            })
            .method("toString", &[], STRING, PUBLIC, |rt, this, _| {
                let this = receiver(this)?;
                let ty = rt.runtime_type(this)?;
                let text = format!("{}@{:x}", rt.type_name(ty), this.index);
                object_result(Some(rt.new_string(&text)?))
            }),
    )?;
    Ok(())
}

fn install_class(rt: &SimRuntime) -> Result<(), HostError> {
    rt.define(
        ClassBuilder::new(CLASS)
            .modifiers(PUBLIC | Modifiers::FINAL)
            .method("getComponentType", &[], CLASS, PUBLIC, |rt, this, _| {
                let ty = rt.class_target(receiver(this)?)?;
                let component = rt.array_component(ty).map(|c| rt.class_object(c));
                object_result(component)
            })
            .method("getName", &[], STRING, PUBLIC, |rt, this, _| {
                let ty = rt.class_target(receiver(this)?)?;
                object_result(Some(rt.new_string(&rt.type_name(ty))?))
            })
            .constructor(&[], Modifiers::PRIVATE, |_, _, _| Ok(ReturnValue::Void)),
    )?;
    Ok(())
}

fn utf16(rt: &SimRuntime, string: narcissus_core::ObjectRef) -> Result<Vec<u16>, HostError> {
    match rt.read(string, "value")? {
        Slot::Reference(Some(chars)) => match rt.array_elements(chars)? {
            ArrayElements::Primitive(narcissus_core::PrimitiveArray::Char(units)) => Ok(units),
            _ => Err(HostError::invalid_operand(
                "string",
                "corrupt character data",
            )),
        },
        _ => Ok(Vec::new()),
    }
}

fn install_string(rt: &SimRuntime) -> Result<(), HostError> {
    rt.define(
        ClassBuilder::new(STRING)
            .modifiers(PUBLIC | Modifiers::FINAL)
            .implements("java/lang/CharSequence")
            .implements("java/lang/Comparable")
            .field("value", "[C", PRIVATE_FINAL)
            .constructor(&["[C"], PUBLIC, |rt, this, args| {
                rt.write(receiver(this)?, "value", Slot::Reference(arg_ref(args, 0)?))?;
                Ok(ReturnValue::Void)
            })
            .method("length", &[], "int", PUBLIC, |rt, this, _| {
                let len = utf16(rt, receiver(this)?)?.len();
                Ok(ReturnValue::Primitive(PrimitiveValue::Int(len as i32)))
            })
            .method("isEmpty", &[], "boolean", PUBLIC, |rt, this, _| {
                let empty = utf16(rt, receiver(this)?)?.is_empty();
                Ok(ReturnValue::Primitive(PrimitiveValue::Boolean(empty)))
            })
            .method("compareTo", &[OBJECT], "int", PUBLIC, |rt, this, args| {
                let other = arg_ref(args, 0)?
                    .ok_or_else(|| HostError::invalid_operand("compareTo", "null argument"))?;
                let ordering = utf16(rt, receiver(this)?)?.cmp(&utf16(rt, other)?);
                Ok(ReturnValue::Primitive(PrimitiveValue::Int(ordering as i32)))
            })
            .method("equals", &[OBJECT], "boolean", PUBLIC, |rt, this, args| {
                let this = receiver(this)?;
                let string = rt.type_named(STRING);
                let equal = match arg_ref(args, 0)? {
                    Some(other) if rt.runtime_type(other)? == string => {
                        utf16(rt, this)? == utf16(rt, other)?
                    }
                    _ => false,
                };
                Ok(ReturnValue::Primitive(PrimitiveValue::Boolean(equal)))
            })
            .method("toString", &[], STRING, PUBLIC, |_, this, _| {
                object_result(Some(receiver(this)?))
            }),
    )?;
    Ok(())
}

fn install_wrapper(rt: &SimRuntime, kind: PrimitiveKind) -> Result<(), HostError> {
    let name = wrapper_name(kind);
    let primitive = kind.name();
    let numeric = !matches!(kind, PrimitiveKind::Char | PrimitiveKind::Boolean);

    let mut builder = ClassBuilder::new(&name)
        .modifiers(PUBLIC | Modifiers::FINAL)
        .field("TYPE", CLASS, PUBLIC_STATIC_FINAL)
        .field("value", primitive, PRIVATE_FINAL)
        .constructor(&[primitive], PUBLIC, |rt, this, args| {
            let value = args
                .first()
                .copied()
                .ok_or_else(|| HostError::invalid_operand("<init>", "missing value"))?;
            rt.write(receiver(this)?, "value", value)?;
            Ok(ReturnValue::Void)
        })
        .method(
            &format!("{primitive}Value"),
            &[],
            primitive,
            PUBLIC,
            |rt, this, _| Ok(rt.read(receiver(this)?, "value")?.into()),
        )
        .method("valueOf", &[primitive], &name, PUBLIC_STATIC, move |rt, _, args| {
            match args.first() {
                Some(Slot::Primitive(value)) if value.kind() == kind => {
                    object_result(Some(rt.new_boxed(*value)?))
                }
                _ => Err(HostError::invalid_operand(
                    "valueOf",
                    format!("expected a {kind} argument"),
                )),
            }
        });
    if numeric {
        builder = builder.extends("java/lang/Number");
    }
    let ty = rt.define(builder)?;

    let class_object = rt.class_object(rt.type_named(primitive));
    rt.set_static(ty, "TYPE", Slot::Reference(Some(class_object)))?;
    Ok(())
}

fn install_throwables(rt: &SimRuntime) -> Result<(), HostError> {
    let throwable = |name: &str, superclass: Option<&str>| {
        let mut builder = ClassBuilder::new(name)
            .constructor(&[], PUBLIC, |_, _, _| Ok(ReturnValue::Void))
            .constructor(&[STRING], PUBLIC, |rt, this, args| {
                let message = Slot::Reference(arg_ref(args, 0)?);
                rt.write(receiver(this)?, "message", message)?;
                Ok(ReturnValue::Void)
            });
        if let Some(superclass) = superclass {
            builder = builder.extends(superclass);
        }
        builder
    };

    rt.define(
        throwable(THROWABLE, None)
            .field("message", STRING, Modifiers::PRIVATE)
            .method("getMessage", &[], STRING, PUBLIC, |rt, this, _| {
                Ok(rt.read(receiver(this)?, "message")?.into())
            }),
    )?;
    rt.define(throwable("java/lang/Exception", Some(THROWABLE)))?;
    rt.define(throwable(
        "java/lang/RuntimeException",
        Some("java/lang/Exception"),
    ))?;
    Ok(())
}
