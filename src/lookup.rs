//! Member lookup, ignoring visibility.
//!
//! Methods are searched in the order a virtual call would see them: the
//! class itself, then each superclass, then every implemented interface
//! breadth-first, each interface once. Fields are searched up the
//! superclass chain. Constructors are never inherited, so only the class's
//! own are searched.

use std::collections::VecDeque;

use narcissus_core::{BridgeError, BridgeResult, HostAccess, MemberDescriptor, TypeHandle};
use rustc_hash::FxHashSet;

/// Methods declared by `ty` itself.
pub fn declared_methods<H: HostAccess + ?Sized>(
    host: &H,
    ty: TypeHandle,
) -> BridgeResult<Vec<MemberDescriptor>> {
    Ok(host.declared_methods(ty)?)
}

/// Constructors declared by `ty`.
pub fn declared_constructors<H: HostAccess + ?Sized>(
    host: &H,
    ty: TypeHandle,
) -> BridgeResult<Vec<MemberDescriptor>> {
    Ok(host.declared_constructors(ty)?)
}

/// Fields declared by `ty` itself.
pub fn declared_fields<H: HostAccess + ?Sized>(
    host: &H,
    ty: TypeHandle,
) -> BridgeResult<Vec<MemberDescriptor>> {
    Ok(host.declared_fields(ty)?)
}

/// `ty` followed by its superclasses.
fn class_chain<H: HostAccess + ?Sized>(host: &H, ty: TypeHandle) -> Vec<TypeHandle> {
    let mut chain = vec![ty];
    let mut current = ty;
    while let Some(parent) = host.superclass(current) {
        if chain.contains(&parent) {
            break;
        }
        chain.push(parent);
        current = parent;
    }
    chain
}

/// Types whose declared methods are visible from `ty`, in search order.
///
/// An interface has no superclass chain: its order is itself, then its
/// superinterfaces.
pub fn method_search_order<H: HostAccess + ?Sized>(host: &H, ty: TypeHandle) -> Vec<TypeHandle> {
    let chain = if host.is_interface(ty) {
        vec![ty]
    } else {
        class_chain(host, ty)
    };

    let mut seen: FxHashSet<TypeHandle> = chain.iter().copied().collect();
    let mut queue: VecDeque<TypeHandle> = VecDeque::new();
    for &class in &chain {
        queue.extend(host.interfaces(class));
    }

    let mut order = chain;
    while let Some(interface) = queue.pop_front() {
        if !seen.insert(interface) {
            continue;
        }
        order.push(interface);
        queue.extend(host.interfaces(interface));
    }
    order
}

/// Every method visible from `ty`, in search order. Overridden methods are
/// included once per declaring type.
pub fn enumerate_methods<H: HostAccess + ?Sized>(
    host: &H,
    ty: TypeHandle,
) -> BridgeResult<Vec<MemberDescriptor>> {
    let mut methods = Vec::new();
    for owner in method_search_order(host, ty) {
        methods.extend(host.declared_methods(owner)?);
    }
    Ok(methods)
}

/// The first method named `name` with exactly `params`, in search order.
pub fn find_method<H: HostAccess + ?Sized>(
    host: &H,
    ty: TypeHandle,
    name: &str,
    params: &[TypeHandle],
) -> BridgeResult<MemberDescriptor> {
    for owner in method_search_order(host, ty) {
        if let Some(method) = host
            .declared_methods(owner)?
            .into_iter()
            .find(|m| m.name == name && m.parameter_types == params)
        {
            return Ok(method);
        }
    }
    Err(BridgeError::NoSuchMethod {
        name: format!("{}.{name}", host.type_name(ty)),
    })
}

/// The constructor of `ty` taking exactly `params`. Interfaces have none.
pub fn find_constructor<H: HostAccess + ?Sized>(
    host: &H,
    ty: TypeHandle,
    params: &[TypeHandle],
) -> BridgeResult<MemberDescriptor> {
    let missing = || BridgeError::NoSuchConstructor {
        type_name: host.type_name(ty),
    };
    if host.is_interface(ty) {
        return Err(missing());
    }
    host.declared_constructors(ty)?
        .into_iter()
        .find(|c| c.parameter_types == params)
        .ok_or_else(missing)
}

/// The first field named `name` on `ty` or a superclass.
pub fn find_field<H: HostAccess + ?Sized>(
    host: &H,
    ty: TypeHandle,
    name: &str,
) -> BridgeResult<MemberDescriptor> {
    for owner in class_chain(host, ty) {
        if let Some(field) = host
            .declared_fields(owner)?
            .into_iter()
            .find(|f| f.name == name)
        {
            return Ok(field);
        }
    }
    Err(BridgeError::NoSuchField {
        name: format!("{}.{name}", host.type_name(ty)),
    })
}

/// Every field of `ty` and its superclasses, subclass fields first.
pub fn enumerate_fields<H: HostAccess + ?Sized>(
    host: &H,
    ty: TypeHandle,
) -> BridgeResult<Vec<MemberDescriptor>> {
    let mut fields = Vec::new();
    for owner in class_chain(host, ty) {
        fields.extend(host.declared_fields(owner)?);
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use narcissus_core::{FailureKind, HostRuntime, Modifiers, ReturnValue};

    use super::*;
    use crate::sim::{ClassBuilder, SimRuntime};

    fn hierarchy(rt: &SimRuntime) -> TypeHandle {
        rt.define(ClassBuilder::new("demo.Named").interface().abstract_method(
            "name",
            &[],
            "java.lang.String",
            Modifiers::PUBLIC,
        ))
        .unwrap();
        rt.define(
            ClassBuilder::new("demo.Labelled")
                .interface()
                .implements("demo.Named")
                .abstract_method("label", &[], "java.lang.String", Modifiers::PUBLIC),
        )
        .unwrap();
        rt.define(
            ClassBuilder::new("demo.Base")
                .implements("demo.Named")
                .field("id", "int", Modifiers::PRIVATE)
                .field("tag", "java.lang.String", Modifiers::PRIVATE)
                .method("name", &[], "java.lang.String", Modifiers::PUBLIC, |_, _, _| {
                    Ok(ReturnValue::Reference(None))
                }),
        )
        .unwrap();
        rt.define(
            ClassBuilder::new("demo.Leaf")
                .extends("demo.Base")
                .implements("demo.Labelled")
                .field("tag", "long", Modifiers::PRIVATE)
                .method("size", &["int"], "int", Modifiers::PRIVATE, |_, _, _| {
                    Ok(ReturnValue::Primitive(0i32.into()))
                }),
        )
        .unwrap()
    }

    #[test]
    fn search_order_visits_interfaces_once() {
        let rt = SimRuntime::new();
        let leaf = hierarchy(&rt);

        let order = method_search_order(&rt, leaf);
        let names: Vec<String> = order.iter().map(|&t| rt.type_name(t)).collect();
        assert_eq!(
            names,
            [
                "demo.Leaf",
                "demo.Base",
                "java.lang.Object",
                "demo.Labelled",
                "demo.Named",
            ]
        );
    }

    #[test]
    fn interfaces_have_no_class_chain() {
        let rt = SimRuntime::new();
        hierarchy(&rt);
        let labelled = rt.type_named("demo.Labelled");

        let names: Vec<String> = method_search_order(&rt, labelled)
            .iter()
            .map(|&t| rt.type_name(t))
            .collect();
        assert_eq!(names, ["demo.Labelled", "demo.Named"]);

        let name = find_method(&rt, labelled, "name", &[]).unwrap();
        assert_eq!(name.declaring_type, rt.type_named("demo.Named"));
        assert!(find_method(&rt, labelled, "hashCode", &[]).is_err());

        let err = find_constructor(&rt, labelled, &[]).unwrap_err();
        assert!(matches!(err, BridgeError::NoSuchConstructor { .. }));

        // Superclass and constructors reported for an interface are ignored.
        let odd = rt
            .define(
                ClassBuilder::new("demo.Odd")
                    .interface()
                    .extends("java.lang.Object")
                    .constructor(&[], Modifiers::PUBLIC, |_, _, _| Ok(ReturnValue::Void)),
            )
            .unwrap();
        assert_eq!(rt.superclass(odd), Some(rt.type_named("java.lang.Object")));
        assert_eq!(rt.declared_constructors(odd).unwrap().len(), 1);
        assert_eq!(method_search_order(&rt, odd), [odd]);
        assert!(find_constructor(&rt, odd, &[]).is_err());
    }

    #[test]
    fn methods_found_through_hierarchy() {
        let rt = SimRuntime::new();
        let leaf = hierarchy(&rt);
        let int = rt.type_named("int");

        let size = find_method(&rt, leaf, "size", &[int]).unwrap();
        assert_eq!(size.declaring_type, leaf);
        let name = find_method(&rt, leaf, "name", &[]).unwrap();
        assert_eq!(name.declaring_type, rt.type_named("demo.Base"));
        let label = find_method(&rt, leaf, "label", &[]).unwrap();
        assert_eq!(label.declaring_type, rt.type_named("demo.Labelled"));
        assert!(find_method(&rt, leaf, "hashCode", &[]).is_ok());

        let err = find_method(&rt, leaf, "size", &[]).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Lookup);
        assert!(err.to_string().contains("demo.Leaf.size"));

        let all = enumerate_methods(&rt, leaf).unwrap();
        assert_eq!(all.iter().filter(|m| m.name == "name").count(), 2);
    }

    #[test]
    fn fields_shadow_up_the_chain() {
        let rt = SimRuntime::new();
        let leaf = hierarchy(&rt);

        let tag = find_field(&rt, leaf, "tag").unwrap();
        assert_eq!(tag.declaring_type, leaf);
        let id = find_field(&rt, leaf, "id").unwrap();
        assert_eq!(id.declaring_type, rt.type_named("demo.Base"));
        assert!(find_field(&rt, leaf, "missing").is_err());

        let fields = enumerate_fields(&rt, leaf).unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["tag", "id", "tag"]);
    }

    #[test]
    fn constructors_are_not_inherited() {
        let rt = SimRuntime::new();
        let leaf = hierarchy(&rt);
        let int = rt.type_named("int");

        assert!(find_constructor(&rt, leaf, &[]).is_ok());
        let err = find_constructor(&rt, leaf, &[int]).unwrap_err();
        assert!(matches!(err, BridgeError::NoSuchConstructor { .. }));
        assert_eq!(declared_constructors(&rt, leaf).unwrap().len(), 1);
        assert_eq!(declared_methods(&rt, leaf).unwrap().len(), 1);
        assert_eq!(declared_fields(&rt, leaf).unwrap().len(), 1);
    }
}
