//! Per-class member index.

use narcissus_core::{BridgeError, BridgeResult, HostAccess, MemberDescriptor, TypeHandle};
use rustc_hash::FxHashMap;

use crate::lookup::{enumerate_fields, enumerate_methods};
use crate::names::internal_name;

/// Methods and fields of one class, indexed by name.
///
/// Built once from [`enumerate_methods`] and [`enumerate_fields`], so it sees
/// inherited members too. When a field is shadowed, the most derived one
/// wins.
#[derive(Debug, Clone)]
pub struct ReflectionCache {
    ty: TypeHandle,
    methods: FxHashMap<String, Vec<MemberDescriptor>>,
    fields: FxHashMap<String, MemberDescriptor>,
}

impl ReflectionCache {
    pub fn new<H: HostAccess + ?Sized>(host: &H, ty: TypeHandle) -> BridgeResult<Self> {
        let mut methods: FxHashMap<String, Vec<MemberDescriptor>> = FxHashMap::default();
        for method in enumerate_methods(host, ty)? {
            methods.entry(method.name.clone()).or_default().push(method);
        }

        let mut fields = FxHashMap::default();
        for field in enumerate_fields(host, ty)? {
            fields.entry(field.name.clone()).or_insert(field);
        }

        Ok(Self {
            ty,
            methods,
            fields,
        })
    }

    /// Build for a class given by source name.
    pub fn for_name<H: HostAccess + ?Sized>(host: &H, name: &str) -> BridgeResult<Self> {
        let ty = host
            .find_class(&internal_name(name))
            .ok_or_else(|| BridgeError::NoSuchClass {
                name: name.to_string(),
            })?;
        Self::new(host, ty)
    }

    pub fn type_handle(&self) -> TypeHandle {
        self.ty
    }

    pub fn field(&self, name: &str) -> Option<&MemberDescriptor> {
        self.fields.get(name)
    }

    /// All overloads named `name`. Empty if there are none.
    pub fn methods(&self, name: &str) -> &[MemberDescriptor] {
        self.methods.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The overload named `name` taking exactly `params`.
    pub fn method(&self, name: &str, params: &[TypeHandle]) -> Option<&MemberDescriptor> {
        self.methods(name)
            .iter()
            .find(|m| m.parameter_types == params)
    }
}

#[cfg(test)]
mod tests {
    use narcissus_core::{FailureKind, Modifiers, ReturnValue};

    use super::*;
    use crate::sim::{ClassBuilder, SimRuntime};

    fn define(rt: &SimRuntime) -> TypeHandle {
        rt.define(
            ClassBuilder::new("demo.Shape")
                .field("id", "int", Modifiers::PRIVATE)
                .field("scale", "double", Modifiers::PROTECTED),
        )
        .unwrap();
        rt.define(
            ClassBuilder::new("demo.Circle")
                .extends("demo.Shape")
                .field("scale", "float", Modifiers::PRIVATE)
                .method("area", &[], "double", Modifiers::PUBLIC, |_, _, _| {
                    Ok(ReturnValue::Primitive(0.0f64.into()))
                })
                .method("area", &["double"], "double", Modifiers::PRIVATE, |_, _, _| {
                    Ok(ReturnValue::Primitive(0.0f64.into()))
                }),
        )
        .unwrap()
    }

    #[test]
    fn indexes_fields_and_overloads() {
        let rt = SimRuntime::new();
        let circle = define(&rt);
        let cache = ReflectionCache::new(&rt, circle).unwrap();

        assert_eq!(cache.type_handle(), circle);
        assert_eq!(cache.methods("area").len(), 2);
        assert!(cache.methods("perimeter").is_empty());
        assert!(cache.method("area", &[rt.type_named("double")]).is_some());
        assert!(cache.method("area", &[rt.type_named("int")]).is_none());
        assert!(cache.method("toString", &[]).is_some());

        assert!(cache.field("id").is_some());
        assert!(cache.field("missing").is_none());
    }

    #[test]
    fn subclass_field_wins() {
        let rt = SimRuntime::new();
        let circle = define(&rt);
        let cache = ReflectionCache::new(&rt, circle).unwrap();

        let scale = cache.field("scale").unwrap();
        assert_eq!(scale.declaring_type, circle);
        assert_eq!(scale.value_type, rt.type_named("float"));
    }

    #[test]
    fn built_by_name() {
        let rt = SimRuntime::new();
        let circle = define(&rt);
        let cache = ReflectionCache::for_name(&rt, "demo.Circle").unwrap();
        assert_eq!(cache.type_handle(), circle);

        let err = ReflectionCache::for_name(&rt, "invalid.class.Name").unwrap_err();
        assert_eq!(err.kind(), FailureKind::Lookup);
    }
}
