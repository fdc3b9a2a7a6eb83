//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use narcissus::sim::SimRuntime;
use narcissus::{
    CallAddress, Marshaler, MemberDescriptor, Modifiers, PrimitiveKind, PrimitiveValue,
    RegistryConfig, TypeHandle, TypeRegistry,
};

/// A simulated host with an initialized registry.
pub struct Fixture {
    pub rt: SimRuntime,
    pub registry: TypeRegistry,
}

impl Fixture {
    pub fn new() -> Self {
        let rt = SimRuntime::new();
        let registry = TypeRegistry::with_host(&rt, &RegistryConfig::default())
            .expect("registry should resolve against the simulated host");
        Self { rt, registry }
    }

    pub fn marshaler(&self) -> Marshaler<'_, SimRuntime> {
        Marshaler::from_registry(&self.registry, &self.rt).expect("registry is initialized")
    }

    pub fn ty(&self, name: &str) -> TypeHandle {
        self.rt.type_named(name)
    }

    /// A descriptor for a method of `demo.Target`, without a body.
    pub fn method(&self, params: &[&str], modifiers: Modifiers) -> MemberDescriptor {
        MemberDescriptor::method(
            "target",
            self.ty("demo.Target"),
            modifiers,
            params.iter().map(|p| self.ty(p)).collect(),
            self.ty("void"),
            CallAddress::from_raw(0x7a),
        )
    }

    pub fn variadic(&self, params: &[&str]) -> MemberDescriptor {
        let modifiers = Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::VARARGS;
        self.method(params, modifiers)
    }
}

/// A non-zero sample value of each kind.
pub fn sample(kind: PrimitiveKind) -> PrimitiveValue {
    match kind {
        PrimitiveKind::Int => PrimitiveValue::Int(-42),
        PrimitiveKind::Long => PrimitiveValue::Long(1 << 40),
        PrimitiveKind::Short => PrimitiveValue::Short(-300),
        PrimitiveKind::Char => PrimitiveValue::Char(0x263a),
        PrimitiveKind::Boolean => PrimitiveValue::Boolean(true),
        PrimitiveKind::Byte => PrimitiveValue::Byte(-7),
        PrimitiveKind::Float => PrimitiveValue::Float(1.5),
        PrimitiveKind::Double => PrimitiveValue::Double(-0.25),
        PrimitiveKind::Void => panic!("void has no values"),
    }
}

/// Edge values of each kind, including extremes and NaN.
pub fn edge_values(kind: PrimitiveKind) -> Vec<PrimitiveValue> {
    match kind {
        PrimitiveKind::Int => [i32::MIN, 0, i32::MAX].map(PrimitiveValue::Int).to_vec(),
        PrimitiveKind::Long => [i64::MIN, 0, i64::MAX].map(PrimitiveValue::Long).to_vec(),
        PrimitiveKind::Short => [i16::MIN, 0, i16::MAX].map(PrimitiveValue::Short).to_vec(),
        PrimitiveKind::Char => [0, 0xd800, u16::MAX].map(PrimitiveValue::Char).to_vec(),
        PrimitiveKind::Boolean => [false, true].map(PrimitiveValue::Boolean).to_vec(),
        PrimitiveKind::Byte => [i8::MIN, 0, i8::MAX].map(PrimitiveValue::Byte).to_vec(),
        PrimitiveKind::Float => [f32::MIN, -0.0, f32::NAN, f32::INFINITY]
            .map(PrimitiveValue::Float)
            .to_vec(),
        PrimitiveKind::Double => [f64::MIN_POSITIVE, -0.0, f64::NAN, f64::NEG_INFINITY]
            .map(PrimitiveValue::Double)
            .to_vec(),
        PrimitiveKind::Void => Vec::new(),
    }
}

/// A value kind other than `kind`.
pub fn other_kind(kind: PrimitiveKind) -> PrimitiveKind {
    match kind {
        PrimitiveKind::Int => PrimitiveKind::Long,
        _ => PrimitiveKind::Int,
    }
}
