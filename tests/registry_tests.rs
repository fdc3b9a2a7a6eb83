//! Type registry lifecycle against the simulated host.

use narcissus::sim::SimRuntime;
use narcissus::{
    FailureKind, HostRuntime, PrimitiveKind, PrimitiveValue, RegistryConfig, RegistryError,
    ResolutionError, TypeRegistry,
};

/// Boxed type and static `TYPE` per value kind, plus `Void`, `Void.TYPE`,
/// `Object` and `Class`.
const HANDLES_PER_REGISTRY: usize = 8 * 2 + 4;

#[test]
fn identifies_canonical_types() {
    let rt = SimRuntime::new();
    let registry = TypeRegistry::with_host(&rt, &RegistryConfig::default()).unwrap();

    for kind in PrimitiveKind::ALL {
        assert_eq!(registry.kind_of(rt.type_named(kind.name())), Some(kind));
    }
    for kind in PrimitiveKind::VALUE_KINDS {
        let boxed = registry.boxed_type_of(kind).unwrap();
        let expected = format!("java.lang.{}", kind.boxed_name());
        assert_eq!(rt.type_name(boxed), expected);
        assert_eq!(registry.kind_of(boxed), None);
    }
    assert_eq!(registry.boxed_type_of(PrimitiveKind::Void), None);
    assert_eq!(registry.kind_of(rt.type_named("java.lang.String")), None);
}

#[test]
fn lifecycle_pins_and_releases() {
    let rt = SimRuntime::new();
    let mut registry = TypeRegistry::new();
    assert!(!registry.is_ready());
    assert_eq!(registry.kind_of(rt.type_named("int")), None);
    assert!(matches!(
        registry.table(),
        Err(RegistryError::NotInitialized)
    ));

    let config = RegistryConfig::default();
    registry.initialize(&rt, &config).unwrap();
    assert!(registry.is_ready());
    assert_eq!(rt.pinned_types(), HANDLES_PER_REGISTRY);

    let err = registry.initialize(&rt, &config).unwrap_err();
    assert_eq!(err, RegistryError::AlreadyInitialized);
    assert_eq!(rt.pinned_types(), HANDLES_PER_REGISTRY);

    registry.teardown(&rt);
    assert!(!registry.is_ready());
    assert_eq!(rt.pinned_types(), 0);

    registry.teardown(&rt);
    assert_eq!(rt.pinned_types(), 0);

    registry.initialize(&rt, &config).unwrap();
    let double = rt.type_named("double");
    assert_eq!(registry.kind_of(double), Some(PrimitiveKind::Double));
    registry.teardown(&rt);
}

#[test]
fn independent_registries_share_a_host() {
    let rt = SimRuntime::new();
    let mut first = TypeRegistry::with_host(&rt, &RegistryConfig::default()).unwrap();
    let mut second = TypeRegistry::with_host(&rt, &RegistryConfig::default()).unwrap();
    assert_eq!(rt.pinned_types(), 2 * HANDLES_PER_REGISTRY);

    first.teardown(&rt);
    assert_eq!(rt.pinned_types(), HANDLES_PER_REGISTRY);
    assert!(second.is_ready());
    second.teardown(&rt);
    assert_eq!(rt.pinned_types(), 0);
}

#[test]
fn missing_type_is_a_resolution_failure() {
    let rt = SimRuntime::new();
    let config = RegistryConfig::default().with_object_name("core/Any");
    let mut registry = TypeRegistry::new();

    let err = registry.initialize(&rt, &config).unwrap_err();
    assert_eq!(err.kind(), FailureKind::ResolutionFailure);
    assert_eq!(
        err,
        RegistryError::Resolution(ResolutionError::MissingType {
            name: "core/Any".to_string()
        })
    );
    assert!(!registry.is_ready());
    assert_eq!(rt.pinned_types(), 0);

    registry.teardown(&rt);
    assert_eq!(rt.pinned_types(), 0);
}

#[test]
fn missing_accessor_releases_everything() {
    let rt = SimRuntime::new();
    let config = RegistryConfig::default()
        .with_unbox_accessor(PrimitiveKind::Short, "asShort", "()S");

    let err = TypeRegistry::with_host(&rt, &config).unwrap_err();
    let RegistryError::Resolution(ResolutionError::MissingAccessor { ref name, .. }) = err else {
        panic!("expected a missing accessor, got {err:?}");
    };
    assert_eq!(name, "asShort");
    assert!(err.to_string().contains("java/lang/Short.asShort()S"));
    assert_eq!(rt.pinned_types(), 0);
}

#[test]
fn renamed_wrapper_must_exist() {
    let rt = SimRuntime::new();
    let config = RegistryConfig::default().with_boxed_name(PrimitiveKind::Byte, "core/BoxedByte");
    let err = TypeRegistry::with_host(&rt, &config).unwrap_err();
    assert_eq!(err.kind(), FailureKind::ResolutionFailure);
    assert!(err.to_string().contains("core/BoxedByte"));
}

#[test]
fn unbox_uses_the_resolved_accessor() {
    let rt = SimRuntime::new();
    let registry = TypeRegistry::with_host(&rt, &RegistryConfig::default()).unwrap();

    let boxed = rt.new_boxed('x' as u16).unwrap();
    assert_eq!(
        registry.unbox(&rt, PrimitiveKind::Char, boxed).unwrap(),
        PrimitiveValue::Char('x' as u16)
    );

    let err = registry.unbox(&rt, PrimitiveKind::Void, boxed).unwrap_err();
    assert_eq!(err, RegistryError::NoWrapper(PrimitiveKind::Void));
}
