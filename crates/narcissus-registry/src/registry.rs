//! The primitive type registry.
//!
//! [`TypeRegistry`] resolves, once, the identity of every primitive kind's
//! canonical type, boxed wrapper type and unbox/box accessors, plus the
//! reference supertype and the array component accessor. The result is a
//! [`PrimitiveTable`]: one row per [`PrimitiveKind`], so every kind-specific
//! behaviour is a table lookup instead of a branch chain.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized --initialize()--> Ready --teardown()--> Uninitialized
//! ```
//!
//! Initialization is single-threaded. Once ready, the table is never mutated,
//! so `&TypeRegistry` can be shared freely across threads.

use log::{debug, error, info};
use narcissus_core::{
    AccessorId, HostError, HostRuntime, ObjectRef, PrimitiveKind, PrimitiveValue, RegistryError,
    ResolutionError, TypeHandle,
};
use rustc_hash::FxHashMap;

use crate::RegistryConfig;

// ============================================================================
// Table rows
// ============================================================================

/// Resolved wrapper entities for one value kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WrapperRow {
    boxed: TypeHandle,
    unbox: AccessorId,
    box_value: AccessorId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct KindRow {
    canonical: TypeHandle,
    /// `None` only for `Void`
    wrapper: Option<WrapperRow>,
}

impl KindRow {
    const EMPTY: KindRow = KindRow {
        canonical: TypeHandle::from_raw(0),
        wrapper: None,
    };
}

/// Dispatch table for the nine primitive kinds, indexed by [`PrimitiveKind::index`].
#[derive(Debug, Clone)]
pub struct PrimitiveTable {
    rows: [KindRow; 9],
    by_canonical: FxHashMap<TypeHandle, PrimitiveKind>,
    by_boxed: FxHashMap<TypeHandle, PrimitiveKind>,
    object_type: TypeHandle,
    class_type: TypeHandle,
    component_accessor: AccessorId,
    /// Every long-lived handle acquired during resolution, in acquisition order
    acquired: Vec<TypeHandle>,
}

impl PrimitiveTable {
    /// Primitive kind whose canonical type is `ty`, by identity.
    pub fn kind_of(&self, ty: TypeHandle) -> Option<PrimitiveKind> {
        self.by_canonical.get(&ty).copied()
    }

    /// Primitive kind whose boxed wrapper type is `ty`, by identity.
    pub fn boxed_kind_of(&self, ty: TypeHandle) -> Option<PrimitiveKind> {
        self.by_boxed.get(&ty).copied()
    }

    /// Boxed wrapper type of `kind`. `None` for `Void`.
    pub fn boxed_type_of(&self, kind: PrimitiveKind) -> Option<TypeHandle> {
        self.rows[kind.index()].wrapper.map(|w| w.boxed)
    }

    /// Canonical type of `kind`.
    pub fn canonical_type_of(&self, kind: PrimitiveKind) -> TypeHandle {
        self.rows[kind.index()].canonical
    }

    pub fn void_type(&self) -> TypeHandle {
        self.canonical_type_of(PrimitiveKind::Void)
    }

    /// The reference supertype (`java/lang/Object`).
    pub fn object_type(&self) -> TypeHandle {
        self.object_type
    }

    /// The type of class objects (`java/lang/Class`).
    pub fn class_type(&self) -> TypeHandle {
        self.class_type
    }

    /// Unbox a boxed instance of `kind` through the resolved accessor.
    ///
    /// The caller is responsible for checking that `obj` is exactly of the
    /// boxed type; this only guards against a host returning the wrong kind.
    pub fn unbox<H: HostRuntime + ?Sized>(
        &self,
        host: &H,
        kind: PrimitiveKind,
        obj: ObjectRef,
    ) -> Result<PrimitiveValue, RegistryError> {
        let row = self.rows[kind.index()]
            .wrapper
            .ok_or(RegistryError::NoWrapper(kind))?;
        let value = host.unbox(row.unbox, obj)?;
        if value.kind() != kind {
            return Err(HostError::invalid_operand(
                "unbox",
                format!("accessor for {kind} produced a {} value", value.kind()),
            )
            .into());
        }
        Ok(value)
    }

    /// Box a value through the resolved accessor of its kind.
    pub fn box_value<H: HostRuntime + ?Sized>(
        &self,
        host: &H,
        value: PrimitiveValue,
    ) -> Result<ObjectRef, RegistryError> {
        let kind = value.kind();
        let row = self.rows[kind.index()]
            .wrapper
            .ok_or(RegistryError::NoWrapper(kind))?;
        Ok(host.box_value(row.box_value, value)?)
    }

    /// Component type of an array type, or `None` if `ty` is not an array.
    pub fn component_type<H: HostRuntime + ?Sized>(
        &self,
        host: &H,
        ty: TypeHandle,
    ) -> Option<TypeHandle> {
        host.component_type(self.component_accessor, ty)
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Tracks acquired handles so a failed initialization can release them.
struct Resolver<'h, H: HostRuntime + ?Sized> {
    host: &'h H,
    acquired: Vec<TypeHandle>,
}

impl<'h, H: HostRuntime + ?Sized> Resolver<'h, H> {
    fn new(host: &'h H) -> Self {
        Self {
            host,
            acquired: Vec::new(),
        }
    }

    fn ty(&mut self, name: &str) -> Result<TypeHandle, ResolutionError> {
        let ty = self
            .host
            .resolve_type(name)
            .ok_or_else(|| ResolutionError::MissingType {
                name: name.to_string(),
            })?;
        self.acquired.push(ty);
        Ok(ty)
    }

    fn primitive(
        &mut self,
        kind: PrimitiveKind,
        owner: TypeHandle,
        owner_name: &str,
        field: &str,
    ) -> Result<TypeHandle, ResolutionError> {
        let ty = self
            .host
            .resolve_static_type_field(owner, field)
            .ok_or_else(|| ResolutionError::MissingPrimitive {
                kind,
                owner: owner_name.to_string(),
                field: field.to_string(),
            })?;
        self.acquired.push(ty);
        Ok(ty)
    }

    fn accessor(
        &self,
        owner: TypeHandle,
        owner_name: &str,
        (name, signature): &(String, String),
    ) -> Result<AccessorId, ResolutionError> {
        self.host
            .resolve_accessor(owner, name, signature)
            .ok_or_else(|| ResolutionError::MissingAccessor {
                owner: owner_name.to_string(),
                name: name.clone(),
                signature: signature.clone(),
            })
    }

    fn resolve(&mut self, config: &RegistryConfig) -> Result<PrimitiveTable, ResolutionError> {
        let mut rows = [KindRow::EMPTY; 9];
        let mut by_canonical = FxHashMap::default();
        let mut by_boxed = FxHashMap::default();

        for kind in PrimitiveKind::VALUE_KINDS {
            let names = config
                .wrapper(kind)
                .ok_or_else(|| ResolutionError::MissingType {
                    name: format!("<boxed wrapper for {kind}>"),
                })?;
            let boxed = self.ty(&names.boxed)?;
            let canonical = self.primitive(kind, boxed, &names.boxed, &names.type_field)?;
            let unbox = self.accessor(boxed, &names.boxed, &names.unbox)?;
            let box_value = self.accessor(boxed, &names.boxed, &names.box_value)?;

            debug!("resolved {kind}: canonical {canonical:?}, boxed {boxed:?}");
            rows[kind.index()] = KindRow {
                canonical,
                wrapper: Some(WrapperRow {
                    boxed,
                    unbox,
                    box_value,
                }),
            };
            by_canonical.insert(canonical, kind);
            by_boxed.insert(boxed, kind);
        }

        let (void_owner, void_field) = &config.void_type;
        let owner = self.ty(void_owner)?;
        let void = self.primitive(PrimitiveKind::Void, owner, void_owner, void_field)?;
        rows[PrimitiveKind::Void.index()] = KindRow {
            canonical: void,
            wrapper: None,
        };
        by_canonical.insert(void, PrimitiveKind::Void);

        let object_type = self.ty(&config.object)?;
        let class_type = self.ty(&config.class)?;
        let component_accessor =
            self.accessor(class_type, &config.class, &config.component_accessor)?;

        Ok(PrimitiveTable {
            rows,
            by_canonical,
            by_boxed,
            object_type,
            class_type,
            component_accessor,
            acquired: std::mem::take(&mut self.acquired),
        })
    }

    fn release_all(&mut self) {
        for ty in self.acquired.drain(..).rev() {
            self.host.release_type(ty);
        }
    }
}

// ============================================================================
// TypeRegistry
// ============================================================================

#[derive(Debug, Default)]
enum RegistryState {
    #[default]
    Uninitialized,
    Ready(PrimitiveTable),
}

/// Explicit owner of the resolved primitive table.
///
/// Tests and embedders can hold as many independent registries as they like;
/// nothing here is global.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    state: RegistryState,
}

impl TypeRegistry {
    /// Create an uninitialized registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and initialize a registry in one step.
    pub fn with_host<H: HostRuntime + ?Sized>(
        host: &H,
        config: &RegistryConfig,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.initialize(host, config)?;
        Ok(registry)
    }

    /// Resolve every well-known type and accessor named by `config`.
    ///
    /// On failure every handle acquired so far is released and the registry
    /// stays uninitialized. A resolution failure means the host cannot be
    /// bridged; callers should treat it as fatal.
    pub fn initialize<H: HostRuntime + ?Sized>(
        &mut self,
        host: &H,
        config: &RegistryConfig,
    ) -> Result<(), RegistryError> {
        if self.is_ready() {
            return Err(RegistryError::AlreadyInitialized);
        }

        let mut resolver = Resolver::new(host);
        match resolver.resolve(config) {
            Ok(table) => {
                info!(
                    "type registry initialized ({} handles acquired)",
                    table.acquired.len()
                );
                self.state = RegistryState::Ready(table);
                Ok(())
            }
            Err(err) => {
                error!("type registry initialization failed: {err}");
                resolver.release_all();
                Err(err.into())
            }
        }
    }

    /// Release every handle acquired by [`TypeRegistry::initialize`].
    ///
    /// Idempotent: tearing down an uninitialized registry does nothing.
    pub fn teardown<H: HostRuntime + ?Sized>(&mut self, host: &H) {
        if let RegistryState::Ready(table) = std::mem::take(&mut self.state) {
            debug!("releasing {} registry handles", table.acquired.len());
            for ty in table.acquired.into_iter().rev() {
                host.release_type(ty);
            }
            info!("type registry torn down");
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, RegistryState::Ready(_))
    }

    /// The resolved table.
    pub fn table(&self) -> Result<&PrimitiveTable, RegistryError> {
        match &self.state {
            RegistryState::Ready(table) => Ok(table),
            RegistryState::Uninitialized => Err(RegistryError::NotInitialized),
        }
    }

    /// Primitive kind of a canonical type. `None` for any other type, or
    /// while uninitialized.
    pub fn kind_of(&self, ty: TypeHandle) -> Option<PrimitiveKind> {
        self.table().ok()?.kind_of(ty)
    }

    /// Boxed wrapper type of a value kind.
    pub fn boxed_type_of(&self, kind: PrimitiveKind) -> Option<TypeHandle> {
        self.table().ok()?.boxed_type_of(kind)
    }

    /// Unbox a boxed instance of `kind`.
    pub fn unbox<H: HostRuntime + ?Sized>(
        &self,
        host: &H,
        kind: PrimitiveKind,
        obj: ObjectRef,
    ) -> Result<PrimitiveValue, RegistryError> {
        self.table()?.unbox(host, kind, obj)
    }

    /// Box a value through its kind's wrapper.
    pub fn box_value<H: HostRuntime + ?Sized>(
        &self,
        host: &H,
        value: PrimitiveValue,
    ) -> Result<ObjectRef, RegistryError> {
        self.table()?.box_value(host, value)
    }
}
