//! Host collaborator traits.
//!
//! The bridge never owns an object model of its own. Everything it needs to
//! know about types, objects and members is queried through these traits:
//!
//! - [`HostRuntime`]: the queries the type registry and the call marshaler
//!   depend on (type resolution, runtime types, assignability, boxing,
//!   array allocation)
//! - [`HostAccess`]: the raw, unchecked accessor primitives the forwarding
//!   layer calls once every gate check and the marshaler have passed
//!
//! Both take `&self`; a host with mutable state uses interior mutability.
//! Results are never cached by the bridge beyond what the type registry
//! resolves at initialization.

use crate::{
    AccessorId, HostError, MemberDescriptor, ObjectRef, PrimitiveArray, PrimitiveValue,
    ReturnValue, Slot, TypeHandle, TypedArgumentBuffer,
};

/// Queries used by the type registry and the call marshaler.
pub trait HostRuntime {
    // === Resolution (registry initialization) ===

    /// Resolve a type by internal name (`"java/lang/Integer"`), acquiring a
    /// long-lived handle that must later be given to [`HostRuntime::release_type`].
    fn resolve_type(&self, name: &str) -> Option<TypeHandle>;

    /// Read a static type-valued field, such as `Integer.TYPE`, acquiring a
    /// long-lived handle.
    fn resolve_static_type_field(&self, owner: TypeHandle, field: &str) -> Option<TypeHandle>;

    /// Resolve an operation of `owner` by name and signature.
    fn resolve_accessor(&self, owner: TypeHandle, name: &str, signature: &str)
    -> Option<AccessorId>;

    /// Release a long-lived handle acquired during resolution.
    fn release_type(&self, ty: TypeHandle);

    // === Queries ===

    /// Runtime type of a live object.
    fn runtime_type(&self, obj: ObjectRef) -> Result<TypeHandle, HostError>;

    /// Whether a value of type `from` may be stored where `to` is declared.
    fn is_assignable(&self, from: TypeHandle, to: TypeHandle) -> bool;

    /// Component type of an array type, through the resolved component accessor.
    /// `None` when `array_type` is not an array type.
    fn component_type(&self, accessor: AccessorId, array_type: TypeHandle) -> Option<TypeHandle>;

    /// Printable name of a type, for diagnostics.
    fn type_name(&self, ty: TypeHandle) -> String;

    // === Boxing ===

    /// Call a resolved unbox accessor on a boxed instance.
    fn unbox(&self, accessor: AccessorId, obj: ObjectRef) -> Result<PrimitiveValue, HostError>;

    /// Call a resolved box accessor, producing a new boxed instance.
    fn box_value(&self, accessor: AccessorId, value: PrimitiveValue)
    -> Result<ObjectRef, HostError>;

    // === Arrays ===

    /// Allocate a primitive array holding `elements`.
    fn new_primitive_array(&self, elements: PrimitiveArray) -> Result<ObjectRef, HostError>;

    /// Allocate an array of `component` holding `elements` (null where `None`).
    fn new_object_array(
        &self,
        component: TypeHandle,
        elements: &[Option<ObjectRef>],
    ) -> Result<ObjectRef, HostError>;
}

/// Raw accessor primitives, performed without any visibility or type checks.
///
/// `receiver` is `None` for static members, which are addressed through
/// their declaring type.
pub trait HostAccess: HostRuntime {
    /// Find a class by internal name (`"a/b/C"`, `"[La/b/C;"`, `"[I"`).
    fn find_class(&self, internal_name: &str) -> Option<TypeHandle>;

    /// Allocate an instance without running any constructor.
    fn allocate_instance(&self, ty: TypeHandle) -> Result<ObjectRef, HostError>;

    /// Drop an instance nothing else can reach yet. Returns `false` when the
    /// host leaves it to its collector.
    fn release_instance(&self, _obj: ObjectRef) -> bool {
        false
    }

    /// Raise a throwable in the host.
    fn throw(&self, throwable: ObjectRef) -> Result<(), HostError>;

    /// Read a field.
    fn get_field(
        &self,
        receiver: Option<ObjectRef>,
        field: &MemberDescriptor,
    ) -> Result<Slot, HostError>;

    /// Write a field.
    fn set_field(
        &self,
        receiver: Option<ObjectRef>,
        field: &MemberDescriptor,
        value: Slot,
    ) -> Result<(), HostError>;

    /// Invoke a method or run a constructor on `receiver` with marshaled arguments.
    fn invoke(
        &self,
        receiver: Option<ObjectRef>,
        method: &MemberDescriptor,
        args: &TypedArgumentBuffer,
    ) -> Result<ReturnValue, HostError>;

    // === Reflective metadata, ignoring visibility ===

    fn declared_methods(&self, ty: TypeHandle) -> Result<Vec<MemberDescriptor>, HostError>;

    fn declared_constructors(&self, ty: TypeHandle) -> Result<Vec<MemberDescriptor>, HostError>;

    fn declared_fields(&self, ty: TypeHandle) -> Result<Vec<MemberDescriptor>, HostError>;

    fn superclass(&self, ty: TypeHandle) -> Option<TypeHandle>;

    fn interfaces(&self, ty: TypeHandle) -> Vec<TypeHandle>;

    fn is_interface(&self, ty: TypeHandle) -> bool;
}
