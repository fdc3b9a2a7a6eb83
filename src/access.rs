//! Unchecked field, method and constructor access.
//!
//! [`Narcissus`] forwards to the host's raw accessor primitives, bypassing
//! visibility entirely. What it does not bypass is type safety: every
//! operation runs the [gate checks](crate::gate) and, for anything that takes
//! arguments or a value, the [`Marshaler`], before the host is called.
//!
//! The typed operations (`get_field::<i32>`, `invoke_static::<f64>`, ...)
//! replace a per-kind function family with one generic operation each.
//! The `*_value` and `invoke_method` forms dispatch on the member's declared
//! type instead.

use log::debug;
use narcissus_core::{
    AccessMode, ArgumentValue, BridgeError, BridgeResult, HostAccess, HostError,
    MemberDescriptor, MemberKind, ObjectRef, Primitive, PrimitiveKind, RegistryError,
    ReturnValue, Slot, TypeHandle,
};
use narcissus_registry::{PrimitiveTable, TypeRegistry};

use crate::gate::{self, ValueKind};
use crate::marshal::Marshaler;
use crate::names::internal_name;

/// Visibility-bypassing access to a host.
pub struct Narcissus<'h, H: HostAccess + ?Sized> {
    host: &'h H,
    table: &'h PrimitiveTable,
}

impl<H: HostAccess + ?Sized> Clone for Narcissus<'_, H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H: HostAccess + ?Sized> Copy for Narcissus<'_, H> {}

impl<'h, H: HostAccess + ?Sized> Narcissus<'h, H> {
    /// Bind to a host and an initialized registry.
    ///
    /// Fails with [`RegistryError::NotInitialized`] if the registry is not
    /// ready, so nothing can run against a host that failed to resolve.
    pub fn new(host: &'h H, registry: &'h TypeRegistry) -> Result<Self, RegistryError> {
        Ok(Self::with_table(host, registry.table()?))
    }

    pub fn with_table(host: &'h H, table: &'h PrimitiveTable) -> Self {
        Self { host, table }
    }

    pub fn host(&self) -> &'h H {
        self.host
    }

    pub fn table(&self) -> &'h PrimitiveTable {
        self.table
    }

    pub fn marshaler(&self) -> Marshaler<'h, H> {
        Marshaler::new(self.table, self.host)
    }

    // ========================================================================
    // Classes and instances
    // ========================================================================

    /// Find a class by source name, e.g. `java.util.List`, `int[]` or
    /// `com.xyz.MyClass[][]`.
    pub fn find_class(&self, name: &str) -> BridgeResult<TypeHandle> {
        let internal = internal_name(name);
        self.host.find_class(&internal).ok_or_else(|| {
            debug!("class lookup failed for `{name}` (`{internal}`)");
            BridgeError::NoSuchClass {
                name: name.to_string(),
            }
        })
    }

    /// Allocate an instance without running any constructor.
    pub fn allocate_instance(&self, ty: TypeHandle) -> BridgeResult<ObjectRef> {
        Ok(self.host.allocate_instance(ty)?)
    }

    /// Raise `throwable` in the host, whether or not any caller declares it.
    pub fn throw_throwable(&self, throwable: ObjectRef) -> BridgeResult<()> {
        Ok(self.host.throw(throwable)?)
    }

    /// Allocate an instance and run `constructor` on it.
    ///
    /// If the constructor body fails the instance is handed back through
    /// [`HostAccess::release_instance`]. A variadic tail packed for the call
    /// is left to the host.
    pub fn construct(
        &self,
        constructor: &MemberDescriptor,
        args: &[ArgumentValue],
    ) -> BridgeResult<ObjectRef> {
        gate::require_member_kind(constructor, MemberKind::Constructor)?;
        let buffer = self.marshaler().marshal(constructor, args)?;
        let obj = self.host.allocate_instance(constructor.declaring_type)?;
        if let Err(err) = self.host.invoke(Some(obj), constructor, &buffer) {
            if !self.host.release_instance(obj) {
                let name = &constructor.name;
                debug!("constructor `{name}` failed; {obj} left to the host");
            }
            return Err(err.into());
        }
        Ok(obj)
    }

    // ========================================================================
    // Field reads
    // ========================================================================

    pub fn get_field<T: Primitive>(
        &self,
        obj: ObjectRef,
        field: &MemberDescriptor,
    ) -> BridgeResult<T> {
        let slot = self.read(Some(obj), field, ValueKind::Primitive(T::KIND))?;
        primitive_of(slot, field)
    }

    pub fn get_static_field<T: Primitive>(&self, field: &MemberDescriptor) -> BridgeResult<T> {
        let slot = self.read(None, field, ValueKind::Primitive(T::KIND))?;
        primitive_of(slot, field)
    }

    pub fn get_object_field(
        &self,
        obj: ObjectRef,
        field: &MemberDescriptor,
    ) -> BridgeResult<Option<ObjectRef>> {
        let slot = self.read(Some(obj), field, ValueKind::Reference)?;
        reference_of(slot, field)
    }

    pub fn get_static_object_field(
        &self,
        field: &MemberDescriptor,
    ) -> BridgeResult<Option<ObjectRef>> {
        let slot = self.read(None, field, ValueKind::Reference)?;
        reference_of(slot, field)
    }

    /// Read a field of any declared type.
    pub fn get_field_value(&self, obj: ObjectRef, field: &MemberDescriptor) -> BridgeResult<Slot> {
        self.read(Some(obj), field, ValueKind::Any)
    }

    /// Read a static field of any declared type.
    pub fn get_static_field_value(&self, field: &MemberDescriptor) -> BridgeResult<Slot> {
        self.read(None, field, ValueKind::Any)
    }

    // ========================================================================
    // Field writes
    // ========================================================================

    pub fn set_field<T: Primitive>(
        &self,
        obj: ObjectRef,
        field: &MemberDescriptor,
        value: T,
    ) -> BridgeResult<()> {
        self.field_gate(Some(obj), field, ValueKind::Primitive(T::KIND))?;
        Ok(self
            .host
            .set_field(Some(obj), field, Slot::Primitive(value.into_value()))?)
    }

    pub fn set_static_field<T: Primitive>(
        &self,
        field: &MemberDescriptor,
        value: T,
    ) -> BridgeResult<()> {
        self.field_gate(None, field, ValueKind::Primitive(T::KIND))?;
        Ok(self
            .host
            .set_field(None, field, Slot::Primitive(value.into_value()))?)
    }

    /// Write a reference field. The value must be null or assignable to the
    /// field's declared type.
    pub fn set_object_field(
        &self,
        obj: ObjectRef,
        field: &MemberDescriptor,
        value: Option<ObjectRef>,
    ) -> BridgeResult<()> {
        self.write(Some(obj), field, &value.into(), ValueKind::Reference)
    }

    pub fn set_static_object_field(
        &self,
        field: &MemberDescriptor,
        value: Option<ObjectRef>,
    ) -> BridgeResult<()> {
        self.write(None, field, &value.into(), ValueKind::Reference)
    }

    /// Write a field of any declared type, with the marshaler's single-slot
    /// rules: exactly the boxed type for a primitive field, null or an
    /// assignable value for a reference field.
    pub fn set_field_value(
        &self,
        obj: ObjectRef,
        field: &MemberDescriptor,
        value: ArgumentValue,
    ) -> BridgeResult<()> {
        self.write(Some(obj), field, &value, ValueKind::Any)
    }

    pub fn set_static_field_value(
        &self,
        field: &MemberDescriptor,
        value: ArgumentValue,
    ) -> BridgeResult<()> {
        self.write(None, field, &value, ValueKind::Any)
    }

    // ========================================================================
    // Method invocation
    // ========================================================================

    /// Invoke an instance method of any return type.
    pub fn invoke_method(
        &self,
        obj: ObjectRef,
        method: &MemberDescriptor,
        args: &[ArgumentValue],
    ) -> BridgeResult<ReturnValue> {
        self.call(Some(obj), method, args, ValueKind::Any)
    }

    /// Invoke a static method of any return type.
    pub fn invoke_static_method(
        &self,
        method: &MemberDescriptor,
        args: &[ArgumentValue],
    ) -> BridgeResult<ReturnValue> {
        self.call(None, method, args, ValueKind::Any)
    }

    pub fn invoke<T: Primitive>(
        &self,
        obj: ObjectRef,
        method: &MemberDescriptor,
        args: &[ArgumentValue],
    ) -> BridgeResult<T> {
        let result = self.call(Some(obj), method, args, ValueKind::Primitive(T::KIND))?;
        primitive_of(result, method)
    }

    pub fn invoke_static<T: Primitive>(
        &self,
        method: &MemberDescriptor,
        args: &[ArgumentValue],
    ) -> BridgeResult<T> {
        let result = self.call(None, method, args, ValueKind::Primitive(T::KIND))?;
        primitive_of(result, method)
    }

    pub fn invoke_object(
        &self,
        obj: ObjectRef,
        method: &MemberDescriptor,
        args: &[ArgumentValue],
    ) -> BridgeResult<Option<ObjectRef>> {
        let result = self.call(Some(obj), method, args, ValueKind::Reference)?;
        reference_of(result, method)
    }

    pub fn invoke_static_object(
        &self,
        method: &MemberDescriptor,
        args: &[ArgumentValue],
    ) -> BridgeResult<Option<ObjectRef>> {
        let result = self.call(None, method, args, ValueKind::Reference)?;
        reference_of(result, method)
    }

    pub fn invoke_void(
        &self,
        obj: ObjectRef,
        method: &MemberDescriptor,
        args: &[ArgumentValue],
    ) -> BridgeResult<()> {
        let void = ValueKind::Primitive(PrimitiveKind::Void);
        self.call(Some(obj), method, args, void)?;
        Ok(())
    }

    pub fn invoke_static_void(
        &self,
        method: &MemberDescriptor,
        args: &[ArgumentValue],
    ) -> BridgeResult<()> {
        let void = ValueKind::Primitive(PrimitiveKind::Void);
        self.call(None, method, args, void)?;
        Ok(())
    }

    // ========================================================================
    // Shared paths
    // ========================================================================

    /// Member kind, then access mode, then receiver, then declared type.
    fn gate(
        &self,
        receiver: Option<ObjectRef>,
        member: &MemberDescriptor,
        kind: MemberKind,
        requested: ValueKind,
    ) -> BridgeResult<()> {
        gate::require_member_kind(member, kind)?;
        gate::require_mode(member, AccessMode::of(receiver.is_none()))?;
        if let Some(obj) = receiver {
            gate::require_receiver(self.host, member, obj)?;
        }
        match kind {
            MemberKind::Field => {
                gate::require_field_kind(self.table, self.host, member, requested)?
            }
            _ => gate::require_return_kind(self.table, self.host, member, requested)?,
        }
        Ok(())
    }

    fn field_gate(
        &self,
        receiver: Option<ObjectRef>,
        field: &MemberDescriptor,
        requested: ValueKind,
    ) -> BridgeResult<()> {
        self.gate(receiver, field, MemberKind::Field, requested)
    }

    fn read(
        &self,
        receiver: Option<ObjectRef>,
        field: &MemberDescriptor,
        requested: ValueKind,
    ) -> BridgeResult<Slot> {
        self.field_gate(receiver, field, requested)?;
        Ok(self.host.get_field(receiver, field)?)
    }

    fn write(
        &self,
        receiver: Option<ObjectRef>,
        field: &MemberDescriptor,
        value: &ArgumentValue,
        requested: ValueKind,
    ) -> BridgeResult<()> {
        self.field_gate(receiver, field, requested)?;
        let slot = self.marshaler().check_field_value(field, value)?;
        Ok(self.host.set_field(receiver, field, slot)?)
    }

    fn call(
        &self,
        receiver: Option<ObjectRef>,
        method: &MemberDescriptor,
        args: &[ArgumentValue],
        requested: ValueKind,
    ) -> BridgeResult<ReturnValue> {
        self.gate(receiver, method, MemberKind::Method, requested)?;
        let buffer = self.marshaler().marshal(method, args)?;
        Ok(self.host.invoke(receiver, method, &buffer)?)
    }
}

fn primitive_of<T: Primitive>(
    value: impl Into<ReturnValue>,
    member: &MemberDescriptor,
) -> BridgeResult<T> {
    let value = value.into();
    value.as_primitive::<T>().ok_or_else(|| {
        HostError::invalid_operand(
            "access",
            format!("`{}` produced {value:?}, not a {}", member.name, T::KIND),
        )
        .into()
    })
}

fn reference_of(
    value: impl Into<ReturnValue>,
    member: &MemberDescriptor,
) -> BridgeResult<Option<ObjectRef>> {
    let value = value.into();
    value.as_reference().ok_or_else(|| {
        HostError::invalid_operand(
            "access",
            format!("`{}` produced {value:?}, not a reference", member.name),
        )
        .into()
    })
}
