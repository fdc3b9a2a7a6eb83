//! Call marshaling.
//!
//! [`Marshaler`] turns a dynamically typed argument list into the typed slot
//! buffer a raw invocation expects, checked against a member's declared
//! parameter types.
//!
//! ## Slot rules
//!
//! Each declared parameter type selects one of two rules:
//!
//! 1. Primitive parameter: the argument must be non-null and boxed to exactly
//!    the parameter's kind. A boxed `Integer` is never accepted for `long`.
//!    The value is unboxed through the type registry.
//! 2. Reference parameter: null is accepted. Anything else must be assignable
//!    to the parameter type, as the host decides. An inline boxed primitive is
//!    boxed through the registry when its wrapper type is assignable.
//!
//! Arguments are checked left to right and the first failure is returned.
//! Positions in errors are 1-based. Nothing is allocated on the host until
//! every argument, variadic tail included, has passed its check.
//!
//! ## Variable arity
//!
//! A member flagged variadic whose last parameter is an array type binds its
//! first `P - 1` arguments positionally and packs the rest into a fresh array
//! of the component type (see [`varargs`]). The tail is always packed, so a
//! single array argument in tail position becomes a one-element array.

mod varargs;

use log::debug;
use narcissus_core::{
    ArgumentValue, Arity, HostError, HostRuntime, MarshalError, MemberDescriptor,
    Position, PrimitiveKind, PrimitiveValue, RegistryError, Slot, TypeHandle,
    TypedArgumentBuffer,
};
use narcissus_registry::{PrimitiveTable, TypeRegistry};

/// Argument marshaler bound to a resolved primitive table and a host.
///
/// Holds only shared references and keeps no per-call state, so one
/// marshaler may be used from many threads at once when the host is `Sync`.
pub struct Marshaler<'a, H: HostRuntime + ?Sized> {
    table: &'a PrimitiveTable,
    host: &'a H,
}

impl<H: HostRuntime + ?Sized> Clone for Marshaler<'_, H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H: HostRuntime + ?Sized> Copy for Marshaler<'_, H> {}

impl<'a, H: HostRuntime + ?Sized> Marshaler<'a, H> {
    pub fn new(table: &'a PrimitiveTable, host: &'a H) -> Self {
        Self { table, host }
    }

    /// Bind to an initialized registry.
    pub fn from_registry(registry: &'a TypeRegistry, host: &'a H) -> Result<Self, RegistryError> {
        Ok(Self::new(registry.table()?, host))
    }

    pub fn table(&self) -> &'a PrimitiveTable {
        self.table
    }

    pub fn host(&self) -> &'a H {
        self.host
    }

    /// Build the typed argument buffer for a call of `member`.
    ///
    /// On success the buffer holds exactly one slot per declared parameter.
    /// On failure nothing has been invoked and nothing has been allocated.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn marshal(
        &self,
        member: &MemberDescriptor,
        args: &[ArgumentValue],
    ) -> Result<TypedArgumentBuffer, MarshalError> {
        let result = self.marshal_inner(member, args);
        if let Err(err) = &result {
            debug!("marshaling arguments for `{}` failed: {err}", member.name);
        }
        result
    }

    fn marshal_inner(
        &self,
        member: &MemberDescriptor,
        args: &[ArgumentValue],
    ) -> Result<TypedArgumentBuffer, MarshalError> {
        let params = &member.parameter_types;

        let Some(component) = self.variadic_component(member) else {
            if args.len() != params.len() {
                return Err(MarshalError::ArityMismatch {
                    expected: Arity::Exactly(params.len()),
                    supplied: args.len(),
                });
            }
            let checked = self.check_positional(params, args)?;
            let mut buffer = TypedArgumentBuffer::with_capacity(params.len());
            for arg in checked {
                buffer.push(self.commit(arg)?);
            }
            return Ok(buffer);
        };

        let fixed = params.len() - 1;
        if args.len() < fixed {
            return Err(MarshalError::ArityMismatch {
                expected: Arity::AtLeast(fixed),
                supplied: args.len(),
            });
        }

        let (positional, tail) = args.split_at(fixed);
        let checked = self.check_positional(params, positional)?;
        let tail = self.check_tail(component, tail, params.len())?;

        let mut buffer = TypedArgumentBuffer::with_capacity(params.len());
        for arg in checked {
            buffer.push(self.commit(arg)?);
        }
        let array = self.pack_tail(component, tail, params.len())?;
        buffer.push(Slot::Reference(Some(array)));
        Ok(buffer)
    }

    /// Validate the value of a single-slot field write and convert it to a
    /// slot, with the same rules as a positional argument.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn check_field_value(
        &self,
        field: &MemberDescriptor,
        value: &ArgumentValue,
    ) -> Result<Slot, MarshalError> {
        let result = self
            .check(field.value_type, value, Position::FieldValue)
            .and_then(|checked| self.commit(checked));
        if let Err(err) = &result {
            debug!("value for field `{}` rejected: {err}", field.name);
        }
        result
    }

    /// Whether a value whose runtime type is `value_type` may be stored where
    /// `declared` is declared.
    ///
    /// A primitive declared type accepts only itself or exactly its boxed
    /// wrapper type; a reference declared type defers to the host.
    pub fn check_assignable(&self, declared: TypeHandle, value_type: TypeHandle) -> bool {
        match self.table.kind_of(declared) {
            Some(PrimitiveKind::Void) => false,
            Some(kind) => {
                value_type == declared || self.table.boxed_type_of(kind) == Some(value_type)
            }
            None => self.host.is_assignable(value_type, declared),
        }
    }

    /// Component type of a variadic member's trailing array parameter.
    ///
    /// `None` for fixed-arity members, including members flagged variadic
    /// whose last parameter is not an array type.
    fn variadic_component(&self, member: &MemberDescriptor) -> Option<TypeHandle> {
        if !member.is_variadic() {
            return None;
        }
        let last = *member.parameter_types.last()?;
        self.table.component_type(self.host, last)
    }

    fn check_positional(
        &self,
        params: &[TypeHandle],
        args: &[ArgumentValue],
    ) -> Result<Vec<Checked>, MarshalError> {
        params
            .iter()
            .zip(args)
            .enumerate()
            .map(|(index, (&declared, arg))| {
                self.check(declared, arg, Position::Argument(index + 1))
            })
            .collect()
    }

    /// Check one argument for a parameter of type `declared`.
    fn check(
        &self,
        declared: TypeHandle,
        arg: &ArgumentValue,
        position: Position,
    ) -> Result<Checked, MarshalError> {
        match self.table.kind_of(declared) {
            Some(PrimitiveKind::Void) => Err(MarshalError::TypeMismatch {
                position,
                expected: PrimitiveKind::Void.name().to_string(),
                found: self.describe(arg)?,
            }),
            Some(kind) => self
                .unbox_exact(kind, arg, position)
                .map(|value| Checked::Ready(Slot::Primitive(value))),
            None => self.reference(declared, arg, position),
        }
    }

    /// Turn a checked argument into its slot, boxing a deferred primitive.
    fn commit(&self, checked: Checked) -> Result<Slot, MarshalError> {
        match checked {
            Checked::Ready(slot) => Ok(slot),
            Checked::Boxed(value) => self
                .table
                .box_value(self.host, value)
                .map(|obj| Slot::Reference(Some(obj)))
                .map_err(registry_failure),
        }
    }

    /// Primitive rule: non-null and boxed to exactly `kind`.
    pub(crate) fn unbox_exact(
        &self,
        kind: PrimitiveKind,
        arg: &ArgumentValue,
        position: Position,
    ) -> Result<PrimitiveValue, MarshalError> {
        match *arg {
            ArgumentValue::Null => Err(MarshalError::NullArgument {
                position,
                expected: kind.boxed_name().to_string(),
            }),
            ArgumentValue::Primitive(value) if value.kind() == kind => Ok(value),
            ArgumentValue::Primitive(value) => Err(MarshalError::TypeMismatch {
                position,
                expected: kind.boxed_name().to_string(),
                found: value.kind().boxed_name().to_string(),
            }),
            ArgumentValue::Reference(obj) => {
                let runtime = self.host.runtime_type(obj)?;
                if self.table.boxed_type_of(kind) != Some(runtime) {
                    return Err(MarshalError::TypeMismatch {
                        position,
                        expected: kind.boxed_name().to_string(),
                        found: self.host.type_name(runtime),
                    });
                }
                self.table
                    .unbox(self.host, kind, obj)
                    .map_err(registry_failure)
            }
        }
    }

    /// Reference rule: null, or assignable to `declared`.
    ///
    /// An inline primitive is only checked here; it is boxed on commit.
    pub(crate) fn reference(
        &self,
        declared: TypeHandle,
        arg: &ArgumentValue,
        position: Position,
    ) -> Result<Checked, MarshalError> {
        match *arg {
            ArgumentValue::Null => Ok(Checked::Ready(Slot::Reference(None))),
            ArgumentValue::Reference(obj) => {
                let runtime = self.host.runtime_type(obj)?;
                if self.host.is_assignable(runtime, declared) {
                    Ok(Checked::Ready(Slot::Reference(Some(obj))))
                } else {
                    let found = self.host.type_name(runtime);
                    Err(self.mismatch(declared, found, position))
                }
            }
            ArgumentValue::Primitive(value) => {
                let kind = value.kind();
                match self.table.boxed_type_of(kind) {
                    Some(boxed) if self.host.is_assignable(boxed, declared) => {
                        Ok(Checked::Boxed(value))
                    }
                    _ => {
                        let found = kind.boxed_name().to_string();
                        Err(self.mismatch(declared, found, position))
                    }
                }
            }
        }
    }

    fn mismatch(&self, declared: TypeHandle, found: String, position: Position) -> MarshalError {
        MarshalError::TypeMismatch {
            position,
            expected: self.host.type_name(declared),
            found,
        }
    }

    fn describe(&self, arg: &ArgumentValue) -> Result<String, MarshalError> {
        Ok(match *arg {
            ArgumentValue::Reference(obj) => self.host.type_name(self.host.runtime_type(obj)?),
            other => other.describe().to_string(),
        })
    }
}

/// An argument that passed its check.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Checked {
    Ready(Slot),
    /// Inline primitive bound for a reference slot, boxed on commit
    Boxed(PrimitiveValue),
}

/// Registry failures while marshaling can only come from the host.
fn registry_failure(err: RegistryError) -> MarshalError {
    match err {
        RegistryError::Host(err) => MarshalError::Host(err),
        other => MarshalError::Host(HostError::other(other.to_string())),
    }
}
