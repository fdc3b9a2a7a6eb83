//! Read-only views of fields, methods and constructors.

use std::fmt;

use crate::{CallAddress, Modifiers, TypeHandle};

/// What kind of member a descriptor describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Method,
    Constructor,
}

impl MemberKind {
    pub const fn name(self) -> &'static str {
        match self {
            MemberKind::Field => "field",
            MemberKind::Method => "method",
            MemberKind::Constructor => "constructor",
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Externally supplied view of a field, method or constructor.
///
/// Built by the host's reflective metadata and only ever read by the bridge.
/// `value_type` is the field type for fields, the return type for methods,
/// and the void type for constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberDescriptor {
    pub name: String,
    pub kind: MemberKind,
    pub declaring_type: TypeHandle,
    pub modifiers: Modifiers,
    pub parameter_types: Vec<TypeHandle>,
    pub value_type: TypeHandle,
    pub address: CallAddress,
}

impl MemberDescriptor {
    /// Describe a field.
    pub fn field(
        name: impl Into<String>,
        declaring_type: TypeHandle,
        modifiers: Modifiers,
        field_type: TypeHandle,
        address: CallAddress,
    ) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Field,
            declaring_type,
            modifiers,
            parameter_types: Vec::new(),
            value_type: field_type,
            address,
        }
    }

    /// Describe a method.
    pub fn method(
        name: impl Into<String>,
        declaring_type: TypeHandle,
        modifiers: Modifiers,
        parameter_types: Vec<TypeHandle>,
        return_type: TypeHandle,
        address: CallAddress,
    ) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Method,
            declaring_type,
            modifiers,
            parameter_types,
            value_type: return_type,
            address,
        }
    }

    /// Describe a constructor. Constructors are never static.
    pub fn constructor(
        declaring_type: TypeHandle,
        modifiers: Modifiers,
        parameter_types: Vec<TypeHandle>,
        void_type: TypeHandle,
        address: CallAddress,
    ) -> Self {
        Self {
            name: "<init>".to_string(),
            kind: MemberKind::Constructor,
            declaring_type,
            modifiers: modifiers - Modifiers::STATIC,
            parameter_types,
            value_type: void_type,
            address,
        }
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }

    pub fn is_field(&self) -> bool {
        self.kind == MemberKind::Field
    }

    /// Number of declared formal parameters (0 for fields).
    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }

    /// Whether the host marked this callable as variable-arity.
    ///
    /// The marshaler additionally requires the last parameter to be an
    /// array type before it packs a tail.
    pub fn is_variadic(&self) -> bool {
        self.kind != MemberKind::Field
            && self.modifiers.contains(Modifiers::VARARGS)
            && !self.parameter_types.is_empty()
    }

    /// Field type of a field descriptor.
    pub fn field_type(&self) -> Option<TypeHandle> {
        self.is_field().then_some(self.value_type)
    }

    /// Return type of a method descriptor.
    pub fn return_type(&self) -> Option<TypeHandle> {
        (self.kind == MemberKind::Method).then_some(self.value_type)
    }
}
