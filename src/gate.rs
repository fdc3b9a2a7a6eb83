//! Pre-access gate checks.
//!
//! Every unchecked operation runs these before touching the host:
//!
//! 1. the descriptor is the kind of member the operation needs
//! 2. the static modifier matches the requested access mode
//! 3. for instance access, the receiver's runtime type is assignable to the
//!    declaring type
//! 4. for typed accessors, the declared field or return type matches
//!
//! All of them report as type mismatches.

use log::debug;
use narcissus_core::{
    AccessError, AccessMode, BridgeError, HostRuntime, MemberDescriptor, MemberKind, ObjectRef,
    PrimitiveKind,
};
use narcissus_registry::PrimitiveTable;

/// What a typed accessor expects the declared value type to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Primitive(PrimitiveKind),
    Reference,
    /// No expectation; any declared type passes
    Any,
}

impl ValueKind {
    fn describe(self) -> &'static str {
        match self {
            ValueKind::Primitive(kind) => kind.name(),
            ValueKind::Reference => "object",
            ValueKind::Any => "any",
        }
    }
}

/// Check the descriptor describes the kind of member the operation needs.
pub fn require_member_kind(
    member: &MemberDescriptor,
    expected: MemberKind,
) -> Result<(), AccessError> {
    if member.kind == expected {
        return Ok(());
    }
    Err(reject(AccessError::WrongMemberKind {
        member: member.name.clone(),
        expected,
        found: member.kind,
    }))
}

/// Check the static modifier against the requested access mode.
pub fn require_mode(member: &MemberDescriptor, expected: AccessMode) -> Result<(), AccessError> {
    if AccessMode::of(member.is_static()) == expected {
        return Ok(());
    }
    Err(reject(AccessError::StaticMismatch {
        member: member.name.clone(),
        kind: member.kind,
        expected,
    }))
}

/// Check that `receiver` is an instance of the member's declaring type.
pub fn require_receiver<H: HostRuntime + ?Sized>(
    host: &H,
    member: &MemberDescriptor,
    receiver: ObjectRef,
) -> Result<(), BridgeError> {
    let runtime = host.runtime_type(receiver)?;
    if host.is_assignable(runtime, member.declaring_type) {
        return Ok(());
    }
    Err(reject(AccessError::ReceiverMismatch {
        member: member.name.clone(),
        kind: member.kind,
        receiver_type: host.type_name(runtime),
        declaring_type: host.type_name(member.declaring_type),
    })
    .into())
}

/// Check a field's declared type against a typed accessor.
pub fn require_field_kind<H: HostRuntime + ?Sized>(
    table: &PrimitiveTable,
    host: &H,
    field: &MemberDescriptor,
    requested: ValueKind,
) -> Result<(), AccessError> {
    if matches_kind(table, field, requested) {
        return Ok(());
    }
    Err(reject(AccessError::FieldKindMismatch {
        field: field.name.clone(),
        declared: host.type_name(field.value_type),
        requested: requested.describe().to_string(),
    }))
}

/// Check a method's declared return type against a typed invoke.
pub fn require_return_kind<H: HostRuntime + ?Sized>(
    table: &PrimitiveTable,
    host: &H,
    method: &MemberDescriptor,
    requested: ValueKind,
) -> Result<(), AccessError> {
    if matches_kind(table, method, requested) {
        return Ok(());
    }
    Err(reject(AccessError::ReturnKindMismatch {
        method: method.name.clone(),
        declared: host.type_name(method.value_type),
        requested: requested.describe().to_string(),
    }))
}

fn matches_kind(table: &PrimitiveTable, member: &MemberDescriptor, requested: ValueKind) -> bool {
    let declared = table.kind_of(member.value_type);
    match requested {
        ValueKind::Any => true,
        ValueKind::Primitive(kind) => declared == Some(kind),
        ValueKind::Reference => declared.is_none(),
    }
}

fn reject(err: AccessError) -> AccessError {
    debug!("gate check failed: {err}");
    err
}
