//! Core vocabulary for the Narcissus bridge.
//!
//! This crate holds the types shared by the type registry, the call
//! marshaler and the host runtime:
//!
//! - Identities: [`TypeHandle`], [`ObjectRef`], [`AccessorId`], [`CallAddress`]
//! - Kinds and flags: [`PrimitiveKind`], [`Modifiers`]
//! - Values: [`PrimitiveValue`], [`PrimitiveArray`], [`ArgumentValue`], [`Slot`], [`ReturnValue`]
//! - Members: [`MemberDescriptor`], [`MemberKind`]
//! - Call buffers: [`TypedArgumentBuffer`]
//! - Errors: [`BridgeError`] and the per-concern errors it wraps
//! - Host seams: [`HostRuntime`], [`HostAccess`]

mod buffer;
mod error;
mod handle;
mod host;
mod member;
pub mod types;
mod value;

pub use buffer::TypedArgumentBuffer;
pub use error::{
    AccessError, AccessMode, Arity, BridgeError, BridgeResult, FailureKind, HostError,
    MarshalError, Position, RegistryError, ResolutionError,
};
pub use handle::{AccessorId, CallAddress, ObjectRef, TypeHandle};
pub use host::{HostAccess, HostRuntime};
pub use member::{MemberDescriptor, MemberKind};
pub use types::{Modifiers, PrimitiveKind};
pub use value::{ArgumentValue, Primitive, PrimitiveArray, PrimitiveValue, ReturnValue, Slot};
