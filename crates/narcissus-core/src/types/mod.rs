//! Type vocabulary shared by the registry, the marshaler and the host.

mod modifiers;
mod primitive_kind;

pub use modifiers::Modifiers;
pub use primitive_kind::PrimitiveKind;
