//! Narcissus type registry.
//!
//! Resolves the primitive kinds, their boxed wrappers and accessors from a
//! host runtime once, and serves them as a read-only dispatch table.
//!
//! ```ignore
//! let registry = TypeRegistry::with_host(&host, &RegistryConfig::default())?;
//! assert_eq!(registry.kind_of(int_type), Some(PrimitiveKind::Int));
//! ```

mod config;
mod registry;

pub use config::{RegistryConfig, WrapperNames};
pub use registry::{PrimitiveTable, TypeRegistry};
