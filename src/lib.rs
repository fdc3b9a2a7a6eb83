//! Narcissus: unchecked access to a reflective host runtime.
//!
//! Reads and writes fields, invokes methods and allocates instances without
//! the host's visibility checks, while still refusing anything that is not
//! type-correct.
//!
//! ## Layers
//!
//! - [`TypeRegistry`]: resolves each primitive kind's canonical type, boxed
//!   wrapper and unbox accessor once, at startup
//! - [`Marshaler`]: checks a dynamically typed argument list against a
//!   member's parameter types and builds the typed call buffer, packing
//!   variadic tails into arrays
//! - [`gate`]: static/instance, receiver and declared-type checks run before
//!   any access
//! - [`Narcissus`]: the unchecked field/method/constructor operations
//! - [`lookup`] and [`ReflectionCache`]: member lookup regardless of visibility
//! - [`sim`]: an in-memory host implementing [`HostRuntime`] and [`HostAccess`]
//!
//! ## Example
//!
//! ```
//! use narcissus::sim::{ClassBuilder, SimRuntime, arg};
//! use narcissus::{
//!     Modifiers, Narcissus, PrimitiveValue, RegistryConfig, ReturnValue, TypeRegistry,
//! };
//!
//! let rt = SimRuntime::new();
//! let mut registry = TypeRegistry::new();
//! registry.initialize(&rt, &RegistryConfig::default()).unwrap();
//!
//! let calc = rt
//!     .define(ClassBuilder::new("demo.Calc").method(
//!         "sum",
//!         &["int", "int"],
//!         "int",
//!         Modifiers::PRIVATE | Modifiers::STATIC,
//!         |_, _, args| {
//!             Ok(ReturnValue::Primitive((arg::<i32>(args, 0)? + arg::<i32>(args, 1)?).into()))
//!         },
//!     ))
//!     .unwrap();
//!
//! let int = rt.type_named("int");
//! let sum = narcissus::lookup::find_method(&rt, calc, "sum", &[int, int]).unwrap();
//!
//! let n = Narcissus::new(&rt, &registry).unwrap();
//! let three = rt.new_boxed(3i32).unwrap();
//! let total: i32 = n
//!     .invoke_static(&sum, &[three.into(), PrimitiveValue::Int(4).into()])
//!     .unwrap();
//! assert_eq!(total, 7);
//!
//! registry.teardown(&rt);
//! ```

mod access;
pub mod gate;
pub mod logging;
pub mod lookup;
mod marshal;
pub mod names;
mod reflection_cache;
pub mod sim;

pub use access::Narcissus;
pub use marshal::Marshaler;
pub use reflection_cache::ReflectionCache;

pub use narcissus_core::{
    AccessError, AccessMode, AccessorId, ArgumentValue, Arity, BridgeError, BridgeResult,
    CallAddress, FailureKind, HostAccess, HostError, HostRuntime, MarshalError, MemberDescriptor,
    MemberKind, Modifiers, ObjectRef, Position, Primitive, PrimitiveArray, PrimitiveKind,
    PrimitiveValue, RegistryError, ResolutionError, ReturnValue, Slot, TypeHandle,
    TypedArgumentBuffer,
};
pub use narcissus_registry::{PrimitiveTable, RegistryConfig, TypeRegistry, WrapperNames};
