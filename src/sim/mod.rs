//! An in-memory reference host.
//!
//! [`SimRuntime`] implements [`HostRuntime`] and [`HostAccess`] over a class
//! table and a generational object heap. It comes with the JVM's well-known
//! classes (`java/lang/Object`, `Class`, `String`, the eight primitive
//! wrappers, `Void`, `Number`, `Throwable` and friends), so a
//! [`TypeRegistry`] initialized with the default [`RegistryConfig`] resolves
//! against it unchanged. Further classes are added with [`ClassBuilder`].
//!
//! Method bodies are plain Rust closures. These helpers unpack their
//! arguments:
//!
//! - [`arg`]: a primitive slot of exactly the requested kind
//! - [`arg_ref`]: a reference slot
//! - [`receiver`]: the non-null receiver of an instance method
//!
//! [`HostRuntime`]: narcissus_core::HostRuntime
//! [`HostAccess`]: narcissus_core::HostAccess
//! [`TypeRegistry`]: narcissus_registry::TypeRegistry
//! [`RegistryConfig`]: narcissus_registry::RegistryConfig

mod bootstrap;
mod class;
mod heap;
mod runtime;

pub use class::{ClassBuilder, MethodBody};
pub use runtime::{ArrayElements, SimRuntime};

use narcissus_core::{HostError, ObjectRef, Primitive, Slot};

/// Primitive argument `index` of a method body.
pub fn arg<T: Primitive>(args: &[Slot], index: usize) -> Result<T, HostError> {
    args.get(index)
        .and_then(Slot::as_primitive::<T>)
        .ok_or_else(|| {
            HostError::invalid_operand("arg", format!("argument {index} is not a {}", T::KIND))
        })
}

/// Reference argument `index` of a method body.
pub fn arg_ref(args: &[Slot], index: usize) -> Result<Option<ObjectRef>, HostError> {
    args.get(index)
        .and_then(Slot::as_reference)
        .ok_or_else(|| {
            HostError::invalid_operand("arg_ref", format!("argument {index} is not a reference"))
        })
}

/// The receiver of an instance method body.
pub fn receiver(this: Option<ObjectRef>) -> Result<ObjectRef, HostError> {
    this.ok_or_else(|| {
        HostError::invalid_operand("receiver", "instance method called without a receiver")
    })
}

#[cfg(test)]
mod tests {
    use narcissus_core::PrimitiveValue;

    use super::*;

    #[test]
    fn arg_helpers() {
        let obj = ObjectRef::new(3, 0);
        let args = [
            Slot::Primitive(PrimitiveValue::Int(7)),
            Slot::Reference(Some(obj)),
            Slot::Reference(None),
        ];
        assert_eq!(arg::<i32>(&args, 0).unwrap(), 7);
        assert!(arg::<i64>(&args, 0).is_err());
        assert!(arg::<i32>(&args, 1).is_err());
        assert!(arg::<i32>(&args, 9).is_err());
        assert_eq!(arg_ref(&args, 1).unwrap(), Some(obj));
        assert_eq!(arg_ref(&args, 2).unwrap(), None);
        assert!(arg_ref(&args, 0).is_err());
        assert!(receiver(None).is_err());
    }
}
