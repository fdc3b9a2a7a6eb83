//! Typed argument buffer handed to raw invocations.

use std::fmt;

use crate::{ObjectRef, Primitive, Slot};

/// Ordered low-level call slots, one per formal parameter.
///
/// Built fresh by the marshaler for exactly one member and one argument
/// list. After variadic packing its length equals the member's declared
/// arity, never the raw number of supplied arguments.
///
/// ## Typed slot access
///
/// ```
/// use narcissus_core::{PrimitiveValue, Slot, TypedArgumentBuffer};
///
/// let buffer = TypedArgumentBuffer::from_slots(vec![
///     Slot::Primitive(PrimitiveValue::Int(3)),
///     Slot::Primitive(PrimitiveValue::Int(4)),
/// ]);
/// assert_eq!(buffer.arg::<i32>(1), Some(4));
/// assert_eq!(buffer.arg::<i64>(1), None);
/// ```
#[derive(Clone, Default, PartialEq)]
pub struct TypedArgumentBuffer {
    slots: Vec<Slot>,
}

impl TypedArgumentBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
        }
    }

    pub fn from_slots(slots: Vec<Slot>) -> Self {
        Self { slots }
    }

    /// Append the next slot.
    pub fn push(&mut self, slot: Slot) {
        self.slots.push(slot);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Raw slot at `index`.
    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Primitive slot at `index`, as exactly type `T`.
    pub fn arg<T: Primitive>(&self, index: usize) -> Option<T> {
        self.slots.get(index)?.as_primitive()
    }

    /// Reference slot at `index`. The inner `None` is a null reference.
    pub fn reference(&self, index: usize) -> Option<Option<ObjectRef>> {
        self.slots.get(index)?.as_reference()
    }

    pub fn as_slice(&self) -> &[Slot] {
        &self.slots
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Slot> {
        self.slots.iter()
    }

    pub fn into_slots(self) -> Vec<Slot> {
        self.slots
    }
}

impl fmt::Debug for TypedArgumentBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.slots.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a TypedArgumentBuffer {
    type Item = &'a Slot;
    type IntoIter = std::slice::Iter<'a, Slot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}
