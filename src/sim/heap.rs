//! Generational arena for simulated host objects.

use std::fmt;

use narcissus_core::{CallAddress, ObjectRef, PrimitiveArray, Slot, TypeHandle};
use rustc_hash::FxHashMap;

/// Payload of a heap object.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ObjectData {
    /// Ordinary instance; instance fields keyed by field address
    Instance(FxHashMap<CallAddress, Slot>),
    PrimitiveArray(PrimitiveArray),
    ObjectArray(Vec<Option<ObjectRef>>),
    /// Class object for a type
    Class(TypeHandle),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SimObject {
    pub ty: TypeHandle,
    pub data: ObjectData,
}

/// Object storage with generational indices.
///
/// A freed slot is reused with its generation incremented, so references
/// to the previous occupant are detected as stale.
#[derive(Default)]
pub(crate) struct ObjectHeap {
    slots: Vec<HeapSlot>,
    free_list: Vec<u32>,
}

struct HeapSlot {
    generation: u32,
    value: Option<SimObject>,
}

impl ObjectHeap {
    pub fn allocate(&mut self, object: SimObject) -> ObjectRef {
        if let Some(index) = self.free_list.pop()
            && let Some(slot) = self.slots.get_mut(index as usize)
        {
            slot.value = Some(object);
            return ObjectRef::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(HeapSlot {
            generation: 0,
            value: Some(object),
        });
        ObjectRef::new(index, 0)
    }

    /// Returns `None` if the reference is stale.
    pub fn get(&self, obj: ObjectRef) -> Option<&SimObject> {
        let slot = self.slots.get(obj.index as usize)?;
        if slot.generation != obj.generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, obj: ObjectRef) -> Option<&mut SimObject> {
        let slot = self.slots.get_mut(obj.index as usize)?;
        if slot.generation != obj.generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Free an object. Returns false if the reference was already stale.
    pub fn free(&mut self, obj: ObjectRef) -> bool {
        if let Some(slot) = self.slots.get_mut(obj.index as usize)
            && slot.generation == obj.generation
            && slot.value.is_some()
        {
            slot.value = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free_list.push(obj.index);
            return true;
        }
        false
    }

    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }
}

impl fmt::Debug for ObjectHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHeap")
            .field("slot_count", &self.slots.len())
            .field("free_count", &self.free_list.len())
            .finish()
    }
}
