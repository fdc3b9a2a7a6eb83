//! Packing of variadic tails.

use log::trace;
use narcissus_core::{
    ArgumentValue, HostError, HostRuntime, MarshalError, ObjectRef, Position, PrimitiveArray,
    PrimitiveKind, Slot, TypeHandle,
};

use super::{Checked, Marshaler};

/// A variadic tail that passed its checks and is ready to pack.
pub(super) enum CheckedTail {
    Primitive(PrimitiveArray),
    References(Vec<Checked>),
}

impl<H: HostRuntime + ?Sized> Marshaler<'_, H> {
    /// Check every element of `tail` against `component` without allocating.
    ///
    /// `position` is the 1-based position of the trailing array parameter;
    /// element numbers in errors are 1-based within the tail.
    pub(super) fn check_tail(
        &self,
        component: TypeHandle,
        tail: &[ArgumentValue],
        position: usize,
    ) -> Result<CheckedTail, MarshalError> {
        match self.table.kind_of(component) {
            Some(kind) if !kind.is_void() => self
                .check_primitive_tail(kind, tail, position)
                .map(CheckedTail::Primitive),
            _ => tail
                .iter()
                .enumerate()
                .map(|(index, arg)| self.reference(component, arg, element(position, index)))
                .collect::<Result<Vec<_>, _>>()
                .map(CheckedTail::References),
        }
    }

    /// Allocate the array for a checked tail, boxing deferred primitives.
    pub(super) fn pack_tail(
        &self,
        component: TypeHandle,
        tail: CheckedTail,
        position: usize,
    ) -> Result<ObjectRef, MarshalError> {
        let (len, array) = match tail {
            CheckedTail::Primitive(elements) => {
                let len = elements.len();
                (len, self.host.new_primitive_array(elements)?)
            }
            CheckedTail::References(checked) => {
                let mut elements = Vec::with_capacity(checked.len());
                for arg in checked {
                    let Slot::Reference(obj) = self.commit(arg)? else {
                        return Err(HostError::invalid_operand(
                            "pack",
                            "primitive slot in a reference array",
                        )
                        .into());
                    };
                    elements.push(obj);
                }
                let array = self.host.new_object_array(component, &elements)?;
                (elements.len(), array)
            }
        };
        trace!("packed {len} argument(s) into {array} at {position}");
        Ok(array)
    }

    fn check_primitive_tail(
        &self,
        kind: PrimitiveKind,
        tail: &[ArgumentValue],
        position: usize,
    ) -> Result<PrimitiveArray, MarshalError> {
        let mut elements = PrimitiveArray::with_capacity(kind, tail.len())
            .ok_or_else(|| HostError::invalid_operand("pack", format!("no {kind} arrays")))?;
        for (index, arg) in tail.iter().enumerate() {
            let value = self.unbox_exact(kind, arg, element(position, index))?;
            elements.push(value).map_err(|value| {
                HostError::invalid_operand(
                    "pack",
                    format!("{} value in a {kind} array", value.kind()),
                )
            })?;
        }
        Ok(elements)
    }
}

fn element(position: usize, index: usize) -> Position {
    Position::VariadicElement {
        position,
        element: index + 1,
    }
}
