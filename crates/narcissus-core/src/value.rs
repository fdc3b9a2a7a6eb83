//! Runtime values crossing the bridge.
//!
//! - [`PrimitiveValue`]: one unboxed primitive, tagged by kind
//! - [`PrimitiveArray`]: a typed array of one primitive kind
//! - [`ArgumentValue`]: one supplied call argument (null, boxed primitive or object)
//! - [`Slot`]: one low-level typed call slot
//! - [`ReturnValue`]: the result of a raw invocation
//!
//! The [`Primitive`] trait connects Rust scalar types to their kinds, so the
//! per-kind accessors of the bridge can be written once as generic functions.
//!
//! ```
//! use narcissus_core::{ArgumentValue, PrimitiveKind, PrimitiveValue};
//!
//! let arg = ArgumentValue::from(3i32);
//! assert_eq!(arg.boxed_kind(), Some(PrimitiveKind::Int));
//! assert_eq!(PrimitiveValue::Int(3).get::<i32>(), Some(3));
//! ```

use std::fmt;

use crate::{ObjectRef, PrimitiveKind};

/// An unboxed primitive value.
///
/// `Char` holds a UTF-16 code unit, matching the host's 16-bit char.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimitiveValue {
    Int(i32),
    Long(i64),
    Short(i16),
    Char(u16),
    Boolean(bool),
    Byte(i8),
    Float(f32),
    Double(f64),
}

impl PrimitiveValue {
    /// The kind of this value. Never `Void`.
    pub const fn kind(&self) -> PrimitiveKind {
        match self {
            PrimitiveValue::Int(_) => PrimitiveKind::Int,
            PrimitiveValue::Long(_) => PrimitiveKind::Long,
            PrimitiveValue::Short(_) => PrimitiveKind::Short,
            PrimitiveValue::Char(_) => PrimitiveKind::Char,
            PrimitiveValue::Boolean(_) => PrimitiveKind::Boolean,
            PrimitiveValue::Byte(_) => PrimitiveKind::Byte,
            PrimitiveValue::Float(_) => PrimitiveKind::Float,
            PrimitiveValue::Double(_) => PrimitiveKind::Double,
        }
    }

    /// Raw bit pattern, zero-extended to 64 bits.
    pub fn to_bits(self) -> u64 {
        match self {
            PrimitiveValue::Int(v) => v as u32 as u64,
            PrimitiveValue::Long(v) => v as u64,
            PrimitiveValue::Short(v) => v as u16 as u64,
            PrimitiveValue::Char(v) => v as u64,
            PrimitiveValue::Boolean(v) => v as u64,
            PrimitiveValue::Byte(v) => v as u8 as u64,
            PrimitiveValue::Float(v) => v.to_bits() as u64,
            PrimitiveValue::Double(v) => v.to_bits(),
        }
    }

    /// Rebuild a value of `kind` from its raw bits.
    ///
    /// Returns `None` for `Void`. High bits beyond the kind's width are ignored.
    pub fn from_bits(kind: PrimitiveKind, bits: u64) -> Option<Self> {
        let value = match kind {
            PrimitiveKind::Int => PrimitiveValue::Int(bits as u32 as i32),
            PrimitiveKind::Long => PrimitiveValue::Long(bits as i64),
            PrimitiveKind::Short => PrimitiveValue::Short(bits as u16 as i16),
            PrimitiveKind::Char => PrimitiveValue::Char(bits as u16),
            PrimitiveKind::Boolean => PrimitiveValue::Boolean(bits & 1 != 0),
            PrimitiveKind::Byte => PrimitiveValue::Byte(bits as u8 as i8),
            PrimitiveKind::Float => PrimitiveValue::Float(f32::from_bits(bits as u32)),
            PrimitiveKind::Double => PrimitiveValue::Double(f64::from_bits(bits)),
            PrimitiveKind::Void => return None,
        };
        Some(value)
    }

    /// Extract as a Rust scalar. Fails if the kind differs; never converts.
    pub fn get<T: Primitive>(self) -> Option<T> {
        T::from_value(self)
    }

    /// The all-zero value of a kind (`0`, `false`, `'\0'`).
    pub fn zero(kind: PrimitiveKind) -> Option<Self> {
        Self::from_bits(kind, 0)
    }
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveValue::Int(v) => write!(f, "{v}"),
            PrimitiveValue::Long(v) => write!(f, "{v}L"),
            PrimitiveValue::Short(v) => write!(f, "(short) {v}"),
            PrimitiveValue::Char(v) => match char::from_u32(u32::from(*v)) {
                Some(c) => write!(f, "{c:?}"),
                None => write!(f, "'\\u{v:04x}'"),
            },
            PrimitiveValue::Boolean(v) => write!(f, "{v}"),
            PrimitiveValue::Byte(v) => write!(f, "(byte) {v}"),
            PrimitiveValue::Float(v) => write!(f, "{v}f"),
            PrimitiveValue::Double(v) => write!(f, "{v}d"),
        }
    }
}

/// A Rust scalar type that corresponds to one primitive kind.
pub trait Primitive: Copy + fmt::Debug + 'static {
    /// The kind this type represents.
    const KIND: PrimitiveKind;

    /// Wrap into a tagged value.
    fn into_value(self) -> PrimitiveValue;

    /// Unwrap a tagged value of exactly this kind.
    fn from_value(value: PrimitiveValue) -> Option<Self>;

    /// Borrow the elements of an array of exactly this kind.
    fn slice_of(array: &PrimitiveArray) -> Option<&[Self]>;

    /// Wrap a vector into a typed array.
    fn into_array(values: Vec<Self>) -> PrimitiveArray;
}

macro_rules! impl_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Primitive for $ty {
                const KIND: PrimitiveKind = PrimitiveKind::$variant;

                fn into_value(self) -> PrimitiveValue {
                    PrimitiveValue::$variant(self)
                }

                fn from_value(value: PrimitiveValue) -> Option<Self> {
                    match value {
                        PrimitiveValue::$variant(v) => Some(v),
                        _ => None,
                    }
                }

                fn slice_of(array: &PrimitiveArray) -> Option<&[Self]> {
                    match array {
                        PrimitiveArray::$variant(v) => Some(v.as_slice()),
                        _ => None,
                    }
                }

                fn into_array(values: Vec<Self>) -> PrimitiveArray {
                    PrimitiveArray::$variant(values)
                }
            }

            impl From<$ty> for PrimitiveValue {
                fn from(value: $ty) -> Self {
                    PrimitiveValue::$variant(value)
                }
            }

            impl From<$ty> for ArgumentValue {
                fn from(value: $ty) -> Self {
                    ArgumentValue::Primitive(PrimitiveValue::$variant(value))
                }
            }

            impl From<Vec<$ty>> for PrimitiveArray {
                fn from(values: Vec<$ty>) -> Self {
                    PrimitiveArray::$variant(values)
                }
            }
        )*
    };
}

impl_primitive!(
    i32 => Int,
    i64 => Long,
    i16 => Short,
    u16 => Char,
    bool => Boolean,
    i8 => Byte,
    f32 => Float,
    f64 => Double,
);

/// A typed array of a single primitive kind.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveArray {
    Int(Vec<i32>),
    Long(Vec<i64>),
    Short(Vec<i16>),
    Char(Vec<u16>),
    Boolean(Vec<bool>),
    Byte(Vec<i8>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

/// Apply the same expression to the inner vector of every array variant.
macro_rules! each_array {
    ($array:expr, $v:ident => $body:expr) => {
        match $array {
            PrimitiveArray::Int($v) => $body,
            PrimitiveArray::Long($v) => $body,
            PrimitiveArray::Short($v) => $body,
            PrimitiveArray::Char($v) => $body,
            PrimitiveArray::Boolean($v) => $body,
            PrimitiveArray::Byte($v) => $body,
            PrimitiveArray::Float($v) => $body,
            PrimitiveArray::Double($v) => $body,
        }
    };
}

impl PrimitiveArray {
    /// Create an empty array of `kind`. Returns `None` for `Void`.
    pub fn with_capacity(kind: PrimitiveKind, capacity: usize) -> Option<Self> {
        let array = match kind {
            PrimitiveKind::Int => PrimitiveArray::Int(Vec::with_capacity(capacity)),
            PrimitiveKind::Long => PrimitiveArray::Long(Vec::with_capacity(capacity)),
            PrimitiveKind::Short => PrimitiveArray::Short(Vec::with_capacity(capacity)),
            PrimitiveKind::Char => PrimitiveArray::Char(Vec::with_capacity(capacity)),
            PrimitiveKind::Boolean => PrimitiveArray::Boolean(Vec::with_capacity(capacity)),
            PrimitiveKind::Byte => PrimitiveArray::Byte(Vec::with_capacity(capacity)),
            PrimitiveKind::Float => PrimitiveArray::Float(Vec::with_capacity(capacity)),
            PrimitiveKind::Double => PrimitiveArray::Double(Vec::with_capacity(capacity)),
            PrimitiveKind::Void => return None,
        };
        Some(array)
    }

    /// Create a zero-filled array of `kind` and length `len`.
    pub fn zeroed(kind: PrimitiveKind, len: usize) -> Option<Self> {
        let mut array = Self::with_capacity(kind, len)?;
        let zero = PrimitiveValue::zero(kind)?;
        for _ in 0..len {
            array.push(zero).ok()?;
        }
        Some(array)
    }

    /// Element kind.
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            PrimitiveArray::Int(_) => PrimitiveKind::Int,
            PrimitiveArray::Long(_) => PrimitiveKind::Long,
            PrimitiveArray::Short(_) => PrimitiveKind::Short,
            PrimitiveArray::Char(_) => PrimitiveKind::Char,
            PrimitiveArray::Boolean(_) => PrimitiveKind::Boolean,
            PrimitiveArray::Byte(_) => PrimitiveKind::Byte,
            PrimitiveArray::Float(_) => PrimitiveKind::Float,
            PrimitiveArray::Double(_) => PrimitiveKind::Double,
        }
    }

    pub fn len(&self) -> usize {
        each_array!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a value of the array's kind.
    ///
    /// A value of any other kind is handed back unchanged.
    pub fn push(&mut self, value: PrimitiveValue) -> Result<(), PrimitiveValue> {
        match (self, value) {
            (PrimitiveArray::Int(v), PrimitiveValue::Int(x)) => v.push(x),
            (PrimitiveArray::Long(v), PrimitiveValue::Long(x)) => v.push(x),
            (PrimitiveArray::Short(v), PrimitiveValue::Short(x)) => v.push(x),
            (PrimitiveArray::Char(v), PrimitiveValue::Char(x)) => v.push(x),
            (PrimitiveArray::Boolean(v), PrimitiveValue::Boolean(x)) => v.push(x),
            (PrimitiveArray::Byte(v), PrimitiveValue::Byte(x)) => v.push(x),
            (PrimitiveArray::Float(v), PrimitiveValue::Float(x)) => v.push(x),
            (PrimitiveArray::Double(v), PrimitiveValue::Double(x)) => v.push(x),
            (_, other) => return Err(other),
        }
        Ok(())
    }

    /// Read element `index`.
    pub fn get(&self, index: usize) -> Option<PrimitiveValue> {
        each_array!(self, v => v.get(index).copied().map(Into::into))
    }

    /// Overwrite element `index`. Fails on a kind mismatch or out-of-bounds index.
    pub fn set(&mut self, index: usize, value: PrimitiveValue) -> bool {
        match (self, value) {
            (PrimitiveArray::Int(v), PrimitiveValue::Int(x)) => replace(v, index, x),
            (PrimitiveArray::Long(v), PrimitiveValue::Long(x)) => replace(v, index, x),
            (PrimitiveArray::Short(v), PrimitiveValue::Short(x)) => replace(v, index, x),
            (PrimitiveArray::Char(v), PrimitiveValue::Char(x)) => replace(v, index, x),
            (PrimitiveArray::Boolean(v), PrimitiveValue::Boolean(x)) => replace(v, index, x),
            (PrimitiveArray::Byte(v), PrimitiveValue::Byte(x)) => replace(v, index, x),
            (PrimitiveArray::Float(v), PrimitiveValue::Float(x)) => replace(v, index, x),
            (PrimitiveArray::Double(v), PrimitiveValue::Double(x)) => replace(v, index, x),
            _ => false,
        }
    }

    /// Iterate over the elements as tagged values.
    pub fn iter(&self) -> impl Iterator<Item = PrimitiveValue> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Borrow the elements as a typed slice.
    pub fn as_slice<T: Primitive>(&self) -> Option<&[T]> {
        T::slice_of(self)
    }
}

fn replace<T>(v: &mut [T], index: usize, x: T) -> bool {
    match v.get_mut(index) {
        Some(slot) => {
            *slot = x;
            true
        }
        None => false,
    }
}

/// One supplied call argument.
///
/// A boxed primitive may arrive either inline as [`ArgumentValue::Primitive`]
/// or as a [`ArgumentValue::Reference`] to a host object whose runtime type
/// is a boxed wrapper; the marshaler accepts both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArgumentValue {
    /// The null value
    Null,
    /// A boxed primitive carried inline
    Primitive(PrimitiveValue),
    /// A host object
    Reference(ObjectRef),
}

impl ArgumentValue {
    /// Check if this is the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, ArgumentValue::Null)
    }

    /// Kind of an inline boxed primitive.
    pub fn boxed_kind(&self) -> Option<PrimitiveKind> {
        match self {
            ArgumentValue::Primitive(v) => Some(v.kind()),
            _ => None,
        }
    }

    /// Human-readable name of the argument's variant.
    pub fn describe(&self) -> &'static str {
        match self {
            ArgumentValue::Null => "null",
            ArgumentValue::Primitive(v) => v.kind().boxed_name(),
            ArgumentValue::Reference(_) => "object",
        }
    }
}

impl From<PrimitiveValue> for ArgumentValue {
    fn from(value: PrimitiveValue) -> Self {
        ArgumentValue::Primitive(value)
    }
}

impl From<ObjectRef> for ArgumentValue {
    fn from(obj: ObjectRef) -> Self {
        ArgumentValue::Reference(obj)
    }
}

impl From<Option<ObjectRef>> for ArgumentValue {
    fn from(obj: Option<ObjectRef>) -> Self {
        match obj {
            Some(obj) => ArgumentValue::Reference(obj),
            None => ArgumentValue::Null,
        }
    }
}

/// One low-level typed call slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot {
    /// An unboxed primitive
    Primitive(PrimitiveValue),
    /// A (nullable) reference
    Reference(Option<ObjectRef>),
}

impl Slot {
    /// Kind of a primitive slot; `None` for a reference slot.
    pub fn kind(&self) -> Option<PrimitiveKind> {
        match self {
            Slot::Primitive(v) => Some(v.kind()),
            Slot::Reference(_) => None,
        }
    }

    /// Extract a primitive slot as a Rust scalar of exactly its kind.
    pub fn as_primitive<T: Primitive>(&self) -> Option<T> {
        match self {
            Slot::Primitive(v) => v.get(),
            Slot::Reference(_) => None,
        }
    }

    /// Extract a reference slot.
    pub fn as_reference(&self) -> Option<Option<ObjectRef>> {
        match self {
            Slot::Reference(r) => Some(*r),
            Slot::Primitive(_) => None,
        }
    }
}

/// The result of a raw invocation or a field read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReturnValue {
    Void,
    Primitive(PrimitiveValue),
    Reference(Option<ObjectRef>),
}

impl ReturnValue {
    pub fn is_void(&self) -> bool {
        matches!(self, ReturnValue::Void)
    }

    /// Extract a primitive result of exactly kind `T`.
    pub fn as_primitive<T: Primitive>(&self) -> Option<T> {
        match self {
            ReturnValue::Primitive(v) => v.get(),
            _ => None,
        }
    }

    /// Extract a reference result.
    pub fn as_reference(&self) -> Option<Option<ObjectRef>> {
        match self {
            ReturnValue::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Kind of the result; `Some(Void)` for void, `None` for references.
    pub fn kind(&self) -> Option<PrimitiveKind> {
        match self {
            ReturnValue::Void => Some(PrimitiveKind::Void),
            ReturnValue::Primitive(v) => Some(v.kind()),
            ReturnValue::Reference(_) => None,
        }
    }
}

impl From<Slot> for ReturnValue {
    fn from(slot: Slot) -> Self {
        match slot {
            Slot::Primitive(v) => ReturnValue::Primitive(v),
            Slot::Reference(r) => ReturnValue::Reference(r),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_round_trip_every_kind() {
        let samples = [
            PrimitiveValue::Int(-7),
            PrimitiveValue::Long(i64::MIN),
            PrimitiveValue::Short(-2),
            PrimitiveValue::Char(0xffff),
            PrimitiveValue::Boolean(true),
            PrimitiveValue::Byte(-128),
            PrimitiveValue::Float(-1.5),
            PrimitiveValue::Double(f64::MAX),
        ];
        for value in samples {
            let back = PrimitiveValue::from_bits(value.kind(), value.to_bits()).unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn nan_bits_preserved() {
        let nan = f32::from_bits(0x7fc0_0001);
        let bits = PrimitiveValue::Float(nan).to_bits();
        let back = PrimitiveValue::from_bits(PrimitiveKind::Float, bits).unwrap();
        match back {
            PrimitiveValue::Float(v) => assert_eq!(v.to_bits(), 0x7fc0_0001),
            other => panic!("expected float, got {other:?}"),
        }
    }

    #[test]
    fn void_has_no_value() {
        assert!(PrimitiveValue::from_bits(PrimitiveKind::Void, 0).is_none());
        let void = PrimitiveArray::with_capacity(PrimitiveKind::Void, 1);
        assert!(void.is_none());
    }

    #[test]
    fn get_never_converts() {
        assert_eq!(PrimitiveValue::Int(5).get::<i32>(), Some(5));
        assert_eq!(PrimitiveValue::Int(5).get::<i64>(), None);
        assert_eq!(PrimitiveValue::Short(5).get::<i32>(), None);
    }

    #[test]
    fn array_push_rejects_other_kinds() {
        let mut array = PrimitiveArray::with_capacity(PrimitiveKind::Long, 2).unwrap();
        assert!(array.push(PrimitiveValue::Long(1)).is_ok());
        let two = PrimitiveValue::Int(2);
        assert_eq!(array.push(two), Err(two));
        assert_eq!(array.as_slice::<i64>(), Some(&[1i64][..]));
        assert_eq!(array.as_slice::<i32>(), None);
    }

    #[test]
    fn array_zeroed_and_set() {
        let mut array = PrimitiveArray::zeroed(PrimitiveKind::Boolean, 3).unwrap();
        assert_eq!(array.len(), 3);
        assert!(array.set(1, PrimitiveValue::Boolean(true)));
        assert!(!array.set(3, PrimitiveValue::Boolean(true)));
        assert!(!array.set(0, PrimitiveValue::Int(1)));
        let values: Vec<_> = array.iter().collect();
        assert_eq!(
            values,
            vec![
                PrimitiveValue::Boolean(false),
                PrimitiveValue::Boolean(true),
                PrimitiveValue::Boolean(false),
            ]
        );
    }

    #[test]
    fn argument_conversions() {
        assert_eq!(
            ArgumentValue::from(2.0f64),
            ArgumentValue::Primitive(PrimitiveValue::Double(2.0))
        );
        assert_eq!(ArgumentValue::from(None::<ObjectRef>), ArgumentValue::Null);
        let obj = ObjectRef::new(1, 0);
        assert_eq!(
            ArgumentValue::from(Some(obj)),
            ArgumentValue::Reference(obj)
        );
        assert_eq!(ArgumentValue::from('x' as u16).describe(), "Character");
    }

    #[test]
    fn slot_accessors() {
        let slot = Slot::Primitive(PrimitiveValue::Byte(4));
        assert_eq!(slot.kind(), Some(PrimitiveKind::Byte));
        assert_eq!(slot.as_primitive::<i8>(), Some(4));
        assert_eq!(slot.as_reference(), None);
        assert_eq!(Slot::Reference(None).as_reference(), Some(None));
    }

    #[test]
    fn display_char() {
        assert_eq!(PrimitiveValue::Char('a' as u16).to_string(), "'a'");
        assert_eq!(PrimitiveValue::Long(3).to_string(), "3L");
    }
}
