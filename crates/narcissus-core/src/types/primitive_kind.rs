//! Primitive type kinds of the host object runtime.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Primitive type kinds.
///
/// The discriminant of each kind is its one-character type descriptor, so
/// `PrimitiveKind::try_from(b'J')` yields [`PrimitiveKind::Long`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum PrimitiveKind {
    Int = b'I',
    Long = b'J',
    Short = b'S',
    Char = b'C',
    Boolean = b'Z',
    Byte = b'B',
    Float = b'F',
    Double = b'D',
    Void = b'V',
}

impl PrimitiveKind {
    /// All nine kinds, in registry order.
    pub const ALL: [PrimitiveKind; 9] = [
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Short,
        PrimitiveKind::Char,
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
        PrimitiveKind::Void,
    ];

    /// The eight kinds that have a boxed wrapper (everything but `Void`).
    pub const VALUE_KINDS: [PrimitiveKind; 8] = [
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Short,
        PrimitiveKind::Char,
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    /// Source-level name of the primitive type.
    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Void => "void",
        }
    }

    /// Simple name of the boxed wrapper, as used in diagnostics
    /// ("expected Integer").
    pub const fn boxed_name(self) -> &'static str {
        match self {
            PrimitiveKind::Int => "Integer",
            PrimitiveKind::Long => "Long",
            PrimitiveKind::Short => "Short",
            PrimitiveKind::Char => "Character",
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::Double => "Double",
            PrimitiveKind::Void => "Void",
        }
    }

    /// One-character type descriptor.
    pub fn descriptor(self) -> char {
        char::from(u8::from(self))
    }

    /// Look up a kind by its source-level name (`"int"`, `"boolean"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Position of this kind in [`PrimitiveKind::ALL`].
    pub const fn index(self) -> usize {
        match self {
            PrimitiveKind::Int => 0,
            PrimitiveKind::Long => 1,
            PrimitiveKind::Short => 2,
            PrimitiveKind::Char => 3,
            PrimitiveKind::Boolean => 4,
            PrimitiveKind::Byte => 5,
            PrimitiveKind::Float => 6,
            PrimitiveKind::Double => 7,
            PrimitiveKind::Void => 8,
        }
    }

    /// Check if this is the `Void` marker kind.
    pub const fn is_void(self) -> bool {
        matches!(self, PrimitiveKind::Void)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
