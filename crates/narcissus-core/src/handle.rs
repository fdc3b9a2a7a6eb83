//! Opaque identities handed out by the host runtime.
//!
//! The bridge never interprets these values. It compares them for identity
//! and passes them back to the host that produced them:
//!
//! - [`TypeHandle`]: a type (primitive, boxed wrapper, reference or array type)
//! - [`ObjectRef`]: a live object in the host heap
//! - [`AccessorId`]: a resolved host operation (unbox, box, component lookup)
//! - [`CallAddress`]: the resolved low-level address of a field or method
//!
//! # Examples
//!
//! ```
//! use narcissus_core::TypeHandle;
//!
//! let a = TypeHandle::from_name("java/lang/Integer");
//! let b = TypeHandle::from_name("java/lang/Integer");
//! assert_eq!(a, b);
//! assert_ne!(a, TypeHandle::from_name("java/lang/Long"));
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants so that handles derived from the same
/// name in different domains never collide.
mod hash_constants {
    /// Domain marker for type handles
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for accessor ids
    pub const ACCESSOR: u64 = 0x7d3c8b4a92e15f6d;

    /// Domain marker for member call addresses
    pub const MEMBER: u64 = 0x5ea77ffbcdf5f302;

    /// Separator between owner, name and signature
    pub const SEP: u64 = 0x4bc94d6bd06053ad;
}

/// Opaque identifier for a type in the host runtime.
///
/// Two handles compare equal exactly when they denote the same type.
/// Assignability between types is never computed from handles; it is
/// always queried from the host.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHandle(u64);

impl TypeHandle {
    /// Wrap a raw host value.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        TypeHandle(raw)
    }

    /// The raw host value.
    #[inline]
    pub const fn into_raw(self) -> u64 {
        self.0
    }

    /// Derive a deterministic handle from an internal type name.
    ///
    /// Hosts that identify types by name (such as the in-memory runtime)
    /// use this so the same name always maps to the same handle.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHandle(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHandle({:#018x})", self.0)
    }
}

/// Reference to a live object in the host heap.
///
/// The null reference is not representable; nullable positions use
/// `Option<ObjectRef>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Slot index in the host heap
    pub index: u32,
    /// Generation for stale-reference detection
    pub generation: u32,
}

impl ObjectRef {
    /// Create a new object reference.
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}:{}", self.index, self.generation)
    }
}

/// A resolved host operation (for example `Integer.intValue()`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct AccessorId(u64);

impl AccessorId {
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        AccessorId(raw)
    }

    #[inline]
    pub const fn into_raw(self) -> u64 {
        self.0
    }

    /// Derive an accessor id from its owner, name and signature.
    pub fn from_signature(owner: TypeHandle, name: &str, signature: &str) -> Self {
        let hash = member_hash(hash_constants::ACCESSOR, owner, name, signature);
        AccessorId(hash)
    }
}

/// The resolved low-level address of a field or method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct CallAddress(u64);

impl CallAddress {
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        CallAddress(raw)
    }

    #[inline]
    pub const fn into_raw(self) -> u64 {
        self.0
    }

    /// Derive a call address from the member's owner, name and signature.
    pub fn from_signature(owner: TypeHandle, name: &str, signature: &str) -> Self {
        CallAddress(member_hash(hash_constants::MEMBER, owner, name, signature))
    }
}

fn member_hash(domain: u64, owner: TypeHandle, name: &str, signature: &str) -> u64 {
    let mut hash = domain ^ owner.0;
    hash = hash
        .wrapping_mul(hash_constants::SEP)
        .wrapping_add(xxh64(name.as_bytes(), 0));
    hash.wrapping_mul(hash_constants::SEP)
        .wrapping_add(xxh64(signature.as_bytes(), 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_handle_is_deterministic() {
        assert_eq!(
            TypeHandle::from_name("java/lang/String"),
            TypeHandle::from_name("java/lang/String")
        );
        assert_ne!(
            TypeHandle::from_name("java/lang/String"),
            TypeHandle::from_name("java/lang/Object")
        );
    }

    #[test]
    fn raw_round_trip() {
        let handle = TypeHandle::from_raw(0xdead_beef);
        assert_eq!(handle.into_raw(), 0xdead_beef);
    }

    #[test]
    fn accessor_signature_matters() {
        let owner = TypeHandle::from_name("java/lang/Integer");
        let a = AccessorId::from_signature(owner, "valueOf", "(I)Ljava/lang/Integer;");
        let b =
            AccessorId::from_signature(owner, "valueOf", "(Ljava/lang/String;)Ljava/lang/Integer;");
        assert_ne!(a, b);
    }

    #[test]
    fn accessor_and_member_domains_differ() {
        let owner = TypeHandle::from_name("Point");
        let a = AccessorId::from_signature(owner, "x", "I");
        let m = CallAddress::from_signature(owner, "x", "I");
        assert_ne!(a.into_raw(), m.into_raw());
    }

    #[test]
    fn object_ref_display() {
        assert_eq!(ObjectRef::new(3, 1).to_string(), "@3:1");
    }
}
