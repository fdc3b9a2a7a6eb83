//! Member modifier flags.

use bitflags::bitflags;

bitflags! {
    /// Modifier flags of a field, method or constructor.
    ///
    /// The bit values are the host runtime's own, so a raw modifier word
    /// read from reflective metadata converts with [`Modifiers::from_bits_retain`].
    ///
    /// ```
    /// use narcissus_core::Modifiers;
    ///
    /// let m = Modifiers::from_bits_retain(0x0008 | 0x0001);
    /// assert!(m.is_static());
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        /// The only bit the gate checks consult.
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const VOLATILE = 0x0040;
        /// On methods the same bit as `VOLATILE` on fields: variable arity.
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
    }
}

impl Modifiers {
    /// Check the static bit.
    pub fn is_static(self) -> bool {
        self.contains(Modifiers::STATIC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_bit() {
        assert!(Modifiers::STATIC.is_static());
        assert!(!(Modifiers::PUBLIC | Modifiers::FINAL).is_static());
    }

    #[test]
    fn unknown_bits_retained() {
        let m = Modifiers::from_bits_retain(0x1000 | 0x0008);
        assert!(m.is_static());
        assert_eq!(m.bits(), 0x1008);
    }
}
