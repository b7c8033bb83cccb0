//! Operand sizes.
//!
//! `Size` is the runtime descriptor; `ByteSize`, `WordSize` and `LongSize`
//! are the type-level markers that operand accessors and handlers are
//! generic over. Values are carried as `u32` and masked to the size.

use std::fmt::Debug;

/// Operation size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    /// 8-bit byte.
    Byte,
    /// 16-bit word.
    Word,
    /// 32-bit long.
    Long,
}

impl Size {
    /// Get size from the standard 2-bit encoding (00=byte, 01=word, 10=long).
    #[must_use]
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0x03 {
            0 => Some(Self::Byte),
            1 => Some(Self::Word),
            2 => Some(Self::Long),
            _ => None,
        }
    }

    /// The 2-bit encoding used in bits 7-6 of most opcodes.
    #[must_use]
    pub const fn bits(self) -> u16 {
        match self {
            Self::Byte => 0,
            Self::Word => 1,
            Self::Long => 2,
        }
    }

    /// Number of bytes for this size.
    #[must_use]
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
            Self::Long => 4,
        }
    }

    /// Bytes occupied in the instruction stream or on the stack.
    ///
    /// Bytes are word-aligned: an immediate byte takes a full extension
    /// word, and `(A7)+` / `-(A7)` move the stack pointer by 2.
    #[must_use]
    pub const fn aligned_bytes(self) -> u32 {
        match self {
            Self::Byte | Self::Word => 2,
            Self::Long => 4,
        }
    }

    /// MSB mask for this size.
    #[must_use]
    pub const fn msb_mask(self) -> u32 {
        match self {
            Self::Byte => 0x80,
            Self::Word => 0x8000,
            Self::Long => 0x8000_0000,
        }
    }

    /// Value mask for this size.
    #[must_use]
    pub const fn mask(self) -> u32 {
        match self {
            Self::Byte => 0xFF,
            Self::Word => 0xFFFF,
            Self::Long => 0xFFFF_FFFF,
        }
    }

    /// Truncate a value to this size (zero-extended).
    #[must_use]
    pub const fn truncate(self, value: u32) -> u32 {
        value & self.mask()
    }

    /// Sign-extend the low bits of `value` to 32 bits.
    #[must_use]
    pub const fn sign_extend(self, value: u32) -> u32 {
        match self {
            Self::Byte => value as u8 as i8 as i32 as u32,
            Self::Word => value as u16 as i16 as i32 as u32,
            Self::Long => value,
        }
    }

    /// True if the sign bit of this size is set.
    #[must_use]
    pub const fn is_negative(self, value: u32) -> bool {
        value & self.msb_mask() != 0
    }

    /// Replace the low bits of `register` with `value`, keeping the rest.
    #[must_use]
    pub const fn merge(self, register: u32, value: u32) -> u32 {
        (register & !self.mask()) | (value & self.mask())
    }
}

/// Type-level operand size.
pub trait OperandSize: Copy + Debug + Default + Send + Sync + 'static {
    /// The runtime descriptor for this size.
    const SIZE: Size;
}

/// Sizes at which an address register can be an operand.
///
/// The 68000 has no byte-sized address register access, so only word and
/// long implement this.
pub trait WideSize: OperandSize {}

/// Byte marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteSize;

/// Word marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordSize;

/// Long marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LongSize;

impl OperandSize for ByteSize {
    const SIZE: Size = Size::Byte;
}

impl OperandSize for WordSize {
    const SIZE: Size = Size::Word;
}

impl OperandSize for LongSize {
    const SIZE: Size = Size::Long;
}

impl WideSize for WordSize {}
impl WideSize for LongSize {}

#[cfg(test)]
mod tests {
    use super::Size;

    #[test]
    fn sign_extension_per_width() {
        assert_eq!(Size::Byte.sign_extend(0x80), 0xFFFF_FF80);
        assert_eq!(Size::Byte.sign_extend(0x1234_567F), 0x7F);
        assert_eq!(Size::Word.sign_extend(0x8000), 0xFFFF_8000);
        assert_eq!(Size::Word.sign_extend(0xFFFF_7FFF), 0x7FFF);
        assert_eq!(Size::Long.sign_extend(0x8000_0000), 0x8000_0000);
    }

    #[test]
    fn merge_keeps_high_bits() {
        assert_eq!(Size::Byte.merge(0x1234_5678, 0xAB), 0x1234_56AB);
        assert_eq!(Size::Word.merge(0x1234_5678, 0xFFFF_ABCD), 0x1234_ABCD);
        assert_eq!(Size::Long.merge(0x1234_5678, 0xDEAD_BEEF), 0xDEAD_BEEF);
    }

    #[test]
    fn byte_is_word_aligned_in_stream() {
        assert_eq!(Size::Byte.aligned_bytes(), 2);
        assert_eq!(Size::Word.aligned_bytes(), 2);
        assert_eq!(Size::Long.aligned_bytes(), 4);
        assert_eq!(Size::Byte.bytes(), 1);
    }

    #[test]
    fn encoding_round_trips() {
        for size in [Size::Byte, Size::Word, Size::Long] {
            assert_eq!(Size::from_bits(size.bits() as u8), Some(size));
        }
        assert_eq!(Size::from_bits(3), None);
    }
}
