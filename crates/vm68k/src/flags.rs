//! Status register layout and condition-code rules.
//!
//! The status register is 16 bits:
//! - Bits 0-4: Condition code register (CCR)
//!   - C (bit 0): Carry
//!   - V (bit 1): Overflow
//!   - Z (bit 2): Zero
//!   - N (bit 3): Negative
//!   - X (bit 4): Extend
//! - Bits 8-10: Interrupt mask
//! - Bit 13: Supervisor mode (S)
//! - Bit 15: Trace mode (T)
//!
//! All other bits are reserved and always read as zero.

use crate::size::Size;

/// Carry flag.
pub const C: u16 = 0x0001;
/// Overflow flag.
pub const V: u16 = 0x0002;
/// Zero flag.
pub const Z: u16 = 0x0004;
/// Negative flag.
pub const N: u16 = 0x0008;
/// Extend flag.
pub const X: u16 = 0x0010;

/// Interrupt mask field (bits 8-10).
pub const IPL_MASK: u16 = 0x0700;
/// Supervisor mode flag.
pub const S: u16 = 0x2000;
/// Trace mode flag.
pub const T: u16 = 0x8000;

/// Mask for condition codes only (bits 0-4).
pub const CCR_MASK: u16 = 0x001F;
/// Mask for valid SR bits (excluding reserved bits).
pub const SR_MASK: u16 = 0xA71F;

/// Status register helper functions.
///
/// Every helper is a pure function of the old status word and the operand
/// values; the caller stores the result.
pub struct Status;

impl Status {
    /// Flags for a value produced by a move or logical operation.
    ///
    /// N and Z follow the result, V and C are cleared, X is untouched.
    #[must_use]
    pub fn from_value(sr: u16, value: u32, size: Size) -> u16 {
        let value = size.truncate(value);
        let mut result = sr & !(N | Z | V | C);
        if value == 0 {
            result |= Z;
        }
        if size.is_negative(value) {
            result |= N;
        }
        result
    }

    /// Flags for a compare: `dst - src` computed and discarded.
    ///
    /// N, Z, V and C follow the subtraction, X is untouched.
    #[must_use]
    pub fn from_compare(sr: u16, src: u32, dst: u32, size: Size) -> u16 {
        let msb = size.msb_mask();
        let s = size.truncate(src);
        let d = size.truncate(dst);
        let result = size.truncate(d.wrapping_sub(s));

        let mut flags = sr & !(N | Z | V | C);
        if result == 0 {
            flags |= Z;
        }
        if result & msb != 0 {
            flags |= N;
        }
        let borrow = (!d & s) | ((!d | s) & result);
        if borrow & msb != 0 {
            flags |= C;
        }
        let overflow = (s ^ d) & (result ^ d);
        if overflow & msb != 0 {
            flags |= V;
        }
        flags
    }

    /// Interrupt mask level held in a status word.
    #[must_use]
    pub const fn mask_level(sr: u16) -> u8 {
        ((sr & IPL_MASK) >> 8) as u8
    }

    /// Replace the interrupt mask level in a status word.
    #[must_use]
    pub const fn with_mask_level(sr: u16, level: u8) -> u16 {
        (sr & !IPL_MASK) | (((level & 0x07) as u16) << 8)
    }
}
