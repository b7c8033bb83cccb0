//! Motorola 68000 CPU registers.
//!
//! - D0-D7: 8 data registers (32-bit)
//! - A0-A7: 8 address registers (32-bit, A7 is the live stack pointer)
//! - Shadow SP: whichever of USP/SSP is not currently in A7
//! - PC: Program counter
//!
//! The status register lives in [`Context`](crate::Context), because writing
//! it can switch privilege and that switch must also swap the stack pointer.

use crate::size::Size;

/// A register name as it appears in an index extension word (0-15).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// Data register Dn.
    Data(u8),
    /// Address register An.
    Address(u8),
}

impl Register {
    /// Decode the 4-bit D/A + register number field (0-7 = Dn, 8-15 = An).
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        if index & 0x08 == 0 {
            Self::Data(index & 0x07)
        } else {
            Self::Address(index & 0x07)
        }
    }
}

/// 68000 CPU register set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    /// Data registers D0-D7.
    pub d: [u32; 8],
    /// Address registers A0-A7. `a[7]` is the live stack pointer.
    pub a: [u32; 8],
    /// The stack pointer not currently mirrored in A7.
    shadow_sp: u32,
    /// Program counter.
    pub pc: u32,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    /// Create a zeroed register file.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            d: [0; 8],
            a: [0; 8],
            shadow_sp: 0,
            pc: 0,
        }
    }

    /// Read a data register at the given width (zero-extended).
    #[must_use]
    pub fn read_d(&self, r: usize, size: Size) -> u32 {
        size.truncate(self.d[r])
    }

    /// Write a data register at the given width, preserving the upper bits.
    pub fn write_d(&mut self, r: usize, size: Size, value: u32) {
        self.d[r] = size.merge(self.d[r], value);
    }

    /// Read an address register at the given width (zero-extended).
    #[must_use]
    pub fn read_a(&self, r: usize, size: Size) -> u32 {
        size.truncate(self.a[r])
    }

    /// Write an address register.
    ///
    /// Address registers are always written in full: a word value is
    /// sign-extended to 32 bits. Byte writes do not exist on the 68000 and
    /// are treated as long.
    pub fn write_a(&mut self, r: usize, size: Size, value: u32) {
        self.a[r] = match size {
            Size::Word => Size::Word.sign_extend(value),
            Size::Byte | Size::Long => value,
        };
    }

    /// Read any register at the given width.
    #[must_use]
    pub fn read(&self, reg: Register, size: Size) -> u32 {
        match reg {
            Register::Data(r) => self.read_d(usize::from(r), size),
            Register::Address(r) => self.read_a(usize::from(r), size),
        }
    }

    /// Write any register at the given width.
    pub fn write(&mut self, reg: Register, size: Size, value: u32) {
        match reg {
            Register::Data(r) => self.write_d(usize::from(r), size, value),
            Register::Address(r) => self.write_a(usize::from(r), size, value),
        }
    }

    /// The stack pointer not currently in A7.
    #[must_use]
    pub const fn shadow_sp(&self) -> u32 {
        self.shadow_sp
    }

    /// Overwrite the shadow stack pointer slot.
    pub fn set_shadow_sp(&mut self, value: u32) {
        self.shadow_sp = value;
    }

    /// Exchange A7 with the shadow slot.
    ///
    /// Only the privilege transition in `Context::enter_privileged` calls
    /// this, so A7 always holds the stack pointer of the current mode.
    pub(crate) fn swap_stack_pointers(&mut self) {
        std::mem::swap(&mut self.a[7], &mut self.shadow_sp);
    }
}
