//! Errors surfaced to the driver.

use std::fmt;

use crate::bus::BusError;

/// Failure to execute one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ExecError {
    /// No dispatch table entry matches the opcode word.
    ///
    /// Nothing has changed. The driver decides what happens next, typically
    /// taking vector 4 through `Processor::raise_exception`.
    #[error("illegal instruction {opcode:#06x} at {pc:#010x}")]
    IllegalInstruction { pc: u32, opcode: u16 },
    /// A bus access failed part way through the instruction.
    #[error(transparent)]
    Bus(#[from] BusError),
}

/// Failure to build a dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// The base has bits set inside the variable mask.
    #[error("pattern {base:#06x} has bits inside its mask {mask:#06x}")]
    InvalidPattern { base: u16, mask: u16 },
    /// Two entries match the same opcode word.
    #[error("opcode {opcode:#06x} matched by {first} and {second}")]
    Overlap {
        opcode: u16,
        /// The entry installed first.
        first: Pattern,
        /// The conflicting entry.
        second: Pattern,
    },
}

/// An opcode pattern: the fixed bits and the mask of variable bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    pub base: u16,
    pub mask: u16,
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}/{:#06x}", self.base, self.mask)
    }
}
