//! Instruction handlers.
//!
//! Each family module exposes an installer that adds its entries to a
//! [`TableBuilder`]. Every handler follows the same shape: build the operand
//! accessors from the opcode word and extension cursor, read, compute, write
//! back, update the condition codes, then `finish` the accessors in operand
//! order and return the address of the next instruction.

mod compare;
mod logical;
mod trap;

pub use compare::{install_cmp, install_cmpi};
pub use logical::{
    install_and_or, install_eor, install_logic_immediate, install_logic_status,
};
pub use trap::install_trap;

use crate::dispatch::{Installer, TableBuilder};
use crate::size::Size;

/// Installers for every family in the standard table.
pub const STANDARD: &[Installer] = &[
    install_cmp,
    install_eor,
    install_cmpi,
    install_logic_immediate,
    install_logic_status,
    install_and_or,
    install_trap,
];

/// Install every family in [`STANDARD`].
pub fn install_standard(builder: &mut TableBuilder) {
    for &installer in STANDARD {
        builder.install(installer);
    }
}

/// Register number in bits 11-9.
const fn upper_register(word: u16) -> u16 {
    (word >> 9) & 7
}

/// `base` with the size field in bits 7-6.
const fn sized(base: u16, size: Size) -> u16 {
    base | size.bits() << 6
}
