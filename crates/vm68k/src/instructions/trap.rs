//! TRAP #n.

use crate::bus::{BusResult, M68kBus};
use crate::context::Context;
use crate::dispatch::TableBuilder;
use crate::vectors::TRAP_BASE;

/// Exception through vector `aux + n`; the frame returns past the TRAP.
fn trap(
    pc: u32,
    ctx: &mut Context,
    bus: &mut dyn M68kBus,
    word: u16,
    aux: u32,
) -> BusResult<u32> {
    let vector = (aux + u32::from(word & 0x000F)) as u8;
    ctx.raise_exception(bus, vector, pc.wrapping_add(2))
}

/// TRAP: `0100 1110 0100 vvvv`.
pub fn install_trap(builder: &mut TableBuilder) {
    builder.insert(0x4E40, 0x000F, trap, u32::from(TRAP_BASE));
}
