//! OR, AND and EOR in their register, memory, immediate and status forms.
//!
//! Results set N and Z, clear V and C, and leave X alone. The operation kind
//! travels in the entry's aux datum so one handler serves all three.

use crate::bus::{BusResult, M68kBus};
use crate::context::Context;
use crate::dispatch::{ReadFamily, TableBuilder, WriteFamily};
use crate::flags::CCR_MASK;
use crate::operand::{Immediate, Operand, Writable};
use crate::size::{ByteSize, LongSize, OperandSize, Size, WordSize};
use crate::vectors::PRIVILEGE_VIOLATION;

use super::{sized, upper_register};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogicOp {
    Or,
    And,
    Eor,
}

impl LogicOp {
    const fn from_aux(aux: u32) -> Self {
        match aux {
            0 => Self::Or,
            1 => Self::And,
            _ => Self::Eor,
        }
    }

    const fn aux(self) -> u32 {
        match self {
            Self::Or => 0,
            Self::And => 1,
            Self::Eor => 2,
        }
    }

    const fn apply(self, a: u32, b: u32) -> u32 {
        match self {
            Self::Or => a | b,
            Self::And => a & b,
            Self::Eor => a ^ b,
        }
    }
}

/// `OR/AND <ea>,Dn`.
struct ToRegister;

impl ReadFamily for ToRegister {
    fn execute<O: Operand>(
        pc: u32,
        ctx: &mut Context,
        bus: &mut dyn M68kBus,
        word: u16,
        aux: u32,
    ) -> BusResult<u32> {
        let src = O::new(word, pc.wrapping_add(2));
        let dn = usize::from(upper_register(word));
        let s = src.get(ctx, bus)?;
        let value = LogicOp::from_aux(aux).apply(s, ctx.regs.read_d(dn, O::SIZE));
        ctx.regs.write_d(dn, O::SIZE, value);
        ctx.set_cc_from_value(value, O::SIZE);
        src.finish(ctx);
        Ok(pc.wrapping_add(2 + O::EXTENSION_SIZE))
    }
}

/// `OR/AND/EOR Dn,<ea>`.
struct FromRegister;

impl WriteFamily for FromRegister {
    fn execute<O: Writable>(
        pc: u32,
        ctx: &mut Context,
        bus: &mut dyn M68kBus,
        word: u16,
        aux: u32,
    ) -> BusResult<u32> {
        let dst = O::new(word, pc.wrapping_add(2));
        let dn = ctx.regs.read_d(usize::from(upper_register(word)), O::SIZE);
        let value = LogicOp::from_aux(aux).apply(dst.get(ctx, bus)?, dn);
        dst.put(ctx, bus, value)?;
        ctx.set_cc_from_value(value, O::SIZE);
        dst.finish(ctx);
        Ok(pc.wrapping_add(2 + O::EXTENSION_SIZE))
    }
}

/// `ORI/ANDI/EORI #imm,<ea>`.
struct ImmediateToEa;

impl WriteFamily for ImmediateToEa {
    fn execute<O: Writable>(
        pc: u32,
        ctx: &mut Context,
        bus: &mut dyn M68kBus,
        word: u16,
        aux: u32,
    ) -> BusResult<u32> {
        let imm = Immediate::<O::Width>::new(0, pc.wrapping_add(2));
        let dst_ext = 2 + Immediate::<O::Width>::EXTENSION_SIZE;
        let dst = O::new(word, pc.wrapping_add(dst_ext));
        let s = imm.get(ctx, bus)?;
        let value = LogicOp::from_aux(aux).apply(dst.get(ctx, bus)?, s);
        dst.put(ctx, bus, value)?;
        ctx.set_cc_from_value(value, O::SIZE);
        dst.finish(ctx);
        Ok(pc.wrapping_add(dst_ext + O::EXTENSION_SIZE))
    }
}

/// `ORI/ANDI/EORI #imm,CCR`.
fn to_ccr(
    pc: u32,
    ctx: &mut Context,
    bus: &mut dyn M68kBus,
    _word: u16,
    aux: u32,
) -> BusResult<u32> {
    let imm = Immediate::<ByteSize>::new(0, pc.wrapping_add(2)).get(ctx, bus)?;
    let ccr = LogicOp::from_aux(aux).apply(u32::from(ctx.ccr()), imm);
    ctx.set_ccr((ccr as u16 & CCR_MASK) as u8);
    Ok(pc.wrapping_add(4))
}

/// `ORI/ANDI/EORI #imm,SR`. Privileged.
///
/// The new value goes through `set_status`, so clearing S moves A7 to the
/// user stack.
fn to_sr(
    pc: u32,
    ctx: &mut Context,
    bus: &mut dyn M68kBus,
    _word: u16,
    aux: u32,
) -> BusResult<u32> {
    if !ctx.is_supervisor() {
        tracing::debug!("privilege violation at {pc:#010x}");
        return ctx.raise_exception(bus, PRIVILEGE_VIOLATION, pc);
    }
    let imm = Immediate::<WordSize>::new(0, pc.wrapping_add(2)).get(ctx, bus)?;
    let status = LogicOp::from_aux(aux).apply(u32::from(ctx.status()), imm);
    ctx.set_status(status as u16);
    Ok(pc.wrapping_add(4))
}

const ORI: u16 = 0x0000;
const ANDI: u16 = 0x0200;
const EORI: u16 = 0x0A00;

fn immediate_sizes<S: OperandSize>(builder: &mut TableBuilder) {
    for (base, op) in [(ORI, LogicOp::Or), (ANDI, LogicOp::And), (EORI, LogicOp::Eor)] {
        builder.data_alterable::<ImmediateToEa, S>(sized(base, S::SIZE), 0, op.aux());
    }
}

/// ORI, ANDI and EORI to a data alterable destination.
pub fn install_logic_immediate(builder: &mut TableBuilder) {
    immediate_sizes::<ByteSize>(builder);
    immediate_sizes::<WordSize>(builder);
    immediate_sizes::<LongSize>(builder);
}

/// ORI, ANDI and EORI to CCR and SR.
pub fn install_logic_status(builder: &mut TableBuilder) {
    // EA field 111 100 with byte (CCR) or word (SR) size.
    const TO_STATUS: u16 = 0o74;

    for (base, op) in [(ORI, LogicOp::Or), (ANDI, LogicOp::And), (EORI, LogicOp::Eor)] {
        builder
            .insert(sized(base, Size::Byte) | TO_STATUS, 0, to_ccr, op.aux())
            .insert(sized(base, Size::Word) | TO_STATUS, 0, to_sr, op.aux());
    }
}

/// Bits 11-9 hold Dn.
const DN: u16 = 0x0E00;
const OR: u16 = 0x8000;
const AND: u16 = 0xC000;
/// Opmode bit 8: set for `Dn,<ea>`.
const TO_EA: u16 = 0x0100;

fn and_or_sizes<S: OperandSize>(builder: &mut TableBuilder) {
    for (base, op) in [(OR, LogicOp::Or), (AND, LogicOp::And)] {
        builder
            .data_sources::<ToRegister, S>(sized(base, S::SIZE), DN, op.aux())
            .memory_alterable::<FromRegister, S>(sized(base | TO_EA, S::SIZE), DN, op.aux());
    }
}

/// OR and AND in both directions.
pub fn install_and_or(builder: &mut TableBuilder) {
    and_or_sizes::<ByteSize>(builder);
    and_or_sizes::<WordSize>(builder);
    and_or_sizes::<LongSize>(builder);
}

/// EOR: `1011 rrr 1ss <ea>`, data alterable destinations.
pub fn install_eor(builder: &mut TableBuilder) {
    const EOR: u16 = 0xB100;

    let aux = LogicOp::Eor.aux();
    builder
        .data_alterable::<FromRegister, ByteSize>(sized(EOR, Size::Byte), DN, aux)
        .data_alterable::<FromRegister, WordSize>(sized(EOR, Size::Word), DN, aux)
        .data_alterable::<FromRegister, LongSize>(sized(EOR, Size::Long), DN, aux);
}
