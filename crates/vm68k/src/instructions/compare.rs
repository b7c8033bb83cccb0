//! CMP, CMPA, CMPM and CMPI.
//!
//! All four compute `destination - source`, set N, Z, V and C from the
//! result, and discard it. X is not affected.

use crate::bus::{BusResult, M68kBus};
use crate::context::Context;
use crate::dispatch::{ReadFamily, TableBuilder};
use crate::operand::{Immediate, Operand, PostIncrement};
use crate::size::{ByteSize, LongSize, OperandSize, Size, WordSize};

use super::{sized, upper_register};

/// Line B: `1011 rrr 0ss`, `1011 rrr s11`, `1011 xxx 1ss 001 yyy`.
const LINE_B: u16 = 0xB000;

/// `CMP <ea>,Dn`.
struct Cmp;

impl ReadFamily for Cmp {
    fn execute<O: Operand>(
        pc: u32,
        ctx: &mut Context,
        bus: &mut dyn M68kBus,
        word: u16,
        _aux: u32,
    ) -> BusResult<u32> {
        let src = O::new(word, pc.wrapping_add(2));
        let s = src.get(ctx, bus)?;
        let d = ctx.regs.read_d(usize::from(upper_register(word)), O::SIZE);
        ctx.set_cc_from_compare(s, d, O::SIZE);
        src.finish(ctx);
        Ok(pc.wrapping_add(2 + O::EXTENSION_SIZE))
    }
}

/// `CMPA <ea>,An`: a word source is sign-extended and compared as a long.
struct Cmpa;

impl ReadFamily for Cmpa {
    fn execute<O: Operand>(
        pc: u32,
        ctx: &mut Context,
        bus: &mut dyn M68kBus,
        word: u16,
        _aux: u32,
    ) -> BusResult<u32> {
        let src = O::new(word, pc.wrapping_add(2));
        let s = O::SIZE.sign_extend(src.get(ctx, bus)?);
        let d = ctx.regs.a[usize::from(upper_register(word))];
        ctx.set_cc_from_compare(s, d, Size::Long);
        src.finish(ctx);
        Ok(pc.wrapping_add(2 + O::EXTENSION_SIZE))
    }
}

/// `CMPM (Ay)+,(Ax)+`.
///
/// When `x == y` the destination is read one step past the source, as both
/// increments apply to the same register.
fn cmpm<S: OperandSize>(
    pc: u32,
    ctx: &mut Context,
    bus: &mut dyn M68kBus,
    word: u16,
    _aux: u32,
) -> BusResult<u32> {
    let src = PostIncrement::<S>::new(word, 0);
    let dst = PostIncrement::<S>::new(upper_register(word), 0);
    let s = src.get(ctx, bus)?;
    let offset = if src.register() == dst.register() {
        src.step()
    } else {
        0
    };
    let d = dst.get_displaced(ctx, bus, offset)?;
    ctx.set_cc_from_compare(s, d, S::SIZE);
    src.finish(ctx);
    dst.finish(ctx);
    Ok(pc.wrapping_add(2))
}

/// `CMPI #imm,<ea>`.
struct Cmpi;

impl ReadFamily for Cmpi {
    fn execute<O: Operand>(
        pc: u32,
        ctx: &mut Context,
        bus: &mut dyn M68kBus,
        word: u16,
        _aux: u32,
    ) -> BusResult<u32> {
        let imm = Immediate::<O::Width>::new(0, pc.wrapping_add(2));
        let dst_ext = 2 + Immediate::<O::Width>::EXTENSION_SIZE;
        let dst = O::new(word, pc.wrapping_add(dst_ext));
        let s = imm.get(ctx, bus)?;
        let d = dst.get(ctx, bus)?;
        ctx.set_cc_from_compare(s, d, O::SIZE);
        dst.finish(ctx);
        Ok(pc.wrapping_add(dst_ext + O::EXTENSION_SIZE))
    }
}

/// CMP, CMPA and CMPM in line B.
pub fn install_cmp(builder: &mut TableBuilder) {
    // Bits 11-9 hold Dn, An or Ax.
    const REG: u16 = 0x0E00;

    builder
        .data_sources::<Cmp, ByteSize>(sized(LINE_B, Size::Byte), REG, 0)
        .all_sources::<Cmp, WordSize>(sized(LINE_B, Size::Word), REG, 0)
        .all_sources::<Cmp, LongSize>(sized(LINE_B, Size::Long), REG, 0)
        .all_sources::<Cmpa, WordSize>(LINE_B | 0x00C0, REG, 0)
        .all_sources::<Cmpa, LongSize>(LINE_B | 0x01C0, REG, 0);

    let cmpm_base = LINE_B | 0x0108;
    builder
        .insert(sized(cmpm_base, Size::Byte), REG | 7, cmpm::<ByteSize>, 0)
        .insert(sized(cmpm_base, Size::Word), REG | 7, cmpm::<WordSize>, 0)
        .insert(sized(cmpm_base, Size::Long), REG | 7, cmpm::<LongSize>, 0);
}

/// CMPI: `0000 1100 ss <ea>`.
pub fn install_cmpi(builder: &mut TableBuilder) {
    const CMPI: u16 = 0x0C00;

    builder
        .data_alterable_reads::<Cmpi, ByteSize>(sized(CMPI, Size::Byte), 0, 0)
        .data_alterable_reads::<Cmpi, WordSize>(sized(CMPI, Size::Word), 0, 0)
        .data_alterable_reads::<Cmpi, LongSize>(sized(CMPI, Size::Long), 0, 0);
}
