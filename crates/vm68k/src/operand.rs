//! Effective address operands.
//!
//! One struct per addressing mode, generic over the operand width. A handler
//! instantiation names its accessor types, so the mode is fixed when the
//! dispatch table is built and never re-examined while executing.
//!
//! Accessing an operand is two-phase: [`Operand::get`] and
//! [`Writable::put`] perform the bus accesses without side effects on the
//! registers, then [`Operand::finish`] applies any pending address register
//! update. `finish` consumes the accessor, and handlers call it only after
//! every access of the instruction has succeeded, so a faulting access leaves
//! the address registers as they were.
//!
//! Modes with extension words resolve their address on first use and keep
//! it, so a read-modify-write fetches each extension word once.
//!
//! | Mode | Type | EA bits |
//! |------|------|---------|
//! | Dn | [`DataRegister`] | 000 rrr |
//! | An | [`AddressRegister`] | 001 rrr |
//! | (An) | [`Indirect`] | 010 rrr |
//! | (An)+ | [`PostIncrement`] | 011 rrr |
//! | -(An) | [`PreDecrement`] | 100 rrr |
//! | d16(An) | [`Displacement`] | 101 rrr |
//! | d8(An,Xn) | [`Indexed`] | 110 rrr |
//! | abs.w | [`AbsoluteShort`] | 111 000 |
//! | abs.l | [`AbsoluteLong`] | 111 001 |
//! | d16(PC) | [`PcDisplacement`] | 111 010 |
//! | d8(PC,Xn) | [`PcIndexed`] | 111 011 |
//! | #imm | [`Immediate`] | 111 100 |

use std::cell::Cell;
use std::marker::PhantomData;

use crate::bus::{BusResult, M68kBus};
use crate::context::Context;
use crate::registers::Register;
use crate::size::{OperandSize, Size, WideSize};

/// A readable operand.
pub trait Operand: Sized {
    /// Operand width marker.
    type Width: OperandSize;

    /// Operand width.
    const SIZE: Size = <Self::Width as OperandSize>::SIZE;

    /// Bytes of extension words this mode consumes after the opcode.
    const EXTENSION_SIZE: u32;

    /// Build from the 3-bit register field and the address of this
    /// operand's first extension word.
    fn new(reg: u16, ext: u32) -> Self;

    /// Read the operand value, zero-extended from its width.
    fn get(&self, ctx: &Context, bus: &mut dyn M68kBus) -> BusResult<u32>;

    /// Apply deferred register side effects.
    fn finish(self, _ctx: &mut Context) {}
}

/// An operand that can be written (an alterable addressing mode).
pub trait Writable: Operand {
    /// Write the low bits of `value` to the operand.
    fn put(&self, ctx: &mut Context, bus: &mut dyn M68kBus, value: u32) -> BusResult<()>;
}

/// Pointer step for `(An)+` and `-(An)`; A7 stays word-aligned.
const fn step(reg: usize, size: Size) -> u32 {
    if reg == 7 {
        size.aligned_bytes()
    } else {
        size.bytes()
    }
}

/// Decode a brief extension word: `D/A rrr W/L 000 dddddddd`.
fn indexed_address(ctx: &Context, bus: &mut dyn M68kBus, base: u32, ext: u32) -> BusResult<u32> {
    let word = ctx.fetch(bus, Size::Word, ext)?;
    let index_reg = Register::from_index((word >> 12) as u8);
    let index = if word & 0x0800 != 0 {
        ctx.regs.read(index_reg, Size::Long)
    } else {
        Size::Word.sign_extend(ctx.regs.read(index_reg, Size::Word))
    };
    Ok(base
        .wrapping_add(Size::Byte.sign_extend(word))
        .wrapping_add(index))
}

/// The address in `slot`, resolving it on first use.
fn resolved(
    slot: &Cell<Option<u32>>,
    resolve: impl FnOnce() -> BusResult<u32>,
) -> BusResult<u32> {
    if let Some(address) = slot.get() {
        return Ok(address);
    }
    let address = resolve()?;
    slot.set(Some(address));
    Ok(address)
}

macro_rules! register_field {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name<S> {
            reg: usize,
            size: PhantomData<S>,
        }

        impl<S> $name<S> {
            /// Register number (0-7).
            #[must_use]
            pub const fn register(&self) -> usize {
                self.reg
            }
        }
    };
}

macro_rules! extension_only {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name<S> {
            ext: u32,
            size: PhantomData<S>,
        }
    };
}

macro_rules! absolute {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name<S> {
            ext: u32,
            address: Cell<Option<u32>>,
            size: PhantomData<S>,
        }
    };
}

register_field!(
    /// Data register direct: `Dn`.
    DataRegister
);
register_field!(
    /// Address register direct: `An`. Word or long only.
    AddressRegister
);
register_field!(
    /// Address register indirect: `(An)`.
    Indirect
);
register_field!(
    /// Address register indirect with post-increment: `(An)+`.
    PostIncrement
);
register_field!(
    /// Address register indirect with pre-decrement: `-(An)`.
    PreDecrement
);

/// Address register indirect with displacement: `d16(An)`.
#[derive(Debug, Clone)]
pub struct Displacement<S> {
    reg: usize,
    ext: u32,
    address: Cell<Option<u32>>,
    size: PhantomData<S>,
}

/// Address register indirect with index: `d8(An,Xn)`.
#[derive(Debug, Clone)]
pub struct Indexed<S> {
    reg: usize,
    ext: u32,
    address: Cell<Option<u32>>,
    size: PhantomData<S>,
}

absolute!(
    /// Absolute short: a sign-extended 16-bit address.
    AbsoluteShort
);
absolute!(
    /// Absolute long: a full 32-bit address.
    AbsoluteLong
);
extension_only!(
    /// Program counter with displacement: `d16(PC)`.
    PcDisplacement
);
extension_only!(
    /// Program counter with index: `d8(PC,Xn)`.
    PcIndexed
);
extension_only!(
    /// Immediate data following the opcode.
    Immediate
);

// === Register direct ===

impl<S: OperandSize> Operand for DataRegister<S> {
    type Width = S;
    const EXTENSION_SIZE: u32 = 0;

    fn new(reg: u16, _ext: u32) -> Self {
        Self {
            reg: usize::from(reg & 7),
            size: PhantomData,
        }
    }

    fn get(&self, ctx: &Context, _bus: &mut dyn M68kBus) -> BusResult<u32> {
        Ok(ctx.regs.read_d(self.reg, S::SIZE))
    }
}

impl<S: OperandSize> Writable for DataRegister<S> {
    fn put(&self, ctx: &mut Context, _bus: &mut dyn M68kBus, value: u32) -> BusResult<()> {
        ctx.regs.write_d(self.reg, S::SIZE, value);
        Ok(())
    }
}

impl<S: WideSize> Operand for AddressRegister<S> {
    type Width = S;
    const EXTENSION_SIZE: u32 = 0;

    fn new(reg: u16, _ext: u32) -> Self {
        Self {
            reg: usize::from(reg & 7),
            size: PhantomData,
        }
    }

    fn get(&self, ctx: &Context, _bus: &mut dyn M68kBus) -> BusResult<u32> {
        Ok(ctx.regs.read_a(self.reg, S::SIZE))
    }
}

impl<S: WideSize> Writable for AddressRegister<S> {
    fn put(&self, ctx: &mut Context, _bus: &mut dyn M68kBus, value: u32) -> BusResult<()> {
        ctx.regs.write_a(self.reg, S::SIZE, value);
        Ok(())
    }
}

// === Address register indirect ===

impl<S: OperandSize> Operand for Indirect<S> {
    type Width = S;
    const EXTENSION_SIZE: u32 = 0;

    fn new(reg: u16, _ext: u32) -> Self {
        Self {
            reg: usize::from(reg & 7),
            size: PhantomData,
        }
    }

    fn get(&self, ctx: &Context, bus: &mut dyn M68kBus) -> BusResult<u32> {
        ctx.read_data(bus, S::SIZE, ctx.regs.a[self.reg])
    }
}

impl<S: OperandSize> Writable for Indirect<S> {
    fn put(&self, ctx: &mut Context, bus: &mut dyn M68kBus, value: u32) -> BusResult<()> {
        let address = ctx.regs.a[self.reg];
        ctx.write_data(bus, S::SIZE, address, value)
    }
}

impl<S: OperandSize> PostIncrement<S> {
    /// How far `finish` moves the register.
    #[must_use]
    pub const fn step(&self) -> u32 {
        step(self.reg, S::SIZE)
    }

    /// Read `offset` bytes past the current register value.
    ///
    /// Used when an earlier operand of the same instruction post-increments
    /// this register and its step has not been applied yet.
    pub fn get_displaced(
        &self,
        ctx: &Context,
        bus: &mut dyn M68kBus,
        offset: u32,
    ) -> BusResult<u32> {
        ctx.read_data(bus, S::SIZE, ctx.regs.a[self.reg].wrapping_add(offset))
    }
}

impl<S: OperandSize> Operand for PostIncrement<S> {
    type Width = S;
    const EXTENSION_SIZE: u32 = 0;

    fn new(reg: u16, _ext: u32) -> Self {
        Self {
            reg: usize::from(reg & 7),
            size: PhantomData,
        }
    }

    fn get(&self, ctx: &Context, bus: &mut dyn M68kBus) -> BusResult<u32> {
        self.get_displaced(ctx, bus, 0)
    }

    fn finish(self, ctx: &mut Context) {
        ctx.regs.a[self.reg] = ctx.regs.a[self.reg].wrapping_add(self.step());
    }
}

impl<S: OperandSize> Writable for PostIncrement<S> {
    fn put(&self, ctx: &mut Context, bus: &mut dyn M68kBus, value: u32) -> BusResult<()> {
        let address = ctx.regs.a[self.reg];
        ctx.write_data(bus, S::SIZE, address, value)
    }
}

impl<S: OperandSize> PreDecrement<S> {
    fn address(&self, ctx: &Context) -> u32 {
        ctx.regs.a[self.reg].wrapping_sub(step(self.reg, S::SIZE))
    }
}

impl<S: OperandSize> Operand for PreDecrement<S> {
    type Width = S;
    const EXTENSION_SIZE: u32 = 0;

    fn new(reg: u16, _ext: u32) -> Self {
        Self {
            reg: usize::from(reg & 7),
            size: PhantomData,
        }
    }

    fn get(&self, ctx: &Context, bus: &mut dyn M68kBus) -> BusResult<u32> {
        ctx.read_data(bus, S::SIZE, self.address(ctx))
    }

    fn finish(self, ctx: &mut Context) {
        ctx.regs.a[self.reg] = self.address(ctx);
    }
}

impl<S: OperandSize> Writable for PreDecrement<S> {
    fn put(&self, ctx: &mut Context, bus: &mut dyn M68kBus, value: u32) -> BusResult<()> {
        let address = self.address(ctx);
        ctx.write_data(bus, S::SIZE, address, value)
    }
}

impl<S: OperandSize> Displacement<S> {
    fn address(&self, ctx: &Context, bus: &mut dyn M68kBus) -> BusResult<u32> {
        resolved(&self.address, || {
            let disp = ctx.fetch_signed_word(bus, self.ext)?;
            Ok(ctx.regs.a[self.reg].wrapping_add(disp))
        })
    }
}

impl<S: OperandSize> Operand for Displacement<S> {
    type Width = S;
    const EXTENSION_SIZE: u32 = 2;

    fn new(reg: u16, ext: u32) -> Self {
        Self {
            reg: usize::from(reg & 7),
            ext,
            address: Cell::new(None),
            size: PhantomData,
        }
    }

    fn get(&self, ctx: &Context, bus: &mut dyn M68kBus) -> BusResult<u32> {
        let address = self.address(ctx, bus)?;
        ctx.read_data(bus, S::SIZE, address)
    }
}

impl<S: OperandSize> Writable for Displacement<S> {
    fn put(&self, ctx: &mut Context, bus: &mut dyn M68kBus, value: u32) -> BusResult<()> {
        let address = self.address(ctx, bus)?;
        ctx.write_data(bus, S::SIZE, address, value)
    }
}

impl<S: OperandSize> Indexed<S> {
    fn address(&self, ctx: &Context, bus: &mut dyn M68kBus) -> BusResult<u32> {
        resolved(&self.address, || {
            indexed_address(ctx, bus, ctx.regs.a[self.reg], self.ext)
        })
    }
}

impl<S: OperandSize> Operand for Indexed<S> {
    type Width = S;
    const EXTENSION_SIZE: u32 = 2;

    fn new(reg: u16, ext: u32) -> Self {
        Self {
            reg: usize::from(reg & 7),
            ext,
            address: Cell::new(None),
            size: PhantomData,
        }
    }

    fn get(&self, ctx: &Context, bus: &mut dyn M68kBus) -> BusResult<u32> {
        let address = self.address(ctx, bus)?;
        ctx.read_data(bus, S::SIZE, address)
    }
}

impl<S: OperandSize> Writable for Indexed<S> {
    fn put(&self, ctx: &mut Context, bus: &mut dyn M68kBus, value: u32) -> BusResult<()> {
        let address = self.address(ctx, bus)?;
        ctx.write_data(bus, S::SIZE, address, value)
    }
}

// === Absolute ===

impl<S: OperandSize> AbsoluteShort<S> {
    fn address(&self, ctx: &Context, bus: &mut dyn M68kBus) -> BusResult<u32> {
        resolved(&self.address, || ctx.fetch_signed_word(bus, self.ext))
    }
}

impl<S: OperandSize> Operand for AbsoluteShort<S> {
    type Width = S;
    const EXTENSION_SIZE: u32 = 2;

    fn new(_reg: u16, ext: u32) -> Self {
        Self {
            ext,
            address: Cell::new(None),
            size: PhantomData,
        }
    }

    fn get(&self, ctx: &Context, bus: &mut dyn M68kBus) -> BusResult<u32> {
        let address = self.address(ctx, bus)?;
        ctx.read_data(bus, S::SIZE, address)
    }
}

impl<S: OperandSize> Writable for AbsoluteShort<S> {
    fn put(&self, ctx: &mut Context, bus: &mut dyn M68kBus, value: u32) -> BusResult<()> {
        let address = self.address(ctx, bus)?;
        ctx.write_data(bus, S::SIZE, address, value)
    }
}

impl<S: OperandSize> AbsoluteLong<S> {
    fn address(&self, ctx: &Context, bus: &mut dyn M68kBus) -> BusResult<u32> {
        resolved(&self.address, || ctx.fetch(bus, Size::Long, self.ext))
    }
}

impl<S: OperandSize> Operand for AbsoluteLong<S> {
    type Width = S;
    const EXTENSION_SIZE: u32 = 4;

    fn new(_reg: u16, ext: u32) -> Self {
        Self {
            ext,
            address: Cell::new(None),
            size: PhantomData,
        }
    }

    fn get(&self, ctx: &Context, bus: &mut dyn M68kBus) -> BusResult<u32> {
        let address = self.address(ctx, bus)?;
        ctx.read_data(bus, S::SIZE, address)
    }
}

impl<S: OperandSize> Writable for AbsoluteLong<S> {
    fn put(&self, ctx: &mut Context, bus: &mut dyn M68kBus, value: u32) -> BusResult<()> {
        let address = self.address(ctx, bus)?;
        ctx.write_data(bus, S::SIZE, address, value)
    }
}

// === Program counter relative (read only) ===

impl<S: OperandSize> Operand for PcDisplacement<S> {
    type Width = S;
    const EXTENSION_SIZE: u32 = 2;

    fn new(_reg: u16, ext: u32) -> Self {
        Self {
            ext,
            size: PhantomData,
        }
    }

    fn get(&self, ctx: &Context, bus: &mut dyn M68kBus) -> BusResult<u32> {
        let disp = ctx.fetch_signed_word(bus, self.ext)?;
        ctx.read_program(bus, S::SIZE, self.ext.wrapping_add(disp))
    }
}

impl<S: OperandSize> Operand for PcIndexed<S> {
    type Width = S;
    const EXTENSION_SIZE: u32 = 2;

    fn new(_reg: u16, ext: u32) -> Self {
        Self {
            ext,
            size: PhantomData,
        }
    }

    fn get(&self, ctx: &Context, bus: &mut dyn M68kBus) -> BusResult<u32> {
        let address = indexed_address(ctx, bus, self.ext, self.ext)?;
        ctx.read_program(bus, S::SIZE, address)
    }
}

impl<S: OperandSize> Operand for Immediate<S> {
    type Width = S;
    const EXTENSION_SIZE: u32 = S::SIZE.aligned_bytes();

    fn new(_reg: u16, ext: u32) -> Self {
        Self {
            ext,
            size: PhantomData,
        }
    }

    fn get(&self, ctx: &Context, bus: &mut dyn M68kBus) -> BusResult<u32> {
        ctx.fetch(bus, S::SIZE, self.ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::FunctionCode;
    use crate::size::{ByteSize, LongSize, WordSize};
    use crate::testing::TestBus;

    fn setup() -> (Context, TestBus) {
        let mut ctx = Context::new();
        ctx.regs.a[0] = 0x1000;
        ctx.regs.a[7] = 0x8000;
        (ctx, TestBus::new())
    }

    fn round_trip<O: Writable>(ctx: &mut Context, bus: &mut TestBus, op: &O, value: u32) {
        op.put(ctx, bus, value).unwrap();
        assert_eq!(op.get(ctx, bus).unwrap(), O::SIZE.truncate(value));
    }

    #[test]
    fn extension_sizes() {
        assert_eq!(<DataRegister<LongSize>>::EXTENSION_SIZE, 0);
        assert_eq!(<Displacement<ByteSize>>::EXTENSION_SIZE, 2);
        assert_eq!(<AbsoluteLong<WordSize>>::EXTENSION_SIZE, 4);
        assert_eq!(<Immediate<ByteSize>>::EXTENSION_SIZE, 2);
        assert_eq!(<Immediate<WordSize>>::EXTENSION_SIZE, 2);
        assert_eq!(<Immediate<LongSize>>::EXTENSION_SIZE, 4);
    }

    #[test]
    fn data_register_byte_put_keeps_upper_bits() {
        let (mut ctx, mut bus) = setup();
        ctx.regs.d[4] = 0x1122_3344;
        let op = DataRegister::<ByteSize>::new(4, 0);
        op.put(&mut ctx, &mut bus, 0x1FF).unwrap();
        assert_eq!(ctx.regs.d[4], 0x1122_33FF);
        assert_eq!(op.get(&ctx, &mut bus).unwrap(), 0xFF);
    }

    #[test]
    fn address_register_word_put_sign_extends() {
        let (mut ctx, mut bus) = setup();
        let op = AddressRegister::<WordSize>::new(3, 0);
        op.put(&mut ctx, &mut bus, 0x9000).unwrap();
        assert_eq!(ctx.regs.a[3], 0xFFFF_9000);
        assert_eq!(op.get(&ctx, &mut bus).unwrap(), 0x9000);
    }

    #[test]
    fn memory_modes_round_trip() {
        let (mut ctx, mut bus) = setup();
        bus.poke_word(0x400, 0xFFFE); // d16 = -2
        round_trip(&mut ctx, &mut bus, &Indirect::<LongSize>::new(0, 0), 0xDEAD_BEEF);
        round_trip(&mut ctx, &mut bus, &Displacement::<WordSize>::new(0, 0x400), 0x1234);
        assert_eq!(bus.peek_word(0x0FFE), 0x1234);
        round_trip(&mut ctx, &mut bus, &AbsoluteShort::<ByteSize>::new(0, 0x400), 0xAB);
        // 0xFFFE sign-extends, then wraps into the top of the 24-bit space.
        assert_eq!(bus.peek_word(0x00FF_FFFE) >> 8, 0xAB);
        bus.poke_long(0x410, 0x0000_2000);
        round_trip(&mut ctx, &mut bus, &AbsoluteLong::<LongSize>::new(0, 0x410), 0x0102_0304);
        assert_eq!(bus.peek_long(0x2000), 0x0102_0304);
    }

    #[test]
    fn register_update_modes_round_trip_before_finish() {
        let (mut ctx, mut bus) = setup();
        ctx.regs.a[1] = 0x2000;
        let inc = PostIncrement::<LongSize>::new(1, 0);
        round_trip(&mut ctx, &mut bus, &inc, 0x0BAD_F00D);
        assert_eq!(bus.peek_long(0x2000), 0x0BAD_F00D);
        assert_eq!(ctx.regs.a[1], 0x2000);

        let dec = PreDecrement::<ByteSize>::new(7, 0);
        round_trip(&mut ctx, &mut bus, &dec, 0x1C5);
        assert_eq!(bus.peek_word(0x7FFE) >> 8, 0xC5);
        assert_eq!(ctx.regs.a[7], 0x8000);

        // d8(A1,D3.W) with displacement +4 and D3.W = -2
        ctx.regs.d[3] = 0x0000_FFFE;
        bus.poke_word(0x400, 0x3004);
        let idx = Indexed::<WordSize>::new(1, 0x400);
        round_trip(&mut ctx, &mut bus, &idx, 0x7E57);
        assert_eq!(bus.peek_word(0x2002), 0x7E57);
        assert_eq!(ctx.regs.a[1], 0x2000);
    }

    #[test]
    fn extension_words_are_fetched_once_per_accessor() {
        let (mut ctx, mut bus) = setup();
        bus.poke_word(0x400, 0x0010);
        bus.poke_word(0x410, 0x0008);
        bus.poke_long(0x420, 0x0000_3000);

        let disp = Displacement::<WordSize>::new(0, 0x400);
        let idx = Indexed::<WordSize>::new(0, 0x410);
        let short = AbsoluteShort::<WordSize>::new(0, 0x400);
        let long = AbsoluteLong::<WordSize>::new(0, 0x420);
        round_trip(&mut ctx, &mut bus, &disp, 1);
        round_trip(&mut ctx, &mut bus, &short, 2);
        round_trip(&mut ctx, &mut bus, &idx, 3);
        round_trip(&mut ctx, &mut bus, &long, 4);

        let fetches: Vec<u32> = bus
            .trace
            .iter()
            .filter(|&&(fc, _)| fc == FunctionCode::SupervisorProgram)
            .map(|&(_, address)| address)
            .collect();
        assert_eq!(fetches, vec![0x400, 0x400, 0x410, 0x420]);
        assert_eq!(bus.peek_word(0x1010), 1);
        assert_eq!(bus.peek_word(0x0010), 2);
        assert_eq!(bus.peek_word(0x1008), 3);
        assert_eq!(bus.peek_word(0x3000), 4);
    }

    #[test]
    fn post_increment_defers_step_to_finish() {
        let (mut ctx, mut bus) = setup();
        bus.poke_word(0x1000, 0x5555);
        let op = PostIncrement::<WordSize>::new(0, 0);
        assert_eq!(op.get(&ctx, &mut bus).unwrap(), 0x5555);
        assert_eq!(ctx.regs.a[0], 0x1000);
        op.finish(&mut ctx);
        assert_eq!(ctx.regs.a[0], 0x1002);
    }

    #[test]
    fn stack_pointer_byte_steps_keep_alignment() {
        let (mut ctx, mut bus) = setup();
        let inc = PostIncrement::<ByteSize>::new(7, 0);
        assert_eq!(inc.step(), 2);
        inc.get(&ctx, &mut bus).unwrap();
        inc.finish(&mut ctx);
        assert_eq!(ctx.regs.a[7], 0x8002);

        let dec = PreDecrement::<ByteSize>::new(7, 0);
        dec.put(&mut ctx, &mut bus, 0x7F).unwrap();
        dec.finish(&mut ctx);
        assert_eq!(ctx.regs.a[7], 0x8000);
        assert_eq!(bus.peek_word(0x8000) >> 8, 0x7F);

        let other = PostIncrement::<ByteSize>::new(0, 0);
        assert_eq!(other.step(), 1);
    }

    #[test]
    fn pre_decrement_writes_below_register() {
        let (mut ctx, mut bus) = setup();
        let op = PreDecrement::<LongSize>::new(0, 0);
        op.put(&mut ctx, &mut bus, 0xCAFE_F00D).unwrap();
        assert_eq!(ctx.regs.a[0], 0x1000);
        assert_eq!(bus.peek_long(0x0FFC), 0xCAFE_F00D);
        op.finish(&mut ctx);
        assert_eq!(ctx.regs.a[0], 0x0FFC);
    }

    #[test]
    fn indexed_uses_base_register_and_index_width() {
        let (mut ctx, mut bus) = setup();
        ctx.regs.a[2] = 0x3000;
        ctx.regs.d[1] = 0x0001_FFFC; // word index = -4
        // D1.W, displacement +6
        bus.poke_word(0x400, 0x1006);
        bus.poke_word(0x3002, 0x0BAD);
        let op = Indexed::<WordSize>::new(2, 0x400);
        assert_eq!(op.get(&ctx, &mut bus).unwrap(), 0x0BAD);

        // A2.L, displacement -2
        ctx.regs.a[2] = 0x100;
        bus.poke_word(0x402, 0xA8FE);
        bus.poke_long(0x1FE, 0x1357_9BDF);
        let op = Indexed::<LongSize>::new(0, 0x402);
        ctx.regs.a[0] = 0x100;
        assert_eq!(op.get(&ctx, &mut bus).unwrap(), 0x1357_9BDF);
    }

    #[test]
    fn pc_relative_reads_program_space() {
        let (ctx, mut bus) = setup();
        bus.poke_word(0x600, 0x0010);
        bus.poke_word(0x610, 0x4242);
        let op = PcDisplacement::<WordSize>::new(0, 0x600);
        assert_eq!(op.get(&ctx, &mut bus).unwrap(), 0x4242);
        assert!(
            bus.trace
                .iter()
                .all(|&(fc, _)| fc == FunctionCode::SupervisorProgram)
        );
    }

    #[test]
    fn pc_indexed_adds_extension_address() {
        let (mut ctx, mut bus) = setup();
        ctx.regs.d[0] = 8;
        bus.poke_word(0x600, 0x0802); // D0.L, +2
        bus.poke_long(0x60A, 0x0F0F_0F0F);
        let op = PcIndexed::<LongSize>::new(0, 0x600);
        assert_eq!(op.get(&ctx, &mut bus).unwrap(), 0x0F0F_0F0F);
    }

    #[test]
    fn immediate_byte_is_low_byte_of_word() {
        let (ctx, mut bus) = setup();
        bus.poke_word(0x500, 0xEE42);
        assert_eq!(Immediate::<ByteSize>::new(0, 0x500).get(&ctx, &mut bus).unwrap(), 0x42);
        bus.poke_long(0x502, 0x89AB_CDEF);
        assert_eq!(
            Immediate::<LongSize>::new(0, 0x502).get(&ctx, &mut bus).unwrap(),
            0x89AB_CDEF
        );
    }
}
