//! Driver-facing processor.

use crate::bus::{BusResult, M68kBus};
use crate::config::Config;
use crate::context::Context;
use crate::dispatch::{self, DispatchTable};
use crate::error::{ExecError, TableError};
use crate::interrupt::InterruptRequester;
use crate::registers::Register;
use crate::size::Size;

/// A 68000: its state plus the shared dispatch table.
#[derive(Debug)]
pub struct Processor {
    ctx: Context,
    table: &'static DispatchTable,
}

impl Processor {
    /// A 68000 with the default configuration.
    pub fn new() -> Result<Self, TableError> {
        Self::with_config(Config::default())
    }

    /// A 68000 with the given configuration.
    pub fn with_config(config: Config) -> Result<Self, TableError> {
        Ok(Self {
            ctx: Context::with_config(config),
            table: dispatch::standard()?,
        })
    }

    /// Processor state.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.ctx
    }

    /// Mutable processor state.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    /// Execute the instruction at `pc` and return the next PC.
    ///
    /// An unassigned opcode is reported as
    /// [`ExecError::IllegalInstruction`] with no state changed.
    pub fn decode_and_execute(
        &mut self,
        bus: &mut dyn M68kBus,
        pc: u32,
    ) -> Result<u32, ExecError> {
        let opcode = self.ctx.fetch(bus, Size::Word, pc)? as u16;
        tracing::trace!("{pc:#010x}: {opcode:04x}");
        let Some(entry) = self.table.lookup(opcode) else {
            tracing::warn!("illegal instruction {opcode:#06x} at {pc:#010x}");
            return Err(ExecError::IllegalInstruction { pc, opcode });
        };
        Ok((entry.handler)(pc, &mut self.ctx, bus, opcode, entry.aux)?)
    }

    /// Deliver any pending interrupt, then execute one instruction at the
    /// stored PC.
    ///
    /// A delivered interrupt is kept even if the instruction then fails: the
    /// stored PC is left at the handler.
    pub fn step(&mut self, bus: &mut dyn M68kBus) -> Result<(), ExecError> {
        let pc = self.ctx.maybe_deliver_interrupt(bus, self.ctx.regs.pc)?;
        self.ctx.regs.pc = pc;
        let next = self.decode_and_execute(bus, pc)?;
        self.ctx.regs.pc = next;
        Ok(())
    }

    /// Load SSP and PC from the reset vectors.
    pub fn reset(&mut self, bus: &mut dyn M68kBus) -> BusResult<()> {
        self.ctx.reset(bus)
    }

    /// Queue an interrupt. Returns `false` if `priority` is not 1-7.
    pub fn request_interrupt(&self, priority: u8, vector: u8) -> bool {
        self.ctx.request_interrupt(priority, vector)
    }

    /// A handle for queueing interrupts from other threads.
    #[must_use]
    pub fn interrupt_requester(&self) -> InterruptRequester {
        self.ctx.interrupt_requester()
    }

    /// See [`Context::maybe_deliver_interrupt`].
    pub fn maybe_deliver_interrupt(&mut self, bus: &mut dyn M68kBus, pc: u32) -> BusResult<u32> {
        self.ctx.maybe_deliver_interrupt(bus, pc)
    }

    /// Take an exception, e.g. vector 4 after an illegal instruction.
    pub fn raise_exception(
        &mut self,
        bus: &mut dyn M68kBus,
        vector: u8,
        return_pc: u32,
    ) -> BusResult<u32> {
        self.ctx.raise_exception(bus, vector, return_pc)
    }

    /// The full status word.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.ctx.status()
    }

    /// Replace the status word, switching stacks if S changes.
    pub fn set_status(&mut self, value: u16) {
        self.ctx.set_status(value);
    }

    /// Full 32-bit register value.
    #[must_use]
    pub fn register(&self, reg: Register) -> u32 {
        self.ctx.read_register(reg, Size::Long)
    }

    /// Write all 32 bits of a register.
    pub fn set_register(&mut self, reg: Register, value: u32) {
        self.ctx.write_register(reg, Size::Long, value);
    }

    /// The stored program counter used by `step`.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.ctx.regs.pc
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.ctx.regs.pc = pc;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{IPL_MASK, S, Z};
    use crate::testing::TestBus;
    use crate::vectors;

    #[test]
    fn unassigned_opcode_is_illegal_and_changes_nothing() {
        let mut cpu = Processor::new().unwrap();
        let mut bus = TestBus::new();
        bus.poke_word(0x400, 0x4AFC);
        cpu.set_register(Register::Address(7), 0x8000);
        let err = cpu.decode_and_execute(&mut bus, 0x400).unwrap_err();
        assert_eq!(
            err,
            ExecError::IllegalInstruction {
                pc: 0x400,
                opcode: 0x4AFC
            }
        );
        assert_eq!(cpu.register(Register::Address(7)), 0x8000);
        assert_eq!(cpu.status(), S | IPL_MASK);

        // The driver takes the illegal-instruction vector itself.
        bus.poke_long(u32::from(vectors::ILLEGAL_INSTRUCTION) * 4, 0x0000_0C00);
        let handler = cpu
            .raise_exception(&mut bus, vectors::ILLEGAL_INSTRUCTION, 0x400)
            .unwrap();
        assert_eq!(handler, 0x0C00);
        assert_eq!(bus.peek_long(0x8000 - 4), 0x400);
    }

    #[test]
    fn reset_then_step() {
        let mut cpu = Processor::new().unwrap();
        let mut bus = TestBus::new();
        bus.poke_long(0, 0x0000_8000);
        bus.poke_long(4, 0x0000_0400);
        bus.poke_word(0x400, 0xB380); // eor.l d1,d0
        cpu.set_register(Register::Data(0), 0x1234_5678);
        cpu.set_register(Register::Data(1), 0x1234_5678);

        cpu.reset(&mut bus).unwrap();
        assert_eq!(cpu.pc(), 0x400);
        assert_eq!(cpu.register(Register::Address(7)), 0x8000);

        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.pc(), 0x402);
        assert_eq!(cpu.register(Register::Data(0)), 0);
        assert_eq!(cpu.status(), S | IPL_MASK | Z);
    }

    #[test]
    fn step_delivers_before_executing() {
        let mut cpu = Processor::new().unwrap();
        let mut bus = TestBus::new();
        cpu.set_register(Register::Address(7), 0x8000);
        cpu.set_status(S);
        cpu.set_pc(0x400);
        bus.poke_long(64 * 4, 0x0000_0600);
        bus.poke_word(0x600, 0x4E41); // trap #1 in the handler
        bus.poke_long(33 * 4, 0x0000_0700);

        assert!(cpu.request_interrupt(3, 64));
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.pc(), 0x700);
        assert_eq!(cpu.context().interrupt_mask(), 3);
        // Interrupt frame under the trap frame.
        assert_eq!(bus.peek_long(0x8000 - 4), 0x400);
        assert_eq!(bus.peek_long(0x8000 - 10), 0x602);
        assert!(!cpu.context().interrupts().is_outstanding());
    }

    #[test]
    fn fetch_fault_surfaces_as_bus_error() {
        let mut cpu = Processor::new().unwrap();
        let mut bus = TestBus::new();
        bus.fault_range(0x400, 0x402);
        let err = cpu.decode_and_execute(&mut bus, 0x400).unwrap_err();
        assert!(matches!(err, ExecError::Bus(_)));
    }
}
