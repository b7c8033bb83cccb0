//! Processor state and the operations that change privilege.
//!
//! `Context` owns everything an instruction can observe or modify apart from
//! memory: the register file, the status word, the cached function codes for
//! program and data accesses, and the pending interrupt queues.
//!
//! Privilege changes go through [`Context::enter_privileged`], which swaps the
//! live and shadow stack pointers and refreshes the function-code caches in
//! the same step, so no access is ever tagged with a stale address space.

use std::sync::Arc;

use crate::bus::{BusResult, FunctionCode, M68kBus};
use crate::config::Config;
use crate::flags::{CCR_MASK, S, SR_MASK, Status, T};
use crate::interrupt::{InterruptQueues, InterruptRequester};
use crate::registers::{Register, Registers};
use crate::size::Size;
use crate::vectors;

/// Architectural state of one 68000.
#[derive(Debug)]
pub struct Context {
    /// Data, address and program counter registers.
    pub regs: Registers,
    status: u16,
    program_fc: FunctionCode,
    data_fc: FunctionCode,
    config: Config,
    interrupts: Arc<InterruptQueues>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// A 68000 context in its reset status with zeroed registers.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// A context for the given configuration, in its reset status.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        let status = config.reset_status & SR_MASK;
        let supervisor = status & S != 0;
        Self {
            regs: Registers::new(),
            status,
            program_fc: FunctionCode::from_flags(supervisor, true),
            data_fc: FunctionCode::from_flags(supervisor, false),
            config,
            interrupts: Arc::new(InterruptQueues::new()),
        }
    }

    /// The configuration this context was built with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    // === Registers ===

    /// Read a register at the given width.
    #[must_use]
    pub fn read_register(&self, reg: Register, size: Size) -> u32 {
        self.regs.read(reg, size)
    }

    /// Write a register at the given width.
    ///
    /// Narrow data register writes keep the upper bits; address registers are
    /// always written in full.
    pub fn write_register(&mut self, reg: Register, size: Size, value: u32) {
        self.regs.write(reg, size, value);
    }

    /// User stack pointer, wherever it currently lives.
    #[must_use]
    pub fn usp(&self) -> u32 {
        if self.is_supervisor() {
            self.regs.shadow_sp()
        } else {
            self.regs.a[7]
        }
    }

    /// Supervisor stack pointer, wherever it currently lives.
    #[must_use]
    pub fn ssp(&self) -> u32 {
        if self.is_supervisor() {
            self.regs.a[7]
        } else {
            self.regs.shadow_sp()
        }
    }

    /// Set the user stack pointer in whichever slot holds it.
    pub fn set_usp(&mut self, value: u32) {
        if self.is_supervisor() {
            self.regs.set_shadow_sp(value);
        } else {
            self.regs.a[7] = value;
        }
    }

    /// Set the supervisor stack pointer in whichever slot holds it.
    pub fn set_ssp(&mut self, value: u32) {
        if self.is_supervisor() {
            self.regs.a[7] = value;
        } else {
            self.regs.set_shadow_sp(value);
        }
    }

    // === Status register ===

    /// The full status word (system byte and condition codes).
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Replace the status word.
    ///
    /// The privilege transition for the new S bit happens first, so the
    /// stack pointers and function codes are consistent by the time the
    /// remaining bits are stored. Reserved bits are dropped.
    pub fn set_status(&mut self, value: u16) {
        self.enter_privileged(value & S != 0);
        self.status = value & SR_MASK;
    }

    /// Replace the condition codes (X N Z V C), keeping the system byte.
    pub fn set_ccr(&mut self, value: u8) {
        self.status = (self.status & !CCR_MASK) | (u16::from(value) & CCR_MASK);
    }

    /// Condition code bits.
    #[must_use]
    pub const fn ccr(&self) -> u8 {
        (self.status & CCR_MASK) as u8
    }

    /// True in supervisor mode.
    #[must_use]
    pub const fn is_supervisor(&self) -> bool {
        self.status & S != 0
    }

    /// Interrupt priority mask (0-7).
    #[must_use]
    pub const fn interrupt_mask(&self) -> u8 {
        Status::mask_level(self.status)
    }

    /// Switch between supervisor and user mode.
    ///
    /// Does nothing if already in the requested mode. Otherwise A7 and the
    /// shadow stack pointer trade places, S flips, and both function-code
    /// caches are recomputed.
    pub fn enter_privileged(&mut self, supervisor: bool) {
        if self.is_supervisor() == supervisor {
            return;
        }
        self.regs.swap_stack_pointers();
        if supervisor {
            self.status |= S;
        } else {
            self.status &= !S;
        }
        self.program_fc = FunctionCode::from_flags(supervisor, true);
        self.data_fc = FunctionCode::from_flags(supervisor, false);
    }

    /// Function code for instruction-stream accesses in the current mode.
    #[must_use]
    pub const fn program_fc(&self) -> FunctionCode {
        self.program_fc
    }

    /// Function code for operand accesses in the current mode.
    #[must_use]
    pub const fn data_fc(&self) -> FunctionCode {
        self.data_fc
    }

    /// N and Z from `value`; V and C cleared; X kept.
    pub fn set_cc_from_value(&mut self, value: u32, size: Size) {
        self.status = Status::from_value(self.status, value, size);
    }

    /// N, Z, V and C from `dst - src`; X kept.
    pub fn set_cc_from_compare(&mut self, src: u32, dst: u32, size: Size) {
        self.status = Status::from_compare(self.status, src, dst, size);
    }

    // === Memory ===

    const fn mask(&self, address: u32) -> u32 {
        address & self.config.address_mask
    }

    /// Read an operand from data space.
    pub fn read_data(&self, bus: &mut dyn M68kBus, size: Size, address: u32) -> BusResult<u32> {
        bus.read(size, self.data_fc, self.mask(address))
    }

    /// Write an operand to data space.
    pub fn write_data(
        &self,
        bus: &mut dyn M68kBus,
        size: Size,
        address: u32,
        value: u32,
    ) -> BusResult<()> {
        bus.write(size, self.data_fc, self.mask(address), size.truncate(value))
    }

    /// Read an operand from program space (PC-relative addressing).
    pub fn read_program(
        &self,
        bus: &mut dyn M68kBus,
        size: Size,
        address: u32,
    ) -> BusResult<u32> {
        bus.read(size, self.program_fc, self.mask(address))
    }

    /// Fetch from the instruction stream.
    ///
    /// The stream is word-granular: a byte fetch reads the whole word at the
    /// cursor and keeps its low byte.
    pub fn fetch(&self, bus: &mut dyn M68kBus, size: Size, address: u32) -> BusResult<u32> {
        match size {
            Size::Byte => Ok(self.read_program(bus, Size::Word, address)? & 0xFF),
            Size::Word | Size::Long => self.read_program(bus, size, address),
        }
    }

    /// Fetch a stream word and sign-extend it to 32 bits.
    pub fn fetch_signed_word(&self, bus: &mut dyn M68kBus, address: u32) -> BusResult<u32> {
        Ok(Size::Word.sign_extend(self.fetch(bus, Size::Word, address)?))
    }

    // === Exceptions ===

    /// Take an exception through `vector` and return the handler address.
    ///
    /// Pushes the six-byte frame (return PC, then the status word below it)
    /// on the supervisor stack and reads the handler from `vector * 4` in
    /// supervisor program space. Only when all three bus accesses succeed is
    /// the state committed: supervisor mode, A7 at the frame, trace cleared
    /// and, if given, the new interrupt mask.
    pub fn enter_exception(
        &mut self,
        bus: &mut dyn M68kBus,
        vector: u8,
        return_pc: u32,
        mask: Option<u8>,
    ) -> BusResult<u32> {
        let old_status = self.status;
        let frame = self.ssp().wrapping_sub(6);

        bus.write(
            Size::Long,
            FunctionCode::SupervisorData,
            self.mask(frame.wrapping_add(2)),
            return_pc,
        )?;
        bus.write(
            Size::Word,
            FunctionCode::SupervisorData,
            self.mask(frame),
            u32::from(old_status),
        )?;
        let handler = bus.read(
            Size::Long,
            FunctionCode::SupervisorProgram,
            self.mask(u32::from(vector) * 4),
        )?;

        self.enter_privileged(true);
        self.regs.a[7] = frame;
        let mut status = self.status & !T;
        if let Some(level) = mask {
            status = Status::with_mask_level(status, level);
        }
        self.status = status;

        tracing::debug!(
            "exception vector {vector}: frame at {frame:#010x}, return {return_pc:#010x}, handler {handler:#010x}"
        );
        Ok(handler)
    }

    /// Take an exception without touching the interrupt mask.
    pub fn raise_exception(
        &mut self,
        bus: &mut dyn M68kBus,
        vector: u8,
        return_pc: u32,
    ) -> BusResult<u32> {
        self.enter_exception(bus, vector, return_pc, None)
    }

    // === Interrupts ===

    /// Queue an interrupt. Returns `false` if `priority` is not 1-7.
    pub fn request_interrupt(&self, priority: u8, vector: u8) -> bool {
        self.interrupts.request(priority, vector)
    }

    /// A handle other threads can use to queue interrupts.
    #[must_use]
    pub fn interrupt_requester(&self) -> InterruptRequester {
        InterruptRequester::new(Arc::clone(&self.interrupts))
    }

    /// The pending interrupt queues.
    #[must_use]
    pub fn interrupts(&self) -> &InterruptQueues {
        &self.interrupts
    }

    /// Deliver the highest pending interrupt if the mask allows it.
    ///
    /// Call only between instructions. Returns the handler address on
    /// delivery and `pc` unchanged otherwise. The request leaves its queue
    /// only once the frame and vector accesses have succeeded.
    pub fn maybe_deliver_interrupt(&mut self, bus: &mut dyn M68kBus, pc: u32) -> BusResult<u32> {
        let Some(pending) = self.interrupts.eligible(self.interrupt_mask()) else {
            return Ok(pc);
        };
        let handler = self.enter_exception(bus, pending.vector, pc, Some(pending.priority))?;
        self.interrupts.acknowledge(pending.priority);
        tracing::debug!(
            "interrupt level {} delivered through vector {}",
            pending.priority,
            pending.vector
        );
        Ok(handler)
    }

    /// Load the reset status, then SSP from address 0 and PC from address 4.
    ///
    /// Both vectors are read before anything changes. Pending interrupts are
    /// kept.
    pub fn reset(&mut self, bus: &mut dyn M68kBus) -> BusResult<()> {
        let vector_address = |vector: u8| self.mask(u32::from(vector) * 4);
        let ssp = bus.read(
            Size::Long,
            FunctionCode::SupervisorProgram,
            vector_address(vectors::RESET_SSP),
        )?;
        let pc = bus.read(
            Size::Long,
            FunctionCode::SupervisorProgram,
            vector_address(vectors::RESET_PC),
        )?;
        self.set_status(self.config.reset_status);
        self.regs.a[7] = ssp;
        self.regs.pc = pc;
        tracing::debug!("reset: ssp {ssp:#010x}, pc {pc:#010x}");
        Ok(())
    }
}
