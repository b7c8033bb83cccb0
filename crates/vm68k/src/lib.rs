//! Motorola 68000 instruction interpretation engine.
//!
//! The crate models the architectural state of a 68000 (registers, status
//! word, supervisor/user stacks, pending interrupts) and executes
//! instructions against a caller-supplied [`M68kBus`]. It makes no attempt at
//! cycle timing: each call runs one whole instruction or one whole exception
//! entry.
//!
//! Opcode words are resolved through a [`DispatchTable`] built once per
//! process from per-family installers. Handlers are generic over the
//! addressing modes of their operands, so each table entry points at code
//! specialised for one size and one mode.
//!
//! ```no_run
//! use vm68k::{M68kBus, Processor};
//! # fn run(bus: &mut dyn M68kBus) -> Result<(), Box<dyn std::error::Error>> {
//! let mut cpu = Processor::new()?;
//! cpu.reset(bus)?;
//! loop {
//!     cpu.step(bus)?;
//! }
//! # }
//! ```

pub mod bus;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod flags;
pub mod instructions;
pub mod interrupt;
pub mod operand;
pub mod processor;
pub mod registers;
pub mod size;
pub mod vectors;

#[cfg(test)]
mod testing;

pub use bus::{Access, BusError, BusResult, FunctionCode, M68kBus};
pub use config::Config;
pub use context::Context;
pub use dispatch::{DispatchTable, Entry, Handler, TableBuilder};
pub use error::{ExecError, Pattern, TableError};
pub use flags::{C, N, Status, V, X, Z};
pub use interrupt::InterruptRequester;
pub use processor::Processor;
pub use registers::{Register, Registers};
pub use size::Size;
