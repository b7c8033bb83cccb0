//! Exception vector numbers. The handler address lives at `vector * 4`.

/// Reset: initial SSP.
pub const RESET_SSP: u8 = 0;
/// Reset: initial PC.
pub const RESET_PC: u8 = 1;
pub const BUS_ERROR: u8 = 2;
pub const ADDRESS_ERROR: u8 = 3;
pub const ILLEGAL_INSTRUCTION: u8 = 4;
pub const ZERO_DIVIDE: u8 = 5;
pub const CHK: u8 = 6;
pub const TRAPV: u8 = 7;
pub const PRIVILEGE_VIOLATION: u8 = 8;
pub const TRACE: u8 = 9;
/// Line 1010 emulator.
pub const LINE_A: u8 = 10;
/// Line 1111 emulator.
pub const LINE_F: u8 = 11;
pub const SPURIOUS_INTERRUPT: u8 = 24;
/// Level 1 autovector; levels 2-7 follow.
pub const AUTOVECTOR_BASE: u8 = 25;
/// `TRAP #0`; `TRAP #1`-`#15` follow.
pub const TRAP_BASE: u8 = 32;
/// First user interrupt vector.
pub const USER_BASE: u8 = 64;

