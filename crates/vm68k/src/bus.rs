//! Bus interface consumed by the interpreter.
//!
//! The interpreter does not own memory. Every access goes through
//! [`M68kBus`] with an explicit width and function code, the way the 68000
//! drives its FC0-FC2 pins alongside the address bus.

use std::fmt;

use crate::size::Size;

/// Function code values from the 68000's FC0-FC2 pins.
///
/// These distinguish supervisor/user and program/data accesses to the same
/// physical address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionCode {
    /// User data access (FC=1).
    UserData = 1,
    /// User program access (FC=2).
    UserProgram = 2,
    /// Supervisor data access (FC=5).
    SupervisorData = 5,
    /// Supervisor program access (FC=6).
    SupervisorProgram = 6,
}

impl FunctionCode {
    /// Build a function code from supervisor flag and program/data flag.
    #[must_use]
    pub fn from_flags(supervisor: bool, program: bool) -> Self {
        match (supervisor, program) {
            (false, false) => Self::UserData,
            (false, true) => Self::UserProgram,
            (true, false) => Self::SupervisorData,
            (true, true) => Self::SupervisorProgram,
        }
    }

    /// Returns the 3-bit value for the function code.
    #[must_use]
    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Direction of a faulting access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Read cycle.
    Read,
    /// Write cycle.
    Write,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// A bus cycle that was not acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("bus {access} fault at {address:#010x} ({fc:?})")]
pub struct BusError {
    /// Address of the faulting access.
    pub address: u32,
    /// Address space of the faulting access.
    pub fc: FunctionCode,
    /// Read or write.
    pub access: Access,
}

impl BusError {
    /// Fault on a read cycle.
    #[must_use]
    pub const fn read(address: u32, fc: FunctionCode) -> Self {
        Self {
            address,
            fc,
            access: Access::Read,
        }
    }

    /// Fault on a write cycle.
    #[must_use]
    pub const fn write(address: u32, fc: FunctionCode) -> Self {
        Self {
            address,
            fc,
            access: Access::Write,
        }
    }
}

/// Result of a bus access.
pub type BusResult<T> = Result<T, BusError>;

/// Bus trait for the 68000.
///
/// Values are right-aligned in the `u32`: a byte read returns `0..=0xFF`, a
/// word read `0..=0xFFFF`. Data is big-endian. A long access may be carried
/// out as two word cycles, but the interpreter treats it as one access and
/// relies on the bus to complete both halves or fault.
pub trait M68kBus {
    /// Read `size` bytes at `address`.
    fn read(&mut self, size: Size, fc: FunctionCode, address: u32) -> BusResult<u32>;

    /// Write the low `size` bytes of `value` at `address`.
    fn write(&mut self, size: Size, fc: FunctionCode, address: u32, value: u32) -> BusResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_codes_match_pins() {
        assert_eq!(FunctionCode::from_flags(false, false).bits(), 1);
        assert_eq!(FunctionCode::from_flags(false, true).bits(), 2);
        assert_eq!(FunctionCode::from_flags(true, false).bits(), 5);
        assert_eq!(FunctionCode::from_flags(true, true).bits(), 6);
    }

    #[test]
    fn bus_error_message_names_address() {
        let err = BusError::write(0x00FF_0000, FunctionCode::SupervisorData);
        assert_eq!(
            err.to_string(),
            "bus write fault at 0x00ff0000 (SupervisorData)"
        );
    }
}
