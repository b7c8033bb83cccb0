//! Processor configuration.

use crate::flags::{IPL_MASK, S};

/// Static processor parameters chosen by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Mask applied to every address before it reaches the bus.
    pub address_mask: u32,
    /// Status word loaded at construction and on reset.
    pub reset_status: u16,
}

impl Config {
    /// The MC68000: 24 address lines, reset into supervisor mode at mask 7.
    #[must_use]
    pub const fn m68000() -> Self {
        Self {
            address_mask: 0x00FF_FFFF,
            reset_status: S | IPL_MASK,
        }
    }

    /// A 68000 programming model over a flat 32-bit address space.
    #[must_use]
    pub const fn flat32() -> Self {
        Self {
            address_mask: 0xFFFF_FFFF,
            ..Self::m68000()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::m68000()
    }
}
