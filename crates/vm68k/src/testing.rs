//! Memory bus for unit tests: full 16MB address space (24-bit).

use crate::bus::{BusError, BusResult, FunctionCode, M68kBus};
use crate::size::Size;

pub(crate) struct TestBus {
    data: Vec<u8>,
    /// Accesses touching `[start, end)` fault.
    fault: Option<(u32, u32)>,
    /// Function codes seen, in access order.
    pub(crate) trace: Vec<(FunctionCode, u32)>,
}

impl TestBus {
    pub(crate) fn new() -> Self {
        Self {
            data: vec![0; 0x100_0000],
            fault: None,
            trace: Vec::new(),
        }
    }

    pub(crate) fn fault_range(&mut self, start: u32, end: u32) {
        self.fault = Some((start, end));
    }

    pub(crate) fn poke_word(&mut self, addr: u32, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.data[addr as usize] = hi;
        self.data[addr as usize + 1] = lo;
    }

    pub(crate) fn poke_long(&mut self, addr: u32, value: u32) {
        self.poke_word(addr, (value >> 16) as u16);
        self.poke_word(addr + 2, value as u16);
    }

    pub(crate) fn peek_word(&self, addr: u32) -> u16 {
        u16::from_be_bytes([self.data[addr as usize], self.data[addr as usize + 1]])
    }

    pub(crate) fn peek_long(&self, addr: u32) -> u32 {
        u32::from(self.peek_word(addr)) << 16 | u32::from(self.peek_word(addr + 2))
    }

    fn faults(&self, addr: u32, size: Size) -> bool {
        self.fault
            .is_some_and(|(start, end)| addr < end && addr + size.bytes() > start)
    }
}

impl M68kBus for TestBus {
    fn read(&mut self, size: Size, fc: FunctionCode, address: u32) -> BusResult<u32> {
        self.trace.push((fc, address));
        if self.faults(address, size) {
            return Err(BusError::read(address, fc));
        }
        let base = (address & 0xFF_FFFF) as usize;
        Ok((0..size.bytes() as usize)
            .fold(0, |acc, i| acc << 8 | u32::from(self.data[(base + i) & 0xFF_FFFF])))
    }

    fn write(&mut self, size: Size, fc: FunctionCode, address: u32, value: u32) -> BusResult<()> {
        self.trace.push((fc, address));
        if self.faults(address, size) {
            return Err(BusError::write(address, fc));
        }
        let base = (address & 0xFF_FFFF) as usize;
        let bytes = size.bytes() as usize;
        for i in 0..bytes {
            self.data[(base + i) & 0xFF_FFFF] = (value >> (8 * (bytes - 1 - i))) as u8;
        }
        Ok(())
    }
}
