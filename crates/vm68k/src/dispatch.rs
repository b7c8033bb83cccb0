//! Opcode dispatch.
//!
//! A table entry matches every opcode word `w` with `w & !mask == base`: the
//! bits set in `mask` are the variable fields (register numbers, mode bits)
//! that the handler decodes itself. Instruction families contribute entries
//! through installer functions on a [`TableBuilder`]; [`TableBuilder::build`]
//! checks that no two entries claim the same word and expands the entries
//! into a dense 64K index so that lookup is a single array access.
//!
//! Handlers are monomorphised per addressing mode. An installer binds one
//! handler instantiation per mode through the `*_sources` / `*_alterable`
//! helpers, each of which places the mode's EA bits into the low six bits of
//! the pattern.

use std::fmt;
use std::sync::OnceLock;

use crate::bus::{BusResult, M68kBus};
use crate::context::Context;
use crate::error::{Pattern, TableError};
use crate::instructions;
use crate::operand::{
    AbsoluteLong, AbsoluteShort, AddressRegister, DataRegister, Displacement, Immediate, Indexed,
    Indirect, Operand, PcDisplacement, PcIndexed, PostIncrement, PreDecrement, Writable,
};
use crate::size::{OperandSize, WideSize};

/// Instruction handler: `(pc, context, bus, opcode word, aux) -> next pc`.
pub type Handler = fn(u32, &mut Context, &mut dyn M68kBus, u16, u32) -> BusResult<u32>;

/// Contributes one instruction family to a table.
pub type Installer = fn(&mut TableBuilder);

// EA mode/register bits (low six bits of the opcode).
const DATA_REG: u16 = 0o00;
const ADDR_REG: u16 = 0o10;
const INDIRECT: u16 = 0o20;
const POST_INC: u16 = 0o30;
const PRE_DEC: u16 = 0o40;
const DISP: u16 = 0o50;
const INDEX: u16 = 0o60;
const ABS_SHORT: u16 = 0o70;
const ABS_LONG: u16 = 0o71;
const PC_DISP: u16 = 0o72;
const PC_INDEX: u16 = 0o73;
const IMMEDIATE: u16 = 0o74;

/// Register field of modes 0-6.
const EA_REG: u16 = 0o07;

/// One table entry.
#[derive(Clone, Copy)]
pub struct Entry {
    /// Fixed opcode bits.
    pub base: u16,
    /// Variable opcode bits.
    pub mask: u16,
    /// Handler for every matching word.
    pub handler: Handler,
    /// Datum passed through to the handler.
    pub aux: u32,
}

impl Entry {
    /// True if `word` is one of this entry's opcodes.
    #[must_use]
    pub const fn matches(&self, word: u16) -> bool {
        word & !self.mask == self.base
    }

    /// The entry's base and mask.
    #[must_use]
    pub const fn pattern(&self) -> Pattern {
        Pattern {
            base: self.base,
            mask: self.mask,
        }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("base", &format_args!("{:#06x}", self.base))
            .field("mask", &format_args!("{:#06x}", self.mask))
            .field("aux", &self.aux)
            .finish_non_exhaustive()
    }
}

/// A handler family generic over its effective-address operand.
pub trait ReadFamily {
    fn execute<O: Operand>(
        pc: u32,
        ctx: &mut Context,
        bus: &mut dyn M68kBus,
        word: u16,
        aux: u32,
    ) -> BusResult<u32>;
}

/// A handler family that writes its effective-address operand.
pub trait WriteFamily {
    fn execute<O: Writable>(
        pc: u32,
        ctx: &mut Context,
        bus: &mut dyn M68kBus,
        word: u16,
        aux: u32,
    ) -> BusResult<u32>;
}

/// Collects entries until [`build`](Self::build).
#[derive(Debug, Default)]
pub struct TableBuilder {
    entries: Vec<Entry>,
}

impl TableBuilder {
    /// An empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single entry.
    pub fn insert(&mut self, base: u16, mask: u16, handler: Handler, aux: u32) -> &mut Self {
        self.entries.push(Entry {
            base,
            mask,
            handler,
            aux,
        });
        self
    }

    /// Run an installer.
    pub fn install(&mut self, installer: Installer) -> &mut Self {
        installer(self);
        self
    }

    /// Number of entries collected so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every data addressing mode as a source (all modes except `An`).
    ///
    /// `mask` holds the variable bits outside the EA field.
    pub fn data_sources<F: ReadFamily, S: OperandSize>(
        &mut self,
        base: u16,
        mask: u16,
        aux: u32,
    ) -> &mut Self {
        let reg = mask | EA_REG;
        self.insert(base | DATA_REG, reg, F::execute::<DataRegister<S>>, aux)
            .memory_reads::<F, S>(base, mask, aux)
            .insert(base | PC_DISP, mask, F::execute::<PcDisplacement<S>>, aux)
            .insert(base | PC_INDEX, mask, F::execute::<PcIndexed<S>>, aux)
            .insert(base | IMMEDIATE, mask, F::execute::<Immediate<S>>, aux)
    }

    /// Every addressing mode as a source, `An` included.
    pub fn all_sources<F: ReadFamily, S: WideSize>(
        &mut self,
        base: u16,
        mask: u16,
        aux: u32,
    ) -> &mut Self {
        self.insert(
            base | ADDR_REG,
            mask | EA_REG,
            F::execute::<AddressRegister<S>>,
            aux,
        )
        .data_sources::<F, S>(base, mask, aux)
    }

    /// Data alterable modes, read only (`Dn` and the memory alterable modes).
    pub fn data_alterable_reads<F: ReadFamily, S: OperandSize>(
        &mut self,
        base: u16,
        mask: u16,
        aux: u32,
    ) -> &mut Self {
        self.insert(base | DATA_REG, mask | EA_REG, F::execute::<DataRegister<S>>, aux)
            .memory_reads::<F, S>(base, mask, aux)
    }

    /// Data alterable destinations: `Dn` and the memory alterable modes.
    pub fn data_alterable<F: WriteFamily, S: OperandSize>(
        &mut self,
        base: u16,
        mask: u16,
        aux: u32,
    ) -> &mut Self {
        self.insert(base | DATA_REG, mask | EA_REG, F::execute::<DataRegister<S>>, aux)
            .memory_alterable::<F, S>(base, mask, aux)
    }

    /// Memory alterable destinations.
    pub fn memory_alterable<F: WriteFamily, S: OperandSize>(
        &mut self,
        base: u16,
        mask: u16,
        aux: u32,
    ) -> &mut Self {
        let reg = mask | EA_REG;
        self.insert(base | INDIRECT, reg, F::execute::<Indirect<S>>, aux)
            .insert(base | POST_INC, reg, F::execute::<PostIncrement<S>>, aux)
            .insert(base | PRE_DEC, reg, F::execute::<PreDecrement<S>>, aux)
            .insert(base | DISP, reg, F::execute::<Displacement<S>>, aux)
            .insert(base | INDEX, reg, F::execute::<Indexed<S>>, aux)
            .insert(base | ABS_SHORT, mask, F::execute::<AbsoluteShort<S>>, aux)
            .insert(base | ABS_LONG, mask, F::execute::<AbsoluteLong<S>>, aux)
    }

    fn memory_reads<F: ReadFamily, S: OperandSize>(
        &mut self,
        base: u16,
        mask: u16,
        aux: u32,
    ) -> &mut Self {
        let reg = mask | EA_REG;
        self.insert(base | INDIRECT, reg, F::execute::<Indirect<S>>, aux)
            .insert(base | POST_INC, reg, F::execute::<PostIncrement<S>>, aux)
            .insert(base | PRE_DEC, reg, F::execute::<PreDecrement<S>>, aux)
            .insert(base | DISP, reg, F::execute::<Displacement<S>>, aux)
            .insert(base | INDEX, reg, F::execute::<Indexed<S>>, aux)
            .insert(base | ABS_SHORT, mask, F::execute::<AbsoluteShort<S>>, aux)
            .insert(base | ABS_LONG, mask, F::execute::<AbsoluteLong<S>>, aux)
    }

    /// Validate the entries and build the lookup index.
    pub fn build(self) -> Result<DispatchTable, TableError> {
        let mut index: Box<[Option<u16>]> = vec![None; 0x1_0000].into_boxed_slice();
        let mut opcodes = 0usize;

        for (i, entry) in self.entries.iter().enumerate() {
            if entry.base & entry.mask != 0 {
                return Err(TableError::InvalidPattern {
                    base: entry.base,
                    mask: entry.mask,
                });
            }
            // Walk every submask of `mask` in ascending order.
            let mut variable = 0u16;
            loop {
                let word = entry.base | variable;
                let slot = &mut index[usize::from(word)];
                if let Some(earlier) = *slot {
                    return Err(TableError::Overlap {
                        opcode: word,
                        first: self.entries[usize::from(earlier)].pattern(),
                        second: entry.pattern(),
                    });
                }
                // A free slot means fewer than 65536 entries precede this one.
                *slot = Some(i as u16);
                opcodes += 1;

                if variable == entry.mask {
                    break;
                }
                variable = variable.wrapping_sub(entry.mask) & entry.mask;
            }
        }

        tracing::debug!(
            "dispatch table built: {} entries covering {opcodes} opcodes",
            self.entries.len()
        );
        Ok(DispatchTable {
            entries: self.entries,
            index,
            opcodes,
        })
    }
}

/// An immutable opcode-to-handler map.
pub struct DispatchTable {
    entries: Vec<Entry>,
    index: Box<[Option<u16>]>,
    opcodes: usize,
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("entries", &self.entries.len())
            .field("opcodes", &self.opcodes)
            .finish_non_exhaustive()
    }
}

impl DispatchTable {
    /// The entry matching `word`, if any.
    #[must_use]
    pub fn lookup(&self, word: u16) -> Option<&Entry> {
        self.index[usize::from(word)].map(|i| &self.entries[usize::from(i)])
    }

    /// Entries in installation order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of opcode words with a handler.
    #[must_use]
    pub const fn opcode_count(&self) -> usize {
        self.opcodes
    }
}

static STANDARD: OnceLock<Result<DispatchTable, TableError>> = OnceLock::new();

/// The table of every instruction family this crate implements.
///
/// Built on first use and shared for the life of the process.
pub fn standard() -> Result<&'static DispatchTable, TableError> {
    STANDARD
        .get_or_init(|| {
            let mut builder = TableBuilder::new();
            instructions::install_standard(&mut builder);
            builder.build()
        })
        .as_ref()
        .map_err(|err| *err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size::{ByteSize, WordSize};

    fn nop(pc: u32, _: &mut Context, _: &mut dyn M68kBus, _: u16, _: u32) -> BusResult<u32> {
        Ok(pc + 2)
    }

    fn echo_aux(_: u32, _: &mut Context, _: &mut dyn M68kBus, _: u16, aux: u32) -> BusResult<u32> {
        Ok(aux)
    }

    struct Probe;

    impl ReadFamily for Probe {
        fn execute<O: Operand>(
            _pc: u32,
            _ctx: &mut Context,
            _bus: &mut dyn M68kBus,
            _word: u16,
            _aux: u32,
        ) -> BusResult<u32> {
            Ok(O::EXTENSION_SIZE)
        }
    }

    #[test]
    fn rejects_base_bits_inside_mask() {
        let mut builder = TableBuilder::new();
        builder.insert(0x4E71, 0x0001, nop, 0);
        assert_eq!(
            builder.build().unwrap_err(),
            TableError::InvalidPattern {
                base: 0x4E71,
                mask: 0x0001
            }
        );
    }

    #[test]
    fn rejects_overlapping_entries() {
        let mut builder = TableBuilder::new();
        builder.insert(0x4E40, 0x000F, nop, 0);
        builder.insert(0x4E48, 0x0000, nop, 0);
        let err = builder.build().unwrap_err();
        assert_eq!(
            err,
            TableError::Overlap {
                opcode: 0x4E48,
                first: Pattern {
                    base: 0x4E40,
                    mask: 0x000F
                },
                second: Pattern {
                    base: 0x4E48,
                    mask: 0x0000
                },
            }
        );
    }

    #[test]
    fn sparse_masks_expand_to_every_submask() {
        let mut builder = TableBuilder::new();
        builder.insert(0x1000, 0x0E07, echo_aux, 7);
        let table = builder.build().unwrap();
        assert_eq!(table.opcode_count(), 64);
        assert!(table.lookup(0x1E07).is_some());
        assert!(table.lookup(0x1208).is_none());
        assert_eq!(table.lookup(0x1A05).unwrap().aux, 7);
    }

    #[test]
    fn mode_helpers_bind_one_entry_per_mode() {
        let mut builder = TableBuilder::new();
        builder.data_sources::<Probe, ByteSize>(0xB000, 0x0E00, 0);
        assert_eq!(builder.len(), 11);
        builder.all_sources::<Probe, WordSize>(0xB040, 0x0E00, 0);
        assert_eq!(builder.len(), 23);
        let table = builder.build().unwrap();
        // 8 registers x (6 register modes x 8 + 5 mode-7 forms)
        assert_eq!(table.opcode_count(), 8 * (6 * 8 + 5) + 8 * (7 * 8 + 5));

        let mut ctx = Context::new();
        let mut bus = crate::testing::TestBus::new();
        let mut extension = |word: u16| {
            let entry = table.lookup(word).unwrap();
            (entry.handler)(0, &mut ctx, &mut bus, word, entry.aux).unwrap()
        };
        assert_eq!(extension(0xB03C), 2); // cmp.b #imm
        assert_eq!(extension(0xB079), 4); // cmp.w abs.l
        assert_eq!(extension(0xB048), 0); // cmp.w a0
        assert_eq!(extension(0xB030), 2); // cmp.b d8(a0,xn)
        assert!(table.lookup(0xB008).is_none()); // no cmp.b an
        assert!(table.lookup(0xB03D).is_none());
    }

    #[test]
    fn standard_table_builds_once() {
        let first = standard().unwrap();
        let second = standard().unwrap();
        assert!(std::ptr::eq(first, second));
        assert!(first.opcode_count() > 0);
    }

    #[test]
    fn standard_table_leaves_reserved_words_unassigned() {
        let table = standard().unwrap();
        assert!(table.lookup(0x4AFC).is_none()); // ILLEGAL
        assert!((0xA000..=0xAFFFu16).all(|word| table.lookup(word).is_none()));
        assert!((0xF000..=0xFFFFu16).all(|word| table.lookup(word).is_none()));
    }

    #[test]
    fn every_indexed_word_matches_its_entry() {
        let table = standard().unwrap();
        for word in 0..=u16::MAX {
            if let Some(entry) = table.lookup(word) {
                assert!(entry.matches(word), "{word:#06x} vs {entry:?}");
            }
        }
    }
}
