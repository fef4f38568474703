// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Typed slices of a 32-bit instruction word.
//!
//! Every instruction is described by an ordered list of [`Field`]s: fixed
//! opcode bits, register numbers, and immediates. Immediates may be split
//! across several [`BitSlice`]s of the word (branch and jump formats) and
//! know how to parse, pack, unpack, range-check and late-resolve a symbol
//! value during linking.

use crate::core::text_utils::parse_int;

/// Maps value bits `[value_lsb, value_lsb + width)` onto word bits
/// `[word_lsb, word_lsb + width)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitSlice {
    pub word_lsb: u32,
    pub width: u32,
    pub value_lsb: u32,
}

impl BitSlice {
    #[must_use]
    pub const fn new(word_lsb: u32, width: u32, value_lsb: u32) -> Self {
        Self {
            word_lsb,
            width,
            value_lsb,
        }
    }

    fn mask(&self) -> u32 {
        (((1u64) << self.width) - 1) as u32
    }

    fn insert(&self, word: u32, value: u32) -> u32 {
        word | (((value >> self.value_lsb) & self.mask()) << self.word_lsb)
    }

    fn extract(&self, word: u32) -> u32 {
        ((word >> self.word_lsb) & self.mask()) << self.value_lsb
    }
}

/// Signedness of an immediate field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImmRepr {
    Signed,
    Unsigned,
}

/// How a symbol value resolves into an immediate field during linking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImmLink {
    /// The symbol's byte offset is used directly.
    Absolute,
    /// The field encodes `symbol − instruction offset`.
    PcRelative,
}

/// A 5-bit register number at a fixed position in the word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegField {
    /// Conventional field name (`rd`, `rs1`, `rs2`), used in diagnostics.
    pub name: &'static str,
    /// Index of the operand atom this field consumes.
    pub operand: usize,
    /// Word bit position of the low bit.
    pub lsb: u32,
}

pub const REG_FIELD_WIDTH: u32 = 5;

/// An immediate value distributed over one or more word slices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImmField {
    /// Index of the operand atom this field consumes.
    pub operand: usize,
    /// Total value width in bits, including bits no slice carries (the
    /// implicit zero low bit of branch offsets).
    pub width: u32,
    pub repr: ImmRepr,
    pub link: ImmLink,
    pub slices: Vec<BitSlice>,
}

impl ImmField {
    /// Parse an operand atom as an integer literal. `None` means the atom
    /// is not numeric (the caller may treat it as a symbol reference).
    #[must_use]
    pub fn parse(&self, atom: &str) -> Option<i64> {
        parse_int(atom)
    }

    /// The representable range of this field.
    #[must_use]
    pub fn range(&self) -> (i64, i64) {
        match self.repr {
            ImmRepr::Signed => (-(1i64 << (self.width - 1)), (1i64 << (self.width - 1)) - 1),
            ImmRepr::Unsigned => (0, (1i64 << self.width) - 1),
        }
    }

    /// Whether `value` is representable: inside the range, and losslessly
    /// reconstructible from the slices (rejects odd branch offsets, whose
    /// low bit no slice carries).
    #[must_use]
    pub fn representable(&self, value: i64) -> bool {
        let (lo, hi) = self.range();
        lo <= value && value <= hi && self.decode(self.encode(0, value)) == value
    }

    /// Pack `value` into the field's slices of `word`. The field bits of
    /// `word` must be zero.
    #[must_use]
    pub fn encode(&self, word: u32, value: i64) -> u32 {
        let bits = value as u32;
        self.slices
            .iter()
            .fold(word, |word, slice| slice.insert(word, bits))
    }

    /// Unpack the field's value from `word`, sign-extending signed fields.
    #[must_use]
    pub fn decode(&self, word: u32) -> i64 {
        let raw = self
            .slices
            .iter()
            .fold(0u32, |acc, slice| acc | slice.extract(word));
        match self.repr {
            ImmRepr::Unsigned => i64::from(raw),
            ImmRepr::Signed => {
                let shift = 32 - self.width;
                i64::from(((raw << shift) as i32) >> shift)
            }
        }
    }

    /// Apply a deferred symbol resolution to an already-emitted word whose
    /// field bits are zero. Returns `None` when the resolved value does not
    /// fit the field.
    #[must_use]
    pub fn resolve(&self, word: u32, symbol_value: u32, instr_offset: u32) -> Option<u32> {
        let value = match self.link {
            ImmLink::Absolute => i64::from(symbol_value),
            ImmLink::PcRelative => i64::from(symbol_value) - i64::from(instr_offset),
        };
        if self.representable(value) {
            Some(self.encode(word, value))
        } else {
            None
        }
    }
}

/// One typed slice of the instruction word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// Fixed identification bits (base opcode, funct3, funct7, ...).
    Opcode { mask: u32, bits: u32 },
    Reg(RegField),
    Imm(ImmField),
}

impl Field {
    /// Fixed bits `value` of `width` bits at word position `lsb`.
    #[must_use]
    pub fn opcode(lsb: u32, width: u32, value: u32) -> Field {
        let mask = ((((1u64) << width) - 1) as u32) << lsb;
        debug_assert_eq!((value << lsb) & !mask, 0, "opcode value exceeds field width");
        Field::Opcode {
            mask,
            bits: (value << lsb) & mask,
        }
    }

    #[must_use]
    pub fn reg(name: &'static str, operand: usize, lsb: u32) -> Field {
        Field::Reg(RegField { name, operand, lsb })
    }

    #[must_use]
    pub fn imm(
        operand: usize,
        width: u32,
        repr: ImmRepr,
        link: ImmLink,
        slices: Vec<BitSlice>,
    ) -> Field {
        Field::Imm(ImmField {
            operand,
            width,
            repr,
            link,
            slices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{BitSlice, Field, ImmField, ImmLink, ImmRepr};

    fn plain_imm(width: u32, repr: ImmRepr) -> ImmField {
        match Field::imm(
            0,
            width,
            repr,
            ImmLink::Absolute,
            vec![BitSlice::new(20, width, 0)],
        ) {
            Field::Imm(f) => f,
            _ => unreachable!(),
        }
    }

    fn branch_imm() -> ImmField {
        // B-format: imm[12|10:5] in word[31:25], imm[4:1|11] in word[11:7].
        match Field::imm(
            0,
            13,
            ImmRepr::Signed,
            ImmLink::PcRelative,
            vec![
                BitSlice::new(31, 1, 12),
                BitSlice::new(25, 6, 5),
                BitSlice::new(8, 4, 1),
                BitSlice::new(7, 1, 11),
            ],
        ) {
            Field::Imm(f) => f,
            _ => unreachable!(),
        }
    }

    #[test]
    fn bit_slice_inserts_and_extracts() {
        let slice = BitSlice::new(20, 12, 0);
        let word = slice.insert(0, 5);
        assert_eq!(word, 5 << 20);
        assert_eq!(slice.extract(word), 5);
    }

    #[test]
    fn contiguous_immediate_round_trips() {
        let field = plain_imm(12, ImmRepr::Signed);
        for value in [-2048, -1, 0, 1, 2047] {
            let word = field.encode(0, value);
            assert_eq!(field.decode(word), value, "value {value}");
        }
    }

    #[test]
    fn range_endpoints() {
        let field = plain_imm(12, ImmRepr::Signed);
        assert!(field.representable(2047));
        assert!(field.representable(-2048));
        assert!(!field.representable(2048));
        assert!(!field.representable(-2049));

        let field = plain_imm(5, ImmRepr::Unsigned);
        assert!(field.representable(31));
        assert!(!field.representable(32));
        assert!(!field.representable(-1));
    }

    #[test]
    fn split_immediate_round_trips() {
        let field = branch_imm();
        for value in [-4096, -8, -2, 0, 2, 8, 4094] {
            let word = field.encode(0, value);
            assert_eq!(field.decode(word), value, "value {value}");
        }
    }

    #[test]
    fn split_immediate_rejects_odd_offsets() {
        let field = branch_imm();
        assert!(!field.representable(3));
        assert!(field.representable(4));
    }

    #[test]
    fn pc_relative_resolution_subtracts_instruction_offset() {
        let field = branch_imm();
        let word = field.resolve(0, 0, 8).unwrap();
        assert_eq!(field.decode(word), -8);
        assert_eq!(field.resolve(0, 4095, 0), None);
    }

    #[test]
    fn opcode_field_builds_mask_and_bits() {
        match Field::opcode(12, 3, 0b101) {
            Field::Opcode { mask, bits } => {
                assert_eq!(mask, 0b111 << 12);
                assert_eq!(bits, 0b101 << 12);
            }
            _ => unreachable!(),
        }
    }
}
