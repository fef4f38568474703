// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Word-to-instruction matching for the disassembler.
//!
//! Built once from the instruction table: entries are bucketed by their
//! fixed bits under the table-wide common mask (the base opcode bits on
//! most fixed-width ISAs), then matched linearly within a bucket.
//! Ambiguity between two entries is detected at construction time.

use crate::core::instruction::Instruction;
use crate::core::isa::IsaError;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
struct MatchEntry {
    mask: u32,
    bits: u32,
    index: usize,
}

/// Decision structure mapping a 32-bit word to its instruction-table index.
#[derive(Debug, Clone)]
pub struct Matcher {
    base_mask: u32,
    buckets: HashMap<u32, Vec<MatchEntry>>,
}

impl Matcher {
    /// # Errors
    ///
    /// [`IsaError::AmbiguousEncoding`] when two entries' fixed bits agree
    /// on their shared mask, i.e. some word would match both.
    pub fn new(instructions: &[Instruction]) -> Result<Self, IsaError> {
        let base_mask = instructions
            .iter()
            .fold(!0u32, |mask, instr| mask & instr.opcode_mask());

        let mut buckets: HashMap<u32, Vec<MatchEntry>> = HashMap::new();
        for (index, instr) in instructions.iter().enumerate() {
            let entry = MatchEntry {
                mask: instr.opcode_mask(),
                bits: instr.opcode_bits(),
                index,
            };
            let bucket = buckets.entry(instr.opcode_bits() & base_mask).or_default();
            for other in bucket.iter() {
                let shared = entry.mask & other.mask;
                if entry.bits & shared == other.bits & shared {
                    return Err(IsaError::AmbiguousEncoding(
                        instructions[other.index].name().to_string(),
                        instr.name().to_string(),
                    ));
                }
            }
            bucket.push(entry);
        }
        log::trace!(
            "matcher built: {} instructions in {} buckets",
            instructions.len(),
            buckets.len()
        );
        Ok(Self { base_mask, buckets })
    }

    /// Find the unique instruction whose fixed bits match `word`.
    #[must_use]
    pub fn match_word(&self, word: u32) -> Option<usize> {
        self.buckets
            .get(&(word & self.base_mask))?
            .iter()
            .find(|entry| word & entry.mask == entry.bits)
            .map(|entry| entry.index)
    }
}

#[cfg(test)]
mod tests {
    use super::Matcher;
    use crate::core::field::Field;
    use crate::core::instruction::Instruction;
    use crate::core::isa::IsaError;

    fn entry(name: &str, opcode: u32, funct3: Option<u32>) -> Instruction {
        let mut fields = vec![Field::opcode(0, 7, opcode)];
        if let Some(funct3) = funct3 {
            fields.push(Field::opcode(12, 3, funct3));
        }
        Instruction::new(name, fields)
    }

    #[test]
    fn matches_by_fixed_bits() {
        let table = vec![
            entry("one", 0b0010011, Some(0b000)),
            entry("two", 0b0010011, Some(0b111)),
            entry("three", 0b0110111, None),
        ];
        let matcher = Matcher::new(&table).unwrap();
        assert_eq!(matcher.match_word(0b0010011), Some(0));
        assert_eq!(matcher.match_word(0b111 << 12 | 0b0010011), Some(1));
        assert_eq!(matcher.match_word(0b001 << 12 | 0b0010011), None);
        assert_eq!(matcher.match_word(0b0110111), Some(2));
    }

    #[test]
    fn unknown_word_is_none() {
        let matcher = Matcher::new(&[entry("only", 0b0010011, None)]).unwrap();
        assert_eq!(matcher.match_word(0b1111111), None);
    }

    #[test]
    fn ambiguous_entries_fail_construction() {
        // Identical fixed bits.
        let err = Matcher::new(&[
            entry("a", 0b0010011, Some(0b000)),
            entry("b", 0b0010011, Some(0b000)),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            IsaError::AmbiguousEncoding("a".to_string(), "b".to_string())
        );

        // A narrower mask subsuming a wider one.
        let err = Matcher::new(&[entry("wide", 0b0010011, None), entry("narrow", 0b0010011, Some(0b010))])
            .unwrap_err();
        assert!(matches!(err, IsaError::AmbiguousEncoding(_, _)));
    }
}
