// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Instruction entries: a mnemonic plus an ordered field table, with the
//! two inverse operations over it (encode a classified line, render a
//! matched word).

use crate::core::error::{AsmError, AsmErrorKind};
use crate::core::field::{Field, ImmLink, REG_FIELD_WIDTH};
use crate::core::isa::RegisterFile;
use crate::core::parser::{operand_atoms, SourceLine};
use crate::core::symbol_table::ReverseSymbolMap;
use crate::core::text_utils::is_identifier;
use crate::core::tokenizer::LineTokens;

/// A pending symbol resolution produced while encoding one instruction:
/// the index of the immediate field within the instruction's field table,
/// and the referenced symbol. Plain data; the owning instruction is
/// identified by its table index in the driver's
/// [`LinkRequest`](crate::assembler::LinkRequest).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLinkRequest {
    pub field: usize,
    pub symbol: String,
}

/// Result of encoding one line against an instruction entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledInstr {
    pub word: u32,
    /// Set when an immediate operand named a symbol; the field bits of
    /// `word` are zero and await linking.
    pub links_with_symbol: Option<FieldLinkRequest>,
}

/// One ISA table entry: mnemonic, field table, and the fixed bits that
/// identify the instruction when matching a word.
#[derive(Debug, Clone)]
pub struct Instruction {
    name: String,
    fields: Vec<Field>,
    operand_count: usize,
    opcode_mask: u32,
    opcode_bits: u32,
}

impl Instruction {
    /// Build an entry from its field table. The fixed mask/bits are
    /// accumulated from the `Opcode` fields; the operand count is derived
    /// from the highest operand index any field consumes.
    #[must_use]
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        let mut opcode_mask = 0u32;
        let mut opcode_bits = 0u32;
        let mut operand_count = 0usize;
        for field in &fields {
            match field {
                Field::Opcode { mask, bits } => {
                    opcode_mask |= mask;
                    opcode_bits |= bits;
                }
                Field::Reg(reg) => operand_count = operand_count.max(reg.operand + 1),
                Field::Imm(imm) => operand_count = operand_count.max(imm.operand + 1),
            }
        }
        Self {
            name: name.into(),
            fields,
            operand_count,
            opcode_mask,
            opcode_bits,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn operand_count(&self) -> usize {
        self.operand_count
    }

    /// Fixed-bit mask identifying this instruction for matching.
    #[must_use]
    pub fn opcode_mask(&self) -> u32 {
        self.opcode_mask
    }

    /// Fixed-bit values under [`opcode_mask`](Self::opcode_mask).
    #[must_use]
    pub fn opcode_bits(&self) -> u32 {
        self.opcode_bits
    }

    /// Encode a classified line into a 32-bit word. An identifier in an
    /// immediate position leaves the field zeroed and records a link
    /// request instead.
    ///
    /// # Errors
    ///
    /// Operand errors: wrong arity, unknown register, non-numeric
    /// non-identifier immediate, or an immediate outside the field range.
    pub fn assemble(
        &self,
        line: &SourceLine,
        registers: &RegisterFile,
    ) -> Result<AssembledInstr, AsmError> {
        let atoms = operand_atoms(line.operand_tokens());
        if atoms.len() != self.operand_count {
            return Err(AsmError::new(
                line.number,
                AsmErrorKind::Operand,
                format!(
                    "'{}' expects {} operand(s), found {}",
                    self.name,
                    self.operand_count,
                    atoms.len()
                ),
            ));
        }

        let mut word = 0u32;
        let mut links_with_symbol = None;
        for (index, field) in self.fields.iter().enumerate() {
            match field {
                Field::Opcode { bits, .. } => word |= bits,
                Field::Reg(reg) => {
                    let atom = &atoms[reg.operand];
                    let number = registers.parse(atom).ok_or_else(|| {
                        AsmError::new(
                            line.number,
                            AsmErrorKind::Operand,
                            format!("Unknown register '{atom}'"),
                        )
                    })?;
                    word |= number << reg.lsb;
                }
                Field::Imm(imm) => {
                    let atom = &atoms[imm.operand];
                    if let Some(value) = imm.parse(atom) {
                        let (lo, hi) = imm.range();
                        if value < lo || value > hi {
                            return Err(AsmError::new(
                                line.number,
                                AsmErrorKind::Operand,
                                format!("Immediate '{atom}' out of range [{lo}, {hi}]"),
                            ));
                        }
                        if !imm.representable(value) {
                            return Err(AsmError::new(
                                line.number,
                                AsmErrorKind::Operand,
                                format!("Misaligned immediate '{atom}'"),
                            ));
                        }
                        word = imm.encode(word, value);
                    } else if is_identifier(atom) {
                        if links_with_symbol.is_some() {
                            return Err(AsmError::new(
                                line.number,
                                AsmErrorKind::Operand,
                                format!("'{}' takes at most one symbolic operand", self.name),
                            ));
                        }
                        links_with_symbol = Some(FieldLinkRequest {
                            field: index,
                            symbol: atom.clone(),
                        });
                    } else {
                        return Err(AsmError::new(
                            line.number,
                            AsmErrorKind::Operand,
                            format!("Invalid immediate '{atom}'"),
                        ));
                    }
                }
            }
        }
        Ok(AssembledInstr {
            word,
            links_with_symbol,
        })
    }

    /// Render a matched word back into tokens: mnemonic first, then the
    /// operands in source order. Registers print by canonical name,
    /// immediates in decimal; PC-relative targets print as a label when the
    /// reverse map knows the target offset.
    ///
    /// # Errors
    ///
    /// Disassembly errors when the word contradicts the entry's fixed bits
    /// or a register number is outside the register file.
    pub fn disassemble(
        &self,
        word: u32,
        address: u32,
        symbols: &ReverseSymbolMap,
        registers: &RegisterFile,
    ) -> Result<LineTokens, AsmError> {
        let offset = address as usize;
        if word & self.opcode_mask != self.opcode_bits {
            return Err(AsmError::new(
                offset,
                AsmErrorKind::Disassembly,
                format!("Word does not encode '{}'", self.name),
            ));
        }
        let mut operands: Vec<Option<String>> = vec![None; self.operand_count];
        for field in &self.fields {
            match field {
                Field::Opcode { .. } => {}
                Field::Reg(reg) => {
                    let number = (word >> reg.lsb) & ((1 << REG_FIELD_WIDTH) - 1);
                    let name = registers.name(number).ok_or_else(|| {
                        AsmError::new(
                            offset,
                            AsmErrorKind::Disassembly,
                            format!("Invalid register number {number} in '{}'", self.name),
                        )
                    })?;
                    operands[reg.operand] = Some(name);
                }
                Field::Imm(imm) => {
                    let value = imm.decode(word);
                    let rendered = if imm.link == ImmLink::PcRelative {
                        let target = address.wrapping_add(value as u32);
                        symbols
                            .get(&target)
                            .cloned()
                            .unwrap_or_else(|| value.to_string())
                    } else {
                        value.to_string()
                    };
                    operands[imm.operand] = Some(rendered);
                }
            }
        }
        let mut tokens = LineTokens::with_capacity(self.operand_count + 1);
        tokens.push(self.name.clone());
        for (position, operand) in operands.into_iter().enumerate() {
            match operand {
                Some(text) => tokens.push(text),
                None => {
                    return Err(AsmError::new(
                        offset,
                        AsmErrorKind::Disassembly,
                        format!("'{}' has no field for operand {position}", self.name),
                    ))
                }
            }
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::Instruction;
    use crate::core::error::AsmErrorKind;
    use crate::core::field::{BitSlice, Field, ImmLink, ImmRepr};
    use crate::core::isa::RegisterFile;
    use crate::core::parser::SourceLine;
    use crate::core::symbol_table::ReverseSymbolMap;

    fn registers() -> RegisterFile {
        RegisterFile::new("x", 32)
    }

    // addi-shaped entry: rd, rs1, signed 12-bit immediate.
    fn addi() -> Instruction {
        Instruction::new(
            "addi",
            vec![
                Field::opcode(0, 7, 0b0010011),
                Field::opcode(12, 3, 0b000),
                Field::reg("rd", 0, 7),
                Field::reg("rs1", 1, 15),
                Field::imm(
                    2,
                    12,
                    ImmRepr::Signed,
                    ImmLink::Absolute,
                    vec![BitSlice::new(20, 12, 0)],
                ),
            ],
        )
    }

    fn line(tokens: &[&str]) -> SourceLine {
        SourceLine {
            number: 0,
            symbols: Vec::new(),
            directives: Vec::new(),
            tokens: tokens.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn assembles_register_and_immediate_operands() {
        let instr = addi();
        let out = instr
            .assemble(&line(&["addi", "x1,", "x0,", "5"]), &registers())
            .unwrap();
        assert_eq!(out.word, 0x0050_0093);
        assert!(out.links_with_symbol.is_none());
    }

    #[test]
    fn records_link_request_for_symbolic_immediate() {
        let instr = addi();
        let out = instr
            .assemble(&line(&["addi", "x1,", "x0,", "lo_part"]), &registers())
            .unwrap();
        assert_eq!(out.word, 0x0000_0093);
        let link = out.links_with_symbol.unwrap();
        assert_eq!(link.symbol, "lo_part");
        assert!(matches!(instr.fields()[link.field], Field::Imm(_)));
    }

    #[test]
    fn rejects_wrong_arity() {
        let err = addi()
            .assemble(&line(&["addi", "x1,", "x0"]), &registers())
            .unwrap_err();
        assert_eq!(err.kind(), AsmErrorKind::Operand);
        assert!(err.message().contains("expects 3 operand(s)"));
    }

    #[test]
    fn rejects_unknown_register() {
        let err = addi()
            .assemble(&line(&["addi", "x99,", "x0,", "5"]), &registers())
            .unwrap_err();
        assert!(err.message().contains("Unknown register 'x99'"));
    }

    #[test]
    fn rejects_out_of_range_immediate() {
        let instr = addi();
        assert!(instr
            .assemble(&line(&["addi", "x1,", "x0,", "2047"]), &registers())
            .is_ok());
        let err = instr
            .assemble(&line(&["addi", "x1,", "x0,", "2048"]), &registers())
            .unwrap_err();
        assert!(err.message().contains("out of range [-2048, 2047]"));
    }

    #[test]
    fn disassembles_back_to_tokens() {
        let instr = addi();
        let tokens = instr
            .disassemble(0x0050_0093, 0, &ReverseSymbolMap::new(), &registers())
            .unwrap();
        assert_eq!(tokens, vec!["addi", "x1", "x0", "5"]);
    }
}
