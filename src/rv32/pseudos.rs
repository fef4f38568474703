// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Standard RV32I pseudo-instructions.
//!
//! Each entry rewrites one classified line into concrete instruction
//! lines during pass 1. Expansions emit one operand per token, so the
//! rewritten lines tokenize identically when re-read.

use crate::core::parser::{operand_atoms, SourceLine};
use crate::core::pseudo::PseudoInstruction;
use crate::core::text_utils::parse_int;
use crate::core::tokenizer::LineTokens;

fn atoms_of(line: &SourceLine) -> Vec<String> {
    operand_atoms(line.operand_tokens())
}

fn expect_operands(line: &SourceLine, name: &str, count: usize) -> Result<Vec<String>, String> {
    let atoms = atoms_of(line);
    if atoms.len() == count {
        Ok(atoms)
    } else {
        Err(format!(
            "'{name}' expects {count} operand(s), found {}",
            atoms.len()
        ))
    }
}

fn tokens(parts: &[&str]) -> LineTokens {
    parts.iter().map(|s| s.to_string()).collect()
}

/// `li rd, constant`: a single `addi` when the constant fits 12 signed
/// bits, otherwise `lui` of the carry-corrected high part followed by
/// `addi` of the sign-extended low part.
fn li() -> PseudoInstruction {
    PseudoInstruction::new("li", |line| {
        let atoms = expect_operands(line, "li", 2)?;
        let (rd, value) = (&atoms[0], &atoms[1]);
        let value = parse_int(value).ok_or_else(|| "'li' requires a constant value".to_string())?;
        if !(-(1i64 << 31)..=(1i64 << 32) - 1).contains(&value) {
            return Err(format!("'li' constant {value} does not fit in 32 bits"));
        }
        if (-2048..=2047).contains(&value) {
            return Ok(vec![tokens(&["addi", rd, "x0", &value.to_string()])]);
        }
        let bits = value as u32;
        let high = bits.wrapping_add(0x800) >> 12;
        let low = ((bits & 0xfff) as i32) << 20 >> 20;
        Ok(vec![
            tokens(&["lui", rd, &format!("{high:#x}")]),
            tokens(&["addi", rd, rd, &low.to_string()]),
        ])
    })
}

fn two_reg(name: &'static str, rewrite: fn(&str, &str) -> Vec<LineTokens>) -> PseudoInstruction {
    PseudoInstruction::new(name, move |line| {
        let atoms = expect_operands(line, name, 2)?;
        Ok(rewrite(&atoms[0], &atoms[1]))
    })
}

/// The standard pseudo set: li, nop, mv, not, neg, seqz, snez, j, jr,
/// ret, beqz, bnez.
#[must_use]
pub fn standard_set() -> Vec<PseudoInstruction> {
    vec![
        li(),
        PseudoInstruction::new("nop", |line| {
            expect_operands(line, "nop", 0)?;
            Ok(vec![tokens(&["addi", "x0", "x0", "0"])])
        }),
        two_reg("mv", |rd, rs| vec![tokens(&["addi", rd, rs, "0"])]),
        two_reg("not", |rd, rs| vec![tokens(&["xori", rd, rs, "-1"])]),
        two_reg("neg", |rd, rs| vec![tokens(&["sub", rd, "x0", rs])]),
        two_reg("seqz", |rd, rs| vec![tokens(&["sltiu", rd, rs, "1"])]),
        two_reg("snez", |rd, rs| vec![tokens(&["sltu", rd, "x0", rs])]),
        PseudoInstruction::new("j", |line| {
            let atoms = expect_operands(line, "j", 1)?;
            Ok(vec![tokens(&["jal", "x0", &atoms[0]])])
        }),
        PseudoInstruction::new("jr", |line| {
            let atoms = expect_operands(line, "jr", 1)?;
            Ok(vec![tokens(&["jalr", "x0", &atoms[0], "0"])])
        }),
        PseudoInstruction::new("ret", |line| {
            expect_operands(line, "ret", 0)?;
            Ok(vec![tokens(&["jalr", "x0", "x1", "0"])])
        }),
        two_reg("beqz", |rs, target| vec![tokens(&["beq", rs, "x0", target])]),
        two_reg("bnez", |rs, target| vec![tokens(&["bne", rs, "x0", target])]),
    ]
}

#[cfg(test)]
mod tests {
    use super::standard_set;
    use crate::core::parser::SourceLine;
    use crate::core::pseudo::PseudoInstruction;
    use crate::core::tokenizer::LineTokens;

    fn expand(text: &str) -> Result<Vec<LineTokens>, String> {
        let tokens: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        let set = standard_set();
        let pseudo: &PseudoInstruction = set
            .iter()
            .find(|p| p.name() == tokens[0])
            .expect("pseudo registered");
        let line = SourceLine {
            number: 0,
            symbols: Vec::new(),
            directives: Vec::new(),
            tokens,
        };
        pseudo
            .expand(&line)
            .map_err(|e| e.message().to_string())
    }

    #[test]
    fn small_li_is_a_single_addi() {
        assert_eq!(expand("li x5, 42").unwrap(), vec![vec!["addi", "x5", "x0", "42"]]);
        assert_eq!(
            expand("li x5, -2048").unwrap(),
            vec![vec!["addi", "x5", "x0", "-2048"]]
        );
    }

    #[test]
    fn large_li_splits_into_lui_and_addi() {
        assert_eq!(
            expand("li x5, 0x12345678").unwrap(),
            vec![
                vec!["lui", "x5", "0x12345"],
                vec!["addi", "x5", "x5", "1656"], // 0x678
            ]
        );
    }

    #[test]
    fn li_high_part_carries_when_low_is_negative() {
        // 0x12345FFF: low 12 bits sign-extend to -1, so lui takes 0x12346.
        assert_eq!(
            expand("li x5, 0x12345FFF").unwrap(),
            vec![
                vec!["lui", "x5", "0x12346"],
                vec!["addi", "x5", "x5", "-1"],
            ]
        );
    }

    #[test]
    fn li_rejects_symbols_and_oversized_constants() {
        assert!(expand("li x5, somewhere").is_err());
        assert!(expand("li x5, 0x123456789").is_err());
    }

    #[test]
    fn register_and_jump_shorthands() {
        assert_eq!(expand("nop").unwrap(), vec![vec!["addi", "x0", "x0", "0"]]);
        assert_eq!(expand("mv x5, x6").unwrap(), vec![vec!["addi", "x5", "x6", "0"]]);
        assert_eq!(expand("neg x5, x6").unwrap(), vec![vec!["sub", "x5", "x0", "x6"]]);
        assert_eq!(expand("j loop").unwrap(), vec![vec!["jal", "x0", "loop"]]);
        assert_eq!(expand("ret").unwrap(), vec![vec!["jalr", "x0", "x1", "0"]]);
        assert_eq!(
            expand("bnez x5, done").unwrap(),
            vec![vec!["bne", "x5", "x0", "done"]]
        );
    }

    #[test]
    fn arity_is_checked() {
        assert!(expand("mv x5").is_err());
        assert!(expand("nop x1").is_err());
    }
}
