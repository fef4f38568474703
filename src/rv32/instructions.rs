// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! RV32I base instruction table.
//!
//! Entries are built per encoding format; the bit layouts follow the
//! RISC-V unprivileged specification:
//!
//! ```text
//! R: funct7[31:25] rs2[24:20] rs1[19:15] funct3[14:12] rd[11:7] opcode[6:0]
//! I: imm[31:20]               rs1[19:15] funct3[14:12] rd[11:7] opcode[6:0]
//! S: imm[11:5]    rs2[24:20]  rs1[19:15] funct3[14:12] imm[4:0] opcode[6:0]
//! B: imm[12|10:5] rs2[24:20]  rs1[19:15] funct3[14:12] imm[4:1|11] opcode[6:0]
//! U: imm[31:12]                                        rd[11:7] opcode[6:0]
//! J: imm[20|10:1|11|19:12]                             rd[11:7] opcode[6:0]
//! ```

use crate::core::field::{BitSlice, Field, ImmLink, ImmRepr};
use crate::core::instruction::Instruction;

const OP_LUI: u32 = 0b0110111;
const OP_AUIPC: u32 = 0b0010111;
const OP_JAL: u32 = 0b1101111;
const OP_JALR: u32 = 0b1100111;
const OP_BRANCH: u32 = 0b1100011;
const OP_LOAD: u32 = 0b0000011;
const OP_STORE: u32 = 0b0100011;
const OP_OP_IMM: u32 = 0b0010011;
const OP_OP: u32 = 0b0110011;
const OP_SYSTEM: u32 = 0b1110011;

/// `name rd, rs1, rs2`
fn r_type(name: &str, funct3: u32, funct7: u32) -> Instruction {
    Instruction::new(
        name,
        vec![
            Field::opcode(0, 7, OP_OP),
            Field::opcode(12, 3, funct3),
            Field::opcode(25, 7, funct7),
            Field::reg("rd", 0, 7),
            Field::reg("rs1", 1, 15),
            Field::reg("rs2", 2, 20),
        ],
    )
}

/// `name rd, rs1, imm` with a sign-extended 12-bit immediate.
fn i_type(name: &str, opcode: u32, funct3: u32) -> Instruction {
    Instruction::new(
        name,
        vec![
            Field::opcode(0, 7, opcode),
            Field::opcode(12, 3, funct3),
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

/// `name rd, rs1, shamt` with a 5-bit shift amount and funct7 tag.
fn shift_imm(name: &str, funct3: u32, funct7: u32) -> Instruction {
    Instruction::new(
        name,
        vec![
            Field::opcode(0, 7, OP_OP_IMM),
            Field::opcode(12, 3, funct3),
            Field::opcode(25, 7, funct7),
            Field::reg("rd", 0, 7),
            Field::reg("rs1", 1, 15),
            Field::imm(
                2,
                5,
                ImmRepr::Unsigned,
                ImmLink::Absolute,
                vec![BitSlice::new(20, 5, 0)],
            ),
        ],
    )
}

/// `name rd, imm(rs1)`
fn load(name: &str, funct3: u32) -> Instruction {
    Instruction::new(
        name,
        vec![
            Field::opcode(0, 7, OP_LOAD),
            Field::opcode(12, 3, funct3),
            Field::reg("rd", 0, 7),
            Field::imm(
                1,
                12,
                ImmRepr::Signed,
                ImmLink::Absolute,
                vec![BitSlice::new(20, 12, 0)],
            ),
            Field::reg("rs1", 2, 15),
        ],
    )
}

/// `name rs2, imm(rs1)` with the immediate split around rs2/rs1.
fn store(name: &str, funct3: u32) -> Instruction {
    Instruction::new(
        name,
        vec![
            Field::opcode(0, 7, OP_STORE),
            Field::opcode(12, 3, funct3),
            Field::reg("rs2", 0, 20),
            Field::imm(
                1,
                12,
                ImmRepr::Signed,
                ImmLink::Absolute,
                vec![BitSlice::new(25, 7, 5), BitSlice::new(7, 5, 0)],
            ),
            Field::reg("rs1", 2, 15),
        ],
    )
}

/// `name rs1, rs2, offset` with the PC-relative 13-bit branch immediate.
fn branch(name: &str, funct3: u32) -> Instruction {
    Instruction::new(
        name,
        vec![
            Field::opcode(0, 7, OP_BRANCH),
            Field::opcode(12, 3, funct3),
            Field::reg("rs1", 0, 15),
            Field::reg("rs2", 1, 20),
            Field::imm(
                2,
                13,
                ImmRepr::Signed,
                ImmLink::PcRelative,
                vec![
                    BitSlice::new(31, 1, 12),
                    BitSlice::new(25, 6, 5),
                    BitSlice::new(8, 4, 1),
                    BitSlice::new(7, 1, 11),
                ],
            ),
        ],
    )
}

/// `name rd, imm` with the upper-immediate placed at word[31:12].
fn u_type(name: &str, opcode: u32) -> Instruction {
    Instruction::new(
        name,
        vec![
            Field::opcode(0, 7, opcode),
            Field::reg("rd", 0, 7),
            Field::imm(
                1,
                20,
                ImmRepr::Unsigned,
                ImmLink::Absolute,
                vec![BitSlice::new(12, 20, 0)],
            ),
        ],
    )
}

/// `jal rd, offset` with the PC-relative 21-bit jump immediate.
fn jal() -> Instruction {
    Instruction::new(
        "jal",
        vec![
            Field::opcode(0, 7, OP_JAL),
            Field::reg("rd", 0, 7),
            Field::imm(
                1,
                21,
                ImmRepr::Signed,
                ImmLink::PcRelative,
                vec![
                    BitSlice::new(31, 1, 20),
                    BitSlice::new(21, 10, 1),
                    BitSlice::new(20, 1, 11),
                    BitSlice::new(12, 8, 12),
                ],
            ),
        ],
    )
}

/// Operand-less SYSTEM instruction; the whole word is fixed.
fn system(name: &str, funct12: u32) -> Instruction {
    Instruction::new(
        name,
        vec![
            Field::opcode(0, 7, OP_SYSTEM),
            Field::opcode(7, 13, 0),
            Field::opcode(20, 12, funct12),
        ],
    )
}

/// The complete RV32I base integer set (FENCE and CSR forms excluded).
#[must_use]
pub fn base_set() -> Vec<Instruction> {
    vec![
        u_type("lui", OP_LUI),
        u_type("auipc", OP_AUIPC),
        jal(),
        i_type("jalr", OP_JALR, 0b000),
        branch("beq", 0b000),
        branch("bne", 0b001),
        branch("blt", 0b100),
        branch("bge", 0b101),
        branch("bltu", 0b110),
        branch("bgeu", 0b111),
        load("lb", 0b000),
        load("lh", 0b001),
        load("lw", 0b010),
        load("lbu", 0b100),
        load("lhu", 0b101),
        store("sb", 0b000),
        store("sh", 0b001),
        store("sw", 0b010),
        i_type("addi", OP_OP_IMM, 0b000),
        i_type("slti", OP_OP_IMM, 0b010),
        i_type("sltiu", OP_OP_IMM, 0b011),
        i_type("xori", OP_OP_IMM, 0b100),
        i_type("ori", OP_OP_IMM, 0b110),
        i_type("andi", OP_OP_IMM, 0b111),
        shift_imm("slli", 0b001, 0b0000000),
        shift_imm("srli", 0b101, 0b0000000),
        shift_imm("srai", 0b101, 0b0100000),
        r_type("add", 0b000, 0b0000000),
        r_type("sub", 0b000, 0b0100000),
        r_type("sll", 0b001, 0b0000000),
        r_type("slt", 0b010, 0b0000000),
        r_type("sltu", 0b011, 0b0000000),
        r_type("xor", 0b100, 0b0000000),
        r_type("srl", 0b101, 0b0000000),
        r_type("sra", 0b101, 0b0100000),
        r_type("or", 0b110, 0b0000000),
        r_type("and", 0b111, 0b0000000),
        system("ecall", 0b000000000000),
        system("ebreak", 0b000000000001),
    ]
}

#[cfg(test)]
mod tests {
    use super::base_set;
    use crate::core::parser::SourceLine;
    use crate::core::symbol_table::ReverseSymbolMap;
    use crate::rv32::register_file;

    fn encode(text: &str) -> u32 {
        let registers = register_file();
        let is_register = |name: &str| registers.is_register(name);
        let tokens = crate::core::tokenizer::tokenize(text, 0, &is_register).unwrap();
        let table = base_set();
        let instr = table
            .iter()
            .find(|i| i.name() == tokens[0])
            .expect("mnemonic in table");
        let line = SourceLine {
            number: 0,
            symbols: Vec::new(),
            directives: Vec::new(),
            tokens,
        };
        let out = instr.assemble(&line, &registers).expect("assembles");
        assert!(out.links_with_symbol.is_none(), "unexpected link request");
        out.word
    }

    #[test]
    fn encodes_alu_immediate_forms() {
        assert_eq!(encode("addi x1, x0, 5"), 0x0050_0093);
        assert_eq!(encode("addi x0, x0, 0"), 0x0000_0013); // canonical nop
        assert_eq!(encode("andi x5, x6, -1"), 0xfff3_7293);
        assert_eq!(encode("slli x1, x2, 3"), 0x0031_1093);
        assert_eq!(encode("srai x1, x2, 3"), 0x4031_5093);
    }

    #[test]
    fn encodes_register_forms() {
        assert_eq!(encode("add x1, x2, x3"), 0x0031_00b3);
        assert_eq!(encode("sub x1, x2, x3"), 0x4031_00b3);
        assert_eq!(encode("and x7, x8, x9"), 0x0094_73b3);
    }

    #[test]
    fn encodes_loads_and_stores() {
        assert_eq!(encode("lw x5, 8(x6)"), 0x0083_2283);
        assert_eq!(encode("sw x5, 12(x6)"), 0x0053_2623);
        assert_eq!(encode("lbu x10, -1(x11)"), 0xfff5_c503);
    }

    #[test]
    fn encodes_upper_immediates() {
        assert_eq!(encode("lui x5, 0x12345"), 0x1234_52b7);
        assert_eq!(encode("auipc x1, 1"), 0x0000_1097);
    }

    #[test]
    fn encodes_jumps_and_branches() {
        assert_eq!(encode("jal x1, 8"), 0x0080_00ef);
        assert_eq!(encode("jal x1, -8"), 0xff9f_f0ef);
        assert_eq!(encode("beq x1, x2, 8"), 0x0020_8463);
        assert_eq!(encode("jalr x1, x2, 4"), 0x0041_00e7);
    }

    #[test]
    fn encodes_system_instructions() {
        assert_eq!(encode("ecall"), 0x0000_0073);
        assert_eq!(encode("ebreak"), 0x0010_0073);
    }

    #[test]
    fn abi_register_names_are_accepted() {
        assert_eq!(encode("addi ra, zero, 5"), encode("addi x1, x0, 5"));
        assert_eq!(encode("lw t0, 8(t1)"), encode("lw x5, 8(x6)"));
    }

    #[test]
    fn word_round_trips_through_disassemble() {
        let registers = register_file();
        let table = base_set();
        let sw = table.iter().find(|i| i.name() == "sw").unwrap();
        let tokens = sw
            .disassemble(0x0053_2623, 0, &ReverseSymbolMap::new(), &registers)
            .unwrap();
        assert_eq!(tokens, vec!["sw", "x5", "12", "x6"]);
    }
}
