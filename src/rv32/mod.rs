// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! RV32I descriptor: the base integer instruction set, standard
//! pseudo-instructions, and the default directive set, wired into an
//! [`Isa`] the driver can consume.

pub mod instructions;
pub mod pseudos;

use crate::core::directive::standard_directives;
use crate::core::isa::{Endianness, Isa, IsaBuilder, RegisterFile};

/// The 32 integer registers with their standard ABI aliases.
#[must_use]
pub fn register_file() -> RegisterFile {
    RegisterFile::new("x", 32)
        .with_alias("zero", 0)
        .with_alias("ra", 1)
        .with_alias("sp", 2)
        .with_alias("gp", 3)
        .with_alias("tp", 4)
        .with_alias("t0", 5)
        .with_alias("t1", 6)
        .with_alias("t2", 7)
        .with_alias("s0", 8)
        .with_alias("fp", 8)
        .with_alias("s1", 9)
        .with_alias("a0", 10)
        .with_alias("a1", 11)
        .with_alias("a2", 12)
        .with_alias("a3", 13)
        .with_alias("a4", 14)
        .with_alias("a5", 15)
        .with_alias("a6", 16)
        .with_alias("a7", 17)
        .with_alias("s2", 18)
        .with_alias("s3", 19)
        .with_alias("s4", 20)
        .with_alias("s5", 21)
        .with_alias("s6", 22)
        .with_alias("s7", 23)
        .with_alias("s8", 24)
        .with_alias("s9", 25)
        .with_alias("s10", 26)
        .with_alias("s11", 27)
        .with_alias("t3", 28)
        .with_alias("t4", 29)
        .with_alias("t5", 30)
        .with_alias("t6", 31)
}

/// Build the RV32I descriptor: `#` comments, little-endian words.
#[must_use]
pub fn isa() -> Isa {
    IsaBuilder::new("RV32I", '#', Endianness::Little, register_file())
        .instructions(instructions::base_set())
        .pseudos(pseudos::standard_set())
        .directives(standard_directives(Endianness::Little))
        .build()
        .expect("RV32I descriptor tables are consistent")
}

#[cfg(test)]
mod tests {
    use super::{isa, register_file};

    #[test]
    fn abi_aliases_resolve_to_register_numbers() {
        let regs = register_file();
        assert_eq!(regs.parse("zero"), Some(0));
        assert_eq!(regs.parse("ra"), Some(1));
        assert_eq!(regs.parse("sp"), Some(2));
        assert_eq!(regs.parse("fp"), Some(8));
        assert_eq!(regs.parse("s0"), Some(8));
        assert_eq!(regs.parse("a7"), Some(17));
        assert_eq!(regs.parse("t6"), Some(31));
    }

    #[test]
    fn descriptor_builds() {
        let isa = isa();
        assert_eq!(isa.name(), "RV32I");
        assert!(isa.instruction("addi").is_some());
        assert!(isa.pseudo("li").is_some());
        assert!(isa.directive(".word").is_some());
    }
}
