// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Error types and diagnostics for the assembler core.
//!
//! All recoverable failures are carried as [`AsmError`] values keyed by the
//! zero-based source line (assembly) or byte offset (disassembly); passes
//! collect them into [`Errors`] rather than aborting on the first one.

use std::fmt;

/// Categories of assembler and disassembler errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsmErrorKind {
    /// Tokenization failure (e.g. unterminated quote).
    Lex,
    /// Misplaced symbol or directive token.
    Structure,
    /// Symbol bound more than once.
    DuplicateSymbol,
    /// Mnemonic not present in the ISA table.
    UnknownOpcode,
    /// Bad operand: arity, register name, or immediate range.
    Operand,
    /// Malformed or unknown directive.
    Directive,
    /// Referenced symbol never defined.
    UnresolvedSymbol,
    /// No instruction matches a word, or field decoding failed.
    Disassembly,
    /// Fatal input precondition violation (unaligned disassembly input).
    Precondition,
}

impl AsmErrorKind {
    fn label(self) -> &'static str {
        match self {
            AsmErrorKind::Lex => "lex",
            AsmErrorKind::Structure => "structure",
            AsmErrorKind::DuplicateSymbol => "symbol",
            AsmErrorKind::UnknownOpcode => "opcode",
            AsmErrorKind::Operand => "operand",
            AsmErrorKind::Directive => "directive",
            AsmErrorKind::UnresolvedSymbol => "link",
            AsmErrorKind::Disassembly => "disassembly",
            AsmErrorKind::Precondition => "precondition",
        }
    }
}

impl fmt::Display for AsmErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A diagnostic tied to one source line (or byte offset for disassembly).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsmError {
    line: usize,
    kind: AsmErrorKind,
    message: String,
}

impl AsmError {
    pub fn new(line: usize, kind: AsmErrorKind, message: impl Into<String>) -> Self {
        Self {
            line,
            kind,
            message: message.into(),
        }
    }

    /// Zero-based source line; the byte offset for disassembly errors.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    #[must_use]
    pub fn kind(&self) -> AsmErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.line, self.kind, self.message)
    }
}

impl std::error::Error for AsmError {}

/// Ordered collection of diagnostics from one pass.
pub type Errors = Vec<AsmError>;

#[cfg(test)]
mod tests {
    use super::{AsmError, AsmErrorKind};

    #[test]
    fn display_includes_line_kind_and_message() {
        let err = AsmError::new(12, AsmErrorKind::Operand, "Unknown register 'x99'");
        assert_eq!(err.to_string(), "12: operand: Unknown register 'x99'");
    }
}
