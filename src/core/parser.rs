// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Line classification: comment stripping, symbol and directive extraction.
//!
//! A tokenized line is reduced to a [`SourceLine`]: its label definitions,
//! its directive names, and the remaining instruction/operand tokens.
//! Symbols and directives may only appear as a prefix of the line, symbols
//! before directives.

use crate::core::error::{AsmError, AsmErrorKind};
use crate::core::text_utils::is_identifier;
use crate::core::tokenizer::LineTokens;

/// One classified source line.
///
/// `symbols` and `directives` are populated during pass 0 only; later
/// passes read them. Both preserve source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLine {
    /// Zero-based index of the originating source line.
    pub number: usize,
    /// Labels defined on this line (carried labels included).
    pub symbols: Vec<String>,
    /// Directive names (with their leading `.`) extracted from the prefix.
    pub directives: Vec<String>,
    /// Remaining tokens: mnemonic followed by operand tokens.
    pub tokens: LineTokens,
}

impl SourceLine {
    pub fn new(number: usize) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    /// First remaining token, i.e. the instruction mnemonic if any.
    #[must_use]
    pub fn mnemonic(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Operand tokens following the mnemonic.
    #[must_use]
    pub fn operand_tokens(&self) -> &[String] {
        if self.tokens.is_empty() {
            &[]
        } else {
            &self.tokens[1..]
        }
    }
}

/// Truncate the token stream at the first token containing the comment
/// delimiter; that token and everything after it are discarded. Quoted
/// tokens are never comment candidates.
#[must_use]
pub fn split_comment_from_line(tokens: LineTokens, delimiter: char) -> LineTokens {
    let mut kept = LineTokens::with_capacity(tokens.len());
    for token in tokens {
        if !token.starts_with('"') && token.contains(delimiter) {
            break;
        }
        kept.push(token);
    }
    kept
}

/// Extract prefix symbol definitions (`name:`) from the token stream.
///
/// # Errors
///
/// A colon token after the symbol prefix, an invalid symbol name, or a
/// symbol defined twice on one line is an error.
pub fn split_symbols_from_line(
    tokens: LineTokens,
    line_number: usize,
) -> Result<(Vec<String>, LineTokens), AsmError> {
    let mut symbols = Vec::new();
    let mut remaining = LineTokens::with_capacity(tokens.len());
    let mut symbols_allowed = true;
    for token in tokens {
        if let Some(name) = token.strip_suffix(':') {
            if !symbols_allowed || !is_identifier(name) {
                return Err(AsmError::new(
                    line_number,
                    AsmErrorKind::Structure,
                    "Stray ':' in line",
                ));
            }
            if symbols.iter().any(|s| s == name) {
                return Err(AsmError::new(
                    line_number,
                    AsmErrorKind::DuplicateSymbol,
                    format!("Multiple definitions of symbol '{name}'"),
                ));
            }
            symbols.push(name.to_string());
        } else if token.contains(':') && !token.starts_with('"') {
            return Err(AsmError::new(
                line_number,
                AsmErrorKind::Structure,
                "Stray ':' in line",
            ));
        } else {
            remaining.push(token);
            symbols_allowed = false;
        }
    }
    Ok((symbols, remaining))
}

/// Extract prefix directive names (`.xxx`) from the token stream.
///
/// # Errors
///
/// A `.`-token after the directive prefix is an error.
pub fn split_directives_from_line(
    tokens: LineTokens,
    line_number: usize,
) -> Result<(Vec<String>, LineTokens), AsmError> {
    let mut directives = Vec::new();
    let mut remaining = LineTokens::with_capacity(tokens.len());
    let mut directives_allowed = true;
    for token in tokens {
        if token.starts_with('.') {
            if !directives_allowed {
                return Err(AsmError::new(
                    line_number,
                    AsmErrorKind::Structure,
                    "Stray '.' in line",
                ));
            }
            directives.push(token);
        } else {
            remaining.push(token);
            directives_allowed = false;
        }
    }
    Ok((directives, remaining))
}

/// Flatten operand tokens into operand atoms: comma-separated pieces are
/// split apart and `(register)` groups unwrapped, so `["x5,0", "(x6)"]`
/// becomes `["x5", "0", "x6"]`. Quoted tokens pass through whole.
#[must_use]
pub fn operand_atoms(tokens: &[String]) -> Vec<String> {
    let mut atoms = Vec::with_capacity(tokens.len());
    for token in tokens {
        if token.starts_with('"') {
            atoms.push(token.trim_end_matches(',').to_string());
        } else if token.len() >= 2 && token.starts_with('(') && token.ends_with(')') {
            atoms.push(token[1..token.len() - 1].to_string());
        } else {
            atoms.extend(
                token
                    .split(',')
                    .filter(|piece| !piece.is_empty())
                    .map(str::to_string),
            );
        }
    }
    atoms
}
