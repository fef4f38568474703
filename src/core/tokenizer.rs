// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Tokenizer for assembly source lines.
//!
//! The tokenizer is ISA-agnostic. Register detection is provided via a
//! function passed to [`tokenize`], and is used to keep memory-operand
//! syntax separable: a boundary is created before `(` when the identifier
//! inside the parentheses is a register, and after the matching `)`.
//! Commas stay inside tokens; the operand flattening in
//! [`parser`](crate::core::parser) subdivides them later.

use crate::core::error::{AsmError, AsmErrorKind};
use crate::core::text_utils::{is_ident_char, is_space};

/// One source token. Quoted literals keep their quotes and interior
/// whitespace verbatim.
pub type Token = String;

/// The ordered tokens of one logical source line.
pub type LineTokens = Vec<Token>;

struct Scanner<'a> {
    input: &'a [u8],
    cursor: usize,
}

impl<'a> Scanner<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            input: line.as_bytes(),
            cursor: 0,
        }
    }

    fn current_byte(&self) -> u8 {
        self.input.get(self.cursor).copied().unwrap_or(0)
    }

    fn peek_byte(&self, offset: usize) -> u8 {
        self.input.get(self.cursor + offset).copied().unwrap_or(0)
    }

    /// If the cursor sits on `(ident)` where `ident` is a register, return
    /// the byte length of the whole group.
    fn register_group_len(&self, is_register: &dyn Fn(&str) -> bool) -> Option<usize> {
        if self.current_byte() != b'(' {
            return None;
        }
        let mut end = 1;
        while is_ident_char(self.peek_byte(end)) {
            end += 1;
        }
        if end == 1 || self.peek_byte(end) != b')' {
            return None;
        }
        let ident = std::str::from_utf8(&self.input[self.cursor + 1..self.cursor + end]).ok()?;
        if is_register(ident) {
            Some(end + 1)
        } else {
            None
        }
    }
}

/// Split one source line into tokens.
///
/// Token boundaries sit at spaces and tabs, and around `(register)` groups.
/// A `"`-quoted region becomes part of a single token, retaining interior
/// whitespace and commas; backslash escapes pass through unmodified for the
/// directive layer to interpret.
///
/// # Errors
///
/// Returns a lex error when a quote is left unterminated.
pub fn tokenize(
    line: &str,
    line_number: usize,
    is_register: &dyn Fn(&str) -> bool,
) -> Result<LineTokens, AsmError> {
    let mut scanner = Scanner::new(line);
    let mut tokens = LineTokens::new();
    let mut current = String::new();

    let flush = |current: &mut String, tokens: &mut LineTokens| {
        if !current.is_empty() {
            tokens.push(std::mem::take(current));
        }
    };

    while scanner.cursor < scanner.input.len() {
        let c = scanner.current_byte();
        if is_space(c) {
            flush(&mut current, &mut tokens);
            scanner.cursor += 1;
        } else if c == b'"' {
            let start = scanner.cursor;
            scanner.cursor += 1;
            while scanner.cursor < scanner.input.len() && scanner.current_byte() != b'"' {
                if scanner.current_byte() == b'\\' {
                    scanner.cursor += 1;
                }
                scanner.cursor += 1;
            }
            if scanner.current_byte() != b'"' {
                return Err(AsmError::new(
                    line_number,
                    AsmErrorKind::Lex,
                    format!("Unterminated quote: {}", &line[start.min(line.len())..]),
                ));
            }
            scanner.cursor += 1;
            current.push_str(&line[start..scanner.cursor]);
        } else if let Some(len) = scanner.register_group_len(is_register) {
            flush(&mut current, &mut tokens);
            tokens.push(line[scanner.cursor..scanner.cursor + len].to_string());
            scanner.cursor += len;
        } else {
            current.push(c as char);
            scanner.cursor += 1;
        }
    }
    flush(&mut current, &mut tokens);
    Ok(tokens)
}
