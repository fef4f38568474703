// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Assembler directives: segment selectors and data emitters.
//!
//! A directive either emits raw bytes or switches the driver's current
//! segment. Handlers are pure; segment switches are expressed as data in
//! [`DirectiveOutcome`] and applied by the driver, which keeps `assemble`
//! re-entrant.

use crate::core::error::{AsmError, AsmErrorKind};
use crate::core::isa::Endianness;
use crate::core::parser::{operand_atoms, SourceLine};
use crate::core::text_utils::parse_int;
use std::fmt;
use std::sync::Arc;

/// Name of the instruction segment.
pub const TEXT_SEGMENT: &str = ".text";
/// Name of the data segment.
pub const DATA_SEGMENT: &str = ".data";

/// What handling a directive produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveOutcome {
    /// Literal bytes to append to the image.
    Emit(Vec<u8>),
    /// Switch the driver's current segment; nothing is emitted.
    Segment(String),
}

pub type DirectiveHandler =
    Arc<dyn Fn(&SourceLine) -> Result<DirectiveOutcome, String> + Send + Sync>;

/// A named directive entry.
#[derive(Clone)]
pub struct Directive {
    name: String,
    handler: DirectiveHandler,
}

impl Directive {
    pub fn new(
        name: impl Into<String>,
        handler: impl Fn(&SourceLine) -> Result<DirectiveOutcome, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            handler: Arc::new(handler),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// # Errors
    ///
    /// Directive errors reported by the handler, attributed to the line.
    pub fn handle(&self, line: &SourceLine) -> Result<DirectiveOutcome, AsmError> {
        (self.handler)(line)
            .map_err(|message| AsmError::new(line.number, AsmErrorKind::Directive, message))
    }
}

impl fmt::Debug for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directive").field("name", &self.name).finish()
    }
}

/// The default directive set handed to ISA descriptors: `.text`/`.data`
/// segment selectors, `.byte`/`.half`/`.word` integer emitters in the
/// ISA's endianness, NUL-terminated `.string`, and `.zero`.
#[must_use]
pub fn standard_directives(endianness: Endianness) -> Vec<Directive> {
    vec![
        segment_selector(TEXT_SEGMENT),
        segment_selector(DATA_SEGMENT),
        int_emitter(".byte", 1, endianness),
        int_emitter(".half", 2, endianness),
        int_emitter(".word", 4, endianness),
        string_emitter(".string"),
        zero_emitter(".zero"),
    ]
}

fn segment_selector(name: &'static str) -> Directive {
    Directive::new(name, move |_line| {
        Ok(DirectiveOutcome::Segment(name.to_string()))
    })
}

fn int_emitter(name: &'static str, size: usize, endianness: Endianness) -> Directive {
    // Accept the union of the signed and unsigned ranges for the size.
    let lo = -(1i64 << (8 * size - 1));
    let hi = (1i64 << (8 * size)) - 1;
    Directive::new(name, move |line: &SourceLine| {
        let atoms = operand_atoms(&line.tokens);
        if atoms.is_empty() {
            return Err(format!("'{name}' expects at least one value"));
        }
        let mut bytes = Vec::with_capacity(atoms.len() * size);
        for atom in &atoms {
            let value =
                parse_int(atom).ok_or_else(|| format!("Malformed value '{atom}' for '{name}'"))?;
            if value < lo || value > hi {
                return Err(format!("Value '{atom}' out of range [{lo}, {hi}] for '{name}'"));
            }
            let word = value as u32;
            match endianness {
                Endianness::Little => bytes.extend_from_slice(&word.to_le_bytes()[..size]),
                Endianness::Big => bytes.extend_from_slice(&word.to_be_bytes()[4 - size..]),
            }
        }
        Ok(DirectiveOutcome::Emit(bytes))
    })
}

fn string_emitter(name: &'static str) -> Directive {
    Directive::new(name, move |line: &SourceLine| {
        let atoms = operand_atoms(&line.tokens);
        if atoms.is_empty() {
            return Err(format!("'{name}' expects a quoted string"));
        }
        let mut bytes = Vec::new();
        for atom in &atoms {
            let inner = atom
                .strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
                .ok_or_else(|| format!("'{name}' expects a quoted string, found '{atom}'"))?;
            bytes.extend(unescape(inner)?);
            bytes.push(0);
        }
        Ok(DirectiveOutcome::Emit(bytes))
    })
}

fn zero_emitter(name: &'static str) -> Directive {
    Directive::new(name, move |line: &SourceLine| {
        let atoms = operand_atoms(&line.tokens);
        let [atom] = atoms.as_slice() else {
            return Err(format!("'{name}' expects a single byte count"));
        };
        let count = parse_int(atom)
            .filter(|&n| n >= 0)
            .ok_or_else(|| format!("Malformed byte count '{atom}' for '{name}'"))?;
        Ok(DirectiveOutcome::Emit(vec![0u8; count as usize]))
    })
}

/// Interpret backslash escapes inside a string literal's body.
fn unescape(inner: &str) -> Result<Vec<u8>, String> {
    let bytes = inner.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c != b'\\' {
            out.push(c);
            i += 1;
            continue;
        }
        i += 1;
        let esc = *bytes
            .get(i)
            .ok_or_else(|| format!("Dangling escape in string \"{inner}\""))?;
        let value = match esc {
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'0' => b'\0',
            b'x' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .filter(|pair| pair.iter().all(u8::is_ascii_hexdigit))
                    .ok_or_else(|| format!("Bad hex escape in string \"{inner}\""))?;
                i += 2;
                let text = std::str::from_utf8(hex).map_err(|_| "Bad hex escape".to_string())?;
                u8::from_str_radix(text, 16).map_err(|_| "Bad hex escape".to_string())?
            }
            other => other,
        };
        out.push(value);
        i += 1;
    }
    Ok(out)
}
