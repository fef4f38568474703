// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Assembler driver - main entry point.
//!
//! Ties the ISA-agnostic core to a concrete [`Isa`] descriptor and runs the
//! four assembly passes:
//!
//! ```text
//! pass 0  tokenize + classify (symbols, directives, comments)
//! pass 1  pseudo-instruction expansion
//! pass 2  encoding, symbol table, link-request collection
//! pass 3  symbol linkage (back-patching)
//! ```
//!
//! Each pass collects every diagnostic it can produce; the first pass that
//! produced any short-circuits the pipeline, and no partial image is
//! returned. The inverse direction ([`Assembler::disassemble`]) walks the
//! image four bytes at a time through the descriptor's matcher.


use log::debug;
use std::collections::HashMap;

use crate::core::directive::{DirectiveOutcome, TEXT_SEGMENT};
use crate::core::error::{AsmError, AsmErrorKind, Errors};
use crate::core::field::Field;
use crate::core::instruction::{AssembledInstr, FieldLinkRequest};
use crate::core::isa::{Isa, IsaError};
use crate::core::matcher::Matcher;
use crate::core::parser::{
    split_comment_from_line, split_directives_from_line, split_symbols_from_line, SourceLine,
};
use crate::core::symbol_table::{SymbolTable, SymbolTableResult};
use crate::core::tokenizer::tokenize;

/// Instruction width in bytes.
pub const WORD_SIZE: usize = 4;

/// A deferred write of a symbol's value into an already-emitted word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRequest {
    /// Source line of the code that produced the request.
    pub source_line: usize,
    /// Byte offset of the instruction word awaiting resolution.
    pub offset: u32,
    /// Index of the instruction entry in the ISA table.
    pub instr: usize,
    /// The immediate field and symbol to resolve.
    pub field: FieldLinkRequest,
}

/// Disassembly output: one rendered line per cleanly decoded word, plus
/// diagnostics (keyed by byte offset) for words that failed.
#[derive(Debug, Clone, Default)]
pub struct Disassembly {
    pub lines: Vec<String>,
    pub errors: Errors,
}

/// Assembler and disassembler for one ISA descriptor.
///
/// The descriptor is immutable after construction; all per-run state lives
/// on the stack of one `assemble` call, so a single `Assembler` may serve
/// concurrent assemblies from multiple threads.
pub struct Assembler {
    isa: Isa,
    matcher: Matcher,
}

impl Assembler {
    /// Validate the descriptor's matcher and build the driver.
    ///
    /// # Errors
    ///
    /// [`IsaError::AmbiguousEncoding`] when two instruction entries can
    /// match the same word.
    pub fn new(isa: Isa) -> Result<Self, IsaError> {
        let matcher = Matcher::new(isa.instructions())?;
        Ok(Self { isa, matcher })
    }

    #[must_use]
    pub fn isa(&self) -> &Isa {
        &self.isa
    }

    /// Assemble a source program given as one string; lines are split on
    /// `\r` and `\n`.
    ///
    /// # Errors
    ///
    /// The collected diagnostics of the first failing pass; no program
    /// bytes are returned alongside errors.
    pub fn assemble(&self, source: &str) -> Result<Vec<u8>, Errors> {
        self.assemble_with_symbols(source).map(|(image, _)| image)
    }

    /// Like [`assemble`](Self::assemble), also returning the symbol table
    /// for front-ends that need label offsets (simulators, symbol-aware
    /// disassembly).
    ///
    /// # Errors
    ///
    /// See [`assemble`](Self::assemble).
    pub fn assemble_with_symbols(&self, source: &str) -> Result<(Vec<u8>, SymbolTable), Errors> {
        let lines: Vec<&str> = source.split(|c| c == '\r' || c == '\n').collect();
        self.assemble_lines_with_symbols(&lines)
    }

    /// Assemble an already-split sequence of source lines.
    ///
    /// # Errors
    ///
    /// See [`assemble`](Self::assemble).
    pub fn assemble_lines(&self, lines: &[&str]) -> Result<Vec<u8>, Errors> {
        self.assemble_lines_with_symbols(lines).map(|(image, _)| image)
    }

    /// # Errors
    ///
    /// See [`assemble`](Self::assemble).
    pub fn assemble_lines_with_symbols(
        &self,
        lines: &[&str],
    ) -> Result<(Vec<u8>, SymbolTable), Errors> {
        let program = self.pass0(lines)?;
        debug!("pass 0: {} line(s) after classification", program.len());
        let expanded = self.pass1(program)?;
        debug!("pass 1: {} line(s) after pseudo expansion", expanded.len());
        let (image, symbols, links) = self.pass2(&expanded)?;
        debug!(
            "pass 2: {} byte(s), {} symbol(s), {} link request(s)",
            image.len(),
            symbols.len(),
            links.len()
        );
        let image = self.pass3(image, &symbols, &links)?;
        Ok((image, symbols))
    }

    /// Pass 0: tokenization and classification. Symbols on label-only
    /// lines are carried onto the next line that has content, so
    /// consecutive label-only lines all bind to the next emitted offset.
    fn pass0(&self, lines: &[&str]) -> Result<Vec<SourceLine>, Errors> {
        let mut errors = Errors::new();
        let mut program = Vec::with_capacity(lines.len());
        let mut carry: Vec<String> = Vec::new();
        let is_register = |name: &str| self.isa.registers().is_register(name);

        for (number, raw) in lines.iter().enumerate() {
            if raw.trim().is_empty() {
                continue;
            }
            let tokens = match tokenize(raw, number, &is_register) {
                Ok(tokens) => tokens,
                Err(error) => {
                    errors.push(error);
                    continue;
                }
            };
            let tokens = split_comment_from_line(tokens, self.isa.comment_delimiter());
            let (symbols, tokens) = match split_symbols_from_line(tokens, number) {
                Ok(split) => split,
                Err(error) => {
                    errors.push(error);
                    continue;
                }
            };
            let (directives, tokens) = match split_directives_from_line(tokens, number) {
                Ok(split) => split,
                Err(error) => {
                    errors.push(error);
                    continue;
                }
            };

            if tokens.is_empty() && directives.is_empty() {
                // Label-only (or comment-only) line: carry symbols forward.
                carry.extend(symbols);
                continue;
            }
            let mut line = SourceLine {
                number,
                symbols,
                directives,
                tokens,
            };
            if !carry.is_empty() {
                let mut symbols = std::mem::take(&mut carry);
                symbols.append(&mut line.symbols);
                line.symbols = symbols;
            }
            program.push(line);
        }
        if errors.is_empty() {
            Ok(program)
        } else {
            Err(errors)
        }
    }

    /// Pass 1: pseudo-instruction expansion. The first expanded line
    /// inherits the source line's symbols and directives; all expanded
    /// lines keep its line number for diagnostics.
    fn pass1(&self, program: Vec<SourceLine>) -> Result<Vec<SourceLine>, Errors> {
        let mut errors = Errors::new();
        let mut expanded = Vec::with_capacity(program.len());
        for line in program {
            let pseudo = line.mnemonic().and_then(|m| self.isa.pseudo(m));
            let Some(pseudo) = pseudo else {
                expanded.push(line);
                continue;
            };
            match pseudo.expand(&line) {
                Err(error) => errors.push(error),
                Ok(replacements) => {
                    for (position, tokens) in replacements.into_iter().enumerate() {
                        expanded.push(SourceLine {
                            number: line.number,
                            symbols: if position == 0 {
                                line.symbols.clone()
                            } else {
                                Vec::new()
                            },
                            directives: if position == 0 {
                                line.directives.clone()
                            } else {
                                Vec::new()
                            },
                            tokens,
                        });
                    }
                }
            }
        }
        if errors.is_empty() {
            Ok(expanded)
        } else {
            Err(errors)
        }
    }

    /// Pass 2: encoding. Symbols bind to the image size at their line;
    /// directives emit bytes or switch segments; remaining lines encode as
    /// instructions, collecting link requests for symbolic immediates.
    fn pass2(
        &self,
        program: &[SourceLine],
    ) -> Result<(Vec<u8>, SymbolTable, Vec<LinkRequest>), Errors> {
        let mut errors = Errors::new();
        let mut image: Vec<u8> = Vec::new();
        let mut symbols = SymbolTable::new();
        let mut links = Vec::new();
        let mut current_segment = TEXT_SEGMENT.to_string();
        let mut segment_sizes: HashMap<String, usize> = HashMap::new();

        for line in program {
            let offset = image.len() as u32;
            for symbol in &line.symbols {
                if let SymbolTableResult::Duplicate = symbols.define(symbol, offset) {
                    errors.push(AsmError::new(
                        line.number,
                        AsmErrorKind::DuplicateSymbol,
                        format!("Multiple definitions of symbol '{symbol}'"),
                    ));
                }
            }

            let mut line_failed = false;
            let mut emitted_data = false;
            for name in &line.directives {
                let Some(directive) = self.isa.directive(name) else {
                    errors.push(AsmError::new(
                        line.number,
                        AsmErrorKind::Directive,
                        format!("Unknown directive '{name}'"),
                    ));
                    line_failed = true;
                    break;
                };
                match directive.handle(line) {
                    Err(error) => {
                        errors.push(error);
                        line_failed = true;
                        break;
                    }
                    Ok(DirectiveOutcome::Emit(bytes)) => {
                        *segment_sizes.entry(current_segment.clone()).or_default() += bytes.len();
                        image.extend(bytes);
                        emitted_data = true;
                    }
                    Ok(DirectiveOutcome::Segment(segment)) => {
                        if segment == TEXT_SEGMENT {
                            // The instruction segment stays word-aligned.
                            while image.len() % WORD_SIZE != 0 {
                                image.push(0);
                            }
                        }
                        current_segment = segment;
                    }
                }
            }
            if line_failed || emitted_data || line.tokens.is_empty() {
                continue;
            }

            if image.len() % WORD_SIZE != 0 {
                errors.push(AsmError::new(
                    line.number,
                    AsmErrorKind::Structure,
                    format!("Instruction at unaligned offset {}", image.len()),
                ));
                continue;
            }
            match self.assemble_instruction(line) {
                Err(error) => errors.push(error),
                Ok((instr_index, assembled)) => {
                    let AssembledInstr {
                        word,
                        links_with_symbol,
                    } = assembled;
                    let instr_offset = image.len() as u32;
                    if let Some(field) = links_with_symbol {
                        links.push(LinkRequest {
                            source_line: line.number,
                            offset: instr_offset,
                            instr: instr_index,
                            field,
                        });
                    }
                    *segment_sizes.entry(current_segment.clone()).or_default() += WORD_SIZE;
                    image.extend_from_slice(&self.isa.endianness().word_to_bytes(word));
                }
            }
        }
        for (segment, size) in &segment_sizes {
            debug!("segment {segment}: {size} byte(s)");
        }
        if errors.is_empty() {
            Ok((image, symbols, links))
        } else {
            Err(errors)
        }
    }

    fn assemble_instruction(&self, line: &SourceLine) -> Result<(usize, AssembledInstr), AsmError> {
        let Some(mnemonic) = line.mnemonic() else {
            return Err(AsmError::new(
                line.number,
                AsmErrorKind::Structure,
                "Empty source lines should be impossible at this point",
            ));
        };
        let Some((index, instruction)) = self.isa.instruction(mnemonic) else {
            return Err(AsmError::new(
                line.number,
                AsmErrorKind::UnknownOpcode,
                format!("Unknown opcode '{mnemonic}'"),
            ));
        };
        instruction
            .assemble(line, self.isa.registers())
            .map(|assembled| (index, assembled))
    }

    /// Pass 3: symbol linkage. Re-reads each requesting word, applies the
    /// field's resolution, and writes the patched word back.
    fn pass3(
        &self,
        mut image: Vec<u8>,
        symbols: &SymbolTable,
        links: &[LinkRequest],
    ) -> Result<Vec<u8>, Errors> {
        let mut errors = Errors::new();
        let endianness = self.isa.endianness();
        for request in links {
            let Some(value) = symbols.lookup(&request.field.symbol) else {
                errors.push(AsmError::new(
                    request.source_line,
                    AsmErrorKind::UnresolvedSymbol,
                    format!("Unknown symbol '{}'", request.field.symbol),
                ));
                continue;
            };
            let start = request.offset as usize;
            debug_assert!(
                start + WORD_SIZE <= image.len(),
                "link request outside the program image"
            );
            if start + WORD_SIZE > image.len() {
                errors.push(AsmError::new(
                    request.source_line,
                    AsmErrorKind::Structure,
                    "Link request outside the program image",
                ));
                continue;
            }
            let word = endianness.word_from_bytes([
                image[start],
                image[start + 1],
                image[start + 2],
                image[start + 3],
            ]);
            let instruction = &self.isa.instructions()[request.instr];
            let Some(Field::Imm(field)) = instruction.fields().get(request.field.field) else {
                errors.push(AsmError::new(
                    request.source_line,
                    AsmErrorKind::Structure,
                    "Linkage requested for a non-immediate field",
                ));
                continue;
            };
            match field.resolve(word, value, request.offset) {
                None => {
                    let (lo, hi) = field.range();
                    errors.push(AsmError::new(
                        request.source_line,
                        AsmErrorKind::Operand,
                        format!(
                            "Symbol '{}' resolves outside range [{lo}, {hi}] of '{}'",
                            request.field.symbol,
                            instruction.name()
                        ),
                    ));
                }
                Some(patched) => {
                    image[start..start + WORD_SIZE]
                        .copy_from_slice(&endianness.word_to_bytes(patched));
                }
            }
        }
        if errors.is_empty() {
            Ok(image)
        } else {
            Err(errors)
        }
    }

    /// Disassemble a byte image. `base_address` shifts the addresses used
    /// for PC-relative rendering only.
    ///
    /// # Errors
    ///
    /// A fatal precondition error when the input size is not a multiple of
    /// the instruction width. Per-word failures are collected in the
    /// returned [`Disassembly`] instead.
    pub fn disassemble(&self, bytes: &[u8], base_address: u32) -> Result<Disassembly, AsmError> {
        self.disassemble_with_symbols(bytes, base_address, &SymbolTable::new())
    }

    /// Like [`disassemble`](Self::disassemble), rendering PC-relative
    /// targets by label name where the symbol table knows the offset.
    ///
    /// # Errors
    ///
    /// See [`disassemble`](Self::disassemble).
    pub fn disassemble_with_symbols(
        &self,
        bytes: &[u8],
        base_address: u32,
        symbols: &SymbolTable,
    ) -> Result<Disassembly, AsmError> {
        if bytes.len() % WORD_SIZE != 0 {
            return Err(AsmError::new(
                bytes.len(),
                AsmErrorKind::Precondition,
                format!(
                    "Program size {} is not a multiple of the {WORD_SIZE}-byte instruction width",
                    bytes.len()
                ),
            ));
        }
        let reverse = symbols.reverse();
        let mut out = Disassembly::default();
        for (index, chunk) in bytes.chunks_exact(WORD_SIZE).enumerate() {
            let offset = index * WORD_SIZE;
            let word = self
                .isa
                .endianness()
                .word_from_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            match self.matcher.match_word(word) {
                None => out.errors.push(AsmError::new(
                    offset,
                    AsmErrorKind::Disassembly,
                    format!("Unknown instruction at offset {offset}"),
                )),
                Some(instr_index) => {
                    let instruction = &self.isa.instructions()[instr_index];
                    match instruction.disassemble(
                        word,
                        base_address.wrapping_add(offset as u32),
                        &reverse,
                        self.isa.registers(),
                    ) {
                        Ok(tokens) => out.lines.push(tokens.join(" ")),
                        Err(error) => out.errors.push(error),
                    }
                }
            }
        }
        Ok(out)
    }
}
