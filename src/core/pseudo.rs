// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Pseudo-instructions: mnemonics that rewrite to one or more concrete
//! instruction lines during pass 1.

use crate::core::error::{AsmError, AsmErrorKind};
use crate::core::parser::SourceLine;
use crate::core::tokenizer::LineTokens;
use std::fmt;
use std::sync::Arc;

/// Expansion function: inspects the line's operands and produces the
/// replacement token lines, or a message describing why it cannot.
pub type PseudoExpander =
    Arc<dyn Fn(&SourceLine) -> Result<Vec<LineTokens>, String> + Send + Sync>;

/// A named pseudo-instruction entry.
#[derive(Clone)]
pub struct PseudoInstruction {
    name: String,
    expander: PseudoExpander,
}

impl PseudoInstruction {
    pub fn new(
        name: impl Into<String>,
        expander: impl Fn(&SourceLine) -> Result<Vec<LineTokens>, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            expander: Arc::new(expander),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Expand one line. The returned token lines all inherit the source
    /// line number; symbol/directive attribution is the driver's job.
    ///
    /// # Errors
    ///
    /// Operand errors reported by the expander, attributed to the line.
    pub fn expand(&self, line: &SourceLine) -> Result<Vec<LineTokens>, AsmError> {
        (self.expander)(line)
            .map_err(|message| AsmError::new(line.number, AsmErrorKind::Operand, message))
    }
}

impl fmt::Debug for PseudoInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PseudoInstruction")
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::PseudoInstruction;
    use crate::core::parser::SourceLine;

    #[test]
    fn expansion_errors_carry_the_source_line() {
        let pseudo = PseudoInstruction::new("bad", |_| Err("nope".to_string()));
        let mut line = SourceLine::new(7);
        line.tokens = vec!["bad".to_string()];
        let err = pseudo.expand(&line).unwrap_err();
        assert_eq!(err.line(), 7);
        assert_eq!(err.message(), "nope");
    }
}
