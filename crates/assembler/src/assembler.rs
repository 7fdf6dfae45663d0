//! Top-level assembler pipeline.
//!
//! [`compile`] never fails outright. Each pass attaches errors to tokens and
//! the next pass skips errored tokens, so one run reports every independent
//! problem:
//!
//! 1. **Address splitting** (`source::split_addresses`)
//! 2. **Operand validation** (`validate::validate_operands`)
//! 3. **Label and macro resolution** (`symbols::resolve_addresses`)
//! 4. **Encoding** (`encoder::encode_tokens`)
//! 5. **Rendering** ([`Compilation::listing`], [`Compilation::summary`])

use std::fmt;

use tracing::{debug, info};

use crate::diagnostics::CompileError;
use crate::encoder::encode_tokens;
use crate::export::{self, ExportEntry, ExportError};
use crate::source::{split_addresses, tokenize};
use crate::symbols::{resolve_addresses, LabelTable};
use crate::token::{Token, TokenKind};
use crate::validate::validate_operands;

/// Result of one compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compilation {
    tokens: Vec<Token>,
    labels: LabelTable,
}

/// One listing row per token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    /// Source line.
    pub line: usize,
    /// Resolved address, if any.
    pub address: Option<u16>,
    /// Display text: output text, `:` on labels, first error category on errored tokens.
    pub text: String,
    /// Every note and error the passes attached, rendered.
    pub explanation: Vec<String>,
}

/// One-line outcome of a compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Summary {
    /// No token is errored.
    Clean,
    /// At least one token is errored; names the first.
    Failed {
        /// Line of the first errored token.
        line: usize,
        /// Its address, if it got one.
        address: Option<u16>,
        /// Category of its first error.
        category: &'static str,
        /// Errored tokens in total.
        count: usize,
    },
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => f.write_str("compiled without errors"),
            Self::Failed {
                line,
                address,
                category,
                count,
            } => {
                write!(f, "{category} on line {line}")?;
                if let Some(address) = address {
                    write!(f, " (address {address})")?;
                }
                if *count > 1 {
                    write!(f, "; {} more error(s)", count - 1)?;
                }
                Ok(())
            }
        }
    }
}

/// Runs every pass over `source`.
#[must_use]
pub fn compile(source: &str) -> Compilation {
    let mut tokens = tokenize(source);
    debug!(tokens = tokens.len(), "tokenized");

    let split = split_addresses(&mut tokens);
    debug!(split, "addresses split");

    validate_operands(&mut tokens);
    debug!(
        errored = tokens.iter().filter(|t| t.has_error()).count(),
        "operands validated"
    );

    let labels = resolve_addresses(&mut tokens);
    encode_tokens(&mut tokens, &labels);

    let compilation = Compilation { tokens, labels };
    info!(summary = %compilation.summary(), "compile finished");
    compilation
}

impl Compilation {
    /// Tokens in source order, applied macros removed.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Bound labels.
    #[must_use]
    pub const fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Returns `true` when any token is errored.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.tokens.iter().any(Token::has_error)
    }

    /// Errored tokens, in order.
    pub fn errors(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|token| token.has_error())
    }

    /// Names the first errored token, or reports a clean compile.
    #[must_use]
    pub fn summary(&self) -> Summary {
        let mut errored = self.errors();
        let Some(first) = errored.next() else {
            return Summary::Clean;
        };
        Summary::Failed {
            line: first.line,
            address: first.address,
            category: first.first_error().map_or("unknown", CompileError::category),
            count: 1 + errored.count(),
        }
    }

    /// Rendered rows for display.
    #[must_use]
    pub fn listing(&self) -> Vec<ListingRow> {
        self.tokens
            .iter()
            .map(|token| ListingRow {
                line: token.line,
                address: token.address,
                text: render(token),
                explanation: token.events.iter().map(ToString::to_string).collect(),
            })
            .collect()
    }

    /// The export list in token order.
    ///
    /// # Errors
    ///
    /// Refuses to produce anything when the compile had errors.
    pub fn export(&self) -> Result<Vec<ExportEntry>, ExportError> {
        export::collect(&self.tokens)
    }
}

fn render(token: &Token) -> String {
    let mut text = token.output.clone();
    if token.kind == TokenKind::Label {
        text.push(':');
    }
    if let Some(error) = token.first_error() {
        text.push(' ');
        text.push_str(error.category());
    }
    text
}
