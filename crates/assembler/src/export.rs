//! The export list: what a loader writes into memory.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::token::{Token, TokenKind};

/// One byte placed at one address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(u16, u8)", into = "(u16, u8)")]
pub struct ExportEntry {
    /// Destination address.
    pub address: u16,
    /// Byte to store.
    pub byte: u8,
}

impl From<(u16, u8)> for ExportEntry {
    fn from((address, byte): (u16, u8)) -> Self {
        Self { address, byte }
    }
}

impl From<ExportEntry> for (u16, u8) {
    fn from(entry: ExportEntry) -> Self {
        (entry.address, entry.byte)
    }
}

/// Why no export list could be produced.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The compile reported errors.
    #[error("cannot export: {count} token(s) have errors")]
    HasErrors {
        /// Number of errored tokens.
        count: usize,
    },
    /// A token that should carry a byte and an address does not.
    #[error("cannot export: `{text}` on line {line} has no byte or address")]
    MissingByte {
        /// Source line.
        line: usize,
        /// Token text.
        text: String,
    },
    /// JSON encoding or decoding failed.
    #[error("export JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Builds the export list, all or nothing.
///
/// # Errors
///
/// [`ExportError::HasErrors`] when any token is errored and
/// [`ExportError::MissingByte`] when a byte-producing token was never encoded.
pub fn collect(tokens: &[Token]) -> Result<Vec<ExportEntry>, ExportError> {
    let count = tokens.iter().filter(|token| token.has_error()).count();
    if count > 0 {
        return Err(ExportError::HasErrors { count });
    }
    tokens
        .iter()
        .filter(|token| !matches!(token.kind, TokenKind::Label | TokenKind::Macro))
        .map(|token| match (token.address, token.byte) {
            (Some(address), Some(byte)) => Ok(ExportEntry { address, byte }),
            _ => Err(ExportError::MissingByte {
                line: token.line,
                text: token.text.clone(),
            }),
        })
        .collect()
}

/// Serializes an export list as `[[address, byte], ...]`.
///
/// # Errors
///
/// Propagates serializer failures.
pub fn to_json(entries: &[ExportEntry]) -> Result<String, ExportError> {
    Ok(serde_json::to_string(entries)?)
}

/// Parses the `[[address, byte], ...]` form back into entries.
///
/// # Errors
///
/// [`ExportError::Json`] for malformed input or out-of-range numbers.
pub fn from_json(text: &str) -> Result<Vec<ExportEntry>, ExportError> {
    Ok(serde_json::from_str(text)?)
}
