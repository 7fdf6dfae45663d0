//! Byte encoding.
//!
//! Runs after addresses are resolved, so every label reference can be looked
//! up regardless of where the label is defined.

use std::num::IntErrorKind;

use tracing::debug;

use crate::diagnostics::{CompileError, Note};
use crate::instructions::lookup;
use crate::symbols::LabelTable;
use crate::token::{Token, TokenKind};

/// Encodes every non-errored token. Returns how many bytes were produced.
pub fn encode_tokens(tokens: &mut [Token], labels: &LabelTable) -> usize {
    let mut encoded = 0;
    for token in tokens.iter_mut().filter(|token| !token.has_error()) {
        match encode(token, labels) {
            Ok(Some(byte)) => {
                token.byte = Some(byte);
                token.output = format!("{byte:08b}");
                token.note(Note::Encoded(byte));
                encoded += 1;
            }
            Ok(None) => token.note(Note::LabelEmitsNothing),
            Err(error) => token.error(error),
        }
    }
    debug!(encoded, "tokens encoded");
    encoded
}

fn encode(token: &Token, labels: &LabelTable) -> Result<Option<u8>, CompileError> {
    match token.kind {
        TokenKind::Instruction => {
            let def = lookup(&token.text).ok_or(CompileError::Internal {
                detail: "unvalidated instruction reached encoding",
            })?;
            Ok(Some(def.opcode.id()))
        }
        TokenKind::AddressByte(half) => {
            let name = token.referenced_label().unwrap_or_default();
            let label = labels.get(name).ok_or_else(|| CompileError::LabelNotFound {
                name: name.to_owned(),
            })?;
            Ok(Some(half.of(label.address)))
        }
        TokenKind::ByteLiteral => parse_byte(&token.text).map(Some),
        TokenKind::Label => Ok(None),
        TokenKind::Address => Err(CompileError::Internal {
            detail: "unsplit address reached encoding",
        }),
        TokenKind::Macro => Err(CompileError::Internal {
            detail: "unapplied macro reached encoding",
        }),
        TokenKind::Invalid => Err(CompileError::Internal {
            detail: "invalid token reached encoding without an error",
        }),
    }
}

/// Parses a byte literal: `0x` hexadecimal, `0b` binary, otherwise decimal.
///
/// # Errors
///
/// [`CompileError::ByteInvalidSyntax`] when the digits do not fit the base and
/// [`CompileError::ByteOutOfRange`] above 255.
pub fn parse_byte(text: &str) -> Result<u8, CompileError> {
    let (digits, radix) = if let Some(hex) = text.strip_prefix("0x") {
        (hex, 16)
    } else if let Some(binary) = text.strip_prefix("0b") {
        (binary, 2)
    } else {
        (text, 10)
    };
    let value = u32::from_str_radix(digits, radix).map_err(|error| match error.kind() {
        IntErrorKind::PosOverflow => CompileError::ByteOutOfRange {
            text: text.to_owned(),
        },
        _ => CompileError::ByteInvalidSyntax {
            text: text.to_owned(),
        },
    })?;
    u8::try_from(value).map_err(|_| CompileError::ByteOutOfRange {
        text: text.to_owned(),
    })
}
