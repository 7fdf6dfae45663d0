//! Label table and address assignment.
//!
//! A single forward walk hands out addresses starting at 0. Labels bind to the
//! current address without consuming it, `#SKIPTO n` jumps the counter
//! forward, and every other token, errored ones included, takes one slot.

use std::collections::HashMap;

use tracing::debug;

use crate::diagnostics::{CompileError, Note};
use crate::token::{Token, TokenKind};

const SKIPTO: &str = "SKIPTO";

/// A successfully bound label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    /// Address of the next byte-producing token.
    pub address: u16,
    /// Source line of the definition.
    pub line: usize,
}

/// Case-sensitive label bindings for one compile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    labels: HashMap<String, Label>,
}

impl LabelTable {
    /// Looks up a label.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Label> {
        self.labels.get(name).copied()
    }

    /// Number of bound labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` when no label was bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Bound labels sorted by address, then name.
    #[must_use]
    pub fn sorted(&self) -> Vec<(&str, Label)> {
        let mut labels: Vec<_> = self
            .labels
            .iter()
            .map(|(name, label)| (name.as_str(), *label))
            .collect();
        labels.sort_by(|a, b| a.1.address.cmp(&b.1.address).then(a.0.cmp(b.0)));
        labels
    }

    fn define(&mut self, name: &str, label: Label) -> Result<(), Label> {
        if let Some(existing) = self.labels.get(name) {
            return Err(*existing);
        }
        self.labels.insert(name.to_owned(), label);
        Ok(())
    }
}

/// Assigns addresses, binds labels, and applies `#SKIPTO`.
///
/// Applied macros are removed from `tokens`.
pub fn resolve_addresses(tokens: &mut Vec<Token>) -> LabelTable {
    let mut labels = LabelTable::default();
    let mut address: u32 = 0;
    let mut applied = vec![false; tokens.len()];

    for (index, token) in tokens.iter_mut().enumerate() {
        if token.has_error() {
            token.address = u16::try_from(address).ok();
            address += 1;
            continue;
        }
        match token.kind {
            TokenKind::Label => bind_label(token, address, &mut labels),
            TokenKind::Macro => match skip_target(token, address) {
                Ok(target) => {
                    token.note(Note::SkippedTo(target));
                    address = u32::from(target);
                    applied[index] = true;
                }
                Err(error) => {
                    token.error(error);
                    token.address = u16::try_from(address).ok();
                    address += 1;
                }
            },
            _ => {
                match u16::try_from(address) {
                    Ok(slot) => token.address = Some(slot),
                    Err(_) => token.error(CompileError::AddressOutOfRange { address }),
                }
                address += 1;
            }
        }
    }

    let mut flags = applied.into_iter();
    tokens.retain(|_| !flags.next().unwrap_or(false));
    debug!(labels = labels.len(), end = address, "addresses resolved");
    labels
}

fn bind_label(token: &mut Token, address: u32, labels: &mut LabelTable) {
    let Ok(slot) = u16::try_from(address) else {
        token.error(CompileError::AddressOutOfRange { address });
        return;
    };
    let label = Label {
        address: slot,
        line: token.line,
    };
    match labels.define(&token.output, label) {
        Ok(()) => {
            token.address = Some(slot);
            token.note(Note::LabelBound(slot));
        }
        Err(first) => token.error(CompileError::LabelAlreadyDefined {
            name: token.output.clone(),
            first_line: first.line,
        }),
    }
}

fn skip_target(token: &Token, address: u32) -> Result<u16, CompileError> {
    let mut words = token.output.split_whitespace();
    let name = words
        .next()
        .and_then(|word| word.strip_prefix('#'))
        .unwrap_or_default();
    if name != SKIPTO {
        return Err(CompileError::UnknownMacro {
            name: name.to_owned(),
        });
    }
    let arguments: Vec<_> = words.collect();
    let [argument] = arguments.as_slice() else {
        return Err(CompileError::MacroArgumentCount {
            found: arguments.len(),
        });
    };
    if argument.is_empty() || !argument.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CompileError::MacroArgumentInvalid {
            argument: (*argument).to_owned(),
        });
    }
    let target = argument
        .parse::<u16>()
        .map_err(|_| CompileError::MacroAddressOutOfRange {
            argument: (*argument).to_owned(),
        })?;
    if u32::from(target) < address {
        return Err(CompileError::MacroMovesBackwards {
            target,
            current: address,
        });
    }
    Ok(target)
}
