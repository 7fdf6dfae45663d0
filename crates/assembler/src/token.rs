//! Token classification.
//!
//! Each whitespace-separated piece of source text becomes a [`Token`] whose
//! kind is fixed by exact pattern matching, in priority order:
//!
//! 1. `[A-Z]+` is an instruction.
//! 2. `@name` is a label address, later split into two address bytes.
//! 3. `@name.h` / `@name.l` is one half of a label address.
//! 4. `name:` defines a label.
//! 5. `[0b|0x]hexdigits` is a byte literal; the base is resolved when encoding.
//!
//! Anything else is invalid. Label names in addresses use `[A-Za-z_-]`, label
//! definitions additionally allow digits.

use std::fmt;

use crate::diagnostics::{CompileError, Note, TokenEvent};

/// Which half of a 16-bit label address an address byte carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressHalf {
    /// `address / 256`.
    High,
    /// `address % 256`.
    Low,
}

impl AddressHalf {
    /// Selects this half of `address`.
    #[must_use]
    pub const fn of(self, address: u16) -> u8 {
        let [high, low] = address.to_be_bytes();
        match self {
            Self::High => high,
            Self::Low => low,
        }
    }

    const fn suffix(self) -> &'static str {
        match self {
            Self::High => ".h",
            Self::Low => ".l",
        }
    }
}

/// Classification of a token. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Mnemonic, validated against the instruction table later.
    Instruction,
    /// Full label address; replaced by two [`TokenKind::AddressByte`] tokens.
    Address,
    /// One byte of a label address.
    AddressByte(AddressHalf),
    /// Label definition.
    Label,
    /// Numeric byte.
    ByteLiteral,
    /// `#` directive line.
    Macro,
    /// Text that matched no pattern.
    Invalid,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Instruction => "instruction",
            Self::Address => "address",
            Self::AddressByte(AddressHalf::High) => "address byte (high)",
            Self::AddressByte(AddressHalf::Low) => "address byte (low)",
            Self::Label => "label",
            Self::ByteLiteral => "byte",
            Self::Macro => "macro",
            Self::Invalid => "invalid",
        })
    }
}

/// One classified unit of source text plus everything the passes learned about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// 1-indexed source line.
    pub line: usize,
    /// Text as written.
    pub text: String,
    /// Classification.
    pub kind: TokenKind,
    /// Text the listing shows before rendering decorations.
    pub output: String,
    /// Emitted byte, once encoded.
    pub byte: Option<u8>,
    /// Address the byte lands at, once resolved.
    pub address: Option<u16>,
    /// Notes and errors in the order the passes raised them.
    pub events: Vec<TokenEvent>,
}

impl Token {
    /// Classifies one space-separated piece of a line.
    #[must_use]
    pub fn classify(line: usize, text: &str) -> Self {
        let (kind, output) = if is_instruction(text) {
            (TokenKind::Instruction, text)
        } else if let Some(name) = text.strip_prefix('@').filter(|name| is_address_name(name)) {
            (TokenKind::Address, name)
        } else if let Some((half, output)) = address_byte(text) {
            (TokenKind::AddressByte(half), output)
        } else if let Some(name) = text.strip_suffix(':').filter(|name| is_label_name(name)) {
            (TokenKind::Label, name)
        } else if is_byte_literal(text) {
            (TokenKind::ByteLiteral, text)
        } else {
            (TokenKind::Invalid, text)
        };

        let mut token = Self {
            line,
            text: text.to_owned(),
            kind,
            output: output.to_owned(),
            byte: None,
            address: None,
            events: Vec::new(),
        };
        if kind == TokenKind::Invalid {
            token.error(CompileError::InvalidToken {
                text: text.to_owned(),
            });
        } else {
            token.note(Note::Classified(kind));
        }
        token
    }

    /// Builds the single token for a `#` directive line.
    #[must_use]
    pub fn macro_line(line: usize, text: &str) -> Self {
        let text = text.trim();
        let mut token = Self {
            line,
            text: text.to_owned(),
            kind: TokenKind::Macro,
            output: text.to_owned(),
            byte: None,
            address: None,
            events: Vec::new(),
        };
        token.note(Note::Classified(TokenKind::Macro));
        token
    }

    /// Derives one address byte from an [`TokenKind::Address`] token.
    #[must_use]
    pub fn address_half(&self, half: AddressHalf) -> Self {
        let mut token = Self::classify(self.line, &format!("{}{}", self.text, half.suffix()));
        token.note(Note::AddressSplit(half));
        token
    }

    /// Label named by an address byte.
    #[must_use]
    pub fn referenced_label(&self) -> Option<&str> {
        match self.kind {
            TokenKind::AddressByte(_) => {
                let name = self.text.strip_prefix('@').unwrap_or(&self.text);
                name.get(..name.len().saturating_sub(2))
            }
            _ => None,
        }
    }

    /// Appends an informational note.
    pub fn note(&mut self, note: Note) {
        self.events.push(TokenEvent::Note(note));
    }

    /// Appends an error; the token is errored from now on.
    pub fn error(&mut self, error: CompileError) {
        self.events.push(TokenEvent::Error(error));
    }

    /// Returns `true` once any pass attached an error.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.events.iter().any(TokenEvent::is_error)
    }

    /// First error attached to the token.
    #[must_use]
    pub fn first_error(&self) -> Option<&CompileError> {
        self.events.iter().find_map(|event| match event {
            TokenEvent::Error(error) => Some(error),
            TokenEvent::Note(_) => None,
        })
    }

    /// Errors attached to the token, in order.
    pub fn errors(&self) -> impl Iterator<Item = &CompileError> {
        self.events.iter().filter_map(|event| match event {
            TokenEvent::Error(error) => Some(error),
            TokenEvent::Note(_) => None,
        })
    }
}

fn is_instruction(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_uppercase())
}

fn is_address_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphabetic() || b == b'_' || b == b'-')
}

fn is_label_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

fn address_byte(text: &str) -> Option<(AddressHalf, &str)> {
    let output = text.strip_prefix('@')?;
    let (half, name) = if let Some(name) = output.strip_suffix(".h") {
        (AddressHalf::High, name)
    } else {
        (AddressHalf::Low, output.strip_suffix(".l")?)
    };
    is_address_name(name).then_some((half, output))
}

fn is_hex_digits(digits: &str) -> bool {
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_hexdigit())
}

fn is_byte_literal(text: &str) -> bool {
    is_hex_digits(text)
        || text
            .strip_prefix("0b")
            .or_else(|| text.strip_prefix("0x"))
            .is_some_and(is_hex_digits)
}
