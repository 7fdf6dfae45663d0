//! Compile-time diagnostics attached to tokens.
//!
//! Errors never abort a compile; each pass attaches them to the offending
//! token and moves on, so one run surfaces every independent problem. A
//! token is errored exactly when it carries at least one
//! [`TokenEvent::Error`].

use std::fmt;

use thiserror::Error;

use crate::instructions::OperandKind;
use crate::token::{AddressHalf, TokenKind};

/// A named compile-time error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The text matched no token pattern.
    #[error("`{text}` matches no token pattern; check for a typo or a syntax slip")]
    InvalidToken {
        /// Offending text.
        text: String,
    },
    /// The mnemonic is not in the instruction table.
    #[error("no instruction is named `{mnemonic}`")]
    InstructionNotFound {
        /// Offending mnemonic.
        mnemonic: String,
    },
    /// Another token precedes the instruction on its line.
    #[error("instructions must be the first token on their line")]
    InstructionNotAtLineStart,
    /// The line ended before every operand was supplied.
    #[error("`{mnemonic}` needs {required} argument(s) on its line, found {given}")]
    NotEnoughArguments {
        /// Instruction mnemonic.
        mnemonic: &'static str,
        /// Operands the instruction takes.
        required: usize,
        /// Operands found.
        given: usize,
    },
    /// An operand was already errored.
    #[error("argument {position} of `{mnemonic}` has an error")]
    ArgumentHasError {
        /// Instruction mnemonic.
        mnemonic: &'static str,
        /// 1-indexed operand position.
        position: usize,
    },
    /// An operand has the wrong kind. Attached to instruction and operand.
    #[error("argument {position} of `{mnemonic}` must be a {expected}, found a {found}")]
    WrongArgumentType {
        /// Instruction mnemonic.
        mnemonic: &'static str,
        /// 1-indexed operand position.
        position: usize,
        /// Kind the instruction requires.
        expected: OperandKind,
        /// Kind found instead.
        found: TokenKind,
    },
    /// A token follows the last operand on the instruction's line.
    #[error("`{mnemonic}` takes {required} argument(s); `{extra}` is one too many")]
    ExcessArgument {
        /// Instruction mnemonic.
        mnemonic: &'static str,
        /// Operands the instruction takes.
        required: usize,
        /// Text of the first surplus token.
        extra: String,
    },
    /// The label name was already bound.
    #[error("label `{name}` was already defined on line {first_line}")]
    LabelAlreadyDefined {
        /// Label name.
        name: String,
        /// Line of the definition that stands.
        first_line: usize,
    },
    /// The token would land past the 16-bit address space.
    #[error("address {address} is outside the 16-bit address space")]
    AddressOutOfRange {
        /// Address the token would have taken.
        address: u32,
    },
    /// An address byte names a label that was never defined.
    #[error("no label is named `{name}`; names are case sensitive")]
    LabelNotFound {
        /// Referenced name.
        name: String,
    },
    /// The directive is not `#SKIPTO`.
    #[error("unknown macro `{name}`; the only macro is #SKIPTO")]
    UnknownMacro {
        /// Directive name without `#`.
        name: String,
    },
    /// `#SKIPTO` needs exactly one argument.
    #[error("#SKIPTO takes exactly one argument, found {found}")]
    MacroArgumentCount {
        /// Arguments found.
        found: usize,
    },
    /// The `#SKIPTO` argument is not a decimal number.
    #[error("#SKIPTO argument `{argument}` is not a decimal address")]
    MacroArgumentInvalid {
        /// Offending argument.
        argument: String,
    },
    /// The `#SKIPTO` target does not fit in 16 bits.
    #[error("#SKIPTO target {argument} is outside the 16-bit address space")]
    MacroAddressOutOfRange {
        /// Offending argument.
        argument: String,
    },
    /// The `#SKIPTO` target lies before the current address.
    #[error("#SKIPTO {target} would move backwards from address {current}")]
    MacroMovesBackwards {
        /// Requested address.
        target: u16,
        /// Address already reached.
        current: u32,
    },
    /// The byte literal's digits do not fit its base.
    #[error("`{text}` is not a valid byte for its base")]
    ByteInvalidSyntax {
        /// Literal text.
        text: String,
    },
    /// The byte literal exceeds 255. Negative values must be written in two's complement.
    #[error("`{text}` does not fit in an unsigned byte (0..=255)")]
    ByteOutOfRange {
        /// Literal text.
        text: String,
    },
    /// A token reached a pass that should never see it.
    #[error("internal assembler fault: {detail}")]
    Internal {
        /// What went wrong.
        detail: &'static str,
    },
}

impl CompileError {
    /// Short category shown next to errored tokens in listings.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::InvalidToken { .. } => "invalid token",
            Self::InstructionNotFound { .. } => "instruction not found",
            Self::InstructionNotAtLineStart => "instruction not at start of line",
            Self::NotEnoughArguments { .. } => "not enough arguments",
            Self::ArgumentHasError { .. } => "argument has error",
            Self::WrongArgumentType { .. } => "wrong argument type",
            Self::ExcessArgument { .. } => "excess argument",
            Self::LabelAlreadyDefined { .. } => "label already defined",
            Self::AddressOutOfRange { .. } => "address out of range",
            Self::LabelNotFound { .. } => "label not found",
            Self::UnknownMacro { .. } => "unknown macro",
            Self::MacroArgumentCount { .. } => "macro argument count",
            Self::MacroArgumentInvalid { .. } => "macro argument invalid",
            Self::MacroAddressOutOfRange { .. } => "macro address out of range",
            Self::MacroMovesBackwards { .. } => "macro moves backwards",
            Self::ByteInvalidSyntax { .. } => "byte invalid syntax",
            Self::ByteOutOfRange { .. } => "byte out of range",
            Self::Internal { .. } => "internal fault",
        }
    }
}

/// Informational trail entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Note {
    /// The token matched a pattern.
    Classified(TokenKind),
    /// The token is one half of a split `@name`.
    AddressSplit(AddressHalf),
    /// The instruction found all of its operands.
    OperandsSatisfied(usize),
    /// The label was bound.
    LabelBound(u16),
    /// `#SKIPTO` moved the address counter.
    SkippedTo(u16),
    /// The token was encoded.
    Encoded(u8),
    /// Labels emit no byte.
    LabelEmitsNothing,
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classified(kind) => write!(f, "classified as {kind}"),
            Self::AddressSplit(AddressHalf::High) => {
                f.write_str("split from an address; high 8 bits")
            }
            Self::AddressSplit(AddressHalf::Low) => f.write_str("split from an address; low 8 bits"),
            Self::OperandsSatisfied(0) => f.write_str("takes no arguments"),
            Self::OperandsSatisfied(count) => write!(f, "has its {count} required argument(s)"),
            Self::LabelBound(address) => write!(f, "bound to address {address}"),
            Self::SkippedTo(address) => write!(f, "address counter moved to {address}"),
            Self::Encoded(byte) => write!(f, "encoded as {byte:08b}"),
            Self::LabelEmitsNothing => f.write_str("labels are not stored in the output"),
        }
    }
}

/// One entry of a token's diagnostic trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenEvent {
    /// Informational.
    Note(Note),
    /// Fatal for this token.
    Error(CompileError),
}

impl TokenEvent {
    /// Returns `true` for errors.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for TokenEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Note(note) => write!(f, "{note}"),
            Self::Error(error) => write!(f, "error: {}: {error}", error.category()),
        }
    }
}
