//! SMPU assembler library.
//!
//! Turns SMPU assembly text into an export list of `(address, byte)` pairs.
//! The opcode ids come from [`smpu_emulator::Opcode`], so the assembler and
//! the execute engine never disagree on numbering.

use clap as _;
use tracing_subscriber as _;

#[cfg(test)]
use tempfile as _;

/// The five-pass compile pipeline.
pub mod assembler;
/// Token diagnostics: compile errors and informational notes.
pub mod diagnostics;
/// Byte encoding after address resolution.
pub mod encoder;
/// Export list and its JSON form.
pub mod export;
/// Mnemonics, their opcodes, and their operand kinds.
pub mod instructions;
/// Line splitting and address expansion.
pub mod source;
/// Label table and address assignment.
pub mod symbols;
/// Token classification.
pub mod token;
/// Operand checks for instructions.
pub mod validate;

pub use assembler::{compile, Compilation, ListingRow, Summary};
pub use diagnostics::{CompileError, Note, TokenEvent};
pub use export::{ExportEntry, ExportError};
pub use token::{AddressHalf, Token, TokenKind};
