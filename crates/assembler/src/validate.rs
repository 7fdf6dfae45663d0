//! Operand validation: mnemonics exist, start their line, and have operands of
//! the right kind on the same line.

use crate::diagnostics::{CompileError, Note};
use crate::instructions::{lookup, OperandKind};
use crate::token::{Token, TokenKind};

fn operand_matches(expected: OperandKind, kind: TokenKind) -> bool {
    match expected {
        OperandKind::ByteLiteral => kind == TokenKind::ByteLiteral,
        OperandKind::AddressByte => matches!(kind, TokenKind::AddressByte(_)),
    }
}

/// Validates every non-errored instruction and its operands.
pub fn validate_operands(tokens: &mut [Token]) {
    let mut index = 0;
    while index < tokens.len() {
        if tokens[index].kind != TokenKind::Instruction || tokens[index].has_error() {
            index += 1;
            continue;
        }
        let Some(def) = lookup(&tokens[index].text) else {
            let mnemonic = tokens[index].text.clone();
            tokens[index].error(CompileError::InstructionNotFound { mnemonic });
            index += 1;
            continue;
        };

        let line = tokens[index].line;
        if index > 0 && tokens[index - 1].line == line {
            tokens[index].error(CompileError::InstructionNotAtLineStart);
        }

        let mut next = index + 1;
        let mut complete = true;
        for (offset, &expected) in def.operands.iter().enumerate() {
            let position = offset + 1;
            let Some(operand) = tokens.get(next).filter(|operand| operand.line == line) else {
                tokens[index].error(CompileError::NotEnoughArguments {
                    mnemonic: def.mnemonic,
                    required: def.operands.len(),
                    given: offset,
                });
                complete = false;
                break;
            };
            if operand.has_error() {
                tokens[index].error(CompileError::ArgumentHasError {
                    mnemonic: def.mnemonic,
                    position,
                });
            } else if !operand_matches(expected, operand.kind) {
                let error = CompileError::WrongArgumentType {
                    mnemonic: def.mnemonic,
                    position,
                    expected,
                    found: operand.kind,
                };
                tokens[next].error(error.clone());
                tokens[index].error(error);
            }
            next += 1;
        }

        if complete {
            if let Some(extra) = tokens.get(next).filter(|extra| extra.line == line) {
                let error = CompileError::ExcessArgument {
                    mnemonic: def.mnemonic,
                    required: def.operands.len(),
                    extra: extra.text.clone(),
                };
                tokens[next].error(error.clone());
                tokens[index].error(error);
            } else if !tokens[index].has_error() {
                tokens[index].note(Note::OperandsSatisfied(def.operands.len()));
            }
        }
        index = next;
    }
}
