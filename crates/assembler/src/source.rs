//! Source splitting and address expansion.

use crate::token::{AddressHalf, Token, TokenKind};

/// Splits source text into classified tokens.
///
/// Lines split on `\n` (a trailing `\r` is dropped) and are numbered from 1.
/// Everything from the first `-` on is a comment. A line whose remaining text
/// starts with `#` is a single macro token; any other line splits on spaces.
#[must_use]
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (index, raw) in source.split('\n').enumerate() {
        let line = index + 1;
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let code = raw.split_once('-').map_or(raw, |(code, _)| code).trim_start();
        if code.is_empty() {
            continue;
        }
        if code.starts_with('#') {
            tokens.push(Token::macro_line(line, code));
            continue;
        }
        tokens.extend(
            code.split(' ')
                .filter(|piece| !piece.is_empty())
                .map(|piece| Token::classify(line, piece)),
        );
    }
    tokens
}

/// Replaces every non-errored `@name` with its high and low address bytes.
///
/// Returns how many addresses were split.
pub fn split_addresses(tokens: &mut Vec<Token>) -> usize {
    let mut split = 0;
    let mut index = 0;
    while index < tokens.len() {
        let token = &tokens[index];
        if token.kind == TokenKind::Address && !token.has_error() {
            let halves = [
                token.address_half(AddressHalf::High),
                token.address_half(AddressHalf::Low),
            ];
            tokens.splice(index..=index, halves);
            split += 1;
            index += 2;
        } else {
            index += 1;
        }
    }
    split
}
