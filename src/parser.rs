use miette::Result;

use crate::{error, memory::MEMORY_SIZE};

/// Starts a comment running to the end of the line.
const COMMENT: char = '#';

/// Parse a text program image into raw bytes.
///
/// The image is a sequence of 8-digit binary literals separated by whitespace,
/// with optional `#` comments:
///
/// ```text
/// 10000010 # LDI R0,8
/// 00000000
/// 00001000
/// 01000111 # PRN R0
/// 00000000
/// 00000001 # HLT
/// ```
pub fn parse(src: &str) -> Result<Vec<u8>> {
    let mut program = Vec::new();
    for (offs, token) in tokens(src) {
        let Some(byte) = parse_literal(token) else {
            return Err(error::parse_invalid_literal(offs..offs + token.len(), src));
        };
        if program.len() == MEMORY_SIZE {
            let len = tokens(src)
                .filter(|(_, token)| parse_literal(token).is_some())
                .count();
            return Err(error::parse_too_large(offs..offs + token.len(), src, len));
        }
        program.push(byte);
    }
    if program.is_empty() {
        return Err(error::parse_empty(src));
    }
    Ok(program)
}

/// `Some` if `token` is exactly eight binary digits.
fn parse_literal(token: &str) -> Option<u8> {
    if token.len() != 8 || !token.bytes().all(|b| b == b'0' || b == b'1') {
        return None;
    }
    u8::from_str_radix(token, 2).ok()
}

/// Non-comment tokens of `src`, with their byte offsets.
fn tokens(src: &str) -> impl Iterator<Item = (usize, &str)> + '_ {
    let mut line_start = 0;
    src.split_inclusive('\n').flat_map(move |line| {
        let offs = line_start;
        line_start += line.len();
        let code = line.split(COMMENT).next().unwrap_or_default();
        split_whitespace(code).map(move |(i, token)| (offs + i, token))
    })
}

fn split_whitespace(code: &str) -> impl Iterator<Item = (usize, &str)> + '_ {
    let mut chars = code.char_indices().peekable();
    std::iter::from_fn(move || {
        // Skip leading whitespace
        while chars.next_if(|(_, ch)| ch.is_whitespace()).is_some() {}
        let (start, _) = chars.next()?;
        let mut end = code.len();
        while let Some(&(i, ch)) = chars.peek() {
            if ch.is_whitespace() {
                end = i;
                break;
            }
            chars.next();
        }
        Some((start, &code[start..end]))
    })
}
