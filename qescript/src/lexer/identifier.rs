//! Identifier and keyword lexing.

use crate::cursor::Cursor;
use crate::token::Token;

const MAX_LEXEME: usize = 255;

#[inline]
fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

#[inline]
fn is_ident_cont(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// Scans an identifier or keyword. `cursor` must be positioned on the
/// leading byte, which the caller has already classified with
/// [`is_ident_start`].
///
/// Every `_` is rewritten to `-`, and an internal `-` immediately
/// followed by a letter continues the identifier (so `indent-width`
/// lexes as one token) — both exactly as the reference scanner does.
/// Overlong identifiers are truncated to 255 bytes, matching the
/// string/char truncation cap.
pub fn scan(cursor: &mut Cursor) -> Token {
    let mut lexeme = Vec::with_capacity(16);
    let first = cursor.current();
    lexeme.push(if first == b'_' { b'-' } else { first });
    cursor.advance();

    loop {
        let c = cursor.current();
        if is_ident_cont(c) || (c == b'-' && cursor.peek(1).is_ascii_alphabetic()) {
            let stored = if c == b'_' { b'-' } else { c };
            if lexeme.len() < MAX_LEXEME {
                lexeme.push(stored);
            }
            cursor.advance();
        } else {
            break;
        }
    }

    match lexeme.as_slice() {
        b"if" => Token::If,
        b"else" => Token::Else,
        _ => Token::Id(String::from_utf8_lossy(&lexeme).into_owned()),
    }
}

pub fn is_start(c: u8) -> bool {
    is_ident_start(c)
}
