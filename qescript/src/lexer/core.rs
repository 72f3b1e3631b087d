//! `next_token`: the dispatch loop that skips trivia and routes to the
//! right sub-scanner.

use super::{comment, identifier, number, operator, string};
use crate::cursor::Cursor;
use crate::token::{Prec, Token};

/// Why `next_token` failed. Carries just enough detail for the caller to
/// build a full [`crate::error::Error`] with source name and line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    UnterminatedString,
    InvalidNumber,
    UnsupportedOperator(char),
}

/// One scanned token plus the positional bookkeeping the evaluator and
/// statement driver need for error reporting and ASI.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexed {
    pub token: Token,
    pub prec: Prec,
    /// Byte offset where this token began.
    pub start: usize,
    /// 1-based line number where this token began.
    pub line: u32,
    /// True if at least one newline was skipped before this token.
    pub newline_seen: bool,
}

/// Scans the next token starting at the cursor's current position.
pub fn next_token(cursor: &mut Cursor) -> Result<Lexed, (LexError, u32)> {
    let newline_seen = comment::skip(cursor);
    let start = cursor.position();
    let line = cursor.line();

    let c = cursor.current();
    if c == 0 {
        return Ok(Lexed {
            token: Token::Eof,
            prec: Prec::None,
            start,
            line,
            newline_seen,
        });
    }

    if identifier::is_start(c) {
        let token = identifier::scan(cursor);
        return Ok(Lexed {
            token,
            prec: Prec::None,
            start,
            line,
            newline_seen,
        });
    }

    if c.is_ascii_digit() {
        return match number::scan(cursor) {
            Ok(value) => Ok(Lexed {
                token: Token::Number(value),
                prec: Prec::None,
                start,
                line,
                newline_seen,
            }),
            Err(()) => Err((LexError::InvalidNumber, line)),
        };
    }

    if c == b'\'' || c == b'"' {
        cursor.advance();
        return match string::scan(cursor, c) {
            Ok(bytes) => {
                let lexeme = String::from_utf8_lossy(&bytes).into_owned();
                let token = if c == b'\'' {
                    Token::Char(lexeme)
                } else {
                    Token::String(lexeme)
                };
                Ok(Lexed {
                    token,
                    prec: Prec::None,
                    start,
                    line,
                    newline_seen,
                })
            }
            Err(()) => Err((LexError::UnterminatedString, line)),
        };
    }

    match operator::scan(cursor) {
        Some((spelling, prec)) => Ok(Lexed {
            token: Token::Op(spelling),
            prec,
            start,
            line,
            newline_seen,
        }),
        None => {
            let bad = cursor.current();
            cursor.advance();
            Err((LexError::UnsupportedOperator(bad as char), line))
        }
    }
}
