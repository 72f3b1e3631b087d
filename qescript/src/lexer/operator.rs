//! Operator/punctuator lexing: thin wrapper over the static table scan.

use crate::cursor::Cursor;
use crate::token::{self, Prec};

/// Matches the longest operator spelling at the cursor, advancing past it.
/// Returns `None` (an "unsupported operator" error) if the current byte
/// matches no table entry. The longest table entry is 3 bytes (`<<=`,
/// `>>=`), so a 3-byte lookahead window is always enough.
pub fn scan(cursor: &mut Cursor) -> Option<(&'static str, Prec)> {
    let mut buf = [0u8; 3];
    for (i, slot) in buf.iter_mut().enumerate() {
        *slot = cursor.peek(i);
    }
    let (spelling, prec) = token::lookup(&buf)?;
    for _ in 0..spelling.len() {
        cursor.advance();
    }
    Some((spelling, prec))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_longest_operator() {
        let mut c = Cursor::new(b"<<=x\0");
        let (s, _) = scan(&mut c).unwrap();
        assert_eq!(s, "<<=");
        assert_eq!(c.current(), b'x');
    }

    #[test]
    fn scans_single_char_punct() {
        let mut c = Cursor::new(b"(x\0");
        let (s, _) = scan(&mut c).unwrap();
        assert_eq!(s, "(");
        assert_eq!(c.current(), b'x');
    }

    #[test]
    fn unmatched_byte_is_none() {
        let mut c = Cursor::new(b"#\0");
        assert!(scan(&mut c).is_none());
    }
}
