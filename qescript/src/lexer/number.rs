//! Number lexing: verbatim capture plus a C-style (base-0) integer parse.

use crate::cursor::Cursor;

/// Parses a C `strtoll(..., 0)`-style integer starting at `bytes[0]`
/// (which must be an ASCII digit), returning the value and the number of
/// bytes consumed. Recognizes `0x`/`0X` hex, a leading `0` as octal, and
/// plain decimal otherwise — exactly the three bases the reference
/// scanner's `strtoll_c(..., 0)` call supports.
pub(crate) fn parse_c_int(bytes: &[u8]) -> (i64, usize) {
    if bytes.starts_with(b"0x") || bytes.starts_with(b"0X") {
        let digits = &bytes[2..];
        let end = digits
            .iter()
            .take_while(|b| b.is_ascii_hexdigit())
            .count();
        let text = std::str::from_utf8(&digits[..end]).unwrap_or("");
        let value = i64::from_str_radix(text, 16).unwrap_or(0);
        return (value, end + 2);
    }
    if bytes.first() == Some(&b'0') {
        let end = bytes.iter().take_while(|b| (b'0'..=b'7').contains(b)).count();
        if end > 1 {
            let text = std::str::from_utf8(&bytes[..end]).unwrap_or("");
            let value = i64::from_str_radix(text, 8).unwrap_or(0);
            return (value, end);
        }
        return (0, 1);
    }
    let end = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    let text = std::str::from_utf8(&bytes[..end]).unwrap_or("");
    let value = text.parse::<i64>().unwrap_or(0);
    (value, end)
}

/// Scans a number literal. `cursor` must be positioned on the leading
/// digit. Returns `Err(())` (an "invalid number" lexical error) if a
/// letter, digit, or underscore immediately follows the parsed number —
/// the reference scanner's hard rule against type suffixes.
pub fn scan(cursor: &mut Cursor) -> Result<i64, ()> {
    let start = cursor.position();
    // Advance far enough to capture the whole run of candidate bytes so
    // `parse_c_int` can see the full lexeme; the run itself is bounded by
    // word characters, matching the trailing-suffix check below.
    while cursor.current().is_ascii_alphanumeric() {
        cursor.advance();
    }
    let full = cursor.slice_from(start);
    let (value, consumed) = parse_c_int(full);
    if consumed < full.len() {
        return Err(());
    }
    Ok(value)
}

/// Re-parses an arbitrary string as a C integer (`strtoll(s, NULL, 0)`),
/// used to coerce a `STRING` value to `NUMBER`. Leading whitespace and an
/// optional sign are honored; anything that isn't a valid prefix parses
/// as `0`, matching `strtoll`'s lenient behavior.
pub(crate) fn parse_c_int_str(s: &str) -> i64 {
    let trimmed = s.trim_start();
    let bytes = trimmed.as_bytes();
    let (neg, rest) = match bytes.first() {
        Some(b'-') => (true, &bytes[1..]),
        Some(b'+') => (false, &bytes[1..]),
        _ => (false, bytes),
    };
    let (value, _) = parse_c_int(rest);
    if neg {
        value.wrapping_neg()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_str(src: &[u8]) -> Result<i64, ()> {
        let mut c = Cursor::new(src);
        scan(&mut c)
    }

    #[test]
    fn decimal() {
        assert_eq!(scan_str(b"12345\0"), Ok(12345));
    }

    #[test]
    fn hex() {
        assert_eq!(scan_str(b"0x1F\0"), Ok(31));
    }

    #[test]
    fn octal() {
        assert_eq!(scan_str(b"017\0"), Ok(15));
    }

    #[test]
    fn bare_zero() {
        assert_eq!(scan_str(b"0\0"), Ok(0));
    }

    #[test]
    fn trailing_letter_is_invalid() {
        assert_eq!(scan_str(b"123abc\0"), Err(()));
    }

    #[test]
    fn reparses_signed_strings() {
        assert_eq!(parse_c_int_str("-42"), -42);
        assert_eq!(parse_c_int_str("  7"), 7);
        assert_eq!(parse_c_int_str("not a number"), 0);
    }
}
