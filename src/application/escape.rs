//! String-literal escaping for embedded documents
//!
//! Embedded `data` documents are stored as quoted literals using the protobuf
//! text-format byte escapes. Escaping works on UTF-8 bytes: printable ASCII is
//! kept, the usual control characters get their mnemonic escape and every
//! other byte becomes a three-digit octal escape.

/// Escape text for use inside a double-quoted literal.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for &byte in text.as_bytes() {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            b'\'' => out.push_str("\\'"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x07 => out.push_str("\\a"),
            0x08 => out.push_str("\\b"),
            0x0c => out.push_str("\\f"),
            0x0b => out.push_str("\\v"),
            0x20..=0x7e => out.push(byte as char),
            _ => out.push_str(&format!("\\{byte:03o}")),
        }
    }
    out
}

/// Reverse [`escape`] on the body of one literal (without its quotes).
///
/// Accepts `\xHH` hex escapes in addition to what [`escape`] produces.
pub fn unescape(body: &str) -> Result<Vec<u8>, String> {
    let bytes = body.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        i += 1;
        if byte != b'\\' {
            out.push(byte);
            continue;
        }
        let Some(&code) = bytes.get(i) else {
            return Err("dangling backslash at end of literal".to_string());
        };
        i += 1;
        match code {
            b'\\' | b'"' | b'\'' | b'?' => out.push(code),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'v' => out.push(0x0b),
            b'0'..=b'7' => {
                let mut value = u32::from(code - b'0');
                let mut digits = 1;
                while digits < 3 {
                    match bytes.get(i) {
                        Some(&d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            i += 1;
                            digits += 1;
                        }
                        _ => break,
                    }
                }
                let value = u8::try_from(value)
                    .map_err(|_| format!("octal escape out of range: \\{value:o}"))?;
                out.push(value);
            }
            b'x' => {
                let start = i;
                while i < bytes.len() && i - start < 2 && bytes[i].is_ascii_hexdigit() {
                    i += 1;
                }
                if start == i {
                    return Err("\\x escape without hex digits".to_string());
                }
                let digits = &body[start..i];
                let value = u8::from_str_radix(digits, 16)
                    .map_err(|e| format!("invalid hex escape \\x{digits}: {e}"))?;
                out.push(value);
            }
            other => {
                return Err(format!("invalid escape sequence \\{}", other as char));
            }
        }
    }
    Ok(out)
}

/// Decode a value made of adjacent quoted literals into the text they spell.
///
/// Whitespace (including newlines) between literals is skipped; the literals
/// are unescaped and concatenated, and the result must be valid UTF-8.
pub fn decode_literals(value: &str) -> Result<String, String> {
    let bytes = value.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    let mut literals = 0;
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i == bytes.len() {
            break;
        }
        if bytes[i] != b'"' {
            return Err(format!("expected a quoted string literal, found {:?}", &value[i..]));
        }
        let start = i + 1;
        let mut end = start;
        while end < bytes.len() && bytes[end] != b'"' {
            end += if bytes[end] == b'\\' { 2 } else { 1 };
        }
        if end >= bytes.len() {
            return Err("unterminated string literal".to_string());
        }
        decoded.extend(unescape(&value[start..end])?);
        literals += 1;
        i = end + 1;
    }
    if literals == 0 {
        return Err("expected a quoted string literal".to_string());
    }
    String::from_utf8(decoded).map_err(|e| format!("embedded document is not valid UTF-8: {e}"))
}

/// Escape text and wrap it in double quotes.
pub fn quote(text: &str) -> String {
    format!("\"{}\"", escape(text))
}

/// Break a single-line literal into continuation lines after every `\n` escape.
///
/// Each continuation line starts with `indent` followed by a new opening quote.
pub fn split_continuation(literal: &str, indent: &str) -> String {
    literal.replace("\\n", &format!("\\n\"\n{indent}\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("plain", "plain")]
    #[case("id: \"sprite\"\n", "id: \\\"sprite\\\"\\n")]
    #[case("back\\slash", "back\\\\slash")]
    #[case("it's\t", "it\\'s\\t")]
    #[case("é", "\\303\\251")]
    #[case("\u{1}", "\\001")]
    fn test_escape(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(escape(text), expected);
    }

    #[test]
    fn test_unescape_reverses_escape() {
        let text = "a {\n  b: \"c\\d\"\n}\n\tü\r\u{7}";
        let unescaped = unescape(&escape(text)).unwrap();
        assert_eq!(String::from_utf8(unescaped).unwrap(), text);
    }

    #[test]
    fn test_unescape_hex_and_question_mark() {
        assert_eq!(unescape("\\x41\\?").unwrap(), b"A?".to_vec());
    }

    #[test]
    fn test_unescape_rejects_unknown_escape() {
        assert!(unescape("\\q").is_err());
        assert!(unescape("trailing\\").is_err());
    }

    #[test]
    fn test_decode_literals_concatenates_continuation_lines() {
        let value = "\"a {\\n\"\n  \"  b: 1\\n\"\n  \"}\\n\"\n  \"\"";
        assert_eq!(decode_literals(value).unwrap(), "a {\n  b: 1\n}\n");
    }

    #[rstest]
    #[case("")]
    #[case("5")]
    #[case("\"open")]
    #[case("\"ok\" tail")]
    #[case("\"\\377\"")]
    fn test_decode_literals_rejects(#[case] value: &str) {
        assert!(decode_literals(value).is_err());
    }

    #[test]
    fn test_split_continuation() {
        let literal = quote("a {\n}\n");
        assert_eq!(
            split_continuation(&literal, "  "),
            "\"a {\\n\"\n  \"}\\n\"\n  \"\""
        );
    }
}
