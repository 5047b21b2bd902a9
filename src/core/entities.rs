//! XML entity decoding
//!
//! Decodes the predefined entities (&lt; &gt; &amp; &quot; &apos;) and
//! decimal/hex character references. Undeclared entities and bare '&' are
//! rejected: the parser has no DTD processing, so any unknown reference
//! makes the document ill-formed.
//!
//! Uses Cow for zero-copy when no references are present.

use memchr::memchr;
use std::borrow::Cow;

/// Decode text or attribute-value content, handling entity references
///
/// Returns Borrowed if no references are present (zero-copy).
pub fn decode_text(input: &[u8]) -> Result<Cow<'_, [u8]>, String> {
    validate_chars(input)?;

    if memchr(b'&', input).is_none() {
        return Ok(Cow::Borrowed(input));
    }
    decode_references(input).map(Cow::Owned)
}

/// Decode all entity and character references in the input
fn decode_references(input: &[u8]) -> Result<Vec<u8>, String> {
    let mut result = Vec::with_capacity(input.len());
    let mut pos = 0;

    while pos < input.len() {
        let Some(amp_pos) = memchr(b'&', &input[pos..]) else {
            result.extend_from_slice(&input[pos..]);
            break;
        };
        result.extend_from_slice(&input[pos..pos + amp_pos]);
        pos += amp_pos;

        let Some(semi_offset) = memchr(b';', &input[pos..]) else {
            return Err("bare '&' in content (no ';' terminator)".to_string());
        };
        let entity = &input[pos + 1..pos + semi_offset];
        let decoded = decode_entity(entity)?;
        result.extend_from_slice(decoded.as_bytes());
        pos += semi_offset + 1;
    }

    Ok(result)
}

/// Decode a single reference (the bytes between '&' and ';')
fn decode_entity(entity: &[u8]) -> Result<String, String> {
    if entity.is_empty() {
        return Err("empty entity reference".to_string());
    }

    if entity[0] == b'#' {
        return decode_char_ref(&entity[1..]);
    }

    match entity {
        b"lt" => Ok("<".to_string()),
        b"gt" => Ok(">".to_string()),
        b"amp" => Ok("&".to_string()),
        b"quot" => Ok("\"".to_string()),
        b"apos" => Ok("'".to_string()),
        other => Err(format!(
            "reference to undeclared entity '&{};'",
            String::from_utf8_lossy(other)
        )),
    }
}

/// Decode a numeric character reference (decimal or hex)
fn decode_char_ref(entity: &[u8]) -> Result<String, String> {
    let codepoint = if entity.first() == Some(&b'x') || entity.first() == Some(&b'X') {
        std::str::from_utf8(&entity[1..])
            .ok()
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
    } else {
        std::str::from_utf8(entity).ok().and_then(|dec| dec.parse::<u32>().ok())
    };

    let codepoint = codepoint.ok_or_else(|| "malformed character reference".to_string())?;
    if !is_valid_xml_char(codepoint) {
        return Err("character reference to invalid XML character".to_string());
    }
    char::from_u32(codepoint)
        .map(|c| c.to_string())
        .ok_or_else(|| "character reference to invalid codepoint".to_string())
}

/// Check if a code point is a valid XML 1.0 Char
///
/// Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
pub fn is_valid_xml_char(codepoint: u32) -> bool {
    matches!(codepoint,
        0x9 | 0xA | 0xD |
        0x20..=0xD7FF |
        0xE000..=0xFFFD |
        0x10000..=0x10FFFF
    )
}

/// Reject ASCII control characters that XML 1.0 does not allow
///
/// The document is validated as UTF-8 up front, so multi-byte sequences
/// only need the codepoint-range checks done at reference decoding.
pub fn validate_chars(content: &[u8]) -> Result<(), String> {
    for &b in content {
        if b < 0x20 && !matches!(b, 0x09 | 0x0A | 0x0D) {
            return Err("control character not allowed in content".to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entities() {
        let result = decode_text(b"Hello, World!").unwrap();
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result.as_ref(), b"Hello, World!");
    }

    #[test]
    fn test_predefined_entities() {
        let result = decode_text(b"&lt;hello&gt; &amp; &quot;world&quot;").unwrap();
        assert_eq!(result.as_ref(), b"<hello> & \"world\"");
    }

    #[test]
    fn test_numeric_decimal() {
        let result = decode_text(b"&#65;&#66;&#67;").unwrap();
        assert_eq!(result.as_ref(), b"ABC");
    }

    #[test]
    fn test_numeric_hex() {
        let result = decode_text(b"&#x41;&#x42;&#x43;").unwrap();
        assert_eq!(result.as_ref(), b"ABC");
    }

    #[test]
    fn test_supplementary_plane() {
        let result = decode_text("&#x1F600;".as_bytes()).unwrap();
        assert_eq!(std::str::from_utf8(result.as_ref()).unwrap(), "\u{1F600}");
    }

    #[test]
    fn test_undeclared_entity_rejected() {
        assert!(decode_text(b"&unknown;").is_err());
    }

    #[test]
    fn test_bare_ampersand_rejected() {
        assert!(decode_text(b"fish & chips").is_err());
    }

    #[test]
    fn test_invalid_char_ref_rejected() {
        assert!(decode_text(b"&#0;").is_err());
        assert!(decode_text(b"&#xD800;").is_err());
    }

    #[test]
    fn test_control_char_rejected() {
        assert!(decode_text(b"a\x01b").is_err());
    }
}
