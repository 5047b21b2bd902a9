//! XML attribute parsing
//!
//! Parses the attribute list from tag content (the bytes between the
//! element name and the closing '>'). Well-formedness rules enforced here:
//! names must be valid, values must be quoted, '<' and bare '&' are not
//! allowed inside values, and attribute names must be unique per element.

use super::entities::decode_text;
use super::scanner::{is_name_char, is_name_start_char};
use std::borrow::Cow;

/// A parsed XML attribute
#[derive(Debug, Clone)]
pub struct Attribute<'a> {
    /// Attribute name
    pub name: &'a [u8],
    /// Attribute value (entities decoded)
    pub value: Cow<'a, [u8]>,
}

impl<'a> Attribute<'a> {
    /// Get the name as a string
    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(self.name).ok()
    }

    /// Get the value as a string
    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(self.value.as_ref()).ok()
    }
}

/// Parse attributes from raw tag content (after the element name)
pub fn parse_attributes(input: &[u8]) -> Result<Vec<Attribute<'_>>, String> {
    let mut attrs: Vec<Attribute<'_>> = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() {
            break;
        }

        // Parse attribute name
        if !is_name_start_char(input[pos]) {
            return Err(format!(
                "invalid attribute name starting with '{}'",
                input[pos] as char
            ));
        }
        let name_start = pos;
        while pos < input.len() && is_name_char(input[pos]) {
            pos += 1;
        }
        let name = &input[name_start..pos];

        if attrs.iter().any(|a| a.name == name) {
            return Err(format!(
                "duplicate attribute '{}'",
                String::from_utf8_lossy(name)
            ));
        }

        // '=' may be surrounded by whitespace
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() || input[pos] != b'=' {
            return Err(format!(
                "attribute '{}' has no value",
                String::from_utf8_lossy(name)
            ));
        }
        pos += 1;
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }

        // Quoted value
        let quote = match input.get(pos) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => return Err("attribute value must be quoted".to_string()),
        };
        pos += 1;
        let value_start = pos;
        while pos < input.len() && input[pos] != quote {
            if input[pos] == b'<' {
                return Err("'<' not allowed in attribute value".to_string());
            }
            pos += 1;
        }
        if pos >= input.len() {
            return Err("attribute value has no closing quote".to_string());
        }

        let value = decode_text(&input[value_start..pos])?;
        attrs.push(Attribute { name, value });
        pos += 1; // closing quote
    }

    Ok(attrs)
}

#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_attributes() {
        let attrs = parse_attributes(b" id=\"test\" class=\"foo\"").unwrap();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].name_str(), Some("id"));
        assert_eq!(attrs[0].value_str(), Some("test"));
        assert_eq!(attrs[1].name_str(), Some("class"));
        assert_eq!(attrs[1].value_str(), Some("foo"));
    }

    #[test]
    fn test_single_quoted() {
        let attrs = parse_attributes(b" id='test'").unwrap();
        assert_eq!(attrs[0].value_str(), Some("test"));
    }

    #[test]
    fn test_entity_in_value() {
        let attrs = parse_attributes(b" title=\"&lt;hello&gt;\"").unwrap();
        assert_eq!(attrs[0].value_str(), Some("<hello>"));
    }

    #[test]
    fn test_whitespace_around_equals() {
        let attrs = parse_attributes(b"  id  =  \"test\"  ").unwrap();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].name_str(), Some("id"));
    }

    #[test]
    fn test_duplicate_rejected() {
        assert!(parse_attributes(b" a=\"1\" a=\"2\"").is_err());
    }

    #[test]
    fn test_unquoted_rejected() {
        assert!(parse_attributes(b" a=1").is_err());
    }

    #[test]
    fn test_missing_value_rejected() {
        assert!(parse_attributes(b" disabled").is_err());
    }

    #[test]
    fn test_angle_bracket_in_value_rejected() {
        assert!(parse_attributes(b" a=\"x<y\"").is_err());
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_attributes(b"").unwrap().is_empty());
    }
}
