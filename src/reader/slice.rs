//! Slice reader
//!
//! Reads XML events from a byte slice by driving the tokenizer and
//! extracting attribute lists from tag spans.

use super::events::{StartElement, XmlEvent};
use crate::core::attributes::parse_attributes;
use crate::core::tokenizer::{ParseError, Token, TokenKind, Tokenizer};

/// XML event reader over a byte slice
pub struct SliceReader<'a> {
    input: &'a [u8],
    tokenizer: Tokenizer<'a>,
}

impl<'a> SliceReader<'a> {
    /// Create a new reader
    pub fn new(input: &'a [u8]) -> Self {
        SliceReader { input, tokenizer: Tokenizer::new(input) }
    }

    /// Get the next XML event, or None at end of input
    pub fn next_event(&mut self) -> Result<Option<XmlEvent<'a>>, ParseError> {
        let Some(token) = self.tokenizer.next_token()? else {
            return Ok(None);
        };

        let event = match token.kind {
            TokenKind::StartTag => XmlEvent::StartElement(self.tag_element(&token)?),
            TokenKind::EmptyTag => XmlEvent::EmptyElement(self.tag_element(&token)?),
            TokenKind::EndTag => {
                let name = token.name.unwrap_or_default();
                XmlEvent::EndElement(name)
            }
            TokenKind::Text => XmlEvent::Text(token.content.unwrap_or_default()),
            TokenKind::CData => XmlEvent::CData(token.content.unwrap_or_default()),
            TokenKind::Comment => XmlEvent::Comment(token.content.unwrap_or_default()),
            TokenKind::ProcessingInstruction => {
                XmlEvent::ProcessingInstruction(token.name.unwrap_or_default())
            }
            TokenKind::XmlDeclaration => XmlEvent::XmlDeclaration,
            TokenKind::DocType => XmlEvent::DocType,
        };
        Ok(Some(event))
    }

    /// Build a StartElement from a tag token, parsing its attribute list
    fn tag_element(&self, token: &Token<'a>) -> Result<StartElement<'a>, ParseError> {
        let name = token.name.unwrap_or_default();
        let (start, end) = token.span;

        // Attribute content sits between the element name and '>' or '/>'
        let attr_start = start + 1 + name.len();
        let mut attr_end = end - 1;
        if self.input[..attr_end].ends_with(b"/") {
            attr_end -= 1;
        }

        let attributes = if attr_start < attr_end {
            parse_attributes(&self.input[attr_start..attr_end])
                .map_err(|msg| ParseError::new(msg, attr_start))?
        } else {
            Vec::new()
        };

        Ok(StartElement { name, attributes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_events(input: &[u8]) -> Result<Vec<XmlEvent<'_>>, ParseError> {
        let mut reader = SliceReader::new(input);
        let mut events = Vec::new();
        while let Some(event) = reader.next_event()? {
            events.push(event);
        }
        Ok(events)
    }

    #[test]
    fn test_simple_element() {
        let events = collect_events(b"<root>hello</root>").unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], XmlEvent::StartElement(e) if e.name_str() == Some("root")));
        assert!(matches!(&events[1], XmlEvent::Text(t) if t.as_ref() == b"hello"));
        assert!(matches!(&events[2], XmlEvent::EndElement(n) if *n == b"root"));
    }

    #[test]
    fn test_attributes() {
        let events = collect_events(b"<div id=\"main\" class=\"container\"/>").unwrap();
        assert_eq!(events.len(), 1);
        let XmlEvent::EmptyElement(e) = &events[0] else {
            panic!("expected EmptyElement");
        };
        assert_eq!(e.get_attribute_value("id"), Some("main"));
        assert_eq!(e.get_attribute_value("class"), Some("container"));
    }

    #[test]
    fn test_empty_element_without_attributes() {
        let events = collect_events(b"<br/>").unwrap();
        assert!(matches!(&events[0], XmlEvent::EmptyElement(e) if e.name_str() == Some("br")));
    }

    #[test]
    fn test_duplicate_attribute_rejected() {
        assert!(collect_events(b"<a x=\"1\" x=\"2\"/>").is_err());
    }

    #[test]
    fn test_cdata_content() {
        let events = collect_events(b"<s><![CDATA[a < b]]></s>").unwrap();
        assert!(matches!(&events[1], XmlEvent::CData(c) if c.as_ref() == b"a < b"));
    }
}
