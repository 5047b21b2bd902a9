//! XML event types
//!
//! Event types for pull-parser style XML processing.

use crate::core::attributes::Attribute;
use std::borrow::Cow;

/// XML parsing event
#[derive(Debug, Clone)]
pub enum XmlEvent<'a> {
    /// Start of an element: `<name attrs...>`
    StartElement(StartElement<'a>),
    /// End of an element: `</name>`
    EndElement(&'a [u8]),
    /// Empty element: `<name attrs.../>`
    EmptyElement(StartElement<'a>),
    /// Text content between tags
    Text(Cow<'a, [u8]>),
    /// CDATA section content
    CData(Cow<'a, [u8]>),
    /// Comment content
    Comment(Cow<'a, [u8]>),
    /// Processing instruction target
    ProcessingInstruction(&'a [u8]),
    /// XML declaration: `<?xml version="1.0"?>`
    XmlDeclaration,
    /// DOCTYPE declaration (content skipped)
    DocType,
}

/// Start element event data
#[derive(Debug, Clone)]
pub struct StartElement<'a> {
    /// Element name
    pub name: &'a [u8],
    /// Element attributes, in source order
    pub attributes: Vec<Attribute<'a>>,
}

impl<'a> StartElement<'a> {
    /// Get the name as a string
    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(self.name).ok()
    }

    /// Get an attribute value by name as string
    pub fn get_attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name_str() == Some(name))
            .and_then(|a| a.value_str())
    }
}
