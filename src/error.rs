//! Error taxonomy for the public surface
//!
//! Absence is never an error here: missing matches come back as `None` or
//! an empty vec from the optional accessors. These variants cover invalid
//! input and asserted-but-missing results only.

use crate::dom::NodeKind;

/// Errors surfaced by document parsing and element navigation
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The input could not be parsed as a well-formed XML document
    #[error("invalid XML document: {0}")]
    InvalidDocument(String),

    /// The query string was empty or rejected by the XPath engine
    #[error("invalid XPath query: {0}")]
    InvalidQuery(String),

    /// A non-query argument failed validation
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A throwing accessor found no result where its optional twin would
    /// return absence
    #[error("no such element or attribute")]
    NotFound,

    /// `parent()` called on an element with no element parent
    #[error("element has no parent element")]
    NoParent,

    /// Internal consistency fault: a non-element node reached the element
    /// constructor. Every public path filters to elements first, so
    /// seeing this indicates a bug in this crate, not in caller input.
    #[error("node is not an element (kind: {0:?})")]
    NotAnElement(NodeKind),
}
