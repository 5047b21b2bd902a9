//! Element facade
//!
//! `Element` is the public face of the crate: a read-only view over a
//! single element node of a parsed [`Document`]. It exposes parent
//! navigation, XPath search, text extraction, and attribute access, and
//! nothing else — no mutation, no serialization.
//!
//! Every lookup comes in two flavors: an optional variant that reports
//! absence as a value, and a throwing variant that converts the same
//! absence into an error for call sites that assert the result must
//! exist. The throwing variants are one-line adapters over their optional
//! twins; the lookup logic is never duplicated.

use crate::dom::{Document, NodeId, NodeKind};
use crate::error::Error;
use crate::xpath::{self, XPathValue};
use std::collections::HashSet;

/// A read-only view over one element of a parsed document
///
/// The facade borrows from its [`Document`]; it is `Copy`, carries no
/// state of its own, and stays valid for as long as the document lives.
/// Two facades compare equal when they wrap the same node of the same
/// document.
///
/// Only element nodes can be wrapped. All public constructors and query
/// results filter to element kind before wrapping, so a facade over a
/// text, comment, or attribute node cannot be observed.
#[derive(Clone, Copy)]
pub struct Element<'d> {
    doc: &'d Document,
    node: NodeId,
}

impl Document {
    /// The document element, wrapped as a facade
    ///
    /// The parser guarantees exactly one element at document level, so
    /// the element invariant holds without a check.
    pub fn root(&self) -> Element<'_> {
        Element { doc: self, node: self.root_element_id() }
    }
}

impl<'d> Element<'d> {
    /// Wrap a node, enforcing the element-kind invariant
    ///
    /// Public paths filter to elements before calling this; a
    /// [`Error::NotAnElement`] escaping to a caller indicates a bug in
    /// this crate.
    fn wrap(doc: &'d Document, node: NodeId) -> Result<Element<'d>, Error> {
        match doc.node(node) {
            Some(n) if n.is_element() => Ok(Element { doc, node }),
            Some(n) => Err(Error::NotAnElement(n.kind)),
            // Ids originate from this document, so this arm is unreachable
            None => Err(Error::NotAnElement(NodeKind::Document)),
        }
    }

    /// Try to get the parent of this element
    ///
    /// Returns None when there is no parent element: the document element
    /// has only the document node above it, which has no facade
    /// representation.
    pub fn try_parent(&self) -> Option<Element<'d>> {
        // Route through the evaluator so the element filtering matches
        // every other query path
        let result = xpath::evaluate_from_node(self.doc, self.node, "parent::node()").ok()?;
        let XPathValue::NodeSet(nodes) = result else {
            return None;
        };
        nodes
            .into_iter()
            .find(|&id| self.doc.kind_of(id) == Some(NodeKind::Element))
            .and_then(|id| Element::wrap(self.doc, id).ok())
    }

    /// Get the parent of this element
    ///
    /// Fails with [`Error::NoParent`] if this element has no parent
    /// element (for example, it is the root element).
    pub fn parent(&self) -> Result<Element<'d>, Error> {
        self.try_parent().ok_or(Error::NoParent)
    }

    /// Find all matching elements for an XPath query
    ///
    /// The query is evaluated with this element as the context node;
    /// absolute paths still address the whole document. Non-element nodes
    /// matched by the query (attributes, text, comments) are filtered out
    /// of the result. Order is the evaluator's document order. No match
    /// is an empty vec, never an error.
    ///
    /// Fails with [`Error::InvalidQuery`] if the query is empty, does not
    /// parse, or does not select nodes.
    pub fn find_all(&self, query: &str) -> Result<Vec<Element<'d>>, Error> {
        if query.trim().is_empty() {
            return Err(Error::InvalidQuery("query is empty".to_string()));
        }

        let result = xpath::evaluate_from_node(self.doc, self.node, query)
            .map_err(Error::InvalidQuery)?;
        let XPathValue::NodeSet(nodes) = result else {
            return Err(Error::InvalidQuery("query does not select nodes".to_string()));
        };

        nodes
            .into_iter()
            .filter(|&id| self.doc.kind_of(id) == Some(NodeKind::Element))
            .map(|id| Element::wrap(self.doc, id))
            .collect()
    }

    /// Try to find the first matching element for an XPath query
    ///
    /// Propagates [`Error::InvalidQuery`] unchanged.
    pub fn try_find(&self, query: &str) -> Result<Option<Element<'d>>, Error> {
        Ok(self.find_all(query)?.into_iter().next())
    }

    /// Find the first matching element for an XPath query
    ///
    /// Fails with [`Error::NotFound`] if nothing matches.
    pub fn find(&self, query: &str) -> Result<Element<'d>, Error> {
        self.try_find(query)?.ok_or(Error::NotFound)
    }

    /// Text content of this element and all elements inside it
    ///
    /// Descendant text and CDATA values concatenated in document order;
    /// the empty string when there is none. Never fails.
    pub fn text(&self) -> String {
        self.doc.string_value(self.node)
    }

    /// Try to get the value of an attribute by name
    ///
    /// Fails with [`Error::InvalidArgument`] if the name is empty;
    /// returns None when no such attribute exists.
    pub fn try_attribute(&self, name: &str) -> Result<Option<&'d str>, Error> {
        if name.is_empty() {
            return Err(Error::InvalidArgument("attribute name is empty"));
        }
        Ok(self.doc.attribute(self.node, name))
    }

    /// Get the value of an attribute by name
    ///
    /// Fails with [`Error::NotFound`] if no such attribute exists.
    pub fn attribute(&self, name: &str) -> Result<&'d str, Error> {
        self.try_attribute(name)?.ok_or(Error::NotFound)
    }

    /// Names of all attributes, as an unordered set
    ///
    /// Empty when the element carries no attributes. The parser rejects
    /// duplicate attribute names, so the set size always equals the
    /// attribute count.
    pub fn attribute_names(&self) -> HashSet<&'d str> {
        self.doc.attribute_ids(self.node).map(|id| self.doc.name(id)).collect()
    }
}

impl PartialEq for Element<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.node == other.node
    }
}

impl Eq for Element<'_> {}

impl std::fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("name", &self.doc.name(self.node))
            .field("node", &self.node)
            .finish()
    }
}
