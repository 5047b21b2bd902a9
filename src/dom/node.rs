//! XML node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references into the
//! document arena.

/// Compact node identifier (index into the arena)
///
/// Arena ids are assigned during parsing in document order, with an
/// element's attribute nodes allocated immediately after the element
/// itself. Sorting a set of ids therefore sorts it into document order.
pub type NodeId = u32;

/// Kind of XML node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Attribute node
    Attribute,
    /// Text content
    Text,
    /// CDATA section
    CData,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
}

/// An XML node in the arena
///
/// Attribute nodes have a parent but are never linked into the sibling
/// chain; elements address them through the contiguous id range
/// `attr_start .. attr_start + attr_count`.
#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Kind of this node
    pub kind: NodeKind,
    /// Parent node (None for the document root)
    pub parent: Option<NodeId>,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Previous sibling
    pub prev_sibling: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// String pool index of the name (elements, attributes, PIs)
    pub name_id: u32,
    /// String pool index of the value (text/CDATA/comment content,
    /// attribute values)
    pub value_id: u32,
    /// First attribute node id (elements only)
    pub attr_start: NodeId,
    /// Number of attribute nodes
    pub attr_count: u16,
}

impl XmlNode {
    fn blank(kind: NodeKind, parent: Option<NodeId>) -> Self {
        XmlNode {
            kind,
            parent,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id: 0,
            value_id: 0,
            attr_start: 0,
            attr_count: 0,
        }
    }

    /// Create the document root node
    pub fn document() -> Self {
        Self::blank(NodeKind::Document, None)
    }

    /// Create an element node
    pub fn element(name_id: u32, parent: NodeId) -> Self {
        XmlNode { name_id, ..Self::blank(NodeKind::Element, Some(parent)) }
    }

    /// Create an attribute node
    pub fn attribute(name_id: u32, value_id: u32, parent: NodeId) -> Self {
        XmlNode { name_id, value_id, ..Self::blank(NodeKind::Attribute, Some(parent)) }
    }

    /// Create a text node
    pub fn text(value_id: u32, parent: NodeId) -> Self {
        XmlNode { value_id, ..Self::blank(NodeKind::Text, Some(parent)) }
    }

    /// Create a CDATA node
    pub fn cdata(value_id: u32, parent: NodeId) -> Self {
        XmlNode { value_id, ..Self::blank(NodeKind::CData, Some(parent)) }
    }

    /// Create a comment node
    pub fn comment(value_id: u32, parent: NodeId) -> Self {
        XmlNode { value_id, ..Self::blank(NodeKind::Comment, Some(parent)) }
    }

    /// Create a processing instruction node
    pub fn processing_instruction(name_id: u32, parent: NodeId) -> Self {
        XmlNode { name_id, ..Self::blank(NodeKind::ProcessingInstruction, Some(parent)) }
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Check if this node carries character data (text or CDATA)
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text | NodeKind::CData)
    }
}
