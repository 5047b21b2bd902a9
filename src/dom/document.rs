//! XML document: arena-based DOM representation
//!
//! The document owns every node for its lifetime. Nodes live in a flat
//! arena addressed by `NodeId`; names, values and text are interned in a
//! `StringPool`. Arena order is document order, with each element's
//! attribute nodes allocated directly after the element itself.
//!
//! Parsing is strict: any well-formedness violation reported by the
//! reader layer, and any structural violation found while building the
//! tree (tag mismatch, multiple roots, text at document level, ...), is
//! surfaced as `Error::InvalidDocument`.

use super::node::{NodeId, NodeKind, XmlNode};
use super::strings::StringPool;
use crate::error::Error;
use crate::reader::events::{StartElement, XmlEvent};
use crate::reader::slice::SliceReader;
use std::io::Read;

/// A parsed, immutable XML document
pub struct Document {
    nodes: Vec<XmlNode>,
    strings: StringPool,
    root_element: NodeId,
}

impl Document {
    /// Parse an XML document from a byte slice
    ///
    /// Fails with [`Error::InvalidDocument`] if the input is empty, not
    /// UTF-8, or not well-formed XML 1.0.
    pub fn parse(input: &[u8]) -> Result<Document, Error> {
        if std::str::from_utf8(input).is_err() {
            return Err(Error::InvalidDocument("input is not valid UTF-8".to_string()));
        }

        let mut builder = Builder::new();
        let mut reader = SliceReader::new(input);
        loop {
            let event = match reader.next_event() {
                Ok(Some(event)) => event,
                Ok(None) => break,
                Err(e) => return Err(Error::InvalidDocument(e.to_string())),
            };
            builder.handle(event).map_err(Error::InvalidDocument)?;
        }
        let doc = builder.finish().map_err(Error::InvalidDocument)?;

        tracing::debug!(
            nodes = doc.node_count(),
            strings = doc.strings.len(),
            "parsed XML document"
        );
        Ok(doc)
    }

    /// Parse an XML document from a reader
    ///
    /// The stream is consumed to its end before parsing starts; the caller
    /// may close it immediately afterwards.
    pub fn from_reader(mut reader: impl Read) -> Result<Document, Error> {
        let mut input = Vec::new();
        reader
            .read_to_end(&mut input)
            .map_err(|e| Error::InvalidDocument(format!("failed to read input: {e}")))?;
        Self::parse(&input)
    }

    /// Id of the document element
    pub fn root_element_id(&self) -> NodeId {
        self.root_element
    }

    /// Id of the document node itself
    pub fn document_node_id(&self) -> NodeId {
        0
    }

    /// Get a node by id
    pub fn node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id as usize)
    }

    /// Get a node's kind
    pub fn kind_of(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).map(|n| n.kind)
    }

    /// Get a node's name (elements, attributes, PI targets)
    pub fn name(&self, id: NodeId) -> &str {
        match self.node(id) {
            Some(node) => self.strings.get_str(node.name_id),
            None => "",
        }
    }

    /// Get a node's name without any prefix
    pub fn local_name(&self, id: NodeId) -> &str {
        let name = self.name(id);
        match name.find(':') {
            Some(pos) => &name[pos + 1..],
            None => name,
        }
    }

    /// Get a node's own value (text/CDATA/comment content, attribute value)
    pub fn value(&self, id: NodeId) -> &str {
        match self.node(id) {
            Some(node) => self.strings.get_str(node.value_id),
            None => "",
        }
    }

    /// Ids of an element's attribute nodes
    pub fn attribute_ids(&self, id: NodeId) -> impl Iterator<Item = NodeId> {
        let (start, count) = match self.node(id) {
            Some(node) => (node.attr_start, node.attr_count as u32),
            None => (0, 0),
        };
        start..start + count
    }

    /// Look up an attribute value by name on an element
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attribute_ids(id)
            .find(|&attr_id| self.name(attr_id) == name)
            .map(|attr_id| self.value(attr_id))
    }

    /// Parent of a node, if any
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Next sibling of a node, if any
    pub fn next_sibling_of(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.next_sibling)
    }

    /// Previous sibling of a node, if any
    pub fn prev_sibling_of(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.prev_sibling)
    }

    /// Iterate over children of a node (attribute nodes are not children)
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        let first = self.node(id).and_then(|n| n.first_child);
        ChildIter { doc: self, next: first }
    }

    /// Iterate over all descendants of a node, depth-first
    pub fn descendants(&self, id: NodeId) -> DescendantIter<'_> {
        let mut stack = Vec::new();
        if let Some(node) = self.node(id) {
            let mut child_id = node.last_child;
            while let Some(cid) = child_id {
                stack.push(cid);
                child_id = self.node(cid).and_then(|n| n.prev_sibling);
            }
        }
        DescendantIter { doc: self, stack }
    }

    /// XPath string-value of a node
    ///
    /// Elements and the document node concatenate all descendant text and
    /// CDATA content in document order; text-like nodes and attributes
    /// yield their own content; processing instructions yield nothing.
    pub fn string_value(&self, id: NodeId) -> String {
        match self.kind_of(id) {
            Some(NodeKind::Element) | Some(NodeKind::Document) => {
                let mut out = String::new();
                for desc in self.descendants(id) {
                    if self.node(desc).is_some_and(XmlNode::is_text) {
                        out.push_str(self.value(desc));
                    }
                }
                out
            }
            Some(NodeKind::Text) | Some(NodeKind::CData) | Some(NodeKind::Comment)
            | Some(NodeKind::Attribute) => self.value(id).to_string(),
            _ => String::new(),
        }
    }

    /// Total number of nodes in the arena
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Iterator over child nodes
pub struct ChildIter<'d> {
    doc: &'d Document,
    next: Option<NodeId>,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.next_sibling_of(current);
        Some(current)
    }
}

/// Iterator over descendant nodes (depth-first, document order)
pub struct DescendantIter<'d> {
    doc: &'d Document,
    stack: Vec<NodeId>,
}

impl Iterator for DescendantIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        if let Some(node) = self.doc.node(current) {
            let mut child_id = node.last_child;
            while let Some(cid) = child_id {
                self.stack.push(cid);
                child_id = self.doc.node(cid).and_then(|n| n.prev_sibling);
            }
        }
        Some(current)
    }
}

/// Incremental DOM builder driven by reader events
struct Builder<'a> {
    nodes: Vec<XmlNode>,
    strings: StringPool,
    root_element: Option<NodeId>,
    /// Open element stack; index 0 is the document node
    stack: Vec<NodeId>,
    /// Open tag names, for end-tag matching
    tag_stack: Vec<&'a [u8]>,
    seen_any_event: bool,
}

impl<'a> Builder<'a> {
    fn new() -> Self {
        Builder {
            nodes: vec![XmlNode::document()],
            strings: StringPool::new(),
            root_element: None,
            stack: vec![0],
            tag_stack: Vec::new(),
            seen_any_event: false,
        }
    }

    fn handle(&mut self, event: XmlEvent<'a>) -> Result<(), String> {
        let first_event = !self.seen_any_event;
        self.seen_any_event = true;

        match event {
            XmlEvent::StartElement(elem) => {
                self.tag_stack.push(elem.name);
                let node_id = self.open_element(elem)?;
                self.stack.push(node_id);
            }
            XmlEvent::EmptyElement(elem) => {
                self.open_element(elem)?;
            }
            XmlEvent::EndElement(name) => match self.tag_stack.pop() {
                Some(open) if open == name => {
                    self.stack.pop();
                }
                Some(open) => {
                    return Err(format!(
                        "tag mismatch: <{}> closed with </{}>",
                        String::from_utf8_lossy(open),
                        String::from_utf8_lossy(name)
                    ));
                }
                None => {
                    return Err(format!(
                        "unexpected end tag </{}>",
                        String::from_utf8_lossy(name)
                    ));
                }
            },
            XmlEvent::Text(content) => {
                if self.at_document_level() {
                    let is_whitespace =
                        content.iter().all(|&b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'));
                    if !is_whitespace {
                        return Err("text content not allowed at document level".to_string());
                    }
                    // Inter-markup whitespace carries no information
                    return Ok(());
                }
                if !content.is_empty() {
                    let value_id = self.strings.intern(content.as_ref());
                    self.append(XmlNode::text(value_id, self.parent_id()));
                }
            }
            XmlEvent::CData(content) => {
                if self.at_document_level() {
                    return Err("CDATA section not allowed at document level".to_string());
                }
                let value_id = self.strings.intern(content.as_ref());
                self.append(XmlNode::cdata(value_id, self.parent_id()));
            }
            XmlEvent::Comment(content) => {
                let value_id = self.strings.intern(content.as_ref());
                self.append(XmlNode::comment(value_id, self.parent_id()));
            }
            XmlEvent::ProcessingInstruction(target) => {
                let name_id = self.strings.intern(target);
                self.append(XmlNode::processing_instruction(name_id, self.parent_id()));
            }
            XmlEvent::XmlDeclaration => {
                if !first_event {
                    return Err("XML declaration must be at the start of the document".to_string());
                }
            }
            XmlEvent::DocType => {
                if self.root_element.is_some() {
                    return Err("DOCTYPE must come before the root element".to_string());
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Document, String> {
        if let Some(open) = self.tag_stack.first() {
            return Err(format!("unclosed tag <{}>", String::from_utf8_lossy(open)));
        }
        let Some(root_element) = self.root_element else {
            return Err("document has no root element".to_string());
        };
        Ok(Document { nodes: self.nodes, strings: self.strings, root_element })
    }

    fn at_document_level(&self) -> bool {
        self.stack.len() == 1
    }

    fn parent_id(&self) -> NodeId {
        *self.stack.last().unwrap_or(&0)
    }

    /// Create an element node and its attribute nodes, returning the
    /// element id
    fn open_element(&mut self, elem: StartElement<'_>) -> Result<NodeId, String> {
        if self.at_document_level() && self.root_element.is_some() {
            return Err("document has more than one root element".to_string());
        }

        let parent_id = self.parent_id();
        let name_id = self.strings.intern(elem.name);
        let mut node = XmlNode::element(name_id, parent_id);

        let node_id = self.nodes.len() as NodeId;
        node.attr_start = node_id + 1;
        node.attr_count = elem.attributes.len().min(u16::MAX as usize) as u16;
        self.nodes.push(node);
        self.link_child(parent_id, node_id);

        // Attribute nodes follow their element directly so that arena
        // order stays document order
        for attr in &elem.attributes {
            let attr_name_id = self.strings.intern(attr.name);
            let attr_value_id = self.strings.intern(attr.value.as_ref());
            self.nodes.push(XmlNode::attribute(attr_name_id, attr_value_id, node_id));
        }

        if self.root_element.is_none() && parent_id == 0 {
            self.root_element = Some(node_id);
        }
        Ok(node_id)
    }

    /// Append a non-attribute node and link it into the child chain
    fn append(&mut self, node: XmlNode) {
        let parent_id = node.parent.unwrap_or(0);
        let node_id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        self.link_child(parent_id, node_id);
    }

    fn link_child(&mut self, parent_id: NodeId, child_id: NodeId) {
        let last_child = self.nodes[parent_id as usize].last_child;
        if let Some(last_id) = last_child {
            self.nodes[child_id as usize].prev_sibling = Some(last_id);
            self.nodes[last_id as usize].next_sibling = Some(child_id);
        } else {
            self.nodes[parent_id as usize].first_child = Some(child_id);
        }
        self.nodes[parent_id as usize].last_child = Some(child_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let doc = Document::parse(b"<root>hello</root>").unwrap();
        assert_eq!(doc.name(doc.root_element_id()), "root");
        assert_eq!(doc.string_value(doc.root_element_id()), "hello");
    }

    #[test]
    fn test_parse_nested() {
        let doc = Document::parse(b"<a><b><c/></b></a>").unwrap();
        let root = doc.root_element_id();
        let children: Vec<_> = doc.children(root).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(doc.name(children[0]), "b");
    }

    #[test]
    fn test_descendants() {
        let doc = Document::parse(b"<root><a/><b><c/></b></root>").unwrap();
        let root = doc.root_element_id();
        let names: Vec<_> = doc.descendants(root).map(|id| doc.name(id).to_string()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_attribute_nodes_follow_element() {
        let doc = Document::parse(b"<root a=\"1\" b=\"2\"><child/></root>").unwrap();
        let root = doc.root_element_id();
        let attrs: Vec<_> = doc.attribute_ids(root).collect();
        assert_eq!(attrs, vec![root + 1, root + 2]);
        assert_eq!(doc.kind_of(attrs[0]), Some(NodeKind::Attribute));
        assert_eq!(doc.name(attrs[0]), "a");
        assert_eq!(doc.value(attrs[1]), "2");
        assert_eq!(doc.attribute(root, "b"), Some("2"));
        assert_eq!(doc.attribute(root, "c"), None);
    }

    #[test]
    fn test_attributes_are_not_children() {
        let doc = Document::parse(b"<root a=\"1\"><child/></root>").unwrap();
        let children: Vec<_> = doc.children(doc.root_element_id()).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(doc.kind_of(children[0]), Some(NodeKind::Element));
    }

    #[test]
    fn test_text_entities_decoded() {
        let doc = Document::parse(b"<m>fish &amp; chips</m>").unwrap();
        assert_eq!(doc.string_value(doc.root_element_id()), "fish & chips");
    }

    #[test]
    fn test_string_value_concatenates_in_document_order() {
        let doc = Document::parse(b"<r>one<m>two</m><![CDATA[three]]></r>").unwrap();
        assert_eq!(doc.string_value(doc.root_element_id()), "onetwothree");
    }

    #[test]
    fn test_comments_excluded_from_string_value() {
        let doc = Document::parse(b"<r>a<!-- skip -->b</r>").unwrap();
        assert_eq!(doc.string_value(doc.root_element_id()), "ab");
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(Document::parse(b"").is_err());
        assert!(Document::parse(b"   \n").is_err());
    }

    #[test]
    fn test_multiple_roots_rejected() {
        assert!(Document::parse(b"<a/><b/>").is_err());
    }

    #[test]
    fn test_tag_mismatch_rejected() {
        assert!(Document::parse(b"<a><b></a></b>").is_err());
    }

    #[test]
    fn test_unclosed_tag_rejected() {
        assert!(Document::parse(b"<a><b></b>").is_err());
    }

    #[test]
    fn test_text_at_document_level_rejected() {
        assert!(Document::parse(b"<a/>trailing").is_err());
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        assert!(Document::parse(b"<a>\xFF</a>").is_err());
    }

    #[test]
    fn test_prolog_accepted() {
        let doc =
            Document::parse(b"<?xml version=\"1.0\"?>\n<!DOCTYPE r>\n<!-- doc --><r/>").unwrap();
        assert_eq!(doc.name(doc.root_element_id()), "r");
    }

    #[test]
    fn test_from_reader() {
        let doc = Document::from_reader(&b"<root/>"[..]).unwrap();
        assert_eq!(doc.name(doc.root_element_id()), "root");
    }
}
