//! XPath axes
//!
//! Axis navigation over the arena DOM. The attribute axis yields the
//! element's attribute nodes; every other axis walks the child/sibling
//! links, so attribute nodes never appear on them.

use super::parser::{Axis, NodeTest};
use crate::dom::{Document, NodeId, NodeKind};

/// Navigate along an axis from a context node
///
/// Results come back in axis order: forward axes in document order,
/// reverse axes (ancestor, preceding, preceding-sibling) walking away
/// from the context node.
pub fn navigate(doc: &Document, context: NodeId, axis: Axis) -> Vec<NodeId> {
    match axis {
        Axis::Child => doc.children(context).collect(),
        Axis::Descendant => doc.descendants(context).collect(),
        Axis::DescendantOrSelf => {
            let mut result = vec![context];
            result.extend(doc.descendants(context));
            result
        }
        Axis::Parent => doc.parent_of(context).into_iter().collect(),
        Axis::Ancestor => ancestor_axis(doc, context),
        Axis::AncestorOrSelf => {
            let mut result = vec![context];
            result.extend(ancestor_axis(doc, context));
            result
        }
        Axis::FollowingSibling => {
            let mut result = Vec::new();
            let mut sibling = doc.next_sibling_of(context);
            while let Some(id) = sibling {
                result.push(id);
                sibling = doc.next_sibling_of(id);
            }
            result
        }
        Axis::PrecedingSibling => {
            let mut result = Vec::new();
            let mut sibling = doc.prev_sibling_of(context);
            while let Some(id) = sibling {
                result.push(id);
                sibling = doc.prev_sibling_of(id);
            }
            result
        }
        Axis::Following => following_axis(doc, context),
        Axis::Preceding => preceding_axis(doc, context),
        Axis::Self_ => vec![context],
        Axis::Attribute => doc.attribute_ids(context).collect(),
    }
}

/// ancestor:: - parent, grandparent, up to the document node
fn ancestor_axis(doc: &Document, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut current = context;
    while let Some(parent) = doc.parent_of(current) {
        result.push(parent);
        current = parent;
    }
    result
}

/// following:: - everything after the context node in document order,
/// descendants and ancestors excluded
fn following_axis(doc: &Document, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();

    let mut node = Some(context);
    while let Some(current) = node {
        let mut sibling = doc.next_sibling_of(current);
        while let Some(sib_id) = sibling {
            result.push(sib_id);
            result.extend(doc.descendants(sib_id));
            sibling = doc.next_sibling_of(sib_id);
        }
        node = doc.parent_of(current);
    }

    result
}

/// preceding:: - everything before the context node in document order,
/// ancestors excluded; reverse document order
fn preceding_axis(doc: &Document, context: NodeId) -> Vec<NodeId> {
    let ancestors: std::collections::HashSet<NodeId> =
        ancestor_axis(doc, context).into_iter().collect();

    // Attribute nodes do not sit in the child chain; stop at their
    // owning element instead
    let stop = match doc.kind_of(context) {
        Some(NodeKind::Attribute) => doc.parent_of(context).unwrap_or(context),
        _ => context,
    };

    let mut result = Vec::new();
    for id in doc.descendants(doc.document_node_id()) {
        if id == stop {
            break;
        }
        if !ancestors.contains(&id) {
            result.push(id);
        }
    }
    result.reverse();
    result
}

/// Check if a node matches a node test on the given axis
///
/// The principal node kind is Attribute for the attribute axis and
/// Element everywhere else; `*` and name tests only match the principal
/// kind.
pub fn matches_node_test(doc: &Document, axis: Axis, node_id: NodeId, test: &NodeTest) -> bool {
    let Some(kind) = doc.kind_of(node_id) else {
        return false;
    };
    let principal =
        if axis == Axis::Attribute { NodeKind::Attribute } else { NodeKind::Element };

    match test {
        NodeTest::Any => kind == principal,
        NodeTest::Name(name) => kind == principal && doc.name(node_id) == name,
        NodeTest::Node => true,
        NodeTest::Text => matches!(kind, NodeKind::Text | NodeKind::CData),
        NodeTest::Comment => kind == NodeKind::Comment,
        NodeTest::ProcessingInstruction(target) => {
            kind == NodeKind::ProcessingInstruction
                && target.as_deref().map_or(true, |t| doc.name(node_id) == t)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested() -> Document {
        Document::parse(b"<root><a><b/></a><c/></root>").unwrap()
    }

    #[test]
    fn test_child_axis() {
        let doc = nested();
        let children = navigate(&doc, doc.root_element_id(), Axis::Child);
        assert_eq!(children.len(), 2);
    }

    #[test]
    fn test_descendant_axis() {
        let doc = nested();
        let descendants = navigate(&doc, doc.root_element_id(), Axis::Descendant);
        assert_eq!(descendants.len(), 3); // a, b, c
    }

    #[test]
    fn test_ancestor_axis() {
        let doc = nested();
        let a = doc.children(doc.root_element_id()).next().unwrap();
        let b = doc.children(a).next().unwrap();
        let ancestors = navigate(&doc, b, Axis::Ancestor);
        assert_eq!(ancestors, vec![a, doc.root_element_id(), doc.document_node_id()]);
    }

    #[test]
    fn test_attribute_axis() {
        let doc = Document::parse(b"<root a=\"1\" b=\"2\"/>").unwrap();
        let attrs = navigate(&doc, doc.root_element_id(), Axis::Attribute);
        assert_eq!(attrs.len(), 2);
        assert!(attrs.iter().all(|&id| doc.kind_of(id) == Some(NodeKind::Attribute)));
    }

    #[test]
    fn test_following_and_preceding() {
        let doc = nested();
        let a = doc.children(doc.root_element_id()).next().unwrap();
        let b = doc.children(a).next().unwrap();
        let c = navigate(&doc, doc.root_element_id(), Axis::Child)[1];

        assert_eq!(navigate(&doc, a, Axis::Following), vec![c]);
        assert_eq!(navigate(&doc, c, Axis::Preceding), vec![b, a]);
    }

    #[test]
    fn test_name_test_ignores_non_principal() {
        let doc = Document::parse(b"<root x=\"1\"><x/></root>").unwrap();
        let root = doc.root_element_id();
        let attr = doc.attribute_ids(root).next().unwrap();
        let elem = doc.children(root).next().unwrap();

        let test = NodeTest::Name("x".to_string());
        assert!(matches_node_test(&doc, Axis::Child, elem, &test));
        assert!(!matches_node_test(&doc, Axis::Child, attr, &test));
        assert!(matches_node_test(&doc, Axis::Attribute, attr, &test));
    }
}
