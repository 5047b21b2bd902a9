//! XPath evaluation engine
//!
//! Evaluates compiled XPath expressions against a document with a stack
//! machine. Location steps apply their predicates per context node, so
//! positional predicates count within each step's own candidate list;
//! filter-expression predicates apply over the whole set.

use super::axes::{matches_node_test, navigate};
use super::compiler::{self, CompiledExpr, Op};
use super::functions;
use super::parser::BinaryOp;
use super::value::XPathValue;
use crate::dom::{Document, NodeId};
use std::collections::HashSet;

/// Evaluation context
pub struct EvalContext<'d> {
    pub doc: &'d Document,
    pub context_node: NodeId,
    pub context_position: usize,
    pub context_size: usize,
}

/// Evaluate an XPath expression with the given context node
///
/// Absolute paths still address the whole document: the context node only
/// anchors relative steps.
#[must_use = "XPath evaluation result should be used"]
pub fn evaluate_from_node(
    doc: &Document,
    context_node: NodeId,
    xpath: &str,
) -> Result<XPathValue, String> {
    let compiled = compiler::compile_cached(xpath)?;
    let ctx = EvalContext { doc, context_node, context_position: 1, context_size: 1 };
    evaluate_compiled(&compiled, &ctx)
}

/// Evaluate a compiled expression
pub fn evaluate_compiled(expr: &CompiledExpr, ctx: &EvalContext<'_>) -> Result<XPathValue, String> {
    let mut stack: Vec<XPathValue> = Vec::new();

    for op in &expr.ops {
        match op {
            Op::Root => {
                stack.push(XPathValue::single_node(ctx.doc.document_node_id()));
            }

            Op::Context => {
                stack.push(XPathValue::single_node(ctx.context_node));
            }

            Op::Step(axis, test, predicates) => {
                let current =
                    stack.pop().unwrap_or_else(|| XPathValue::single_node(ctx.context_node));
                let XPathValue::NodeSet(nodes) = current else {
                    return Err("location step applied to a non-node-set value".to_string());
                };

                let mut seen = HashSet::with_capacity(nodes.len());
                let mut result = Vec::with_capacity(nodes.len());
                for node in nodes {
                    let mut selected: Vec<NodeId> = navigate(ctx.doc, node, *axis)
                        .into_iter()
                        .filter(|&candidate| matches_node_test(ctx.doc, *axis, candidate, test))
                        .collect();
                    for pred in predicates {
                        selected = apply_predicate(pred, ctx.doc, &selected)?;
                    }
                    for candidate in selected {
                        if seen.insert(candidate) {
                            result.push(candidate);
                        }
                    }
                }
                // Arena ids are assigned in document order
                result.sort_unstable();
                stack.push(XPathValue::NodeSet(result));
            }

            Op::Predicate(pred) => {
                let current = stack.pop().unwrap_or_default();
                let XPathValue::NodeSet(nodes) = current else {
                    return Err("predicate applied to a non-node-set value".to_string());
                };
                let filtered = apply_predicate(pred, ctx.doc, &nodes)?;
                stack.push(XPathValue::NodeSet(filtered));
            }

            Op::Union => {
                let right = stack.pop().unwrap_or_default();
                let left = stack.pop().unwrap_or_default();

                let (XPathValue::NodeSet(l), XPathValue::NodeSet(r)) = (left, right) else {
                    return Err("union requires two node-sets".to_string());
                };
                let mut seen: HashSet<NodeId> = l.iter().copied().collect();
                let mut result = l;
                result.reserve(r.len());
                for node in r {
                    if seen.insert(node) {
                        result.push(node);
                    }
                }
                result.sort_unstable();
                stack.push(XPathValue::NodeSet(result));
            }

            Op::Number(n) => {
                stack.push(XPathValue::Number(*n));
            }

            Op::String(s) => {
                stack.push(XPathValue::String(s.clone()));
            }

            Op::Negate => {
                let value = stack.pop().unwrap_or_default();
                stack.push(XPathValue::Number(-value.number_with(ctx.doc)));
            }

            Op::Binary(op) => {
                let right = stack.pop().unwrap_or_default();
                let left = stack.pop().unwrap_or_default();
                stack.push(apply_binary(ctx.doc, *op, left, right));
            }

            Op::Call(name, arg_count) => {
                let mut args = Vec::with_capacity(*arg_count);
                for _ in 0..*arg_count {
                    args.push(stack.pop().unwrap_or_default());
                }
                args.reverse();

                let result = functions::call(
                    name,
                    args,
                    ctx.doc,
                    ctx.context_node,
                    ctx.context_position,
                    ctx.context_size,
                )?;
                stack.push(result);
            }
        }
    }

    Ok(stack.pop().unwrap_or_default())
}

/// Filter candidates through one predicate, counting positions within the
/// candidate list
fn apply_predicate(
    pred: &CompiledExpr,
    doc: &Document,
    candidates: &[NodeId],
) -> Result<Vec<NodeId>, String> {
    let size = candidates.len();
    let mut kept = Vec::new();

    for (i, &node) in candidates.iter().enumerate() {
        let pred_ctx =
            EvalContext { doc, context_node: node, context_position: i + 1, context_size: size };
        let value = evaluate_compiled(pred, &pred_ctx)?;

        // A numeric predicate selects by position
        let keep = match value {
            XPathValue::Number(n) => (i + 1) as f64 == n,
            other => other.to_boolean(),
        };
        if keep {
            kept.push(node);
        }
    }

    Ok(kept)
}

fn apply_binary(doc: &Document, op: BinaryOp, left: XPathValue, right: XPathValue) -> XPathValue {
    match op {
        BinaryOp::Or => XPathValue::Boolean(left.to_boolean() || right.to_boolean()),
        BinaryOp::And => XPathValue::Boolean(left.to_boolean() && right.to_boolean()),
        BinaryOp::Eq => compare_values(doc, &left, &right, |a, b| a == b),
        BinaryOp::NotEq => compare_values(doc, &left, &right, |a, b| a != b),
        BinaryOp::Lt => compare_numbers(doc, &left, &right, |a, b| a < b),
        BinaryOp::LtEq => compare_numbers(doc, &left, &right, |a, b| a <= b),
        BinaryOp::Gt => compare_numbers(doc, &left, &right, |a, b| a > b),
        BinaryOp::GtEq => compare_numbers(doc, &left, &right, |a, b| a >= b),
        BinaryOp::Add => {
            XPathValue::Number(left.number_with(doc) + right.number_with(doc))
        }
        BinaryOp::Sub => {
            XPathValue::Number(left.number_with(doc) - right.number_with(doc))
        }
        BinaryOp::Mul => {
            XPathValue::Number(left.number_with(doc) * right.number_with(doc))
        }
        BinaryOp::Div => {
            XPathValue::Number(left.number_with(doc) / right.number_with(doc))
        }
        BinaryOp::Mod => {
            XPathValue::Number(left.number_with(doc) % right.number_with(doc))
        }
    }
}

/// Equality comparison per XPath 1.0: node-sets compare existentially on
/// the string-values of their nodes
fn compare_values<F>(doc: &Document, left: &XPathValue, right: &XPathValue, cmp: F) -> XPathValue
where
    F: Fn(&str, &str) -> bool,
{
    match (left, right) {
        (XPathValue::NodeSet(ln), XPathValue::NodeSet(rn)) => {
            for &l in ln {
                let ls = doc.string_value(l);
                for &r in rn {
                    if cmp(&ls, &doc.string_value(r)) {
                        return XPathValue::Boolean(true);
                    }
                }
            }
            XPathValue::Boolean(false)
        }
        (XPathValue::NodeSet(nodes), other) | (other, XPathValue::NodeSet(nodes)) => {
            let other_str = other.string_with(doc);
            for &n in nodes {
                if cmp(&doc.string_value(n), &other_str) {
                    return XPathValue::Boolean(true);
                }
            }
            XPathValue::Boolean(false)
        }
        (XPathValue::Boolean(_), _) | (_, XPathValue::Boolean(_)) => XPathValue::Boolean(cmp(
            &left.to_boolean().to_string(),
            &right.to_boolean().to_string(),
        )),
        (XPathValue::Number(_), _) | (_, XPathValue::Number(_)) => {
            let ln = left.number_with(doc);
            let rn = right.number_with(doc);
            XPathValue::Boolean(cmp(&ln.to_string(), &rn.to_string()))
        }
        (XPathValue::String(ls), XPathValue::String(rs)) => XPathValue::Boolean(cmp(ls, rs)),
    }
}

/// Relational comparison: both sides convert to numbers
fn compare_numbers<F>(doc: &Document, left: &XPathValue, right: &XPathValue, cmp: F) -> XPathValue
where
    F: Fn(f64, f64) -> bool,
{
    XPathValue::Boolean(cmp(left.number_with(doc), right.number_with(doc)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluate(doc: &Document, xpath: &str) -> Result<XPathValue, String> {
        evaluate_from_node(doc, doc.root_element_id(), xpath)
    }

    fn nodeset_len(value: &XPathValue) -> usize {
        value.as_nodeset().map(Vec::len).unwrap_or(0)
    }

    #[test]
    fn test_simple_path() {
        let doc = Document::parse(b"<root><child/></root>").unwrap();
        let result = evaluate(&doc, "/root/child").unwrap();
        assert_eq!(nodeset_len(&result), 1);
    }

    #[test]
    fn test_descendant() {
        let doc = Document::parse(b"<root><a><b/></a></root>").unwrap();
        let result = evaluate(&doc, "//b").unwrap();
        assert_eq!(nodeset_len(&result), 1);
    }

    #[test]
    fn test_position_predicate() {
        let doc = Document::parse(b"<root><a/><b/><c/></root>").unwrap();
        let result = evaluate(&doc, "/root/*[2]").unwrap();
        let nodes = result.as_nodeset().unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(doc.name(nodes[0]), "b");
    }

    #[test]
    fn test_predicate_counts_per_context() {
        let doc = Document::parse(b"<r><a><b n=\"1\"/><b n=\"2\"/></a><a><b n=\"3\"/></a></r>")
            .unwrap();
        let result = evaluate(&doc, "/r/a/b[1]").unwrap();
        let nodes = result.as_nodeset().unwrap();
        let values: Vec<_> = nodes.iter().map(|&id| doc.attribute(id, "n").unwrap()).collect();
        assert_eq!(values, vec!["1", "3"]);
    }

    #[test]
    fn test_attribute_predicate() {
        let doc = Document::parse(b"<root><i id=\"a\"/><i id=\"b\"/></root>").unwrap();
        let result = evaluate(&doc, "//i[@id='b']").unwrap();
        assert_eq!(nodeset_len(&result), 1);
    }

    #[test]
    fn test_attribute_axis_yields_attribute_nodes() {
        let doc = Document::parse(b"<root a=\"1\" b=\"2\"/>").unwrap();
        let result = evaluate(&doc, "//@*").unwrap();
        let nodes = result.as_nodeset().unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(nodes
            .iter()
            .all(|&id| doc.kind_of(id) == Some(crate::dom::NodeKind::Attribute)));
    }

    #[test]
    fn test_count_function() {
        let doc = Document::parse(b"<root><a/><b/><c/></root>").unwrap();
        let result = evaluate(&doc, "count(/root/*)").unwrap();
        assert!(matches!(result, XPathValue::Number(n) if n == 3.0));
    }

    #[test]
    fn test_union_deduplicates() {
        let doc = Document::parse(b"<root><a/><b/></root>").unwrap();
        let result = evaluate(&doc, "//a | //a | //b").unwrap();
        assert_eq!(nodeset_len(&result), 2);
    }

    #[test]
    fn test_parent_step() {
        let doc = Document::parse(b"<root><a><b/></a></root>").unwrap();
        let b = evaluate(&doc, "//b").unwrap();
        let b_id = b.as_nodeset().unwrap()[0];
        let result = evaluate_from_node(&doc, b_id, "parent::node()").unwrap();
        let nodes = result.as_nodeset().unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(doc.name(nodes[0]), "a");
    }

    #[test]
    fn test_absolute_path_ignores_context() {
        let doc = Document::parse(b"<root><a><b/></a><c/></root>").unwrap();
        let b = evaluate(&doc, "//b").unwrap().as_nodeset().unwrap()[0];
        let result = evaluate_from_node(&doc, b, "/root/c").unwrap();
        assert_eq!(nodeset_len(&result), 1);
    }

    #[test]
    fn test_relative_path_stays_in_subtree() {
        let doc = Document::parse(b"<root><a><x/></a><b><x/></b></root>").unwrap();
        let a = evaluate(&doc, "//a").unwrap().as_nodeset().unwrap()[0];
        let result = evaluate_from_node(&doc, a, ".//x").unwrap();
        assert_eq!(nodeset_len(&result), 1);
    }

    #[test]
    fn test_text_node_test() {
        let doc = Document::parse(b"<root>hi<a/></root>").unwrap();
        let result = evaluate(&doc, "//text()").unwrap();
        assert_eq!(nodeset_len(&result), 1);
    }

    #[test]
    fn test_string_comparison_with_element_content() {
        let doc = Document::parse(b"<root><n>apple</n><n>pear</n></root>").unwrap();
        let result = evaluate(&doc, "//n[. = 'pear']").unwrap();
        assert_eq!(nodeset_len(&result), 1);
    }

    #[test]
    fn test_numeric_comparison() {
        let doc = Document::parse(b"<root><p v=\"3\"/><p v=\"7\"/></root>").unwrap();
        let result = evaluate(&doc, "//p[@v > 5]").unwrap();
        assert_eq!(nodeset_len(&result), 1);
    }

    #[test]
    fn test_unknown_function_is_error() {
        let doc = Document::parse(b"<root/>").unwrap();
        assert!(evaluate(&doc, "frobnicate(1)").is_err());
    }
}
