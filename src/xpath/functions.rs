//! XPath core function library
//!
//! Node-set functions: position(), last(), count(), name(), local-name()
//! String functions: string(), concat(), starts-with(), contains(),
//! string-length(), normalize-space()
//! Boolean functions: boolean(), not(), true(), false()
//! Number functions: number()

use super::value::XPathValue;
use crate::dom::{Document, NodeId};

/// Evaluate a function call
pub fn call(
    name: &str,
    args: Vec<XPathValue>,
    doc: &Document,
    context: NodeId,
    position: usize,
    size: usize,
) -> Result<XPathValue, String> {
    match name {
        "position" => {
            expect_args(name, &args, 0)?;
            Ok(XPathValue::Number(position as f64))
        }
        "last" => {
            expect_args(name, &args, 0)?;
            Ok(XPathValue::Number(size as f64))
        }
        "count" => fn_count(args),
        "name" => fn_name(args, doc, context, false),
        "local-name" => fn_name(args, doc, context, true),

        "string" => fn_string(args, doc, context),
        "concat" => fn_concat(args, doc),
        "starts-with" => {
            expect_args(name, &args, 2)?;
            let s = args[0].string_with(doc);
            let prefix = args[1].string_with(doc);
            Ok(XPathValue::Boolean(s.starts_with(&prefix)))
        }
        "contains" => {
            expect_args(name, &args, 2)?;
            let s = args[0].string_with(doc);
            let needle = args[1].string_with(doc);
            Ok(XPathValue::Boolean(s.contains(&needle)))
        }
        "string-length" => fn_string_length(args, doc, context),
        "normalize-space" => fn_normalize_space(args, doc, context),

        "boolean" => {
            expect_args(name, &args, 1)?;
            Ok(XPathValue::Boolean(args[0].to_boolean()))
        }
        "not" => {
            expect_args(name, &args, 1)?;
            Ok(XPathValue::Boolean(!args[0].to_boolean()))
        }
        "true" => {
            expect_args(name, &args, 0)?;
            Ok(XPathValue::Boolean(true))
        }
        "false" => {
            expect_args(name, &args, 0)?;
            Ok(XPathValue::Boolean(false))
        }

        "number" => fn_number(args, doc, context),

        _ => Err(format!("unknown function: {name}")),
    }
}

fn expect_args(name: &str, args: &[XPathValue], count: usize) -> Result<(), String> {
    if args.len() != count {
        return Err(format!("{name}() requires exactly {count} argument(s)"));
    }
    Ok(())
}

fn fn_count(args: Vec<XPathValue>) -> Result<XPathValue, String> {
    match args.as_slice() {
        [XPathValue::NodeSet(nodes)] => Ok(XPathValue::Number(nodes.len() as f64)),
        [_] => Err("count() argument must be a node-set".to_string()),
        _ => Err("count() requires exactly 1 argument(s)".to_string()),
    }
}

/// name() / local-name(): the context node or the first node of the
/// argument node-set
fn fn_name(
    args: Vec<XPathValue>,
    doc: &Document,
    context: NodeId,
    local: bool,
) -> Result<XPathValue, String> {
    let node = match args.as_slice() {
        [] => Some(context),
        [XPathValue::NodeSet(nodes)] => nodes.first().copied(),
        _ => return Err("name() argument must be a node-set".to_string()),
    };

    let name = match node {
        Some(id) if local => doc.local_name(id),
        Some(id) => doc.name(id),
        None => "",
    };
    Ok(XPathValue::String(name.to_string()))
}

fn fn_string(args: Vec<XPathValue>, doc: &Document, context: NodeId) -> Result<XPathValue, String> {
    let s = match args.as_slice() {
        [] => doc.string_value(context),
        [value] => value.string_with(doc),
        _ => return Err("string() takes at most 1 argument".to_string()),
    };
    Ok(XPathValue::String(s))
}

fn fn_concat(args: Vec<XPathValue>, doc: &Document) -> Result<XPathValue, String> {
    if args.len() < 2 {
        return Err("concat() requires at least 2 arguments".to_string());
    }
    let mut out = String::new();
    for arg in &args {
        out.push_str(&arg.string_with(doc));
    }
    Ok(XPathValue::String(out))
}

fn fn_string_length(
    args: Vec<XPathValue>,
    doc: &Document,
    context: NodeId,
) -> Result<XPathValue, String> {
    let s = match args.as_slice() {
        [] => doc.string_value(context),
        [value] => value.string_with(doc),
        _ => return Err("string-length() takes at most 1 argument".to_string()),
    };
    Ok(XPathValue::Number(s.chars().count() as f64))
}

fn fn_normalize_space(
    args: Vec<XPathValue>,
    doc: &Document,
    context: NodeId,
) -> Result<XPathValue, String> {
    let s = match args.as_slice() {
        [] => doc.string_value(context),
        [value] => value.string_with(doc),
        _ => return Err("normalize-space() takes at most 1 argument".to_string()),
    };
    Ok(XPathValue::String(s.split_whitespace().collect::<Vec<_>>().join(" ")))
}

fn fn_number(args: Vec<XPathValue>, doc: &Document, context: NodeId) -> Result<XPathValue, String> {
    let n = match args.as_slice() {
        [] => doc.string_value(context).trim().parse().unwrap_or(f64::NAN),
        [value] => value.number_with(doc),
        _ => return Err("number() takes at most 1 argument".to_string()),
    };
    Ok(XPathValue::Number(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xpath::evaluate_from_node;

    fn evaluate(doc: &Document, xpath: &str) -> XPathValue {
        evaluate_from_node(doc, doc.root_element_id(), xpath).unwrap()
    }

    #[test]
    fn test_name_functions() {
        let doc = Document::parse(b"<svg:rect xmlns:svg=\"ns\"/>").unwrap();
        assert!(matches!(evaluate(&doc, "name()"), XPathValue::String(s) if s == "svg:rect"));
        assert!(matches!(evaluate(&doc, "local-name()"), XPathValue::String(s) if s == "rect"));
    }

    #[test]
    fn test_string_functions() {
        let doc = Document::parse(b"<r>  hello   world </r>").unwrap();
        assert!(
            matches!(evaluate(&doc, "normalize-space()"), XPathValue::String(s) if s == "hello world")
        );
        assert!(matches!(evaluate(&doc, "string-length('abc')"), XPathValue::Number(n) if n == 3.0));
        assert!(
            matches!(evaluate(&doc, "concat('a', 'b', 'c')"), XPathValue::String(s) if s == "abc")
        );
        assert!(
            matches!(evaluate(&doc, "starts-with('hello', 'he')"), XPathValue::Boolean(true))
        );
        assert!(matches!(evaluate(&doc, "contains('hello', 'ell')"), XPathValue::Boolean(true)));
    }

    #[test]
    fn test_boolean_functions() {
        let doc = Document::parse(b"<r><a/></r>").unwrap();
        assert!(matches!(evaluate(&doc, "not(//missing)"), XPathValue::Boolean(true)));
        assert!(matches!(evaluate(&doc, "boolean(//a)"), XPathValue::Boolean(true)));
        assert!(matches!(evaluate(&doc, "true()"), XPathValue::Boolean(true)));
        assert!(matches!(evaluate(&doc, "false()"), XPathValue::Boolean(false)));
    }

    #[test]
    fn test_number_function() {
        let doc = Document::parse(b"<r>42</r>").unwrap();
        assert!(matches!(evaluate(&doc, "number()"), XPathValue::Number(n) if n == 42.0));
        assert!(matches!(evaluate(&doc, "number('7')"), XPathValue::Number(n) if n == 7.0));
    }

    #[test]
    fn test_wrong_arity_is_error() {
        let doc = Document::parse(b"<r/>").unwrap();
        assert!(evaluate_from_node(&doc, doc.root_element_id(), "not()").is_err());
        assert!(evaluate_from_node(&doc, doc.root_element_id(), "count(1)").is_err());
    }
}
