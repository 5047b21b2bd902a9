//! XPath expression compiler
//!
//! Compiles parsed XPath expressions into a flat operation sequence for
//! the stack-machine evaluator, and caches compiled expressions in a
//! bounded LRU keyed by the query string. Repeated queries skip lexing,
//! parsing, and compilation entirely.

use super::parser::{Axis, BinaryOp, Expr, NodeTest, Step};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, OnceLock};

/// Upper bound on distinct cached query strings
const CACHE_CAPACITY: usize = 64;

static CACHE: OnceLock<Mutex<LruCache<String, Arc<CompiledExpr>>>> = OnceLock::new();

/// Compiled XPath expression
#[derive(Debug, Clone)]
pub struct CompiledExpr {
    pub ops: Vec<Op>,
}

/// Compiled operation
#[derive(Debug, Clone)]
pub enum Op {
    /// Push the document node onto the stack
    Root,
    /// Push the context node onto the stack
    Context,
    /// Navigate along an axis with a node test, applying the step's
    /// predicates per context node
    Step(Axis, NodeTest, Vec<CompiledExpr>),
    /// Apply a predicate over the whole node-set (filter expressions)
    Predicate(Box<CompiledExpr>),
    /// Union two node sets
    Union,
    /// Push literal number
    Number(f64),
    /// Push literal string
    String(String),
    /// Call function (name, argument count)
    Call(String, usize),
    /// Binary operation
    Binary(BinaryOp),
    /// Negate
    Negate,
}

impl CompiledExpr {
    /// Compile a parsed expression
    pub fn compile(expr: &Expr) -> Self {
        let mut ops = Vec::new();
        Self::compile_expr(expr, &mut ops);
        CompiledExpr { ops }
    }

    fn compile_expr(expr: &Expr, ops: &mut Vec<Op>) {
        match expr {
            Expr::Root => ops.push(Op::Root),
            Expr::Context => ops.push(Op::Context),
            Expr::Parent => {
                ops.push(Op::Context);
                ops.push(Op::Step(Axis::Parent, NodeTest::Node, Vec::new()));
            }
            Expr::Number(n) => ops.push(Op::Number(*n)),
            Expr::String(s) => ops.push(Op::String(s.clone())),
            Expr::Negate(inner) => {
                Self::compile_expr(inner, ops);
                ops.push(Op::Negate);
            }
            Expr::Binary(left, op, right) => {
                Self::compile_expr(left, ops);
                Self::compile_expr(right, ops);
                ops.push(Op::Binary(*op));
            }
            Expr::Union(left, right) => {
                Self::compile_expr(left, ops);
                Self::compile_expr(right, ops);
                ops.push(Op::Union);
            }
            Expr::Path(base, step) => {
                Self::compile_expr(base, ops);
                Self::compile_step(step, ops);
            }
            Expr::Filter(base, pred) => {
                Self::compile_expr(base, ops);
                let pred_compiled = CompiledExpr::compile(pred);
                ops.push(Op::Predicate(Box::new(pred_compiled)));
            }
            Expr::Step(step) => {
                ops.push(Op::Context);
                Self::compile_step(step, ops);
            }
            Expr::Function(name, args) => {
                for arg in args {
                    Self::compile_expr(arg, ops);
                }
                ops.push(Op::Call(name.clone(), args.len()));
            }
        }
    }

    fn compile_step(step: &Step, ops: &mut Vec<Op>) {
        let predicates = step.predicates.iter().map(CompiledExpr::compile).collect();
        ops.push(Op::Step(step.axis, step.node_test.clone(), predicates));
    }
}

/// Compile an XPath expression string (uncached)
pub fn compile(xpath: &str) -> Result<CompiledExpr, String> {
    let expr = super::parser::parse(xpath)?;
    Ok(CompiledExpr::compile(&expr))
}

/// Compile an XPath expression string through the shared LRU cache
///
/// Failed compilations are not cached; the same bad query costs a parse
/// each time, which keeps the cache free of dead entries.
pub fn compile_cached(xpath: &str) -> Result<Arc<CompiledExpr>, String> {
    let cache = CACHE.get_or_init(|| {
        let capacity = NonZeroUsize::new(CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Mutex::new(LruCache::new(capacity))
    });

    let mut cache = match cache.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    if let Some(compiled) = cache.get(xpath) {
        tracing::trace!(query = xpath, "XPath compile cache hit");
        return Ok(Arc::clone(compiled));
    }

    let compiled = Arc::new(compile(xpath)?);
    cache.put(xpath.to_string(), Arc::clone(&compiled));
    tracing::trace!(query = xpath, "compiled XPath expression");
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_simple() {
        let compiled = compile("/root").unwrap();
        assert!(matches!(compiled.ops[0], Op::Root));
        assert!(matches!(compiled.ops[1], Op::Step(..)));
    }

    #[test]
    fn test_compile_descendant() {
        let compiled = compile("//item").unwrap();
        assert_eq!(compiled.ops.len(), 3);
    }

    #[test]
    fn test_step_predicates_attached() {
        let compiled = compile("item[@id='x'][2]").unwrap();
        let Op::Step(_, _, predicates) = &compiled.ops[1] else {
            panic!("expected step op");
        };
        assert_eq!(predicates.len(), 2);
    }

    #[test]
    fn test_compile_cached_returns_same_expression() {
        let first = compile_cached("//cached-test-query").unwrap();
        let second = compile_cached("//cached-test-query").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_compile_error_propagates() {
        assert!(compile_cached("//").is_err());
    }
}
