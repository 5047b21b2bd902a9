//! XPath query engine
//!
//! XPath 1.0 subset with:
//! - Absolute and relative location paths, 12 axes
//! - Predicates with positional semantics
//! - Core function library
//! - Compiled expression caching (LRU)

pub mod axes;
pub mod compiler;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod value;

pub use eval::evaluate_from_node;
pub use value::XPathValue;
