//! DOM module: arena-based XML document
//!
//! - Arena allocation for nodes, NodeId (u32) indices
//! - Attribute nodes materialized in the arena, in document order
//! - String interning for names, values, and text content

pub mod document;
pub mod node;
pub mod strings;

pub use document::Document;
pub use node::{NodeId, NodeKind, XmlNode};
