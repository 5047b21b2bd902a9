//! xmlens - read-only XML navigation facade
//!
//! Parse once, then navigate through element-only views:
//! - Strict parsing: malformed documents are rejected, never repaired
//! - XPath queries scoped to any element, with compiled-expression caching
//! - Every lookup in optional and throwing flavors
//! - No mutation, no serialization
//!
//! ```
//! use xmlens::Document;
//!
//! # fn main() -> Result<(), xmlens::Error> {
//! let doc = Document::parse(b"<inbox><mail from=\"ann\">hi</mail></inbox>")?;
//! let mail = doc.root().find("//mail[@from='ann']")?;
//! assert_eq!(mail.text(), "hi");
//! assert_eq!(mail.attribute("from")?, "ann");
//! # Ok(())
//! # }
//! ```
//!
//! The [`Document`] owns the parsed tree; every [`Element`] borrows from
//! it. Facades are `Copy`, immutable, and safe to read from multiple
//! threads.

mod core;
mod dom;
mod element;
mod error;
mod reader;
mod xpath;

pub use dom::{Document, NodeKind};
pub use element::Element;
pub use error::Error;
