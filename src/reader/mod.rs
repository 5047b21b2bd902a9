//! XML reader layer
//!
//! Turns raw tokens into structured parse events consumed by the DOM
//! builder.

pub mod events;
pub mod slice;
