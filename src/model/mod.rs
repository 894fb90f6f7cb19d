//! Document model.
//!
//! The parsed HTML tree that flows through signature making and cleaning,
//! the typed blocks the builder produces, and the source documents a batch
//! is made of.

mod block;
mod document;
mod node;

pub use block::*;
pub use document::*;
pub use node::*;
