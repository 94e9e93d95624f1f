//! DOM arena: slotmap-backed node forest with selector queries.

pub mod node;
pub mod query;
pub mod tree;

pub use node::{NodeData, NodeId, TEXT_TAG};
pub use query::{Selector, SelectorError};
pub use tree::Dom;
