//! Hierarchical timer menu: tree model and persistent store.

pub mod node;
pub mod store;

pub use node::{MenuNode, NodeKind, TimerMode};
pub use store::MenuStore;
