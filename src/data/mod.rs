//! Configuration data structures.
//!
//! This module provides the core data structures for managing a
//! hierarchical application configuration:
//!
//! - [`node`] - Individual configuration nodes and their field kinds
//! - [`tree`] - The in-memory tree with lookup, mutation, and dirty tracking

/// Individual configuration node representation.
pub mod node;

/// In-memory configuration tree service.
pub mod tree;

pub use node::{ConfigNode, FieldKind, FieldOption};
pub use tree::ConfigTree;
