//! Immutable, structurally shared document trees.
//!
//! This crate provides:
//! - [`Node`]: reference-counted nodes with stable identity across edits
//! - [`Document`]: a root node plus its logical path and kind
//! - [`Cursor`] and [`Visitor`]: rewriting traversal with scoped messages
//! - [`PathMatcher`]: location paths over a cursor's ancestor chain
//! - [`ExecutionContext`]: messages shared by every document in a run

pub mod cursor;
pub mod document;
pub mod errors;
pub mod execution;
pub mod markup;
pub mod node;
pub mod path;
pub mod printer;
pub mod symbol;
pub mod visit;
pub mod walk;

pub use cursor::{Cursor, CursorTarget};
pub use document::{Document, DocumentKind};
pub use errors::{TreeError, TreeResult};
pub use execution::ExecutionContext;
pub use node::{Element, ElementBuilder, Entry, Marker, Node, NodeId, NodeKind, NodeKindTag, NodeVec};
pub use path::PathMatcher;
pub use symbol::Symbol;
pub use visit::{TraversalOrder, VisitContext, Visitor, visit_document};
pub use walk::{WalkAction, walk_all, walk_with_path};
