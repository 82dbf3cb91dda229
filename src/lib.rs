//! Structural, idempotent rewriting of hierarchical documents.
//!
//! [`tree`] holds the immutable tree model, cursors and visitors;
//! [`rewrite`] holds preconditions, keyed merges, the fixed-point driver
//! and the scan-then-transform runner.

pub use graft_rewrite as rewrite;
pub use graft_tree as tree;

pub use graft_rewrite::{
    Precondition, Recipe, RecipeDescriptor, RewriteError, RewriteResult, RunConfig, RunResult,
    run,
};
pub use graft_tree::{Document, DocumentKind, ExecutionContext, Node, Visitor};

/// Install a `fmt` subscriber filtered by `RUST_LOG`, defaulting to `graft=info`.
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "graft=info".parse() {
        filter = filter.add_directive(directive);
    }
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
