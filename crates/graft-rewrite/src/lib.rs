//! Rewriting on top of graft trees.
//!
//! This crate provides:
//! - [`Precondition`]: composable document predicates and the [`gate`] combinator
//! - [`merge`], [`remove`], [`change`]: idempotent keyed edits of item containers
//! - [`FixpointDriver`]: repeat-until-stable application of a visitor
//! - [`Recipe`] and [`run`]: the scan-then-transform protocol over a corpus

// === Errors and configuration ===
pub mod config;
pub mod errors;

// === Predicates ===
pub mod glob;
pub mod precondition;

// === Structural edits ===
pub mod fragment;
pub mod merge;

// === Execution ===
pub mod fixpoint;
pub mod pool;
pub mod recipe;
pub mod recipes;
pub mod runner;

pub use config::{FieldSpec, FragmentSpec, RunConfig};
pub use errors::{RewriteError, RewriteErrorKind, RewriteResult};
pub use fixpoint::{ApplyResult, DEFAULT_MAX_ITERATIONS, FixpointDriver, repeat_until_stable};
pub use fragment::{CompoundKey, Fragment, FragmentSchema, KeyPattern, parse_exclusion};
pub use glob::Glob;
pub use merge::{ChangeRequest, change, merge, remove};
pub use precondition::{Gate, Precondition, and, gate, not, or};
pub use recipe::{Accumulator, Recipe, RecipeDescriptor, RecipeList, RecipeRun};
pub use runner::{DocumentResult, RunResult, run, scan_corpus};
