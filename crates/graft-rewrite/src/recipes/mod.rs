//! Building-block recipes over fragments and property entries.

use graft_tree::{Document, Node, VisitContext, Visitor};
use tracing::warn;

use crate::errors::RewriteResult;
use crate::precondition::Precondition;

mod add_if_used;
mod change;
mod composite;
mod entries;
mod merge_fragment;
mod remove;

pub use add_if_used::AddFragmentIfUsed;
pub use change::ChangeFragment;
pub use composite::CompositeRecipe;
pub use entries::{ChangeEntryKey, ChangeEntryValue};
pub use merge_fragment::MergeFragment;
pub use remove::RemoveFragment;

/// Keep an edit's result, or leave `node` as it was with the error attached
/// as a warning marker.
pub(crate) fn or_warn(node: &Node, cx: &VisitContext<'_>, result: RewriteResult<Node>) -> Node {
    match result {
        Ok(edited) => edited,
        Err(error) => {
            warn!(path = cx.source_path(), "{error}");
            node.with_warning(&error)
        }
    }
}

/// Scanner folding "some document satisfies `condition`" into a flag.
pub(crate) struct FlagIfSatisfied<'a> {
    pub(crate) condition: &'a Precondition,
    pub(crate) flag: &'a mut bool,
}

impl Visitor for FlagIfSatisfied<'_> {
    fn visit_document(&mut self, document: Document, _cx: &mut VisitContext<'_>) -> Document {
        if !*self.flag && self.condition.evaluate(&document) {
            *self.flag = true;
        }
        document
    }
}
