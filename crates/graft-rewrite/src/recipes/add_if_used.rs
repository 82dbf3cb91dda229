use std::collections::BTreeSet;

use graft_tree::{Document, ExecutionContext, Node, NodeId, PathMatcher, VisitContext, Visitor};
use tracing::debug;

use crate::errors::RewriteResult;
use crate::fragment::{Fragment, FragmentSchema};
use crate::merge::merge;
use crate::precondition::{Precondition, gate};
use crate::recipe::Recipe;
use crate::recipes::{FlagIfSatisfied, or_warn};

/// Add a fragment to every container at a path, but only when some document
/// in the corpus satisfies `usage`.
///
/// The scan phase decides whether the fragment is needed at all. During the
/// transform, each container that already holds an item with the fragment's
/// key is left alone; the others get the insertion, queued to run after the
/// traversal of the document.
#[derive(Clone, Debug)]
pub struct AddFragmentIfUsed {
    name: String,
    usage: Precondition,
    target: Option<Precondition>,
    path: PathMatcher,
    fragment: Fragment,
    schema: FragmentSchema,
}

impl AddFragmentIfUsed {
    pub fn new(
        usage: Precondition,
        path: &str,
        fragment: Fragment,
        schema: FragmentSchema,
    ) -> RewriteResult<Self> {
        Ok(Self {
            name: format!("Add `{}` if used", fragment.key()),
            usage,
            target: None,
            path: PathMatcher::new(path)?,
            fragment,
            schema,
        })
    }

    /// Restrict the documents that receive the fragment.
    pub fn with_target(mut self, target: Precondition) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn holds_item(&self, container: &Node) -> bool {
        let key = self.fragment.key();
        container
            .children()
            .iter()
            .any(|child| self.schema.is_item(child) && key.matches(child))
    }
}

impl Recipe for AddFragmentIfUsed {
    /// Whether any document satisfied the usage precondition.
    type Acc = bool;

    fn display_name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Insert a keyed item when the corpus shows it is needed and it is not there yet."
    }

    fn validate(&self) -> RewriteResult<()> {
        self.fragment.validate_fields()
    }

    fn initial_value(&self, _ctx: &ExecutionContext) -> Self::Acc {
        false
    }

    fn scanner<'a>(&'a self, acc: &'a mut Self::Acc) -> Option<Box<dyn Visitor + 'a>> {
        Some(Box::new(FlagIfSatisfied {
            condition: &self.usage,
            flag: acc,
        }))
    }

    fn visitor<'a>(&'a self, acc: &'a Self::Acc) -> Option<Box<dyn Visitor + 'a>> {
        debug!(recipe = %self.name, used = *acc, "usage scan result");
        Some(Box::new(gate(
            Precondition::check(*acc),
            FindItem {
                recipe: self,
                missing: BTreeSet::new(),
            },
        )))
    }

    fn precondition(&self) -> Option<Precondition> {
        self.target.clone()
    }
}

/// Collects the matching containers that lack the item, then queues one
/// insertion for exactly those containers.
struct FindItem<'a> {
    recipe: &'a AddFragmentIfUsed,
    missing: BTreeSet<NodeId>,
}

impl Visitor for FindItem<'_> {
    fn name(&self) -> &str {
        &self.recipe.name
    }

    fn visit_element(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Option<Node> {
        if self.recipe.path.matches(cx.cursor()) && !self.recipe.holds_item(node) {
            self.missing.insert(node.id());
        }
        Some(node.clone())
    }

    fn visit_document(&mut self, document: Document, cx: &mut VisitContext<'_>) -> Document {
        let containers = std::mem::take(&mut self.missing);
        if !containers.is_empty() {
            debug!(
                path = cx.source_path(),
                key = %self.recipe.fragment.key(),
                containers = containers.len(),
                "queueing insertion"
            );
            cx.do_after_visit(InsertItem {
                containers,
                fragment: self.recipe.fragment.clone(),
                schema: self.recipe.schema.clone(),
            });
        }
        document
    }
}

struct InsertItem {
    containers: BTreeSet<NodeId>,
    fragment: Fragment,
    schema: FragmentSchema,
}

impl Visitor for InsertItem {
    fn visit_element(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Option<Node> {
        if !self.containers.contains(&node.id()) {
            return Some(node.clone());
        }
        let merged = merge(node, &self.fragment, &self.schema);
        Some(or_warn(node, cx, merged))
    }
}
