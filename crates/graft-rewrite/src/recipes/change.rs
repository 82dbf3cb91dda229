use graft_tree::{ExecutionContext, Node, PathMatcher, VisitContext, Visitor};

use crate::errors::RewriteResult;
use crate::fragment::FragmentSchema;
use crate::merge::{ChangeRequest, change, require_key};
use crate::recipe::Recipe;
use crate::recipes::or_warn;

/// Edit every item whose key matches a glob pattern, in containers at a path.
#[derive(Clone, Debug)]
pub struct ChangeFragment {
    name: String,
    path: PathMatcher,
    request: ChangeRequest,
    schema: FragmentSchema,
}

impl ChangeFragment {
    pub fn new(path: &str, request: ChangeRequest, schema: FragmentSchema) -> RewriteResult<Self> {
        Ok(Self {
            name: format!("Change `{}` items at `{path}`", schema.item()),
            path: PathMatcher::new(path)?,
            request,
            schema,
        })
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Recipe for ChangeFragment {
    type Acc = ();

    fn display_name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> RewriteResult<()> {
        require_key(self.request.key.is_empty(), "change")
    }

    fn initial_value(&self, _ctx: &ExecutionContext) -> Self::Acc {}

    fn visitor<'a>(&'a self, _acc: &'a Self::Acc) -> Option<Box<dyn Visitor + 'a>> {
        Some(Box::new(ChangeVisitor { recipe: self }))
    }
}

struct ChangeVisitor<'a> {
    recipe: &'a ChangeFragment,
}

impl Visitor for ChangeVisitor<'_> {
    fn name(&self) -> &str {
        &self.recipe.name
    }

    fn visit_element(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Option<Node> {
        if !self.recipe.path.matches(cx.cursor()) {
            return Some(node.clone());
        }
        let changed = change(node, &self.recipe.request, &self.recipe.schema);
        Some(or_warn(node, cx, changed))
    }
}
