use graft_tree::{ExecutionContext, Node, PathMatcher, VisitContext, Visitor};

use crate::errors::RewriteResult;
use crate::fragment::{CompoundKey, FragmentSchema};
use crate::merge::{remove, require_key};
use crate::recipe::Recipe;
use crate::recipes::or_warn;

/// Remove every item with the given key from containers at a path.
#[derive(Clone, Debug)]
pub struct RemoveFragment {
    name: String,
    path: PathMatcher,
    key: CompoundKey,
    schema: FragmentSchema,
}

impl RemoveFragment {
    pub fn new(path: &str, key: CompoundKey, schema: FragmentSchema) -> RewriteResult<Self> {
        Ok(Self {
            name: format!("Remove `{key}` from `{path}`"),
            path: PathMatcher::new(path)?,
            key,
            schema,
        })
    }
}

impl Recipe for RemoveFragment {
    type Acc = ();

    fn display_name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> RewriteResult<()> {
        require_key(self.key.is_empty(), "removal")
    }

    fn initial_value(&self, _ctx: &ExecutionContext) -> Self::Acc {}

    fn visitor<'a>(&'a self, _acc: &'a Self::Acc) -> Option<Box<dyn Visitor + 'a>> {
        Some(Box::new(RemoveVisitor { recipe: self }))
    }
}

struct RemoveVisitor<'a> {
    recipe: &'a RemoveFragment,
}

impl Visitor for RemoveVisitor<'_> {
    fn name(&self) -> &str {
        &self.recipe.name
    }

    fn visit_element(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Option<Node> {
        if self.recipe.path.matches(cx.cursor()) {
            let removed = remove(node, &self.recipe.key, &self.recipe.schema);
            return Some(or_warn(node, cx, removed));
        }
        Some(node.clone())
    }
}
