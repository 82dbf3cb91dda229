//! Two-phase recipes: scan the whole corpus, then transform each document.
//!
//! A [`Recipe`] supplies an accumulator, an optional read-only scanner that
//! folds every document into it, and a transform visitor built from the
//! final accumulator. The runner never hands a partial accumulator to the
//! transform phase: every document is scanned before any is transformed.
//!
//! Recipes may also carry sub-recipes. Each sub-recipe is scanned and
//! transformed independently, and the parent may prune the list once its
//! own accumulator is final.

use std::collections::{BTreeSet, HashSet};
use std::hash::Hash;

use graft_tree::{Document, ExecutionContext, Visitor, visit_document};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::errors::RewriteResult;
use crate::fixpoint::FixpointDriver;
use crate::precondition::{Precondition, gate};

/// Corpus-scan state folded across documents.
///
/// The runner scans documents in parallel, each into its own copy of the
/// initial value, and folds the copies together with [`merge`]. `merge`
/// must therefore be commutative and associative, and merging the initial
/// value must be a no-op (boolean OR and set union qualify).
///
/// [`merge`]: Accumulator::merge
pub trait Accumulator: Clone + Send + Sync + 'static {
    fn merge(&mut self, other: Self);
}

impl Accumulator for () {
    fn merge(&mut self, _other: Self) {}
}

impl Accumulator for bool {
    fn merge(&mut self, other: Self) {
        *self |= other;
    }
}

impl<T> Accumulator for HashSet<T>
where
    T: Eq + Hash + Clone + Send + Sync + 'static,
{
    fn merge(&mut self, other: Self) {
        self.extend(other);
    }
}

impl<T> Accumulator for BTreeSet<T>
where
    T: Ord + Clone + Send + Sync + 'static,
{
    fn merge(&mut self, other: Self) {
        self.extend(other);
    }
}

pub trait Recipe: Send + Sync {
    type Acc: Accumulator;

    fn display_name(&self) -> &str;

    /// Documentation only.
    fn description(&self) -> &str {
        ""
    }

    /// Reject malformed options before any document is processed.
    fn validate(&self) -> RewriteResult<()> {
        Ok(())
    }

    /// Produced once per run.
    fn initial_value(&self, ctx: &ExecutionContext) -> Self::Acc;

    /// Read-only visitor folding one document into `acc`. Whatever tree it
    /// returns is discarded. `None` skips the scan phase.
    fn scanner<'a>(&'a self, _acc: &'a mut Self::Acc) -> Option<Box<dyn Visitor + 'a>> {
        None
    }

    /// Transform visitor built from the final accumulator. `None` means the
    /// recipe only transforms through its sub-recipes.
    fn visitor<'a>(&'a self, acc: &'a Self::Acc) -> Option<Box<dyn Visitor + 'a>>;

    /// Gate applied to the transform visitor on every document.
    fn precondition(&self) -> Option<Precondition> {
        None
    }

    fn recipe_list(&self) -> &[Box<dyn RecipeDescriptor>] {
        &[]
    }

    /// Deactivate sub-recipes given the final accumulator.
    fn prune_recipe_list(&self, _acc: &Self::Acc, _list: &mut RecipeList) {}

    /// `Some(n)` re-applies the transform visitor until stable, at most `n` times.
    fn max_cycles(&self) -> Option<usize> {
        None
    }
}

/// Names of a recipe's sub-recipes with their active flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecipeList {
    entries: Vec<(String, bool)>,
}

impl RecipeList {
    fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            entries: names.into_iter().map(|name| (name, true)).collect(),
        }
    }

    /// Deactivate every sub-recipe.
    pub fn clear(&mut self) {
        for (_, active) in &mut self.entries {
            *active = false;
        }
    }

    /// Keep only active sub-recipes for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        for (name, active) in &mut self.entries {
            *active = *active && keep(name);
        }
    }

    pub fn active(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, active)| *active)
            .map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }

    fn is_active(&self, index: usize) -> bool {
        self.entries.get(index).is_some_and(|(_, active)| *active)
    }
}

/// Object-safe view of a [`Recipe`], used for sub-recipe lists and the runner.
pub trait RecipeDescriptor: Send + Sync {
    fn display_name(&self) -> &str;

    fn description(&self) -> &str;

    /// Validate this recipe and every sub-recipe.
    fn validate_all(&self) -> RewriteResult<()>;

    /// Fresh per-run state.
    fn start(&self, ctx: &ExecutionContext) -> Box<dyn RecipeRun + '_>;
}

impl<R: Recipe> RecipeDescriptor for R {
    fn display_name(&self) -> &str {
        Recipe::display_name(self)
    }

    fn description(&self) -> &str {
        Recipe::description(self)
    }

    fn validate_all(&self) -> RewriteResult<()> {
        self.validate()?;
        for child in self.recipe_list() {
            child.validate_all()?;
        }
        Ok(())
    }

    fn start(&self, ctx: &ExecutionContext) -> Box<dyn RecipeRun + '_> {
        Box::new(TypedRun::new(self, ctx))
    }
}

/// Per-run state of one recipe and its sub-recipes.
pub trait RecipeRun: Send + Sync {
    fn display_name(&self) -> &str;

    /// Fold one document into the accumulators. Safe to call concurrently.
    fn scan(&self, document: &Document, ctx: &ExecutionContext);

    /// End the scan phase: freeze accumulators and prune sub-recipe lists.
    fn seal(&mut self);

    /// Transform one document. Only valid after [`RecipeRun::seal`].
    fn transform(&self, document: Document, ctx: &ExecutionContext, max_iterations: usize)
    -> Document;
}

struct ChildRun<'r> {
    run: Box<dyn RecipeRun + 'r>,
    active: bool,
}

pub(crate) struct TypedRun<'r, R: Recipe> {
    recipe: &'r R,
    initial: R::Acc,
    scanning: Mutex<Option<R::Acc>>,
    sealed: Option<R::Acc>,
    children: Vec<ChildRun<'r>>,
}

impl<'r, R: Recipe> TypedRun<'r, R> {
    pub(crate) fn new(recipe: &'r R, ctx: &ExecutionContext) -> Self {
        let initial = recipe.initial_value(ctx);
        let children = recipe
            .recipe_list()
            .iter()
            .map(|child| ChildRun {
                run: child.start(ctx),
                active: true,
            })
            .collect();
        Self {
            recipe,
            scanning: Mutex::new(Some(initial.clone())),
            initial,
            sealed: None,
            children,
        }
    }

    /// Take the sealed accumulator, leaving the run unusable for transforms.
    pub(crate) fn into_accumulator(mut self) -> R::Acc {
        self.seal();
        self.sealed.take().unwrap_or(self.initial)
    }
}

impl<R: Recipe> RecipeRun for TypedRun<'_, R> {
    fn display_name(&self) -> &str {
        Recipe::display_name(self.recipe)
    }

    fn scan(&self, document: &Document, ctx: &ExecutionContext) {
        let mut local = self.initial.clone();
        if let Some(mut scanner) = self.recipe.scanner(&mut local) {
            // Scanning is read-only: the visited tree is dropped.
            let _ = visit_document(document.clone(), scanner.as_mut(), ctx);
        }
        if let Some(acc) = self.scanning.lock().as_mut() {
            acc.merge(local);
        }
        for child in &self.children {
            child.run.scan(document, ctx);
        }
    }

    fn seal(&mut self) {
        if self.sealed.is_none() {
            self.sealed = self.scanning.get_mut().take();
        }
        let Some(acc) = self.sealed.as_ref() else {
            return;
        };
        if !self.children.is_empty() {
            let mut list = RecipeList::new(
                self.children
                    .iter()
                    .map(|child| child.run.display_name().to_owned()),
            );
            self.recipe.prune_recipe_list(acc, &mut list);
            for (index, child) in self.children.iter_mut().enumerate() {
                child.active = list.is_active(index);
            }
            debug!(
                recipe = Recipe::display_name(self.recipe),
                active = ?list.active().collect::<Vec<_>>(),
                "sub-recipes after pruning"
            );
        }
        for child in &mut self.children {
            child.run.seal();
        }
    }

    fn transform(
        &self,
        document: Document,
        ctx: &ExecutionContext,
        max_iterations: usize,
    ) -> Document {
        let Some(acc) = self.sealed.as_ref() else {
            warn!(
                recipe = Recipe::display_name(self.recipe),
                "transform requested before the scan phase completed; skipped"
            );
            return document;
        };
        let mut document = document;
        if let Some(visitor) = self.recipe.visitor(acc) {
            let mut visitor: Box<dyn Visitor + '_> = match self.recipe.precondition() {
                Some(precondition) => Box::new(gate(precondition, visitor)),
                None => visitor,
            };
            document = match self.recipe.max_cycles() {
                Some(cycles) => {
                    FixpointDriver::new()
                        .with_max_iterations(cycles.min(max_iterations))
                        .apply(document, visitor.as_mut(), ctx)
                        .document
                }
                None => visit_document(document, visitor.as_mut(), ctx),
            };
        }
        for child in self.children.iter().filter(|child| child.active) {
            document = child.run.transform(document, ctx, max_iterations);
        }
        document
    }
}

#[cfg(test)]
mod tests {
    use graft_tree::{DocumentKind, Node, VisitContext};

    use super::*;

    /// Collects root element names; transforms nothing.
    struct RootNames;

    struct CollectRoot<'a>(&'a mut BTreeSet<String>);

    impl Visitor for CollectRoot<'_> {
        fn visit_element(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Option<Node> {
            if cx.cursor().depth() == 1 {
                self.0.insert(node.name().map(|n| n.to_string()).unwrap_or_default());
            }
            Some(node.clone())
        }
    }

    impl Recipe for RootNames {
        type Acc = BTreeSet<String>;

        fn display_name(&self) -> &str {
            "Collect root names"
        }

        fn initial_value(&self, _ctx: &ExecutionContext) -> Self::Acc {
            BTreeSet::new()
        }

        fn scanner<'a>(&'a self, acc: &'a mut Self::Acc) -> Option<Box<dyn Visitor + 'a>> {
            Some(Box::new(CollectRoot(acc)))
        }

        fn visitor<'a>(&'a self, _acc: &'a Self::Acc) -> Option<Box<dyn Visitor + 'a>> {
            None
        }
    }

    fn doc(root: &'static str) -> Document {
        Document::new(
            format!("{root}.xml"),
            DocumentKind::Markup,
            Node::element(root).build().unwrap(),
        )
    }

    #[test]
    fn test_scan_then_seal() {
        let ctx = ExecutionContext::new();
        let recipe = RootNames;
        let run = TypedRun::new(&recipe, &ctx);
        for d in [doc("b"), doc("a"), doc("b")] {
            run.scan(&d, &ctx);
        }
        let acc = run.into_accumulator();
        assert_eq!(acc.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_transform_before_seal_is_identity() {
        let ctx = ExecutionContext::new();
        let recipe = RootNames;
        let run = TypedRun::new(&recipe, &ctx);
        let d = doc("a");
        let out = run.transform(d.clone(), &ctx, 10);
        assert!(Document::ptr_eq(&d, &out));
    }

    #[test]
    fn test_recipe_list_pruning() {
        let mut list = RecipeList::new(["a".to_owned(), "b".to_owned(), "c".to_owned()]);
        list.retain(|name| name != "b");
        assert_eq!(list.active().collect::<Vec<_>>(), vec!["a", "c"]);
        assert!(list.is_active(0) && !list.is_active(1));
        list.clear();
        assert!(list.is_empty());
    }

    #[test]
    fn test_accumulator_merges() {
        let mut flag = false;
        flag.merge(true);
        flag.merge(false);
        assert!(flag);

        let mut set: HashSet<u8> = [1].into();
        set.merge([2, 1].into());
        assert_eq!(set.len(), 2);
    }
}
