use graft_tree::{ExecutionContext, Node, PathMatcher, VisitContext, Visitor};

use crate::errors::RewriteResult;
use crate::fragment::{Fragment, FragmentSchema};
use crate::merge::merge;
use crate::recipe::Recipe;
use crate::recipes::or_warn;

/// Merge a fragment into every container at a location path.
///
/// A malformed exclusion does not abort the run: the container is left as
/// it was and carries a warning marker instead.
///
/// ```
/// use graft_rewrite::recipes::MergeFragment;
/// use graft_rewrite::{CompoundKey, Fragment, FragmentSchema, RunConfig, run};
/// use graft_tree::markup::parse_element;
/// use graft_tree::{Document, DocumentKind};
///
/// let recipe = MergeFragment::new(
///     "/project/dependencies",
///     Fragment::new(CompoundKey::new().with("groupId", "g").with("artifactId", "a"))
///         .with_value("version", "1"),
///     FragmentSchema::new("dependency"),
/// )
/// .unwrap();
/// let root = parse_element("<project><dependencies/></project>").unwrap();
/// let corpus = vec![Document::new("pom.xml", DocumentKind::Markup, root)];
///
/// let result = run(&recipe, corpus, &RunConfig::default()).unwrap();
/// assert!(result.results[0].is_changed());
/// ```
#[derive(Clone, Debug)]
pub struct MergeFragment {
    name: String,
    path: PathMatcher,
    fragment: Fragment,
    schema: FragmentSchema,
}

impl MergeFragment {
    pub fn new(path: &str, fragment: Fragment, schema: FragmentSchema) -> RewriteResult<Self> {
        Ok(Self {
            name: format!("Merge `{}` into `{path}`", fragment.key()),
            path: PathMatcher::new(path)?,
            fragment,
            schema,
        })
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Recipe for MergeFragment {
    type Acc = ();

    fn display_name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Insert or update one keyed item in every container at a path."
    }

    fn validate(&self) -> RewriteResult<()> {
        self.fragment.validate_fields()
    }

    fn initial_value(&self, _ctx: &ExecutionContext) -> Self::Acc {}

    fn visitor<'a>(&'a self, _acc: &'a Self::Acc) -> Option<Box<dyn Visitor + 'a>> {
        Some(Box::new(MergeVisitor { recipe: self }))
    }
}

struct MergeVisitor<'a> {
    recipe: &'a MergeFragment,
}

impl Visitor for MergeVisitor<'_> {
    fn name(&self) -> &str {
        &self.recipe.name
    }

    fn visit_element(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Option<Node> {
        if !self.recipe.path.matches(cx.cursor()) {
            return Some(node.clone());
        }
        let merged = merge(node, &self.recipe.fragment, &self.recipe.schema);
        Some(or_warn(node, cx, merged))
    }
}

#[cfg(test)]
mod tests {
    use graft_tree::markup::parse_element;
    use graft_tree::printer::print_markup;
    use graft_tree::{Document, DocumentKind};
    use insta::assert_snapshot;

    use super::*;
    use crate::fragment::CompoundKey;
    use crate::recipe::{RecipeDescriptor, RecipeRun};

    fn recipe(exclusion: &str) -> MergeFragment {
        MergeFragment::new(
            "//annotationProcessorPaths",
            Fragment::new(CompoundKey::new().with("groupId", "G1").with("artifactId", "A1"))
                .with_exclusion(exclusion),
            FragmentSchema::new("path"),
        )
        .unwrap()
    }

    fn transform(recipe: &MergeFragment, document: Document) -> Document {
        let ctx = ExecutionContext::new();
        let mut run = recipe.start(&ctx);
        run.scan(&document, &ctx);
        run.seal();
        run.transform(document, &ctx, 10)
    }

    #[test]
    fn test_bad_exclusion_becomes_warning() {
        let root = parse_element(
            "<project><build><annotationProcessorPaths/></build></project>",
        )
        .unwrap();
        let document = Document::new("pom.xml", DocumentKind::Markup, root);
        let recipe = recipe("onlygroupid");
        assert!(recipe.validate_all().is_ok());

        let once = transform(&recipe, document);
        assert_snapshot!(print_markup(once.root()), @r"
        <project>
          <build>
            <!--~~(Invalid exclusion `onlygroupid`: expected `groupId:artifactId`)~~>-->
            <annotationProcessorPaths/>
          </build>
        </project>
        ");
        let twice = transform(&recipe, once.clone());
        assert!(Document::ptr_eq(&once, &twice));
    }

    #[test]
    fn test_unmatched_path_is_untouched() {
        let root = parse_element("<project><dependencies/></project>").unwrap();
        let document = Document::new("pom.xml", DocumentKind::Markup, root);
        let out = transform(&recipe("G2:A2"), document.clone());
        assert!(Document::ptr_eq(&document, &out));
    }
}
