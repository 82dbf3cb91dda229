use graft_tree::{ExecutionContext, Visitor};
use tracing::debug;

use crate::precondition::Precondition;
use crate::recipe::{Recipe, RecipeDescriptor, RecipeList};
use crate::recipes::FlagIfSatisfied;

/// A fixed list of sub-recipes that only runs when some document in the
/// corpus satisfies `requirement`.
///
/// Every sub-recipe is scanned on its own. Once the scan phase is over the
/// list is cleared unless the requirement was met somewhere.
pub struct CompositeRecipe {
    name: String,
    requirement: Precondition,
    recipes: Vec<Box<dyn RecipeDescriptor>>,
}

impl CompositeRecipe {
    pub fn new(name: impl Into<String>, requirement: Precondition) -> Self {
        Self {
            name: name.into(),
            requirement,
            recipes: Vec::new(),
        }
    }

    pub fn with_recipe(mut self, recipe: impl RecipeDescriptor + 'static) -> Self {
        self.recipes.push(Box::new(recipe));
        self
    }
}

impl Recipe for CompositeRecipe {
    /// Whether some document met the requirement.
    type Acc = bool;

    fn display_name(&self) -> &str {
        &self.name
    }

    fn initial_value(&self, _ctx: &ExecutionContext) -> Self::Acc {
        false
    }

    fn scanner<'a>(&'a self, acc: &'a mut Self::Acc) -> Option<Box<dyn Visitor + 'a>> {
        Some(Box::new(FlagIfSatisfied {
            condition: &self.requirement,
            flag: acc,
        }))
    }

    fn visitor<'a>(&'a self, _acc: &'a Self::Acc) -> Option<Box<dyn Visitor + 'a>> {
        None
    }

    fn recipe_list(&self) -> &[Box<dyn RecipeDescriptor>] {
        &self.recipes
    }

    fn prune_recipe_list(&self, acc: &Self::Acc, list: &mut RecipeList) {
        if !*acc {
            debug!(recipe = %self.name, "requirement not met; dropping sub-recipes");
            list.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use graft_tree::{Document, DocumentKind, Node};

    use super::*;
    use crate::recipe::RecipeRun;
    use crate::recipes::ChangeEntryKey;

    fn props() -> Document {
        let root = Node::element("properties")
            .child(Node::entry("a", "1").unwrap())
            .build()
            .unwrap();
        Document::new("app.properties", DocumentKind::Properties, root)
    }

    fn marker(path: &'static str) -> Document {
        Document::new(path, DocumentKind::Source, Node::element("unit").build().unwrap())
    }

    fn composite() -> CompositeRecipe {
        CompositeRecipe::new(
            "Rename when marked",
            Precondition::source_path("**/Marker.java").unwrap(),
        )
        .with_recipe(ChangeEntryKey::new("a", "b"))
    }

    fn transform(recipe: &CompositeRecipe, corpus: &[Document]) -> Document {
        let ctx = ExecutionContext::new();
        let mut run = recipe.start(&ctx);
        for document in corpus {
            run.scan(document, &ctx);
        }
        run.seal();
        run.transform(corpus[0].clone(), &ctx, 10)
    }

    #[test]
    fn test_runs_sub_recipes_when_required_document_exists() {
        let out = transform(&composite(), &[props(), marker("src/Marker.java")]);
        assert_eq!(out.root().children()[0].as_entry().map(|e| e.key()), Some("b"));
    }

    #[test]
    fn test_prunes_sub_recipes_otherwise() {
        let corpus = [props(), marker("src/Other.java")];
        let out = transform(&composite(), &corpus);
        assert!(Document::ptr_eq(&corpus[0], &out));
    }
}
