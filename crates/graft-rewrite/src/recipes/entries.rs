//! Edits to property-style `key=value` entries.

use graft_tree::{DocumentKind, ExecutionContext, Node, VisitContext, Visitor};

use crate::errors::{RewriteError, RewriteResult};
use crate::glob::Glob;
use crate::precondition::Precondition;
use crate::recipe::Recipe;
use crate::recipes::or_warn;

/// Rename an entry key in property documents.
#[derive(Clone, Debug)]
pub struct ChangeEntryKey {
    name: String,
    old_key: String,
    new_key: String,
}

impl ChangeEntryKey {
    pub fn new(old_key: impl Into<String>, new_key: impl Into<String>) -> Self {
        let old_key = old_key.into();
        let new_key = new_key.into();
        Self {
            name: format!("Rename entry `{old_key}` to `{new_key}`"),
            old_key,
            new_key,
        }
    }
}

impl Recipe for ChangeEntryKey {
    type Acc = ();

    fn display_name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> RewriteResult<()> {
        Node::entry(self.new_key.as_str(), "").map_err(RewriteError::invalid_config)?;
        Ok(())
    }

    fn initial_value(&self, _ctx: &ExecutionContext) -> Self::Acc {}

    fn visitor<'a>(&'a self, _acc: &'a Self::Acc) -> Option<Box<dyn Visitor + 'a>> {
        Some(Box::new(RenameEntry { recipe: self }))
    }

    fn precondition(&self) -> Option<Precondition> {
        Some(Precondition::kind(DocumentKind::Properties))
    }
}

struct RenameEntry<'a> {
    recipe: &'a ChangeEntryKey,
}

impl Visitor for RenameEntry<'_> {
    fn name(&self) -> &str {
        &self.recipe.name
    }

    fn visit_entry(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Option<Node> {
        match node.as_entry() {
            Some(entry) if entry.key() == self.recipe.old_key => {
                let renamed = node.with_entry_key(&self.recipe.new_key).map_err(Into::into);
                Some(or_warn(node, cx, renamed))
            }
            _ => Some(node.clone()),
        }
    }
}

/// Set the value of entries whose key matches a glob.
#[derive(Clone, Debug)]
pub struct ChangeEntryValue {
    name: String,
    key: Glob,
    old_value: Option<String>,
    new_value: String,
}

impl ChangeEntryValue {
    /// Fails with `PreconditionEvaluationFailure` for a malformed key glob.
    pub fn new(key: &str, new_value: impl Into<String>) -> RewriteResult<Self> {
        Ok(Self {
            name: format!("Change value of `{key}`"),
            key: Glob::new(key)?,
            old_value: None,
            new_value: new_value.into(),
        })
    }

    /// Only change entries that currently hold `value`.
    pub fn with_old_value(mut self, value: impl Into<String>) -> Self {
        self.old_value = Some(value.into());
        self
    }
}

impl Recipe for ChangeEntryValue {
    type Acc = ();

    fn display_name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> RewriteResult<()> {
        Node::entry("key", self.new_value.as_str()).map_err(RewriteError::invalid_config)?;
        Ok(())
    }

    fn initial_value(&self, _ctx: &ExecutionContext) -> Self::Acc {}

    fn visitor<'a>(&'a self, _acc: &'a Self::Acc) -> Option<Box<dyn Visitor + 'a>> {
        Some(Box::new(SetEntryValue { recipe: self }))
    }

    fn precondition(&self) -> Option<Precondition> {
        Some(Precondition::kind(DocumentKind::Properties))
    }
}

struct SetEntryValue<'a> {
    recipe: &'a ChangeEntryValue,
}

impl Visitor for SetEntryValue<'_> {
    fn name(&self) -> &str {
        &self.recipe.name
    }

    fn visit_entry(&mut self, node: &Node, _cx: &mut VisitContext<'_>) -> Option<Node> {
        let Some(entry) = node.as_entry() else {
            return Some(node.clone());
        };
        let wanted = self
            .recipe
            .old_value
            .as_deref()
            .is_none_or(|old| entry.value() == old);
        if wanted && self.recipe.key.matches(entry.key()) {
            return Some(node.with_value(&self.recipe.new_value));
        }
        Some(node.clone())
    }
}

#[cfg(test)]
mod tests {
    use graft_tree::markup::parse_properties;
    use graft_tree::printer::print_properties;
    use graft_tree::Document;
    use insta::assert_snapshot;

    use super::*;
    use crate::recipe::{RecipeDescriptor, RecipeRun};

    fn props() -> Document {
        let root = parse_properties(
            "# server\nserver.port=8080\nmicronaut.server.port=9090\nspring.application.name=app",
        )
        .unwrap();
        Document::new("application.properties", DocumentKind::Properties, root)
    }

    fn apply(recipe: &dyn RecipeDescriptor, document: Document) -> Document {
        let ctx = ExecutionContext::new();
        let mut run = recipe.start(&ctx);
        run.scan(&document, &ctx);
        run.seal();
        run.transform(document, &ctx, 10)
    }

    #[test]
    fn test_rename_key() {
        let recipe = ChangeEntryKey::new("spring.application.name", "micronaut.application.name");
        let out = apply(&recipe, props());
        assert_snapshot!(print_properties(out.root()), @r"
        # server
        server.port=8080
        micronaut.server.port=9090
        micronaut.application.name=app
        ");
        assert!(Document::ptr_eq(&out, &apply(&recipe, out.clone())));
    }

    #[test]
    fn test_change_value_by_glob() {
        let recipe = ChangeEntryValue::new("*server.port", "8081")
            .unwrap()
            .with_old_value("8080");
        let out = apply(&recipe, props());
        assert_snapshot!(print_properties(out.root()), @r"
        # server
        server.port=8081
        micronaut.server.port=9090
        spring.application.name=app
        ");
    }

    #[test]
    fn test_markup_documents_are_skipped() {
        let root = Node::element("properties").build().unwrap();
        let document = Document::new("a.xml", DocumentKind::Markup, root);
        let recipe = ChangeEntryKey::new("a", "b");
        assert!(Document::ptr_eq(&document, &apply(&recipe, document.clone())));
    }

    #[test]
    fn test_invalid_new_key_is_fatal() {
        let err = ChangeEntryKey::new("a", "b=c").validate_all().unwrap_err();
        assert!(err.is_fatal());
    }
}
