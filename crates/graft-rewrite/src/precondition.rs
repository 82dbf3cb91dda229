//! Precondition algebra.
//!
//! A [`Precondition`] is a side-effect-free predicate over a [`Document`].
//! Leaves test one property of the document; `And`/`Or`/`Not` compose them.
//! [`gate`] wraps a visitor so that it only runs on documents for which the
//! precondition holds, and otherwise leaves them untouched.

use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;

use graft_tree::{
    Document, DocumentKind, Node, NodeKindTag, PathMatcher, TraversalOrder, VisitContext,
    Visitor, WalkAction, walk_with_path,
};

use crate::errors::RewriteResult;
use crate::glob::Glob;

/// Custom document predicate.
pub type DocumentPredicate = Arc<dyn Fn(&Document) -> bool + Send + Sync>;

#[derive(Clone)]
pub enum Precondition {
    /// Constant result.
    Check(bool),
    /// Document has the given kind.
    Kind(DocumentKind),
    /// Document's source path matches a glob.
    SourcePath(Glob),
    /// Some element's root-to-node chain matches the path.
    HasPath(PathMatcher),
    /// A property-style document has an entry with exactly this key.
    HasEntry(String),
    Predicate(DocumentPredicate),
    And(Vec<Precondition>),
    Or(Vec<Precondition>),
    Not(Box<Precondition>),
}

impl Precondition {
    pub fn check(value: bool) -> Self {
        Precondition::Check(value)
    }

    pub fn kind(kind: DocumentKind) -> Self {
        Precondition::Kind(kind)
    }

    /// Fails with `PreconditionEvaluationFailure` for a malformed glob.
    pub fn source_path(pattern: &str) -> RewriteResult<Self> {
        Ok(Precondition::SourcePath(Glob::new(pattern)?))
    }

    /// Fails with `InvalidPath` for a malformed location path.
    pub fn has_path(pattern: &str) -> RewriteResult<Self> {
        Ok(Precondition::HasPath(PathMatcher::new(pattern)?))
    }

    pub fn has_entry(key: impl Into<String>) -> Self {
        Precondition::HasEntry(key.into())
    }

    pub fn predicate(f: impl Fn(&Document) -> bool + Send + Sync + 'static) -> Self {
        Precondition::Predicate(Arc::new(f))
    }

    pub fn evaluate(&self, document: &Document) -> bool {
        match self {
            Precondition::Check(value) => *value,
            Precondition::Kind(kind) => document.kind() == *kind,
            Precondition::SourcePath(glob) => glob.matches_path(document.source_path()),
            Precondition::HasPath(matcher) => has_path(document.root(), matcher),
            Precondition::HasEntry(key) => document
                .root()
                .children()
                .iter()
                .filter_map(Node::as_entry)
                .any(|entry| entry.key() == key),
            Precondition::Predicate(f) => f(document),
            Precondition::And(items) => items.iter().all(|p| p.evaluate(document)),
            Precondition::Or(items) => items.iter().any(|p| p.evaluate(document)),
            Precondition::Not(inner) => !inner.evaluate(document),
        }
    }
}

fn has_path(root: &Node, matcher: &PathMatcher) -> bool {
    walk_with_path(root, &mut |path, _node| {
        if matcher.matches_names(path) {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(WalkAction::Advance)
        }
    })
    .is_break()
}

/// True iff every precondition holds; stops at the first false one.
pub fn and(items: impl IntoIterator<Item = Precondition>) -> Precondition {
    Precondition::And(items.into_iter().collect())
}

/// True iff any precondition holds; stops at the first true one.
pub fn or(items: impl IntoIterator<Item = Precondition>) -> Precondition {
    Precondition::Or(items.into_iter().collect())
}

pub fn not(inner: Precondition) -> Precondition {
    Precondition::Not(Box::new(inner))
}

impl std::ops::Not for Precondition {
    type Output = Precondition;

    fn not(self) -> Precondition {
        not(self)
    }
}

impl fmt::Debug for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::Check(value) => write!(f, "check({value})"),
            Precondition::Kind(kind) => write!(f, "kind({kind})"),
            Precondition::SourcePath(glob) => write!(f, "source_path({})", glob.pattern()),
            Precondition::HasPath(matcher) => write!(f, "has_path({matcher})"),
            Precondition::HasEntry(key) => write!(f, "has_entry({key})"),
            Precondition::Predicate(_) => f.write_str("predicate(..)"),
            Precondition::And(items) => f.debug_tuple("and").field(items).finish(),
            Precondition::Or(items) => f.debug_tuple("or").field(items).finish(),
            Precondition::Not(inner) => f.debug_tuple("not").field(inner).finish(),
        }
    }
}

/// Run `visitor` only on documents satisfying `precondition`.
pub fn gate<V: Visitor>(precondition: Precondition, visitor: V) -> Gate<V> {
    Gate {
        precondition,
        inner: visitor,
    }
}

/// Visitor returned by [`gate`].
pub struct Gate<V> {
    precondition: Precondition,
    inner: V,
}

impl<V: Visitor> Visitor for Gate<V> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn accepts(&self, document: &Document) -> bool {
        self.precondition.evaluate(document) && self.inner.accepts(document)
    }

    fn order(&self, kind: NodeKindTag) -> TraversalOrder {
        self.inner.order(kind)
    }

    fn visit_element(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Option<Node> {
        self.inner.visit_element(node, cx)
    }

    fn visit_text(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Option<Node> {
        self.inner.visit_text(node, cx)
    }

    fn visit_comment(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Option<Node> {
        self.inner.visit_comment(node, cx)
    }

    fn visit_entry(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Option<Node> {
        self.inner.visit_entry(node, cx)
    }

    fn visit_document(&mut self, document: Document, cx: &mut VisitContext<'_>) -> Document {
        self.inner.visit_document(document, cx)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use graft_tree::markup::{parse_element, parse_properties};
    use graft_tree::{ExecutionContext, visit_document};

    use super::*;

    fn pom() -> Document {
        let root = parse_element(
            "<project><build><plugins><plugin><artifactId>x</artifactId></plugin></plugins></build></project>",
        )
        .unwrap();
        Document::new("module/pom.xml", DocumentKind::Markup, root)
    }

    #[test]
    fn test_leaves() {
        let doc = pom();
        assert!(Precondition::kind(DocumentKind::Markup).evaluate(&doc));
        assert!(!Precondition::kind(DocumentKind::Properties).evaluate(&doc));
        assert!(Precondition::source_path("pom.xml").unwrap().evaluate(&doc));
        assert!(Precondition::source_path("**/pom.xml").unwrap().evaluate(&doc));
        assert!(!Precondition::source_path("build.gradle*").unwrap().evaluate(&doc));
        assert!(Precondition::has_path("/project/build/plugins/plugin").unwrap().evaluate(&doc));
        assert!(!Precondition::has_path("/project/plugins").unwrap().evaluate(&doc));
        assert!(Precondition::predicate(|d| d.root().is_element_named("project")).evaluate(&doc));
    }

    #[test]
    fn test_has_entry_on_properties() {
        let root = parse_properties("micronautVersion=3.0.0").unwrap();
        let doc = Document::new("gradle.properties", DocumentKind::Properties, root);
        assert!(Precondition::has_entry("micronautVersion").evaluate(&doc));
        assert!(!Precondition::has_entry("micronaut").evaluate(&doc));
    }

    #[test]
    fn test_construction_errors_are_fatal() {
        assert!(Precondition::source_path("{a,b").unwrap_err().is_fatal());
        assert!(Precondition::has_path("project").unwrap_err().is_fatal());
    }

    #[test]
    fn test_and_or_short_circuit() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let counted = Precondition::predicate(|_| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            true
        });
        let doc = pom();
        assert!(!and([Precondition::check(false), counted.clone()]).evaluate(&doc));
        assert!(or([Precondition::check(true), counted.clone()]).evaluate(&doc));
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
        assert!(and([Precondition::check(true), counted]).evaluate(&doc));
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    struct Rename;
    impl Visitor for Rename {
        fn visit_text(&mut self, node: &Node, _cx: &mut VisitContext<'_>) -> Option<Node> {
            Some(node.with_value("renamed"))
        }
    }

    fn applied(p: Precondition) -> bool {
        let doc = pom();
        let out = visit_document(doc.clone(), &mut gate(p, Rename), &ExecutionContext::new());
        !Document::ptr_eq(&doc, &out)
    }

    #[test]
    fn test_gate_truth_table() {
        for (a, b) in [(false, false), (false, true), (true, false), (true, true)] {
            let (p1, p2) = (Precondition::check(a), Precondition::check(b));
            assert_eq!(applied(or([p1.clone(), p2.clone()])), a || b, "or({a}, {b})");
            assert_eq!(applied(and([p1.clone(), p2.clone()])), a && b, "and({a}, {b})");
            assert_eq!(applied(!p1), !a, "not({a})");
        }
    }

    #[test]
    fn test_gate_not_true_is_identity() {
        assert!(!applied(not(Precondition::check(true))));
    }
}
