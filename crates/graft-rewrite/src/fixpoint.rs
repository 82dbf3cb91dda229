//! Repeat-until-stable application of a visitor.
//!
//! The driver feeds each result back into the visitor until an application
//! returns the same root reference it was given. Non-convergent visitors
//! stop after `max_iterations` applications; the last result is returned
//! with a `FixedPointNotStable` warning marker on its root.

use graft_tree::{Document, ExecutionContext, Visitor, visit_document};
use tracing::{trace, warn};

use crate::errors::RewriteError;

/// Default cap on applications per document.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Result of driving a visitor to a fixed point.
#[derive(Debug)]
pub struct ApplyResult {
    /// The transformed document.
    pub document: Document,
    /// Number of applications performed.
    pub iterations: usize,
    /// Whether the last application left the document unchanged.
    pub reached_fixpoint: bool,
}

/// Applies a visitor to a document until it stops changing.
///
/// # Example
///
/// ```
/// use graft_rewrite::FixpointDriver;
/// use graft_tree::{Document, DocumentKind, ExecutionContext, Node, VisitContext, Visitor};
///
/// /// Appends `<item/>` until there are three.
/// struct FillToThree;
///
/// impl Visitor for FillToThree {
///     fn visit_element(&mut self, node: &Node, _cx: &mut VisitContext<'_>) -> Option<Node> {
///         if node.is_element_named("items") && node.children().len() < 3 {
///             return Some(node.with_child_appended(Node::element("item").build().unwrap()));
///         }
///         Some(node.clone())
///     }
/// }
///
/// let root = Node::element("items").build().unwrap();
/// let doc = Document::new("a.xml", DocumentKind::Markup, root);
/// let result = FixpointDriver::new().apply(doc, &mut FillToThree, &ExecutionContext::new());
/// assert!(result.reached_fixpoint);
/// assert_eq!(result.iterations, 4);
/// assert_eq!(result.document.root().children().len(), 3);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct FixpointDriver {
    max_iterations: usize,
}

impl Default for FixpointDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FixpointDriver {
    pub fn new() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Set the maximum number of applications before giving up.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn apply(
        &self,
        document: Document,
        visitor: &mut dyn Visitor,
        ctx: &ExecutionContext,
    ) -> ApplyResult {
        let mut current = document;

        for iteration in 0..self.max_iterations {
            let next = visit_document(current.clone(), visitor, ctx);
            if Document::ptr_eq(&current, &next) {
                trace!(
                    visitor = visitor.name(),
                    iterations = iteration + 1,
                    "fixed point reached"
                );
                return ApplyResult {
                    document: next,
                    iterations: iteration + 1,
                    reached_fixpoint: true,
                };
            }
            current = next;
        }

        let error = RewriteError::not_stable(self.max_iterations);
        warn!(
            visitor = visitor.name(),
            path = current.source_path(),
            "{error}"
        );
        let root = current.root().with_warning(&error);
        ApplyResult {
            document: current.with_root(root),
            iterations: self.max_iterations,
            reached_fixpoint: false,
        }
    }
}

/// Shorthand for `FixpointDriver::new().with_max_iterations(n).apply(..).document`.
pub fn repeat_until_stable(
    document: Document,
    visitor: &mut dyn Visitor,
    max_iterations: usize,
    ctx: &ExecutionContext,
) -> Document {
    FixpointDriver::new()
        .with_max_iterations(max_iterations)
        .apply(document, visitor, ctx)
        .document
}

#[cfg(test)]
mod tests {
    use graft_tree::{DocumentKind, Node, VisitContext};

    use super::*;

    /// Toggles the root's `state` value between `a` and `b` forever.
    struct Oscillate {
        applications: usize,
    }

    impl Visitor for Oscillate {
        fn visit_element(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Option<Node> {
            if cx.cursor().depth() != 1 {
                return Some(node.clone());
            }
            self.applications += 1;
            let next = if node.child_value("state") == Some("a") { "b" } else { "a" };
            Some(node.with_child_value("state", next))
        }
    }

    fn doc() -> Document {
        let root = Node::element("root").leaf("state", "a").build().unwrap();
        Document::new("state.xml", DocumentKind::Markup, root)
    }

    #[test]
    fn test_oscillating_visitor_stops_after_cap() {
        let mut visitor = Oscillate { applications: 0 };
        let result = FixpointDriver::new()
            .with_max_iterations(5)
            .apply(doc(), &mut visitor, &ExecutionContext::new());
        assert_eq!(visitor.applications, 5);
        assert_eq!(result.iterations, 5);
        assert!(!result.reached_fixpoint);
        assert_eq!(
            result.document.warnings(),
            vec!["Fixed point not reached after 5 iterations"]
        );
        // Five toggles from `a` end on `b`.
        assert_eq!(result.document.root().child_value("state"), Some("b"));
    }

    struct Noop;
    impl Visitor for Noop {}

    #[test]
    fn test_stable_input_takes_one_application() {
        let d = doc();
        let result = FixpointDriver::new().apply(d.clone(), &mut Noop, &ExecutionContext::new());
        assert_eq!(result.iterations, 1);
        assert!(result.reached_fixpoint);
        assert!(Document::ptr_eq(&d, &result.document));
    }

    #[test]
    fn test_repeat_until_stable_returns_best_effort() {
        let mut visitor = Oscillate { applications: 0 };
        let out = repeat_until_stable(doc(), &mut visitor, 2, &ExecutionContext::new());
        assert_eq!(visitor.applications, 2);
        assert_eq!(out.root().child_value("state"), Some("a"));
        assert_eq!(out.warnings().len(), 1);
    }
}
