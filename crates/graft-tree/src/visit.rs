//! Visitor trait and the rewriting traversal driver.
//!
//! A [`Visitor`] overrides only the node kinds it cares about; every other
//! hook defaults to returning its input unchanged. Hooks return:
//!
//! - the same node (cloned reference) to leave it alone,
//! - a different node to replace the subtree,
//! - `None` to delete the node from its parent's children.
//!
//! The driver rebuilds a parent only when at least one child reference
//! changed, so a traversal that edits nothing returns the input root.
//!
//! # Example
//!
//! ```
//! use graft_tree::{Document, DocumentKind, ExecutionContext, Node, VisitContext, Visitor};
//!
//! struct BumpVersion;
//!
//! impl Visitor for BumpVersion {
//!     fn visit_element(&mut self, node: &Node, _cx: &mut VisitContext<'_>) -> Option<Node> {
//!         if node.is_element_named("version") {
//!             return Some(node.with_value("2.0"));
//!         }
//!         Some(node.clone())
//!     }
//! }
//!
//! let root = Node::element("project").leaf("version", "1.0").build().unwrap();
//! let doc = Document::new("pom.xml", DocumentKind::Markup, root);
//! let ctx = ExecutionContext::new();
//!
//! let once = graft_tree::visit_document(doc, &mut BumpVersion, &ctx);
//! assert_eq!(once.root().child_value("version"), Some("2.0"));
//!
//! let twice = graft_tree::visit_document(once.clone(), &mut BumpVersion, &ctx);
//! assert!(Document::ptr_eq(&once, &twice));
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::cursor::Cursor;
use crate::document::{Document, DocumentKind};
use crate::execution::ExecutionContext;
use crate::node::{Node, NodeKind, NodeKindTag};

/// Whether a node's own hook runs before or after its children are visited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TraversalOrder {
    /// Visit children, rebuild, then call the hook on the rebuilt node.
    #[default]
    ChildrenFirst,
    /// Call the hook first, then visit the children of whatever it returned.
    SelfFirst,
}

pub trait Visitor {
    /// Human-readable name for logging.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether this visitor should run on `document` at all.
    fn accepts(&self, _document: &Document) -> bool {
        true
    }

    fn order(&self, _kind: NodeKindTag) -> TraversalOrder {
        TraversalOrder::ChildrenFirst
    }

    fn visit_element(&mut self, node: &Node, _cx: &mut VisitContext<'_>) -> Option<Node> {
        Some(node.clone())
    }

    fn visit_text(&mut self, node: &Node, _cx: &mut VisitContext<'_>) -> Option<Node> {
        Some(node.clone())
    }

    fn visit_comment(&mut self, node: &Node, _cx: &mut VisitContext<'_>) -> Option<Node> {
        Some(node.clone())
    }

    fn visit_entry(&mut self, node: &Node, _cx: &mut VisitContext<'_>) -> Option<Node> {
        Some(node.clone())
    }

    /// Called once the whole tree has been visited, while the document frame
    /// (and its messages) is still on the cursor.
    fn visit_document(&mut self, document: Document, _cx: &mut VisitContext<'_>) -> Document {
        document
    }
}

impl<V: Visitor + ?Sized> Visitor for Box<V> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn accepts(&self, document: &Document) -> bool {
        (**self).accepts(document)
    }

    fn order(&self, kind: NodeKindTag) -> TraversalOrder {
        (**self).order(kind)
    }

    fn visit_element(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Option<Node> {
        (**self).visit_element(node, cx)
    }

    fn visit_text(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Option<Node> {
        (**self).visit_text(node, cx)
    }

    fn visit_comment(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Option<Node> {
        (**self).visit_comment(node, cx)
    }

    fn visit_entry(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Option<Node> {
        (**self).visit_entry(node, cx)
    }

    fn visit_document(&mut self, document: Document, cx: &mut VisitContext<'_>) -> Document {
        (**self).visit_document(document, cx)
    }
}

/// State threaded through one traversal of one document.
pub struct VisitContext<'a> {
    cursor: Cursor,
    execution: &'a ExecutionContext,
    source_path: Arc<str>,
    kind: DocumentKind,
    after_visit: VecDeque<Box<dyn Visitor>>,
}

impl<'a> VisitContext<'a> {
    fn new(document: &Document, execution: &'a ExecutionContext) -> Self {
        Self {
            cursor: Cursor::new(),
            execution,
            source_path: document.source_path().into(),
            kind: document.kind(),
            after_visit: VecDeque::new(),
        }
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    pub fn execution(&self) -> &'a ExecutionContext {
        self.execution
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn document_kind(&self) -> DocumentKind {
        self.kind
    }

    /// Queue a visitor to run over this document after the current
    /// traversal completes. Queued visitors run in FIFO order.
    pub fn do_after_visit(&mut self, visitor: impl Visitor + 'static) {
        self.after_visit.push_back(Box::new(visitor));
    }
}

/// Run `visitor` over `document`, then drain its after-visit queue.
///
/// Returns `document` itself (same root reference) if nothing changed, or
/// if the visitor does not accept the document.
pub fn visit_document(
    document: Document,
    visitor: &mut dyn Visitor,
    ctx: &ExecutionContext,
) -> Document {
    if !visitor.accepts(&document) {
        trace!(visitor = visitor.name(), path = document.source_path(), "not accepted");
        return document;
    }
    let (mut document, mut queue) = run_pass(document, visitor, ctx);
    while let Some(mut next) = queue.pop_front() {
        if !next.accepts(&document) {
            trace!(visitor = next.name(), "deferred visitor not accepted");
            continue;
        }
        let (visited, more) = run_pass(document, next.as_mut(), ctx);
        document = visited;
        queue.extend(more);
    }
    document
}

fn run_pass(
    document: Document,
    visitor: &mut dyn Visitor,
    ctx: &ExecutionContext,
) -> (Document, VecDeque<Box<dyn Visitor>>) {
    let mut cx = VisitContext::new(&document, ctx);
    let root = document.root().clone();
    let visited_root = match visit_node(&root, visitor, &mut cx) {
        Some(node) => node,
        None => {
            warn!(
                visitor = visitor.name(),
                path = document.source_path(),
                "visitor tried to delete the document root; ignored"
            );
            root
        }
    };
    let document = document.with_root(visited_root);
    let document = visitor.visit_document(document, &mut cx);
    (document, cx.after_visit)
}

fn visit_node(node: &Node, visitor: &mut dyn Visitor, cx: &mut VisitContext<'_>) -> Option<Node> {
    cx.cursor.push(node.clone());
    let result = match visitor.order(node.kind_tag()) {
        TraversalOrder::ChildrenFirst => {
            let rebuilt = visit_children(node, visitor, cx);
            cx.cursor.set_current(rebuilt.clone());
            dispatch(&rebuilt, visitor, cx)
        }
        TraversalOrder::SelfFirst => dispatch(node, visitor, cx).map(|visited| {
            cx.cursor.set_current(visited.clone());
            visit_children(&visited, visitor, cx)
        }),
    };
    cx.cursor.pop();
    result
}

fn visit_children(node: &Node, visitor: &mut dyn Visitor, cx: &mut VisitContext<'_>) -> Node {
    node.filter_map_children(|child| visit_node(child, visitor, cx))
}

fn dispatch(node: &Node, visitor: &mut dyn Visitor, cx: &mut VisitContext<'_>) -> Option<Node> {
    match node.kind() {
        NodeKind::Element(_) => visitor.visit_element(node, cx),
        NodeKind::Text(_) => visitor.visit_text(node, cx),
        NodeKind::Comment(_) => visitor.visit_comment(node, cx),
        NodeKind::Entry(_) => visitor.visit_entry(node, cx),
    }
}
