//! Documents: a rooted node tree plus its logical path and kind.

use std::sync::Arc;

use derive_more::Display;

use crate::node::Node;

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    #[display("markup")]
    Markup,
    #[display("properties")]
    Properties,
    #[display("yaml")]
    Yaml,
    #[display("source")]
    Source,
}

/// One source file modeled as a node tree.
///
/// Property-style documents use a root element named `properties` whose
/// children are entry (and comment) nodes.
#[derive(Clone, Debug)]
pub struct Document {
    source_path: Arc<str>,
    kind: DocumentKind,
    root: Node,
}

impl Document {
    pub fn new(source_path: impl Into<Arc<str>>, kind: DocumentKind, root: Node) -> Self {
        Self {
            source_path: source_path.into(),
            kind,
            root,
        }
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Replace the root. Returns `self` if `root` is the current root reference.
    pub fn with_root(self, root: Node) -> Self {
        if Node::ptr_eq(&self.root, &root) {
            return self;
        }
        Self { root, ..self }
    }

    /// True if both documents share the same root reference.
    pub fn ptr_eq(a: &Document, b: &Document) -> bool {
        Node::ptr_eq(&a.root, &b.root)
    }

    /// Warning messages attached anywhere in the tree, in document order.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        let _ = crate::walk::walk_all::<()>(&self.root, &mut |node| {
            out.extend(node.warnings().map(str::to_owned));
            std::ops::ControlFlow::Continue(crate::walk::WalkAction::Advance)
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_root_preserves_identity() {
        let root = Node::element("project").build().unwrap();
        let doc = Document::new("pom.xml", DocumentKind::Markup, root.clone());
        let same = doc.clone().with_root(root);
        assert!(Document::ptr_eq(&doc, &same));

        let other = doc.clone().with_root(Node::element("project").build().unwrap());
        assert!(!Document::ptr_eq(&doc, &other));
        assert_eq!(other.source_path(), "pom.xml");
    }

    #[test]
    fn test_collects_warnings() {
        let root = Node::element("project")
            .child(Node::leaf("a", "1").unwrap().with_warning("first"))
            .build()
            .unwrap()
            .with_warning("root");
        let doc = Document::new("pom.xml", DocumentKind::Markup, root);
        assert_eq!(doc.warnings(), vec!["root", "first"]);
    }
}
