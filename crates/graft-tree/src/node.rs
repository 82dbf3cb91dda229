//! Immutable document nodes.
//!
//! A [`Node`] is a reference-counted, never-mutated value. Every edit
//! produces a new `Node` that inherits the identity token of the node it
//! was derived from, while unedited subtrees are shared by reference.
//!
//! # Identity contract
//!
//! Every `with_*`/`map_*`/`filter_*` method returns a clone of the *same*
//! reference when the edit would not change anything. Callers can therefore
//! detect change with [`Node::ptr_eq`] instead of diffing trees:
//!
//! ```
//! use graft_tree::Node;
//!
//! let version = Node::leaf("version", "1.0").unwrap();
//! let same = version.with_value("1.0");
//! assert!(Node::ptr_eq(&version, &same));
//!
//! let bumped = version.with_value("2.0");
//! assert!(!Node::ptr_eq(&version, &bumped));
//! assert_eq!(version.id(), bumped.id());
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use derive_more::Display;
use smallvec::SmallVec;

use crate::errors::{TreeError, TreeResult};
use crate::symbol::Symbol;

/// Small vector for child lists; most elements have a handful of children.
pub type NodeVec = SmallVec<[Node; 4]>;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a logical node across revisions.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("n{_0}")]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a process-unique id.
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Out-of-band annotation attached to a node and rendered by the printer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Marker {
    /// A recovered, non-fatal problem found while editing this node.
    Warning(Arc<str>),
}

impl Marker {
    pub fn warning(message: impl fmt::Display) -> Self {
        Marker::Warning(message.to_string().into())
    }

    pub fn message(&self) -> &str {
        match self {
            Marker::Warning(message) => message,
        }
    }
}

/// Discriminant of [`NodeKind`], used for traversal-order and cursor lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKindTag {
    Element,
    Text,
    Comment,
    Entry,
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    /// Tagged element with attributes and ordered children.
    Element(Element),
    /// Character data.
    Text(String),
    Comment(String),
    /// Flat key/value entry of a property-style document.
    Entry(Entry),
}

impl NodeKind {
    pub fn tag(&self) -> NodeKindTag {
        match self {
            NodeKind::Element(_) => NodeKindTag::Element,
            NodeKind::Text(_) => NodeKindTag::Text,
            NodeKind::Comment(_) => NodeKindTag::Comment,
            NodeKind::Entry(_) => NodeKindTag::Entry,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Element {
    name: Symbol,
    attributes: SmallVec<[(Symbol, String); 2]>,
    children: NodeVec,
}

impl Element {
    pub fn name(&self) -> Symbol {
        self.name
    }

    pub fn attributes(&self) -> &[(Symbol, String)] {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    key: String,
    value: String,
}

impl Entry {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

struct NodeData {
    id: NodeId,
    kind: NodeKind,
    markers: SmallVec<[Marker; 1]>,
}

/// Reference-counted immutable node.
#[derive(Clone)]
pub struct Node(Arc<NodeData>);

// ============================================================================
// Construction
// ============================================================================

impl Node {
    fn from_kind(kind: NodeKind) -> Self {
        Node(Arc::new(NodeData {
            id: NodeId::fresh(),
            kind,
            markers: SmallVec::new(),
        }))
    }

    /// Start building an element. Names are validated by [`ElementBuilder::build`].
    pub fn element(name: impl Into<Symbol>) -> ElementBuilder {
        ElementBuilder::new(name.into())
    }

    /// Element holding a single text child, e.g. `<version>1.0</version>`.
    pub fn leaf(name: impl Into<Symbol>, value: impl Into<String>) -> TreeResult<Node> {
        Node::element(name).text(value).build()
    }

    pub fn text(value: impl Into<String>) -> Node {
        Node::from_kind(NodeKind::Text(value.into()))
    }

    pub fn comment(value: impl Into<String>) -> TreeResult<Node> {
        let value = value.into();
        if value.contains("--") {
            return Err(TreeError::malformed(format!(
                "comment may not contain `--`: {value:?}"
            )));
        }
        Ok(Node::from_kind(NodeKind::Comment(value)))
    }

    pub fn entry(key: impl Into<String>, value: impl Into<String>) -> TreeResult<Node> {
        let key = key.into();
        let value = value.into();
        validate_entry_key(&key)?;
        validate_entry_value(&value)?;
        Ok(Node::from_kind(NodeKind::Entry(Entry { key, value })))
    }

    /// Rebuild with a new kind, keeping identity and markers.
    fn rebuild(&self, kind: NodeKind) -> Node {
        Node(Arc::new(NodeData {
            id: self.0.id,
            kind,
            markers: self.0.markers.clone(),
        }))
    }
}

// ============================================================================
// Access
// ============================================================================

impl Node {
    pub fn id(&self) -> NodeId {
        self.0.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.0.kind
    }

    pub fn kind_tag(&self) -> NodeKindTag {
        self.0.kind.tag()
    }

    pub fn markers(&self) -> &[Marker] {
        &self.0.markers
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.0.markers.iter().map(Marker::message)
    }

    /// True if both handles point at the same revision of the same node.
    pub fn ptr_eq(a: &Node, b: &Node) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub fn as_element(&self) -> Option<&Element> {
        match &self.0.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_entry(&self) -> Option<&Entry> {
        match &self.0.kind {
            NodeKind::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.0.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Element name, or `None` for non-element nodes.
    pub fn name(&self) -> Option<Symbol> {
        self.as_element().map(Element::name)
    }

    pub fn is_element_named(&self, name: &str) -> bool {
        self.name().is_some_and(|n| n == name)
    }

    /// Ordered children; empty for non-element nodes.
    pub fn children(&self) -> &[Node] {
        self.as_element().map(Element::children).unwrap_or(&[])
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Node> {
        self.children().iter().filter(|c| c.as_element().is_some())
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children().iter().find(|c| c.is_element_named(name))
    }

    /// Text value of an element.
    ///
    /// `Some("")` for an element without children, the text for an element
    /// whose only child is text, `None` for mixed or nested content.
    pub fn value(&self) -> Option<&str> {
        match &self.0.kind {
            NodeKind::Element(element) => match element.children.as_slice() {
                [] => Some(""),
                [only] => only.as_text(),
                _ => None,
            },
            NodeKind::Text(text) => Some(text),
            NodeKind::Entry(entry) => Some(&entry.value),
            NodeKind::Comment(_) => None,
        }
    }

    /// Text value of the first child element with the given name.
    pub fn child_value(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(Node::value)
    }

    /// Structural equality that ignores identity tokens.
    pub fn structurally_eq(&self, other: &Node) -> bool {
        if Node::ptr_eq(self, other) {
            return true;
        }
        if self.0.markers != other.0.markers {
            return false;
        }
        match (&self.0.kind, &other.0.kind) {
            (NodeKind::Element(a), NodeKind::Element(b)) => {
                a.name == b.name
                    && a.attributes == b.attributes
                    && a.children.len() == b.children.len()
                    && a.children
                        .iter()
                        .zip(b.children.iter())
                        .all(|(x, y)| x.structurally_eq(y))
            }
            (NodeKind::Text(a), NodeKind::Text(b)) => a == b,
            (NodeKind::Comment(a), NodeKind::Comment(b)) => a == b,
            (NodeKind::Entry(a), NodeKind::Entry(b)) => a == b,
            _ => false,
        }
    }
}

// ============================================================================
// Identity-preserving edits
// ============================================================================

impl Node {
    /// Replace the children of an element.
    ///
    /// Returns `self` when every new child is reference-identical to the old
    /// child at the same position. Non-element nodes are returned unchanged.
    pub fn with_children(&self, children: impl Into<NodeVec>) -> Node {
        let NodeKind::Element(element) = &self.0.kind else {
            return self.clone();
        };
        let children = children.into();
        let unchanged = children.len() == element.children.len()
            && children
                .iter()
                .zip(element.children.iter())
                .all(|(new, old)| Node::ptr_eq(new, old));
        if unchanged {
            return self.clone();
        }
        self.rebuild(NodeKind::Element(Element {
            name: element.name,
            attributes: element.attributes.clone(),
            children,
        }))
    }

    /// Map and filter children in one pass; `None` removes the child.
    pub fn filter_map_children(&self, mut f: impl FnMut(&Node) -> Option<Node>) -> Node {
        if self.children().is_empty() {
            return self.clone();
        }
        let children: NodeVec = self.children().iter().filter_map(&mut f).collect();
        self.with_children(children)
    }

    pub fn map_children(&self, mut f: impl FnMut(&Node) -> Node) -> Node {
        self.filter_map_children(|child| Some(f(child)))
    }

    pub fn filter_children(&self, mut keep: impl FnMut(&Node) -> bool) -> Node {
        self.filter_map_children(|child| keep(child).then(|| child.clone()))
    }

    /// Append a child to an element (last-applied order).
    pub fn with_child_appended(&self, child: Node) -> Node {
        let mut children: NodeVec = self.children().iter().cloned().collect();
        children.push(child);
        self.with_children(children)
    }

    /// Set the text value of an element, text node or entry.
    ///
    /// An element with a single text child keeps that child's identity.
    pub fn with_value(&self, value: &str) -> Node {
        if self.value() == Some(value) {
            return self.clone();
        }
        match &self.0.kind {
            NodeKind::Element(element) => {
                let text = match element.children.as_slice() {
                    [only] if only.as_text().is_some() => only.with_value(value),
                    _ => Node::text(value),
                };
                self.with_children(smallvec::smallvec![text])
            }
            NodeKind::Text(_) => self.rebuild(NodeKind::Text(value.to_owned())),
            NodeKind::Entry(entry) => self.rebuild(NodeKind::Entry(Entry {
                key: entry.key.clone(),
                value: value.to_owned(),
            })),
            NodeKind::Comment(_) => self.clone(),
        }
    }

    /// Set the value of the first child element named `name`, if any.
    pub fn with_child_value(&self, name: &str, value: &str) -> Node {
        let mut done = false;
        self.map_children(|child| {
            if !done && child.is_element_named(name) {
                done = true;
                child.with_value(value)
            } else {
                child.clone()
            }
        })
    }

    /// Rename a property entry.
    pub fn with_entry_key(&self, key: &str) -> TreeResult<Node> {
        let NodeKind::Entry(entry) = &self.0.kind else {
            return Ok(self.clone());
        };
        if entry.key == key {
            return Ok(self.clone());
        }
        validate_entry_key(key)?;
        Ok(self.rebuild(NodeKind::Entry(Entry {
            key: key.to_owned(),
            value: entry.value.clone(),
        })))
    }

    pub fn with_attribute(&self, key: impl Into<Symbol>, value: &str) -> Node {
        let NodeKind::Element(element) = &self.0.kind else {
            return self.clone();
        };
        let key = key.into();
        let mut attributes = element.attributes.clone();
        match attributes.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) if existing == value => return self.clone(),
            Some((_, existing)) => *existing = value.to_owned(),
            None => attributes.push((key, value.to_owned())),
        }
        self.rebuild(NodeKind::Element(Element {
            name: element.name,
            attributes,
            children: element.children.clone(),
        }))
    }

    /// Attach a marker. Attaching a marker that is already present is a no-op.
    pub fn with_marker(&self, marker: Marker) -> Node {
        if self.0.markers.contains(&marker) {
            return self.clone();
        }
        let mut markers = self.0.markers.clone();
        markers.push(marker);
        Node(Arc::new(NodeData {
            id: self.0.id,
            kind: self.0.kind.clone(),
            markers,
        }))
    }

    pub fn with_warning(&self, message: impl fmt::Display) -> Node {
        self.with_marker(Marker::warning(message))
    }

    /// Bottom-up transform: children first, then `f` on the rebuilt node.
    ///
    /// `f` returning `None` removes the node from its parent. If `f` hands
    /// back its argument at every node, the original reference is returned.
    pub fn transform(&self, f: &mut dyn FnMut(&Node) -> Option<Node>) -> Option<Node> {
        let rebuilt = self.filter_map_children(|child| child.transform(&mut *f));
        f(&rebuilt)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Node");
        s.field("id", &self.0.id).field("kind", &self.0.kind);
        if !self.0.markers.is_empty() {
            s.field("markers", &self.0.markers);
        }
        s.finish()
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Check that `name` is usable as an element or attribute name.
pub fn validate_name(name: &str) -> TreeResult<()> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(TreeError::malformed("empty element name"));
    };
    if !(first.is_alphabetic() || first == '_') {
        return Err(TreeError::malformed(format!(
            "name `{name}` must start with a letter or `_`"
        )));
    }
    if let Some(bad) = chars.find(|c| !(c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))) {
        return Err(TreeError::malformed(format!(
            "name `{name}` contains invalid character {bad:?}"
        )));
    }
    Ok(())
}

fn validate_entry_key(key: &str) -> TreeResult<()> {
    if key.trim().is_empty() {
        return Err(TreeError::malformed("empty entry key"));
    }
    if let Some(bad) = key.chars().find(|c| matches!(c, '=' | ':' | '\n' | '\r')) {
        return Err(TreeError::malformed(format!(
            "entry key `{key}` contains invalid character {bad:?}"
        )));
    }
    Ok(())
}

fn validate_entry_value(value: &str) -> TreeResult<()> {
    if value.contains(['\n', '\r']) {
        return Err(TreeError::malformed(format!(
            "entry value {value:?} spans multiple lines"
        )));
    }
    Ok(())
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for element nodes.
pub struct ElementBuilder {
    name: Symbol,
    attributes: SmallVec<[(Symbol, String); 2]>,
    children: NodeVec,
    error: Option<TreeError>,
}

impl ElementBuilder {
    pub fn new(name: Symbol) -> Self {
        Self {
            name,
            attributes: SmallVec::new(),
            children: NodeVec::new(),
            error: None,
        }
    }

    pub fn attr(mut self, key: impl Into<Symbol>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    /// Append a text child.
    pub fn text(mut self, value: impl Into<String>) -> Self {
        self.children.push(Node::text(value));
        self
    }

    /// Append a `<name>value</name>` child.
    pub fn leaf(mut self, name: impl Into<Symbol>, value: impl Into<String>) -> Self {
        match Node::leaf(name, value) {
            Ok(node) => self.children.push(node),
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
        self
    }

    pub fn build(self) -> TreeResult<Node> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.name.with_str(validate_name)?;
        for (key, _) in &self.attributes {
            key.with_str(validate_name)?;
        }
        Ok(Node::from_kind(NodeKind::Element(Element {
            name: self.name,
            attributes: self.attributes,
            children: self.children,
        })))
    }
}
