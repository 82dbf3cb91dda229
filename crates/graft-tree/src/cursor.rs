//! Traversal cursor: the ancestor chain plus per-frame message scopes.
//!
//! A [`Cursor`] is created fresh for each traversal. Its bottom frame stands
//! for the document itself; every node being visited pushes a frame. Each
//! frame owns a message scope that lives exactly as long as the frame, so a
//! message put while visiting a node is visible to that node's descendants
//! and disappears once the traversal leaves the node.

use std::any::Any;
use std::collections::HashMap;

use smallvec::SmallVec;

use crate::node::Node;
use crate::symbol::Symbol;

#[derive(Clone, Debug)]
pub enum CursorTarget {
    Document,
    Node(Node),
}

struct Frame {
    target: CursorTarget,
    messages: HashMap<String, Box<dyn Any>>,
}

impl Frame {
    fn new(target: CursorTarget) -> Self {
        Self {
            target,
            messages: HashMap::new(),
        }
    }
}

pub struct Cursor {
    frames: Vec<Frame>,
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}

impl Cursor {
    /// Cursor positioned on the document frame.
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::new(CursorTarget::Document)],
        }
    }

    pub(crate) fn push(&mut self, node: Node) {
        self.frames.push(Frame::new(CursorTarget::Node(node)));
    }

    pub(crate) fn pop(&mut self) {
        debug_assert!(self.frames.len() > 1, "document frame cannot be popped");
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Point the current frame at a new revision of the same node.
    pub(crate) fn set_current(&mut self, node: Node) {
        if let Some(frame) = self.frames.last_mut() {
            frame.target = CursorTarget::Node(node);
        }
    }

    /// Number of node frames above the document frame.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn target(&self) -> &CursorTarget {
        match self.frames.last() {
            Some(frame) => &frame.target,
            None => &CursorTarget::Document,
        }
    }

    /// The node being visited, or `None` on the document frame.
    pub fn current(&self) -> Option<&Node> {
        match self.target() {
            CursorTarget::Node(node) => Some(node),
            CursorTarget::Document => None,
        }
    }

    /// The parent node of the current node, if it is not the root.
    pub fn parent(&self) -> Option<&Node> {
        self.ancestors().next()
    }

    /// Ancestor nodes, nearest first, excluding the current node.
    pub fn ancestors(&self) -> impl Iterator<Item = &Node> {
        self.nodes_from_top().skip(1)
    }

    fn nodes_from_top(&self) -> impl Iterator<Item = &Node> {
        self.frames.iter().rev().filter_map(|frame| match &frame.target {
            CursorTarget::Node(node) => Some(node),
            CursorTarget::Document => None,
        })
    }

    /// Nearest node (starting at the current one) satisfying `pred`.
    pub fn first_enclosing(&self, pred: impl Fn(&Node) -> bool) -> Option<&Node> {
        self.nodes_from_top().find(|node| pred(node))
    }

    /// Element names from the root to the current node.
    pub fn element_path(&self) -> SmallVec<[Symbol; 8]> {
        self.frames
            .iter()
            .filter_map(|frame| match &frame.target {
                CursorTarget::Node(node) => node.name(),
                CursorTarget::Document => None,
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    /// Put a message on the current frame.
    pub fn put_message<T: Any>(&mut self, key: impl Into<String>, value: T) {
        if let Some(frame) = self.frames.last_mut() {
            frame.messages.insert(key.into(), Box::new(value));
        }
    }

    /// Nearest message for `key`, searching from the current frame outwards.
    pub fn get_message<T: Any + Clone>(&self, key: &str) -> Option<T> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.messages.get(key))
            .and_then(|value| (**value).downcast_ref::<T>())
            .cloned()
    }

    /// Remove and return the nearest message for `key`.
    ///
    /// The message is removed even if it does not have type `T`.
    pub fn poll_message<T: Any>(&mut self, key: &str) -> Option<T> {
        let frame = self
            .frames
            .iter_mut()
            .rev()
            .find(|frame| frame.messages.contains_key(key))?;
        let value = frame.messages.remove(key)?;
        value.downcast::<T>().ok().map(|boxed| *boxed)
    }

    /// Put a message on the nearest frame (starting at the current one) whose
    /// node satisfies `pred`. Returns false if there is no such frame.
    pub fn put_message_on_first_enclosing<T: Any>(
        &mut self,
        pred: impl Fn(&Node) -> bool,
        key: impl Into<String>,
        value: T,
    ) -> bool {
        let frame = self.frames.iter_mut().rev().find(|frame| match &frame.target {
            CursorTarget::Node(node) => pred(node),
            CursorTarget::Document => false,
        });
        match frame {
            Some(frame) => {
                frame.messages.insert(key.into(), Box::new(value));
                true
            }
            None => false,
        }
    }

    /// Put a message on the document frame; it lives until the traversal ends.
    pub fn put_message_on_document<T: Any>(&mut self, key: impl Into<String>, value: T) {
        self.frames[0].messages.insert(key.into(), Box::new(value));
    }
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("path", &self.element_path())
            .finish()
    }
}
