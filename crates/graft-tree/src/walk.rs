//! Read-only recursive traversal utilities.
//!
//! These walks never rebuild anything; use the visitor driver in
//! [`crate::visit`] for rewriting traversals.

use std::ops::ControlFlow;

use crate::node::Node;
use crate::symbol::Symbol;

/// Controls whether to descend into children during a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkAction {
    /// Continue walking and descend into children.
    Advance,
    /// Skip the children of the current node.
    Skip,
}

/// Walk a node and its descendants in document order.
pub fn walk_all<B>(
    node: &Node,
    f: &mut dyn FnMut(&Node) -> ControlFlow<B, WalkAction>,
) -> ControlFlow<B, ()> {
    match f(node) {
        ControlFlow::Break(b) => return ControlFlow::Break(b),
        ControlFlow::Continue(WalkAction::Skip) => return ControlFlow::Continue(()),
        ControlFlow::Continue(WalkAction::Advance) => {}
    }
    for child in node.children() {
        walk_all(child, f)?;
    }
    ControlFlow::Continue(())
}

/// Walk elements, passing the root-to-node chain of element names.
///
/// The slice handed to `f` ends with the name of the element being visited.
pub fn walk_with_path<B>(
    node: &Node,
    f: &mut dyn FnMut(&[Symbol], &Node) -> ControlFlow<B, WalkAction>,
) -> ControlFlow<B, ()> {
    let mut path = Vec::new();
    walk_with_path_inner(node, &mut path, f)
}

fn walk_with_path_inner<B>(
    node: &Node,
    path: &mut Vec<Symbol>,
    f: &mut dyn FnMut(&[Symbol], &Node) -> ControlFlow<B, WalkAction>,
) -> ControlFlow<B, ()> {
    let Some(name) = node.name() else {
        return ControlFlow::Continue(());
    };
    path.push(name);
    let result = match f(path, node) {
        ControlFlow::Break(b) => ControlFlow::Break(b),
        ControlFlow::Continue(WalkAction::Skip) => ControlFlow::Continue(()),
        ControlFlow::Continue(WalkAction::Advance) => node
            .children()
            .iter()
            .try_for_each(|child| walk_with_path_inner(child, path, f)),
    };
    path.pop();
    result
}

/// Find the first node (in document order) satisfying `pred`.
pub fn find_first<'a>(node: &'a Node, pred: &mut dyn FnMut(&Node) -> bool) -> Option<&'a Node> {
    if pred(node) {
        return Some(node);
    }
    node.children().iter().find_map(|child| find_first(child, pred))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::element("project")
            .child(
                Node::element("build")
                    .child(Node::element("plugins").leaf("plugin", "x").build().unwrap())
                    .build()
                    .unwrap(),
            )
            .leaf("name", "demo")
            .build()
            .unwrap()
    }

    #[test]
    fn test_walk_all_visits_every_node() {
        let mut count = 0;
        let _ = walk_all::<()>(&sample(), &mut |_node| {
            count += 1;
            ControlFlow::Continue(WalkAction::Advance)
        });
        // 5 elements + 2 text nodes
        assert_eq!(count, 7);
    }

    #[test]
    fn test_walk_skip_prunes_subtree() {
        let mut names = Vec::new();
        let _ = walk_all::<()>(&sample(), &mut |node| {
            if let Some(name) = node.name() {
                names.push(name.to_string());
            }
            if node.is_element_named("build") {
                ControlFlow::Continue(WalkAction::Skip)
            } else {
                ControlFlow::Continue(WalkAction::Advance)
            }
        });
        assert_eq!(names, vec!["project", "build", "name"]);
    }

    #[test]
    fn test_walk_with_early_exit() {
        let result = walk_with_path(&sample(), &mut |path, _node| {
            if path.last().is_some_and(|n| *n == "plugin") {
                ControlFlow::Break(path.iter().map(Symbol::to_string).collect::<Vec<_>>())
            } else {
                ControlFlow::Continue(WalkAction::Advance)
            }
        });
        assert_eq!(
            result,
            ControlFlow::Break(vec![
                "project".to_owned(),
                "build".to_owned(),
                "plugins".to_owned(),
                "plugin".to_owned()
            ])
        );
    }

    #[test]
    fn test_find_first_in_document_order() {
        let tree = sample();
        let found = find_first(&tree, &mut |n| n.as_text().is_some()).unwrap();
        assert_eq!(found.as_text(), Some("x"));
    }
}
