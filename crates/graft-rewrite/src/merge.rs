//! Idempotent structural merge of fragments into item containers.
//!
//! All operations return the input container reference when nothing needed
//! to change, so merging the same fragment twice yields the same tree.

use graft_tree::{Node, NodeVec, Symbol};
use tracing::debug;

use crate::errors::{RewriteError, RewriteResult};
use crate::fragment::{CompoundKey, Fragment, FragmentSchema, KeyPattern, child_value};

/// Ensure exactly one item keyed like `fragment` exists in `container`, with
/// the fragment's values and exclusions.
///
/// Exclusions are parsed before anything is touched, so a malformed one
/// returns `InvalidExclusionFormat` and leaves the container as it was.
/// Further items with the same key are removed. A fragment whose key has no
/// fields is rejected with `InvalidConfig`.
pub fn merge(container: &Node, fragment: &Fragment, schema: &FragmentSchema) -> RewriteResult<Node> {
    require_key(fragment.key().is_empty(), "fragment")?;
    let exclusions = schema.parse_exclusions(fragment.exclusions(), fragment.key())?;

    let mut found = false;
    let mut children = NodeVec::with_capacity(container.children().len() + 1);
    for child in container.children() {
        if !schema.is_item(child) || !fragment.key().matches(child) {
            children.push(child.clone());
            continue;
        }
        if found {
            debug!(key = %fragment.key(), "removing duplicate item");
            continue;
        }
        found = true;
        let updated = update_item(child, fragment.values(), Some(exclusions.as_slice()), schema)?;
        if !Node::ptr_eq(child, &updated) {
            debug!(key = %fragment.key(), "updating item");
        }
        children.push(updated);
    }

    if !found {
        debug!(key = %fragment.key(), item = %schema.item(), "inserting item");
        children.push(build_item(fragment, &exclusions, schema)?);
    }
    Ok(container.with_children(children))
}

/// Remove every item whose key equals `key`. No-op (same reference) if none.
pub fn remove(container: &Node, key: &CompoundKey, schema: &FragmentSchema) -> RewriteResult<Node> {
    require_key(key.is_empty(), "removal")?;
    let removed = container.filter_children(|child| !(schema.is_item(child) && key.matches(child)));
    if !Node::ptr_eq(container, &removed) {
        debug!(key = %key, "removed item");
    }
    Ok(removed)
}

/// Edits applied to every item matching a glob-keyed search.
#[derive(Clone, Debug, Default)]
pub struct ChangeRequest {
    pub key: KeyPattern,
    /// Key fields to overwrite on matching items.
    pub new_key: CompoundKey,
    /// Scalar values to set on matching items.
    pub values: Vec<(Symbol, String)>,
    /// `Some` replaces (or with an empty list, removes) the exclusions block.
    pub exclusions: Option<Vec<String>>,
}

/// Apply `request` to every item in `container` whose key matches.
pub fn change(container: &Node, request: &ChangeRequest, schema: &FragmentSchema) -> RewriteResult<Node> {
    require_key(request.key.is_empty(), "change")?;
    let exclusions = match &request.exclusions {
        Some(list) => Some(schema.parse_exclusions_for(list, request.key.names())?),
        None => None,
    };
    let edits: Vec<(Symbol, String)> = request
        .new_key
        .fields()
        .iter()
        .chain(request.values.iter())
        .cloned()
        .collect();

    let mut children = NodeVec::with_capacity(container.children().len());
    for child in container.children() {
        if schema.is_item(child) && request.key.matches(child) {
            children.push(update_item(child, &edits, exclusions.as_deref(), schema)?);
        } else {
            children.push(child.clone());
        }
    }
    Ok(container.with_children(children))
}

/// An empty key matches every item in a container.
pub(crate) fn require_key(empty: bool, what: &str) -> RewriteResult<()> {
    if empty {
        return Err(RewriteError::invalid_config(format!("{what} key has no fields")));
    }
    Ok(())
}

fn update_item(
    item: &Node,
    values: &[(Symbol, String)],
    exclusions: Option<&[CompoundKey]>,
    schema: &FragmentSchema,
) -> RewriteResult<Node> {
    let mut updated = item.clone();
    for (name, value) in values {
        updated = set_child_value(&updated, *name, value)?;
    }
    if let Some(exclusions) = exclusions {
        updated = set_exclusions(&updated, exclusions, schema)?;
    }
    Ok(updated)
}

fn set_child_value(item: &Node, name: Symbol, value: &str) -> RewriteResult<Node> {
    if child_value(item, name) == Some(value) {
        return Ok(item.clone());
    }
    if !item.children().iter().any(|c| c.name() == Some(name)) {
        return Ok(item.with_child_appended(Node::leaf(name, value)?));
    }
    let mut done = false;
    Ok(item.map_children(|child| {
        if !done && child.name() == Some(name) {
            done = true;
            child.with_value(value)
        } else {
            child.clone()
        }
    }))
}

/// Empty list removes the block wholesale; otherwise the block is replaced
/// unless it already has exactly the wanted content.
fn set_exclusions(item: &Node, exclusions: &[CompoundKey], schema: &FragmentSchema) -> RewriteResult<Node> {
    let block_name = schema.exclusions();
    let Some(fresh) = schema.build_exclusions(exclusions)? else {
        return Ok(item.filter_children(|c| c.name() != Some(block_name)));
    };
    if !item.children().iter().any(|c| c.name() == Some(block_name)) {
        return Ok(item.with_child_appended(fresh));
    }
    let mut replaced = false;
    Ok(item.filter_map_children(|child| {
        if child.name() != Some(block_name) {
            return Some(child.clone());
        }
        if replaced {
            return None;
        }
        replaced = true;
        if child.structurally_eq(&fresh) {
            Some(child.clone())
        } else {
            Some(fresh.clone())
        }
    }))
}

/// Key fields first, then values, then the exclusions block if any.
fn build_item(fragment: &Fragment, exclusions: &[CompoundKey], schema: &FragmentSchema) -> RewriteResult<Node> {
    let mut builder = Node::element(schema.item());
    for (name, value) in fragment.key().fields().iter().chain(fragment.values()) {
        builder = builder.leaf(*name, value.clone());
    }
    if let Some(block) = schema.build_exclusions(exclusions)? {
        builder = builder.child(block);
    }
    Ok(builder.build()?)
}
