//! Typed fragments: compound keys, scalar values and exclusion lists.

use std::fmt;

use graft_tree::node::validate_name;
use graft_tree::{Node, Symbol};
use smallvec::SmallVec;

use crate::errors::{RewriteError, RewriteResult};
use crate::glob::Glob;

/// Separator between the two parts of an exclusion key (`group:artifact`).
pub const EXCLUSION_SEPARATOR: char = ':';

/// Ordered tuple of named fields identifying an item within a container.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CompoundKey {
    fields: SmallVec<[(Symbol, String); 2]>,
}

impl CompoundKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<Symbol>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn fields(&self) -> &[(Symbol, String)] {
        &self.fields
    }

    /// A key without fields matches every item.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every key field is present on `item` with exactly the same value.
    pub fn matches(&self, item: &Node) -> bool {
        self.fields
            .iter()
            .all(|(name, value)| child_value(item, *name) == Some(value.as_str()))
    }
}

impl fmt::Display for CompoundKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (_, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, "{EXCLUSION_SEPARATOR}")?;
            }
            f.write_str(value)?;
        }
        Ok(())
    }
}

pub(crate) fn child_value(item: &Node, name: Symbol) -> Option<&str> {
    item.children()
        .iter()
        .find(|c| c.name() == Some(name))
        .and_then(Node::value)
}

/// Description of one item that should exist in a container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    key: CompoundKey,
    values: SmallVec<[(Symbol, String); 2]>,
    exclusions: Vec<String>,
}

impl Fragment {
    pub fn new(key: CompoundKey) -> Self {
        Self {
            key,
            values: SmallVec::new(),
            exclusions: Vec::new(),
        }
    }

    pub fn with_value(mut self, name: impl Into<Symbol>, value: impl Into<String>) -> Self {
        self.values.push((name.into(), value.into()));
        self
    }

    /// Add an exclusion key of the form `group:artifact`.
    pub fn with_exclusion(mut self, exclusion: impl Into<String>) -> Self {
        self.exclusions.push(exclusion.into());
        self
    }

    pub fn with_exclusions<S: Into<String>>(mut self, exclusions: impl IntoIterator<Item = S>) -> Self {
        self.exclusions.extend(exclusions.into_iter().map(Into::into));
        self
    }

    pub fn key(&self) -> &CompoundKey {
        &self.key
    }

    pub fn values(&self) -> &[(Symbol, String)] {
        &self.values
    }

    pub fn exclusions(&self) -> &[String] {
        &self.exclusions
    }

    /// Check that the key is non-empty and every field name is well formed.
    pub fn validate_fields(&self) -> RewriteResult<()> {
        if self.key.is_empty() {
            return Err(RewriteError::invalid_config("fragment key has no fields"));
        }
        for (name, _) in self.key.fields().iter().chain(self.values.iter()) {
            name.with_str(validate_name).map_err(RewriteError::invalid_config)?;
        }
        Ok(())
    }

    /// Check field names and exclusion keys without touching any tree.
    pub fn validate(&self, schema: &FragmentSchema) -> RewriteResult<()> {
        self.validate_fields()?;
        schema.parse_exclusions(&self.exclusions, &self.key)?;
        Ok(())
    }
}

/// Element names used when reading and building fragment items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FragmentSchema {
    item: Symbol,
    exclusions: Symbol,
    exclusion: Symbol,
    exclusion_key: Option<[Symbol; 2]>,
}

impl FragmentSchema {
    /// Schema for items named `item`, with `exclusions/exclusion` blocks whose
    /// key fields default to the fragment's own key field names.
    pub fn new(item: impl Into<Symbol>) -> Self {
        Self {
            item: item.into(),
            exclusions: Symbol::new("exclusions"),
            exclusion: Symbol::new("exclusion"),
            exclusion_key: None,
        }
    }

    pub fn with_exclusion_names(
        mut self,
        container: impl Into<Symbol>,
        item: impl Into<Symbol>,
    ) -> Self {
        self.exclusions = container.into();
        self.exclusion = item.into();
        self
    }

    pub fn with_exclusion_key(mut self, first: impl Into<Symbol>, second: impl Into<Symbol>) -> Self {
        self.exclusion_key = Some([first.into(), second.into()]);
        self
    }

    pub fn item(&self) -> Symbol {
        self.item
    }

    pub fn exclusions(&self) -> Symbol {
        self.exclusions
    }

    pub fn exclusion(&self) -> Symbol {
        self.exclusion
    }

    pub(crate) fn is_item(&self, node: &Node) -> bool {
        node.name() == Some(self.item)
    }

    fn exclusion_fields(&self, names: impl Iterator<Item = Symbol>) -> RewriteResult<[Symbol; 2]> {
        if let Some(fields) = self.exclusion_key {
            return Ok(fields);
        }
        let names: SmallVec<[Symbol; 2]> = names.collect();
        match names.as_slice() {
            [first, second] => Ok([*first, *second]),
            _ => Err(RewriteError::invalid_config(format!(
                "exclusion keys need two fields, but the item key has {}",
                names.len()
            ))),
        }
    }

    /// Parse every exclusion string; the first malformed one aborts.
    pub fn parse_exclusions(
        &self,
        exclusions: &[String],
        key: &CompoundKey,
    ) -> RewriteResult<Vec<CompoundKey>> {
        self.parse_exclusions_for(exclusions, key.names())
    }

    pub(crate) fn parse_exclusions_for(
        &self,
        exclusions: &[String],
        key_names: impl Iterator<Item = Symbol>,
    ) -> RewriteResult<Vec<CompoundKey>> {
        if exclusions.is_empty() {
            return Ok(Vec::new());
        }
        let fields = self.exclusion_fields(key_names)?;
        exclusions
            .iter()
            .map(|exclusion| parse_exclusion(exclusion, fields))
            .collect()
    }

    /// Build the exclusions block, or `None` for an empty list.
    pub(crate) fn build_exclusions(&self, exclusions: &[CompoundKey]) -> RewriteResult<Option<Node>> {
        if exclusions.is_empty() {
            return Ok(None);
        }
        let mut block = Node::element(self.exclusions);
        for key in exclusions {
            let mut item = Node::element(self.exclusion);
            for (name, value) in key.fields() {
                item = item.leaf(*name, value.clone());
            }
            block = block.child(item.build()?);
        }
        Ok(Some(block.build()?))
    }
}

/// Split `group:artifact` into a two-field key.
pub fn parse_exclusion(exclusion: &str, fields: [Symbol; 2]) -> RewriteResult<CompoundKey> {
    let mut parts = exclusion.split(EXCLUSION_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(first), Some(second), None) if !first.is_empty() && !second.is_empty() => Ok(
            CompoundKey::new()
                .with(fields[0], first)
                .with(fields[1], second),
        ),
        _ => Err(RewriteError::invalid_exclusion(exclusion)),
    }
}

/// Glob-valued key used to search for items to change.
#[derive(Clone, Debug, Default)]
pub struct KeyPattern {
    fields: SmallVec<[(Symbol, Glob); 2]>,
}

impl KeyPattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field whose value must match `pattern`.
    pub fn with(mut self, name: impl Into<Symbol>, pattern: &str) -> RewriteResult<Self> {
        self.fields.push((name.into(), Glob::new(pattern)?));
        Ok(self)
    }

    pub fn names(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn matches(&self, item: &Node) -> bool {
        self.fields.iter().all(|(name, glob)| {
            child_value(item, *name).is_some_and(|value| glob.matches(value))
        })
    }
}

#[cfg(test)]
mod tests {
    use graft_tree::markup::parse_element;

    use super::*;
    use crate::errors::RewriteErrorKind;

    fn key(g: &str, a: &str) -> CompoundKey {
        CompoundKey::new().with("groupId", g).with("artifactId", a)
    }

    #[test]
    fn test_key_matches_exactly() {
        let item = parse_element(
            "<path><groupId>org.projectlombok</groupId><artifactId>lombok</artifactId></path>",
        )
        .unwrap();
        assert!(key("org.projectlombok", "lombok").matches(&item));
        assert!(!key("org.projectlombok", "lombok*").matches(&item));
        assert_eq!(key("g", "a").to_string(), "g:a");
    }

    #[test]
    fn test_exclusion_parsing() {
        let fields = [Symbol::new("groupId"), Symbol::new("artifactId")];
        let parsed = parse_exclusion("G2:A2", fields).unwrap();
        assert_eq!(parsed, key("G2", "A2"));
        for bad in ["onlygroupid", ":a", "g:", "a:b:c", ""] {
            let err = parse_exclusion(bad, fields).unwrap_err();
            assert!(
                matches!(err.kind(), RewriteErrorKind::InvalidExclusionFormat(s) if s == bad),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_fragment_validation() {
        let schema = FragmentSchema::new("path");
        assert!(Fragment::new(key("g", "a")).with_value("version", "1").validate(&schema).is_ok());
        assert!(
            Fragment::new(key("g", "a"))
                .with_value("bad name", "1")
                .validate(&schema)
                .is_err()
        );
        assert!(
            Fragment::new(key("g", "a"))
                .with_exclusion("nope")
                .validate(&schema)
                .is_err()
        );
        // Single-field keys need an explicit exclusion key.
        let single = Fragment::new(CompoundKey::new().with("id", "x")).with_exclusion("g:a");
        assert!(single.validate(&schema).is_err());
        assert!(
            single
                .validate(&schema.clone().with_exclusion_key("groupId", "artifactId"))
                .is_ok()
        );
    }

    #[test]
    fn test_key_pattern_globs() {
        let item = parse_element("<dependency><groupId>io.micronaut.data</groupId></dependency>")
            .unwrap();
        let pattern = KeyPattern::new().with("groupId", "io.micronaut*").unwrap();
        assert!(pattern.matches(&item));
        let missing = KeyPattern::new().with("artifactId", "*").unwrap();
        assert!(!missing.matches(&item));
    }
}
