//! Location paths over a cursor's ancestor chain.
//!
//! Supported syntax:
//!
//! - `/a/b/c`: the root element is `a`, its child `b`, and the current
//!   element `c`.
//! - `//b/c`: the chain *ends* with `b/c`, at any depth.
//! - `*` in any segment matches exactly one element of any name.
//!
//! Matching is structural only; element content is never inspected.

use std::fmt;

use smallvec::SmallVec;

use crate::cursor::Cursor;
use crate::errors::{TreeError, TreeResult};
use crate::symbol::Symbol;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Segment {
    Name(Symbol),
    Any,
}

impl Segment {
    fn matches(self, name: Symbol) -> bool {
        match self {
            Segment::Name(expected) => expected == name,
            Segment::Any => true,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct PathMatcher {
    pattern: String,
    segments: SmallVec<[Segment; 8]>,
    anchored: bool,
}

impl PathMatcher {
    pub fn new(pattern: &str) -> TreeResult<Self> {
        let (anchored, rest) = if let Some(rest) = pattern.strip_prefix("//") {
            (false, rest)
        } else if let Some(rest) = pattern.strip_prefix('/') {
            (true, rest)
        } else {
            return Err(TreeError::invalid_path(pattern, "must start with `/` or `//`"));
        };
        if rest.is_empty() {
            return Err(TreeError::invalid_path(pattern, "no segments"));
        }
        let mut segments = SmallVec::new();
        for segment in rest.split('/') {
            segments.push(match segment {
                "" => return Err(TreeError::invalid_path(pattern, "empty segment")),
                "*" => Segment::Any,
                name if name.contains(['*', '[', ']', '@']) => {
                    return Err(TreeError::invalid_path(pattern, "unsupported segment syntax"));
                }
                name => Segment::Name(Symbol::from_dynamic(name)),
            });
        }
        Ok(Self {
            pattern: pattern.to_owned(),
            segments,
            anchored,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Match against an explicit root-to-node chain of element names.
    pub fn matches_names(&self, chain: &[Symbol]) -> bool {
        if self.anchored && chain.len() != self.segments.len() {
            return false;
        }
        if chain.len() < self.segments.len() {
            return false;
        }
        let tail = &chain[chain.len() - self.segments.len()..];
        self.segments
            .iter()
            .zip(tail)
            .all(|(segment, name)| segment.matches(*name))
    }

    /// Match against the cursor's current element and its ancestors.
    ///
    /// Always false when the cursor is not positioned on an element.
    pub fn matches(&self, cursor: &Cursor) -> bool {
        match cursor.current() {
            Some(node) if node.as_element().is_some() => {
                self.matches_names(&cursor.element_path())
            }
            _ => false,
        }
    }
}

impl fmt::Debug for PathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathMatcher").field(&self.pattern).finish()
    }
}

impl fmt::Display for PathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    fn chain(names: &[&str]) -> Vec<Symbol> {
        names.iter().map(|n| Symbol::from_dynamic(n)).collect()
    }

    const PROCESSOR_PATH: &str =
        "/project/build/plugins/plugin/configuration/annotationProcessorPaths/path";

    #[test]
    fn test_absolute_path_requires_full_chain() {
        let m = PathMatcher::new(PROCESSOR_PATH).unwrap();
        assert!(m.matches_names(&chain(&[
            "project",
            "build",
            "plugins",
            "plugin",
            "configuration",
            "annotationProcessorPaths",
            "path"
        ])));
        // Same tail, but nested under pluginManagement.
        assert!(!m.matches_names(&chain(&[
            "project",
            "build",
            "pluginManagement",
            "plugins",
            "plugin",
            "configuration",
            "annotationProcessorPaths",
            "path"
        ])));
        assert!(!m.matches_names(&chain(&["project"])));
    }

    #[test]
    fn test_wildcard_matches_one_segment() {
        let m = PathMatcher::new("/project/*/dependency").unwrap();
        assert!(m.matches_names(&chain(&["project", "dependencies", "dependency"])));
        assert!(!m.matches_names(&chain(&["project", "dependency"])));
        assert!(!m.matches_names(&chain(&["project", "a", "b", "dependency"])));
    }

    #[test]
    fn test_relative_path_matches_suffix() {
        let m = PathMatcher::new("//dependencies/dependency").unwrap();
        assert!(m.matches_names(&chain(&["project", "dependencies", "dependency"])));
        assert!(m.matches_names(&chain(&[
            "project",
            "dependencyManagement",
            "dependencies",
            "dependency"
        ])));
        assert!(!m.matches_names(&chain(&["dependency"])));
    }

    #[test]
    fn test_invalid_patterns() {
        for pattern in ["", "project", "/", "//", "/a//b", "/a/", "/a/b*", "/a[1]"] {
            assert!(
                matches!(PathMatcher::new(pattern), Err(TreeError::InvalidPath { .. })),
                "{pattern:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_matches_cursor() {
        let mut cursor = Cursor::new();
        let m = PathMatcher::new("/project/build").unwrap();
        assert!(!m.matches(&cursor));
        cursor.push(Node::element("project").build().unwrap());
        cursor.push(Node::element("build").build().unwrap());
        assert!(m.matches(&cursor));
        cursor.push(Node::text("x"));
        assert!(!m.matches(&cursor));
    }
}
