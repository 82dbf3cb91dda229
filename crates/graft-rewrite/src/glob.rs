//! Glob patterns for source paths and key values.
//!
//! Supported syntax: `**` (any characters, including `/`), `*` (any
//! characters except `/`), `?` (one character except `/`) and `{a,b}`
//! alternation. `**/` also matches zero directories.

use std::fmt;

use regex::Regex;

use crate::errors::{RewriteError, RewriteResult};

#[derive(Clone)]
pub struct Glob {
    pattern: String,
    regex: Regex,
    literal: bool,
}

impl Glob {
    /// Compile `pattern`. A malformed pattern is a precondition failure,
    /// surfaced before any document is processed.
    pub fn new(pattern: &str) -> RewriteResult<Self> {
        if pattern.is_empty() {
            return Err(RewriteError::precondition("empty glob pattern"));
        }
        let source = translate(pattern).map_err(|reason| {
            RewriteError::precondition(format!("malformed glob `{pattern}`: {reason}"))
        })?;
        let regex = Regex::new(&source).map_err(|err| {
            RewriteError::precondition(format!("malformed glob `{pattern}`: {err}"))
        })?;
        Ok(Self {
            pattern: pattern.to_owned(),
            regex,
            literal: !pattern.contains(['*', '?', '{']),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// True if the pattern has no wildcards.
    pub fn is_literal(&self) -> bool {
        self.literal
    }

    /// Match the whole of `text`.
    pub fn matches(&self, text: &str) -> bool {
        if self.literal {
            return self.pattern == text;
        }
        self.regex.is_match(text)
    }

    /// Match a source path. Patterns without `/` match the file name only.
    pub fn matches_path(&self, path: &str) -> bool {
        let path = path.replace('\\', "/");
        if self.pattern.contains('/') {
            self.matches(&path)
        } else {
            let file_name = path.rsplit('/').next().unwrap_or(&path);
            self.matches(file_name)
        }
    }
}

impl fmt::Debug for Glob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Glob").field(&self.pattern).finish()
    }
}

fn translate(pattern: &str) -> Result<String, &'static str> {
    let mut out = String::from("^");
    let mut chars = pattern.chars().peekable();
    let mut in_group = false;
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("(?:.*/)?");
                } else {
                    out.push_str(".*");
                }
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '{' if in_group => return Err("nested `{`"),
            '{' => {
                in_group = true;
                out.push_str("(?:");
            }
            ',' if in_group => out.push('|'),
            '}' if !in_group => return Err("unmatched `}`"),
            '}' => {
                in_group = false;
                out.push(')');
            }
            c => {
                let mut buf = [0; 4];
                out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
            }
        }
    }
    if in_group {
        return Err("unclosed `{`");
    }
    out.push('$');
    Ok(out)
}
