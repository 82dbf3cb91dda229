//! Error types for tree construction and path patterns.

use derive_more::Display;

pub type TreeResult<T> = Result<T, TreeError>;

#[derive(Clone, Debug, Display, PartialEq, Eq)]
pub enum TreeError {
    /// A node could not be built from the given name or text.
    #[display("Malformed fragment: {_0}")]
    MalformedFragment(String),

    /// A location path pattern could not be parsed.
    #[display("Invalid path `{pattern}`: {reason}")]
    InvalidPath { pattern: String, reason: &'static str },
}

impl TreeError {
    pub fn malformed(msg: impl std::fmt::Display) -> Self {
        TreeError::MalformedFragment(msg.to_string())
    }

    pub fn invalid_path(pattern: &str, reason: &'static str) -> Self {
        TreeError::InvalidPath {
            pattern: pattern.to_owned(),
            reason,
        }
    }
}

impl std::error::Error for TreeError {}
