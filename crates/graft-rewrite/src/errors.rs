//! Error types for recipes, merges and runs.

use derive_more::Display;
use graft_tree::TreeError;

pub type RewriteResult<T> = Result<T, RewriteError>;

#[derive(Display, Debug)]
#[display("{kind}")]
pub struct RewriteError {
    kind: Box<RewriteErrorKind>,
}

impl<E> From<E> for RewriteError
where
    RewriteErrorKind: From<E>,
{
    fn from(error: E) -> Self {
        RewriteError {
            kind: Box::new(RewriteErrorKind::from(error)),
        }
    }
}

impl RewriteError {
    pub fn invalid_exclusion(exclusion: impl std::fmt::Display) -> Self {
        RewriteErrorKind::InvalidExclusionFormat(exclusion.to_string()).into()
    }

    pub fn not_stable(iterations: usize) -> Self {
        RewriteErrorKind::FixedPointNotStable { iterations }.into()
    }

    pub fn precondition(msg: impl std::fmt::Display) -> Self {
        RewriteErrorKind::PreconditionEvaluationFailure(msg.to_string()).into()
    }

    pub fn invalid_config(msg: impl std::fmt::Display) -> Self {
        RewriteErrorKind::InvalidConfig(msg.to_string()).into()
    }

    pub fn kind(&self) -> &RewriteErrorKind {
        &self.kind
    }

    /// Configuration errors abort a run before any document is touched;
    /// everything else is recovered per document.
    pub fn is_fatal(&self) -> bool {
        match &*self.kind {
            RewriteErrorKind::PreconditionEvaluationFailure(_)
            | RewriteErrorKind::InvalidConfig(_)
            | RewriteErrorKind::Tree(TreeError::InvalidPath { .. }) => true,
            RewriteErrorKind::Tree(TreeError::MalformedFragment(_))
            | RewriteErrorKind::InvalidExclusionFormat(_)
            | RewriteErrorKind::FixedPointNotStable { .. } => false,
        }
    }
}

#[derive(Display, Debug)]
pub enum RewriteErrorKind {
    #[display("{_0}")]
    Tree(TreeError),

    #[display("Invalid exclusion `{_0}`: expected `groupId:artifactId`")]
    InvalidExclusionFormat(String),

    #[display("Fixed point not reached after {iterations} iterations")]
    FixedPointNotStable { iterations: usize },

    #[display("Precondition evaluation failed: {_0}")]
    PreconditionEvaluationFailure(String),

    #[display("Invalid configuration: {_0}")]
    InvalidConfig(String),
}

impl From<TreeError> for RewriteErrorKind {
    fn from(error: TreeError) -> Self {
        RewriteErrorKind::Tree(error)
    }
}

impl From<serde_json::Error> for RewriteErrorKind {
    fn from(error: serde_json::Error) -> Self {
        RewriteErrorKind::InvalidConfig(error.to_string())
    }
}

impl std::error::Error for RewriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &*self.kind {
            RewriteErrorKind::Tree(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_fatal_errors() {
        assert!(RewriteError::precondition("bad glob").is_fatal());
        assert!(RewriteError::invalid_config("workers = 0").is_fatal());
        assert!(RewriteError::from(TreeError::invalid_path("a", "no slash")).is_fatal());
        assert!(!RewriteError::from(TreeError::malformed("x")).is_fatal());
        assert!(!RewriteError::invalid_exclusion("onlygroupid").is_fatal());
        assert!(!RewriteError::not_stable(10).is_fatal());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            RewriteError::invalid_exclusion("onlygroupid").to_string(),
            "Invalid exclusion `onlygroupid`: expected `groupId:artifactId`"
        );
        assert_eq!(
            RewriteError::not_stable(3).to_string(),
            "Fixed point not reached after 3 iterations"
        );
    }
}
