/// Build-time routing errors
///
/// Every variant is fatal to the build phase: a table that produced one of
/// these must never be used to serve requests.
use thiserror::Error;

use crate::MountKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// A source path or one of its segments does not follow the naming grammar
    #[error("invalid route name `{path}`: {reason}")]
    InvalidRouteName { path: String, reason: String },

    /// A `[name(constraint)]` segment carries a forbidden or unparsable constraint
    #[error("invalid constraint in segment `{segment}`: {reason}")]
    InvalidConstraint { segment: String, reason: String },

    /// A second `_error` entry was found
    #[error("duplicate error page `{second}` (already registered: `{first}`)")]
    DuplicateErrorPage { first: String, second: String },

    /// Two sources compile to matcher sequences that cannot be told apart
    #[error("{kind:?} route `{incoming}` collides with `{existing}`")]
    RouteCollision {
        kind: MountKind,
        existing: String,
        incoming: String,
    },
}

impl RouteError {
    pub(crate) fn invalid_name(path: &str, reason: impl Into<String>) -> Self {
        RouteError::InvalidRouteName {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_constraint(segment: &str, reason: impl Into<String>) -> Self {
        RouteError::InvalidConstraint {
            segment: segment.to_string(),
            reason: reason.into(),
        }
    }
}
