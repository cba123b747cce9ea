//! Error type for registration and parsing.
//!
//! None of these ever reach an end user: registration failures are logged by
//! the engine and the affected effect is simply not created.

use thiserror::Error;

use crate::element::ElementId;
use crate::scope::ScopeId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChoreoError {
    /// A trigger, effector, follower or looper named an element that is not in the arena.
    #[error("element {0:?} is not registered")]
    MissingTarget(ElementId),

    /// The scope was already reverted; the operation was ignored.
    #[error("scope {0} has been reverted")]
    ScopeReverted(ScopeId),

    #[error("scope {0} was never opened")]
    UnknownScope(ScopeId),

    #[error("unknown easing identifier `{0}`")]
    UnknownEasing(String),

    #[error("invalid trigger threshold `{0}`")]
    InvalidThreshold(String),

    #[error("invalid timeline position `{0}`")]
    InvalidPosition(String),
}

pub type Result<T> = std::result::Result<T, ChoreoError>;
