//! Error types for the core crate.
//!
//! Each seam gets its own enum so callers can match on what went wrong
//! without string inspection.

use thiserror::Error;

use crate::progress::GameState;

/// Errors raised while building an [`Exercise`](crate::model::Exercise).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExerciseError {
    /// The exercise has no usable accepted answer.
    #[error("exercise '{id}' has no accepted answers")]
    NoAcceptedAnswers { id: String },

    /// The exercise identifier is blank.
    #[error("exercise id must not be empty")]
    EmptyId,
}

/// Illegal moves on the progression state machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgressError {
    /// The requested action is not allowed from the current state.
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: GameState,
    },

    /// A level outside 1..=max_level was requested.
    #[error("level {level} is outside 1..={max_level}")]
    LevelOutOfRange { level: u32, max_level: u32 },
}

/// Errors surfaced by a [`GameSession`](crate::session::GameSession).
#[derive(Debug, Error)]
pub enum SessionError {
    /// The exercise list for a level could not be loaded. Recoverable:
    /// call `reload` to try again.
    #[error("failed to load exercises for level {level}")]
    Load {
        level: u32,
        #[source]
        source: anyhow::Error,
    },

    /// There is no exercise to answer (level not loaded or already done).
    #[error("no active exercise")]
    NoActiveExercise,

    /// The session has been shut down.
    #[error("session has been shut down")]
    Closed,

    #[error(transparent)]
    Progress(#[from] ProgressError),
}

impl SessionError {
    /// Returns `true` if retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::Load { .. })
    }
}
