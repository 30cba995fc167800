//! alfabeto-core: answer evaluation, level progression and game sessions.
//!
//! This crate defines the exercise data model, the table-driven answer
//! evaluator, the per-learner progression state machine and the session
//! controller that ties them to an exercise provider and a score sink.

pub mod answers;
pub mod error;
pub mod evaluator;
pub mod leaderboard;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod progress;
pub mod session;
pub mod traits;

pub use answers::AnswerTables;
pub use error::{ExerciseError, ProgressError, SessionError};
pub use evaluator::{AnswerEvaluator, AnswerRule};
pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use model::{Exercise, ExerciseKind, ExerciseRecord, ExerciseSet};
pub use progress::{Feedback, GameState, ProgressionResult, SessionProgress, Submission};
pub use session::{GameConfig, GameSession, SessionSnapshot};
pub use traits::{ExerciseProvider, NoopScoreSink, ScoreSink};
