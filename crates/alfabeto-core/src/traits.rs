//! Collaborator traits: where exercises come from and where score goes.
//!
//! Implemented over HTTP by the `alfabeto-client` crate; [`ExerciseSet`]
//! and [`NoopScoreSink`] cover offline play.

use async_trait::async_trait;

use crate::leaderboard::Leaderboard;
use crate::model::{Exercise, ExerciseSet};

/// Supplies the ordered exercise list for a level.
#[async_trait]
pub trait ExerciseProvider: Send + Sync {
    /// Human-readable provider name (e.g. "http").
    fn name(&self) -> &str;

    /// Exercises for `level`, in presentation order. An empty list means
    /// the level has nothing left to play.
    async fn fetch_level(&self, level: u32) -> anyhow::Result<Vec<Exercise>>;
}

/// Persists cumulative score and serves the leaderboard.
#[async_trait]
pub trait ScoreSink: Send + Sync {
    /// Store `total` as the learner's new cumulative score.
    async fn submit_score(&self, total: u64) -> anyhow::Result<()>;

    /// Current leaderboard, in the order the sink ranks it.
    async fn fetch_leaderboard(&self) -> anyhow::Result<Leaderboard>;
}

#[async_trait]
impl ExerciseProvider for ExerciseSet {
    fn name(&self) -> &str {
        &self.id
    }

    async fn fetch_level(&self, level: u32) -> anyhow::Result<Vec<Exercise>> {
        Ok(self.level(level).to_vec())
    }
}

/// Score sink that keeps nothing. Used when playing offline.
pub struct NoopScoreSink;

#[async_trait]
impl ScoreSink for NoopScoreSink {
    async fn submit_score(&self, _: u64) -> anyhow::Result<()> {
        Ok(())
    }

    async fn fetch_leaderboard(&self) -> anyhow::Result<Leaderboard> {
        Ok(Leaderboard::default())
    }
}
