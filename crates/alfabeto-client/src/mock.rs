//! In-memory game API for tests and offline demos.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use alfabeto_core::leaderboard::{Leaderboard, LeaderboardEntry};
use alfabeto_core::model::{Exercise, ExerciseSet};
use alfabeto_core::traits::{ExerciseProvider, ScoreSink};

/// Serves exercises from an [`ExerciseSet`] and records submitted scores.
///
/// Failures and per-call submit latency can be injected to exercise the
/// session's error paths.
pub struct InMemoryApi {
    set: ExerciseSet,
    username: String,
    ranking: Mutex<Vec<LeaderboardEntry>>,
    submitted: Mutex<Vec<u64>>,
    submit_delays: Mutex<VecDeque<Duration>>,
    fail_fetch: AtomicBool,
    fail_submit: AtomicBool,
    fetch_count: AtomicU32,
}

impl InMemoryApi {
    pub fn new(set: ExerciseSet) -> Self {
        Self {
            set,
            username: "aluno".to_string(),
            ranking: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            submit_delays: Mutex::new(VecDeque::new()),
            fail_fetch: AtomicBool::new(false),
            fail_submit: AtomicBool::new(false),
            fetch_count: AtomicU32::new(0),
        }
    }

    /// Name under which submitted scores appear in the ranking.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_ranking(self, ranking: Vec<LeaderboardEntry>) -> Self {
        *self.ranking.lock().unwrap_or_else(|e| e.into_inner()) = ranking;
        self
    }

    /// Delay the next submits by the given durations, one per call.
    pub fn with_submit_delays(self, delays: impl IntoIterator<Item = Duration>) -> Self {
        self.submit_delays
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(delays);
        self
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_submit(&self, fail: bool) {
        self.fail_submit.store(fail, Ordering::SeqCst);
    }

    /// Scores in the order their submits completed.
    pub fn submitted_scores(&self) -> Vec<u64> {
        self.submitted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ExerciseProvider for InMemoryApi {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_level(&self, level: u32) -> anyhow::Result<Vec<Exercise>> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);
        if self.fail_fetch.load(Ordering::SeqCst) {
            anyhow::bail!("exercise service unavailable");
        }
        Ok(self.set.level(level).to_vec())
    }
}

#[async_trait]
impl ScoreSink for InMemoryApi {
    async fn submit_score(&self, total: u64) -> anyhow::Result<()> {
        let delay = self
            .submit_delays
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_submit.load(Ordering::SeqCst) {
            anyhow::bail!("score service unavailable");
        }

        self.submitted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(total);

        let mut ranking = self.ranking.lock().unwrap_or_else(|e| e.into_inner());
        match ranking.iter_mut().find(|e| e.username == self.username) {
            Some(entry) => entry.total_score = total,
            None => ranking.push(LeaderboardEntry {
                username: self.username.clone(),
                total_score: total,
            }),
        }
        Ok(())
    }

    async fn fetch_leaderboard(&self) -> anyhow::Result<Leaderboard> {
        let ranking = self
            .ranking
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        Ok(Leaderboard::new(ranking))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alfabeto_core::model::ExerciseKind;

    fn set() -> ExerciseSet {
        let mut set = ExerciseSet {
            id: "memoria".into(),
            ..Default::default()
        };
        set.levels.insert(
            1,
            vec![Exercise::new("a", ExerciseKind::Letter, "A").unwrap()],
        );
        set
    }

    #[tokio::test]
    async fn serves_levels_and_counts_fetches() {
        let api = InMemoryApi::new(set());
        assert_eq!(api.fetch_level(1).await.unwrap().len(), 1);
        assert!(api.fetch_level(2).await.unwrap().is_empty());
        assert_eq!(api.fetch_count(), 2);

        api.set_fail_fetch(true);
        assert!(api.fetch_level(1).await.is_err());
    }

    #[tokio::test]
    async fn submits_update_ranking() {
        let api = InMemoryApi::new(set())
            .with_username("ana")
            .with_ranking(vec![LeaderboardEntry {
                username: "bia".into(),
                total_score: 30,
            }]);

        api.submit_score(10).await.unwrap();
        api.submit_score(40).await.unwrap();
        assert_eq!(api.submitted_scores(), vec![10, 40]);

        let board = api.fetch_leaderboard().await.unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board.rank_of("ana"), Some(1));
    }

    #[tokio::test]
    async fn failing_submit_records_nothing() {
        let api = InMemoryApi::new(set());
        api.set_fail_submit(true);
        assert!(api.submit_score(10).await.is_err());
        assert!(api.submitted_scores().is_empty());
    }
}
