//! Game session controller.
//!
//! A [`GameSession`] owns one learner's [`SessionProgress`], the exercises of
//! the current level, and the feedback timer. After a correct answer the
//! session holds in `ShowingFeedback(Correct)` for the configured delay and
//! then advances from a spawned task. The timer is a child of the session's
//! cancellation token: shutting down (or dropping) the session cancels it,
//! so a late timer never touches a torn-down session.
//!
//! Score persistence is fire-and-forget. Each call carries the total as a
//! value, so completions arriving out of order cannot roll the local score
//! back, and a failed call is only logged.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::SessionError;
use crate::evaluator::AnswerEvaluator;
use crate::leaderboard::Leaderboard;
use crate::model::Exercise;
use crate::progress::{
    Feedback, GameState, ProgressionResult, SessionProgress, Submission,
    DEFAULT_MAX_LEVEL, DEFAULT_POINTS_PER_CORRECT,
};
use crate::traits::{ExerciseProvider, ScoreSink};

/// Default time correct-answer feedback stays on screen.
pub const DEFAULT_FEEDBACK_DELAY: Duration = Duration::from_millis(1500);

/// Configuration for a game session.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Highest level; completing it ends the game.
    pub max_level: u32,
    /// Level the session starts on.
    pub start_level: u32,
    /// Points added per correct answer.
    pub points_per_correct: u64,
    /// How long correct-answer feedback is shown before advancing.
    pub feedback_delay: Duration,
    /// Whether restarting after the final level zeroes the score.
    pub reset_score_on_restart: bool,
    /// Score carried over from a previous session.
    pub initial_score: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_level: DEFAULT_MAX_LEVEL,
            start_level: 1,
            points_per_correct: DEFAULT_POINTS_PER_CORRECT,
            feedback_delay: DEFAULT_FEEDBACK_DELAY,
            reset_score_on_restart: false,
            initial_score: 0,
        }
    }
}

/// Point-in-time view of a session, published on every change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub level: u32,
    pub max_level: u32,
    pub exercise_index: usize,
    pub exercise_count: usize,
    pub score: u64,
    pub state: GameState,
    /// Exercise to show, if one is active.
    pub exercise: Option<Exercise>,
    /// Outcome of the most recent advance, if any.
    pub last_result: Option<ProgressionResult>,
    /// Whether the current level's exercises are loaded.
    pub loaded: bool,
}

struct SessionInner {
    progress: SessionProgress,
    exercises: Vec<Exercise>,
    loaded: bool,
    /// Bumped whenever a feedback timer is scheduled; a timer only applies
    /// if its generation is still current.
    generation: u64,
    last_result: Option<ProgressionResult>,
}

impl SessionInner {
    fn current_exercise(&self) -> Option<&Exercise> {
        if !self.loaded {
            return None;
        }
        match self.progress.state() {
            GameState::AwaitingAnswer | GameState::ShowingFeedback { .. } => {
                self.exercises.get(self.progress.exercise_index())
            }
            GameState::LevelComplete { .. } | GameState::GameComplete => None,
        }
    }

    fn snapshot(&self, session_id: Uuid) -> SessionSnapshot {
        SessionSnapshot {
            session_id,
            level: self.progress.level(),
            max_level: self.progress.max_level(),
            exercise_index: self.progress.exercise_index(),
            exercise_count: self.exercises.len(),
            score: self.progress.score(),
            state: self.progress.state(),
            exercise: self.current_exercise().cloned(),
            last_result: self.last_result,
            loaded: self.loaded,
        }
    }
}

fn lock(inner: &Mutex<SessionInner>) -> MutexGuard<'_, SessionInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to a scheduled feedback-then-advance transition.
struct FeedbackTimer {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl FeedbackTimer {
    fn cancel(self) {
        self.token.cancel();
        self.handle.abort();
    }
}

/// One learner's play session.
pub struct GameSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    config: GameConfig,
    evaluator: Arc<AnswerEvaluator>,
    provider: Arc<dyn ExerciseProvider>,
    sink: Arc<dyn ScoreSink>,
    inner: Arc<Mutex<SessionInner>>,
    updates: Arc<watch::Sender<SessionSnapshot>>,
    shutdown: CancellationToken,
    timer: Option<FeedbackTimer>,
    pending_scores: Vec<JoinHandle<()>>,
}

impl GameSession {
    /// Create a session without loading anything yet. Call
    /// [`reload`](Self::reload) to fetch the first level.
    pub fn new(
        provider: Arc<dyn ExerciseProvider>,
        sink: Arc<dyn ScoreSink>,
        evaluator: Arc<AnswerEvaluator>,
        config: GameConfig,
    ) -> Result<Self, SessionError> {
        let progress = SessionProgress::starting_at(
            config.max_level,
            config.start_level,
            config.initial_score,
        )?;
        let id = Uuid::new_v4();
        let inner = SessionInner {
            progress,
            exercises: Vec::new(),
            loaded: false,
            generation: 0,
            last_result: None,
        };
        let (updates, _) = watch::channel(inner.snapshot(id));

        Ok(Self {
            id,
            started_at: Utc::now(),
            config,
            evaluator,
            provider,
            sink,
            inner: Arc::new(Mutex::new(inner)),
            updates: Arc::new(updates),
            shutdown: CancellationToken::new(),
            timer: None,
            pending_scores: Vec::new(),
        })
    }

    /// Create a session and load its first level.
    pub async fn start(
        provider: Arc<dyn ExerciseProvider>,
        sink: Arc<dyn ScoreSink>,
        evaluator: Arc<AnswerEvaluator>,
        config: GameConfig,
    ) -> Result<Self, SessionError> {
        let mut session = Self::new(provider, sink, evaluator, config)?;
        session.reload().await?;
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        lock(&self.inner).snapshot(self.id)
    }

    /// Receiver that sees every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    pub fn current_exercise(&self) -> Option<Exercise> {
        lock(&self.inner).current_exercise().cloned()
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Load the current level if it is not loaded yet.
    ///
    /// This is the retry path after a [`SessionError::Load`]. An empty
    /// exercise list completes the level instead of failing.
    pub async fn reload(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        let level = {
            let inner = lock(&self.inner);
            if inner.loaded {
                return Ok(());
            }
            inner.progress.level()
        };

        debug!(session_id = %self.id, level, provider = self.provider.name(), "loading exercises");
        let exercises = self.provider.fetch_level(level).await.map_err(|source| {
            warn!(session_id = %self.id, level, "failed to load exercises: {source:#}");
            SessionError::Load { level, source }
        })?;

        {
            let mut inner = lock(&self.inner);
            inner.exercises = exercises;
            inner.loaded = true;
            if inner.exercises.is_empty() {
                info!(session_id = %self.id, level, "level has no exercises, treating it as complete");
                let result = inner.progress.skip_empty_level()?;
                inner.last_result = Some(result);
            } else {
                info!(
                    session_id = %self.id,
                    level,
                    count = inner.exercises.len(),
                    "level loaded"
                );
            }
        }
        self.publish();
        Ok(())
    }

    /// Submit an answer for the active exercise.
    ///
    /// Must be called from within a Tokio runtime: a correct answer spawns
    /// the score persistence call and the feedback timer.
    pub async fn submit(&mut self, answer: &str) -> Result<Submission, SessionError> {
        self.ensure_open()?;
        let submission = {
            let mut inner = lock(&self.inner);
            let exercise = inner
                .current_exercise()
                .cloned()
                .ok_or(SessionError::NoActiveExercise)?;
            let submission = inner.progress.submit_answer(
                &self.evaluator,
                &exercise,
                answer,
                self.config.points_per_correct,
            )?;
            debug!(
                session_id = %self.id,
                exercise = exercise.id(),
                correct = submission.is_correct(),
                "answer submitted"
            );
            submission
        };

        if let Submission::Correct { score, .. } = submission {
            self.persist_score(score);
            self.schedule_advance();
        }
        self.publish();
        Ok(submission)
    }

    /// Dismiss retry feedback.
    pub fn dismiss_feedback(&mut self) {
        lock(&self.inner).progress.clear_feedback();
        self.publish();
    }

    /// Wait until correct-answer feedback is over (or the session closes).
    pub async fn wait_for_feedback(&self) {
        let mut updates = self.subscribe();
        tokio::select! {
            _ = self.shutdown.cancelled() => {}
            _ = updates.wait_for(|s| {
                s.state != GameState::ShowingFeedback { feedback: Feedback::Correct }
            }) => {}
        }
    }

    /// Move from the level-complete interstitial to the next level.
    pub async fn continue_level(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        {
            let mut inner = lock(&self.inner);
            let level = inner.progress.continue_to_next_level()?;
            inner.exercises.clear();
            inner.loaded = false;
            inner.last_result = None;
            info!(session_id = %self.id, level, "continuing to next level");
        }
        self.publish();
        self.reload().await
    }

    /// Start again at level 1 after completing the game.
    pub async fn restart(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        {
            let mut inner = lock(&self.inner);
            inner.progress.restart(self.config.reset_score_on_restart)?;
            inner.exercises.clear();
            inner.loaded = false;
            inner.last_result = None;
            info!(
                session_id = %self.id,
                score = inner.progress.score(),
                "restarting game"
            );
        }
        self.publish();
        self.reload().await
    }

    /// Current leaderboard from the score sink.
    pub async fn leaderboard(&self) -> anyhow::Result<Leaderboard> {
        self.sink.fetch_leaderboard().await
    }

    /// Wait up to `timeout` for in-flight score submissions. Returns the
    /// number still running when the wait ended.
    pub async fn flush(&mut self, timeout: Duration) -> usize {
        let pending = std::mem::take(&mut self.pending_scores);
        let mut remaining = pending.len();
        let wait = async {
            for handle in pending {
                let _ = handle.await;
                remaining -= 1;
            }
        };
        if tokio::time::timeout(timeout, wait).await.is_err() {
            warn!(session_id = %self.id, remaining, "gave up waiting for score submissions");
        }
        remaining
    }

    /// Tear the session down. Pending feedback transitions are cancelled.
    pub fn shutdown(&mut self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        self.shutdown.cancel();
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        let played_secs = (Utc::now() - self.started_at).num_seconds();
        info!(session_id = %self.id, played_secs, "session closed");
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.shutdown.is_cancelled() {
            Err(SessionError::Closed)
        } else {
            Ok(())
        }
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.updates.send_replace(snapshot);
    }

    fn persist_score(&mut self, score: u64) {
        let sink = Arc::clone(&self.sink);
        let session_id = self.id;
        self.pending_scores.retain(|handle| !handle.is_finished());
        self.pending_scores.push(tokio::spawn(async move {
            match sink.submit_score(score).await {
                Ok(()) => debug!(%session_id, score, "score persisted"),
                Err(e) => warn!(%session_id, score, "failed to persist score: {e:#}"),
            }
        }));
    }

    fn schedule_advance(&mut self) {
        if let Some(previous) = self.timer.take() {
            previous.cancel();
        }

        let generation = {
            let mut inner = lock(&self.inner);
            inner.generation += 1;
            inner.generation
        };
        let token = self.shutdown.child_token();
        let task_token = token.clone();
        let inner = Arc::clone(&self.inner);
        let updates = Arc::clone(&self.updates);
        let delay = self.config.feedback_delay;
        let session_id = self.id;

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => {
                    debug!(%session_id, "feedback timer cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    apply_feedback_timeout(&inner, &updates, session_id, generation, &task_token);
                }
            }
        });

        self.timer = Some(FeedbackTimer { token, handle });
    }
}

fn apply_feedback_timeout(
    inner: &Mutex<SessionInner>,
    updates: &watch::Sender<SessionSnapshot>,
    session_id: Uuid,
    generation: u64,
    token: &CancellationToken,
) {
    let mut guard = lock(inner);
    if token.is_cancelled() || guard.generation != generation {
        return;
    }
    let level_len = guard.exercises.len();
    match guard.progress.advance(level_len) {
        Ok(result) => {
            debug!(%session_id, ?result, "feedback over");
            guard.last_result = Some(result);
            let snapshot = guard.snapshot(session_id);
            drop(guard);
            updates.send_replace(snapshot);
        }
        Err(e) => warn!(%session_id, "feedback timer fired in unexpected state: {e}"),
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}
