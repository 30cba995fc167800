//! Per-learner progression state.
//!
//! [`SessionProgress`] is a plain value: level, position, score and the
//! current [`GameState`]. Every mutation goes through a method that checks
//! the transition is legal, so the state machine cannot be driven into an
//! impossible position (double scoring, skipped exercises, score going down).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProgressError;
use crate::evaluator::AnswerEvaluator;
use crate::model::Exercise;

/// Points awarded for a correct answer unless configured otherwise.
pub const DEFAULT_POINTS_PER_CORRECT: u64 = 10;

/// Number of levels unless configured otherwise.
pub const DEFAULT_MAX_LEVEL: u32 = 4;

/// Feedback shown after a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    Correct,
    Incorrect,
}

/// Where the learner is in the game loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GameState {
    AwaitingAnswer,
    ShowingFeedback { feedback: Feedback },
    LevelComplete { level: u32 },
    GameComplete,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameState::AwaitingAnswer => write!(f, "awaiting an answer"),
            GameState::ShowingFeedback {
                feedback: Feedback::Correct,
            } => write!(f, "showing correct-answer feedback"),
            GameState::ShowingFeedback {
                feedback: Feedback::Incorrect,
            } => write!(f, "showing retry feedback"),
            GameState::LevelComplete { level } => write!(f, "level {level} is complete"),
            GameState::GameComplete => write!(f, "the game is complete"),
        }
    }
}

/// Result of submitting an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Submission {
    /// Correct; `score` is the new total and must be persisted.
    Correct { awarded: u64, score: u64 },
    /// Incorrect; try the same exercise again.
    Retry,
}

impl Submission {
    pub fn is_correct(&self) -> bool {
        matches!(self, Submission::Correct { .. })
    }
}

/// What happened when the learner moved past an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ProgressionResult {
    NextExercise { level: u32, index: usize },
    LevelComplete { level: u32 },
    GameComplete,
}

/// Level, position and score of one learner's playthrough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProgress {
    level: u32,
    exercise_index: usize,
    score: u64,
    max_level: u32,
    state: GameState,
}

impl SessionProgress {
    /// Fresh progress: level 1, first exercise, no points.
    pub fn new(max_level: u32) -> Self {
        Self::resume(max_level, 0)
    }

    /// Level 1 with a score carried over from a persisted total.
    pub fn resume(max_level: u32, score: u64) -> Self {
        Self {
            level: 1,
            exercise_index: 0,
            score,
            max_level: max_level.max(1),
            state: GameState::AwaitingAnswer,
        }
    }

    /// Start at an arbitrary level, e.g. to replay a level.
    pub fn starting_at(max_level: u32, level: u32, score: u64) -> Result<Self, ProgressError> {
        let mut progress = Self::resume(max_level, score);
        if level == 0 || level > progress.max_level {
            return Err(ProgressError::LevelOutOfRange {
                level,
                max_level: progress.max_level,
            });
        }
        progress.level = level;
        Ok(progress)
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn exercise_index(&self) -> usize {
        self.exercise_index
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_final_level(&self) -> bool {
        self.level >= self.max_level
    }

    /// Evaluate `raw_answer` for `exercise` and record the outcome.
    ///
    /// A correct answer adds `award` to the score and moves to
    /// `ShowingFeedback(Correct)`; the position only changes when
    /// [`advance`](Self::advance) is called after the feedback delay.
    pub fn submit_answer(
        &mut self,
        evaluator: &AnswerEvaluator,
        exercise: &Exercise,
        raw_answer: &str,
        award: u64,
    ) -> Result<Submission, ProgressError> {
        self.ensure_accepting_answers("submit an answer")?;
        let correct = evaluator.evaluate(exercise, raw_answer);
        Ok(self.record_answer(correct, award))
    }

    /// Record an already evaluated answer.
    pub fn record(&mut self, correct: bool, award: u64) -> Result<Submission, ProgressError> {
        self.ensure_accepting_answers("submit an answer")?;
        Ok(self.record_answer(correct, award))
    }

    fn ensure_accepting_answers(&self, action: &'static str) -> Result<(), ProgressError> {
        match self.state {
            GameState::AwaitingAnswer
            | GameState::ShowingFeedback {
                feedback: Feedback::Incorrect,
            } => Ok(()),
            state => Err(ProgressError::InvalidTransition { action, state }),
        }
    }

    fn record_answer(&mut self, correct: bool, award: u64) -> Submission {
        if correct {
            self.score = self.score.saturating_add(award);
            self.state = GameState::ShowingFeedback {
                feedback: Feedback::Correct,
            };
            Submission::Correct {
                awarded: award,
                score: self.score,
            }
        } else {
            self.state = GameState::ShowingFeedback {
                feedback: Feedback::Incorrect,
            };
            Submission::Retry
        }
    }

    /// Dismiss retry feedback, e.g. when the learner starts typing again.
    pub fn clear_feedback(&mut self) {
        if self.state
            == (GameState::ShowingFeedback {
                feedback: Feedback::Incorrect,
            })
        {
            self.state = GameState::AwaitingAnswer;
        }
    }

    /// Move past a correctly answered exercise once feedback has been shown.
    pub fn advance(&mut self, level_len: usize) -> Result<ProgressionResult, ProgressError> {
        if self.state
            != (GameState::ShowingFeedback {
                feedback: Feedback::Correct,
            })
        {
            return Err(ProgressError::InvalidTransition {
                action: "advance",
                state: self.state,
            });
        }

        if self.exercise_index + 1 < level_len {
            self.exercise_index += 1;
            self.state = GameState::AwaitingAnswer;
            Ok(ProgressionResult::NextExercise {
                level: self.level,
                index: self.exercise_index,
            })
        } else {
            Ok(self.complete_level())
        }
    }

    /// Treat a level with no exercises as already completed.
    pub fn skip_empty_level(&mut self) -> Result<ProgressionResult, ProgressError> {
        if self.state != GameState::AwaitingAnswer {
            return Err(ProgressError::InvalidTransition {
                action: "skip an empty level",
                state: self.state,
            });
        }
        Ok(self.complete_level())
    }

    fn complete_level(&mut self) -> ProgressionResult {
        if self.is_final_level() {
            self.state = GameState::GameComplete;
            ProgressionResult::GameComplete
        } else {
            self.state = GameState::LevelComplete { level: self.level };
            ProgressionResult::LevelComplete { level: self.level }
        }
    }

    /// Leave the level-complete interstitial for the first exercise of the
    /// next level. Returns the new level.
    pub fn continue_to_next_level(&mut self) -> Result<u32, ProgressError> {
        match self.state {
            GameState::LevelComplete { .. } => {
                self.level += 1;
                self.exercise_index = 0;
                self.state = GameState::AwaitingAnswer;
                Ok(self.level)
            }
            state => Err(ProgressError::InvalidTransition {
                action: "continue to the next level",
                state,
            }),
        }
    }

    /// Start over at level 1 after finishing the game.
    ///
    /// The score is kept unless `reset_score` is set.
    pub fn restart(&mut self, reset_score: bool) -> Result<(), ProgressError> {
        if self.state != GameState::GameComplete {
            return Err(ProgressError::InvalidTransition {
                action: "restart",
                state: self.state,
            });
        }
        self.level = 1;
        self.exercise_index = 0;
        if reset_score {
            self.score = 0;
        }
        self.state = GameState::AwaitingAnswer;
        Ok(())
    }
}
