//! Core data model types for alfabeto.
//!
//! Exercises arrive from the API (or a local TOML set) as loose
//! [`ExerciseRecord`]s and are turned into validated, immutable
//! [`Exercise`] values before the game touches them.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ExerciseError;
use crate::normalize::{fold_accents, normalize_answer};

/// Kind of recognition exercise. Selects the answer rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExerciseKind {
    Letter,
    Syllable,
    Word,
    Sentence,
    /// Any kind this build does not know. Evaluated by exact match.
    Other(String),
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseKind::Letter => write!(f, "letter"),
            ExerciseKind::Syllable => write!(f, "syllable"),
            ExerciseKind::Word => write!(f, "word"),
            ExerciseKind::Sentence => write!(f, "sentence"),
            ExerciseKind::Other(name) => write!(f, "{name}"),
        }
    }
}

impl From<&str> for ExerciseKind {
    fn from(s: &str) -> Self {
        let key = fold_accents(&s.trim().to_lowercase());
        match key.as_str() {
            "letter" | "letra" => ExerciseKind::Letter,
            "syllable" | "silaba" => ExerciseKind::Syllable,
            "word" | "palavra" => ExerciseKind::Word,
            "sentence" | "frase" => ExerciseKind::Sentence,
            _ => ExerciseKind::Other(s.trim().to_string()),
        }
    }
}

impl From<String> for ExerciseKind {
    fn from(s: String) -> Self {
        ExerciseKind::from(s.as_str())
    }
}

impl From<ExerciseKind> for String {
    fn from(kind: ExerciseKind) -> Self {
        kind.to_string()
    }
}

impl FromStr for ExerciseKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ExerciseKind::from(s))
    }
}

/// One learning prompt. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exercise {
    id: String,
    kind: ExerciseKind,
    prompt: String,
    hint: Option<String>,
    accepted_answers: BTreeSet<String>,
}

impl Exercise {
    /// Build an exercise whose only accepted answer is its own prompt.
    pub fn new(
        id: impl Into<String>,
        kind: ExerciseKind,
        prompt: impl Into<String>,
    ) -> Result<Self, ExerciseError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ExerciseError::EmptyId);
        }
        let prompt = prompt.into();
        let accepted = normalized_set([prompt.as_str()]);
        if accepted.is_empty() {
            return Err(ExerciseError::NoAcceptedAnswers { id });
        }
        Ok(Self {
            id,
            kind,
            prompt,
            hint: None,
            accepted_answers: accepted,
        })
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        let hint = hint.into();
        self.hint = (!hint.trim().is_empty()).then_some(hint);
        self
    }

    /// Replace the accepted answers with an explicit list.
    pub fn with_accepted_answers<I, S>(mut self, answers: I) -> Result<Self, ExerciseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let accepted = normalized_set(answers);
        if accepted.is_empty() {
            return Err(ExerciseError::NoAcceptedAnswers { id: self.id });
        }
        self.accepted_answers = accepted;
        Ok(self)
    }

    /// Validate a wire record.
    pub fn from_record(record: ExerciseRecord) -> Result<Self, ExerciseError> {
        let exercise = Exercise::new(record.id, record.kind, record.content)?;
        let exercise = match record.hint {
            Some(hint) => exercise.with_hint(hint),
            None => exercise,
        };
        if record.accepted_answers.is_empty() {
            Ok(exercise)
        } else {
            exercise.with_accepted_answers(record.accepted_answers)
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &ExerciseKind {
        &self.kind
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Normalized accepted answers. Never empty.
    pub fn accepted_answers(&self) -> &BTreeSet<String> {
        &self.accepted_answers
    }
}

fn normalized_set<I, S>(answers: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    answers
        .into_iter()
        .map(|a| normalize_answer(a.as_ref()))
        .filter(|a| !a.is_empty())
        .collect()
}

/// Exercise as it appears on the wire or in a TOML exercise set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseRecord {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(alias = "tipo")]
    pub kind: ExerciseKind,
    #[serde(alias = "conteudo", alias = "prompt")]
    pub content: String,
    #[serde(default, alias = "dica")]
    pub hint: Option<String>,
    #[serde(default, alias = "acceptedAnswers")]
    pub accepted_answers: Vec<String>,
}

impl TryFrom<ExerciseRecord> for Exercise {
    type Error = ExerciseError;

    fn try_from(record: ExerciseRecord) -> Result<Self, Self::Error> {
        Exercise::from_record(record)
    }
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// A locally defined collection of levels, used for offline play.
#[derive(Debug, Clone, Default)]
pub struct ExerciseSet {
    /// Unique identifier for this set.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    pub description: String,
    /// Exercises keyed by level number, in presentation order.
    pub levels: BTreeMap<u32, Vec<Exercise>>,
}

impl ExerciseSet {
    /// Exercises for `level`, empty if the level is not defined.
    pub fn level(&self, level: u32) -> &[Exercise] {
        self.levels.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn exercise_count(&self) -> usize {
        self.levels.values().map(Vec::len).sum()
    }
}
