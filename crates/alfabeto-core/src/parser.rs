//! TOML exercise set parser.
//!
//! Loads locally defined exercise sets for offline play and checks them
//! against the answer tables.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::answers::AnswerTables;
use crate::evaluator::{BLANK_MARKER, PLACEHOLDER};
use crate::model::{Exercise, ExerciseKind, ExerciseRecord, ExerciseSet};
use crate::normalize::syllable_fragments;

#[derive(Debug, Deserialize)]
struct TomlExerciseFile {
    exercise_set: TomlSetHeader,
    #[serde(default)]
    levels: Vec<TomlLevel>,
}

#[derive(Debug, Deserialize)]
struct TomlSetHeader {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlLevel {
    number: u32,
    #[serde(default)]
    exercises: Vec<ExerciseRecord>,
}

/// Parse an exercise set file.
pub fn parse_exercise_set(path: &Path) -> Result<ExerciseSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exercise set: {}", path.display()))?;

    parse_exercise_set_str(&content, path)
}

/// Parse exercise set TOML. `source_path` is only used in error messages.
pub fn parse_exercise_set_str(content: &str, source_path: &Path) -> Result<ExerciseSet> {
    let parsed: TomlExerciseFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    if parsed.exercise_set.id.trim().is_empty() {
        anyhow::bail!("exercise set id is empty: {}", source_path.display());
    }

    let mut levels = BTreeMap::new();
    for level in parsed.levels {
        if level.number == 0 {
            anyhow::bail!("level numbers start at 1: {}", source_path.display());
        }
        let exercises = level
            .exercises
            .into_iter()
            .map(|record| {
                let id = record.id.clone();
                Exercise::try_from(record)
                    .with_context(|| format!("level {}, exercise '{id}'", level.number))
            })
            .collect::<Result<Vec<_>>>()?;

        if levels.insert(level.number, exercises).is_some() {
            anyhow::bail!(
                "level {} is defined more than once: {}",
                level.number,
                source_path.display()
            );
        }
    }

    let name = if parsed.exercise_set.name.is_empty() {
        parsed.exercise_set.id.clone()
    } else {
        parsed.exercise_set.name
    };

    Ok(ExerciseSet {
        id: parsed.exercise_set.id,
        name,
        description: parsed.exercise_set.description,
        levels,
    })
}

/// A warning from exercise set validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// Level the warning refers to, if any.
    pub level: Option<u32>,
    /// Exercise the warning refers to, if any.
    pub exercise_id: Option<String>,
    pub message: String,
}

impl ValidationWarning {
    fn set(message: impl Into<String>) -> Self {
        Self {
            level: None,
            exercise_id: None,
            message: message.into(),
        }
    }

    fn level(level: u32, message: impl Into<String>) -> Self {
        Self {
            level: Some(level),
            exercise_id: None,
            message: message.into(),
        }
    }

    fn exercise(level: u32, exercise: &Exercise, message: impl Into<String>) -> Self {
        Self {
            level: Some(level),
            exercise_id: Some(exercise.id().to_string()),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.level, &self.exercise_id) {
            (Some(level), Some(id)) => write!(f, "level {level}, {id}: {}", self.message),
            (Some(level), None) => write!(f, "level {level}: {}", self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// Check an exercise set for problems that would make it unplayable or
/// make answers fall back to exact matching unexpectedly.
pub fn validate_exercise_set(
    set: &ExerciseSet,
    tables: &AnswerTables,
    max_level: u32,
) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if set.levels.is_empty() {
        warnings.push(ValidationWarning::set("exercise set defines no levels"));
    }

    for level in 1..=max_level {
        if !set.levels.contains_key(&level) {
            warnings.push(ValidationWarning::level(
                level,
                "level is missing and will be skipped",
            ));
        }
    }

    let mut seen_ids = HashSet::new();
    for (&level, exercises) in &set.levels {
        if level > max_level {
            warnings.push(ValidationWarning::level(
                level,
                format!("level is beyond the final level {max_level} and will never be played"),
            ));
        }
        if exercises.is_empty() {
            warnings.push(ValidationWarning::level(
                level,
                "level has no exercises and will be skipped",
            ));
        }

        for exercise in exercises {
            if !seen_ids.insert(exercise.id()) {
                warnings.push(ValidationWarning::exercise(
                    level,
                    exercise,
                    format!("duplicate exercise id: {}", exercise.id()),
                ));
            }
            if let Some(message) = check_exercise(exercise, tables) {
                warnings.push(ValidationWarning::exercise(level, exercise, message));
            }
        }
    }

    warnings
}

fn check_exercise(exercise: &Exercise, tables: &AnswerTables) -> Option<String> {
    let prompt = exercise.prompt();
    match exercise.kind() {
        ExerciseKind::Letter if prompt.contains(PLACEHOLDER) => tables
            .pattern_words(prompt)
            .is_none()
            .then(|| format!("no pattern table entry for '{prompt}'")),
        ExerciseKind::Syllable => {
            let fragments = syllable_fragments(prompt);
            if fragments.len() < 2 {
                None
            } else {
                tables
                    .syllable_word(&fragments)
                    .is_none()
                    .then(|| format!("no syllable table entry for '{prompt}'"))
            }
        }
        ExerciseKind::Sentence if !prompt.contains(BLANK_MARKER) => Some(format!(
            "sentence prompt has no '{BLANK_MARKER}' blank and only its accepted answers will match"
        )),
        ExerciseKind::Sentence => match tables.blank_category(prompt) {
            None => Some(format!("no blank category for '{prompt}'")),
            Some(category) if tables.category_words(category).is_none() => {
                Some(format!("blank category '{category}' has no words"))
            }
            Some(_) => None,
        },
        ExerciseKind::Other(kind) => Some(format!(
            "unknown exercise kind '{kind}', answers must match exactly"
        )),
        _ => None,
    }
}
