//! Answer evaluation.
//!
//! [`AnswerEvaluator`] dispatches on [`ExerciseKind`] to an [`AnswerRule`].
//! A rule either gives a verdict from the answer tables or defers, in which
//! case the exercise's own accepted answers decide by exact match. Unknown
//! kinds always take the exact-match path, so evaluation never fails.
//! Table lookups by prompt ignore accents; answers never do, unless the
//! accepted set spells the word both ways.

use std::collections::HashMap;
use std::sync::Arc;

use crate::answers::AnswerTables;
use crate::model::{Exercise, ExerciseKind};
use crate::normalize::{comparison_key, matches_any, normalize_answer, syllable_fragments};

/// Placeholder character in letter pattern prompts such as `"_OLA"`.
pub const PLACEHOLDER: char = '_';

/// Blank-span marker in sentence prompts such as `"Eu vejo um ___."`.
pub const BLANK_MARKER: &str = "___";

/// Kind-specific answer rule.
pub trait AnswerRule: Send + Sync {
    /// Short rule name for logs.
    fn name(&self) -> &str;

    /// Judge a normalized, non-empty `answer`.
    ///
    /// Returns `None` when the rule has nothing to say about this prompt;
    /// the evaluator then falls back to the exercise's accepted answers.
    fn judge(&self, exercise: &Exercise, answer: &str, tables: &AnswerTables) -> Option<bool>;
}

/// Letters: plain, placeholder patterns, or sequence continuation.
pub struct LetterRule;

impl AnswerRule for LetterRule {
    fn name(&self) -> &str {
        "letter"
    }

    fn judge(&self, exercise: &Exercise, answer: &str, tables: &AnswerTables) -> Option<bool> {
        let prompt = exercise.prompt();
        if prompt.contains(PLACEHOLDER) {
            return tables
                .pattern_words(prompt)
                .map(|words| matches_any(words, answer));
        }
        if prompt.contains(',') {
            return next_in_sequence(prompt).map(|next| answer == next.to_string());
        }
        None
    }
}

/// Syllables: fragments to word via the syllable table, never concatenation.
pub struct SyllableRule;

impl AnswerRule for SyllableRule {
    fn name(&self) -> &str {
        "syllable"
    }

    fn judge(&self, exercise: &Exercise, answer: &str, tables: &AnswerTables) -> Option<bool> {
        let fragments = syllable_fragments(exercise.prompt());
        if fragments.len() < 2 {
            return None;
        }
        tables
            .syllable_word(&fragments)
            .map(|word| matches_any([word], answer))
    }
}

/// Words: synonym sets for questions, literal phrases for statements.
pub struct WordRule;

impl AnswerRule for WordRule {
    fn name(&self) -> &str {
        "word"
    }

    fn judge(&self, exercise: &Exercise, answer: &str, tables: &AnswerTables) -> Option<bool> {
        let prompt = exercise.prompt();
        let candidates = if is_question(prompt) {
            tables.question_answers(prompt)
        } else {
            tables.phrase_answers(prompt)
        };
        candidates.map(|words| matches_any(words, answer))
    }
}

/// Sentences: the blank's category word list, by set membership.
pub struct SentenceRule;

impl AnswerRule for SentenceRule {
    fn name(&self) -> &str {
        "sentence"
    }

    fn judge(&self, exercise: &Exercise, answer: &str, tables: &AnswerTables) -> Option<bool> {
        let prompt = exercise.prompt();
        if !prompt.contains(BLANK_MARKER) {
            return None;
        }
        tables
            .blank_answers(prompt)
            .map(|words| matches_any(words, answer))
    }
}

/// Table-driven answer evaluator.
#[derive(Clone)]
pub struct AnswerEvaluator {
    tables: Arc<AnswerTables>,
    rules: HashMap<ExerciseKind, Arc<dyn AnswerRule>>,
}

impl AnswerEvaluator {
    /// Evaluator with the four standard rules over `tables`.
    pub fn new(tables: AnswerTables) -> Self {
        let mut evaluator = Self {
            tables: Arc::new(tables),
            rules: HashMap::new(),
        };
        evaluator.register_rule(ExerciseKind::Letter, Arc::new(LetterRule));
        evaluator.register_rule(ExerciseKind::Syllable, Arc::new(SyllableRule));
        evaluator.register_rule(ExerciseKind::Word, Arc::new(WordRule));
        evaluator.register_rule(ExerciseKind::Sentence, Arc::new(SentenceRule));
        evaluator
    }

    /// Evaluator over the built-in answer tables.
    pub fn with_builtin_tables() -> anyhow::Result<Self> {
        Ok(Self::new(AnswerTables::builtin()?))
    }

    /// Install or replace the rule for `kind`.
    pub fn register_rule(&mut self, kind: ExerciseKind, rule: Arc<dyn AnswerRule>) {
        self.rules.insert(kind, rule);
    }

    pub fn tables(&self) -> &AnswerTables {
        &self.tables
    }

    /// Returns `true` iff `raw_answer` is a correct answer to `exercise`.
    pub fn evaluate(&self, exercise: &Exercise, raw_answer: &str) -> bool {
        let answer = normalize_answer(raw_answer);
        if answer.is_empty() {
            return false;
        }

        let verdict = self
            .rules
            .get(exercise.kind())
            .and_then(|rule| {
                let verdict = rule.judge(exercise, &answer, &self.tables);
                if verdict.is_none() {
                    tracing::trace!(
                        rule = rule.name(),
                        exercise = exercise.id(),
                        "no table entry, using accepted answers"
                    );
                }
                verdict
            });

        verdict.unwrap_or_else(|| matches_any(exercise.accepted_answers(), &answer))
    }
}

impl std::fmt::Debug for AnswerEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<String> = self.rules.keys().map(|k| k.to_string()).collect();
        kinds.sort();
        f.debug_struct("AnswerEvaluator")
            .field("rules", &kinds)
            .field("table_entries", &self.tables.entry_count())
            .finish()
    }
}

fn is_question(prompt: &str) -> bool {
    let trimmed = prompt.trim();
    trimmed.ends_with('?') || trimmed.starts_with('¿')
}

/// The letter that continues a comma-separated letter sequence.
///
/// `"A, B, C, D, E..."` continues with `F`; `"A, C, E"` with `G`. Returns
/// `None` when the prompt is not a letter sequence or would run past `Z`.
fn next_in_sequence(prompt: &str) -> Option<char> {
    let letters: Vec<char> = prompt
        .split(',')
        .map(|token| comparison_key(token.trim_end_matches(['.', '…'])))
        .filter(|token| !token.is_empty())
        .map(|token| {
            let mut chars = token.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_uppercase() => Some(c),
                _ => None,
            }
        })
        .collect::<Option<Vec<_>>>()?;

    let last = *letters.last()?;
    let step = match letters.len() {
        0 | 1 => 1,
        n => last as i32 - letters[n - 2] as i32,
    };
    if step <= 0 {
        return None;
    }
    let next = last as i32 + step;
    (next <= 'Z' as i32).then(|| char::from(next as u8))
}
