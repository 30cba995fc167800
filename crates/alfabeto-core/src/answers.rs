//! Answer lookup tables.
//!
//! The evaluator never hardcodes words. Pattern words, syllable spellings,
//! question synonyms, declarative phrases and blank categories all live in
//! [`AnswerTables`], which is loaded from TOML. A Portuguese table ships with
//! the crate; deployments can merge their own file on top of it.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::normalize::{comparison_key, fold_accents, normalize_answer, syllable_fragments};

const BUILTIN_TABLES: &str = include_str!("../data/answers.toml");

/// On-disk shape of an answer-table file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerTableFile {
    /// Placeholder pattern (e.g. `"_OLA"`) to the words it admits.
    #[serde(default)]
    pub patterns: BTreeMap<String, Vec<String>>,
    /// Fragments joined by `+` (e.g. `"CA+SA"`) to the word they spell.
    #[serde(default)]
    pub syllables: BTreeMap<String, String>,
    /// Question text to its synonym set.
    #[serde(default)]
    pub questions: BTreeMap<String, Vec<String>>,
    /// Declarative prompt to the literal phrases accepted for it.
    #[serde(default)]
    pub phrases: BTreeMap<String, Vec<String>>,
    /// Sentence prompt with a blank to the category name of the blank.
    #[serde(default)]
    pub blanks: BTreeMap<String, String>,
    /// Category name to its word list.
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
}

/// Normalized, lookup-ready answer tables.
#[derive(Debug, Clone, Default)]
pub struct AnswerTables {
    patterns: HashMap<String, Vec<String>>,
    syllables: HashMap<String, String>,
    questions: HashMap<String, Vec<String>>,
    phrases: HashMap<String, Vec<String>>,
    blanks: HashMap<String, String>,
    categories: HashMap<String, Vec<String>>,
}

impl AnswerTables {
    /// The tables bundled with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_TABLES).context("failed to parse built-in answer tables")
    }

    /// Parse a TOML answer-table document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: AnswerTableFile = toml::from_str(content)?;
        Ok(Self::from_file(file))
    }

    /// Load a TOML answer-table file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read answer tables: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("failed to parse answer tables: {}", path.display()))
    }

    pub fn from_file(file: AnswerTableFile) -> Self {
        let mut tables = Self::default();
        for (pattern, words) in file.patterns {
            tables.insert_pattern(&pattern, words);
        }
        for (fragments, word) in file.syllables {
            tables.insert_syllable(&fragments, &word);
        }
        for (question, answers) in file.questions {
            tables.insert_question(&question, answers);
        }
        for (prompt, phrases) in file.phrases {
            tables.insert_phrase(&prompt, phrases);
        }
        for (prompt, category) in file.blanks {
            tables.insert_blank(&prompt, &category);
        }
        for (category, words) in file.categories {
            tables.insert_category(&category, words);
        }
        tables
    }

    /// Entries in `other` replace entries with the same key in `self`.
    pub fn merge(&mut self, other: AnswerTables) {
        self.patterns.extend(other.patterns);
        self.syllables.extend(other.syllables);
        self.questions.extend(other.questions);
        self.phrases.extend(other.phrases);
        self.blanks.extend(other.blanks);
        self.categories.extend(other.categories);
    }

    pub fn insert_pattern<I, S>(&mut self, pattern: &str, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.patterns
            .insert(comparison_key(pattern), normalize_all(words));
    }

    pub fn insert_syllable(&mut self, fragments: &str, word: &str) {
        self.syllables
            .insert(syllable_key(&syllable_fragments(fragments)), normalize_answer(word));
    }

    pub fn insert_question<I, S>(&mut self, question: &str, answers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.questions
            .insert(comparison_key(question), normalize_all(answers));
    }

    pub fn insert_phrase<I, S>(&mut self, prompt: &str, phrases: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.phrases
            .insert(comparison_key(prompt), normalize_all(phrases));
    }

    pub fn insert_blank(&mut self, prompt: &str, category: &str) {
        self.blanks
            .insert(comparison_key(prompt), category_key(category));
    }

    pub fn insert_category<I, S>(&mut self, category: &str, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.categories
            .insert(category_key(category), normalize_all(words));
    }

    /// Words admitted by a placeholder pattern prompt.
    pub fn pattern_words(&self, prompt: &str) -> Option<&[String]> {
        self.patterns
            .get(&comparison_key(prompt))
            .map(Vec::as_slice)
    }

    /// The word spelled by a list of syllable fragments.
    pub fn syllable_word(&self, fragments: &[String]) -> Option<&str> {
        self.syllables
            .get(&syllable_key(fragments))
            .map(String::as_str)
    }

    pub fn question_answers(&self, question: &str) -> Option<&[String]> {
        self.questions
            .get(&comparison_key(question))
            .map(Vec::as_slice)
    }

    pub fn phrase_answers(&self, prompt: &str) -> Option<&[String]> {
        self.phrases
            .get(&comparison_key(prompt))
            .map(Vec::as_slice)
    }

    /// Category name for the blank in a sentence prompt.
    pub fn blank_category(&self, prompt: &str) -> Option<&str> {
        self.blanks
            .get(&comparison_key(prompt))
            .map(String::as_str)
    }

    pub fn category_words(&self, category: &str) -> Option<&[String]> {
        self.categories
            .get(&category_key(category))
            .map(Vec::as_slice)
    }

    /// Words that fill the blank of `prompt`, resolved through its category.
    pub fn blank_answers(&self, prompt: &str) -> Option<&[String]> {
        self.blank_category(prompt)
            .and_then(|category| self.category_words(category))
    }

    /// Total number of keyed entries across all tables.
    pub fn entry_count(&self) -> usize {
        self.patterns.len()
            + self.syllables.len()
            + self.questions.len()
            + self.phrases.len()
            + self.blanks.len()
            + self.categories.len()
    }

    /// Consistency problems that would make some lookups silently fail.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        for (prompt, category) in &self.blanks {
            if !self.categories.contains_key(category) {
                warnings.push(format!(
                    "blank '{prompt}' refers to unknown category '{category}'"
                ));
            }
        }
        for (key, word) in &self.syllables {
            if key.split('+').count() < 2 {
                warnings.push(format!(
                    "syllable entry '{key}' -> '{word}' has fewer than two fragments"
                ));
            }
        }
        for (name, table) in [
            ("pattern", &self.patterns),
            ("question", &self.questions),
            ("phrase", &self.phrases),
            ("category", &self.categories),
        ] {
            for (key, words) in table {
                if words.is_empty() {
                    warnings.push(format!("{name} '{key}' has no answers"));
                }
            }
        }
        for key in self.patterns.keys() {
            if !key.contains('_') {
                warnings.push(format!("pattern '{key}' has no '_' placeholder"));
            }
        }

        warnings.sort();
        warnings
    }
}

fn normalize_all<I, S>(words: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    words
        .into_iter()
        .map(|w| normalize_answer(w.as_ref()))
        .filter(|w| !w.is_empty())
        .collect()
}

fn syllable_key(fragments: &[String]) -> String {
    fragments
        .iter()
        .map(|f| comparison_key(f))
        .collect::<Vec<_>>()
        .join("+")
}

fn category_key(category: &str) -> String {
    fold_accents(&category.trim().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_parse_and_are_consistent() {
        let tables = AnswerTables::builtin().unwrap();
        assert!(tables.entry_count() > 0);
        assert!(tables.validate().is_empty(), "{:?}", tables.validate());
    }

    #[test]
    fn lookups_ignore_case_accents_and_spacing() {
        let tables = AnswerTables::builtin().unwrap();
        assert!(tables.question_answers("o que e uma  BOLA?").is_some());
        assert!(tables.pattern_words("_ola").is_some());
        assert_eq!(tables.blank_category("Eu vejo um ___."), Some("animal"));
        let fragments = syllable_fragments("ca e sa");
        assert_eq!(tables.syllable_word(&fragments), Some("CASA"));
    }

    #[test]
    fn syllable_lookup_keeps_orthography() {
        let tables = AnswerTables::builtin().unwrap();
        let fragments = syllable_fragments("CO e RA e ÇÃO");
        assert_eq!(tables.syllable_word(&fragments), Some("CORAÇÃO"));
    }

    #[test]
    fn blank_answers_resolve_through_category() {
        let tables = AnswerTables::builtin().unwrap();
        let animals = tables.blank_answers("Eu vejo um ___.").unwrap();
        assert!(animals.iter().any(|w| w == "GATO"));
        assert!(tables.blank_answers("Sem lacuna").is_none());
    }

    #[test]
    fn merge_overrides_existing_entries() {
        let mut tables = AnswerTables::builtin().unwrap();
        let extra = AnswerTables::from_toml_str(
            r#"
[questions]
"O que é uma bola?" = ["ESFERA"]

[blanks]
"Eu vi uma ___." = "cor"

[categories]
cor = ["azul", "verde"]
"#,
        )
        .unwrap();
        tables.merge(extra);
        assert_eq!(
            tables.question_answers("O que é uma bola?").unwrap(),
            ["ESFERA".to_string()]
        );
        assert!(tables.blank_answers("Eu vi uma ___.").is_some());
        assert!(tables.pattern_words("_OLA").is_some());
    }

    #[test]
    fn validate_reports_dangling_category_and_short_syllables() {
        let mut tables = AnswerTables::default();
        tables.insert_blank("Eu vi um ___.", "planeta");
        tables.insert_syllable("PÃO", "PÃO");
        tables.insert_pattern("BOLA", ["BOLA"]);
        let warnings = tables.validate();
        assert_eq!(warnings.len(), 3, "{warnings:?}");
        assert!(warnings.iter().any(|w| w.contains("unknown category 'planeta'")));
        assert!(warnings.iter().any(|w| w.contains("fewer than two fragments")));
        assert!(warnings.iter().any(|w| w.contains("no '_' placeholder")));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.toml");
        std::fs::write(&path, "[syllables]\n\"LU+A\" = \"LUA\"\n").unwrap();
        let tables = AnswerTables::load(&path).unwrap();
        let fragments = syllable_fragments("LU e A");
        assert_eq!(tables.syllable_word(&fragments), Some("LUA"));

        assert!(AnswerTables::load(&dir.path().join("missing.toml")).is_err());
    }
}
