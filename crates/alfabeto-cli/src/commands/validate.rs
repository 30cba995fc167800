//! The `alfabeto validate` command.

use std::path::PathBuf;

use anyhow::Result;

use alfabeto_client::config::load_config_from;
use alfabeto_core::answers::AnswerTables;
use alfabeto_core::parser::{parse_exercise_set, validate_exercise_set};

pub fn execute(
    config_path: Option<PathBuf>,
    exercises: Option<PathBuf>,
    answers: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let mut total_warnings = 0;

    let mut tables = config.game.answer_tables()?;
    if let Some(path) = &answers {
        let file_tables = AnswerTables::load(path)?;
        println!(
            "Answer tables: {} ({} entries)",
            path.display(),
            file_tables.entry_count()
        );
        let warnings = file_tables.validate();
        for w in &warnings {
            println!("   WARNING: {w}");
        }
        total_warnings += warnings.len();
        tables.merge(file_tables);
    }

    if let Some(path) = &exercises {
        let set = parse_exercise_set(path)?;
        println!(
            "Exercise set: {} ({} levels, {} exercises)",
            set.name,
            set.levels.len(),
            set.exercise_count()
        );

        let warnings = validate_exercise_set(&set, &tables, config.game.max_level);
        for w in &warnings {
            let prefix = w
                .exercise_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            let location = w
                .level
                .map(|level| format!(" level {level}:"))
                .unwrap_or_default();
            println!("{prefix} WARNING:{location} {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All files valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
