//! The `alfabeto init` command.

use std::path::Path;

use anyhow::Result;

const SAMPLE_CONFIG: &str = r#"# alfabeto configuration

[api]
base_url = "http://localhost:8000"
# Filled in by `alfabeto login`, or taken from the environment.
token = "${ALFABETO_TOKEN}"
timeout_secs = 30

[game]
max_level = 4
points_per_correct = 10
feedback_delay_ms = 1500
reset_score_on_restart = false
# answer_tables = "respostas.toml"
"#;

const EXAMPLE_EXERCISE_SET: &str = include_str!("../../data/basico.toml");

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("alfabeto.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("exercise-sets")?;
    write_if_missing(Path::new("exercise-sets/basico.toml"), EXAMPLE_EXERCISE_SET)?;

    println!("\nNext steps:");
    println!("  1. Edit alfabeto.toml with your API address");
    println!("  2. Run: alfabeto validate --exercises exercise-sets/basico.toml");
    println!("  3. Run: alfabeto play --exercises exercise-sets/basico.toml");
    println!("     or: alfabeto login --username <nome> && alfabeto play");

    Ok(())
}
