//! Configuration loading and client factory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use alfabeto_core::answers::AnswerTables;
use alfabeto_core::session::GameConfig;

use crate::http::{HttpApiClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

pub const LOCAL_CONFIG_FILE: &str = "alfabeto.toml";

/// `[api]` section.
///
/// Note: Custom Debug impl masks the token to keep it out of logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token from `alfabeto login`.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSettings")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("username", &self.username)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            username: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// `[game]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSettings {
    #[serde(default = "default_max_level")]
    pub max_level: u32,
    #[serde(default = "default_points")]
    pub points_per_correct: u64,
    /// How long correct-answer feedback is shown, in milliseconds.
    #[serde(default = "default_feedback_delay")]
    pub feedback_delay_ms: u64,
    #[serde(default)]
    pub reset_score_on_restart: bool,
    #[serde(default)]
    pub initial_score: u64,
    /// Extra answer tables merged over the built-in ones.
    #[serde(default)]
    pub answer_tables: Option<PathBuf>,
}

fn default_max_level() -> u32 {
    alfabeto_core::progress::DEFAULT_MAX_LEVEL
}
fn default_points() -> u64 {
    alfabeto_core::progress::DEFAULT_POINTS_PER_CORRECT
}
fn default_feedback_delay() -> u64 {
    1500
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            max_level: default_max_level(),
            points_per_correct: default_points(),
            feedback_delay_ms: default_feedback_delay(),
            reset_score_on_restart: false,
            initial_score: 0,
            answer_tables: None,
        }
    }
}

impl GameSettings {
    /// Session configuration starting at `start_level`.
    pub fn game_config(&self, start_level: u32) -> GameConfig {
        GameConfig {
            max_level: self.max_level,
            start_level,
            points_per_correct: self.points_per_correct,
            feedback_delay: Duration::from_millis(self.feedback_delay_ms),
            reset_score_on_restart: self.reset_score_on_restart,
            initial_score: self.initial_score,
        }
    }

    /// Built-in answer tables, with the configured file merged on top.
    pub fn answer_tables(&self) -> Result<AnswerTables> {
        let mut tables = AnswerTables::builtin()?;
        if let Some(path) = &self.answer_tables {
            tables.merge(AnswerTables::load(path)?);
        }
        Ok(tables)
    }
}

/// Top-level alfabeto configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlfabetoConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub game: GameSettings,
}

/// Replace `${VAR_NAME}` references with environment values. Unset
/// variables resolve to the empty string.
fn resolve_env_vars(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let name = &rest[start + 2..start + len];
        out.push_str(&std::env::var(name).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    out
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `alfabeto.toml` in the current directory
/// 2. `~/.config/alfabeto/config.toml`
///
/// Environment variable overrides: `ALFABETO_API_URL`, `ALFABETO_TOKEN`,
/// `ALFABETO_USERNAME`.
pub fn load_config() -> Result<AlfabetoConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<AlfabetoConfig> {
    if let Some(p) = path {
        if !p.exists() {
            anyhow::bail!("config file not found: {}", p.display());
        }
    }

    let mut config = match find_config(path) {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            tracing::debug!("using config {}", path.display());
            toml::from_str::<AlfabetoConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => AlfabetoConfig::default(),
    };

    apply_overrides(&mut config, |name| std::env::var(name).ok());
    resolve_config_env(&mut config);
    Ok(config)
}

/// The config file in effect, if any.
pub fn find_config(path: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = path {
        return Some(p.to_path_buf());
    }
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }
    dirs_path()
        .map(|dir| dir.join("config.toml"))
        .filter(|global| global.exists())
}

fn apply_overrides(config: &mut AlfabetoConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("ALFABETO_API_URL") {
        config.api.base_url = url;
    }
    if let Some(token) = lookup("ALFABETO_TOKEN") {
        config.api.token = Some(token);
    }
    if let Some(username) = lookup("ALFABETO_USERNAME") {
        config.api.username = Some(username);
    }
}

fn resolve_config_env(config: &mut AlfabetoConfig) {
    config.api.base_url = resolve_env_vars(&config.api.base_url);
    config.api.token = config
        .api
        .token
        .as_deref()
        .map(resolve_env_vars)
        .filter(|t| !t.is_empty());
    config.api.username = config.api.username.as_deref().map(resolve_env_vars);
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("alfabeto"))
}

/// Write `username` and `token` into the `[api]` table of the config file
/// at `path`, keeping the rest of the file as it is. Creates the file if
/// needed.
pub fn store_credentials(path: &Path, username: &str, token: &str) -> Result<()> {
    let content = if path.exists() {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?
    } else {
        String::new()
    };
    let mut doc = content
        .parse::<toml_edit::DocumentMut>()
        .with_context(|| format!("failed to parse config: {}", path.display()))?;

    if !doc.contains_key("api") {
        doc["api"] = toml_edit::table();
    }
    let api = doc["api"]
        .as_table_mut()
        .context("[api] in config is not a table")?;
    api["username"] = toml_edit::value(username);
    api["token"] = toml_edit::value(token);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, doc.to_string())
        .with_context(|| format!("failed to update config: {}", path.display()))?;
    Ok(())
}

/// Build an API client from the `[api]` settings.
pub fn create_client(settings: &ApiSettings) -> Result<HttpApiClient> {
    HttpApiClient::new(
        &settings.base_url,
        settings.token.clone(),
        settings.timeout_secs,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_ALFABETO_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_ALFABETO_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_ALFABETO_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${_ALFABETO_UNSET_VAR}x"), "x");
        assert_eq!(resolve_env_vars("no ${closing"), "no ${closing");
        std::env::remove_var("_ALFABETO_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = AlfabetoConfig::default();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.game.max_level, 4);
        assert_eq!(config.game.points_per_correct, 10);
        assert_eq!(config.game.feedback_delay_ms, 1500);
        assert!(!config.game.reset_score_on_restart);
    }

    #[test]
    fn parse_partial_config() {
        let config: AlfabetoConfig = toml::from_str(
            r#"
[api]
base_url = "https://alfabeto.example"
token = "abc"

[game]
max_level = 2
feedback_delay_ms = 10
"#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://alfabeto.example");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.game.max_level, 2);
        assert_eq!(config.game.points_per_correct, 10);

        let game = config.game.game_config(2);
        assert_eq!(game.start_level, 2);
        assert_eq!(game.feedback_delay, Duration::from_millis(10));
    }

    #[test]
    fn env_overrides_win() {
        let mut config = AlfabetoConfig::default();
        apply_overrides(&mut config, |name| match name {
            "ALFABETO_API_URL" => Some("http://override".into()),
            "ALFABETO_TOKEN" => Some("env-token".into()),
            _ => None,
        });
        assert_eq!(config.api.base_url, "http://override");
        assert_eq!(config.api.token.as_deref(), Some("env-token"));
        assert!(config.api.username.is_none());
    }

    #[test]
    fn debug_masks_token() {
        let settings = ApiSettings {
            token: Some("super-secret".into()),
            ..Default::default()
        };
        let debug = format!("{settings:?}");
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[game]\nmax_level = 3\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.game.max_level, 3);

        let missing = dir.path().join("missing.toml");
        let err = load_config_from(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn store_credentials_keeps_other_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alfabeto.toml");
        std::fs::write(
            &path,
            "# my settings\n[api]\nbase_url = \"http://escola\"\n\n[game]\nmax_level = 2\n",
        )
        .unwrap();

        store_credentials(&path, "ana", "tok").unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# my settings"));

        let config: AlfabetoConfig = toml::from_str(&content).unwrap();
        assert_eq!(config.api.base_url, "http://escola");
        assert_eq!(config.api.token.as_deref(), Some("tok"));
        assert_eq!(config.api.username.as_deref(), Some("ana"));
        assert_eq!(config.game.max_level, 2);
    }

    #[test]
    fn store_credentials_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        store_credentials(&path, "bia", "t0k").unwrap();
        let config: AlfabetoConfig =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.api.token.as_deref(), Some("t0k"));
    }

    #[test]
    fn answer_tables_merge_configured_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.toml");
        std::fs::write(&path, "[questions]\n\"O que é um peixe?\" = [\"PEIXE\", \"ANIMAL\"]\n")
            .unwrap();

        let settings = GameSettings {
            answer_tables: Some(path),
            ..Default::default()
        };
        let tables = settings.answer_tables().unwrap();
        assert!(tables.question_answers("o que é um peixe?").is_some());
        assert!(tables.question_answers("O que é uma bola?").is_some());
    }

    #[test]
    fn create_client_from_settings() {
        let client = create_client(&ApiSettings::default()).unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert!(!client.has_token());
    }
}
