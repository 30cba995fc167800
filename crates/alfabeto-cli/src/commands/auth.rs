//! The `alfabeto login` and `alfabeto register` commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use alfabeto_client::config::{
    create_client, find_config, load_config_from, store_credentials, LOCAL_CONFIG_FILE,
};

/// Use the given password, or read one line from stdin.
async fn password_or_stdin(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    eprint!("Senha: ");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("failed to read password")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    anyhow::ensure!(!password.is_empty(), "password must not be empty");
    Ok(password)
}

pub async fn login(
    config_path: Option<PathBuf>,
    username: String,
    password: Option<String>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let password = password_or_stdin(password).await?;
    let client = create_client(&config.api)?;

    let token = client
        .login(&username, &password)
        .await
        .context("login failed")?;

    let target = find_config(config_path.as_deref())
        .unwrap_or_else(|| Path::new(LOCAL_CONFIG_FILE).to_path_buf());
    store_credentials(&target, &username, &token)?;
    println!("Bem-vindo, {username}! Token salvo em {}", target.display());
    Ok(())
}

pub async fn register(
    config_path: Option<PathBuf>,
    username: String,
    email: String,
    password: Option<String>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let password = password_or_stdin(password).await?;
    let client = create_client(&config.api)?;

    client
        .register(&username, &email, &password)
        .await
        .context("registration failed")?;
    println!("Conta criada para {username}. Agora rode: alfabeto login --username {username}");
    Ok(())
}
