//! The `alfabeto ranking` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use alfabeto_client::config::{create_client, load_config_from};
use alfabeto_core::leaderboard::Leaderboard;

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let client = create_client(&config.api)?;
    let board = client.fetch_ranking().await?;

    if board.is_empty() {
        println!("Nenhuma pontuação registrada ainda.");
        return Ok(());
    }

    println!("🏆 Ranking dos Jogadores");
    println!("{}", render(&board, config.api.username.as_deref()));

    if let Some(rank) = config
        .api
        .username
        .as_deref()
        .and_then(|name| board.rank_of(name))
    {
        println!("Sua posição: {rank}º");
    }
    Ok(())
}

fn render(board: &Leaderboard, current_user: Option<&str>) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "Jogador", "Pontos"]);

    for ranked in board.ranked() {
        let name = if Some(ranked.entry.username.as_str()) == current_user {
            format!("{} (você)", ranked.entry.username)
        } else {
            ranked.entry.username.clone()
        };
        table.add_row(vec![
            Cell::new(format!("{}º", ranked.rank)),
            Cell::new(name),
            Cell::new(ranked.entry.total_score),
        ]);
    }
    table
}
