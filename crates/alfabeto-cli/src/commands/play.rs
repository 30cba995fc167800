//! The `alfabeto play` command.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use alfabeto_client::config::{create_client, load_config_from};
use alfabeto_client::ApiError;
use alfabeto_core::model::{Exercise, ExerciseKind};
use alfabeto_core::parser::parse_exercise_set;
use alfabeto_core::progress::{GameState, Submission};
use alfabeto_core::traits::{ExerciseProvider, NoopScoreSink, ScoreSink};
use alfabeto_core::{AnswerEvaluator, GameSession, SessionError};

/// Practice resources listed after the final level.
const RESOURCES: &[(&str, &str, &str)] = &[
    (
        "Escola Games",
        "https://www.escolagames.com.br/",
        "Jogos educativos gratuitos",
    ),
    (
        "Smart Kids",
        "https://www.smartkids.com.br/",
        "Atividades educativas online",
    ),
    (
        "Portal do Professor",
        "http://portaldoprofessor.mec.gov.br/",
        "Recursos educacionais do MEC",
    ),
    (
        "CEALE",
        "http://www.ceale.fae.ufmg.br/jogosdealphabetizacao",
        "Jogos de Alfabetização",
    ),
    (
        "Nova Escola",
        "https://novaescola.org.br",
        "Atividades e planos de aula",
    ),
];

struct Input {
    lines: Lines<BufReader<Stdin>>,
}

impl Input {
    fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Next line, or `None` on end of input or a quit command.
    async fn next_line(&mut self) -> Result<Option<String>> {
        let line = self.lines.next_line().await?;
        Ok(line.filter(|l| !matches!(l.trim(), ":q" | "sair")))
    }
}

fn prompt(text: &str) -> Result<()> {
    print!("{text}");
    std::io::stdout().flush()?;
    Ok(())
}

pub async fn execute(
    config_path: Option<PathBuf>,
    exercises: Option<PathBuf>,
    level: u32,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let evaluator = Arc::new(AnswerEvaluator::new(config.game.answer_tables()?));

    let (provider, sink): (Arc<dyn ExerciseProvider>, Arc<dyn ScoreSink>) = match exercises {
        Some(path) => {
            let set = parse_exercise_set(&path)?;
            println!("Jogando offline: {}", set.name);
            let provider: Arc<dyn ExerciseProvider> = Arc::new(set);
            let sink: Arc<dyn ScoreSink> = Arc::new(NoopScoreSink);
            (provider, sink)
        }
        None => {
            if config.api.token.is_none() {
                anyhow::bail!(
                    "not signed in. Run `alfabeto login` or play offline with --exercises <file>"
                );
            }
            let client = Arc::new(create_client(&config.api)?);
            let provider: Arc<dyn ExerciseProvider> = client.clone();
            let sink: Arc<dyn ScoreSink> = client;
            (provider, sink)
        }
    };

    let username = config
        .api
        .username
        .clone()
        .unwrap_or_else(|| "aluno".to_string());

    let mut session = GameSession::new(provider, sink, evaluator, config.game.game_config(level))?;
    tracing::debug!(session_id = %session.id(), "session started");

    let mut input = Input::stdin();
    let result = play(&mut session, &mut input, &username).await;
    session.flush(Duration::from_secs(5)).await;
    session.shutdown();
    result
}

async fn play(session: &mut GameSession, input: &mut Input, username: &str) -> Result<()> {
    let mut shown = None;

    loop {
        if !session.snapshot().loaded {
            match session.reload().await {
                Ok(()) => {}
                Err(e) if is_worth_retrying(&e) => {
                    println!(
                        "Não foi possível carregar as atividades: {:#}",
                        anyhow::Error::from(e)
                    );
                    prompt("Pressione Enter para tentar de novo (:q para sair) ")?;
                    if input.next_line().await?.is_none() {
                        return Ok(());
                    }
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        let snap = session.snapshot();
        match snap.state {
            GameState::AwaitingAnswer | GameState::ShowingFeedback { .. } => {
                let Some(exercise) = snap.exercise else {
                    anyhow::bail!("no exercise to show at level {}", snap.level);
                };
                let position = (snap.level, snap.exercise_index);
                if shown != Some(position) {
                    println!();
                    println!(
                        "Nível {} | Pontos: {} | Atividade {}/{}",
                        snap.level,
                        snap.score,
                        snap.exercise_index + 1,
                        snap.exercise_count
                    );
                    show_exercise(&exercise);
                    shown = Some(position);
                }

                prompt("> ")?;
                let Some(answer) = input.next_line().await? else {
                    println!("\nAté logo! Pontuação: {}", snap.score);
                    return Ok(());
                };
                if answer.trim().is_empty() {
                    continue;
                }

                match session.submit(&answer).await? {
                    Submission::Correct { score, .. } => {
                        println!("Muito bem! 🎉 (pontos: {score})");
                        session.wait_for_feedback().await;
                    }
                    Submission::Retry => {
                        println!("Tente novamente! 💪");
                        session.dismiss_feedback();
                    }
                }
            }
            GameState::LevelComplete { level } => {
                println!();
                println!("⭐ Parabéns, {username}! Você completou o nível {level}!");
                prompt("Pressione Enter para continuar ")?;
                if input.next_line().await?.is_none() {
                    return Ok(());
                }
                advance_after(session.continue_level().await)?;
            }
            GameState::GameComplete => {
                show_game_complete(username, snap.score);
                prompt("Jogar de novo? (s/n) ")?;
                match input.next_line().await? {
                    Some(answer) if answer.trim().eq_ignore_ascii_case("s") => {
                        shown = None;
                        advance_after(session.restart().await)?;
                    }
                    _ => return Ok(()),
                }
            }
        }
    }
}

/// Load failures after a transition are retried at the top of the loop.
fn advance_after(result: Result<(), SessionError>) -> Result<()> {
    match result {
        Err(e) if !is_worth_retrying(&e) => Err(e.into()),
        _ => Ok(()),
    }
}

/// A load failure the API will keep returning (expired token, bad body)
/// ends the game instead of prompting for a retry.
fn is_worth_retrying(e: &SessionError) -> bool {
    let permanent = match e {
        SessionError::Load { source, .. } => source
            .downcast_ref::<ApiError>()
            .is_some_and(ApiError::is_permanent),
        _ => false,
    };
    e.is_retryable() && !permanent
}

fn show_exercise(exercise: &Exercise) {
    let question = match exercise.kind() {
        ExerciseKind::Letter => "Que letra é esta?",
        ExerciseKind::Syllable => "Que palavra estas sílabas formam?",
        ExerciseKind::Word => "Responda:",
        ExerciseKind::Sentence => "Complete a frase:",
        ExerciseKind::Other(_) => "Escreva a resposta:",
    };
    println!("{question}");
    println!("  {}", exercise.prompt());
    if let Some(hint) = exercise.hint() {
        println!("  Dica: {hint}");
    }
}

fn show_game_complete(username: &str, score: u64) {
    println!();
    println!("🎉 Parabéns, {username}! 🎉");
    println!("Você completou todos os níveis! Pontuação final: {score}");
    println!("Continue praticando com estes recursos:");
    for (name, url, description) in RESOURCES {
        println!("  - {name}: {description} ({url})");
    }
    println!("Lembre-se: a prática leva à perfeição! Continue estudando com ajuda de um adulto.");
}
