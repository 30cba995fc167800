//! alfabeto CLI: play the literacy game in a terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "alfabeto", version, about = "Literacy practice game for the terminal")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the game
    Play {
        /// Play offline from a local exercise set instead of the API
        #[arg(long)]
        exercises: Option<PathBuf>,

        /// Level to start on
        #[arg(long, default_value = "1")]
        level: u32,
    },

    /// Show the leaderboard
    Ranking,

    /// Sign in and store the token in the config file
    Login {
        #[arg(long)]
        username: String,

        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account
    Register {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Validate an exercise set or answer-table file
    Validate {
        /// Exercise set TOML file
        #[arg(long, required_unless_present = "answers")]
        exercises: Option<PathBuf>,

        /// Answer-table TOML file
        #[arg(long)]
        answers: Option<PathBuf>,
    },

    /// Create starter config and example exercise set
    Init,
}

#[tokio::main]
async fn main() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "alfabeto=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Play { exercises, level } => {
            commands::play::execute(config, exercises, level).await
        }
        Commands::Ranking => commands::ranking::execute(config).await,
        Commands::Login { username, password } => {
            commands::auth::login(config, username, password).await
        }
        Commands::Register {
            username,
            email,
            password,
        } => commands::auth::register(config, username, email, password).await,
        Commands::Validate { exercises, answers } => {
            commands::validate::execute(config, exercises, answers)
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
