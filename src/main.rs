//! voxbridge operator CLI.
//!
//! Two offline-friendly subcommands for working on a deployment without
//! a browser in the loop: `mint` exercises the token endpoint, `replay`
//! runs a captured side-channel event log through the reconciliation
//! engine and prints what the presentation surface would show.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use voxbridge::engine::breakdown::BreakdownView;
use voxbridge::{Config, Reconciler, TokenBroker};

#[derive(Parser)]
#[command(name = "voxbridge", version, about = "Live voice translation session tooling")]
struct Cli {
    /// Path to a TOML config file (~ expanded).
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mint a session token from the configured token endpoint.
    Mint {
        /// Target language for the session.
        #[arg(long)]
        language: Option<String>,
        /// Request a verbose (breakdown-enabled) session.
        #[arg(long)]
        verbose: bool,
        /// Override the token endpoint URL.
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Replay a captured event log (one JSON event per line) through the
    /// reconciliation engine.
    Replay {
        /// Path to the JSONL capture.
        file: String,
        /// Render breakdown events.
        #[arg(long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Mint {
            language,
            verbose,
            endpoint,
        } => {
            let endpoint = endpoint.unwrap_or_else(|| config.resolved_token_endpoint());
            let language = language.unwrap_or_else(|| config.language.clone());
            let broker = TokenBroker::new(endpoint);
            let token = broker.mint(&language, verbose || config.verbose).await?;
            println!("{token}");
        }

        Command::Replay { file, verbose } => {
            let raw = tokio::fs::read_to_string(&file).await?;
            let mut engine = Reconciler::new(verbose || config.verbose);
            for line in raw.lines().filter(|l| !l.trim().is_empty()) {
                engine.apply(line);
            }
            print_view(&engine);
        }
    }

    Ok(())
}

fn print_view(engine: &Reconciler) {
    let view = engine.view();
    match &view.input_label {
        Some(label) => println!("you ({label}): {}", view.user_transcript),
        None => println!("you: {}", view.user_transcript),
    }
    println!("agent: {}", view.agent_transcript);

    match &view.breakdown {
        Some(BreakdownView::Structured(payload)) => {
            println!("breakdown: {} -> {}", payload.source, payload.target);
            for word in &payload.words {
                println!("  {} -> {} ({})", word.source, word.target, word.gloss);
            }
        }
        Some(BreakdownView::Text(text)) => println!("breakdown: {text}"),
        None => {}
    }
}
