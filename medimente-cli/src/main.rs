use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use medimente_core::types::InteractionState;
use medimente_engine::engine::MedimenteEngine;
use medimente_engine::traits::{FileRef, Narrator};
use medimente_runtime::config_store::ConfigStore;
use medimente_runtime::defaults::default_config_path;
use medimente_runtime::output::{ConsoleNarrator, PrintLinkOpener};
use medimente_runtime::runtime_engine::build_engine_from_config;
use medimente_runtime::secrets::{
    API_KEY_ENV_VARS, SecretKey, delete_secret, resolve_api_key, set_secret,
};
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "medimente")]
#[command(about = "Turn medical instructions into a reminder table, calendar links and a short story")]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Photo or PDF of the prescription to transcribe first
    #[arg(long)]
    file: Option<PathBuf>,

    /// Instructions text; read from stdin when neither --text nor --file is given
    #[arg(long)]
    text: Option<String>,

    /// Print a calendar link for every medication
    #[arg(long)]
    calendar: bool,

    /// Narrate the story
    #[arg(long)]
    narrate: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the Gemini API key in the OS keyring
    SetKey { key: String },
    /// Remove the stored Gemini API key
    DeleteKey,
    /// Print the effective configuration
    ShowConfig,
}

fn init_logging() {
    // `log` records from the library crates are bridged into this subscriber.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();

    let store = ConfigStore::at_path(cli.config.clone().unwrap_or_else(default_config_path));

    match cli.command {
        Some(Commands::SetKey { key }) => {
            set_secret(SecretKey::GeminiApiKey, key.trim())?;
            let mut cfg = store.load_or_default()?;
            cfg.api_key_present = true;
            store.save(&cfg)?;
            println!("API key saved.");
            return Ok(ExitCode::SUCCESS);
        }
        Some(Commands::DeleteKey) => {
            delete_secret(SecretKey::GeminiApiKey)?;
            let mut cfg = store.load_or_default()?;
            cfg.api_key_present = false;
            store.save(&cfg)?;
            println!("API key removed.");
            return Ok(ExitCode::SUCCESS);
        }
        Some(Commands::ShowConfig) => {
            let cfg = store.load_or_default()?;
            println!("# {}", store.path().display());
            println!("{}", serde_json::to_string_pretty(&cfg)?);
            return Ok(ExitCode::SUCCESS);
        }
        None => {}
    }

    let cfg = store.load_or_default()?;
    let Some(api_key) = resolve_api_key()? else {
        eprintln!(
            "No Gemini API key found. Set {} or run `medimente set-key <KEY>`.",
            API_KEY_ENV_VARS.join(" / ")
        );
        return Ok(ExitCode::FAILURE);
    };

    let narrator: Arc<dyn Narrator> = Arc::new(ConsoleNarrator::stdout());
    let mut engine = build_engine_from_config(
        &cfg,
        api_key,
        Some(narrator),
        Arc::new(PrintLinkOpener::stdout()),
    )?;
    tracing::info!(model = %cfg.model, "engine ready");

    if let Some(path) = cli.file.clone() {
        engine.upload(FileRef::new(path)).await;
        if let Some(err) = engine.controller().error() {
            eprintln!("{err}");
            return Ok(ExitCode::FAILURE);
        }
        println!("--- Testo trascritto ---");
        println!("{}\n", engine.controller().medical_text());
    }

    if let Some(text) = cli.text.clone() {
        engine.set_text(text).await;
    } else if cli.file.is_none() {
        let mut input = String::new();
        tokio::io::stdin()
            .read_to_string(&mut input)
            .await
            .context("read instructions from stdin")?;
        engine.set_text(input).await;
    }

    engine.generate().await;
    Ok(render(&mut engine, cli.calendar, cli.narrate).await)
}

async fn render(engine: &mut MedimenteEngine, calendar: bool, narrate: bool) -> ExitCode {
    if engine.controller().state() != InteractionState::Success {
        if let Some(err) = engine.controller().error() {
            eprintln!("{err}");
        }
        return ExitCode::FAILURE;
    }

    let Some(output) = engine.controller().output().cloned() else {
        return ExitCode::FAILURE;
    };

    println!("{}\n", output.summary_table.trim());

    if calendar {
        println!("--- Aggiungi al calendario ---");
        for (index, entry) in output.entries.iter().enumerate() {
            println!("{} ({}):", entry.medication, entry.important_time);
            engine.add_to_calendar(index).await;
        }
        println!();
    }

    println!("--- Storiella ---");
    if narrate {
        engine.toggle_narration().await;
        if let Some(err) = engine.controller().error() {
            eprintln!("{err}");
        }
    } else {
        println!("{}", output.gentle_story.trim());
    }

    ExitCode::SUCCESS
}
