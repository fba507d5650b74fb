use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use rag_on_tap_core::{ChatBackend, Config, OsRandom, RagClient, SessionId, WelcomeState};

mod app;
mod handler;
mod logging;
mod markdown;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "rag-on-tap")]
#[command(version, about = "Terminal chat client for the RAG-on-Tap beer and brewing assistant")]
struct Cli {
    /// Base URL of the RAG backend (overrides config and RAG_ON_TAP_URL)
    #[arg(short, long)]
    url: Option<String>,
    /// Model name shown in the header badge
    #[arg(long)]
    model_label: Option<String>,
    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log file to use instead of the default location
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Show the welcome screen again
    #[arg(long)]
    reset_welcome: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = logging::init(cli.log_file)?;

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::get_config_path()?,
    };
    let mut config = Config::load_from(&config_path).unwrap_or_else(|err| {
        tracing::warn!(%err, path = %config_path.display(), "ignoring unreadable config");
        Config::new()
    });
    config.apply_env();
    if let Some(url) = cli.url {
        config.api_base_url = url;
    }
    if let Some(label) = cli.model_label {
        config.model_label = label;
    }
    if cli.reset_welcome {
        config.welcome = WelcomeState::Unseen;
    }

    tracing::info!(
        backend = %config.api_base_url,
        log = %log_path.display(),
        "configuration loaded"
    );

    let client = RagClient::with_connect_timeout(
        &config.api_base_url,
        Duration::from_secs(config.connect_timeout_secs),
    )?;
    let backend: Arc<dyn ChatBackend> = Arc::new(client);
    let session_id = SessionId::generate(&mut OsRandom);
    tracing::info!(session = %session_id, "session started");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let mut app = App::new(&config, Some(config_path), backend, session_id, events.sender());
    app.probe_health();

    let result = run(&mut terminal, &mut app, &mut events).await;

    app.shutdown().await;
    tui::restore()?;

    if let Err(err) = &result {
        tracing::error!(%err, "exiting with error");
    }
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}
