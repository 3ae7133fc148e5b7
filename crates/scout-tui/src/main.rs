use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::{CrosstermBackend, Terminal};
use scout_core::{
    agent::AgentClient,
    history::HistoryStore,
    session::HistorySession,
    settings::{log_path, Settings},
};
use std::fs::{self, File};
use std::io::{stdout, Stdout};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
mod runner;
mod ui;
use ui::app::App;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let settings = match Settings::new() {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load settings, using defaults");
            eprintln!("Warning: Failed to load settings: {}. Using defaults.", e);
            Settings::default()
        }
    };

    let database_path = settings.database_path();
    let store = match HistoryStore::open(&database_path) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, path = %database_path.display(), "history store unavailable, keeping history in memory");
            HistoryStore::open_in_memory().context("failed to open in-memory history store")?
        }
    };
    let session = HistorySession::open(store, settings.history_limit);
    let client = AgentClient::new(&settings.api_url, &settings.assistant_id)
        .context("failed to build agent client")?;
    tracing::info!(api_url = client.api_url(), "starting domainscout");

    let mut terminal = init_terminal()?;
    let mut app = App::new(settings, session, client);

    let result = app.run(&mut terminal).await;

    restore_terminal(&mut terminal)?;

    result
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_logging() {
    let path = log_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = File::options().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(filter)
        .try_init();
}

fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
