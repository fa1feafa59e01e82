//! chalkboard - Whiteboard Teaching AI terminal client
//!
//! Terminal UI for asking questions and watching explanations and
//! animations converge as the backend generates them.

mod app;
mod player;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chalkboard_core::{ApiClient, Config};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::App;

#[derive(Parser, Debug)]
#[command(name = "chalkboard")]
#[command(about = "Whiteboard Teaching AI - Terminal UI")]
#[command(version)]
struct Args {
    /// Open this session directly instead of the home view
    #[arg(long)]
    session: Option<String>,

    /// Override the backend API base URL from the config file
    #[arg(long)]
    base_url: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(base_url) = args.base_url {
        config.api.base_url = base_url;
    }
    config.validate().context("invalid configuration")?;

    // Initialize logging (to file, not stdout since we have a TUI)
    let _log_guard =
        chalkboard_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("chalkboard TUI starting up");

    // The render loop is synchronous; all network work runs on this runtime
    let runtime = tokio::runtime::Runtime::new().context("failed to create async runtime")?;

    let client =
        Arc::new(ApiClient::new(&config.api).context("failed to create API client")?);

    let mut app = App::new(runtime.handle().clone(), client, config.poll.interval());
    app.load_recent_sessions();
    if let Some(session_id) = &args.session {
        app.open_session(session_id, None);
    }

    // Setup terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    // Stop polling before the runtime is torn down
    drop(app);

    // Restore terminal
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;

    tracing::info!("chalkboard TUI shutting down");

    result
}

/// Run the main application loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Async results, aggregator snapshots, playback advancement
        app.tick();

        // Render
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    Ok(())
}
