//! mindfulme - journal and ZenBot chat in the terminal
//!
//! A TUI client for the MindfulMe service.
//!
//! Features:
//! - Write journal entries and browse past ones
//! - Talk to ZenBot, the wellbeing chatbot
//! - Gruvbox, Nord and Transparent themes
//!
//! Usage: mindfulme [--url <URL>]

mod api;
mod app;
mod config;
mod event;
mod logging;
mod types;
mod ui;

use anyhow::{Context, Result};
use api::HttpClient;
use app::App;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use event::{AppEvent, EVENT_CHANNEL_SIZE};
use ratatui::prelude::*;
use std::io::{self, Stdout};
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse arguments
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    if args.iter().any(|a| a == "--version" || a == "-v") {
        println!("mindfulme {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let url_override = parse_url_arg(&args);

    if let Err(e) = run_app(url_override).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn print_help() {
    println!(
        r#"mindfulme - journal and ZenBot chat in the terminal

USAGE:
    mindfulme [OPTIONS]

OPTIONS:
    -u, --url <URL>  Service address for this run (default from config)
    -h, --help       Print help information
    -v, --version    Print version information

KEYBINDINGS:
    1-3, Tab         Switch tabs
    i / Enter        Start typing
    Esc              Stop typing
    Ctrl+S / s       Save journal entry
    r                Refresh journal entries
    j/k              Scroll
    q                Quit

TABS:
    [1] Journal      Write and browse entries
    [2] ZenBot       Chat with the bot
    [3] Settings     Theme and preview length

CONFIG:
    ~/.config/mindfulme/config.toml
"#
    );
}

/// Value of `--url <URL>`, `--url=<URL>` or `-u <URL>`
fn parse_url_arg(args: &[String]) -> Option<String> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if let Some(value) = arg.strip_prefix("--url=") {
            return Some(value.to_string());
        }
        if arg == "--url" || arg == "-u" {
            return iter.next().cloned();
        }
    }
    None
}

async fn run_app(url_override: Option<String>) -> Result<()> {
    let config = config::Config::load()
        .context("Failed to load configuration")?;

    let _log_guard = logging::init(&config.logging.level)
        .context("Failed to initialize logging")?;

    let server_url = url_override.unwrap_or_else(|| config.server.base_url.clone());
    let client = HttpClient::new(&server_url)
        .context("Failed to create HTTP client")?;
    let server_url = client.base_url().to_string();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), %server_url, "starting mindfulme");

    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
    let mut app = App::new(config, server_url, Arc::new(client), event_tx.clone());

    let mut terminal = setup_terminal()?;
    event::spawn_event_tasks(event_tx);

    // Journal is the default tab
    app.list();

    let result = main_loop(&mut terminal, &mut app, event_rx).await;

    // Restore terminal regardless of result
    restore_terminal()?;
    terminal.show_cursor().context("Failed to show cursor")?;

    tracing::info!("mindfulme exiting");
    result
}

/// Initialize the terminal for TUI rendering
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    // Restore the terminal before the default panic output
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to setup terminal")?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("Failed to create terminal")
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)
        .context("Failed to restore terminal")?;
    Ok(())
}

async fn main_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut events: mpsc::Receiver<AppEvent>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            ui::render(frame, app);
        })?;

        match events.recv().await {
            Some(event) => app.handle_event(event)?,
            // All event senders dropped
            None => break,
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
