use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

mod actions;
mod app;
mod config;
mod panel;
mod tilt;
mod trigger;
mod watcher;

use actions::Action;
use app::App;
use config::Config;
use tilt::TiltClient;
use trigger::spawn_trigger;
use watcher::SessionWatcher;

/// Terminal status panel for a running Tilt instance
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to config.toml
    #[arg(long)]
    config: Option<PathBuf>,
    /// Tilt API host
    #[arg(long)]
    host: Option<String>,
    /// Tilt API port
    #[arg(long)]
    port: Option<u16>,
    /// Tilt session to watch
    #[arg(long)]
    session: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let path = self.config.unwrap_or_else(Config::default_path);
        let mut config = Config::load_or_default(&path)
            .with_context(|| format!("Failed to load {}", path.display()))?;

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(session) = self.session {
            config.session = session;
        }
        Ok(config)
    }
}

/// The TUI owns the terminal, so logs go to a file in the cache dir
fn init_logging() -> Result<PathBuf> {
    let log_dir = dirs::cache_dir().unwrap_or_default().join("tilt-deck");
    std::fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("tilt-deck.log");
    let log_file = File::create(&log_path)
        .with_context(|| format!("Failed to create {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();

    Ok(log_path)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Args::parse().into_config()?;
    let log_path = init_logging()?;
    info!(log = %log_path.display(), url = %config.base_url(), "starting tilt-deck");

    let client = TiltClient::new(
        &config.base_url(),
        config.session.clone(),
        config.request_timeout(),
    )
    .context("Failed to create Tilt client")?;

    // Create event channel
    let (tx, mut rx) = mpsc::unbounded_channel::<Action>();

    // Spawn input handler
    let input_tx = tx.clone();
    tokio::spawn(async move {
        loop {
            if event::poll(Duration::from_millis(100)).unwrap_or(false) {
                if let Ok(Event::Key(key)) = event::read() {
                    if key.kind == KeyEventKind::Press {
                        let _ = input_tx.send(Action::KeyPress(key));
                    }
                }
            }
        }
    });

    // Spawn session poller
    let watcher = SessionWatcher::new();
    let poller = watcher.clone();
    let poll_client = client.clone();
    let interval = config.poll_interval();
    tokio::spawn(async move {
        poller.run(poll_client, interval).await;
    });

    // Initialize terminal
    let mut terminal = ratatui::init();

    // Create app state
    let mut app = App::new(watcher, tx.clone());

    // Main event loop
    let result: Result<()> = loop {
        // Render
        if let Err(e) = terminal.draw(|f| app.render(f)) {
            break Err(e.into());
        }

        // Process any pending actions from the app
        for pending_action in app.take_pending_actions() {
            if let Action::TriggerResource(resource) = pending_action {
                spawn_trigger(client.clone(), resource, tx.clone());
            }
        }

        // Handle events from channel
        tokio::select! {
            Some(action) = rx.recv() => {
                match app.handle_action(action) {
                    Ok(should_quit) => {
                        if should_quit {
                            break Ok(());
                        }
                    }
                    Err(e) => {
                        break Err(e);
                    }
                }
            }
        }
    };

    // Restore terminal
    ratatui::restore();
    info!("exiting");
    result
}
