//! EdgeQuery console: a terminal client for a streamed Text-to-SQL
//! assistant. Connects to the generation server over WebSocket, renders
//! the response as it streams, and keeps the transcript on disk between
//! sessions.

mod app;
mod clipboard;
mod storage;
mod theme;
mod transport;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use crossterm::event::{Event, EventStream, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use futures_util::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use storage::Storage;
use tokio::sync::mpsc;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use transport::{transport_loop, TransportCommand, TransportEvent};
use url::Url;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "edgequery", about = "Terminal client for the EdgeQuery Text-to-SQL server")]
struct Args {
    /// WebSocket endpoint of the generation server.
    #[arg(long, default_value = "ws://localhost:8000")]
    url: String,

    /// Stable user id sent with each request; generated when omitted.
    #[arg(long)]
    user_id: Option<String>,

    /// Directory for the saved transcript and domain profile.
    #[arg(long)]
    state_dir: Option<PathBuf>,
}

/// Logs go nowhere by default: stdout belongs to the TUI. Set
/// EDGEQUERY_LOG_STDOUT=1 (with stdout redirected) to capture them.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("EDGEQUERY_LOG_STDOUT").is_ok() && !io::stdout().is_terminal() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::sink).init();
    }
}

fn default_user_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("user_{}", &id[..8])
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let url = Url::parse(&args.url).with_context(|| format!("invalid server url: {}", args.url))?;
    let state_dir = args
        .state_dir
        .or_else(Storage::resolve_default)
        .context("no writable data directory; pass --state-dir")?;
    let user_id = args.user_id.unwrap_or_else(default_user_id);

    let (cmd_tx, cmd_rx) = mpsc::channel::<TransportCommand>(32);
    let (event_tx, event_rx) = mpsc::channel::<TransportEvent>(256);
    tokio::spawn(transport_loop(url, cmd_rx, event_tx));

    let mut app = App::new(user_id, Storage::new(state_dir), cmd_tx);
    app.toggle_connection();

    enable_raw_mode().context("enabling raw mode")?;
    io::stdout().execute(EnterAlternateScreen).context("entering alternate screen")?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let result = run(&mut terminal, &mut app, event_rx).await;

    disable_raw_mode().ok();
    io::stdout().execute(LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();
    result
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    mut events: mpsc::Receiver<TransportEvent>,
) -> Result<()> {
    let mut input = EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_millis(250));

    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;
        if app.should_quit {
            return Ok(());
        }

        let reveal_deadline = app.next_reveal_deadline();
        tokio::select! {
            maybe_event = input.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key);
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => debug!("input error: {err}"),
                None => return Ok(()),
            },
            maybe_transport = events.recv() => match maybe_transport {
                Some(event) => app.apply_transport(event),
                None => return Ok(()),
            },
            _ = sleep_until_opt(reveal_deadline) => {
                app.fire_due_reveals(Instant::now());
            }
            _ = tick.tick() => {}
        }
    }
}

/// Sleeps until the given deadline, or forever when there is none, so
/// the select arm only fires when a reveal is actually due.
async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}
