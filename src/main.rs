pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, Event, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use cubik::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore, StoreKind},
    history::{History, JsonSolveStore, MemorySolveStore, SolveStore, SqliteSolveStore, StoreError},
    input::Command,
    logging,
    runtime::{CrosstermEventSource, CubeEvent, FixedTicker, Runner},
    session::SolveSession,
    timer::MonotonicClock,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};
use tracing::{info, warn};

const TICK_RATE_MS: u64 = 10;

/// hold-to-start speedcubing timer with scrambles and rolling averages
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal speedcubing timer. Hold SPACE (or the left mouse button) until the timer turns green, release to start, press any key to stop. Solves are saved with their scramble and summarised as best, worst, mean, Ao5 and Ao12."
)]
pub struct Cli {
    /// number of moves in each scramble
    #[clap(short = 'n', long)]
    scramble_length: Option<usize>,

    /// milliseconds SPACE must be held before releasing starts the timer
    #[clap(long)]
    hold_ms: Option<u64>,

    /// where to keep solve history
    #[clap(short = 's', long, value_enum)]
    store: Option<StoreKind>,

    /// history file location (defaults to the state directory)
    #[clap(long)]
    db: Option<PathBuf>,

    /// log verbosity, repeat for more (-v, -vv, -vvv)
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Command-line values win over the config file
    fn apply(&self, mut config: Config) -> Config {
        if let Some(n) = self.scramble_length {
            config.scramble_length = n;
        }
        if let Some(ms) = self.hold_ms {
            config.hold_threshold_ms = ms;
        }
        if let Some(store) = self.store {
            config.store = store;
        }
        config
    }
}

fn open_store(kind: StoreKind, path: Option<PathBuf>) -> Result<Box<dyn SolveStore>, StoreError> {
    let missing_dir = || StoreError::Unavailable("no state directory; pass --db".to_string());
    Ok(match kind {
        StoreKind::Sqlite => {
            let path = path.or_else(AppDirs::db_path).ok_or_else(missing_dir)?;
            Box::new(SqliteSolveStore::open(path)?)
        }
        StoreKind::Json => {
            let path = path.or_else(AppDirs::json_path).ok_or_else(missing_dir)?;
            Box::new(JsonSolveStore::with_path(path))
        }
        StoreKind::Memory => Box::new(MemorySolveStore::new()),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub session: SolveSession,
    /// Last error worth showing, cleared by the next successful action
    pub status: Option<String>,
}

impl App {
    pub fn new(session: SolveSession) -> Self {
        Self {
            session,
            status: None,
        }
    }

    pub fn on_tick(&mut self) {
        if let Err(e) = self.session.poll() {
            self.report(e);
        }
    }

    pub fn on_input(&mut self, event: &Event) -> Flow {
        let command = match self.session.handle_event(event) {
            Ok(command) => command,
            Err(e) => {
                self.report(e);
                None
            }
        };
        // deadlines can fall due while input keeps the tick from firing
        self.on_tick();

        match command {
            Some(Command::Quit) => Flow::Quit,
            Some(Command::DeleteLast) => {
                self.delete_last();
                Flow::Continue
            }
            Some(Command::ClearHistory) => {
                self.clear_history();
                Flow::Continue
            }
            None => Flow::Continue,
        }
    }

    fn delete_last(&mut self) {
        let Some(id) = self.session.history().latest().map(|s| s.id) else {
            return;
        };
        match self.session.history_mut().remove(&id) {
            Ok(()) => {
                info!(%id, "solve deleted");
                self.status = None;
            }
            Err(e) => self.report(e),
        }
    }

    fn clear_history(&mut self) {
        match self.session.history_mut().clear() {
            Ok(()) => {
                info!("history cleared");
                self.status = None;
            }
            Err(e) => self.report(e),
        }
    }

    fn report<E: Error>(&mut self, e: E) {
        warn!(error = %e, "action failed");
        self.status = Some(e.to_string());
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(log_path) = AppDirs::log_path() {
        if let Err(e) = logging::init_logging(&log_path, cli.verbose) {
            eprintln!("logging disabled: {e}");
        }
    }

    let config_store = FileConfigStore::new();
    let config = cli.apply(config_store.load());
    if let Err(e) = config_store.save(&config) {
        warn!(error = %e, "could not save config");
    }

    let history = History::load(open_store(config.store, cli.db.clone())?)?;

    enable_raw_mode()?;
    let releases_reported = supports_keyboard_enhancement().unwrap_or(false);
    info!(releases_reported, store = %config.store, "starting");

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    if releases_reported {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let session = SolveSession::new(
        config.session_config(releases_reported),
        Arc::new(MonotonicClock::new()),
        history,
    );
    let mut app = App::new(session);
    let result = start_tui(&mut terminal, &mut app);

    if releases_reported {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    terminal.draw(|f| ui(app, f))?;
    loop {
        match runner.step() {
            CubeEvent::Tick => app.on_tick(),
            CubeEvent::Resize => {}
            CubeEvent::Closed => {
                warn!("terminal input closed, exiting");
                break;
            }
            CubeEvent::Input(event) => {
                if app.on_input(&event) == Flow::Quit {
                    break;
                }
            }
        }
        terminal.draw(|f| ui(app, f))?;
    }

    Ok(())
}

fn ui(app: &mut App, f: &mut Frame) {
    f.render_widget(&*app, f.area());
}
