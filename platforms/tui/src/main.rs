mod app;

use anyhow::{anyhow, Context, Result};
use app::App;
use clap::Parser;
use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::Read;
use std::{
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Mutex,
    time::Instant,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tumas::{Machine, ProgramLoader, ProgramManager, StepInterval};

/// Animates a single-tape Turing machine in the terminal, one transition phase per frame.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(after_help = "KEYS:
  a  accelerate    s  slow down    q  quit

EXAMPLES:
  tumas-tui programs/binary-increment.tur --tape 1011
  tumas-tui --program \"Busy beaver (3-state)\" --interval 0.2
  cat programs/right-walker.tur | tumas-tui")]
struct Cli {
    /// Path to a machine definition (.tur, or .json).
    /// If not provided, a piped definition on stdin or the first built-in machine is used.
    #[arg(conflicts_with = "program")]
    program_file: Option<PathBuf>,

    /// Name of a built-in machine.
    #[arg(short, long)]
    program: Option<String>,

    /// List the built-in machines and exit.
    #[arg(short, long)]
    list: bool,

    /// Replace the initial tape, e.g. "1011" ('_' is the blank symbol).
    #[arg(short, long)]
    tape: Option<String>,

    /// Replace the initial head position.
    #[arg(long, allow_hyphen_values = true)]
    head: Option<i64>,

    /// Seconds between two frames (at least 0.1).
    #[arg(short, long, default_value_t = 0.5)]
    interval: f64,

    /// Write logs to this file (filtered with RUST_LOG, default "info").
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// A wrapper around the terminal to ensure it's restored on drop.
struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl Tui {
    /// Switches to raw mode and the alternate screen.
    ///
    /// If any step fails, whatever was already changed is undone before the error is returned.
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;

        let mut stdout = io::stdout();
        let terminal = execute!(stdout, EnterAlternateScreen, Hide)
            .and_then(|()| Terminal::new(CrosstermBackend::new(stdout)));

        match terminal {
            Ok(terminal) => Ok(Self { terminal }),
            Err(e) => {
                restore_terminal(&mut io::stdout());
                Err(e)
            }
        }
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        restore_terminal(self.terminal.backend_mut());
    }
}

/// Leaves raw mode and the alternate screen, and shows the cursor again.
///
/// The results are ignored as we can't do much about errors at this point.
fn restore_terminal<W: Write>(out: &mut W) {
    let _ = disable_raw_mode();
    let _ = execute!(out, LeaveAlternateScreen, Show);
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list {
        for (i, name) in ProgramManager::list_program_names().iter().enumerate() {
            println!("{:>2}. {name}", i + 1);
        }
        return Ok(());
    }

    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    // Load the machine before initializing the TUI.
    // This way, if loading fails, the error goes to stderr without
    // interfering with the terminal's alternate screen.
    let machine = load_machine(&cli)?;
    info!(name = machine.name(), "starting simulation");
    let mut app = App::new(machine, StepInterval::from_secs_f64(cli.interval));

    // Initialize the TUI. The `Tui` struct will handle cleanup on drop.
    let mut tui = Tui::new().context("failed to prepare the terminal")?;

    // Run the application.
    run_app(&mut tui.terminal, &mut app)?;

    info!(
        state = ?app.model().state,
        steps = app.model().step_count,
        "simulation ended"
    );
    Ok(())
}

/// Installs a file logger; the terminal itself is busy with the animation.
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {e}"))
}

/// Loads a machine based on CLI arguments.
///
/// It tries to load from a file path, then a built-in by name, then stdin, and finally
/// falls back to the first built-in machine.
fn load_machine(cli: &Cli) -> Result<Machine> {
    let mut machine = if let Some(path) = &cli.program_file {
        ProgramLoader::load_program(path)
            .with_context(|| format!("failed to load machine from {}", path.display()))?
    } else if let Some(name) = &cli.program {
        ProgramManager::get_program_by_name(name).with_context(|| {
            format!(
                "unknown built-in machine; available: {}",
                ProgramManager::list_program_names().join(", ")
            )
        })?
    } else if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read from stdin")?;
        ProgramLoader::load_program_from_string(&buffer)
            .context("failed to load machine from stdin")?
    } else {
        ProgramManager::get_program_by_index(0)?
    };

    if let Some(tape) = &cli.tape {
        machine
            .set_initial_tape(tape)
            .context("invalid --tape")?;
    }
    if let Some(head) = cli.head {
        machine.set_initial_head(head);
    }

    Ok(machine)
}

/// Runs the main application loop.
///
/// Every micro-step is drawn and then left on screen for one step interval, during which
/// keys are handled. Once the simulation ends, the final frame stays until a key is pressed.
fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    terminal.draw(|f| app.render(f))?;
    run_input_loop(terminal, app)?;

    while app.step() {
        terminal.draw(|f| app.render(f))?;
        run_input_loop(terminal, app)?;
    }

    terminal.draw(|f| app.render(f))?;
    wait_for_any_key(terminal, app)
}

/// Handles keys until the current step interval has elapsed.
///
/// The deadline is fixed when the wait starts, so a speed change applies to the next step.
fn run_input_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    let deadline = Instant::now() + app.step_interval();

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() || app.is_terminated() {
            return Ok(());
        }

        if event::poll(remaining)? {
            match event::read()? {
                Event::Key(key) => handle_key_event(app, key),
                Event::Resize(_, _) => {
                    terminal.draw(|f| app.render(f))?;
                }
                _ => {}
            }
        }
    }
}

/// Blocks until any key is pressed.
fn wait_for_any_key<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => return Ok(()),
            Event::Resize(_, _) => {
                terminal.draw(|f| app.render(f))?;
            }
            _ => {}
        }
    }
}

/// Maps a key press to an action; unknown keys are ignored.
fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    if let Some(action) = app.keymap.get(&key) {
        app.handle_action(*action);
    }
}
