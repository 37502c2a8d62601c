//! Terminal rendering and event loop for lazyworktree.
//!
//! Handles setup/teardown of raw mode and the alternate screen, redraws, input events, worker
//! results and ticks. Each input becomes a [Message] for the [Model]; the [Command] it returns
//! is executed here: tasks go to the [Workers], interactive processes run with the TUI
//! suspended.

use crate::app::{Message, Model};
use crate::core::proc::{InteractiveCommand, run_interactive};
use crate::core::worker::{Command, Workers};
use crate::error::AppError;
use crate::ui;

use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::collections::VecDeque;
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

type Term = Terminal<CrosstermBackend<Stdout>>;

const POLL_INTERVAL: Duration = Duration::from_millis(16);
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Initializes the terminal in raw mode and alternate screen and runs the main event loop.
///
/// Blocks until quit. `first` is the model's initial command.
pub fn run_terminal(
    model: &mut Model,
    workers: &Workers,
    first: Option<Command>,
) -> Result<(), AppError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, model, workers, first);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, Show)?;
    result
}

/// Commands waiting to run, in order.
struct Pending(VecDeque<Command>);

impl Pending {
    fn push(&mut self, cmd: Option<Command>) {
        if let Some(cmd) = cmd {
            self.0.push_back(cmd);
        }
    }
}

fn event_loop(
    terminal: &mut Term,
    model: &mut Model,
    workers: &Workers,
    first: Option<Command>,
) -> Result<(), AppError> {
    let size = terminal.size()?;
    let mut pending = Pending(VecDeque::new());
    pending.push(model.update(Message::Resize {
        width: size.width,
        height: size.height,
    }));
    pending.push(first);

    let mut last_tick = Instant::now();
    let mut dirty = true;

    loop {
        // Run queued commands; Exec results may queue more.
        while let Some(cmd) = pending.0.pop_front() {
            match cmd {
                Command::Task(task) => workers.submit(task, model.token().clone()),
                Command::Batch(cmds) => {
                    for cmd in cmds.into_iter().rev() {
                        pending.0.push_front(cmd);
                    }
                }
                Command::Exec(cmd) => {
                    let msg = suspend_and_run(terminal, &cmd)?;
                    pending.push(model.update(msg));
                    dirty = true;
                }
                Command::Quit => return Ok(()),
            }
        }

        if dirty {
            terminal.draw(|f| ui::render(f, model))?;
            dirty = false;
        }

        while let Ok(msg) = workers.result_rx().try_recv() {
            pending.push(model.update(msg));
            dirty = true;
        }

        if event::poll(POLL_INTERVAL)? {
            let msg = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => Some(Message::Key(key)),
                Event::Resize(width, height) => Some(Message::Resize { width, height }),
                _ => None,
            };
            if let Some(msg) = msg {
                pending.push(model.update(msg));
                dirty = true;
            }
        }

        if last_tick.elapsed() >= TICK_INTERVAL {
            last_tick = Instant::now();
            pending.push(model.update(Message::Tick));
            // Keeps spinners moving.
            dirty |= model.screen().is_some() || model.is_refreshing();
        }
    }
}

/// Hands the terminal to `cmd` and takes it back afterwards.
fn suspend_and_run(terminal: &mut Term, cmd: &InteractiveCommand) -> Result<Message, AppError> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, Show)?;

    tracing::info!(script = cmd.script().unwrap_or_default(), "running interactive command");
    let result = run_interactive(cmd);

    enable_raw_mode()?;
    execute!(terminal.backend_mut(), EnterAlternateScreen, Hide)?;
    terminal.clear()?;

    Ok(match result {
        Ok(()) => Message::RefreshComplete,
        Err(e) => Message::Error(e.to_string()),
    })
}
