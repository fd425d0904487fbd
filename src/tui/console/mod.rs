use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};

use crate::notify::NoticeLog;
use crate::process_manager::ExitReport;
use crate::supervisor::{BotSupervisor, StopOutcome, SupervisorError};

mod events;
mod highlight;
mod render;
mod state;
mod terminal;

use events::{apply_action, map_key, ConsoleAction, LoopControl};
use render::{render_ui, ConsoleView, CHROME_ROWS};
use state::ConsoleState;
use terminal::{init_terminal, restore_terminal, ConsoleTerminal};

const TICK: Duration = Duration::from_millis(50);
const MAX_EVENTS_PER_TICK: usize = 200;

#[derive(Debug)]
pub enum ConsoleError {
    Io(io::Error),
    Supervisor(SupervisorError),
}

impl std::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsoleError::Io(err) => write!(f, "console terminal error: {err}"),
            ConsoleError::Supervisor(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ConsoleError {}

impl From<io::Error> for ConsoleError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<SupervisorError> for ConsoleError {
    fn from(value: SupervisorError) -> Self {
        Self::Supervisor(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleOptions {
    pub draft: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleOutcome {
    /// Exit of the process the console had to stop on the way out.
    pub stopped_on_quit: Option<ExitReport>,
    pub last_exit: Option<ExitReport>,
    pub returned_to_list: bool,
    pub starts: usize,
    pub log_lines: usize,
}

/// Runs the single-bot console until the user quits or returns to the list.
/// A bot still running at that point is stopped before this returns.
pub fn run_console(
    supervisor: &mut BotSupervisor<NoticeLog>,
    options: ConsoleOptions,
) -> Result<ConsoleOutcome, ConsoleError> {
    let mut state = ConsoleState::new(options.draft);
    let mut terminal = init_terminal()?;
    let looped = event_loop(&mut terminal, supervisor, &mut state);
    let restored = restore_terminal(&mut terminal);

    let stopped_on_quit = match supervisor.stop()? {
        StopOutcome::Stopped(report) => Some(report),
        StopOutcome::NotRunning => None,
    };
    looped?;
    restored?;

    Ok(ConsoleOutcome {
        stopped_on_quit,
        last_exit: supervisor.last_exit(),
        returned_to_list: state.returned_to_list,
        starts: state.starts,
        log_lines: supervisor.log().len(),
    })
}

fn event_loop(
    terminal: &mut ConsoleTerminal,
    supervisor: &mut BotSupervisor<NoticeLog>,
    state: &mut ConsoleState,
) -> Result<(), ConsoleError> {
    let mut command_line = supervisor.launch_spec().command_line();
    loop {
        state.observe_pid(supervisor.pid());
        let log_height = terminal.size()?.height.saturating_sub(CHROME_ROWS) as usize;
        {
            let view = ConsoleView {
                page: state.page,
                config: supervisor.config(),
                state: supervisor.state(),
                controls: supervisor.controls(state.page),
                pid: supervisor.pid(),
                uptime: state.started_at.map(|started| started.elapsed()),
                starts: state.starts,
                last_exit: supervisor.last_exit(),
                command_line: command_line.clone(),
                draft: state.draft.as_deref(),
                log: supervisor.log(),
                log_offset: state
                    .viewport
                    .resolve(supervisor.log().len(), log_height),
                follow: state.viewport.follow(),
                latest_notice: supervisor.notices().latest(),
            };
            terminal.draw(|frame| render_ui(frame, &view))?;
        }

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let controls = supervisor.controls(state.page);
                    if let Some(action) = map_key(key, state.page, controls) {
                        let control = apply_action(supervisor, state, action, log_height);
                        if action == ConsoleAction::UpdateConfig {
                            command_line = supervisor.launch_spec().command_line();
                        }
                        if matches!(control, LoopControl::Quit) {
                            return Ok(());
                        }
                    }
                }
            }
        }

        // The log buffer is the view's source; events only need draining.
        let _ = supervisor.poll(MAX_EVENTS_PER_TICK);
    }
}
