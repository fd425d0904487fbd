use std::time::Duration;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Frame;

use crate::config::BotConfig;
use crate::notify::Notice;
use crate::process_manager::ExitReport;
use crate::supervisor::{BotPage, ControlSet, LifecycleState, LogBuffer};

mod footer;
mod header;
mod panes;

use footer::render_footer;
use header::render_tabs;
use panes::{render_info_pane, render_log_pane, render_setup_pane};

/// Rows taken by everything except the log text itself.
pub(super) const CHROME_ROWS: u16 = 3 + 1 + 2;

/// Everything one frame needs, borrowed from the supervisor and console state.
pub(super) struct ConsoleView<'a> {
    pub(super) page: BotPage,
    pub(super) config: &'a BotConfig,
    pub(super) state: LifecycleState,
    pub(super) controls: ControlSet,
    pub(super) pid: Option<u32>,
    pub(super) uptime: Option<Duration>,
    pub(super) starts: usize,
    pub(super) last_exit: Option<ExitReport>,
    pub(super) command_line: String,
    pub(super) draft: Option<&'a std::path::Path>,
    pub(super) log: &'a LogBuffer,
    pub(super) log_offset: usize,
    pub(super) follow: bool,
    pub(super) latest_notice: Option<&'a Notice>,
}

pub(super) fn render_ui(frame: &mut Frame<'_>, view: &ConsoleView<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_tabs(frame, chunks[0], view);
    match view.page {
        BotPage::Info => render_info_pane(frame, chunks[1], view),
        BotPage::Setup => render_setup_pane(frame, chunks[1], view),
        BotPage::Log => render_log_pane(frame, chunks[1], view),
    }
    render_footer(frame, chunks[2], view);
}
