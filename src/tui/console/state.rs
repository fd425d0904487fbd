use std::path::PathBuf;
use std::time::Instant;

use crate::supervisor::BotPage;
use crate::tui::core::LogViewport;

pub(super) struct ConsoleState {
    pub(super) page: BotPage,
    pub(super) viewport: LogViewport,
    pub(super) draft: Option<PathBuf>,
    pub(super) returned_to_list: bool,
    pub(super) tracked_pid: Option<u32>,
    pub(super) started_at: Option<Instant>,
    pub(super) starts: usize,
}

impl ConsoleState {
    pub(super) fn new(draft: Option<PathBuf>) -> Self {
        Self {
            page: BotPage::Info,
            viewport: LogViewport::default(),
            draft,
            returned_to_list: false,
            tracked_pid: None,
            started_at: None,
            starts: 0,
        }
    }

    /// Notes a new pid so the header can show uptime for the current run.
    pub(super) fn observe_pid(&mut self, pid: Option<u32>) {
        if pid == self.tracked_pid {
            return;
        }
        self.tracked_pid = pid;
        if pid.is_some() {
            self.started_at = Some(Instant::now());
            self.starts += 1;
        } else {
            self.started_at = None;
        }
    }
}
