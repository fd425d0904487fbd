use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::{Duration, Instant};

use crate::config::{BotConfig, ConfigError, ConfigStore};
use crate::logging::{DeskLog, LogCategory};
use crate::notify::NoticeSink;
use crate::process_manager::{
    ExitReport, LaunchSpec, ProcessEvent, ProcessEventKind, ProcessHandle, ProcessManagerError,
};
use crate::settings::LaunchSettings;

pub mod lifecycle;
pub mod log_sink;

pub use lifecycle::{
    BotPage, ControlSet, Lifecycle, LifecycleEvent, LifecycleState, TransitionError,
};
pub use log_sink::{finished_line, strip_ansi, LogBuffer, OutputDecoder};

#[derive(Debug)]
pub enum SupervisorError {
    Launch(ProcessManagerError),
    Process(ProcessManagerError),
    Transition(TransitionError),
}

impl Display for SupervisorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SupervisorError::Launch(error) => write!(f, "bot failed to launch: {error}"),
            SupervisorError::Process(error) => write!(f, "{error}"),
            SupervisorError::Transition(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for SupervisorError {}

impl From<TransitionError> for SupervisorError {
    fn from(value: TransitionError) -> Self {
        Self::Transition(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started { pid: u32 },
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped(ExitReport),
    NotRunning,
}

/// What the owner of the supervisor should react to after draining events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// Sanitized text that was just appended to the log.
    Output(String),
    Finished(ExitReport),
}

/// Drives one bot: launches its runtime, feeds the log and keeps the
/// lifecycle in step with the real process.
///
/// All state lives on the thread that owns the supervisor. Reader and exit
/// watcher threads only ever talk to it through the event channel.
pub struct BotSupervisor<N: NoticeSink> {
    config: BotConfig,
    settings: LaunchSettings,
    store: ConfigStore,
    notices: N,
    desk_log: DeskLog,
    events_tx: Sender<ProcessEvent>,
    events_rx: Receiver<ProcessEvent>,
    handle: Option<ProcessHandle>,
    lifecycle: Lifecycle,
    last_exit: Option<ExitReport>,
    log: LogBuffer,
    decoder: OutputDecoder,
    pending: VecDeque<SupervisorEvent>,
    next_run_id: u64,
    // Run whose output still belongs in the log, even after it exited.
    log_run: Option<u64>,
}

impl<N: NoticeSink> BotSupervisor<N> {
    pub fn new(
        config: BotConfig,
        settings: LaunchSettings,
        store: ConfigStore,
        notices: N,
        desk_log: DeskLog,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        let log = LogBuffer::new(settings.log_max_lines);
        Self {
            config,
            settings,
            store,
            notices,
            desk_log,
            events_tx,
            events_rx,
            handle: None,
            lifecycle: Lifecycle::new(),
            last_exit: None,
            log,
            decoder: OutputDecoder::new(),
            pending: VecDeque::new(),
            next_run_id: 0,
            log_run: None,
        }
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn settings(&self) -> &LaunchSettings {
        &self.settings
    }

    pub fn notices(&self) -> &N {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut N {
        &mut self.notices
    }

    pub fn log(&self) -> &LogBuffer {
        &self.log
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    pub fn pid(&self) -> Option<u32> {
        self.handle.as_ref().map(ProcessHandle::pid)
    }

    /// Exit of the most recent run, once it has finished.
    pub fn last_exit(&self) -> Option<ExitReport> {
        self.last_exit
    }

    pub fn controls(&self, page: BotPage) -> ControlSet {
        ControlSet::for_view(page, self.state())
    }

    pub fn launch_spec(&self) -> LaunchSpec {
        LaunchSpec::for_bot(&self.config, &self.settings)
    }

    pub fn start(&mut self) -> Result<StartOutcome, SupervisorError> {
        if self.handle.is_some() {
            self.desk_log.record(
                LogCategory::Runtime,
                &format!("start ignored for bot {}: already running", self.config.identity()),
            );
            return Ok(StartOutcome::AlreadyRunning);
        }

        self.log.clear();
        self.decoder = OutputDecoder::new();
        self.pending.clear();
        self.next_run_id += 1;
        let run_id = self.next_run_id;
        self.log_run = Some(run_id);

        let spec = self.launch_spec();
        let command_line = spec.command_line();
        match ProcessHandle::spawn(run_id, spec, self.events_tx.clone()) {
            Ok(handle) => {
                self.lifecycle.apply(LifecycleEvent::Start)?;
                let pid = handle.pid();
                self.handle = Some(handle);
                self.desk_log.record(
                    LogCategory::Startup,
                    &format!(
                        "bot {} started pid={pid} run={run_id}: {command_line}",
                        self.config.identity()
                    ),
                );
                Ok(StartOutcome::Started { pid })
            }
            Err(error) => {
                self.log.append_line(&format!("failed to start {command_line}: {error}"));
                self.notices.error("Start error", &error.to_string());
                self.desk_log.record(
                    LogCategory::Startup,
                    &format!("bot {} failed to start: {error}", self.config.identity()),
                );
                Err(SupervisorError::Launch(error))
            }
        }
    }

    /// Kills the process and only returns once the OS reports it gone.
    pub fn stop(&mut self) -> Result<StopOutcome, SupervisorError> {
        let Some(mut handle) = self.handle.take() else {
            self.desk_log.record(
                LogCategory::Shutdown,
                &format!("stop ignored for bot {}: not running", self.config.identity()),
            );
            return Ok(StopOutcome::NotRunning);
        };

        let outcome = match handle.kill_and_wait(self.settings.stop_timeout) {
            Ok(outcome) => outcome,
            Err(error) => {
                self.handle = Some(handle);
                return Err(SupervisorError::Process(error));
            }
        };
        if outcome.overran {
            self.desk_log.record(
                LogCategory::Shutdown,
                &format!(
                    "bot {} pid={} outlived the {}ms stop timeout",
                    self.config.identity(),
                    handle.pid(),
                    self.settings.stop_timeout.as_millis()
                ),
            );
        }

        self.drain_queued();
        self.on_finished(outcome.report);
        self.lifecycle.apply(LifecycleEvent::Stop)?;
        self.desk_log.record(
            LogCategory::Shutdown,
            &format!(
                "bot {} stopped pid={} code={} status={}",
                self.config.identity(),
                handle.pid(),
                outcome.report.code,
                outcome.report.kind
            ),
        );
        Ok(StopOutcome::Stopped(outcome.report))
    }

    /// Stop followed by start, without handing control back in between.
    pub fn reboot(&mut self) -> Result<StartOutcome, SupervisorError> {
        if !self.is_running() {
            return Err(SupervisorError::Transition(TransitionError {
                from: self.state(),
                event: LifecycleEvent::Stop,
            }));
        }
        self.desk_log.record(
            LogCategory::Restart,
            &format!("rebooting bot {}", self.config.identity()),
        );
        self.stop()?;
        self.start()
    }

    /// Writes `updated` over the stored entry with the same identity. Failures
    /// become error notices; the returned error is informational.
    pub fn update_config(&mut self, updated: BotConfig) -> Result<usize, ConfigError> {
        match self.store.update(&updated) {
            Ok(index) => {
                self.notices.success(
                    "Update success",
                    "The updated configuration is successful",
                );
                if updated.same_identity(&self.config) {
                    self.config = updated;
                }
                Ok(index)
            }
            Err(error) => {
                self.notices
                    .error("Update error", "Data loss within the profile");
                self.desk_log.record(
                    LogCategory::Runtime,
                    &format!("config update for bot {} failed: {error}", updated.identity()),
                );
                Err(error)
            }
        }
    }

    /// Handles up to `max` queued process events without blocking.
    pub fn poll(&mut self, max: usize) -> Vec<SupervisorEvent> {
        let mut events = Vec::new();
        while events.len() < max {
            if let Some(event) = self.pending.pop_front() {
                events.push(event);
                continue;
            }
            match self.events_rx.try_recv() {
                Ok(event) => {
                    if let Some(event) = self.handle_event(event) {
                        events.push(event);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }

    /// Waits up to `timeout` for the next event that matters.
    pub fn wait_event(&mut self, timeout: Duration) -> Option<SupervisorEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.events_rx.recv_timeout(remaining) {
                Ok(event) => {
                    if let Some(event) = self.handle_event(event) {
                        return Some(event);
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return None
                }
            }
        }
    }

    fn drain_queued(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            if let Some(event) = self.handle_event(event) {
                self.pending.push_back(event);
            }
        }
    }

    fn handle_event(&mut self, event: ProcessEvent) -> Option<SupervisorEvent> {
        if self.log_run != Some(event.run_id) {
            return None;
        }
        let active = self
            .handle
            .as_ref()
            .is_some_and(|handle| handle.run_id() == event.run_id);

        match event.kind {
            ProcessEventKind::Output(bytes) => self.on_data(&bytes).map(SupervisorEvent::Output),
            ProcessEventKind::Exit(report) if active => {
                if let Some(mut handle) = self.handle.take() {
                    handle.mark_exited(report);
                }
                self.on_finished(report);
                if let Err(error) = self.lifecycle.apply(LifecycleEvent::ProcessExited) {
                    self.desk_log.record(LogCategory::Runtime, &error.to_string());
                }
                self.desk_log.record(
                    LogCategory::Runtime,
                    &format!(
                        "bot {} exited code={} status={}",
                        self.config.identity(),
                        report.code,
                        report.kind
                    ),
                );
                Some(SupervisorEvent::Finished(report))
            }
            ProcessEventKind::Exit(_) => None,
            ProcessEventKind::WaitError(message) => {
                self.desk_log.record(
                    LogCategory::Runtime,
                    &format!(
                        "lost track of bot {} process: {message}",
                        self.config.identity()
                    ),
                );
                self.notices.error("Process error", &message);
                None
            }
        }
    }

    fn on_data(&mut self, bytes: &[u8]) -> Option<String> {
        let text = self.decoder.decode(bytes);
        if text.is_empty() {
            return None;
        }
        self.log.append(&text);
        Some(text)
    }

    fn on_finished(&mut self, report: ExitReport) {
        self.last_exit = Some(report);
        let rest = self.decoder.flush();
        self.log.append(&rest);
        self.log.append_line(&finished_line(report));
    }
}

impl<N: NoticeSink> Drop for BotSupervisor<N> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.stop();
        }
    }
}
