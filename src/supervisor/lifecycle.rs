use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Idle,
    Running,
}

impl Display for LifecycleState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Idle => f.write_str("idle"),
            LifecycleState::Running => f.write_str("running"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Start,
    Stop,
    ProcessExited,
}

impl Display for LifecycleEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleEvent::Start => f.write_str("start"),
            LifecycleEvent::Stop => f.write_str("stop"),
            LifecycleEvent::ProcessExited => f.write_str("process exit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionError {
    pub from: LifecycleState,
    pub event: LifecycleEvent,
}

impl Display for TransitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot apply {} while {}", self.event, self.from)
    }
}

impl std::error::Error for TransitionError {}

/// Idle/Running tracker. The only place that decides whether a bot counts as
/// running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LifecycleState::Running
    }

    pub fn apply(&mut self, event: LifecycleEvent) -> Result<LifecycleState, TransitionError> {
        let next = match (self.state, event) {
            (LifecycleState::Idle, LifecycleEvent::Start) => LifecycleState::Running,
            (LifecycleState::Running, LifecycleEvent::Stop)
            | (LifecycleState::Running, LifecycleEvent::ProcessExited) => LifecycleState::Idle,
            (from, event) => return Err(TransitionError { from, event }),
        };
        self.state = next;
        Ok(next)
    }
}

/// Pages of the single-bot console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BotPage {
    #[default]
    Info,
    Setup,
    Log,
}

impl BotPage {
    pub const ALL: [BotPage; 3] = [BotPage::Info, BotPage::Setup, BotPage::Log];

    pub fn title(self) -> &'static str {
        match self {
            BotPage::Info => "Bot info",
            BotPage::Setup => "Bot setup",
            BotPage::Log => "Bot log",
        }
    }

    pub fn index(self) -> usize {
        match self {
            BotPage::Info => 0,
            BotPage::Setup => 1,
            BotPage::Log => 2,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Which controls are visible for a page in a given lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlSet {
    pub run: bool,
    pub stop: bool,
    pub reboot: bool,
    pub update_config: bool,
    pub return_list: bool,
    pub setup_return: bool,
}

impl ControlSet {
    pub fn for_view(page: BotPage, state: LifecycleState) -> Self {
        let running = state == LifecycleState::Running;
        match page {
            BotPage::Info | BotPage::Log => Self {
                run: !running,
                stop: running,
                reboot: running,
                update_config: false,
                return_list: true,
                setup_return: false,
            },
            BotPage::Setup => Self {
                update_config: true,
                setup_return: true,
                ..Self::default()
            },
        }
    }
}
