use std::io::Write;
use std::path::PathBuf;

use crate::config::{BotConfig, BotId, ConfigError, ConfigStore, Recovery};
use crate::logging::DeskLog;
use crate::notify::{NoticeLog, NoticeSink};
use crate::paths::AppPaths;
use crate::settings::{LaunchSettings, SettingsError};
use crate::supervisor::{BotSupervisor, SupervisorError};
use crate::tui::{run_console, ConsoleError, ConsoleOptions};
use crate::ui::{MessageBlock, NoticeLevel, OutputMode, PlainRenderer, Renderer, UiError};
use crate::{Command, ConfigFileArgs, ListArgs, RemoveArgs, RunArgs};

mod plain;
mod render;

use plain::run_plain;
use render::{bot_table, render_console_summary};

#[derive(Debug)]
pub enum RunnerError {
    Ui(UiError),
    Config(ConfigError),
    Settings(SettingsError),
    Supervisor(SupervisorError),
    Console(ConsoleError),
    BotNotFound { bot_id: BotId, path: PathBuf },
}

impl std::fmt::Display for RunnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunnerError::Ui(err) => write!(f, "{err}"),
            RunnerError::Config(err) => write!(f, "{err}"),
            RunnerError::Settings(err) => write!(f, "{err}"),
            RunnerError::Supervisor(err) => write!(f, "{err}"),
            RunnerError::Console(err) => write!(f, "{err}"),
            RunnerError::BotNotFound { bot_id, path } => {
                write!(f, "no bot with id `{bot_id}` in {}", path.display())
            }
        }
    }
}

impl std::error::Error for RunnerError {}

impl From<UiError> for RunnerError {
    fn from(value: UiError) -> Self {
        Self::Ui(value)
    }
}

impl From<ConfigError> for RunnerError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<SettingsError> for RunnerError {
    fn from(value: SettingsError) -> Self {
        Self::Settings(value)
    }
}

impl From<SupervisorError> for RunnerError {
    fn from(value: SupervisorError) -> Self {
        Self::Supervisor(value)
    }
}

impl From<ConsoleError> for RunnerError {
    fn from(value: ConsoleError) -> Self {
        Self::Console(value)
    }
}

/// Runs `cmd` against stdout and returns the process exit code.
pub fn run_command(cmd: Command) -> Result<i32, RunnerError> {
    let mut renderer = PlainRenderer::stdout(OutputMode::from_env());
    run_command_with(cmd, &mut renderer)
}

pub fn run_command_with<W: Write>(
    cmd: Command,
    renderer: &mut PlainRenderer<W>,
) -> Result<i32, RunnerError> {
    match cmd {
        Command::List(args) => run_list(args, renderer),
        Command::Run(args) => run_bot(args, renderer),
        Command::Update(args) => run_update(args, renderer),
        Command::Add(args) => run_add(args, renderer),
        Command::Remove(args) => run_remove(args, renderer),
        Command::Help => Ok(0),
    }
}

fn run_list<W: Write>(args: ListArgs, renderer: &mut PlainRenderer<W>) -> Result<i32, RunnerError> {
    let paths = AppPaths::resolve(args.home_override.as_deref());
    let store = ConfigStore::new(paths.bot_config());
    let outcome = store.load(renderer)?;
    match outcome.recovery {
        Some(Recovery::CreatedEmpty) => renderer.notice(
            NoticeLevel::Info,
            &format!("created empty bot list at {}", store.path().display()),
        )?,
        Some(Recovery::ResetMalformed) => renderer.notice(
            NoticeLevel::Warning,
            &format!("bot list reset to empty at {}", store.path().display()),
        )?,
        None => {}
    }
    renderer.section("Bots")?;
    if outcome.bots.is_empty() {
        renderer.notice(NoticeLevel::Info, "no bots configured")?;
    } else {
        renderer.table(&bot_table(&outcome.bots))?;
    }
    Ok(0)
}

fn run_bot<W: Write>(args: RunArgs, renderer: &mut PlainRenderer<W>) -> Result<i32, RunnerError> {
    let paths = AppPaths::resolve(args.home_override.as_deref());
    let store = ConfigStore::new(paths.bot_config());
    let bot_id = BotId::new(args.bot_id.trim());
    let Some(config) = store.find(&bot_id)? else {
        return Err(RunnerError::BotNotFound {
            bot_id,
            path: store.path().to_path_buf(),
        });
    };
    let settings = LaunchSettings::load(&paths)?;
    let mut supervisor = BotSupervisor::new(
        config,
        settings,
        store,
        NoticeLog::new(),
        DeskLog::to_file(paths.desk_log()),
    );

    if args.plain {
        return run_plain(&mut supervisor, renderer);
    }

    let outcome = run_console(&mut supervisor, ConsoleOptions { draft: args.draft })?;
    render_console_summary(renderer, &supervisor, &outcome)?;
    Ok(0)
}

fn run_update<W: Write>(
    args: ConfigFileArgs,
    renderer: &mut PlainRenderer<W>,
) -> Result<i32, RunnerError> {
    let paths = AppPaths::resolve(args.home_override.as_deref());
    let store = ConfigStore::new(paths.bot_config());
    let updated = BotConfig::from_file(&args.file)?;
    match store.update(&updated) {
        Ok(_) => {
            renderer.success("Update success", "The updated configuration is successful");
            Ok(0)
        }
        Err(ConfigError::UpdateTargetNotFound { .. }) => {
            renderer.error("Update error", "Data loss within the profile");
            Ok(1)
        }
        Err(error) => Err(error.into()),
    }
}

fn run_add<W: Write>(
    args: ConfigFileArgs,
    renderer: &mut PlainRenderer<W>,
) -> Result<i32, RunnerError> {
    let paths = AppPaths::resolve(args.home_override.as_deref());
    let store = ConfigStore::new(paths.bot_config());
    let added = BotConfig::from_file(&args.file)?;
    store.insert(&added)?;
    renderer.success(
        "Bot added",
        &format!("{} ({})", added.display_name(), added.identity()),
    );
    Ok(0)
}

fn run_remove<W: Write>(
    args: RemoveArgs,
    renderer: &mut PlainRenderer<W>,
) -> Result<i32, RunnerError> {
    let paths = AppPaths::resolve(args.home_override.as_deref());
    let store = ConfigStore::new(paths.bot_config());
    let removed = store.remove(&BotId::new(args.bot_id.trim()))?;
    renderer.success(
        "Bot removed",
        &format!("{} ({})", removed.display_name(), removed.identity()),
    );
    Ok(0)
}

/// Writes notices not yet shown, advancing `shown`.
pub(crate) fn flush_notices<W: Write>(
    renderer: &mut PlainRenderer<W>,
    notices: &NoticeLog,
    shown: &mut usize,
) -> Result<(), RunnerError> {
    for notice in notices.all().iter().skip(*shown) {
        renderer.message(notice.level, &MessageBlock::from(notice))?;
        *shown += 1;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/runner_tests.rs"]
mod tests;
