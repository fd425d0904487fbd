pub mod config;
pub mod logging;
pub mod notify;
pub mod paths;
pub mod process_manager;
pub mod runner;
pub mod settings;
pub mod supervisor;
pub mod tui;
pub mod ui;

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List(ListArgs),
    Run(RunArgs),
    Update(ConfigFileArgs),
    Add(ConfigFileArgs),
    Remove(RemoveArgs),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListArgs {
    pub home_override: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    pub bot_id: String,
    pub home_override: Option<PathBuf>,
    pub plain: bool,
    /// JSON file the console's update action reads the edited config from.
    pub draft: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFileArgs {
    pub file: PathBuf,
    pub home_override: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveArgs {
    pub bot_id: String,
    pub home_override: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliParseError {
    MissingHomeValue,
    MissingFileValue,
    MissingDraftValue,
    MissingBotId { command: &'static str },
    MissingConfigFile { command: &'static str },
    UnexpectedArgument { command: &'static str, arg: String },
    UnknownArgument(String),
    UnknownCommand(String),
}

impl std::fmt::Display for CliParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliParseError::MissingHomeValue => write!(f, "--home requires a value"),
            CliParseError::MissingFileValue => write!(f, "--file requires a value"),
            CliParseError::MissingDraftValue => write!(f, "--draft requires a value"),
            CliParseError::MissingBotId { command } => {
                write!(f, "`{command}` requires a bot id")
            }
            CliParseError::MissingConfigFile { command } => {
                write!(f, "`{command}` requires --file <FILE>")
            }
            CliParseError::UnexpectedArgument { command, arg } => {
                write!(f, "unexpected argument for `{command}`: {arg}")
            }
            CliParseError::UnknownArgument(arg) => write!(f, "unknown argument: {arg}"),
            CliParseError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
        }
    }
}

impl std::error::Error for CliParseError {}

pub fn parse_command<I>(args: I) -> Result<Command, CliParseError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(cmd) = args.next() else {
        return Ok(Command::Help);
    };

    match cmd.as_str() {
        "--help" | "-h" | "help" => Ok(Command::Help),
        "list" => parse_list(args),
        "run" => parse_run(args),
        "update" => parse_config_file("update", args).map(Command::Update),
        "add" => parse_config_file("add", args).map(Command::Add),
        "remove" => parse_remove(args),
        other if other.starts_with('-') => Err(CliParseError::UnknownArgument(other.to_owned())),
        other => Err(CliParseError::UnknownCommand(other.to_owned())),
    }
}

fn parse_list<I>(args: I) -> Result<Command, CliParseError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut home_override: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--home" => home_override = Some(next_path(&mut args, CliParseError::MissingHomeValue)?),
            "--help" | "-h" => return Ok(Command::Help),
            other => return Err(CliParseError::UnknownArgument(other.to_owned())),
        }
    }

    Ok(Command::List(ListArgs { home_override }))
}

fn parse_run<I>(args: I) -> Result<Command, CliParseError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut bot_id: Option<String> = None;
    let mut home_override: Option<PathBuf> = None;
    let mut plain = false;
    let mut draft: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--home" => home_override = Some(next_path(&mut args, CliParseError::MissingHomeValue)?),
            "--draft" => draft = Some(next_path(&mut args, CliParseError::MissingDraftValue)?),
            "--plain" => plain = true,
            "--help" | "-h" => return Ok(Command::Help),
            other if other.starts_with('-') => {
                return Err(CliParseError::UnknownArgument(other.to_owned()))
            }
            other => {
                if bot_id.is_some() {
                    return Err(CliParseError::UnexpectedArgument {
                        command: "run",
                        arg: other.to_owned(),
                    });
                }
                bot_id = Some(other.to_owned());
            }
        }
    }

    let Some(bot_id) = bot_id else {
        return Err(CliParseError::MissingBotId { command: "run" });
    };
    Ok(Command::Run(RunArgs {
        bot_id,
        home_override,
        plain,
        draft,
    }))
}

fn parse_config_file<I>(command: &'static str, args: I) -> Result<ConfigFileArgs, CliParseError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut file: Option<PathBuf> = None;
    let mut home_override: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--home" => home_override = Some(next_path(&mut args, CliParseError::MissingHomeValue)?),
            "--file" => file = Some(next_path(&mut args, CliParseError::MissingFileValue)?),
            other => {
                return Err(CliParseError::UnexpectedArgument {
                    command,
                    arg: other.to_owned(),
                })
            }
        }
    }

    let Some(file) = file else {
        return Err(CliParseError::MissingConfigFile { command });
    };
    Ok(ConfigFileArgs {
        file,
        home_override,
    })
}

fn parse_remove<I>(args: I) -> Result<Command, CliParseError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut bot_id: Option<String> = None;
    let mut home_override: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--home" => home_override = Some(next_path(&mut args, CliParseError::MissingHomeValue)?),
            other if other.starts_with('-') => {
                return Err(CliParseError::UnknownArgument(other.to_owned()))
            }
            other if bot_id.is_none() => bot_id = Some(other.to_owned()),
            other => {
                return Err(CliParseError::UnexpectedArgument {
                    command: "remove",
                    arg: other.to_owned(),
                })
            }
        }
    }

    let Some(bot_id) = bot_id else {
        return Err(CliParseError::MissingBotId { command: "remove" });
    };
    Ok(Command::Remove(RemoveArgs {
        bot_id,
        home_override,
    }))
}

fn next_path<I>(args: &mut I, missing: CliParseError) -> Result<PathBuf, CliParseError>
where
    I: Iterator<Item = String>,
{
    args.next().map(PathBuf::from).ok_or(missing)
}

pub fn print_usage() {
    eprintln!(
        "napdesk\n\nUSAGE:\n  napdesk list [--home <DIR>]\n  napdesk run <BOT_ID> [--home <DIR>] [--plain] [--draft <FILE>]\n  napdesk update --file <FILE> [--home <DIR>]\n  napdesk add --file <FILE> [--home <DIR>]\n  napdesk remove <BOT_ID> [--home <DIR>]\n\nCOMMANDS:\n  list              Show configured bots\n  run               Open the bot console (or stream output with --plain)\n  update            Replace the stored bot with the same botId\n  add               Append a new bot configuration\n  remove            Delete a bot configuration\n\nOPTIONS:\n  --home <DIR>      Data directory (default: $NAPDESK_HOME or the platform config dir)\n  --plain           Run without the console; stream sanitized output to stdout\n  --draft <FILE>    Config file the console's update action reads\n  --file <FILE>     Bot configuration JSON file\n\nGENERAL:\n  -h, --help        Print help\n"
    );
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
