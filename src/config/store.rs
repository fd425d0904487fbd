use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{BotConfig, BotId};
use crate::notify::NoticeSink;

const EMPTY_LIST: &[u8] = b"[]";

#[derive(Debug)]
pub enum ConfigError {
    Missing {
        path: PathBuf,
    },
    Read {
        path: PathBuf,
        error: std::io::Error,
    },
    Parse {
        path: PathBuf,
        error: serde_json::Error,
    },
    Write {
        path: PathBuf,
        error: std::io::Error,
    },
    Encode(serde_json::Error),
    UpdateTargetNotFound {
        bot_id: BotId,
    },
    RemoveTargetNotFound {
        bot_id: BotId,
    },
    DuplicateIdentity {
        bot_id: BotId,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing { path } => {
                write!(f, "bot config file {} does not exist", path.display())
            }
            ConfigError::Read { path, error } => {
                write!(f, "failed to read bot config {}: {error}", path.display())
            }
            ConfigError::Parse { path, error } => {
                write!(f, "failed to parse bot config {}: {error}", path.display())
            }
            ConfigError::Write { path, error } => {
                write!(f, "failed to write bot config {}: {error}", path.display())
            }
            ConfigError::Encode(error) => write!(f, "failed to encode bot config: {error}"),
            ConfigError::UpdateTargetNotFound { bot_id } => {
                write!(f, "no bot with id `{bot_id}` in the configuration list")
            }
            ConfigError::RemoveTargetNotFound { bot_id } => {
                write!(f, "cannot remove `{bot_id}`: no such bot")
            }
            ConfigError::DuplicateIdentity { bot_id } => {
                write!(f, "a bot with id `{bot_id}` already exists")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    CreatedEmpty,
    ResetMalformed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub bots: Vec<BotConfig>,
    pub recovery: Option<Recovery>,
}

/// Persisted list of bot configurations, stored as one JSON array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Strict read: no recovery, no notices.
    pub fn read(&self) -> Result<Vec<BotConfig>, ConfigError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Err(ConfigError::Missing {
                    path: self.path.clone(),
                })
            }
            Err(error) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    error,
                })
            }
        };
        serde_json::from_slice::<Vec<BotConfig>>(&raw).map_err(|error| ConfigError::Parse {
            path: self.path.clone(),
            error,
        })
    }

    /// Reads the list with recovery: a missing file becomes an empty list on
    /// disk, a malformed file is reported and reset to empty.
    pub fn load(&self, notices: &mut dyn NoticeSink) -> Result<LoadOutcome, ConfigError> {
        match self.read() {
            Ok(bots) => {
                if bots.is_empty() {
                    notices.info(
                        "There are no bot configuration items",
                        "You'll need to add one with `napdesk add`",
                    );
                } else {
                    notices.success(
                        "Load the list of bots",
                        "The list of bots was successfully loaded",
                    );
                }
                Ok(LoadOutcome {
                    bots,
                    recovery: None,
                })
            }
            Err(ConfigError::Missing { .. }) => {
                self.write_raw(EMPTY_LIST)?;
                Ok(LoadOutcome {
                    bots: Vec::new(),
                    recovery: Some(Recovery::CreatedEmpty),
                })
            }
            Err(ConfigError::Parse { error, .. }) => {
                notices.error("Unable to load bot list", &error.to_string());
                self.write_raw(EMPTY_LIST)?;
                Ok(LoadOutcome {
                    bots: Vec::new(),
                    recovery: Some(Recovery::ResetMalformed),
                })
            }
            Err(error) => Err(error),
        }
    }

    pub fn save(&self, bots: &[BotConfig]) -> Result<(), ConfigError> {
        let body = encode_pretty(bots)?;
        self.write_raw(&body)
    }

    pub fn find(&self, bot_id: &BotId) -> Result<Option<BotConfig>, ConfigError> {
        let bots = self.read_or_empty()?;
        Ok(bots.into_iter().find(|bot| bot.identity() == bot_id))
    }

    /// Replaces the first entry sharing `updated`'s identity and writes the
    /// whole list back. Returns the index that was replaced.
    pub fn update(&self, updated: &BotConfig) -> Result<usize, ConfigError> {
        let mut bots = self.read_or_empty()?;
        let Some(index) = bots.iter().position(|bot| bot.same_identity(updated)) else {
            return Err(ConfigError::UpdateTargetNotFound {
                bot_id: updated.identity().clone(),
            });
        };
        bots[index] = updated.clone();
        self.save(&bots)?;
        Ok(index)
    }

    pub fn insert(&self, added: &BotConfig) -> Result<(), ConfigError> {
        let mut bots = self.read_or_empty()?;
        if bots.iter().any(|bot| bot.same_identity(added)) {
            return Err(ConfigError::DuplicateIdentity {
                bot_id: added.identity().clone(),
            });
        }
        bots.push(added.clone());
        self.save(&bots)
    }

    pub fn remove(&self, bot_id: &BotId) -> Result<BotConfig, ConfigError> {
        let mut bots = self.read_or_empty()?;
        let Some(index) = bots.iter().position(|bot| bot.identity() == bot_id) else {
            return Err(ConfigError::RemoveTargetNotFound {
                bot_id: bot_id.clone(),
            });
        };
        let removed = bots.remove(index);
        self.save(&bots)?;
        Ok(removed)
    }

    fn read_or_empty(&self) -> Result<Vec<BotConfig>, ConfigError> {
        match self.read() {
            Ok(bots) => Ok(bots),
            Err(ConfigError::Missing { .. }) => Ok(Vec::new()),
            Err(error) => Err(error),
        }
    }

    fn write_raw(&self, body: &[u8]) -> Result<(), ConfigError> {
        let write_error = |error: std::io::Error| ConfigError::Write {
            path: self.path.clone(),
            error,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_error)?;
            }
        }
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);
        fs::write(&staging, body).map_err(write_error)?;
        fs::rename(&staging, &self.path).map_err(write_error)
    }
}

/// Four-space indented JSON.
pub fn encode_pretty<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}

#[cfg(test)]
#[path = "../tests/config_store_tests.rs"]
mod tests;
