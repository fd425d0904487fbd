use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::paths::AppPaths;

pub const DEFAULT_MAIN_SCRIPT: &str = "napcat.mjs";
pub const DEFAULT_MODE_ENV_KEY: &str = "ELECTRON_RUN_AS_NODE";
pub const DEFAULT_MODE_ENV_VALUE: &str = "1";
pub const DEFAULT_STOP_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_LOG_MAX_LINES: usize = 5_000;

#[derive(Debug)]
pub enum SettingsError {
    Read {
        path: PathBuf,
        error: std::io::Error,
    },
    Parse {
        path: PathBuf,
        error: toml::de::Error,
    },
    Invalid {
        path: PathBuf,
        detail: String,
    },
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Read { path, error } => {
                write!(f, "failed to read settings {}: {error}", path.display())
            }
            SettingsError::Parse { path, error } => {
                write!(f, "failed to parse settings {}: {error}", path.display())
            }
            SettingsError::Invalid { path, detail } => {
                write!(f, "invalid settings {}: {detail}", path.display())
            }
        }
    }
}

impl std::error::Error for SettingsError {}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawSettings {
    napcat_path: Option<PathBuf>,
    main_script: Option<String>,
    mode_env_key: Option<String>,
    mode_env_value: Option<String>,
    stop_timeout_ms: Option<u64>,
    log_max_lines: Option<usize>,
}

/// Application-wide launch settings shared by every bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSettings {
    pub napcat_path: PathBuf,
    pub main_script: String,
    pub mode_env_key: String,
    pub mode_env_value: String,
    pub stop_timeout: Duration,
    pub log_max_lines: usize,
}

impl LaunchSettings {
    pub fn defaults(paths: &AppPaths) -> Self {
        Self {
            napcat_path: paths.default_napcat_dir(),
            main_script: DEFAULT_MAIN_SCRIPT.to_owned(),
            mode_env_key: DEFAULT_MODE_ENV_KEY.to_owned(),
            mode_env_value: DEFAULT_MODE_ENV_VALUE.to_owned(),
            stop_timeout: Duration::from_millis(DEFAULT_STOP_TIMEOUT_MS),
            log_max_lines: DEFAULT_LOG_MAX_LINES,
        }
    }

    /// A missing settings file means defaults; a malformed one is an error.
    pub fn load(paths: &AppPaths) -> Result<Self, SettingsError> {
        let path = paths.settings();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Ok(Self::defaults(paths))
            }
            Err(error) => return Err(SettingsError::Read { path, error }),
        };
        let parsed: RawSettings = toml::from_str(&raw).map_err(|error| SettingsError::Parse {
            path: path.clone(),
            error,
        })?;
        Self::from_raw(paths, parsed).map_err(|detail| SettingsError::Invalid { path, detail })
    }

    fn from_raw(paths: &AppPaths, raw: RawSettings) -> Result<Self, String> {
        let defaults = Self::defaults(paths);
        let mode_env_key = raw.mode_env_key.unwrap_or(defaults.mode_env_key);
        if mode_env_key.trim().is_empty() || mode_env_key.contains('=') {
            return Err(format!("modeEnvKey `{mode_env_key}` is not a valid variable name"));
        }
        let main_script = raw.main_script.unwrap_or(defaults.main_script);
        if main_script.trim().is_empty() {
            return Err("mainScript must not be empty".to_owned());
        }
        Ok(Self {
            napcat_path: raw.napcat_path.unwrap_or(defaults.napcat_path),
            main_script,
            mode_env_key,
            mode_env_value: raw.mode_env_value.unwrap_or(defaults.mode_env_value),
            stop_timeout: raw
                .stop_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.stop_timeout),
            log_max_lines: raw
                .log_max_lines
                .filter(|lines| *lines > 0)
                .unwrap_or(defaults.log_max_lines),
        })
    }

    pub fn main_script_path(&self) -> PathBuf {
        self.napcat_path.join(&self.main_script)
    }
}
