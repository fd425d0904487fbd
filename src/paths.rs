use std::path::{Path, PathBuf};

pub const HOME_ENV: &str = "NAPDESK_HOME";
const APP_DIR: &str = "napdesk";
const BOT_CONFIG_FILE: &str = "bots.json";
const SETTINGS_FILE: &str = "settings.toml";
const DESK_LOG_FILE: &str = "napdesk.log";

/// Resolves every file location the desk uses from one home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    home: PathBuf,
}

impl AppPaths {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// `--home` wins, then `NAPDESK_HOME`, then the platform config directory.
    pub fn resolve(home_override: Option<&Path>) -> Self {
        if let Some(home) = home_override {
            return Self::new(home);
        }
        if let Some(home) = std::env::var_os(HOME_ENV) {
            let trimmed = home.to_string_lossy().trim().to_owned();
            if !trimmed.is_empty() {
                return Self::new(trimmed);
            }
        }
        let base = dirs::config_dir().unwrap_or_else(std::env::temp_dir);
        Self::new(base.join(APP_DIR))
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn bot_config(&self) -> PathBuf {
        self.home.join(BOT_CONFIG_FILE)
    }

    pub fn settings(&self) -> PathBuf {
        self.home.join(SETTINGS_FILE)
    }

    pub fn desk_log(&self) -> PathBuf {
        self.home.join("logs").join(DESK_LOG_FILE)
    }

    pub fn default_napcat_dir(&self) -> PathBuf {
        self.home.join("napcat")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_override_wins() {
        let paths = AppPaths::resolve(Some(Path::new("/tmp/desk-home")));
        assert_eq!(paths.home(), Path::new("/tmp/desk-home"));
        assert_eq!(paths.bot_config(), PathBuf::from("/tmp/desk-home/bots.json"));
        assert_eq!(
            paths.settings(),
            PathBuf::from("/tmp/desk-home/settings.toml")
        );
        assert_eq!(
            paths.desk_log(),
            PathBuf::from("/tmp/desk-home/logs/napdesk.log")
        );
    }
}
