use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    Startup,
    Runtime,
    Restart,
    Shutdown,
}

impl LogCategory {
    fn as_label(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Runtime => "runtime",
            Self::Restart => "restart",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Append-only operational log for the desk itself. Failures to write are
/// swallowed; this log must never take the supervisor down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeskLog {
    path: Option<PathBuf>,
}

impl DeskLog {
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn record(&self, category: LogCategory, message: &str) {
        let Some(path) = &self.path else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let line = format_line(now_epoch_ms(), category, message);
        let _ = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
    }
}

fn format_line(epoch_ms: u128, category: LogCategory, message: &str) -> String {
    format!("[{epoch_ms}] [{}] {message}\n", category.as_label())
}

fn now_epoch_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_line_includes_category_label() {
        assert_eq!(
            format_line(42, LogCategory::Restart, "bot 1 rebooted"),
            "[42] [restart] bot 1 rebooted\n"
        );
    }

    #[test]
    fn record_appends_lines_and_creates_parent_dirs() {
        let ts = now_epoch_ms();
        let path = std::env::temp_dir()
            .join(format!("napdesk-desklog-{ts}"))
            .join("logs")
            .join("napdesk.log");
        let log = DeskLog::to_file(&path);
        log.record(LogCategory::Startup, "first");
        log.record(LogCategory::Shutdown, "second");
        let body = fs::read_to_string(&path).expect("read log");
        let lines = body.lines().collect::<Vec<&str>>();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[startup] first"));
        assert!(lines[1].ends_with("[shutdown] second"));
    }

    #[test]
    fn disabled_log_writes_nothing() {
        let log = DeskLog::disabled();
        log.record(LogCategory::Runtime, "ignored");
        assert!(log.path().is_none());
    }
}
