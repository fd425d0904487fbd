use std::fmt::{Display, Formatter};

use crate::ui::widgets::{KeyValue, MessageBlock, NoticeLevel, TableSpec};

pub type UiResult<T> = Result<T, UiError>;

#[derive(Debug)]
pub enum UiError {
    Io(std::io::Error),
}

impl Display for UiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UiError::Io(error) => write!(f, "failed to write terminal output: {error}"),
        }
    }
}

impl std::error::Error for UiError {}

impl From<std::io::Error> for UiError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Line-oriented output surface for everything outside the console.
pub trait Renderer {
    /// Writes bot output exactly as received. Chunks may end mid-line.
    fn stream(&mut self, chunk: &str) -> UiResult<()>;
    fn section(&mut self, title: &str) -> UiResult<()>;
    fn notice(&mut self, level: NoticeLevel, body: &str) -> UiResult<()>;
    fn message(&mut self, level: NoticeLevel, block: &MessageBlock) -> UiResult<()>;
    fn key_values(&mut self, items: &[KeyValue]) -> UiResult<()>;
    fn table(&mut self, spec: &TableSpec) -> UiResult<()>;

    fn error_block(&mut self, block: &MessageBlock) -> UiResult<()> {
        self.message(NoticeLevel::Error, block)
    }
}
