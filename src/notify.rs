use std::io::Write;

use crate::ui::{MessageBlock, NoticeLevel, PlainRenderer, Renderer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            body: body.into(),
        }
    }
}

/// User-facing notification surface: success, informational and error
/// notices, each with a title and a body.
pub trait NoticeSink {
    fn notify(&mut self, notice: Notice);

    fn success(&mut self, title: &str, body: &str) {
        self.notify(Notice::new(NoticeLevel::Success, title, body));
    }

    fn info(&mut self, title: &str, body: &str) {
        self.notify(Notice::new(NoticeLevel::Info, title, body));
    }

    fn error(&mut self, title: &str, body: &str) {
        self.notify(Notice::new(NoticeLevel::Error, title, body));
    }
}

impl<T: NoticeSink + ?Sized> NoticeSink for &mut T {
    fn notify(&mut self, notice: Notice) {
        (**self).notify(notice);
    }
}

impl From<&Notice> for MessageBlock {
    fn from(notice: &Notice) -> Self {
        MessageBlock::new(notice.title.clone(), notice.body.clone())
    }
}

// Write failures are dropped: a notice must never abort the operation it reports on.
impl<W: Write> NoticeSink for PlainRenderer<W> {
    fn notify(&mut self, notice: Notice) {
        let _ = self.message(notice.level, &MessageBlock::from(&notice));
    }
}

/// Keeps every notice in arrival order. The console shows the latest one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoticeLog {
    notices: Vec<Notice>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.notices.last()
    }

    pub fn all(&self) -> &[Notice] {
        &self.notices
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        self.notices
            .iter()
            .filter(|notice| notice.level == level)
            .count()
    }
}

impl NoticeSink for NoticeLog {
    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}
