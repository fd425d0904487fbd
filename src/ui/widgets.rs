/// Severity shared by the plain renderer and the console footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    /// Bracketed tag printed in front of a message block, e.g. `[error]`.
    pub fn tag(self) -> &'static str {
        match self {
            NoticeLevel::Info => "[info]",
            NoticeLevel::Success => "[success]",
            NoticeLevel::Warning => "[warning]",
            NoticeLevel::Error => "[error]",
        }
    }

    /// Short label used for one-line notices.
    pub fn short_label(self) -> &'static str {
        match self {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Warning => "warn",
            NoticeLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBlock {
    pub title: String,
    pub body: String,
    pub hint: Option<String>,
}

impl MessageBlock {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// One `label: value` line of a bot summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableSpec {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn with_headers(headers: &[&str]) -> Self {
        Self::new(headers.iter().map(|header| (*header).to_owned()).collect(), Vec::new())
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_map_to_block_tags() {
        assert_eq!(NoticeLevel::Success.tag(), "[success]");
        assert_eq!(NoticeLevel::Error.tag(), "[error]");
        assert_eq!(NoticeLevel::Warning.short_label(), "warn");
    }

    #[test]
    fn table_rows_accumulate() {
        let mut table = TableSpec::with_headers(&["botId", "name"]);
        assert!(table.is_empty());
        table.push_row(vec!["10001".to_owned(), "main".to_owned()]);
        assert_eq!(table.headers, vec!["botId".to_owned(), "name".to_owned()]);
        assert_eq!(table.rows.len(), 1);
    }
}
