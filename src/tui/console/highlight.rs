use std::sync::LazyLock;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use regex::Regex;

static LEVEL_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(fatal|error|warn(?:ing)?|info|debug|trace)\b").expect("level keyword pattern")
});

const FINISH_PREFIX: &str = "process finished with exit code";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_lowercase().as_str() {
            "fatal" | "error" => LogLevel::Error,
            "warn" | "warning" => LogLevel::Warn,
            "info" => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }

    fn style(self) -> Style {
        match self {
            LogLevel::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            LogLevel::Warn => Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            LogLevel::Info => Style::default().fg(Color::Green),
            LogLevel::Debug => Style::default().fg(Color::DarkGray),
        }
    }
}

pub(super) fn highlight_line(line: &str) -> Line<'static> {
    if line.starts_with(FINISH_PREFIX) {
        return Line::from(vec![
            Span::styled("[exit] ", Style::default().fg(Color::Yellow)),
            Span::styled(line.to_owned(), Style::default().fg(Color::Gray)),
        ]);
    }
    let Some(found) = LEVEL_KEYWORD.find(line) else {
        return Line::from(line.to_owned());
    };
    let level = LogLevel::from_keyword(found.as_str());
    let rest_style = match level {
        LogLevel::Error => Style::default().fg(Color::LightRed),
        LogLevel::Debug => Style::default().fg(Color::DarkGray),
        LogLevel::Warn | LogLevel::Info => Style::default(),
    };
    Line::from(vec![
        Span::styled(line[..found.start()].to_owned(), rest_style),
        Span::styled(found.as_str().to_owned(), level.style()),
        Span::styled(line[found.end()..].to_owned(), rest_style),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_level_keyword_wins() {
        let line = highlight_line("10-17 12:00:01 [INFO] login ok, error count 0");
        assert_eq!(line.spans[1].content.as_ref(), "INFO");
        assert_eq!(line.spans[1].style.fg, Some(Color::Green));

        let line = highlight_line("[Warning] token expired");
        assert_eq!(line.spans[1].content.as_ref(), "Warning");
        assert_eq!(line.spans[1].style.fg, Some(Color::Yellow));

        let line = highlight_line("information only");
        assert_eq!(line.spans.len(), 1);
    }

    #[test]
    fn highlight_splits_keyword_into_its_own_span() {
        let line = highlight_line("a [ERROR] b");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content.as_ref(), "ERROR");
        assert_eq!(line.spans[1].style.fg, Some(Color::Red));
    }

    #[test]
    fn finish_line_gets_exit_marker() {
        let line = highlight_line("process finished with exit code 0, status normal");
        assert_eq!(line.spans[0].content.as_ref(), "[exit] ");
    }
}
