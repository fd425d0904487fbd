use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::supervisor::{BotPage, ControlSet};
use crate::ui::NoticeLevel;

use super::ConsoleView;

pub(super) fn render_footer(frame: &mut Frame<'_>, area: ratatui::layout::Rect, view: &ConsoleView<'_>) {
    let muted = Style::default().fg(Color::DarkGray);
    let active = Style::default().fg(Color::Yellow);

    let mut spans = Vec::new();
    for label in control_labels(view.controls) {
        if !spans.is_empty() {
            spans.push(Span::styled("  |  ", muted));
        }
        spans.push(Span::styled(label, active));
    }
    if view.page == BotPage::Log {
        spans.push(Span::styled("  |  ", muted));
        spans.push(Span::styled(
            "follow (f)",
            if view.follow { active } else { muted },
        ));
    }
    spans.push(Span::styled("  |  ", muted));
    spans.push(Span::styled("quit (q)", muted));

    if let Some(notice) = view.latest_notice {
        let color = match notice.level {
            NoticeLevel::Success => Color::Green,
            NoticeLevel::Info => Color::Cyan,
            NoticeLevel::Warning => Color::Yellow,
            NoticeLevel::Error => Color::Red,
        };
        spans.push(Span::styled("  ", muted));
        spans.push(Span::styled(
            format!("{} {}", notice.level.tag(), notice.title),
            Style::default().fg(color),
        ));
        if !notice.body.is_empty() {
            spans.push(Span::styled(format!(": {}", notice.body), muted));
        }
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

pub(super) fn control_labels(controls: ControlSet) -> Vec<&'static str> {
    [
        (controls.run, "start (s)"),
        (controls.stop, "stop (x)"),
        (controls.reboot, "reboot (r)"),
        (controls.update_config, "update config (u)"),
        (controls.setup_return, "back (b)"),
        (controls.return_list, "return to list (b)"),
    ]
    .into_iter()
    .filter_map(|(visible, label)| visible.then_some(label))
    .collect()
}
