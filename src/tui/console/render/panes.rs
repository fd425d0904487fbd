use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap};
use ratatui::Frame;

use crate::config::store::encode_pretty;
use crate::supervisor::LifecycleState;
use crate::tui::core::format_elapsed;

use super::super::highlight::highlight_line;
use super::header::panel_block;
use super::ConsoleView;

pub(super) fn render_info_pane(frame: &mut Frame<'_>, area: Rect, view: &ConsoleView<'_>) {
    let config = view.config;
    let state_style = match view.state {
        LifecycleState::Running => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        LifecycleState::Idle => Style::default().fg(Color::Gray),
    };
    let mut lines = vec![
        field("name", Span::raw(config.display_name().to_owned())),
        field("bot id", Span::raw(config.identity().to_string())),
        field("state", Span::styled(view.state.to_string(), state_style)),
        field(
            "pid",
            Span::raw(view.pid.map_or_else(|| "-".to_owned(), |pid| pid.to_string())),
        ),
        field(
            "uptime",
            Span::raw(
                view.uptime
                    .map_or_else(|| "-".to_owned(), format_elapsed),
            ),
        ),
        field("starts", Span::raw(view.starts.to_string())),
        field(
            "last exit",
            match view.last_exit {
                Some(report) if report.success() => Span::styled(
                    format!("{} ({})", report.code, report.kind),
                    Style::default().fg(Color::Green),
                ),
                Some(report) => Span::styled(
                    format!("{} ({})", report.code, report.kind),
                    Style::default().fg(Color::Red),
                ),
                None => Span::raw("-"),
            },
        ),
        field(
            "runtime",
            Span::raw(config.advanced.runtime_path.display().to_string()),
        ),
        field("command", Span::raw(view.command_line.clone())),
        field(
            "heartbeat",
            Span::raw(format!("{}ms", config.connect.heart_interval)),
        ),
    ];
    let endpoints = config.endpoints();
    if endpoints.is_empty() {
        lines.push(field("endpoints", Span::styled("none", Style::default().fg(Color::DarkGray))));
    } else {
        for (index, url) in endpoints.into_iter().enumerate() {
            let label = if index == 0 { "endpoints" } else { "" };
            lines.push(field(label, Span::raw(url.to_string())));
        }
    }

    let pane = Paragraph::new(lines)
        .block(panel_block(Some(" Bot info "), false, Color::DarkGray))
        .wrap(Wrap { trim: false });
    frame.render_widget(pane, area);
}

pub(super) fn render_setup_pane(frame: &mut Frame<'_>, area: Rect, view: &ConsoleView<'_>) {
    let muted = Style::default().fg(Color::DarkGray);
    let mut lines = vec![match view.draft {
        Some(path) => Line::from(vec![
            Span::styled("draft: ", muted),
            Span::styled(path.display().to_string(), Style::default().fg(Color::Yellow)),
            Span::styled("  (u applies it)", muted),
        ]),
        None => Line::from(Span::styled(
            "no draft file; restart with --draft <FILE> to edit",
            muted,
        )),
    }];
    lines.push(Line::default());
    match encode_pretty(view.config) {
        Ok(body) => lines.extend(
            String::from_utf8_lossy(&body)
                .lines()
                .map(|line| Line::from(line.to_owned())),
        ),
        Err(error) => lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        ))),
    }

    let pane = Paragraph::new(lines).block(panel_block(Some(" Bot setup "), false, Color::DarkGray));
    frame.render_widget(pane, area);
}

pub(super) fn render_log_pane(frame: &mut Frame<'_>, area: Rect, view: &ConsoleView<'_>) {
    let height = area.height.saturating_sub(2) as usize;
    let total = view.log.len();
    let lines = if total == 0 {
        vec![Line::from(Span::styled(
            if view.state == LifecycleState::Running {
                "waiting for first output..."
            } else {
                "no output yet; press s to start the bot"
            },
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        view.log
            .lines()
            .skip(view.log_offset)
            .take(height.max(1))
            .map(highlight_line)
            .collect::<Vec<Line>>()
    };

    let title = if view.log.dropped() > 0 {
        format!(" Bot log ({} older lines dropped) ", view.log.dropped())
    } else {
        " Bot log ".to_owned()
    };
    frame.render_widget(
        Paragraph::new(lines).block(panel_block(Some(&title), false, Color::DarkGray)),
        area,
    );

    if total > 0 {
        let mut scrollbar_state = ScrollbarState::new(total)
            .viewport_content_length(height.max(1))
            .position(view.log_offset);
        frame.render_stateful_widget(
            Scrollbar::default().orientation(ScrollbarOrientation::VerticalRight),
            area,
            &mut scrollbar_state,
        );
    }
}

fn field(label: &str, value: Span<'static>) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{label:>10}  "),
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        ),
        value,
    ])
}
