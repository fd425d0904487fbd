use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::border;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Tabs};
use ratatui::Frame;

use crate::supervisor::{BotPage, LifecycleState};

use super::ConsoleView;

pub(super) fn render_tabs(frame: &mut Frame<'_>, area: ratatui::layout::Rect, view: &ConsoleView<'_>) {
    let titles = BotPage::ALL
        .iter()
        .map(|page| {
            let style = if *page == view.page {
                Style::default().fg(Color::Magenta)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Line::from(Span::styled(
                format!("{} {}", page.index() + 1, page.title()),
                style,
            ))
        })
        .collect::<Vec<Line>>();

    let title = format!(" NAPDESK · {} ", view.config.display_name());
    let state_color = match view.state {
        LifecycleState::Running => Color::Green,
        LifecycleState::Idle => Color::DarkGray,
    };
    let tabs = Tabs::new(titles)
        .select(view.page.index())
        .block(
            panel_block(Some(&title), true, Color::Magenta).title_top(
                Line::from(Span::styled(
                    format!(" {} ", view.state),
                    Style::default().fg(state_color).add_modifier(Modifier::BOLD),
                ))
                .right_aligned(),
            ),
        )
        .highlight_style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, area);
}

pub(super) fn panel_block<'a>(
    title: Option<&'a str>,
    show_version: bool,
    border_color: Color,
) -> Block<'a> {
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .border_style(Style::default().fg(border_color));
    if let Some(title) = title {
        block = block.title_top(
            Line::from(Span::styled(
                title.to_owned(),
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ))
            .left_aligned(),
        );
    }
    if show_version {
        let version = format!(" v{} ", env!("CARGO_PKG_VERSION"));
        block = block.title_bottom(
            Line::from(Span::styled(
                version,
                Style::default().fg(Color::LightMagenta),
            ))
            .right_aligned(),
        );
    }
    block
}
