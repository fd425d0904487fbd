use std::io::{IsTerminal, Write};

use anstream::{AutoStream, ColorChoice};
use anstyle::Style;

use crate::ui::renderer::{Renderer, UiResult};
use crate::ui::table::render_table;
use crate::ui::theme::{resolve_color_enabled, OutputMode, Theme};
use crate::ui::widgets::{KeyValue, MessageBlock, NoticeLevel, TableSpec};

pub struct PlainRenderer<W: Write> {
    writer: W,
    color_enabled: bool,
    theme: Theme,
}

impl<W: Write> PlainRenderer<W> {
    pub fn new(writer: W, color_enabled: bool) -> Self {
        Self {
            writer,
            color_enabled,
            theme: Theme::default(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn style_text(&self, style: Style, text: &str) -> String {
        if !self.color_enabled {
            return text.to_owned();
        }
        format!("{}{}{}", style.render(), text, style.render_reset())
    }

    fn level_style(&self, level: NoticeLevel) -> Style {
        match level {
            NoticeLevel::Info => self.theme.accent,
            NoticeLevel::Success => self.theme.success,
            NoticeLevel::Warning => self.theme.warning,
            NoticeLevel::Error => self.theme.error,
        }
    }
}

impl PlainRenderer<AutoStream<std::io::Stdout>> {
    pub fn stdout(mode: OutputMode) -> Self {
        let stream = AutoStream::new(std::io::stdout(), color_choice(mode));
        let color_enabled = resolve_color_enabled(mode, std::io::stdout().is_terminal());
        Self::new(stream, color_enabled)
    }
}

impl PlainRenderer<AutoStream<std::io::Stderr>> {
    pub fn stderr(mode: OutputMode) -> Self {
        let stream = AutoStream::new(std::io::stderr(), color_choice(mode));
        let color_enabled = resolve_color_enabled(mode, std::io::stderr().is_terminal());
        Self::new(stream, color_enabled)
    }
}

fn color_choice(mode: OutputMode) -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        return ColorChoice::Never;
    }
    match mode {
        OutputMode::Auto => ColorChoice::Auto,
        OutputMode::Always => ColorChoice::AlwaysAnsi,
        OutputMode::Never => ColorChoice::Never,
    }
}

impl<W: Write> Renderer for PlainRenderer<W> {
    fn stream(&mut self, chunk: &str) -> UiResult<()> {
        write!(self.writer, "{chunk}")?;
        self.writer.flush()?;
        Ok(())
    }

    fn section(&mut self, title: &str) -> UiResult<()> {
        let rendered = self.style_text(self.theme.accent, title);
        let underline = self.style_text(self.theme.muted, &"─".repeat(title.chars().count()));
        writeln!(self.writer, "{rendered}")?;
        writeln!(self.writer, "{underline}")?;
        Ok(())
    }

    fn notice(&mut self, level: NoticeLevel, body: &str) -> UiResult<()> {
        let marker = self.style_text(self.level_style(level), "•");
        let label = self.style_text(self.theme.muted, level.short_label());
        writeln!(self.writer, "{marker} {label}: {body}")?;
        Ok(())
    }

    fn message(&mut self, level: NoticeLevel, block: &MessageBlock) -> UiResult<()> {
        let marker = self.style_text(self.level_style(level), level.tag());
        writeln!(self.writer, "{marker} {}", block.title)?;
        if !block.body.is_empty() {
            writeln!(self.writer, "  {}", block.body)?;
        }
        if let Some(hint) = &block.hint {
            let hint_label = self.style_text(self.theme.muted, "hint");
            writeln!(self.writer, "  {hint_label}: {hint}")?;
        }
        Ok(())
    }

    fn key_values(&mut self, items: &[KeyValue]) -> UiResult<()> {
        let width = items
            .iter()
            .map(|item| item.key.chars().count())
            .max()
            .unwrap_or(0);
        for item in items {
            let key = self.style_text(self.theme.label, &format!("{:<width$}", item.key));
            let value = self.style_text(self.theme.value, &item.value);
            writeln!(self.writer, "{key}  {value}")?;
        }
        Ok(())
    }

    fn table(&mut self, spec: &TableSpec) -> UiResult<()> {
        let rendered = render_table(spec);
        writeln!(self.writer, "{rendered}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_blocks_without_color_when_disabled() {
        let mut renderer = PlainRenderer::new(Vec::<u8>::new(), false);

        renderer
            .error_block(
                &MessageBlock::new("Bot not found", "No bot with id `42`")
                    .with_hint("Run `napdesk list` to see configured bots"),
            )
            .expect("render error block");

        let rendered = String::from_utf8(renderer.into_inner()).expect("utf8");
        assert_eq!(
            rendered,
            "[error] Bot not found\n  No bot with id `42`\n  hint: Run `napdesk list` to see configured bots\n"
        );
    }

    #[test]
    fn renders_section_and_notice_without_color_when_disabled() {
        let mut renderer = PlainRenderer::new(Vec::<u8>::new(), false);

        renderer.section("Bots").expect("section");
        renderer
            .notice(NoticeLevel::Info, "2 bots configured")
            .expect("notice");

        let rendered = String::from_utf8(renderer.into_inner()).expect("utf8");
        assert_eq!(rendered, "Bots\n────\n• info: 2 bots configured\n");
    }

    #[test]
    fn stream_keeps_partial_lines() {
        let mut renderer = PlainRenderer::new(Vec::<u8>::new(), false);
        renderer.stream("INFO boot").expect("stream");
        renderer.stream("ing\nready").expect("stream");
        let rendered = String::from_utf8(renderer.into_inner()).expect("utf8");
        assert_eq!(rendered, "INFO booting\nready");
    }

    #[test]
    fn key_values_align_on_longest_key() {
        let mut renderer = PlainRenderer::new(Vec::<u8>::new(), false);
        renderer
            .key_values(&[
                KeyValue::new("bot", "main (10001)"),
                KeyValue::new("log lines", "12"),
            ])
            .expect("key values");
        let rendered = String::from_utf8(renderer.into_inner()).expect("utf8");
        assert_eq!(rendered, "bot        main (10001)\nlog lines  12\n");
    }

    #[test]
    fn colored_messages_carry_escape_sequences() {
        let mut renderer = PlainRenderer::new(Vec::<u8>::new(), true);
        renderer
            .message(
                NoticeLevel::Success,
                &MessageBlock::new("Update success", "The updated configuration is successful"),
            )
            .expect("message");
        let rendered = String::from_utf8(renderer.into_inner()).expect("utf8");
        assert!(rendered.contains('\u{1b}'));
        assert!(rendered.contains("[success]"));
    }

    #[test]
    fn renders_table_without_color_when_disabled() {
        let mut renderer = PlainRenderer::new(Vec::<u8>::new(), false);
        let mut table = TableSpec::with_headers(&["botId", "name"]);
        table.push_row(vec!["10001".to_owned(), "main".to_owned()]);
        renderer.table(&table).expect("table");

        let rendered = String::from_utf8(renderer.into_inner()).expect("utf8");
        assert!(rendered.contains("botId"));
        assert!(rendered.contains("10001"));
        assert!(rendered.contains("main"));
    }
}
