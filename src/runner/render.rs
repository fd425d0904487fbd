use std::io::Write;

use crate::config::BotConfig;
use crate::notify::NoticeLog;
use crate::process_manager::ExitReport;
use crate::supervisor::BotSupervisor;
use crate::tui::ConsoleOutcome;
use crate::ui::{KeyValue, PlainRenderer, Renderer, TableSpec, UiResult};

pub(super) fn bot_table(bots: &[BotConfig]) -> TableSpec {
    let mut table = TableSpec::with_headers(&["botId", "name", "runtime", "endpoints"]);
    for bot in bots {
        table.push_row(vec![
            bot.identity().to_string(),
            bot.bot.name.clone(),
            bot.advanced.runtime_path.display().to_string(),
            bot.endpoints()
                .iter()
                .map(|url| url.as_str())
                .collect::<Vec<&str>>()
                .join(", "),
        ]);
    }
    table
}

pub(super) fn render_plain_summary<W: Write>(
    renderer: &mut PlainRenderer<W>,
    supervisor: &BotSupervisor<NoticeLog>,
    report: ExitReport,
) -> UiResult<()> {
    renderer.section("Bot summary")?;
    renderer.key_values(&[
        KeyValue::new("bot", bot_label(supervisor.config())),
        KeyValue::new("exit", exit_label(Some(report))),
        KeyValue::new("log lines", supervisor.log().len().to_string()),
    ])
}

pub(super) fn render_console_summary<W: Write>(
    renderer: &mut PlainRenderer<W>,
    supervisor: &BotSupervisor<NoticeLog>,
    outcome: &ConsoleOutcome,
) -> UiResult<()> {
    renderer.section("Bot summary")?;
    let mut items = vec![
        KeyValue::new("bot", bot_label(supervisor.config())),
        KeyValue::new("starts", outcome.starts.to_string()),
        KeyValue::new("last exit", exit_label(outcome.last_exit)),
        KeyValue::new("log lines", outcome.log_lines.to_string()),
    ];
    if outcome.stopped_on_quit.is_some() {
        items.push(KeyValue::new("on quit", "bot was still running and has been stopped"));
    }
    if outcome.returned_to_list {
        items.push(KeyValue::new("next", "run `napdesk list` to pick another bot"));
    }
    renderer.key_values(&items)
}

fn bot_label(config: &BotConfig) -> String {
    format!("{} ({})", config.display_name(), config.identity())
}

fn exit_label(report: Option<ExitReport>) -> String {
    match report {
        Some(report) => format!("code {} ({})", report.code, report.kind),
        None => "-".to_owned(),
    }
}
