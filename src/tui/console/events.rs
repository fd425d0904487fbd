use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::BotConfig;
use crate::notify::NoticeSink;
use crate::supervisor::{BotPage, BotSupervisor, ControlSet, StopOutcome, SupervisorError};

use super::state::ConsoleState;

const PAGE_SCROLL: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ConsoleAction {
    Start,
    Stop,
    Reboot,
    UpdateConfig,
    ReturnToList,
    SetupReturn,
    Quit,
    NextPage,
    PreviousPage,
    ShowPage(BotPage),
    ToggleFollow,
    ScrollUp(usize),
    ScrollDown(usize),
    ScrollTop,
    ScrollBottom,
}

pub(super) enum LoopControl {
    Continue,
    Quit,
}

/// Maps a key to an action, honoring only controls visible on `page`.
pub(super) fn map_key(key: KeyEvent, page: BotPage, controls: ControlSet) -> Option<ConsoleAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(ConsoleAction::Quit);
    }
    let action = match key.code {
        KeyCode::Char('q') => ConsoleAction::Quit,
        KeyCode::Tab => ConsoleAction::NextPage,
        KeyCode::BackTab => ConsoleAction::PreviousPage,
        KeyCode::Char('1') => ConsoleAction::ShowPage(BotPage::Info),
        KeyCode::Char('2') => ConsoleAction::ShowPage(BotPage::Setup),
        KeyCode::Char('3') => ConsoleAction::ShowPage(BotPage::Log),
        KeyCode::Char('s') if controls.run => ConsoleAction::Start,
        KeyCode::Char('x') if controls.stop => ConsoleAction::Stop,
        KeyCode::Char('r') if controls.reboot => ConsoleAction::Reboot,
        KeyCode::Char('u') if controls.update_config => ConsoleAction::UpdateConfig,
        KeyCode::Char('b') | KeyCode::Esc if controls.setup_return => ConsoleAction::SetupReturn,
        KeyCode::Char('b') | KeyCode::Esc if controls.return_list => ConsoleAction::ReturnToList,
        KeyCode::Char('f') if page == BotPage::Log => ConsoleAction::ToggleFollow,
        KeyCode::Up | KeyCode::Char('k') if page == BotPage::Log => ConsoleAction::ScrollUp(1),
        KeyCode::Down | KeyCode::Char('j') if page == BotPage::Log => ConsoleAction::ScrollDown(1),
        KeyCode::PageUp if page == BotPage::Log => ConsoleAction::ScrollUp(PAGE_SCROLL),
        KeyCode::PageDown if page == BotPage::Log => ConsoleAction::ScrollDown(PAGE_SCROLL),
        KeyCode::Home if page == BotPage::Log => ConsoleAction::ScrollTop,
        KeyCode::End if page == BotPage::Log => ConsoleAction::ScrollBottom,
        _ => return None,
    };
    Some(action)
}

pub(super) fn apply_action<N: NoticeSink>(
    supervisor: &mut BotSupervisor<N>,
    state: &mut ConsoleState,
    action: ConsoleAction,
    log_height: usize,
) -> LoopControl {
    let total = supervisor.log().len();
    match action {
        ConsoleAction::Start => {
            // Launch failures already surface as a notice and a log line.
            if supervisor.start().is_ok() {
                state.page = BotPage::Log;
                state.viewport.jump_to_end();
            }
        }
        ConsoleAction::Stop => match supervisor.stop() {
            Ok(StopOutcome::Stopped(_)) => {
                state.page = BotPage::Info;
                supervisor.notices_mut().success("Stop Successful!", "The bot process was stopped");
            }
            Ok(StopOutcome::NotRunning) => {}
            Err(error) => supervisor.notices_mut().error("Stop error", &error.to_string()),
        },
        ConsoleAction::Reboot => match supervisor.reboot() {
            Ok(_) => {
                state.page = BotPage::Log;
                state.viewport.jump_to_end();
            }
            // The supervisor already posted "Start error" for this one.
            Err(SupervisorError::Launch(_)) => {}
            Err(error) => supervisor.notices_mut().error("Reboot error", &error.to_string()),
        },
        ConsoleAction::UpdateConfig => update_from_draft(supervisor, state),
        ConsoleAction::SetupReturn => state.page = BotPage::Info,
        ConsoleAction::ReturnToList => {
            state.returned_to_list = true;
            return LoopControl::Quit;
        }
        ConsoleAction::Quit => return LoopControl::Quit,
        ConsoleAction::NextPage => state.page = state.page.next(),
        ConsoleAction::PreviousPage => state.page = state.page.previous(),
        ConsoleAction::ShowPage(page) => state.page = page,
        ConsoleAction::ToggleFollow => state.viewport.toggle_follow(total, log_height),
        ConsoleAction::ScrollUp(lines) => state.viewport.scroll_up(lines, total, log_height),
        ConsoleAction::ScrollDown(lines) => state.viewport.scroll_down(lines, total, log_height),
        ConsoleAction::ScrollTop => state.viewport.jump_to_start(),
        ConsoleAction::ScrollBottom => state.viewport.jump_to_end(),
    }
    LoopControl::Continue
}

fn update_from_draft<N: NoticeSink>(supervisor: &mut BotSupervisor<N>, state: &mut ConsoleState) {
    let Some(draft) = state.draft.clone() else {
        supervisor.notices_mut().info(
            "No draft file",
            "Start the console with --draft <FILE> to apply edits",
        );
        return;
    };
    match BotConfig::from_file(&draft) {
        Ok(updated) => {
            // The outcome is reported through the notice sink.
            let _ = supervisor.update_config(updated);
        }
        Err(error) => supervisor
            .notices_mut()
            .error("Update error", &error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervisor::LifecycleState;
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    #[test]
    fn start_key_only_works_when_run_control_is_visible() {
        let idle = ControlSet::for_view(BotPage::Info, LifecycleState::Idle);
        let running = ControlSet::for_view(BotPage::Info, LifecycleState::Running);
        assert_eq!(
            map_key(key(KeyCode::Char('s')), BotPage::Info, idle),
            Some(ConsoleAction::Start)
        );
        assert_eq!(map_key(key(KeyCode::Char('s')), BotPage::Info, running), None);
        assert_eq!(
            map_key(key(KeyCode::Char('x')), BotPage::Info, running),
            Some(ConsoleAction::Stop)
        );
    }

    #[test]
    fn setup_page_routes_back_to_setup_return() {
        let controls = ControlSet::for_view(BotPage::Setup, LifecycleState::Running);
        assert_eq!(
            map_key(key(KeyCode::Esc), BotPage::Setup, controls),
            Some(ConsoleAction::SetupReturn)
        );
        assert_eq!(map_key(key(KeyCode::Char('r')), BotPage::Setup, controls), None);
        assert_eq!(
            map_key(key(KeyCode::Char('u')), BotPage::Setup, controls),
            Some(ConsoleAction::UpdateConfig)
        );
    }

    #[test]
    fn scroll_keys_only_apply_on_log_page() {
        let controls = ControlSet::for_view(BotPage::Info, LifecycleState::Idle);
        assert_eq!(map_key(key(KeyCode::PageUp), BotPage::Info, controls), None);
        assert_eq!(
            map_key(key(KeyCode::PageUp), BotPage::Log, controls),
            Some(ConsoleAction::ScrollUp(PAGE_SCROLL))
        );
    }

    #[test]
    fn ctrl_c_always_quits() {
        let mut event = key(KeyCode::Char('c'));
        event.modifiers = KeyModifiers::CONTROL;
        assert_eq!(
            map_key(event, BotPage::Setup, ControlSet::default()),
            Some(ConsoleAction::Quit)
        );
    }

    #[cfg(unix)]
    #[test]
    fn failed_relaunch_during_reboot_posts_a_single_notice() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use std::time::{Duration, SystemTime, UNIX_EPOCH};

        use crate::config::ConfigStore;
        use crate::logging::DeskLog;
        use crate::notify::NoticeLog;
        use crate::paths::AppPaths;
        use crate::process_manager::PLATFORM_EXECUTABLE;
        use crate::settings::LaunchSettings;
        use crate::ui::NoticeLevel;

        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        let root = std::env::temp_dir().join(format!("napdesk-console-reboot-{ts}"));
        let runtime = root.join("runtime");
        fs::create_dir_all(&runtime).expect("mkdir");
        let executable = runtime.join(PLATFORM_EXECUTABLE);
        // The runtime removes itself, so the relaunch half of a reboot fails.
        fs::write(&executable, "#!/bin/sh\nrm -f \"$0\"\necho gone\nexec sleep 30\n")
            .expect("write runtime");
        let mut permissions = fs::metadata(&executable).expect("metadata").permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(&executable, permissions).expect("chmod");

        let config: BotConfig = serde_json::from_value(serde_json::json!({
            "bot": { "botId": "10001", "name": "main" },
            "advanced": { "runtimePath": runtime },
        }))
        .expect("config");
        let paths = AppPaths::new(&root);
        let mut settings = LaunchSettings::defaults(&paths);
        settings.stop_timeout = Duration::from_secs(2);
        let mut supervisor = BotSupervisor::new(
            config,
            settings,
            ConfigStore::new(paths.bot_config()),
            NoticeLog::new(),
            DeskLog::disabled(),
        );
        supervisor.start().expect("start");
        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        while !supervisor.log().text().contains("gone") {
            assert!(std::time::Instant::now() < deadline, "runtime never reported");
            let _ = supervisor.wait_event(Duration::from_millis(50));
        }

        let mut state = ConsoleState::new(None);
        state.page = BotPage::Info;
        apply_action(&mut supervisor, &mut state, ConsoleAction::Reboot, 20);

        assert!(!supervisor.is_running());
        assert_eq!(supervisor.notices().count(NoticeLevel::Error), 1);
        let latest = supervisor.notices().latest().expect("notice");
        assert_eq!(latest.title, "Start error");
        assert_eq!(state.page, BotPage::Info);
    }
}
