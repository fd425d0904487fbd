use super::{run_command_with, RunnerError};
use crate::config::{ConfigError, ConfigStore};
use crate::ui::PlainRenderer;
use crate::{Command, ConfigFileArgs, ListArgs, RemoveArgs, RunArgs};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[test]
fn list_on_fresh_home_creates_empty_store() {
    let home = temp_workspace("list-fresh");
    let (code, out) = run(Command::List(ListArgs {
        home_override: Some(home.clone()),
    }))
    .expect("list");
    assert_eq!(code, 0);
    assert!(out.contains("created empty bot list"));
    assert!(out.contains("no bots configured"));
    assert_eq!(fs::read_to_string(home.join("bots.json")).expect("read"), "[]");
}

#[test]
fn add_then_list_renders_table() {
    let home = temp_workspace("add-list");
    let file = write_bot_file(&home, "new.json", "20002", "helper");
    let (code, out) = run(Command::Add(ConfigFileArgs {
        file,
        home_override: Some(home.clone()),
    }))
    .expect("add");
    assert_eq!(code, 0);
    assert!(out.contains("[success] Bot added"));

    let (_, out) = run(Command::List(ListArgs {
        home_override: Some(home),
    }))
    .expect("list");
    assert!(out.contains("[success] Load the list of bots"));
    assert!(out.contains("20002"));
    assert!(out.contains("helper"));
}

#[test]
fn list_on_malformed_store_warns_and_resets() {
    let home = temp_workspace("list-malformed");
    fs::write(home.join("bots.json"), "[{").expect("seed");
    let (code, out) = run(Command::List(ListArgs {
        home_override: Some(home.clone()),
    }))
    .expect("list");
    assert_eq!(code, 0);
    assert!(out.contains("[error] Unable to load bot list"));
    assert!(out.contains("bot list reset to empty"));
    assert_eq!(fs::read_to_string(home.join("bots.json")).expect("read"), "[]");
}

#[test]
fn update_without_matching_bot_reports_error_notice() {
    let home = temp_workspace("update-missing");
    fs::write(home.join("bots.json"), "[]").expect("seed");
    let file = write_bot_file(&home, "edit.json", "1", "ghost");
    let (code, out) = run(Command::Update(ConfigFileArgs {
        file,
        home_override: Some(home),
    }))
    .expect("update");
    assert_eq!(code, 1);
    assert!(out.contains("[error] Update error"));
    assert!(out.contains("Data loss within the profile"));
}

#[test]
fn update_replaces_stored_entry() {
    let home = temp_workspace("update-ok");
    let original = write_bot_file(&home, "orig.json", "1", "before");
    run(Command::Add(ConfigFileArgs {
        file: original,
        home_override: Some(home.clone()),
    }))
    .expect("add");
    let edited = write_bot_file(&home, "edit.json", "1", "after");
    let (code, out) = run(Command::Update(ConfigFileArgs {
        file: edited,
        home_override: Some(home.clone()),
    }))
    .expect("update");
    assert_eq!(code, 0);
    assert!(out.contains("[success] Update success"));
    let stored = ConfigStore::new(home.join("bots.json")).read().expect("read");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].bot.name, "after");
}

#[test]
fn remove_unknown_bot_is_an_error() {
    let home = temp_workspace("remove-unknown");
    let err = run(Command::Remove(RemoveArgs {
        bot_id: "404".to_owned(),
        home_override: Some(home),
    }))
    .expect_err("should fail");
    assert!(matches!(
        err,
        RunnerError::Config(ConfigError::RemoveTargetNotFound { .. })
    ));
}

#[test]
fn run_unknown_bot_is_an_error() {
    let home = temp_workspace("run-unknown");
    fs::write(home.join("bots.json"), "[]").expect("seed");
    let err = run(Command::Run(RunArgs {
        bot_id: "7".to_owned(),
        home_override: Some(home),
        plain: true,
        draft: None,
    }))
    .expect_err("should fail");
    assert!(err.to_string().contains("no bot with id `7`"));
}

#[test]
fn run_plain_with_missing_runtime_fails_with_notice() {
    let home = temp_workspace("run-missing-runtime");
    let file = write_bot_file(&home, "bot.json", "5", "broken");
    run(Command::Add(ConfigFileArgs {
        file,
        home_override: Some(home.clone()),
    }))
    .expect("add");
    let mut renderer = PlainRenderer::new(Vec::<u8>::new(), false);
    let result = run_command_with(
        Command::Run(RunArgs {
            bot_id: "5".to_owned(),
            home_override: Some(home),
            plain: true,
            draft: None,
        }),
        &mut renderer,
    );
    assert!(matches!(result, Err(RunnerError::Supervisor(_))));
    let out = String::from_utf8(renderer.into_inner()).expect("utf8");
    assert!(out.contains("[error] Start error"));
}

fn run(cmd: Command) -> Result<(i32, String), RunnerError> {
    let mut renderer = PlainRenderer::new(Vec::<u8>::new(), false);
    let code = run_command_with(cmd, &mut renderer)?;
    let out = String::from_utf8(renderer.into_inner()).expect("utf8");
    Ok((code, out))
}

fn write_bot_file(root: &Path, name: &str, bot_id: &str, bot_name: &str) -> PathBuf {
    let path = root.join(name);
    let runtime = root.join("missing-runtime");
    let body = serde_json::json!({
        "bot": { "botId": bot_id, "name": bot_name },
        "connect": { "ws": ["ws://127.0.0.1:3001"] },
        "advanced": { "runtimePath": runtime },
    });
    fs::write(&path, serde_json::to_vec_pretty(&body).expect("encode")).expect("write bot");
    path
}

fn temp_workspace(name: &str) -> PathBuf {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    let root = std::env::temp_dir().join(format!("napdesk-runner-{name}-{ts}"));
    fs::create_dir_all(&root).expect("mkdir");
    root
}
