use std::ffi::{OsStr, OsString};
use std::fmt::{Display, Formatter};
use std::io::{ErrorKind, Read};
#[cfg(unix)]
use std::os::unix::process::CommandExt;
#[cfg(unix)]
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::{Child, Command as ProcessCommand, ExitStatus, Stdio};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
#[cfg(unix)]
use nix::sys::signal::{kill, Signal};
#[cfg(unix)]
use nix::unistd::{setpgid, Pid};

use crate::config::BotConfig;
use crate::settings::LaunchSettings;

const READ_CHUNK_BYTES: usize = 8 * 1024;
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(40);
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(20);
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_millis(500);

#[cfg(target_os = "windows")]
pub const PLATFORM_EXECUTABLE: &str = "QQ.exe";
#[cfg(target_os = "macos")]
pub const PLATFORM_EXECUTABLE: &str = "QQ";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const PLATFORM_EXECUTABLE: &str = "qq";

/// Everything needed to spawn one bot runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Inherited variables first, the runtime-mode override last.
    pub env: IndexMap<OsString, OsString>,
    pub merge_output: bool,
}

impl LaunchSpec {
    pub fn for_bot(config: &BotConfig, settings: &LaunchSettings) -> Self {
        let program = config.advanced.runtime_path.join(PLATFORM_EXECUTABLE);
        let args = vec![
            settings.main_script_path().into_os_string(),
            OsString::from("-q"),
            OsString::from(config.identity().as_str()),
        ];
        let env = environment_with_override(
            std::env::vars_os(),
            &settings.mode_env_key,
            &settings.mode_env_value,
        );
        Self {
            program,
            args,
            env,
            merge_output: true,
        }
    }

    pub fn command_line(&self) -> String {
        let mut rendered = self.program.display().to_string();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(&arg.to_string_lossy());
        }
        rendered
    }
}

pub fn environment_with_override<I>(
    inherited: I,
    key: &str,
    value: &str,
) -> IndexMap<OsString, OsString>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut env = inherited.into_iter().collect::<IndexMap<OsString, OsString>>();
    env.shift_remove(OsStr::new(key));
    env.insert(OsString::from(key), OsString::from(value));
    env
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Normal,
    Crashed,
}

impl Display for ExitKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitKind::Normal => f.write_str("normal"),
            ExitKind::Crashed => f.write_str("crashed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    pub code: i32,
    pub kind: ExitKind,
}

impl ExitReport {
    pub fn from_status(status: ExitStatus) -> Self {
        #[cfg(unix)]
        {
            if let Some(code) = status.code() {
                return Self {
                    code,
                    kind: ExitKind::Normal,
                };
            }
            Self {
                code: status.signal().unwrap_or(-1),
                kind: ExitKind::Crashed,
            }
        }
        #[cfg(not(unix))]
        {
            Self {
                code: status.code().unwrap_or(-1),
                kind: ExitKind::Normal,
            }
        }
    }

    pub fn success(&self) -> bool {
        self.kind == ExitKind::Normal && self.code == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEventKind {
    Output(Vec<u8>),
    Exit(ExitReport),
    WaitError(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEvent {
    pub run_id: u64,
    pub kind: ProcessEventKind,
}

#[derive(Debug)]
pub enum ProcessManagerError {
    Pipe {
        program: PathBuf,
        error: std::io::Error,
    },
    Spawn {
        program: PathBuf,
        error: std::io::Error,
    },
    Kill {
        pid: u32,
        error: std::io::Error,
    },
    Wait {
        pid: u32,
        error: std::io::Error,
    },
}

impl Display for ProcessManagerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessManagerError::Pipe { program, error } => {
                write!(f, "failed to create output pipe for `{}`: {error}", program.display())
            }
            ProcessManagerError::Spawn { program, error } => {
                write!(f, "failed to spawn `{}`: {error}", program.display())
            }
            ProcessManagerError::Kill { pid, error } => {
                write!(f, "failed to kill process {pid}: {error}")
            }
            ProcessManagerError::Wait { pid, error } => {
                write!(f, "failed waiting for process {pid}: {error}")
            }
        }
    }
}

impl std::error::Error for ProcessManagerError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KillOutcome {
    pub report: ExitReport,
    /// The bounded wait elapsed and the final wait blocked until exit.
    pub overran: bool,
}

/// Set by the output reader once the pipe reaches EOF.
#[derive(Debug, Default)]
struct OutputDrained {
    done: Mutex<bool>,
    signal: Condvar,
}

impl OutputDrained {
    fn mark(&self) {
        *self.done.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.signal.notify_all();
    }

    /// Returns false when `timeout` elapsed first, e.g. a grandchild still
    /// holds the write end.
    fn wait(&self, timeout: Duration) -> bool {
        let guard = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = self
            .signal
            .wait_timeout_while(guard, timeout, |done| !*done)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

/// One live (or just-terminated) bot runtime process.
#[derive(Debug)]
pub struct ProcessHandle {
    run_id: u64,
    pid: u32,
    child: Arc<Mutex<Child>>,
    drained: Arc<OutputDrained>,
    running: bool,
    last_exit: Option<ExitReport>,
}

impl ProcessHandle {
    /// Spawns the process and wires its output and exit into `events`.
    ///
    /// stdout and stderr share one pipe, so output arrives in the order the
    /// process wrote it. The exit event is only sent after the pipe is
    /// drained, bounded by `OUTPUT_DRAIN_GRACE`.
    pub fn spawn(
        run_id: u64,
        spec: LaunchSpec,
        events: Sender<ProcessEvent>,
    ) -> Result<Self, ProcessManagerError> {
        let pipe_error = |error: std::io::Error| ProcessManagerError::Pipe {
            program: spec.program.clone(),
            error,
        };
        let (reader, writer) = std::io::pipe().map_err(pipe_error)?;
        let stderr = if spec.merge_output {
            Stdio::from(writer.try_clone().map_err(pipe_error)?)
        } else {
            Stdio::null()
        };

        let mut command = build_command(&spec);
        command.stdout(writer).stderr(stderr);
        let spawned = command.spawn();
        // The command owns the parent's write ends; the reader only sees EOF
        // once they are closed.
        drop(command);
        let child = spawned.map_err(|error| ProcessManagerError::Spawn {
            program: spec.program.clone(),
            error,
        })?;

        let drained = Arc::new(OutputDrained::default());
        forward_output(reader, run_id, events.clone(), drained.clone());

        let pid = child.id();
        let child = Arc::new(Mutex::new(child));
        watch_exit(child.clone(), run_id, events, drained.clone());

        Ok(Self {
            run_id,
            pid,
            child,
            drained,
            running: true,
            last_exit: None,
        })
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn last_exit(&self) -> Option<ExitReport> {
        self.last_exit
    }

    pub fn mark_exited(&mut self, report: ExitReport) {
        self.running = false;
        self.last_exit = Some(report);
    }

    /// Force-kills the process and waits for the OS to confirm it is gone.
    /// The wait is bounded by `timeout`; past that it blocks until exit.
    /// Output already written is forwarded before this returns.
    pub fn kill_and_wait(&mut self, timeout: Duration) -> Result<KillOutcome, ProcessManagerError> {
        let pid = self.pid;
        let mut child = lock_child(&self.child);
        if let Some(status) = child
            .try_wait()
            .map_err(|error| ProcessManagerError::Wait { pid, error })?
        {
            let report = ExitReport::from_status(status);
            drop(child);
            self.drained.wait(OUTPUT_DRAIN_GRACE);
            self.mark_exited(report);
            return Ok(KillOutcome {
                report,
                overran: false,
            });
        }

        #[cfg(unix)]
        {
            let _ = signal_process_group(pid, Signal::SIGKILL);
        }
        if let Err(error) = child.kill() {
            if error.kind() != ErrorKind::InvalidInput {
                return Err(ProcessManagerError::Kill { pid, error });
            }
        }

        let deadline = Instant::now() + timeout;
        let (status, overran) = loop {
            match child.try_wait() {
                Ok(Some(status)) => break (status, false),
                Ok(None) if Instant::now() >= deadline => {
                    let status = child
                        .wait()
                        .map_err(|error| ProcessManagerError::Wait { pid, error })?;
                    break (status, true);
                }
                Ok(None) => thread::sleep(STOP_POLL_INTERVAL),
                Err(error) => return Err(ProcessManagerError::Wait { pid, error }),
            }
        };
        drop(child);
        self.drained.wait(OUTPUT_DRAIN_GRACE);

        let report = ExitReport::from_status(status);
        self.mark_exited(report);
        Ok(KillOutcome { report, overran })
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if !self.running {
            return;
        }
        let mut child = lock_child(&self.child);
        if matches!(child.try_wait(), Ok(None)) {
            #[cfg(unix)]
            {
                let _ = signal_process_group(self.pid, Signal::SIGKILL);
            }
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn lock_child(child: &Arc<Mutex<Child>>) -> MutexGuard<'_, Child> {
    child.lock().unwrap_or_else(PoisonError::into_inner)
}

fn forward_output<R>(
    mut source: R,
    run_id: u64,
    tx: Sender<ProcessEvent>,
    drained: Arc<OutputDrained>,
) where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = [0u8; READ_CHUNK_BYTES];
        loop {
            match source.read(&mut buf) {
                Ok(0) => break,
                Ok(read) => {
                    let event = ProcessEvent {
                        run_id,
                        kind: ProcessEventKind::Output(buf[..read].to_vec()),
                    };
                    if tx.send(event).is_err() {
                        break;
                    }
                }
                Err(error) if error.kind() == ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        drained.mark();
    });
}

fn watch_exit(
    child: Arc<Mutex<Child>>,
    run_id: u64,
    tx: Sender<ProcessEvent>,
    drained: Arc<OutputDrained>,
) {
    thread::spawn(move || loop {
        let status = lock_child(&child).try_wait();
        let kind = match status {
            Ok(Some(status)) => {
                drained.wait(OUTPUT_DRAIN_GRACE);
                ProcessEventKind::Exit(ExitReport::from_status(status))
            }
            Ok(None) => {
                thread::sleep(EXIT_POLL_INTERVAL);
                continue;
            }
            Err(err) => ProcessEventKind::WaitError(err.to_string()),
        };
        let _ = tx.send(ProcessEvent { run_id, kind });
        break;
    });
}

fn build_command(spec: &LaunchSpec) -> ProcessCommand {
    let mut process = ProcessCommand::new(&spec.program);
    process
        .args(&spec.args)
        .env_clear()
        .envs(&spec.env)
        .stdin(Stdio::null());
    #[cfg(unix)]
    unsafe {
        process.pre_exec(|| {
            setpgid(Pid::from_raw(0), Pid::from_raw(0))
                .map_err(|error| std::io::Error::new(ErrorKind::Other, error.to_string()))
        });
    }
    process
}

#[cfg(unix)]
fn signal_process_group(pid: u32, signal: Signal) -> Result<(), nix::Error> {
    let pid = pid as i32;
    if pid > 0 {
        kill(Pid::from_raw(-pid), signal)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::AppPaths;

    fn sample_config() -> BotConfig {
        serde_json::from_str(
            r#"{"bot":{"botId":"10001","name":"main"},"advanced":{"runtimePath":"/opt/QQ"}}"#,
        )
        .expect("config")
    }

    #[test]
    fn launch_spec_uses_runtime_dir_script_and_identity() {
        let paths = AppPaths::new("/srv/desk");
        let mut settings = LaunchSettings::defaults(&paths);
        settings.napcat_path = PathBuf::from("/srv/napcat");
        let spec = LaunchSpec::for_bot(&sample_config(), &settings);

        assert_eq!(
            spec.program,
            PathBuf::from("/opt/QQ").join(PLATFORM_EXECUTABLE)
        );
        assert_eq!(
            spec.args,
            vec![
                PathBuf::from("/srv/napcat")
                    .join("napcat.mjs")
                    .into_os_string(),
                OsString::from("-q"),
                OsString::from("10001"),
            ]
        );
        assert!(spec.merge_output);
        let (last_key, last_value) = spec.env.last().expect("override present");
        assert_eq!(last_key, &OsString::from("ELECTRON_RUN_AS_NODE"));
        assert_eq!(last_value, &OsString::from("1"));
    }

    #[test]
    fn override_is_appended_after_inherited_variables() {
        let inherited = vec![
            (OsString::from("ELECTRON_RUN_AS_NODE"), OsString::from("0")),
            (OsString::from("PATH"), OsString::from("/bin")),
            (OsString::from("HOME"), OsString::from("/root")),
        ];
        let env = environment_with_override(inherited, "ELECTRON_RUN_AS_NODE", "1");
        let keys = env
            .keys()
            .map(|key| key.to_string_lossy().into_owned())
            .collect::<Vec<String>>();
        assert_eq!(keys, vec!["PATH", "HOME", "ELECTRON_RUN_AS_NODE"]);
        assert_eq!(
            env.get(OsStr::new("ELECTRON_RUN_AS_NODE")),
            Some(&OsString::from("1"))
        );
    }

    #[test]
    fn exit_report_success_requires_normal_zero() {
        assert!(ExitReport {
            code: 0,
            kind: ExitKind::Normal
        }
        .success());
        assert!(!ExitReport {
            code: 9,
            kind: ExitKind::Crashed
        }
        .success());
        assert_eq!(ExitKind::Crashed.to_string(), "crashed");
    }

    #[cfg(unix)]
    #[test]
    fn exit_report_maps_signals_to_crashed() {
        let status = ExitStatus::from_raw(9);
        assert_eq!(
            ExitReport::from_status(status),
            ExitReport {
                code: 9,
                kind: ExitKind::Crashed
            }
        );
        let status = ExitStatus::from_raw(3 << 8);
        assert_eq!(
            ExitReport::from_status(status),
            ExitReport {
                code: 3,
                kind: ExitKind::Normal
            }
        );
    }
}
