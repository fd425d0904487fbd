use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::notify::NoticeLog;
use crate::process_manager::ExitReport;
use crate::supervisor::{finished_line, BotSupervisor, StopOutcome, SupervisorEvent};
use crate::ui::{PlainRenderer, Renderer};

use super::render::render_plain_summary;
use super::{flush_notices, RunnerError};

const WAIT_SLICE: Duration = Duration::from_millis(100);
const TRAILING_OUTPUT_WAIT: Duration = Duration::from_millis(50);
const INTERRUPTED_EXIT_CODE: i32 = 130;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Starts the bot and streams its sanitized output until it exits or the
/// user interrupts, in which case the bot is stopped first.
pub(super) fn run_plain<W: Write>(
    supervisor: &mut BotSupervisor<NoticeLog>,
    renderer: &mut PlainRenderer<W>,
) -> Result<i32, RunnerError> {
    install_interrupt_handler();
    let mut shown = 0usize;

    let started = supervisor.start();
    flush_notices(renderer, supervisor.notices(), &mut shown)?;
    started?;

    let mut interrupted = false;
    let mut at_line_start = true;
    let report = loop {
        if INTERRUPTED.swap(false, Ordering::SeqCst) {
            interrupted = true;
            match supervisor.stop()? {
                StopOutcome::Stopped(report) => break report,
                StopOutcome::NotRunning => {
                    if let Some(report) = supervisor.last_exit() {
                        break report;
                    }
                }
            }
        }
        match supervisor.wait_event(WAIT_SLICE) {
            Some(SupervisorEvent::Output(text)) => {
                at_line_start = text.ends_with('\n');
                renderer.stream(&text)?;
            }
            Some(SupervisorEvent::Finished(report)) => break report,
            None => {}
        }
        flush_notices(renderer, supervisor.notices(), &mut shown)?;
    };

    // Pick up output that raced the exit notification.
    while let Some(event) = supervisor.wait_event(TRAILING_OUTPUT_WAIT) {
        if let SupervisorEvent::Output(text) = event {
            at_line_start = text.ends_with('\n');
            renderer.stream(&text)?;
        }
    }
    if !at_line_start {
        renderer.stream("\n")?;
    }
    renderer.stream(&format!("{}\n", finished_line(report)))?;
    flush_notices(renderer, supervisor.notices(), &mut shown)?;
    render_plain_summary(renderer, supervisor, report)?;

    Ok(exit_code(report, interrupted))
}

fn exit_code(report: ExitReport, interrupted: bool) -> i32 {
    if interrupted {
        INTERRUPTED_EXIT_CODE
    } else if report.success() {
        0
    } else {
        1
    }
}

#[cfg(unix)]
fn install_interrupt_handler() {
    use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

    extern "C" fn on_interrupt(_: nix::libc::c_int) {
        INTERRUPTED.store(true, Ordering::SeqCst);
    }

    let action = SigAction::new(
        SigHandler::Handler(on_interrupt),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    for signal in [Signal::SIGINT, Signal::SIGTERM] {
        // SAFETY: the handler only stores to an atomic.
        let _ = unsafe { sigaction(signal, &action) };
    }
}

#[cfg(not(unix))]
fn install_interrupt_handler() {}
