//! Stage supervision: runs one stage's command to completion, under a
//! wall-clock timeout, with bounded output capture.
//!
//! A single `supervise` call owns a child process end to end, draining its
//! stdout/stderr concurrently rather than sequentially (so a chatty stderr
//! can't stall stdout capture, and vice versa), and guarantees the child is
//! reaped on every exit path including a timeout.

use std::process::Stdio;
use std::time::Instant;

use tokio::io::{AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{info, instrument};

use crate::config::PipelineConfig;
use crate::errors::SupervisorError;
use crate::stage::{
    truncate_preserving_prefix, Stage, StageStatus, ERROR_LIMIT, OUTPUT_LIMIT,
};

/// Run `stage`'s command under `config`'s shell and workspace, mutating
/// `stage` in place with the terminal status, duration, and captured output.
///
/// Never returns an `Err`: spawn failures and I/O errors are folded into
/// `stage.error` and reported as `StageStatus::Failed`, per the engine's
/// rule that one stage's supervision failure never escapes to its peers.
#[instrument(skip(stage, config), fields(stage = %stage.name(), tier = stage.tier()))]
pub async fn supervise(stage: &mut Stage, config: &PipelineConfig) {
    stage.status = StageStatus::Running;
    let started = Instant::now();
    info!(stage = %stage.name(), "stage_started");

    let (program, leading_args) = &config.shell;
    let mut command = Command::new(program);
    command
        .args(leading_args)
        .arg(&stage.spec.command)
        .current_dir(&config.workspace)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    {
        // Its own process group, so a timeout can kill every descendant the
        // shell spawned, not just the shell itself.
        command.process_group(0);
    }

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) => {
            let err = SupervisorError::Spawn(err);
            stage.status = StageStatus::Failed;
            stage.duration_ms = elapsed_ms(started);
            stage.error = truncate_preserving_prefix(&err.to_string(), ERROR_LIMIT);
            return;
        }
    };

    let mut stdout = child.stdout.take().map(BufReader::new);
    let mut stderr = child.stderr.take().map(BufReader::new);

    let budget = Duration::from_secs(stage.spec.timeout_seconds);
    let run = async {
        let (stdout_bytes, stderr_bytes, wait_result) = tokio::join!(
            drain(&mut stdout, OUTPUT_LIMIT),
            drain(&mut stderr, ERROR_LIMIT),
            child.wait()
        );
        (stdout_bytes, stderr_bytes, wait_result)
    };

    match timeout(budget, run).await {
        Ok((stdout_bytes, stderr_bytes, wait_result)) => {
            // Already bounded to OUTPUT_LIMIT by `drain`; truncate_preserving_prefix
            // only needs to land on a char boundary here, not cut anything further.
            stage.output = truncate_preserving_prefix(&stdout_bytes, OUTPUT_LIMIT);
            stage.duration_ms = elapsed_ms(started);
            match wait_result {
                Ok(exit_status) if exit_status.success() => {
                    stage.status = StageStatus::Passed;
                }
                Ok(exit_status) => {
                    stage.status = StageStatus::Failed;
                    stage.error = truncate_preserving_prefix(
                        &format!(
                            "exited with {}: {}",
                            exit_status.code().map_or_else(|| "signal".to_string(), |c| c.to_string()),
                            stderr_bytes
                        ),
                        ERROR_LIMIT,
                    );
                }
                Err(err) => {
                    let err = SupervisorError::Io(err);
                    stage.status = StageStatus::Failed;
                    stage.error = truncate_preserving_prefix(&err.to_string(), ERROR_LIMIT);
                }
            }
        }
        Err(_elapsed) => {
            kill_process_group(&child);
            // Drop the handle; kill_on_drop(true) reaps the direct child so
            // no orphan of it survives even if the group kill above missed
            // something. duration_ms is the deadline itself, not the
            // measured elapsed time, so a timed out stage always reports
            // exactly timeout_seconds * 1000.
            drop(child);
            stage.status = StageStatus::Failed;
            stage.duration_ms = stage.spec.timeout_seconds.saturating_mul(1000);
            stage.error = format!("Timeout after {}s", stage.spec.timeout_seconds);
        }
    }
}

/// Read from `reader` until EOF, but never retain more than `limit` bytes:
/// once the cap is hit, keep reading into a scratch buffer and discard it,
/// so the pipe still drains (the child doesn't block writing to a full
/// pipe) without the stage's in-memory buffer growing past its cap.
async fn drain(reader: &mut Option<BufReader<impl tokio::io::AsyncRead + Unpin>>, limit: usize) -> String {
    let Some(reader) = reader.as_mut() else {
        return String::new();
    };
    let mut kept = Vec::with_capacity(limit.min(64 * 1024));
    let mut chunk = [0u8; 8192];
    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        if kept.len() < limit {
            let take = (limit - kept.len()).min(n);
            kept.extend_from_slice(&chunk[..take]);
        }
    }
    String::from_utf8_lossy(&kept).into_owned()
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Send `SIGKILL` to the whole process group led by `child`, reaching
/// descendants spawned by the shell itself. A no-op if the child already
/// exited or the platform has no process-group concept.
#[cfg(unix)]
fn kill_process_group(child: &tokio::process::Child) {
    if let Some(pid) = child.id() {
        // Negative pid targets the process group rather than the single
        // process; `command.process_group(0)` made `child` the group leader.
        unsafe {
            libc::kill(-(pid as libc::c_int), libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &tokio::process::Child) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::StageSpec;

    fn config() -> PipelineConfig {
        PipelineConfig::new(std::env::temp_dir())
    }

    #[tokio::test]
    async fn passing_command_marks_stage_passed() {
        let mut stage = Stage::new(StageSpec::new("ok", 1, "echo hi"));
        supervise(&mut stage, &config()).await;
        assert_eq!(stage.status, StageStatus::Passed);
        assert!(stage.output.contains("hi"));
    }

    #[tokio::test]
    async fn failing_command_marks_stage_failed_with_stderr() {
        let mut stage = Stage::new(StageSpec::new("fail", 1, "echo boom >&2; exit 1"));
        supervise(&mut stage, &config()).await;
        assert_eq!(stage.status, StageStatus::Failed);
        assert!(stage.error.contains("boom"));
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let mut stage = Stage::new(StageSpec::new("slow", 1, "sleep 5").timeout_seconds(1));
        supervise(&mut stage, &config()).await;
        assert_eq!(stage.status, StageStatus::Failed);
        assert_eq!(stage.duration_ms, 1000);
        assert!(stage.error.starts_with("Timeout after 1s"));
    }

    #[tokio::test]
    async fn output_is_truncated_to_limit() {
        let mut stage = Stage::new(StageSpec::new(
            "big",
            1,
            "yes x | head -c 20000",
        ));
        supervise(&mut stage, &config()).await;
        assert_eq!(stage.status, StageStatus::Passed);
        assert!(stage.output.len() <= OUTPUT_LIMIT);
    }
}
