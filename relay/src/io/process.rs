//! Helpers for running child processes with timeouts and bounded output.

use std::io::{Read, Write};
use std::process::{ChildStdin, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Run a command with a timeout and capture stdout/stderr without risking pipe deadlocks.
///
/// `stdin` is written from a dedicated thread alongside the output readers and
/// the pipe is closed once the payload ends, so the child sees end-of-input and
/// a child that stalls before draining stdin still hits the timeout. Output is
/// read concurrently while the child runs; `output_limit_bytes` bounds the
/// amount of stdout/stderr stored in memory (bytes beyond this are discarded
/// while still draining the pipe). On timeout the child is killed and whatever
/// output was captured so far is returned with `timed_out` set.
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs(), output_limit_bytes))]
pub fn run_command_with_timeout(
    mut cmd: Command,
    stdin: Option<&[u8]>,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    if stdin.is_some() {
        cmd.stdin(Stdio::piped());
    } else {
        cmd.stdin(Stdio::null());
    }
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };

    // The payload is written from its own thread so the wait below is reached
    // even while the child sits on a full pipe; a payload larger than the pipe
    // buffer would otherwise block here against a child that is itself blocked
    // writing output. The pipe closes when the write finishes.
    let stdin_handle = if let Some(input) = stdin {
        let child_stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("stdin was not piped"))?;
        let payload = input.to_vec();
        Some(thread::spawn(move || write_stdin_payload(child_stdin, &payload)))
    } else {
        None
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let stdout_handle = thread::spawn(move || read_stream_limited(stdout, output_limit_bytes));
    let stderr_handle = thread::spawn(move || read_stream_limited(stderr, output_limit_bytes));

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "command timed out, killing"
            );
            timed_out = true;
            child.kill().context("kill command")?;
            child.wait().context("wait command after kill")?
        }
    };

    // Once the child is gone the pipe is closed, so a still-blocked write
    // returns promptly through the broken-pipe path.
    if let Some(handle) = stdin_handle {
        join_writer(handle).context("join stdin writer")?;
    }

    let (stdout, stdout_truncated) = join_output(stdout_handle).context("join stdout")?;
    let (stderr, stderr_truncated) = join_output(stderr_handle).context("join stderr")?;

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
    })
}

// Dropping the ChildStdin on return closes the pipe and the child sees
// end-of-input.
fn write_stdin_payload(mut pipe: ChildStdin, payload: &[u8]) -> Result<()> {
    // A child that exits without draining its stdin closes the pipe; that
    // is not an error from the caller's point of view.
    if let Err(e) = pipe.write_all(payload) {
        if e.kind() != std::io::ErrorKind::BrokenPipe {
            return Err(e).context("write stdin");
        }
        debug!("child closed stdin before the payload was fully written");
    }
    Ok(())
}

fn join_writer(handle: thread::JoinHandle<Result<()>>) -> Result<()> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("stdin writer thread panicked")),
    }
}

fn join_output(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            buf.extend_from_slice(&chunk[..keep]);
            truncated += n.saturating_sub(keep);
        } else {
            truncated += n;
        }
    }

    Ok((buf, truncated))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn captures_both_streams() {
        let output = run_command_with_timeout(
            sh("echo out; echo err >&2"),
            None,
            Duration::from_secs(5),
            10_000,
        )
        .unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout_lossy(), "out\n");
        assert_eq!(output.stderr_lossy(), "err\n");
        assert!(!output.timed_out);
    }

    #[test]
    fn forwards_stdin_and_closes_the_pipe() {
        let output = run_command_with_timeout(
            sh("cat"),
            Some(b"line one\nline two\n"),
            Duration::from_secs(5),
            10_000,
        )
        .unwrap();
        assert_eq!(output.stdout_lossy(), "line one\nline two\n");
    }

    #[test]
    fn output_beyond_the_limit_is_counted_not_kept() {
        let output = run_command_with_timeout(
            sh("echo 0123456789"),
            None,
            Duration::from_secs(5),
            4,
        )
        .unwrap();
        assert_eq!(output.stdout, b"0123");
        assert_eq!(output.stdout_truncated, 7);
    }

    #[test]
    fn timeout_kills_the_child_and_keeps_partial_output() {
        let output = run_command_with_timeout(
            sh("echo early; sleep 5; echo late"),
            None,
            Duration::from_secs(1),
            10_000,
        )
        .unwrap();
        assert!(output.timed_out);
        assert!(output.stdout_lossy().contains("early"));
        assert!(!output.stdout_lossy().contains("late"));
    }

    #[test]
    fn stdin_to_an_early_exiting_child_is_tolerated() {
        let payload = vec![b'x'; 1 << 20];
        let output = run_command_with_timeout(
            sh("exit 0"),
            Some(&payload),
            Duration::from_secs(5),
            10_000,
        )
        .unwrap();
        assert!(output.status.success());
    }

    #[test]
    fn timeout_still_fires_when_the_child_never_drains_stdin() {
        // Payload larger than any pipe buffer, against a child that fills its
        // stdout first and then never reads. The watchdog channel keeps the
        // test bounded if the call stalls.
        let (tx, rx) = std::sync::mpsc::channel();
        let payload = vec![b'y'; 256 * 1024];
        thread::spawn(move || {
            let result = run_command_with_timeout(
                sh("head -c 131072 /dev/zero; exec sleep 30"),
                Some(&payload),
                Duration::from_secs(1),
                1 << 20,
            );
            let _ = tx.send(result);
        });
        let output = rx
            .recv_timeout(Duration::from_secs(10))
            .expect("the call must return once the timeout fires")
            .unwrap();
        assert!(output.timed_out);
        assert_eq!(output.stdout.len(), 131072);
    }
}
