//! Delegate invocation: spawn the agent process, feed it the task, and distill
//! its output.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::core::extract::extract;
use crate::core::router::DelegationRequest;
use crate::io::config::DelegateConfig;
use crate::io::process::run_command_with_timeout;

/// Failure modes of a delegation.
///
/// Every variant renders to a human-readable description. Callers that must
/// not fail use [`delegate_to_text`] to fold errors into the returned text.
#[derive(Debug, Error)]
pub enum DelegateError {
    /// The configured entry point is absent from disk.
    #[error("agent entry point {} does not exist (set delegate.path in the config)", .path.display())]
    MissingEntryPoint { path: PathBuf },

    /// The agent ran past its deadline and was killed. Carries whatever
    /// output was captured before the kill.
    #[error("agent timed out after {}s\nstdout: '{}'\nstderr: '{}'", .timeout.as_secs(), .stdout, .stderr)]
    TimedOut {
        timeout: Duration,
        stdout: String,
        stderr: String,
    },

    /// The agent exited with a non-zero status.
    #[error("agent failed with exit code {}\nstdout: '{}'\nstderr: '{}'", exit_code_text(.code), .stdout, .stderr)]
    Failed {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// Spawning or stream plumbing failed before an exit status was observed.
    #[error("agent execution failed: {0:#}")]
    Runtime(anyhow::Error),
}

impl From<anyhow::Error> for DelegateError {
    fn from(err: anyhow::Error) -> Self {
        Self::Runtime(err)
    }
}

fn exit_code_text(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (killed by signal)".to_string(),
    }
}

/// Abstraction over delegation backends.
///
/// Tests script this with canned outcomes instead of spawning processes.
pub trait Delegate {
    fn invoke(&self, request: &DelegationRequest) -> Result<String, DelegateError>;
}

/// Delegate that runs the configured agent as a child process.
pub struct ProcessDelegate {
    config: DelegateConfig,
}

impl ProcessDelegate {
    pub fn new(config: DelegateConfig) -> Self {
        Self { config }
    }

    fn command(&self) -> Command {
        match self.config.launcher.split_first() {
            Some((program, rest)) => {
                let mut cmd = Command::new(program);
                cmd.args(rest);
                cmd.arg(&self.config.path);
                cmd
            }
            None => Command::new(&self.config.path),
        }
    }
}

impl Delegate for ProcessDelegate {
    #[instrument(skip_all, fields(inputs = request.extra_inputs.len()))]
    fn invoke(&self, request: &DelegationRequest) -> Result<String, DelegateError> {
        if !self.config.path.exists() {
            return Err(DelegateError::MissingEntryPoint {
                path: self.config.path.clone(),
            });
        }

        let payload = request.stdin_payload();
        let cmd = self.command();
        if request.verbose {
            debug!(command = ?cmd, payload = %payload, "invoking agent");
        }
        info!(path = %self.config.path.display(), "handing task to agent");

        let output = run_command_with_timeout(
            cmd,
            Some(payload.as_bytes()),
            self.config.timeout(),
            self.config.output_limit_bytes,
        )?;

        let stdout = output.stdout_lossy();
        let stderr = output.stderr_lossy();
        if request.verbose {
            debug!(stdout = %stdout, stderr = %stderr, exit_code = ?output.status.code(), "agent finished");
        }

        if output.timed_out {
            warn!(timeout_secs = self.config.timeout_secs, "agent timed out");
            return Err(DelegateError::TimedOut {
                timeout: self.config.timeout(),
                stdout,
                stderr,
            });
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "agent failed");
            return Err(DelegateError::Failed {
                code: output.status.code(),
                stdout,
                stderr,
            });
        }

        let combined = format!("{stdout}{stderr}");
        Ok(extract(combined.trim_end()))
    }
}

/// Run a delegation and fold any failure into the returned text.
///
/// Delegation never terminates the host program: errors come back as their
/// descriptive rendering instead, and the caller displays them like any other
/// result.
pub fn delegate_to_text<D: Delegate>(delegate: &D, request: &DelegationRequest) -> String {
    match delegate.invoke(request) {
        Ok(text) => text,
        Err(err) => {
            warn!(error = %err, "delegation failed");
            err.to_string()
        }
    }
}
