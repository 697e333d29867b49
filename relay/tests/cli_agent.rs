//! CLI tests for single-shot delegation.
//!
//! Spawns the relay binary with a config pointing at a shell-script agent and
//! verifies stdout, stderr, and exit codes. Delegation failures must be
//! reported as ordinary output with a success exit code.

use std::fs;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use relay::exit_codes;

fn write_agent_config(dir: &Path, script: &str) -> std::path::PathBuf {
    let script_path = dir.join("agent.sh");
    fs::write(&script_path, script).expect("write script");
    let config_path = dir.join("config.toml");
    let config = format!(
        "[delegate]\npath = \"{}\"\nlauncher = [\"sh\"]\ntimeout_secs = 5\n",
        script_path.display()
    );
    fs::write(&config_path, config).expect("write config");
    config_path
}

fn run_relay(dir: &Path, config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_relay"))
        .current_dir(dir)
        .env("HOME", dir)
        .arg("--config")
        .arg(config)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .expect("run relay")
}

#[test]
fn agent_mode_prints_extracted_output() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = write_agent_config(
        temp.path(),
        "echo working on it\necho \"{'observation': 'done'}\"\n",
    );

    let output = run_relay(temp.path(), &config, &["--agent", "write a script"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "done\n");
    assert!(String::from_utf8_lossy(&output.stderr).contains("delegating to agent..."));
}

#[test]
fn failed_delegation_still_exits_successfully() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = write_agent_config(temp.path(), "echo oops >&2\nexit 3\n");

    let output = run_relay(temp.path(), &config, &["--agent", "break things"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("agent failed with exit code 3"));
    assert!(stdout.contains("oops"));
}

#[test]
fn missing_entry_point_is_reported_as_output() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config_path = temp.path().join("config.toml");
    fs::write(
        &config_path,
        "[delegate]\npath = \"/nonexistent/agent.py\"\n",
    )
    .expect("write config");

    let output = run_relay(temp.path(), &config_path, &["--agent", "task"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(
        String::from_utf8_lossy(&output.stdout).contains("does not exist"),
        "stdout: {}",
        String::from_utf8_lossy(&output.stdout)
    );
}

#[test]
fn no_prompt_exits_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = Command::new(env!("CARGO_BIN_EXE_relay"))
        .current_dir(temp.path())
        .env("HOME", temp.path())
        .stdin(Stdio::null())
        .output()
        .expect("run relay");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no prompt"));
}
