//! Delegation tests against real child processes.
//!
//! Each test writes a small shell script as the agent entry point and invokes
//! it through [`ProcessDelegate`], exercising the production wiring end to
//! end: spawn, stdin payload, timeout, exit status, and output extraction.

use std::fs;
use std::time::Duration;

use relay::core::router::DelegationRequest;
use relay::io::config::DelegateConfig;
use relay::io::delegate::{Delegate, DelegateError, ProcessDelegate};

fn script_delegate(dir: &tempfile::TempDir, script: &str, timeout_secs: u64) -> ProcessDelegate {
    let path = dir.path().join("agent.sh");
    fs::write(&path, script).expect("write script");
    ProcessDelegate::new(DelegateConfig {
        path,
        launcher: vec!["sh".to_string()],
        timeout_secs,
        output_limit_bytes: 100_000,
    })
}

#[test]
fn marker_lines_survive_and_noise_is_dropped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let delegate = script_delegate(
        &dir,
        concat!(
            "read task\n",
            "echo \"step 1: thinking about $task\"\n",
            "echo \"{'observation': 'wrote the file'}\"\n",
            "echo \"Content successfully saved to out.txt\"\n",
        ),
        5,
    );
    let request = DelegationRequest::with_inputs("demo task", Vec::new());
    let text = delegate.invoke(&request).expect("invoke");
    assert_eq!(
        text,
        "wrote the file\nContent successfully saved to out.txt"
    );
}

#[test]
fn confirmation_inputs_arrive_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let delegate = script_delegate(
        &dir,
        concat!(
            "read task\n",
            "read first\n",
            "read second\n",
            "echo \"{'observation': '$task|$first|$second'}\"\n",
        ),
        5,
    );
    let request =
        DelegationRequest::with_inputs("do it", vec!["alpha".to_string(), "beta".to_string()]);
    let text = delegate.invoke(&request).expect("invoke");
    assert_eq!(text, "do it|alpha|beta");
}

#[test]
fn stderr_markers_are_extracted_after_stdout() {
    let dir = tempfile::tempdir().expect("tempdir");
    let delegate = script_delegate(
        &dir,
        concat!(
            "echo \"{'observation': 'from stdout'}\"\n",
            "echo \"{'observation': 'from stderr'}\" >&2\n",
        ),
        5,
    );
    let request = DelegationRequest::with_inputs("task", Vec::new());
    let text = delegate.invoke(&request).expect("invoke");
    assert_eq!(text, "from stdout\nfrom stderr");
}

#[test]
fn marker_free_output_passes_through() {
    let dir = tempfile::tempdir().expect("tempdir");
    let delegate = script_delegate(&dir, "echo \"plain result\"\n", 5);
    let request = DelegationRequest::with_inputs("task", Vec::new());
    let text = delegate.invoke(&request).expect("invoke");
    assert_eq!(text, "plain result");
}

#[test]
fn slow_agent_times_out_with_partial_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let delegate = script_delegate(&dir, "echo started\nsleep 5\necho finished\n", 1);
    let request = DelegationRequest::with_inputs("task", Vec::new());
    let err = delegate.invoke(&request).unwrap_err();
    match err {
        DelegateError::TimedOut { stdout, .. } => {
            assert!(stdout.contains("started"));
            assert!(!stdout.contains("finished"));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[test]
fn nonzero_exit_reports_code_and_streams() {
    let dir = tempfile::tempdir().expect("tempdir");
    let delegate = script_delegate(&dir, "echo oops >&2\nexit 3\n", 5);
    let request = DelegationRequest::with_inputs("task", Vec::new());
    let err = delegate.invoke(&request).unwrap_err();
    match err {
        DelegateError::Failed { code, stderr, .. } => {
            assert_eq!(code, Some(3));
            assert!(stderr.contains("oops"));
        }
        other => panic!("expected process failure, got {other:?}"),
    }
}

#[test]
fn agent_that_ignores_its_stdin_still_succeeds() {
    let dir = tempfile::tempdir().expect("tempdir");
    let delegate = script_delegate(&dir, "echo \"{'observation': 'done'}\"\n", 5);
    let request = DelegationRequest::with_inputs(
        "task",
        vec!["Hello World".to_string(), "yes".to_string()],
    );
    let text = delegate.invoke(&request).expect("invoke");
    assert_eq!(text, "done");
}

#[test]
fn oversized_task_and_a_chatty_agent_still_complete() {
    // A task beyond the pipe buffer, fed to an agent that dumps a large
    // banner before it starts reading. The watchdog channel keeps the test
    // bounded if the invocation stalls.
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("agent.sh");
    fs::write(
        &path,
        concat!(
            "head -c 131072 /dev/zero | tr '\\0' y\n",
            "echo\n",
            "cat > /dev/null\n",
            "echo \"{'observation': 'drained'}\"\n",
        ),
    )
    .expect("write script");
    let delegate = ProcessDelegate::new(DelegateConfig {
        path,
        launcher: vec!["sh".to_string()],
        timeout_secs: 5,
        output_limit_bytes: 1 << 20,
    });
    let request = DelegationRequest::with_inputs("y".repeat(100 * 1024), Vec::new());

    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(delegate.invoke(&request));
    });
    let text = rx
        .recv_timeout(Duration::from_secs(10))
        .expect("delegation must stay within its timeout budget")
        .expect("invoke");
    assert_eq!(text, "drained");
}
