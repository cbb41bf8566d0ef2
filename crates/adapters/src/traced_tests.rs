// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::executor::{FakeExecutorAdapter, LaunchSpec};
use crate::multiplexer::{FakeMultiplexerAdapter, MultiplexerCall};
use serial_test::{parallel, serial};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn new() -> Self {
        Self::default()
    }

    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::new();
    let logs_clone = logs.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs_clone)
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

fn assert_log(logs: &str, label: &str, expected: &str) {
    assert!(logs.contains(expected), "Should log {label}. Logs:\n{logs}",);
}

async fn spawn_traced_window() -> (
    FakeMultiplexerAdapter,
    TracedMultiplexer<FakeMultiplexerAdapter>,
    String,
) {
    let fake = FakeMultiplexerAdapter::new();
    let traced = TracedMultiplexer::new(fake.clone());
    let window_id = traced
        .spawn("test", Path::new("/tmp"), "echo", &[])
        .await
        .unwrap();
    (fake, traced, window_id)
}

fn spec(name: &str) -> LaunchSpec {
    LaunchSpec {
        name: name.into(),
        cwd: PathBuf::from("/tmp"),
        prompt: "do the thing".into(),
        resume_session_id: None,
        dangerous_mode: false,
        env: Vec::new(),
        session_config: Default::default(),
    }
}

// =============================================================================
// Multiplexer tracing output
// =============================================================================

#[test]
#[serial(tracing)]
fn traced_multiplexer_spawn_logs_entry_and_completion() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeMultiplexerAdapter::new();
        let traced = TracedMultiplexer::new(fake);
        traced
            .spawn("test-agent", Path::new("/tmp"), "echo hello", &[])
            .await
    });

    assert!(result.is_ok(), "spawn should succeed: {:?}", result);
    assert_log(&logs, "span name", "multiplexer.spawn");
    assert_log(&logs, "window name", "test-agent");
    assert_log(&logs, "entry message", "starting");
    assert_log(&logs, "completion", "window created");
    assert_log(&logs, "timing", "elapsed_ms");
}

#[test]
#[serial(tracing)]
fn traced_multiplexer_kill_logs_operation() {
    let (logs, _) = with_tracing(|| async {
        let (_, traced, window_id) = spawn_traced_window().await;
        traced.kill(&window_id).await
    });

    assert_log(&logs, "kill span", "multiplexer.kill");
    assert_log(&logs, "kill completion", "killed");
}

#[test]
#[serial(tracing)]
fn traced_multiplexer_send_logs_error_on_failure() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeMultiplexerAdapter::new();
        let traced = TracedMultiplexer::new(fake);
        traced.send("nonexistent", "hello").await
    });

    assert!(result.is_err());
    assert_log(&logs, "send failure", "send failed");
}

// =============================================================================
// Multiplexer delegation
// =============================================================================

#[tokio::test]
#[parallel(tracing)]
async fn traced_multiplexer_delegates_spawn_to_inner() {
    let fake = FakeMultiplexerAdapter::new();
    let traced = TracedMultiplexer::new(fake.clone());

    let window_id = traced
        .spawn(
            "my-agent",
            Path::new("/tmp"),
            "echo hello",
            &[("KEY".to_string(), "VALUE".to_string())],
        )
        .await
        .unwrap();

    let calls = fake.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        MultiplexerCall::Spawn { name, cwd, cmd, env } => {
            assert_eq!(name, "my-agent");
            assert_eq!(cwd, &PathBuf::from("/tmp"));
            assert_eq!(cmd, "echo hello");
            assert_eq!(env, &[("KEY".to_string(), "VALUE".to_string())]);
        }
        other => panic!("Expected Spawn call, got {:?}", other),
    }

    assert!(fake.get_window(&window_id).is_some());
}

#[tokio::test]
#[parallel(tracing)]
async fn traced_multiplexer_is_alive_delegates_to_inner() {
    let (fake, traced, window_id) = spawn_traced_window().await;

    assert!(traced.is_alive(&window_id).await.unwrap());
    fake.set_exited(&window_id, 0);
    assert!(!traced.is_alive(&window_id).await.unwrap());
}

#[tokio::test]
#[parallel(tracing)]
async fn traced_multiplexer_is_alive_returns_false_for_unknown() {
    let fake = FakeMultiplexerAdapter::new();
    let traced = TracedMultiplexer::new(fake);
    assert!(!traced.is_alive("unknown").await.unwrap());
}

#[tokio::test]
#[parallel(tracing)]
async fn traced_multiplexer_capture_output_delegates_to_inner() {
    let (fake, traced, window_id) = spawn_traced_window().await;
    fake.set_output(&window_id, vec!["line1".to_string(), "line2".to_string()]);

    let output = traced.capture_output(&window_id, 10).await.unwrap();
    assert!(output.contains("line1"));
    assert!(output.contains("line2"));
}

#[tokio::test]
#[parallel(tracing)]
async fn traced_multiplexer_get_pid_delegates_to_inner() {
    let (_, traced, window_id) = spawn_traced_window().await;
    assert!(traced.get_pid(&window_id).await.unwrap().is_some());
}

// =============================================================================
// Executor tracing output
// =============================================================================

#[test]
#[serial(tracing)]
fn traced_executor_execute_logs_entry_and_completion() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeExecutorAdapter::new("claude");
        let traced = TracedExecutor::new(fake);
        traced.execute(spec("task-1")).await
    });

    assert!(result.is_ok(), "execute should succeed: {:?}", result);
    assert_log(&logs, "span name", "executor.execute");
    assert_log(&logs, "task name", "task-1");
    assert_log(&logs, "completion", "executor launched");
    assert_log(&logs, "timing", "elapsed_ms");
}

#[test]
#[serial(tracing)]
fn traced_executor_kill_logs_operation() {
    let (logs, _) = with_tracing(|| async {
        let fake = FakeExecutorAdapter::new("claude");
        let traced = TracedExecutor::new(fake);
        let handle = traced.execute(spec("task-1")).await.unwrap();
        traced.kill(&handle).await
    });

    assert_log(&logs, "kill span", "executor.kill");
    assert_log(&logs, "kill completion", "killed");
}

#[test]
#[serial(tracing)]
fn traced_executor_resume_logs_error_on_failure() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeExecutorAdapter::new("claude");
        let traced = TracedExecutor::new(fake);
        traced.resume(spec("task-1")).await
    });

    assert!(result.is_err());
    assert_log(&logs, "resume failure", "resume failed");
}

// =============================================================================
// Executor delegation
// =============================================================================

#[tokio::test]
#[parallel(tracing)]
async fn traced_executor_delegates_execute_to_inner() {
    let fake = FakeExecutorAdapter::new("claude");
    let traced = TracedExecutor::new(fake.clone());

    let handle = traced.execute(spec("task-1")).await.unwrap();
    assert!(handle.session_id.is_some());

    let calls = fake.calls();
    assert_eq!(calls.len(), 1);
}

#[tokio::test]
#[parallel(tracing)]
async fn traced_executor_delegates_suspend_to_inner() {
    let fake = FakeExecutorAdapter::new("claude");
    let traced = TracedExecutor::new(fake.clone());
    let handle = traced.execute(spec("task-1")).await.unwrap();

    traced.suspend(&handle).await.unwrap();
    assert!(traced.is_suspended(&handle).await);

    traced.resume_process(&handle).await.unwrap();
    assert!(!traced.is_suspended(&handle).await);
}

#[tokio::test]
#[parallel(tracing)]
async fn traced_executor_name_and_build_command_delegate() {
    let fake = FakeExecutorAdapter::new("codex");
    let traced = TracedExecutor::new(fake);
    assert_eq!(traced.name(), "codex");
    assert_eq!(traced.build_command(&spec("t")), "codex t");
}
