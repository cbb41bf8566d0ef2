// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;

static TEST_PREFIX: LazyLock<String> = LazyLock::new(|| {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    format!("t{:04x}", nanos & 0xFFFF)
});

static WINDOW_COUNTER: AtomicU64 = AtomicU64::new(0);

fn unique_name(suffix: &str) -> String {
    let id = WINDOW_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}-{}", *TEST_PREFIX, suffix, id)
}

fn tmux_available() -> bool {
    std::process::Command::new("tmux")
        .arg("-V")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

macro_rules! fail_if_no_tmux {
    () => {
        if !tmux_available() {
            panic!("tmux is required but not available");
        }
    };
}

// All tmux tests are serialized because some tests modify PATH which affects all others.

#[tokio::test]
#[serial(tmux)]
async fn spawn_creates_window_and_returns_id() {
    fail_if_no_tmux!();
    let adapter = TmuxMultiplexerAdapter::new();
    let name = unique_name("spawn");

    let id = adapter
        .spawn(&name, Path::new("/tmp"), "sleep 60", &[])
        .await
        .unwrap();

    assert_eq!(id, format!("ty-{}", name));
    let _ = adapter.kill(&id).await;
}

#[tokio::test]
#[serial(tmux)]
async fn spawn_with_env_passes_environment() {
    fail_if_no_tmux!();
    let adapter = TmuxMultiplexerAdapter::new();
    let name = unique_name("env");
    let env = vec![("TEST_VAR".to_string(), "test_value".to_string())];

    let id = adapter
        .spawn(&name, Path::new("/tmp"), "echo $TEST_VAR && sleep 60", &env)
        .await
        .unwrap();

    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    let output = adapter.capture_output(&id, 10).await.unwrap();
    assert!(output.contains("test_value"));

    let _ = adapter.kill(&id).await;
}

#[tokio::test]
#[serial(tmux)]
async fn send_to_nonexistent_window_returns_not_found() {
    fail_if_no_tmux!();
    let adapter = TmuxMultiplexerAdapter::new();
    let result = adapter.send("nonexistent-window-xyz", "test").await;
    assert!(matches!(result, Err(MultiplexerError::NotFound(_))));
}

#[tokio::test]
#[serial(tmux)]
async fn kill_terminates_window() {
    fail_if_no_tmux!();
    let adapter = TmuxMultiplexerAdapter::new();
    let name = unique_name("kill");

    let id = adapter
        .spawn(&name, Path::new("/tmp"), "sleep 60", &[])
        .await
        .unwrap();
    assert!(adapter.is_alive(&id).await.unwrap());

    adapter.kill(&id).await.unwrap();
    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    assert!(!adapter.is_alive(&id).await.unwrap());
}

#[tokio::test]
#[serial(tmux)]
async fn kill_nonexistent_window_succeeds() {
    fail_if_no_tmux!();
    let adapter = TmuxMultiplexerAdapter::new();
    assert!(adapter.kill("nonexistent-window-xyz").await.is_ok());
}

#[tokio::test]
#[serial(tmux)]
async fn get_pid_returns_pane_pid() {
    fail_if_no_tmux!();
    let adapter = TmuxMultiplexerAdapter::new();
    let name = unique_name("pid");

    let id = adapter
        .spawn(&name, Path::new("/tmp"), "sleep 60", &[])
        .await
        .unwrap();

    let pid = adapter.get_pid(&id).await.unwrap();
    assert!(pid.is_some());

    let _ = adapter.kill(&id).await;
}

#[tokio::test]
#[serial(tmux)]
async fn is_process_running_detects_child_process() {
    fail_if_no_tmux!();
    let adapter = TmuxMultiplexerAdapter::new();
    let name = unique_name("proc");

    let id = adapter
        .spawn(&name, Path::new("/tmp"), "bash -c 'sleep 60 & wait'", &[])
        .await
        .unwrap();

    tokio::time::sleep(tokio::time::Duration::from_millis(300)).await;
    let running = adapter.is_process_running(&id, "sleep").await.unwrap();
    assert!(running);

    let _ = adapter.kill(&id).await;
}

#[tokio::test]
#[serial(tmux)]
async fn spawn_rejects_nonexistent_cwd() {
    fail_if_no_tmux!();
    let adapter = TmuxMultiplexerAdapter::new();
    let name = unique_name("badcwd");

    let result = adapter
        .spawn(&name, Path::new("/nonexistent/path"), "sleep 1", &[])
        .await;

    assert!(matches!(result, Err(MultiplexerError::SpawnFailed(_))));
}

#[test]
fn tmux_adapter_is_zero_sized() {
    let adapter = TmuxMultiplexerAdapter;
    assert!(std::mem::size_of_val(&adapter) == 0);
}

#[tokio::test]
#[serial(tmux)]
async fn spawn_fails_when_tmux_unavailable() {
    use std::env;
    let original_path = env::var("PATH").unwrap_or_default();
    env::set_var("PATH", "/nonexistent");

    let adapter = TmuxMultiplexerAdapter::new();
    let result = adapter
        .spawn("test-no-tmux", Path::new("/tmp"), "sleep 1", &[])
        .await;

    env::set_var("PATH", &original_path);
    assert!(matches!(result, Err(MultiplexerError::SpawnFailed(_))));
}
