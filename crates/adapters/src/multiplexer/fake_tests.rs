// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn fake_spawn_records_call() {
    let adapter = FakeMultiplexerAdapter::new();
    let id = adapter
        .spawn(
            "test",
            Path::new("/tmp"),
            "echo hello",
            &[("KEY".to_string(), "value".to_string())],
        )
        .await
        .unwrap();

    assert!(adapter.get_window(&id).is_some());
    let calls = adapter.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(calls[0], MultiplexerCall::Spawn { .. }));
}

#[tokio::test]
async fn fake_lifecycle() {
    let adapter = FakeMultiplexerAdapter::new();
    let id = adapter.spawn("test", Path::new("/tmp"), "cmd", &[]).await.unwrap();

    assert!(adapter.is_alive(&id).await.unwrap());
    adapter.set_exited(&id, 0);
    assert!(!adapter.is_alive(&id).await.unwrap());
}

#[tokio::test]
async fn fake_send_not_found() {
    let adapter = FakeMultiplexerAdapter::new();
    let result = adapter.send("nonexistent", "input").await;
    assert!(matches!(result, Err(MultiplexerError::NotFound(_))));
}

#[tokio::test]
async fn fake_capture_output_respects_window() {
    let adapter = FakeMultiplexerAdapter::new();
    let id = adapter.spawn("test", Path::new("/tmp"), "cmd", &[]).await.unwrap();
    adapter.set_output(&id, vec!["line1".into(), "line2".into(), "line3".into()]);

    let output = adapter.capture_output(&id, 2).await.unwrap();
    assert_eq!(output, "line2\nline3");
}

#[tokio::test]
async fn fake_process_running_toggle() {
    let adapter = FakeMultiplexerAdapter::new();
    let id = adapter.spawn("test", Path::new("/tmp"), "cmd", &[]).await.unwrap();

    assert!(adapter.is_process_running(&id, "cmd").await.unwrap());
    adapter.set_process_running(&id, false);
    assert!(!adapter.is_process_running(&id, "cmd").await.unwrap());
}

#[tokio::test]
async fn fake_get_pid_assigned_on_spawn() {
    let adapter = FakeMultiplexerAdapter::new();
    let id = adapter.spawn("test", Path::new("/tmp"), "cmd", &[]).await.unwrap();
    assert!(adapter.get_pid(&id).await.unwrap().is_some());
}
