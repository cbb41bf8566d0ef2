//! Daemon lifecycle specs.
//!
//! Verify `ty daemon` start/stop/status lifecycle and stale-state recovery.

use crate::prelude::*;

#[test]
fn daemon_status_fails_when_not_running() {
    let ws = Workspace::empty();

    ws.ty().args(&["daemon", "status"]).passes().stdout_has("Daemon not running");
}

#[test]
fn daemon_start_reports_success() {
    let ws = Workspace::empty();

    ws.ty().args(&["daemon", "start"]).passes().stdout_has("Daemon started");
}

#[test]
fn daemon_status_shows_running_after_start() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();
    ws.ty().args(&["daemon", "status"]).passes().stdout_has("Status: running");
}

#[test]
fn daemon_status_shows_uptime() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();
    ws.ty().args(&["daemon", "status"]).passes().stdout_has("Uptime:");
}

#[test]
fn daemon_status_shows_queue_counts() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();
    ws.ty().args(&["daemon", "status"]).passes().stdout_has("Queued:").stdout_has("Processing:").stdout_has(
        "Blocked:",
    );
}

#[test]
fn daemon_status_shows_version() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();
    ws.ty().args(&["daemon", "status"]).passes().stdout_has("Version:");
}

#[test]
fn daemon_stop_reports_success() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();
    ws.ty().args(&["daemon", "stop"]).passes().stdout_has("Daemon stopped");
}

#[test]
fn daemon_status_fails_after_stop() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();
    ws.ty().args(&["daemon", "stop"]).passes();
    ws.ty().args(&["daemon", "status"]).passes().stdout_has("Daemon not running");
}

#[test]
fn daemon_restart_reports_success() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();
    ws.ty().args(&["daemon", "restart"]).passes().stdout_has("Daemon restarted");
    ws.ty().args(&["daemon", "status"]).passes().stdout_has("Status: running");
}

#[test]
fn daemon_creates_version_file() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();

    let version_file = ws.state_path().join("tyd.version");
    let has_version = wait_for(SPEC_WAIT_MAX_MS, || version_file.exists());

    assert!(has_version, "tyd.version file should exist");
}

#[test]
fn daemon_creates_lock_file() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();

    let lock_file = ws.state_path().join("tyd.lock");
    let has_lock = wait_for(SPEC_WAIT_MAX_MS, || lock_file.exists());

    assert!(has_lock, "tyd.lock file should exist");
}

#[test]
fn daemon_creates_socket_file() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();

    let socket_file = ws.state_path().join("tyd.sock");
    let has_socket = wait_for(SPEC_WAIT_MAX_MS, || socket_file.exists());

    assert!(has_socket, "daemon socket file should exist");
}

/// Running `tyd` directly when a daemon is already running must not disrupt it.
///
/// A failed startup used to delete the socket and lock files belonging to
/// the running daemon, making it unreachable.
#[test]
fn running_tyd_while_daemon_running_does_not_kill_it() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();
    ws.ty().args(&["daemon", "status"]).passes().stdout_has("Status: running");

    let tyd = tyd_binary();
    let output = std::process::Command::new(&tyd).env("TY_STATE_DIR", ws.state_path()).output().expect("tyd should run");
    assert!(!output.status.success(), "tyd should fail when daemon is already running");

    ws.ty().args(&["daemon", "status"]).passes().stdout_has("Status: running");

    assert!(ws.state_path().join("tyd.sock").exists(), "socket file must survive failed tyd");
    assert!(ws.state_path().join("tyd.lock").exists(), "lock file must survive failed tyd");
}

/// Running `tyd` twice after the first daemon exits should work normally —
/// the lock file must be released when a daemon exits.
#[test]
fn tyd_starts_after_previous_daemon_stopped() {
    let ws = Workspace::empty();

    ws.ty().args(&["daemon", "start"]).passes();
    ws.ty().args(&["daemon", "stop"]).passes();

    ws.ty().args(&["daemon", "start"]).passes();
    ws.ty().args(&["daemon", "status"]).passes().stdout_has("Status: running");
}
