//! CLI error handling specs.
//!
//! Verify error messages and exit codes for invalid commands and
//! requests against an unreachable daemon.

use crate::prelude::*;

#[test]
fn show_unknown_task_fails_with_exit_code_one() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();

    ws.ty().args(&["show", "99999"]).fails().code_eq(1).stderr_has("not found");
}

#[test]
fn invalid_subcommand_shows_clap_usage_error() {
    let ws = Workspace::empty();
    ws.ty().args(&["nonexistent"]).fails().stderr_has("error:");
}

#[test]
fn invalid_status_value_is_rejected() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();

    let stdout = ws.ty().args(&["create", "a task", "--kind", "feature"]).passes().stdout();
    let id = stdout
        .trim()
        .split_once(':')
        .map(|(head, _)| head)
        .unwrap()
        .rsplit('#')
        .next()
        .unwrap()
        .trim()
        .parse::<u64>()
        .expect("create should print a numeric task id");

    ws.ty().args(&["status", &id.to_string(), "not-a-status"]).fails().code_eq(3).stderr_has(
        "unsupported status transition",
    );
}

#[test]
fn commands_fail_with_exit_code_two_when_daemon_unreachable() {
    let ws = Workspace::empty();
    // Never started the daemon, and TY_DAEMON_BINARY points at a path that
    // doesn't exist, so autostart fails deterministically.
    ws.ty().env("TY_DAEMON_BINARY", "/nonexistent/tyd").args(&["create", "a task"]).fails().code_eq(2);
}
