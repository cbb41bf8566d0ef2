//! Task lifecycle specs.
//!
//! Verify the create → list → board → update → pin → close → delete flow
//! through the `ty` CLI against a real `tyd` daemon.

use crate::prelude::*;

fn create(ws: &Workspace, title: &str) -> u64 {
    let stdout = ws.ty().args(&["create", title]).passes().stdout();
    stdout
        .trim()
        .split_once(':')
        .map(|(head, _)| head)
        .unwrap()
        .rsplit('#')
        .next()
        .unwrap()
        .trim()
        .parse()
        .expect("create should print a numeric task id")
}

#[test]
fn create_then_show_round_trips_fields() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();

    let id = create(&ws, "write the changelog");

    ws.ty()
        .args(&["show", &id.to_string()])
        .passes()
        .stdout_has("write the changelog")
        .stdout_has("status:")
        .stdout_has("backlog");
}

#[test]
fn created_task_appears_in_list() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();

    let id = create(&ws, "fix the flaky test");

    ws.ty().args(&["list"]).passes().stdout_has(&id.to_string()).stdout_has("fix the flaky test");
}

#[test]
fn created_task_appears_on_board_under_backlog() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();

    create(&ws, "draft the proposal");

    ws.ty().args(&["board"]).passes().stdout_has("backlog").stdout_has("draft the proposal");
}

#[test]
fn update_changes_title() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();

    let id = create(&ws, "old title");
    ws.ty().args(&["update", &id.to_string(), "--title", "new title"]).passes();

    ws.ty().args(&["show", &id.to_string()]).passes().stdout_has("new title").stdout_lacks("old title");
}

#[test]
fn status_moves_task_between_columns() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();

    let id = create(&ws, "move me");
    ws.ty().args(&["status", &id.to_string(), "queued"]).passes();

    ws.ty().args(&["show", &id.to_string()]).passes().stdout_has("queued");
}

#[test]
fn pin_and_unpin_round_trip() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();

    let id = create(&ws, "important task");
    ws.ty().args(&["pin", &id.to_string()]).passes();
    ws.ty().args(&["show", &id.to_string()]).passes().stdout_has("pinned:    true");

    ws.ty().args(&["pin", &id.to_string(), "--unpin"]).passes();
    ws.ty().args(&["show", &id.to_string()]).passes().stdout_has("pinned:    false");
}

#[test]
fn close_archives_task_off_the_board() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();

    let id = create(&ws, "done with this");
    ws.ty().args(&["close", &id.to_string()]).passes();

    ws.ty().args(&["board"]).passes().stdout_lacks("done with this");
    ws.ty().args(&["show", &id.to_string()]).passes().stdout_has("archived");
}

#[test]
fn delete_removes_task_permanently() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();

    let id = create(&ws, "mistake");
    ws.ty().args(&["delete", &id.to_string()]).passes();

    ws.ty().args(&["show", &id.to_string()]).fails().code_eq(1).stderr_has("not found");
}

#[test]
fn retry_requeues_a_failed_task_with_feedback() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();

    let id = create(&ws, "flaky executor run");
    ws.ty().args(&["status", &id.to_string(), "failed"]).passes();

    ws.ty().args(&["retry", &id.to_string(), "--feedback", "please retry with more context"]).passes();

    ws.ty().args(&["show", &id.to_string()]).passes().stdout_lacks("failed");
}
