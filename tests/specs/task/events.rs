//! Event log and webhook specs.
//!
//! Verify `ty events list` reflects task lifecycle transitions and
//! `ty events webhooks` round-trips registrations.

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
fn events_list_is_empty_for_a_fresh_daemon() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();

    ws.ty().args(&["events", "list"]).passes().stdout_has("No events.");
}

#[test]
fn queuing_a_task_appends_an_event() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();

    let id = create(&ws, "queue me for events");
    ws.ty().args(&["status", &id.to_string(), "queued"]).passes();

    ws.ty().args(&["events", "list"]).passes().stdout_has(&format!("task#{id}"));
}

#[test]
fn events_list_respects_limit() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();

    for i in 0..5 {
        let id = create(&ws, &format!("task {i}"));
        ws.ty().args(&["status", &id.to_string(), "queued"]).passes();
    }

    let output = ws.ty().args(&["events", "list", "-n", "2"]).passes().stdout();
    let lines = output.lines().filter(|l| !l.is_empty()).count();
    assert_eq!(lines, 2, "expected exactly 2 event lines, got:\n{output}");
}

#[test]
fn webhooks_add_list_and_remove_round_trip() {
    let ws = Workspace::empty();
    ws.ty().args(&["daemon", "start"]).passes();

    ws.ty().args(&["events", "webhooks", "list"]).passes().stdout_has("No webhooks registered.");

    let stdout = ws.ty().args(&["events", "webhooks", "add", "https://example.com/hook"]).passes().stdout();
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
        .expect("webhook add should print a numeric id");

    ws.ty().args(&["events", "webhooks", "list"]).passes().stdout_has("https://example.com/hook");

    ws.ty().args(&["events", "webhooks", "remove", &id.to_string()]).passes().stdout_has("Removed webhook");

    ws.ty().args(&["events", "webhooks", "list"]).passes().stdout_has("No webhooks registered.");
}
