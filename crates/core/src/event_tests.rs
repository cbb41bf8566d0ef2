// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn lifecycle_events_are_dispatched_journal_only_are_not() {
    let lifecycle = Event::TaskCompleted {
        task_id: TaskId::new(1),
        summary: "done".into(),
    };
    assert!(lifecycle.is_lifecycle());
    assert!(lifecycle.kind().is_some());

    let journal_only = Event::TaskLogAppended {
        task_id: TaskId::new(1),
        line_type: LineType::Output,
        content: "building...".into(),
    };
    assert!(!journal_only.is_lifecycle());
    assert!(journal_only.kind().is_none());

    let context = Event::ProjectContextSet {
        project: "myproj".into(),
    };
    assert!(!context.is_lifecycle());
    assert!(context.task_id().is_none());
}

#[test]
fn event_serializes_with_type_tag() {
    let e = Event::TaskQueued {
        task_id: TaskId::new(7),
    };
    let json = serde_json::to_value(&e).unwrap();
    assert_eq!(json["type"], "task.queued");
    assert_eq!(json["task_id"], 7);
}

#[test]
fn event_kind_round_trips_through_string() {
    for kind in [
        EventKind::TaskCreated,
        EventKind::TaskQueued,
        EventKind::TaskStarted,
        EventKind::TaskProcessing,
        EventKind::TaskBlocked,
        EventKind::TaskCompleted,
        EventKind::TaskFailed,
        EventKind::TaskInterrupted,
        EventKind::TaskRetried,
        EventKind::TaskStatusChanged,
        EventKind::TaskPinned,
        EventKind::TaskUnpinned,
        EventKind::TaskUpdated,
        EventKind::TaskDeleted,
    ] {
        let s = kind.to_string();
        let parsed: EventKind = s.parse().unwrap();
        assert_eq!(parsed, kind);
    }
}

#[test]
fn unknown_event_kind_string_is_rejected() {
    assert!("task.nonexistent".parse::<EventKind>().is_err());
}

#[test]
fn filter_matches_on_kind_task_and_project() {
    let record = EventRecord {
        id: 1,
        kind: EventKind::TaskCompleted,
        task_id: Some(TaskId::new(3)),
        project: Some("myproj".into()),
        metadata: serde_json::json!({}),
        message: "Task completed: fixed".into(),
        created_at: Utc::now(),
    };

    assert!(record.matches(&EventFilter::default()));
    assert!(record.matches(&EventFilter {
        kind: Some(EventKind::TaskCompleted),
        ..Default::default()
    }));
    assert!(!record.matches(&EventFilter {
        kind: Some(EventKind::TaskFailed),
        ..Default::default()
    }));
    assert!(!record.matches(&EventFilter {
        project: Some("other".into()),
        ..Default::default()
    }));
}
