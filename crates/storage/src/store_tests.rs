// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

fn config(title: &str) -> TaskConfig {
    TaskConfig {
        title: title.into(),
        project: "myproj".into(),
        executor: "claude".into(),
        ..Default::default()
    }
}

#[test]
fn create_assigns_monotonic_ids() {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();

    let a = store.create_task(config("first")).unwrap();
    let b = store.create_task(config("second")).unwrap();
    assert_eq!(a.id, TaskId::new(0));
    assert_eq!(b.id, TaskId::new(1));
    assert_eq!(a.status, TaskStatus::Backlog);
}

#[test]
fn reopening_replays_the_wal() {
    let dir = tempdir().unwrap();
    let id = {
        let store = Store::open(dir.path()).unwrap();
        let task = store.create_task(config("survives restart")).unwrap();
        store.queue_task(task.id).unwrap();
        task.id
    };

    let reopened = Store::open(dir.path()).unwrap();
    let task = reopened.get_task(id).unwrap();
    assert_eq!(task.title, "survives restart");
    assert_eq!(task.status, TaskStatus::Queued);
}

#[test]
fn illegal_transition_is_rejected() {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let task = store.create_task(config("t")).unwrap();

    let err = store.mark_processing(task.id).unwrap_err();
    assert!(matches!(err, StoreError::IllegalTransition { .. }));
}

#[test]
fn update_task_diffs_only_changed_fields() {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let task = store.create_task(config("before")).unwrap();

    let patched = store
        .update_task(
            task.id,
            TaskPatch {
                title: Some("after".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(patched.title, "after");
    assert_eq!(patched.body, task.body);

    let unchanged = store.update_task(task.id, TaskPatch::default()).unwrap();
    assert_eq!(unchanged.updated_at, patched.updated_at);
}

#[test]
fn delete_then_get_returns_not_found() {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let task = store.create_task(config("doomed")).unwrap();

    store.delete_task(task.id).unwrap();
    assert!(matches!(
        store.get_task(task.id).unwrap_err(),
        StoreError::TaskNotFound(_)
    ));
}

#[test]
fn list_tasks_excludes_closed_by_default() {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let open = store.create_task(config("open")).unwrap();
    let closed = store.create_task(config("closed")).unwrap();
    store.queue_task(closed.id).unwrap();
    store.mark_processing(closed.id).unwrap();
    store.complete_task(closed.id, "done").unwrap();

    let visible = store.list_tasks(&TaskFilter::default());
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, open.id);

    let all = store.list_tasks(&TaskFilter {
        include_closed: true,
        ..Default::default()
    });
    assert_eq!(all.len(), 2);
}

#[test]
fn retry_from_failed_increments_count_and_clears_summary() {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let task = store.create_task(config("flaky")).unwrap();
    store.queue_task(task.id).unwrap();
    store.mark_processing(task.id).unwrap();
    store.fail_task(task.id, "boom").unwrap();

    let retried = store.retry_task(task.id, Some("use less memory".into())).unwrap();
    assert_eq!(retried.status, TaskStatus::Processing);
    assert_eq!(retried.total_retries, 1);
}

#[test]
fn logs_accumulate_without_appearing_in_event_log() {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let task = store.create_task(config("chatty")).unwrap();

    store.append_log(task.id, LineType::Output, "building...").unwrap();
    store.append_log(task.id, LineType::Output, "done").unwrap();

    assert_eq!(store.logs(task.id).len(), 2);
    let events = store.list_events(&EventFilter {
        task_id: Some(task.id),
        ..Default::default()
    });
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::TaskCreated);
}

#[test]
fn attachments_round_trip_through_disk() {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let task = store.create_task(config("with screenshot")).unwrap();

    let attachment = store
        .add_attachment(task.id, "shot.png", "image/png", b"\x89PNG...")
        .unwrap();
    assert_eq!(store.list_attachments(task.id).len(), 1);

    let (meta, bytes) = store.get_attachment(attachment.id).unwrap();
    assert_eq!(meta.filename, "shot.png");
    assert_eq!(bytes, b"\x89PNG...");
}

#[test]
fn project_context_is_last_writer_wins_and_persists_across_reopen() {
    let dir = tempdir().unwrap();
    {
        let store = Store::open(dir.path()).unwrap();
        store.set_project_context("myproj", "uses vitest, not jest").unwrap();
    }
    let reopened = Store::open(dir.path()).unwrap();
    assert_eq!(
        reopened.get_project_context("myproj"),
        "uses vitest, not jest"
    );
}

#[test]
fn subscriber_is_notified_on_commit() {
    use std::sync::{Arc, Mutex as StdMutex};

    let dir = tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let seen: Arc<StdMutex<Vec<EventKind>>> = Arc::new(StdMutex::new(Vec::new()));
    let sink = seen.clone();
    store.subscribe(move |record| sink.lock().unwrap().push(record.kind));

    let task = store.create_task(config("observed")).unwrap();
    store.queue_task(task.id).unwrap();

    let recorded = seen.lock().unwrap();
    assert_eq!(*recorded, vec![EventKind::TaskCreated, EventKind::TaskQueued]);
}

#[test]
fn checkpoint_then_truncate_survives_reopen() {
    let dir = tempdir().unwrap();
    let id = {
        let store = Store::open(dir.path()).unwrap();
        let task = store.create_task(config("checkpointed")).unwrap();
        let (seq, state) = store.checkpoint_state();
        store.checkpointer().checkpoint_sync(seq, &state).unwrap();
        store.truncate_wal(seq).unwrap();
        task.id
    };

    let reopened = Store::open(dir.path()).unwrap();
    assert_eq!(reopened.get_task(id).unwrap().title, "checkpointed");
}
