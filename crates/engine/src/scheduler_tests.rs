// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use parking_lot::Mutex;
use std::sync::Arc;
use ty_core::{Recurrence, TaskConfig};

fn store() -> Store {
    let dir = tempfile::tempdir().unwrap();
    Store::open(dir.path().to_path_buf()).unwrap()
}

#[derive(Default, Clone)]
struct RecordingHooks {
    launched: Arc<Mutex<Vec<TaskId>>>,
    reaps: Arc<Mutex<u32>>,
    reconciles: Arc<Mutex<u32>>,
}

#[async_trait]
impl SchedulerHooks for RecordingHooks {
    async fn launch(&self, task_id: TaskId) {
        self.launched.lock().push(task_id);
    }

    async fn idle_reap_sweep(&self) {
        *self.reaps.lock() += 1;
    }

    async fn reconcile(&self) {
        *self.reconciles.lock() += 1;
    }
}

#[test]
fn promote_queued_respects_concurrency_limit() {
    let store = store();
    let a = store.create_task(TaskConfig::default()).unwrap();
    let b = store.create_task(TaskConfig::default()).unwrap();
    store.queue_task(a.id).unwrap();
    store.queue_task(b.id).unwrap();

    let promoted = promote_queued(&store, 1).unwrap();
    assert_eq!(promoted, vec![a.id]);
    assert_eq!(store.get_task(a.id).unwrap().status, TaskStatus::Processing);
    assert_eq!(store.get_task(b.id).unwrap().status, TaskStatus::Queued);
}

#[test]
fn promote_queued_accounts_for_already_processing_tasks() {
    let store = store();
    let a = store.create_task(TaskConfig::default()).unwrap();
    store.queue_task(a.id).unwrap();
    store.mark_processing(a.id).unwrap();
    let b = store.create_task(TaskConfig::default()).unwrap();
    store.queue_task(b.id).unwrap();

    let promoted = promote_queued(&store, 1).unwrap();
    assert!(promoted.is_empty());
}

#[test]
fn fire_scheduled_triggers_queues_due_backlog_tasks() {
    let store = store();
    let task = store.create_task(TaskConfig::default()).unwrap();
    let now = Utc::now();
    store
        .update_task(task.id, TaskPatch { scheduled_at: Some(Some(now - chrono::Duration::minutes(1))), ..Default::default() })
        .unwrap();

    let fired = fire_scheduled_triggers(&store, now).unwrap();
    assert_eq!(fired, vec![task.id]);
    let task = store.get_task(task.id).unwrap();
    assert_eq!(task.status, TaskStatus::Queued);
    assert!(task.scheduled_at.is_none());
}

#[test]
fn fire_scheduled_triggers_ignores_future_times() {
    let store = store();
    let task = store.create_task(TaskConfig::default()).unwrap();
    let now = Utc::now();
    store
        .update_task(task.id, TaskPatch { scheduled_at: Some(Some(now + chrono::Duration::hours(1))), ..Default::default() })
        .unwrap();

    assert!(fire_scheduled_triggers(&store, now).unwrap().is_empty());
}

#[test]
fn requeue_recurring_reenters_processing_and_computes_next_occurrence() {
    let store = store();
    let task = store
        .create_task(TaskConfig {
            recurrence: Some(Recurrence("0 * * * *".into())),
            ..Default::default()
        })
        .unwrap();
    store.queue_task(task.id).unwrap();
    store.mark_processing(task.id).unwrap();
    store.complete_task(task.id, "done").unwrap();

    let now = Utc::now();
    let requeued = requeue_recurring(&store, now).unwrap();
    assert_eq!(requeued, vec![task.id]);
    let task = store.get_task(task.id).unwrap();
    assert_eq!(task.status, TaskStatus::Processing);
    assert!(task.scheduled_at.is_some());
}

#[test]
fn requeue_recurring_skips_tasks_not_yet_due() {
    let store = store();
    let task = store
        .create_task(TaskConfig {
            recurrence: Some(Recurrence("0 * * * *".into())),
            ..Default::default()
        })
        .unwrap();
    store.queue_task(task.id).unwrap();
    store.mark_processing(task.id).unwrap();
    store.complete_task(task.id, "done").unwrap();
    store
        .update_task(task.id, TaskPatch { scheduled_at: Some(Some(Utc::now() + chrono::Duration::hours(1))), ..Default::default() })
        .unwrap();

    assert!(requeue_recurring(&store, Utc::now()).unwrap().is_empty());
}

#[tokio::test]
async fn tick_launches_promoted_tasks_and_sweeps_idle() {
    let store = store();
    let task = store.create_task(TaskConfig::default()).unwrap();
    store.queue_task(task.id).unwrap();

    let hooks = RecordingHooks::default();
    tick(&store, 1, &hooks).await;

    assert_eq!(hooks.launched.lock().clone(), vec![task.id]);
    assert_eq!(*hooks.reaps.lock(), 1);
}
