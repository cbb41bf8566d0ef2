// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler (SPEC_FULL §4.G): promotes queued tasks into processing up to
//! the configured concurrency cap, fires one-shot `scheduled_at` triggers
//! and recurring `recurrence` triggers, and drives the idle-reap sweep and
//! startup reconciliation pass on a coarse tick.
//!
//! Grounded on the teacher's `scheduler.rs` (timer-driven promotion loop)
//! and `runtime/handlers/timer.rs` (fired-timer dispatch); generalized from
//! the teacher's job/pipeline/cron domain onto the single Task queue. The
//! cron evaluation itself lives in `ty_core::CronSchedule` (§2's no-external-
//! crate decision), not duplicated here.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ty_core::{CronSchedule, TaskId, TaskStatus};
use ty_storage::{Store, StoreError, TaskFilter, TaskPatch};

/// Coarse scheduler tick, per §5 ("1-5s ticks").
pub const TICK_INTERVAL: Duration = Duration::from_secs(2);

/// Callbacks the scheduler drives on each tick. Implemented by the Executor
/// Supervisor; split out as a trait so the promotion/trigger logic below can
/// be unit tested without spinning up real executor/multiplexer adapters.
#[async_trait]
pub trait SchedulerHooks: Send + Sync {
    /// Launch (or resume) the executor for a task that was just promoted to
    /// `processing`.
    async fn launch(&self, task_id: TaskId);

    /// Suspend tasks that have been quiescent past the idle threshold.
    async fn idle_reap_sweep(&self);

    /// Re-adopt or fail tasks left `processing` from a prior daemon run.
    async fn reconcile(&self);
}

/// Promote queued tasks into `processing` until `limit` concurrent tasks are
/// running, oldest-queued first. Returns the ids promoted this tick.
pub fn promote_queued(store: &Store, limit: usize) -> Result<Vec<TaskId>, StoreError> {
    let processing = store
        .list_tasks(&TaskFilter { status: Some(TaskStatus::Processing), ..Default::default() })
        .len();
    let mut slots = limit.saturating_sub(processing);
    if slots == 0 {
        return Ok(Vec::new());
    }

    let mut queued = store.list_tasks(&TaskFilter { status: Some(TaskStatus::Queued), ..Default::default() });
    queued.sort_by_key(|t| t.created_at);

    let mut promoted = Vec::new();
    for task in queued {
        if slots == 0 {
            break;
        }
        store.mark_processing(task.id)?;
        promoted.push(task.id);
        slots -= 1;
    }
    Ok(promoted)
}

/// Queue one-shot `scheduled_at` triggers that have come due, clearing the
/// field once fired so it isn't re-evaluated next tick.
pub fn fire_scheduled_triggers(store: &Store, now: DateTime<Utc>) -> Result<Vec<TaskId>, StoreError> {
    let mut fired = Vec::new();
    for task in store.list_tasks(&TaskFilter { status: Some(TaskStatus::Backlog), ..Default::default() }) {
        let Some(scheduled_at) = task.scheduled_at else { continue };
        if scheduled_at > now {
            continue;
        }
        store.queue_task(task.id)?;
        store.update_task(task.id, TaskPatch { scheduled_at: Some(None), ..Default::default() })?;
        fired.push(task.id);
    }
    Ok(fired)
}

/// Re-enter a finished recurring task at its next occurrence. A recurring
/// task's `scheduled_at` holds the *next* fire time once it has completed a
/// cycle; when that time comes due the task re-enters `processing` directly
/// (the state machine's retry edge — `(Done|Failed, Processing)` — covers
/// the jump, since a finished recurring task never returns to `Backlog`).
pub fn requeue_recurring(store: &Store, now: DateTime<Utc>) -> Result<Vec<TaskId>, StoreError> {
    let mut requeued = Vec::new();
    for task in store.list_tasks(&TaskFilter { include_closed: true, ..Default::default() }) {
        let Some(recurrence) = &task.recurrence else { continue };
        if !matches!(task.status, TaskStatus::Done | TaskStatus::Failed) {
            continue;
        }
        let Ok(schedule) = CronSchedule::parse(recurrence) else { continue };
        let anchor = task.scheduled_at.unwrap_or(task.completed_at.unwrap_or(task.updated_at));
        if anchor > now {
            continue;
        }
        store.retry_task(task.id, None)?;
        let next = schedule.next_after(now);
        store.update_task(task.id, TaskPatch { scheduled_at: Some(next), ..Default::default() })?;
        requeued.push(task.id);
    }
    Ok(requeued)
}

/// One scheduler tick: triggers, recurrence, promotion, idle-reap.
pub async fn tick(store: &Store, concurrency: usize, hooks: &dyn SchedulerHooks) {
    let now = Utc::now();
    if let Err(err) = fire_scheduled_triggers(store, now) {
        tracing::warn!(error = %err, "fire_scheduled_triggers failed");
    }
    if let Err(err) = requeue_recurring(store, now) {
        tracing::warn!(error = %err, "requeue_recurring failed");
    }
    match promote_queued(store, concurrency) {
        Ok(promoted) => {
            for task_id in promoted {
                hooks.launch(task_id).await;
            }
        }
        Err(err) => tracing::warn!(error = %err, "promote_queued failed"),
    }
    hooks.idle_reap_sweep().await;
}

/// Run the scheduler loop until `shutdown` fires. Runs `reconcile` once up
/// front, per §4.D/§4.G's startup reconciliation pass.
pub async fn run(
    store: &Store,
    concurrency: usize,
    hooks: &dyn SchedulerHooks,
    shutdown: tokio_util::sync::CancellationToken,
) {
    hooks.reconcile().await;
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(TICK_INTERVAL) => tick(store, concurrency, hooks).await,
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
