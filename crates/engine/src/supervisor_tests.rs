// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashSet;
use std::process::Command as StdCommand;
use ty_adapters::{ExecutorError, FakeMultiplexerAdapter};
use ty_core::{Project, TaskConfig};

fn init_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let run = |args: &[&str]| {
        let status = StdCommand::new("git").arg("-C").arg(dir.path()).args(args).status().unwrap();
        assert!(status.success(), "git {:?} failed", args);
    };
    run(&["init", "-q", "-b", "main"]);
    run(&["config", "user.email", "test@example.com"]);
    run(&["config", "user.name", "test"]);
    std::fs::write(dir.path().join("README.md"), "hello\n").unwrap();
    run(&["add", "."]);
    run(&["commit", "-q", "-m", "init"]);
    dir
}

/// Test-only executor that spawns its agent window through the same shared
/// `FakeMultiplexerAdapter` the supervisor holds, so `mux.is_alive`/
/// `get_exit_code` on the agent's window id behave the way they would
/// against a real tmux daemon (where any adapter instance sees the same
/// sessions). `FakeExecutorAdapter` deliberately doesn't do this — it
/// mints its own opaque handles — which is right for testing executors in
/// isolation but wrong for exercising the supervisor's own liveness checks.
#[derive(Clone)]
struct BridgedExecutor {
    mux: FakeMultiplexerAdapter,
    calls: Arc<Mutex<Vec<BridgedCall>>>,
    suspended: Arc<Mutex<HashSet<String>>>,
}

#[derive(Debug, Clone)]
enum BridgedCall {
    Execute(LaunchSpec),
    Resume(LaunchSpec),
    Suspend(String),
}

impl BridgedExecutor {
    fn new(mux: FakeMultiplexerAdapter) -> Self {
        Self { mux, calls: Arc::new(Mutex::new(Vec::new())), suspended: Arc::new(Mutex::new(HashSet::new())) }
    }
}

#[async_trait]
impl ExecutorAdapter for BridgedExecutor {
    fn name(&self) -> &'static str {
        "claude"
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn build_command(&self, spec: &LaunchSpec) -> String {
        format!("claude {}", spec.name)
    }

    async fn execute(&self, spec: LaunchSpec) -> Result<ExecutorHandle, ExecutorError> {
        let window_id = self
            .mux
            .spawn(&spec.name, &spec.cwd, &self.build_command(&spec), &spec.env)
            .await
            .map_err(|e| ty_adapters::ExecutorError::SpawnFailed(e.to_string()))?;
        self.calls.lock().push(BridgedCall::Execute(spec));
        Ok(ExecutorHandle { window_id, session_id: Some("bridged-session".into()) })
    }

    async fn resume(&self, spec: LaunchSpec) -> Result<ExecutorHandle, ExecutorError> {
        let window_id = self
            .mux
            .spawn(&spec.name, &spec.cwd, &self.build_command(&spec), &spec.env)
            .await
            .map_err(|e| ty_adapters::ExecutorError::SpawnFailed(e.to_string()))?;
        self.calls.lock().push(BridgedCall::Resume(spec.clone()));
        Ok(ExecutorHandle { window_id, session_id: spec.resume_session_id })
    }

    async fn get_pid(&self, handle: &ExecutorHandle) -> Option<u32> {
        self.mux.get_pid(&handle.window_id).await.ok().flatten()
    }

    async fn kill(&self, handle: &ExecutorHandle) -> Result<(), ExecutorError> {
        self.mux
            .kill(&handle.window_id)
            .await
            .map_err(|e| ty_adapters::ExecutorError::KillFailed(e.to_string()))
    }

    async fn suspend(&self, handle: &ExecutorHandle) -> Result<(), ExecutorError> {
        self.suspended.lock().insert(handle.window_id.clone());
        self.calls.lock().push(BridgedCall::Suspend(handle.window_id.clone()));
        Ok(())
    }

    async fn resume_process(&self, handle: &ExecutorHandle) -> Result<(), ExecutorError> {
        self.suspended.lock().remove(&handle.window_id);
        Ok(())
    }

    async fn is_suspended(&self, handle: &ExecutorHandle) -> bool {
        self.suspended.lock().contains(&handle.window_id)
    }
}

struct Harness {
    _repo: tempfile::TempDir,
    _data_dir: tempfile::TempDir,
    store: Arc<Store>,
    mux: FakeMultiplexerAdapter,
    executor: BridgedExecutor,
}

fn harness() -> Harness {
    let repo = init_repo();
    let data_dir = tempfile::tempdir().unwrap();
    let store = Arc::new(Store::open(data_dir.path().join("store")).unwrap());
    store.register_project(Project::new("demo", repo.path().to_path_buf())).unwrap();
    let mux = FakeMultiplexerAdapter::new();
    let executor = BridgedExecutor::new(mux.clone());
    Harness { _repo: repo, _data_dir: data_dir, store, mux, executor }
}

fn supervisor(h: &Harness) -> Supervisor<FakeMultiplexerAdapter> {
    let config = EngineConfig::load(h._data_dir.path());
    let mut executors: HashMap<String, Arc<dyn ExecutorAdapter>> = HashMap::new();
    executors.insert("claude".to_string(), Arc::new(h.executor.clone()));
    Supervisor::new(h.store.clone(), config, executors, h.mux.clone(), CancellationToken::new())
}

fn new_task(h: &Harness, body: &str) -> TaskId {
    let task = h
        .store
        .create_task(TaskConfig { project: "demo".into(), executor: "claude".into(), body: body.into(), ..Default::default() })
        .unwrap();
    h.store.queue_task(task.id).unwrap();
    h.store.mark_processing(task.id).unwrap();
    task.id
}

#[tokio::test]
async fn launch_task_creates_worktree_and_persists_handles() {
    let h = harness();
    let task_id = new_task(&h, "do the thing");

    let sup = supervisor(&h);
    sup.launch_task(task_id).await.unwrap();

    let task = h.store.get_task(task_id).unwrap();
    assert!(task.mux_window_id.is_some());
    assert!(task.agent_pane_id.is_some());
    assert!(task.shell_pane_id.is_some());
    assert!(task.worktree_path.is_some());
    assert!(task.started_at.is_some());
    assert_eq!(h.executor.calls.lock().len(), 1);
    assert!(matches!(h.executor.calls.lock()[0], BridgedCall::Execute(_)));
}

#[tokio::test]
async fn launch_task_on_retry_uses_retry_prompt_and_resume() {
    let h = harness();
    let task_id = new_task(&h, "do the thing");

    let sup = supervisor(&h);
    sup.launch_task(task_id).await.unwrap();

    h.store.fail_task(task_id, "boom").unwrap();
    h.store.retry_task(task_id, Some("please fix the bug".into())).unwrap();
    assert_eq!(h.store.get_task(task_id).unwrap().total_retries, 1);

    sup.launch_task(task_id).await.unwrap();

    let calls = h.executor.calls.lock().clone();
    match &calls[1] {
        BridgedCall::Resume(spec) => {
            assert!(spec.resume_session_id.is_some());
        }
        other => panic!("expected a resume call, got {other:?}"),
    }
}

#[tokio::test]
async fn idle_reap_sweep_suspends_task_with_unchanged_log_size() {
    let h = harness();
    let task_id = new_task(&h, "");

    let sup = supervisor(&h);
    sup.launch_task(task_id).await.unwrap();

    // First sweep observes the (empty) log size and starts the grace window.
    sup.idle_reap_sweep().await;
    assert!(h.executor.calls.lock().iter().all(|c| !matches!(c, BridgedCall::Suspend(_))));

    // Force the grace window to have already elapsed by rewinding the
    // in-memory quiescence clock; the second sweep should suspend.
    if let Some(since) = sup.quiescent_since.lock().get_mut(&task_id) {
        *since = Utc::now() - chrono::Duration::minutes(20);
    }
    sup.idle_reap_sweep().await;

    assert!(h.executor.calls.lock().iter().any(|c| matches!(c, BridgedCall::Suspend(_))));
}

#[tokio::test]
async fn idle_reap_sweep_reaps_exited_window_as_failed() {
    let h = harness();
    let task_id = new_task(&h, "");

    let sup = supervisor(&h);
    sup.launch_task(task_id).await.unwrap();

    let window_id = h.store.get_task(task_id).unwrap().mux_window_id.unwrap();
    h.mux.set_exited(&window_id, 1);

    sup.idle_reap_sweep().await;

    assert_eq!(h.store.get_task(task_id).unwrap().status, TaskStatus::Failed);
}

#[tokio::test]
async fn reconcile_fails_processing_tasks_with_no_live_window() {
    let h = harness();
    let task_id = new_task(&h, "");
    h.store
        .update_task(task_id, TaskPatch { mux_window_id: Some(Some("gone".into())), ..Default::default() })
        .unwrap();

    let sup = supervisor(&h);
    sup.reconcile().await;

    assert_eq!(h.store.get_task(task_id).unwrap().status, TaskStatus::Failed);
}

#[tokio::test]
async fn reconcile_leaves_task_with_live_window_alone() {
    let h = harness();
    let task_id = new_task(&h, "");

    let sup = supervisor(&h);
    sup.launch_task(task_id).await.unwrap();

    sup.reconcile().await;

    assert_eq!(h.store.get_task(task_id).unwrap().status, TaskStatus::Processing);
}

#[tokio::test]
async fn kill_task_fails_task_and_tears_down_windows() {
    let h = harness();
    let task_id = new_task(&h, "");

    let sup = supervisor(&h);
    sup.launch_task(task_id).await.unwrap();

    sup.kill_task(task_id, "operator requested cancellation").await.unwrap();

    assert_eq!(h.store.get_task(task_id).unwrap().status, TaskStatus::Failed);
}

#[tokio::test]
async fn launch_task_fails_when_executor_is_unregistered() {
    let h = harness();
    let task = h
        .store
        .create_task(TaskConfig { project: "demo".into(), executor: "nonexistent".into(), ..Default::default() })
        .unwrap();
    h.store.queue_task(task.id).unwrap();
    h.store.mark_processing(task.id).unwrap();

    let sup = supervisor(&h);
    let result = sup.launch_task(task.id).await;
    assert!(result.is_err());
}
