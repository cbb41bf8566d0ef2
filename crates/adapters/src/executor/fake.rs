// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake executor adapter for testing the Executor Supervisor without
//! spawning real agent CLIs.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ExecutorAdapter, ExecutorError, ExecutorHandle, LaunchSpec};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum ExecutorCall {
    Execute(LaunchSpec),
    Resume(LaunchSpec),
    Kill(String),
    Suspend(String),
    ResumeProcess(String),
}

struct State {
    calls: Vec<ExecutorCall>,
    handles: HashMap<String, bool>, // window_id -> alive
    suspended: HashMap<String, bool>,
    available: bool,
    fail_next_execute: Option<String>,
}

/// Fake executor adapter. Every `execute`/`resume` succeeds unless
/// `fail_next_execute` has been set, recording every call for assertions.
#[derive(Clone)]
pub struct FakeExecutorAdapter {
    name: &'static str,
    inner: Arc<Mutex<State>>,
    next_id: Arc<AtomicU64>,
}

impl FakeExecutorAdapter {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Arc::new(Mutex::new(State {
                calls: Vec::new(),
                handles: HashMap::new(),
                suspended: HashMap::new(),
                available: true,
                fail_next_execute: None,
            })),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn calls(&self) -> Vec<ExecutorCall> {
        self.inner.lock().calls.clone()
    }

    pub fn set_available(&self, available: bool) {
        self.inner.lock().available = available;
    }

    pub fn fail_next_execute(&self, reason: impl Into<String>) {
        self.inner.lock().fail_next_execute = Some(reason.into());
    }

    fn next_handle(&self) -> ExecutorHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let window_id = format!("fake-exec-{id}");
        self.inner.lock().handles.insert(window_id.clone(), true);
        ExecutorHandle { window_id, session_id: Some(format!("fake-session-{id}")) }
    }
}

#[async_trait]
impl ExecutorAdapter for FakeExecutorAdapter {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn is_available(&self) -> bool {
        self.inner.lock().available
    }

    fn build_command(&self, spec: &LaunchSpec) -> String {
        format!("{} {}", self.name, spec.name)
    }

    async fn execute(&self, spec: LaunchSpec) -> Result<ExecutorHandle, ExecutorError> {
        {
            let mut inner = self.inner.lock();
            inner.calls.push(ExecutorCall::Execute(spec.clone()));
            if let Some(reason) = inner.fail_next_execute.take() {
                return Err(ExecutorError::SpawnFailed(reason));
            }
        }
        Ok(self.next_handle())
    }

    async fn resume(&self, spec: LaunchSpec) -> Result<ExecutorHandle, ExecutorError> {
        self.inner.lock().calls.push(ExecutorCall::Resume(spec.clone()));
        if spec.resume_session_id.is_none() {
            return Err(ExecutorError::SpawnFailed("resume requires a session id".into()));
        }
        Ok(self.next_handle())
    }

    async fn get_pid(&self, _handle: &ExecutorHandle) -> Option<u32> {
        Some(4242)
    }

    async fn kill(&self, handle: &ExecutorHandle) -> Result<(), ExecutorError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ExecutorCall::Kill(handle.window_id.clone()));
        inner.handles.insert(handle.window_id.clone(), false);
        Ok(())
    }

    async fn suspend(&self, handle: &ExecutorHandle) -> Result<(), ExecutorError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ExecutorCall::Suspend(handle.window_id.clone()));
        inner.suspended.insert(handle.window_id.clone(), true);
        Ok(())
    }

    async fn resume_process(&self, handle: &ExecutorHandle) -> Result<(), ExecutorError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ExecutorCall::ResumeProcess(handle.window_id.clone()));
        inner.suspended.insert(handle.window_id.clone(), false);
        Ok(())
    }

    async fn is_suspended(&self, handle: &ExecutorHandle) -> bool {
        self.inner
            .lock()
            .suspended
            .get(&handle.window_id)
            .copied()
            .unwrap_or(false)
    }
}
