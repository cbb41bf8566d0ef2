// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::executor::{ExecutorAdapter, ExecutorError, ExecutorHandle, LaunchSpec};
use crate::multiplexer::{MultiplexerAdapter, MultiplexerError};
use async_trait::async_trait;
use std::path::Path;
use tracing::Instrument;

/// Wrapper that adds tracing to any `MultiplexerAdapter`
#[derive(Clone)]
pub struct TracedMultiplexer<M> {
    inner: M,
}

impl<M> TracedMultiplexer<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<M: MultiplexerAdapter> MultiplexerAdapter for TracedMultiplexer<M> {
    async fn spawn(
        &self,
        name: &str,
        cwd: &Path,
        cmd: &str,
        env: &[(String, String)],
    ) -> Result<String, MultiplexerError> {
        async {
            tracing::info!(cmd, env_count = env.len(), "starting");
            let start = std::time::Instant::now();
            let result = self.inner.spawn(name, cwd, cmd, env).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(id) => tracing::info!(window_id = id.as_str(), elapsed_ms, "window created"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "spawn failed"),
            }
            result
        }
        .instrument(tracing::info_span!("multiplexer.spawn", name, cwd = %cwd.display()))
        .await
    }

    async fn send(&self, id: &str, input: &str) -> Result<(), MultiplexerError> {
        let result = self.inner.send(id, input).await;
        if let Err(ref e) = result {
            tracing::error!(id, error = %e, "send failed");
        }
        result
    }

    async fn send_literal(&self, id: &str, text: &str) -> Result<(), MultiplexerError> {
        let result = self.inner.send_literal(id, text).await;
        if let Err(ref e) = result {
            tracing::error!(id, error = %e, "send_literal failed");
        }
        result
    }

    async fn send_enter(&self, id: &str) -> Result<(), MultiplexerError> {
        let result = self.inner.send_enter(id).await;
        if let Err(ref e) = result {
            tracing::error!(id, error = %e, "send_enter failed");
        }
        result
    }

    async fn kill(&self, id: &str) -> Result<(), MultiplexerError> {
        let result = self.inner.kill(id).await;
        tracing::info_span!("multiplexer.kill", id).in_scope(|| match &result {
            Ok(()) => tracing::info!("killed"),
            Err(e) => tracing::warn!(error = %e, "kill failed (may be expected)"),
        });
        result
    }

    async fn is_alive(&self, id: &str) -> Result<bool, MultiplexerError> {
        let result = self.inner.is_alive(id).await;
        tracing::trace!(id, alive = ?result.as_ref().ok(), "checked");
        result
    }

    async fn capture_output(&self, id: &str, lines: u32) -> Result<String, MultiplexerError> {
        self.inner.capture_output(id, lines).await
    }

    async fn is_process_running(&self, id: &str, pattern: &str) -> Result<bool, MultiplexerError> {
        self.inner.is_process_running(id, pattern).await
    }

    async fn get_pid(&self, id: &str) -> Result<Option<u32>, MultiplexerError> {
        self.inner.get_pid(id).await
    }

    async fn get_exit_code(&self, id: &str) -> Result<Option<i32>, MultiplexerError> {
        self.inner.get_exit_code(id).await
    }

    async fn configure(
        &self,
        id: &str,
        config: &serde_json::Value,
    ) -> Result<(), MultiplexerError> {
        self.inner.configure(id, config).await
    }
}

/// Wrapper that adds tracing to any `ExecutorAdapter`
pub struct TracedExecutor<E> {
    inner: E,
}

impl<E> TracedExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<E: ExecutorAdapter> ExecutorAdapter for TracedExecutor<E> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn is_available(&self) -> bool {
        self.inner.is_available().await
    }

    fn build_command(&self, spec: &LaunchSpec) -> String {
        self.inner.build_command(spec)
    }

    async fn execute(&self, spec: LaunchSpec) -> Result<ExecutorHandle, ExecutorError> {
        let span = tracing::info_span!("executor.execute", executor = self.inner.name(), task = %spec.name);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.execute(spec).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(h) => tracing::info!(window_id = %h.window_id, elapsed_ms, "executor launched"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "execute failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn resume(&self, spec: LaunchSpec) -> Result<ExecutorHandle, ExecutorError> {
        let span = tracing::info_span!("executor.resume", executor = self.inner.name(), task = %spec.name);
        async {
            let result = self.inner.resume(spec).await;
            if let Err(ref e) = result {
                tracing::error!(error = %e, "resume failed");
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn get_pid(&self, handle: &ExecutorHandle) -> Option<u32> {
        self.inner.get_pid(handle).await
    }

    async fn kill(&self, handle: &ExecutorHandle) -> Result<(), ExecutorError> {
        let result = self.inner.kill(handle).await;
        tracing::info_span!("executor.kill", window_id = %handle.window_id).in_scope(|| {
            match &result {
                Ok(()) => tracing::info!("killed"),
                Err(e) => tracing::warn!(error = %e, "kill failed (may be expected)"),
            }
        });
        result
    }

    async fn suspend(&self, handle: &ExecutorHandle) -> Result<(), ExecutorError> {
        self.inner.suspend(handle).await
    }

    async fn resume_process(&self, handle: &ExecutorHandle) -> Result<(), ExecutorError> {
        self.inner.resume_process(handle).await
    }

    async fn is_suspended(&self, handle: &ExecutorHandle) -> bool {
        self.inner.is_suspended(handle).await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
