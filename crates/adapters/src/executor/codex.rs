// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `codex` executor: OpenAI's Codex CLI.
//!
//! Codex's sandbox/approval confirmation is the only first-run prompt that
//! needs auto-dismissal; it has no separate workspace-trust screen.

use super::prompt::{poll_for_prompt, PromptCheck, PromptResult};
use super::signal;
use super::{ExecutorAdapter, ExecutorError, ExecutorHandle, LaunchSpec};
use crate::env::prompt_poll_max_attempts;
use crate::multiplexer::MultiplexerAdapter;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};

const APPROVAL_PROMPT: &[&str] = &["allow Codex to work in this folder", "Yes, proceed"];

pub struct CodexExecutorAdapter<M: MultiplexerAdapter> {
    mux: M,
    suffix_counter: AtomicU32,
}

impl<M: MultiplexerAdapter> CodexExecutorAdapter<M> {
    pub fn new(mux: M) -> Self {
        Self { mux, suffix_counter: AtomicU32::new(0) }
    }

    fn window_name(&self, spec: &LaunchSpec) -> String {
        let n = self.suffix_counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{:x}", sanitize(&spec.name), n)
    }

    async fn launch(&self, spec: LaunchSpec) -> Result<ExecutorHandle, ExecutorError> {
        let window_name = self.window_name(&spec);
        let command = self.build_command(&spec);

        let window_id = self
            .mux
            .spawn(&window_name, &spec.cwd, &command, &spec.env)
            .await
            .map_err(|e| ExecutorError::SpawnFailed(e.to_string()))?;

        let approval = poll_for_prompt(
            &self.mux,
            &window_id,
            prompt_poll_max_attempts(),
            &PromptCheck { detect: APPROVAL_PROMPT, match_any: false, response: Some("1") },
        )
        .await
        .map_err(ExecutorError::SpawnFailed)?;
        if approval == PromptResult::Handled {
            tracing::debug!(window_id, "dismissed codex approval prompt");
        }

        if !spec.prompt.is_empty() {
            self.mux
                .send_literal(&window_id, &spec.prompt)
                .await
                .map_err(|e| ExecutorError::SpawnFailed(e.to_string()))?;
            self.mux
                .send_enter(&window_id)
                .await
                .map_err(|e| ExecutorError::SpawnFailed(e.to_string()))?;
        }

        Ok(ExecutorHandle { window_id, session_id: spec.resume_session_id })
    }
}

#[async_trait]
impl<M: MultiplexerAdapter> ExecutorAdapter for CodexExecutorAdapter<M> {
    fn name(&self) -> &'static str {
        "codex"
    }

    async fn is_available(&self) -> bool {
        super::which("codex")
    }

    fn build_command(&self, spec: &LaunchSpec) -> String {
        let mut cmd = String::from("codex");
        if let Some(session_id) = &spec.resume_session_id {
            cmd.push_str(&format!(" exec resume {session_id}"));
        } else {
            cmd.push_str(" exec");
        }
        if spec.dangerous_mode {
            cmd.push_str(" --dangerously-bypass-approvals-and-sandbox");
        }
        cmd
    }

    async fn execute(&self, spec: LaunchSpec) -> Result<ExecutorHandle, ExecutorError> {
        self.launch(spec).await
    }

    async fn resume(&self, spec: LaunchSpec) -> Result<ExecutorHandle, ExecutorError> {
        if spec.resume_session_id.is_none() {
            return Err(ExecutorError::SpawnFailed("resume requires a session id".into()));
        }
        self.launch(spec).await
    }

    async fn get_pid(&self, handle: &ExecutorHandle) -> Option<u32> {
        self.mux.get_pid(&handle.window_id).await.ok().flatten()
    }

    async fn kill(&self, handle: &ExecutorHandle) -> Result<(), ExecutorError> {
        self.mux
            .kill(&handle.window_id)
            .await
            .map_err(|e| ExecutorError::KillFailed(e.to_string()))
    }

    async fn suspend(&self, handle: &ExecutorHandle) -> Result<(), ExecutorError> {
        let pid = self
            .get_pid(handle)
            .await
            .ok_or_else(|| ExecutorError::SuspendFailed("no pid for window".into()))?;
        signal::stop(pid).await.map_err(ExecutorError::SuspendFailed)
    }

    async fn resume_process(&self, handle: &ExecutorHandle) -> Result<(), ExecutorError> {
        let pid = self
            .get_pid(handle)
            .await
            .ok_or_else(|| ExecutorError::SuspendFailed("no pid for window".into()))?;
        signal::cont(pid).await.map_err(ExecutorError::SuspendFailed)
    }

    async fn is_suspended(&self, handle: &ExecutorHandle) -> bool {
        match self.get_pid(handle).await {
            Some(pid) => signal::is_stopped(pid),
            None => false,
        }
    }
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
#[path = "codex_tests.rs"]
mod tests;
