// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gemini` executor: Google's Gemini CLI.
//!
//! Gemini has no session-resume flag, so `resume()` always fails with
//! `ExecutorError::Unavailable` — callers should check
//! [`super::supports_resume`] before offering retry-by-resume for this
//! variant and fall back to a fresh `execute()` instead.

use super::prompt::{poll_for_prompt, PromptCheck, PromptResult};
use super::signal;
use super::{ExecutorAdapter, ExecutorError, ExecutorHandle, LaunchSpec};
use crate::env::prompt_poll_max_attempts;
use crate::multiplexer::MultiplexerAdapter;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};

const TRUST_PROMPT: &[&str] = &["Do you trust this folder?"];

pub struct GeminiExecutorAdapter<M: MultiplexerAdapter> {
    mux: M,
    suffix_counter: AtomicU32,
}

impl<M: MultiplexerAdapter> GeminiExecutorAdapter<M> {
    pub fn new(mux: M) -> Self {
        Self { mux, suffix_counter: AtomicU32::new(0) }
    }

    fn window_name(&self, spec: &LaunchSpec) -> String {
        let n = self.suffix_counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{:x}", sanitize(&spec.name), n)
    }
}

#[async_trait]
impl<M: MultiplexerAdapter> ExecutorAdapter for GeminiExecutorAdapter<M> {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn is_available(&self) -> bool {
        super::which("gemini")
    }

    fn build_command(&self, spec: &LaunchSpec) -> String {
        let mut cmd = String::from("gemini");
        if spec.dangerous_mode {
            cmd.push_str(" --yolo");
        }
        cmd
    }

    async fn execute(&self, spec: LaunchSpec) -> Result<ExecutorHandle, ExecutorError> {
        let window_name = self.window_name(&spec);
        let command = self.build_command(&spec);

        let window_id = self
            .mux
            .spawn(&window_name, &spec.cwd, &command, &spec.env)
            .await
            .map_err(|e| ExecutorError::SpawnFailed(e.to_string()))?;

        let trust = poll_for_prompt(
            &self.mux,
            &window_id,
            prompt_poll_max_attempts(),
            &PromptCheck { detect: TRUST_PROMPT, match_any: true, response: Some("1") },
        )
        .await
        .map_err(ExecutorError::SpawnFailed)?;
        if trust == PromptResult::Handled {
            tracing::debug!(window_id, "dismissed gemini trust prompt");
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

        Ok(ExecutorHandle { window_id, session_id: None })
    }

    async fn resume(&self, _spec: LaunchSpec) -> Result<ExecutorHandle, ExecutorError> {
        Err(ExecutorError::Unavailable("gemini has no session resume support".into()))
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
#[path = "gemini_tests.rs"]
mod tests;
