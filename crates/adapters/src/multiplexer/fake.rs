// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake multiplexer adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{MultiplexerAdapter, MultiplexerError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum MultiplexerCall {
    Spawn { name: String, cwd: PathBuf, cmd: String, env: Vec<(String, String)> },
    Send { id: String, input: String },
    SendLiteral { id: String, text: String },
    SendEnter { id: String },
    Kill { id: String },
    IsAlive { id: String },
    CaptureOutput { id: String, lines: u32 },
    IsProcessRunning { id: String, pattern: String },
    Configure { id: String, config: serde_json::Value },
}

#[derive(Debug, Clone)]
pub struct FakeWindow {
    pub name: String,
    pub cwd: PathBuf,
    pub cmd: String,
    pub env: Vec<(String, String)>,
    pub output: Vec<String>,
    pub alive: bool,
    pub exit_code: Option<i32>,
    pub process_running: bool,
    pub pid: Option<u32>,
}

struct State {
    windows: HashMap<String, FakeWindow>,
    calls: Vec<MultiplexerCall>,
    next_id: u64,
}

/// Fake multiplexer adapter for testing executors without spawning tmux.
#[derive(Clone)]
pub struct FakeMultiplexerAdapter {
    inner: Arc<Mutex<State>>,
}

impl Default for FakeMultiplexerAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(State {
                windows: HashMap::new(),
                calls: Vec::new(),
                next_id: 0,
            })),
        }
    }
}

impl FakeMultiplexerAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<MultiplexerCall> {
        self.inner.lock().calls.clone()
    }

    pub fn get_window(&self, id: &str) -> Option<FakeWindow> {
        self.inner.lock().windows.get(id).cloned()
    }

    pub fn set_output(&self, id: &str, output: Vec<String>) {
        if let Some(w) = self.inner.lock().windows.get_mut(id) {
            w.output = output;
        }
    }

    pub fn set_exited(&self, id: &str, exit_code: i32) {
        if let Some(w) = self.inner.lock().windows.get_mut(id) {
            w.alive = false;
            w.process_running = false;
            w.exit_code = Some(exit_code);
        }
    }

    pub fn set_process_running(&self, id: &str, running: bool) {
        if let Some(w) = self.inner.lock().windows.get_mut(id) {
            w.process_running = running;
        }
    }
}

#[async_trait]
impl MultiplexerAdapter for FakeMultiplexerAdapter {
    async fn spawn(
        &self,
        name: &str,
        cwd: &Path,
        cmd: &str,
        env: &[(String, String)],
    ) -> Result<String, MultiplexerError> {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let next_id = inner.next_id;
        let id = format!("fake-{}", next_id);
        inner.calls.push(MultiplexerCall::Spawn {
            name: name.to_string(),
            cwd: cwd.to_path_buf(),
            cmd: cmd.to_string(),
            env: env.to_vec(),
        });
        inner.windows.insert(
            id.clone(),
            FakeWindow {
                name: name.to_string(),
                cwd: cwd.to_path_buf(),
                cmd: cmd.to_string(),
                env: env.to_vec(),
                output: Vec::new(),
                alive: true,
                exit_code: None,
                process_running: true,
                pid: Some(next_id as u32 + 10_000),
            },
        );
        Ok(id)
    }

    async fn send(&self, id: &str, input: &str) -> Result<(), MultiplexerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(MultiplexerCall::Send { id: id.to_string(), input: input.to_string() });
        if !inner.windows.contains_key(id) {
            return Err(MultiplexerError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn send_literal(&self, id: &str, text: &str) -> Result<(), MultiplexerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(MultiplexerCall::SendLiteral { id: id.to_string(), text: text.to_string() });
        if !inner.windows.contains_key(id) {
            return Err(MultiplexerError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn send_enter(&self, id: &str) -> Result<(), MultiplexerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(MultiplexerCall::SendEnter { id: id.to_string() });
        if !inner.windows.contains_key(id) {
            return Err(MultiplexerError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn kill(&self, id: &str) -> Result<(), MultiplexerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(MultiplexerCall::Kill { id: id.to_string() });
        if let Some(w) = inner.windows.get_mut(id) {
            w.alive = false;
        }
        Ok(())
    }

    async fn is_alive(&self, id: &str) -> Result<bool, MultiplexerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(MultiplexerCall::IsAlive { id: id.to_string() });
        Ok(inner.windows.get(id).map(|w| w.alive).unwrap_or(false))
    }

    async fn capture_output(&self, id: &str, lines: u32) -> Result<String, MultiplexerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(MultiplexerCall::CaptureOutput { id: id.to_string(), lines });
        match inner.windows.get(id) {
            Some(w) => {
                let start = w.output.len().saturating_sub(lines as usize);
                Ok(w.output[start..].join("\n"))
            }
            None => Err(MultiplexerError::NotFound(id.to_string())),
        }
    }

    async fn is_process_running(&self, id: &str, pattern: &str) -> Result<bool, MultiplexerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(MultiplexerCall::IsProcessRunning {
            id: id.to_string(),
            pattern: pattern.to_string(),
        });
        Ok(inner.windows.get(id).map(|w| w.process_running).unwrap_or(false))
    }

    async fn get_pid(&self, id: &str) -> Result<Option<u32>, MultiplexerError> {
        Ok(self.inner.lock().windows.get(id).and_then(|w| w.pid))
    }

    async fn get_exit_code(&self, id: &str) -> Result<Option<i32>, MultiplexerError> {
        Ok(self.inner.lock().windows.get(id).and_then(|w| w.exit_code))
    }

    async fn configure(
        &self,
        id: &str,
        config: &serde_json::Value,
    ) -> Result<(), MultiplexerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(MultiplexerCall::Configure { id: id.to_string(), config: config.clone() });
        if !inner.windows.contains_key(id) {
            return Err(MultiplexerError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
