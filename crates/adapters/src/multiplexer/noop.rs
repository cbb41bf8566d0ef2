// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op multiplexer adapter for minimal/headless deployments.

use super::{MultiplexerAdapter, MultiplexerError};
use async_trait::async_trait;
use std::path::Path;

#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpMultiplexerAdapter;

impl NoOpMultiplexerAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MultiplexerAdapter for NoOpMultiplexerAdapter {
    async fn spawn(
        &self,
        _name: &str,
        _cwd: &Path,
        _cmd: &str,
        _env: &[(String, String)],
    ) -> Result<String, MultiplexerError> {
        Ok("noop".to_string())
    }

    async fn send(&self, _id: &str, _input: &str) -> Result<(), MultiplexerError> {
        Ok(())
    }

    async fn send_literal(&self, _id: &str, _text: &str) -> Result<(), MultiplexerError> {
        Ok(())
    }

    async fn send_enter(&self, _id: &str) -> Result<(), MultiplexerError> {
        Ok(())
    }

    async fn kill(&self, _id: &str) -> Result<(), MultiplexerError> {
        Ok(())
    }

    async fn is_alive(&self, _id: &str) -> Result<bool, MultiplexerError> {
        Ok(false)
    }

    async fn capture_output(&self, _id: &str, _lines: u32) -> Result<String, MultiplexerError> {
        Ok(String::new())
    }

    async fn is_process_running(
        &self,
        _id: &str,
        _pattern: &str,
    ) -> Result<bool, MultiplexerError> {
        Ok(false)
    }

    async fn get_pid(&self, _id: &str) -> Result<Option<u32>, MultiplexerError> {
        Ok(None)
    }

    async fn get_exit_code(&self, _id: &str) -> Result<Option<i32>, MultiplexerError> {
        Ok(None)
    }
}
