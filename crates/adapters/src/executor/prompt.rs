// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared interactive-prompt polling for executors whose CLIs show a
//! first-run TUI confirmation (permission bypass, workspace trust, login)
//! before they're ready to receive the task prompt.

use crate::multiplexer::MultiplexerAdapter;
use std::time::Duration;

/// One known prompt pattern and how to dismiss it.
pub struct PromptCheck<'a> {
    /// Substrings to look for in the captured pane output.
    pub detect: &'a [&'a str],
    /// If true, any one substring matching is enough; otherwise all must match.
    pub match_any: bool,
    /// Keystrokes to send when the prompt is detected. `None` means "detected
    /// but not auto-handled" (used for login prompts, which fail the spawn).
    pub response: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptResult {
    /// Prompt detected and responded to.
    Handled,
    /// Prompt detected but has no automated response.
    Detected,
    /// Never saw the prompt within the poll budget.
    NotSeen,
}

/// Poll a window's captured output up to `attempts` times, 200ms apart,
/// looking for `check`'s patterns.
pub async fn poll_for_prompt<M: MultiplexerAdapter>(
    mux: &M,
    window_id: &str,
    attempts: usize,
    check: &PromptCheck<'_>,
) -> Result<PromptResult, String> {
    for _ in 0..attempts {
        let output = mux
            .capture_output(window_id, 50)
            .await
            .map_err(|e| e.to_string())?;

        let matched = if check.match_any {
            check.detect.iter().any(|p| output.contains(p))
        } else {
            !check.detect.is_empty() && check.detect.iter().all(|p| output.contains(p))
        };

        if matched {
            if let Some(response) = check.response {
                mux.send_literal(window_id, response)
                    .await
                    .map_err(|e| e.to_string())?;
                mux.send_enter(window_id).await.map_err(|e| e.to_string())?;
                return Ok(PromptResult::Handled);
            }
            return Ok(PromptResult::Detected);
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    Ok(PromptResult::NotSeen)
}
