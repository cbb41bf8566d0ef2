// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only per-task log lines.

use crate::task::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of a log line, driving how the UI's logs pane renders it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineType {
    Text,
    System,
    Tool,
    Output,
    Error,
    Question,
}

impl std::fmt::Display for LineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LineType::Text => "text",
            LineType::System => "system",
            LineType::Tool => "tool",
            LineType::Output => "output",
            LineType::Error => "error",
            LineType::Question => "question",
        };
        write!(f, "{}", s)
    }
}

/// A single append-only log line attached to a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskLog {
    pub task_id: TaskId,
    pub line_type: LineType,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "task_log_tests.rs"]
mod tests;
