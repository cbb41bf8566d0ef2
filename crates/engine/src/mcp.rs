// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MCP Server (SPEC_FULL §4.E): the JSON-RPC 2.0 tool surface an agent CLI
//! talks to over stdio. One server process per task, bound to that task's
//! id and project; the Executor Supervisor launches it as a configured
//! child alongside the agent (`supervisor.rs`).
//!
//! New module: the teacher has no agent-facing RPC surface of its own (its
//! agents only ever talk to tmux). The request/response dispatch here is
//! still built the way the teacher structures its own command dispatch —
//! `runtime/handlers/mod.rs`'s one-match-arm-per-command-kind shape — just
//! applied to JSON-RPC methods and MCP tool names instead of WAL event
//! variants.
//!
//! Transport (NDJSON over stdio, one request per line, mutex-serialized
//! writes) is kept out of this module so the dispatch logic is testable
//! without spawning a process; see `run_stdio` at the bottom for the thin
//! adapter.

use std::io;
use std::sync::Arc;

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use ty_core::{HasErrorKind, TaskConfig, TaskId, TaskType};
use ty_storage::{Store, StoreError, TaskFilter};

use crate::spotlight::{spotlight_sync, SpotlightAction};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "taskyou-mcp";
pub const SERVER_VERSION: &str = "1.0.0";

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

impl JsonRpcResponse {
    fn ok(id: Value, result: Value) -> Self {
        Self { jsonrpc: "2.0", id, result: Some(result), error: None }
    }

    fn err(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self { jsonrpc: "2.0", id, result: None, error: Some(JsonRpcError { code, message: message.into() }) }
    }
}

/// The 9-tool closed set exposed by `tools/list`, per SPEC_FULL §4.E.
const TOOL_NAMES: &[&str] = &[
    "complete",
    "needs_input",
    "screenshot",
    "get_project_context",
    "set_project_context",
    "create_task",
    "list_tasks",
    "show_task",
    "spotlight",
];

fn tool_definitions() -> Value {
    json!(TOOL_NAMES
        .iter()
        .map(|name| json!({ "name": name, "description": tool_description(name), "inputSchema": { "type": "object" } }))
        .collect::<Vec<_>>())
}

fn tool_description(name: &str) -> &'static str {
    match name {
        "complete" => "Mark the current task done with a summary.",
        "needs_input" => "Block the current task pending operator input.",
        "screenshot" => "Attach a screenshot or file to the current task.",
        "get_project_context" => "Read the current project's cached context.",
        "set_project_context" => "Write the current project's cached context.",
        "create_task" => "Create a new task.",
        "list_tasks" => "List tasks in the current project.",
        "show_task" => "Show a single task's detail in the current project.",
        "spotlight" => "Mirror worktree files into the main repo checkout.",
        _ => "",
    }
}

/// One MCP server instance, bound to a single task for its whole lifetime.
pub struct McpServer {
    store: Arc<Store>,
    task_id: TaskId,
    project: String,
    worktree: std::path::PathBuf,
    main_repo: std::path::PathBuf,
    /// Per-server flag: whether the project's context cache was empty at
    /// server start, surfaced so the agent can tell "first run" from
    /// "context already primed" without an extra round trip.
    context_was_empty: bool,
}

impl McpServer {
    pub fn new(
        store: Arc<Store>,
        task_id: TaskId,
        project: String,
        worktree: std::path::PathBuf,
        main_repo: std::path::PathBuf,
    ) -> Self {
        let context_was_empty = store.get_project_context(&project).is_empty();
        Self { store, task_id, project, worktree, main_repo, context_was_empty }
    }

    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.id.clone();
        // A request with no `id` is a notification: no response is sent,
        // even on error (`notifications/initialized` is the only one this
        // server expects, but the rule is general).
        let is_notification = id.is_none();
        let id = id.unwrap_or(Value::Null);

        let result = match request.method.as_str() {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION },
                "capabilities": { "tools": {} },
            })),
            "notifications/initialized" => Ok(Value::Null),
            "tools/list" => Ok(json!({ "tools": tool_definitions() })),
            "tools/call" => self.dispatch_tool(&request.params).await,
            _ => return (!is_notification).then(|| JsonRpcResponse::err(id, METHOD_NOT_FOUND, "method not found")),
        };

        if is_notification {
            return None;
        }
        Some(match result {
            Ok(value) => JsonRpcResponse::ok(id, value),
            Err(ToolError::InvalidParams(msg)) => JsonRpcResponse::err(id, INVALID_PARAMS, msg),
            Err(ToolError::Internal(msg)) => JsonRpcResponse::err(id, INTERNAL_ERROR, msg),
        })
    }

    async fn dispatch_tool(&self, params: &Value) -> Result<Value, ToolError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidParams("missing tool name".into()))?;
        let args = params.get("arguments").cloned().unwrap_or(json!({}));

        let text = match name {
            "complete" => self.tool_complete(&args)?,
            "needs_input" => self.tool_needs_input(&args)?,
            "screenshot" => self.tool_screenshot(&args)?,
            "get_project_context" => self.tool_get_project_context(),
            "set_project_context" => self.tool_set_project_context(&args)?,
            "create_task" => self.tool_create_task(&args)?,
            "list_tasks" => self.tool_list_tasks(&args)?,
            "show_task" => self.tool_show_task(&args)?,
            "spotlight" => self.tool_spotlight(&args).await?,
            other => return Err(ToolError::InvalidParams(format!("unknown tool: {other}"))),
        };
        Ok(json!({ "content": [{ "type": "text", "text": text }] }))
    }

    fn tool_complete(&self, args: &Value) -> Result<String, ToolError> {
        let summary = str_arg(args, "summary")?;
        self.store.complete_task(self.task_id, summary).map_err(store_err)?;
        Ok("task marked complete".to_string())
    }

    fn tool_needs_input(&self, args: &Value) -> Result<String, ToolError> {
        let message = str_arg(args, "message")?;
        self.store.block_task(self.task_id, message).map_err(store_err)?;
        Ok("task blocked pending input".to_string())
    }

    fn tool_screenshot(&self, args: &Value) -> Result<String, ToolError> {
        let filename = str_arg(args, "filename")?;
        let mime_type = str_arg(args, "mime_type")?;
        let data = str_arg(args, "data_base64")?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| ToolError::InvalidParams(format!("invalid base64: {e}")))?;
        let attachment = self
            .store
            .add_attachment(self.task_id, filename, mime_type, &bytes)
            .map_err(store_err)?;
        Ok(format!("attachment {} stored", attachment.id))
    }

    fn tool_get_project_context(&self) -> String {
        let context = self.store.get_project_context(&self.project);
        if self.context_was_empty && context.is_empty() {
            "(no project context set)".to_string()
        } else {
            context
        }
    }

    fn tool_set_project_context(&self, args: &Value) -> Result<String, ToolError> {
        let context = str_arg(args, "context")?;
        self.store.set_project_context(&self.project, context).map_err(store_err)?;
        Ok("project context updated".to_string())
    }

    fn tool_create_task(&self, args: &Value) -> Result<String, ToolError> {
        let title = str_arg(args, "title")?;
        let body = args.get("body").and_then(Value::as_str).unwrap_or_default().to_string();
        let kind = args
            .get("kind")
            .and_then(Value::as_str)
            .and_then(|k| k.parse::<TaskType>().ok());
        let task = self
            .store
            .create_task(TaskConfig {
                title,
                body,
                kind,
                project: self.project.clone(),
                executor: args.get("executor").and_then(Value::as_str).unwrap_or_default().to_string(),
                dangerous_mode: false,
                scheduled_at: None,
                recurrence: None,
            })
            .map_err(store_err)?;
        Ok(format!("created task {}", task.id))
    }

    /// Cross-project listing is denied: this isn't just a cache optimization
    /// but a security boundary (SPEC_FULL's Open Question decision) — an
    /// agent running inside one project's worktree shouldn't be able to
    /// enumerate another project's tasks.
    fn tool_list_tasks(&self, args: &Value) -> Result<String, ToolError> {
        if let Some(project) = args.get("project").and_then(Value::as_str) {
            if project != self.project {
                return Err(ToolError::InvalidParams("cannot list another project's tasks".into()));
            }
        }
        let tasks = self.store.list_tasks(&TaskFilter {
            project: Some(self.project.clone()),
            ..Default::default()
        });
        Ok(serde_json::to_string(&tasks).map_err(|e| ToolError::Internal(e.to_string()))?)
    }

    /// Same boundary as `list_tasks`: a task belonging to another project is
    /// reported as not found rather than "forbidden", so a probing agent
    /// can't distinguish "wrong project" from "doesn't exist".
    fn tool_show_task(&self, args: &Value) -> Result<String, ToolError> {
        let id: u64 = args
            .get("task_id")
            .and_then(Value::as_u64)
            .ok_or_else(|| ToolError::InvalidParams("missing task_id".into()))?;
        let task = self.store.get_task(TaskId(id)).map_err(store_err)?;
        if task.project != self.project {
            return Err(ToolError::InvalidParams(format!("task {id} not found")));
        }
        Ok(serde_json::to_string(&task).map_err(|e| ToolError::Internal(e.to_string()))?)
    }

    async fn tool_spotlight(&self, args: &Value) -> Result<String, ToolError> {
        let action = match args.get("action").and_then(Value::as_str).unwrap_or("status") {
            "start" => SpotlightAction::Start,
            "sync" => SpotlightAction::Sync,
            "stop" => SpotlightAction::Stop,
            "status" => SpotlightAction::Status,
            other => return Err(ToolError::InvalidParams(format!("unknown spotlight action: {other}"))),
        };
        let result = spotlight_sync(&self.worktree, &self.main_repo, action)
            .await
            .map_err(|e| ToolError::Internal(e.to_string()))?;
        Ok(format!(
            "active={} synced={} rejected={}",
            result.active, result.synced, result.rejected
        ))
    }
}

enum ToolError {
    InvalidParams(String),
    Internal(String),
}

fn str_arg(args: &Value, key: &str) -> Result<String, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ToolError::InvalidParams(format!("missing `{key}`")))
}

fn store_err(err: StoreError) -> ToolError {
    match err.kind() {
        ty_core::ErrorKind::Invalid | ty_core::ErrorKind::NotFound | ty_core::ErrorKind::Conflict => {
            ToolError::InvalidParams(err.to_string())
        }
        _ => ToolError::Internal(err.to_string()),
    }
}

/// NDJSON stdio transport: one JSON-RPC request per line in, one response
/// per line out. A single reader loop, mutex-serialized writer — there's
/// only ever one writer task here, but the lock documents the constraint
/// from §4.E for when the write side is split out for concurrent tool
/// calls.
pub async fn run_stdio(
    server: McpServer,
    input: impl tokio::io::AsyncRead + Unpin,
    mut output: impl AsyncWrite + Unpin,
) -> io::Result<()> {
    let mut lines = BufReader::new(input).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
            Ok(request) => server.handle(request).await,
            Err(_) => Some(JsonRpcResponse::err(Value::Null, PARSE_ERROR, "parse error")),
        };
        if let Some(response) = response {
            let mut encoded = serde_json::to_vec(&response)?;
            encoded.push(b'\n');
            output.write_all(&encoded).await?;
            output.flush().await?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "mcp_tests.rs"]
mod tests;
