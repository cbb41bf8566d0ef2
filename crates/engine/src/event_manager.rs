// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event Manager (SPEC_FULL §4.B): fans a committed lifecycle event out over
//! the three channels beyond the Store's own in-process subscriber list —
//! SSE (channel 2, via a broadcast sender the HTTP layer subscribes to),
//! webhooks (channel 3, a durable registry with best-effort delivery), and
//! script hooks (channel 4, one process per matching script under
//! `<config_dir>/hooks/<event-type>`).
//!
//! Grounded on the teacher's `event_bus.rs` (the daemon's WAL-backed
//! event channel) for the broadcast-channel idiom, generalized from WAL
//! replay delivery to webhook/script fan-out, which the teacher has no
//! equivalent of.
//!
//! Emission policy (§4.B): only mutations that go through the daemon's
//! `Store` emit here. The CLI never holds a live `Store` of its own — every
//! mutating command is proxied through the daemon's IPC listener — so that
//! policy falls out of the process topology rather than needing to be
//! checked per call.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use ty_core::EventRecord;

const SCRIPT_HOOK_TIMEOUT: Duration = Duration::from_secs(30);
const WEBHOOK_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const WEBHOOK_TOTAL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebhookId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    pub id: WebhookId,
    pub url: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WebhookFile {
    next_id: u64,
    webhooks: Vec<Webhook>,
}

/// Fans out committed lifecycle events. Owns the durable webhook registry
/// and the SSE broadcast channel; script-hook directory is read fresh on
/// every dispatch so operators can add/remove hooks without a restart.
pub struct EventManager {
    hooks_dir: PathBuf,
    webhooks_path: PathBuf,
    webhooks: parking_lot::Mutex<WebhookFile>,
    sse_tx: broadcast::Sender<EventRecord>,
    http: reqwest::Client,
}

impl EventManager {
    pub fn new(hooks_dir: PathBuf, webhooks_path: PathBuf, queue_depth: usize) -> Self {
        let webhooks = load_webhooks(&webhooks_path).unwrap_or_default();
        let (sse_tx, _) = broadcast::channel(queue_depth.max(1));
        let http = reqwest::Client::builder()
            .connect_timeout(WEBHOOK_CONNECT_TIMEOUT)
            .timeout(WEBHOOK_TOTAL_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            hooks_dir,
            webhooks_path,
            webhooks: parking_lot::Mutex::new(webhooks),
            sse_tx,
            http,
        }
    }

    /// Subscribe to the SSE broadcast channel. Lag (a slow subscriber
    /// falling more than `queue_depth` events behind) surfaces as
    /// `RecvError::Lagged` on the receiver, per the bounded drop-oldest
    /// queue semantics in §5.
    pub fn subscribe_sse(&self) -> broadcast::Receiver<EventRecord> {
        self.sse_tx.subscribe()
    }

    pub fn register_webhook(&self, url: impl Into<String>) -> Webhook {
        let mut file = self.webhooks.lock();
        file.next_id += 1;
        let webhook = Webhook { id: WebhookId(file.next_id), url: url.into() };
        file.webhooks.push(webhook.clone());
        save_webhooks(&self.webhooks_path, &file).ok();
        webhook
    }

    pub fn list_webhooks(&self) -> Vec<Webhook> {
        self.webhooks.lock().webhooks.clone()
    }

    pub fn remove_webhook(&self, id: WebhookId) -> bool {
        let mut file = self.webhooks.lock();
        let before = file.webhooks.len();
        file.webhooks.retain(|w| w.id != id);
        let removed = file.webhooks.len() != before;
        if removed {
            save_webhooks(&self.webhooks_path, &file).ok();
        }
        removed
    }

    /// Dispatch `record` over SSE, webhooks, and script hooks. Call this
    /// from the Store subscriber registered at daemon startup; never called
    /// directly by CLI commands.
    pub fn dispatch(&self, record: &EventRecord) {
        // SSE: a channel with no current subscribers is not an error.
        let _ = self.sse_tx.send(record.clone());

        for webhook in self.list_webhooks() {
            let http = self.http.clone();
            let record = record.clone();
            tokio::spawn(async move {
                if let Err(err) = http.post(&webhook.url).json(&record).send().await {
                    tracing::warn!(url = %webhook.url, error = %err, "webhook delivery failed");
                }
            });
        }

        let hook_dir = self.hooks_dir.join(record.kind.to_string());
        if hook_dir.is_dir() {
            if let Ok(entries) = std::fs::read_dir(&hook_dir) {
                for entry in entries.flatten() {
                    let script = entry.path();
                    let record = record.clone();
                    tokio::spawn(async move {
                        run_script_hook(&script, &record).await;
                    });
                }
            }
        }
    }
}

async fn run_script_hook(script: &Path, record: &EventRecord) {
    let payload = match serde_json::to_string(record) {
        Ok(p) => p,
        Err(err) => {
            tracing::warn!(script = %script.display(), error = %err, "failed to encode hook payload");
            return;
        }
    };
    let mut cmd = tokio::process::Command::new(script);
    cmd.env("TY_EVENT", payload);
    match tokio::time::timeout(SCRIPT_HOOK_TIMEOUT, cmd.status()).await {
        Ok(Ok(status)) if !status.success() => {
            tracing::warn!(script = %script.display(), ?status, "script hook exited non-zero");
        }
        Ok(Err(err)) => {
            tracing::warn!(script = %script.display(), error = %err, "script hook failed to start");
        }
        Err(_) => {
            tracing::warn!(script = %script.display(), "script hook timed out");
        }
        Ok(Ok(_)) => {}
    }
}

fn load_webhooks(path: &Path) -> Option<WebhookFile> {
    let raw = std::fs::read(path).ok()?;
    serde_json::from_slice(&raw).ok()
}

fn save_webhooks(path: &Path, file: &WebhookFile) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, serde_json::to_vec_pretty(file)?)?;
    std::fs::rename(&tmp, path)
}

/// Bridge from `Store::subscribe`'s synchronous callback into the async
/// dispatch above. The callback only fires for lifecycle events (the Store
/// already filters `task.log.appended`/`project.context.set` out before
/// notifying subscribers).
pub fn wire_store_subscriber(store: &ty_storage::Store, manager: std::sync::Arc<EventManager>) {
    store.subscribe(move |record: &EventRecord| {
        manager.dispatch(record);
    });
}

#[cfg(test)]
#[path = "event_manager_tests.rs"]
mod tests;
