// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local HTTP API (SPEC_FULL §6): `GET /events/stream` (SSE), `GET /events`,
//! `POST /webhooks`. The teacher's daemon has no HTTP surface at all — this
//! module is new, built with `axum`/`tower-http` per the rest of the example
//! pack (`golemcloud-golem`'s `axum` router is the shape this follows: one
//! `Router` built from `State<Arc<Daemon>>`, routes grouped by concern).

use std::convert::Infallible;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use ty_core::{EventFilter, EventKind, TaskId};

use crate::lifecycle::Daemon;
use crate::protocol::EventEntry;

pub fn router(daemon: Arc<Daemon>) -> Router {
    Router::new()
        .route("/events/stream", get(events_stream))
        .route("/events", get(events_list))
        .route("/webhooks", post(webhooks_add).get(webhooks_list))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(daemon)
}

async fn events_stream(
    State(daemon): State<Arc<Daemon>>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let mut rx = daemon.events.subscribe_sse();
    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(record) => {
                    let data = serde_json::to_string(&record).unwrap_or_default();
                    yield Ok(SseEvent::default().event(record.kind.to_string()).data(data));
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
struct EventsQuery {
    limit: Option<usize>,
    kind: Option<String>,
    task_id: Option<u64>,
    project: Option<String>,
}

async fn events_list(State(daemon): State<Arc<Daemon>>, Query(query): Query<EventsQuery>) -> impl IntoResponse {
    let kind = match query.kind.as_deref().map(EventKind::from_str) {
        Some(Ok(kind)) => Some(kind),
        Some(Err(err)) => return (axum::http::StatusCode::BAD_REQUEST, err).into_response(),
        None => None,
    };
    let filter = EventFilter {
        kind,
        task_id: query.task_id.map(TaskId),
        project: query.project,
        limit: query.limit,
        since: None,
    };
    let events: Vec<EventEntry> = daemon
        .store
        .list_events(&filter)
        .into_iter()
        .map(|record| EventEntry {
            id: record.id,
            kind: record.kind.to_string(),
            task_id: record.task_id.map(|t| t.0),
            project: record.project,
            message: record.message,
            created_at: record.created_at,
        })
        .collect();
    Json(events).into_response()
}

#[derive(Debug, Deserialize)]
struct WebhookBody {
    url: String,
}

#[derive(Debug, Serialize)]
struct WebhookResponse {
    id: u64,
    url: String,
}

async fn webhooks_add(State(daemon): State<Arc<Daemon>>, Json(body): Json<WebhookBody>) -> impl IntoResponse {
    let hook = daemon.events.register_webhook(body.url);
    Json(WebhookResponse { id: hook.id.0, url: hook.url })
}

async fn webhooks_list(State(daemon): State<Arc<Daemon>>) -> impl IntoResponse {
    let webhooks: Vec<WebhookResponse> = daemon
        .events
        .list_webhooks()
        .into_iter()
        .map(|hook| WebhookResponse { id: hook.id.0, url: hook.url })
        .collect();
    Json(webhooks)
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
