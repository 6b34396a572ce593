//! HTTP routes for the control surface: trigger a sweep, edit a tracked
//! item, replace the alert rules, and read the diagnostics ring buffer.

use std::sync::Arc;

use axum::{
    extract::{Path, State as AxumState},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;

use crate::models::{AlertRules, DiagnosticEntry, Item, ItemEdit};
use crate::scheduler::Scheduler;

#[derive(Debug, Serialize)]
pub struct SweepTriggerResponse {
    pub accepted: bool,
}

/// `POST /sweep/trigger` — kick off a sweep in the background.
/// `accepted=false` if one is already running; never blocks the caller
/// waiting for the sweep to finish.
pub async fn trigger_sweep(AxumState(scheduler): AxumState<Arc<Scheduler>>) -> Json<SweepTriggerResponse> {
    let accepted = !scheduler.is_sweeping();
    let scheduler = scheduler.clone();
    tokio::spawn(async move {
        let _ = scheduler.trigger_manual().await;
    });
    Json(SweepTriggerResponse { accepted })
}

/// `GET /items` — current snapshot of every tracked item.
pub async fn list_items(AxumState(scheduler): AxumState<Arc<Scheduler>>) -> Json<Vec<Item>> {
    Json(scheduler.snapshot_items())
}

/// `PATCH /items/:id` — apply a partial edit to one item's user-owned
/// fields. 404 if the item doesn't exist.
pub async fn update_item(
    AxumState(scheduler): AxumState<Arc<Scheduler>>,
    Path(item_id): Path<String>,
    Json(edit): Json<ItemEdit>,
) -> StatusCode {
    if scheduler.apply_edit(&item_id, edit) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

/// `PUT /alert-rules` — replace the global alert rule configuration.
pub async fn replace_alert_rules(
    AxumState(scheduler): AxumState<Arc<Scheduler>>,
    Json(rules): Json<AlertRules>,
) -> StatusCode {
    scheduler.replace_alert_rules(rules);
    StatusCode::OK
}

/// `GET /diagnostics` — the append-only diagnostics ring buffer, newest
/// entry first.
pub async fn get_diagnostics(AxumState(scheduler): AxumState<Arc<Scheduler>>) -> Json<Vec<DiagnosticEntry>> {
    Json(scheduler.snapshot_diagnostics())
}

pub async fn health_check() -> &'static str {
    "ok"
}
