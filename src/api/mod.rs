//! HTTP surface: a thin axum router over the `Scheduler`.

pub mod routes;

use std::sync::Arc;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::scheduler::Scheduler;

/// Builds the full router. State is the `Scheduler` directly — every
/// handler only needs to read/mutate tracked-item state through it.
pub fn router(scheduler: Arc<Scheduler>) -> Router {
    Router::new()
        .route("/health", get(routes::health_check))
        .route("/items", get(routes::list_items))
        .route("/items/:id", patch(routes::update_item))
        .route("/sweep/trigger", post(routes::trigger_sweep))
        .route("/alert-rules", put(routes::replace_alert_rules))
        .route("/diagnostics", get(routes::get_diagnostics))
        .with_state(scheduler)
}
