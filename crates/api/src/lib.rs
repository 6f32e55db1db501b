//! HTTP API for the order lifecycle.
//!
//! Provides REST endpoints for checkout, the status workflow, the operator
//! and purchaser queues and product statistics, a server-sent event stream
//! for operators, structured logging (tracing) and Prometheus metrics.

pub mod caller;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use domain::{LifecycleConfig, OrderLifecycle};
use metrics_exporter_prometheus::PrometheusHandle;
use notifications::SessionHub;
use order_store::Backend;
use statistics::{MonthWindow, StatisticsService};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Backend> {
    pub lifecycle: OrderLifecycle<S, SessionHub>,
    pub statistics: StatisticsService<S>,
    /// Same hub the lifecycle pushes through; the event stream registers here.
    pub hub: SessionHub,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Backend>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders/mine", get(routes::orders::list_mine::<S>))
        .route("/orders/pending", get(routes::orders::list_pending::<S>))
        .route("/orders/pending/{id}", get(routes::orders::get_pending::<S>))
        .route("/orders/statistics", get(routes::statistics::monthly::<S>))
        .route("/orders/{id}/status", put(routes::orders::change_status::<S>))
        .route("/operators/{id}/events", get(routes::operators::events::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over `store`.
pub fn create_state<S: Backend>(
    store: S,
    lifecycle: LifecycleConfig,
    window: MonthWindow,
) -> Arc<AppState<S>> {
    let hub = SessionHub::new();
    Arc::new(AppState {
        lifecycle: OrderLifecycle::with_config(store.clone(), hub.clone(), lifecycle),
        statistics: StatisticsService::with_window(store, window),
        hub,
    })
}

/// Creates application state with default lifecycle and statistics settings.
pub fn create_default_state<S: Backend>(store: S) -> Arc<AppState<S>> {
    create_state(store, LifecycleConfig::default(), MonthWindow::default())
}
