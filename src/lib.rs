pub mod clock;
pub mod config;
pub mod cors;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod render;
pub mod state;
pub mod store;

use axum::{Router, routing::get};

use crate::cors::cors_layer;
use crate::handlers::{health_handler, metrics_handler, multiple_stocks_handler, single_stock_handler};
use crate::middleware::enforce_quota;
use crate::state::AppState;

// creating the router with routes, quota checked ahead of every one
pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.allowed_origins);

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/stocks/single", get(single_stock_handler))
        .route("/api/v1/stocks/multiple", get(multiple_stocks_handler))
        .layer(axum::middleware::from_fn_with_state(state.clone(), enforce_quota))
        .with_state(state);

    // outermost, so preflights are answered before the quota check
    match cors {
        Some(cors) => app.layer(cors),
        None => app,
    }
}
