//! HTTP JSON interface of the experiment engine.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `GET /health` | liveness |
//! | `POST /experiments/doe` | generate a design |
//! | `POST /experiments/doe/insight` | summarize a design |
//! | `POST /experiments/optimize` | run a search |
//! | `POST /experiments/optimize/insight` | summarize a search |
//! | `GET /runs`, `POST /runs` | list or create runs |
//! | `GET /runs/{id}`, `DELETE /runs/{id}` | fetch or delete a run |
//! | `POST /runs/{id}/replay` | replay a run |

use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use vspace_engine::Experiments;

mod error;
mod handlers;

pub use error::{ApiError, ErrorBody, INSIGHT_ERROR_HEADER, PERSIST_ERROR_HEADER};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub experiments: Experiments,
    /// Page size used when `GET /runs` gives no limit.
    pub list_limit: usize,
}

impl AppState {
    pub fn new(experiments: Experiments, list_limit: usize) -> Self {
        Self {
            experiments,
            list_limit,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/experiments/doe", post(handlers::doe))
        .route("/experiments/doe/insight", post(handlers::doe_insight))
        .route("/experiments/optimize", post(handlers::optimize))
        .route("/experiments/optimize/insight", post(handlers::optimize_insight))
        .route("/runs", get(handlers::list_runs).post(handlers::create_run))
        .route("/runs/{id}", get(handlers::get_run).delete(handlers::delete_run))
        .route("/runs/{id}/replay", post(handlers::replay_run))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the router until Ctrl+C.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(address = %listener.local_addr()?, "server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await
}
