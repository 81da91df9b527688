//! Duplex channel host: hangs one WebSocket connection off the Router via
//! an inbound reader task and an outbound writer task that drains a
//! per-session channel.

mod websocket;

use crate::config::CoreConfig;
use crate::router::Router;
use crate::session::SessionRegistry;
use crate::transfer::TransferTable;
use axum::routing::get;
use axum::Router as AxumRouter;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
    pub sessions: Arc<SessionRegistry>,
    pub config: Arc<CoreConfig>,
}

pub fn build_state(config: CoreConfig) -> AppState {
    let config = Arc::new(config);
    let sessions = SessionRegistry::new(config.roster_settle_delay);
    let transfers = Arc::new(TransferTable::new());
    let router = Router::new(sessions.clone(), transfers, config.completion_grace_period);
    AppState { router, sessions, config }
}

pub fn create_app(state: AppState) -> AxumRouter {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    AxumRouter::new()
        .route("/ws", get(websocket::websocket_handler))
        .route("/healthz", get(healthz))
        .route("/metrics", crate::metrics::exporter::metrics_route())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}
