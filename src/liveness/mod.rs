//! Liveness Monitor: periodic sweep that evicts sessions with no inbound
//! traffic within the staleness window, and (via the router) cascades that
//! eviction into cancelling their outstanding transfers.

use crate::metrics;
use crate::router::Router;
use crate::session::SessionRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Spawn the background sweep task. Returns its handle so the caller can
/// abort it on shutdown.
pub fn spawn(
    router: Arc<Router>,
    sessions: Arc<SessionRegistry>,
    window: Duration,
    sweep_interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            sweep_once(&router, &sessions, window);
        }
    })
}

fn sweep_once(router: &Router, sessions: &SessionRegistry, window: Duration) {
    let stale = sessions.stale_sessions(window);
    if stale.is_empty() {
        return;
    }
    tracing::info!(count = stale.len(), "evicting stale sessions");
    for session_id in stale {
        metrics::record_session_evicted();
        router.handle_disconnect(&session_id);
    }
}
