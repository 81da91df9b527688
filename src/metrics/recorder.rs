//! Metrics recorder for the relay coordinator.
//!
//! Observability only: nothing in the router or registries reads these
//! values back to make relay decisions.

use metrics::{counter, describe_counter, describe_gauge, gauge};
use std::sync::atomic::{AtomicBool, Ordering};

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize metric descriptions (call once at startup).
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    describe_counter!("core_sessions_registered_total", "Total sessions registered");
    describe_counter!("core_sessions_unregistered_total", "Total sessions unregistered");
    describe_counter!("core_sessions_evicted_total", "Sessions evicted by the liveness monitor");
    describe_counter!("core_roster_broadcasts_total", "Total roster broadcasts sent");
    describe_counter!("core_chunks_relayed_total", "Total file chunks forwarded to a receiver");
    describe_counter!("core_chunks_duplicate_total", "Total duplicate chunk indices rejected");
    describe_counter!("core_transfers_created_total", "Total transfers created");
    describe_counter!("core_transfers_completed_total", "Total transfers completed");
    describe_counter!("core_transfers_cancelled_total", "Total transfers cancelled");
    describe_counter!("core_transfers_failed_total", "Total transfers failed");
    describe_counter!("core_codec_rejections_total", "Total envelopes dropped by the codec");

    describe_gauge!("core_sessions_active", "Currently registered sessions");
    describe_gauge!("core_transfers_active", "Currently active transfers");
}

pub fn record_session_registered() {
    counter!("core_sessions_registered_total").increment(1);
    gauge!("core_sessions_active").increment(1.0);
}

pub fn record_session_unregistered() {
    counter!("core_sessions_unregistered_total").increment(1);
    gauge!("core_sessions_active").decrement(1.0);
}

pub fn record_session_evicted() {
    counter!("core_sessions_evicted_total").increment(1);
}

pub fn record_roster_broadcast() {
    counter!("core_roster_broadcasts_total").increment(1);
}

pub fn record_chunk_relayed() {
    counter!("core_chunks_relayed_total").increment(1);
}

pub fn record_chunk_duplicate() {
    counter!("core_chunks_duplicate_total").increment(1);
}

pub fn record_transfer_created() {
    counter!("core_transfers_created_total").increment(1);
    gauge!("core_transfers_active").increment(1.0);
}

pub fn record_transfer_completed() {
    counter!("core_transfers_completed_total").increment(1);
    gauge!("core_transfers_active").decrement(1.0);
}

pub fn record_transfer_cancelled() {
    counter!("core_transfers_cancelled_total").increment(1);
    gauge!("core_transfers_active").decrement(1.0);
}

pub fn record_transfer_failed() {
    counter!("core_transfers_failed_total").increment(1);
    gauge!("core_transfers_active").decrement(1.0);
}

pub fn record_codec_rejection() {
    counter!("core_codec_rejections_total").increment(1);
}
