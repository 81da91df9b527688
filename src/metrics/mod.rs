//! Metrics and observability module.
//!
//! Prometheus-compatible counters and gauges for sessions, transfers, and
//! chunk relay activity. Purely observational — never consulted by the
//! router to make relay decisions.

pub mod exporter;
pub mod recorder;

pub use exporter::{start_metrics_server, MetricsConfig};
pub use recorder::{
    init_metrics, record_chunk_duplicate, record_chunk_relayed, record_codec_rejection,
    record_roster_broadcast, record_session_evicted, record_session_registered,
    record_session_unregistered, record_transfer_cancelled, record_transfer_completed,
    record_transfer_created, record_transfer_failed,
};
