use anyhow::Context;
use core_relay::config::CoreConfig;
use core_relay::metrics::MetricsConfig;
use core_relay::{liveness, metrics, router, transport};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = CoreConfig::from_env();
    metrics::start_metrics_server(MetricsConfig::default())
        .map_err(|e| anyhow::anyhow!(e.to_string()))
        .context("failed to install metrics recorder")?;

    let state = transport::build_state(config.clone());
    liveness::spawn(
        state.router.clone(),
        state.sessions.clone(),
        config.liveness_window,
        config.liveness_sweep_interval,
    );
    router::spawn_idle_sweep(
        state.router.clone(),
        config.transfer_idle_timeout,
        config.liveness_sweep_interval,
    );

    let app = transport::create_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %config.bind_addr, "relay coordinator listening");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
