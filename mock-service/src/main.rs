use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:8003";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mock_service=info,tower_http=info"));
    FmtSubscriber::builder().with_env_filter(filter).init();

    let addr: SocketAddr = std::env::var("MOCK_SERVICE_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()
        .context("invalid MOCK_SERVICE_ADDR")?;
    let metrics_addr: SocketAddr = std::env::var("MOCK_SERVICE_METRICS_ADDR")
        .unwrap_or_else(|_| DEFAULT_METRICS_ADDR.to_string())
        .parse()
        .context("invalid MOCK_SERVICE_METRICS_ADDR")?;

    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .context("failed to install the Prometheus exporter")?;

    mock_service::run(addr).await?;
    Ok(())
}
