use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use rampload::prelude::*;
use rampload_runner::cli::{Cli, DEFAULT_LOG_FILTER};
use rampload_runner::suites;
use std::time::SystemTime;
use tracing::warn;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    FmtSubscriber::builder().with_env_filter(filter).init();

    if let Some(addr) = cli.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to install the Prometheus exporter")?;
    }

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping the current run");
                cancel.cancel();
            }
        }
    });

    println!("{}", "█".repeat(100));
    println!("🚀 BUILDTASK API PERFORMANCE TEST SUITE");
    println!(
        "📅 Started: {}",
        humantime::format_rfc3339_seconds(SystemTime::now())
    );
    println!("🌐 Target: {}", cli.base_url);
    println!("{}", "█".repeat(100));

    let ctx = cli.context(cancel);
    let report = suites::run(cli.suite, &ctx)
        .await
        .context("performance testing failed")?;

    println!("{report}");
    println!("🏁 Performance testing completed");
    Ok(())
}
