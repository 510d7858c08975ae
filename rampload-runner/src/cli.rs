use crate::suites::SuiteContext;
use clap::{Parser, ValueEnum};
use rampload::prelude::*;
use rampload::DriverConfig;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_LOG_FILTER: &str = "rampload=info,rampload_runner=info";

#[derive(Parser, Debug)]
#[command(version, about = "Load-test the BuildTask API")]
pub struct Cli {
    /// Base URL of the service under test
    #[arg(short, long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Which suite(s) to run
    #[arg(short, long, value_enum, default_value_t = SuiteSelection::All)]
    pub suite: SuiteSelection,

    /// Run every case with this load profile (light, medium, heavy, stress) instead of its own
    #[arg(short, long)]
    pub profile: Option<LoadProfile>,

    /// Pause between two invocations of the same client, e.g. `50ms`
    #[arg(long, value_parser = humantime::parse_duration, default_value = "50ms")]
    pub think_time: Duration,

    /// How long to wait for each client's results, e.g. `30s`
    #[arg(long, value_parser = humantime::parse_duration, default_value = "30s")]
    pub worker_timeout: Duration,

    /// Expose Prometheus metrics on this address
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuiteSelection {
    Auth,
    Database,
    All,
}

impl SuiteSelection {
    pub fn includes_auth(&self) -> bool {
        matches!(self, SuiteSelection::Auth | SuiteSelection::All)
    }

    pub fn includes_database(&self) -> bool {
        matches!(self, SuiteSelection::Database | SuiteSelection::All)
    }
}

impl Cli {
    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            think_time: self.think_time,
            worker_timeout: self.worker_timeout,
            ..DriverConfig::default()
        }
    }

    pub fn context(&self, cancel: CancellationToken) -> SuiteContext {
        let driver = LoadDriver::with_config(self.driver_config()).cancellation(cancel);
        SuiteContext::new(&self.base_url, driver).with_profile(self.profile)
    }
}
