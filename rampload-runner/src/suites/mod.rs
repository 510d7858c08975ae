//! BuildTask API suites
//!
//! A suite is a list of named cases, each one a load run of a single endpoint with the load
//! profile that fits it. Suites seed whatever fixtures their cases need before running them.
use crate::cli::SuiteSelection;
use crate::report::Report;
use rampload::prelude::*;
use rand::seq::SliceRandom;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::info;

pub mod auth;
pub mod database;

/// Timeout applied to every HTTP request a suite sends.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(thiserror::Error, Debug)]
pub enum SuiteError {
    #[error(transparent)]
    Driver(#[from] rampload::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Everything a case needs to run: where the service lives and how to drive load at it.
#[derive(Clone, Debug)]
pub struct SuiteContext {
    base_url: String,
    driver: LoadDriver,
    profile: Option<LoadProfile>,
}

impl SuiteContext {
    pub fn new(base_url: impl Into<String>, driver: LoadDriver) -> Self {
        Self {
            base_url: base_url.into(),
            driver,
            profile: None,
        }
    }

    /// Run every case with `profile` instead of the one it would pick itself.
    pub fn with_profile(mut self, profile: Option<LoadProfile>) -> Self {
        self.profile = profile;
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    pub fn descriptor(&self, name: &str, profile: LoadProfile) -> RunDescriptor {
        RunDescriptor {
            name: name.to_string(),
            ..self.profile.unwrap_or(profile).descriptor()
        }
    }

    pub async fn run_case<T, F, O>(
        &self,
        name: &str,
        profile: LoadProfile,
        probe: T,
    ) -> Result<RunResult, SuiteError>
    where
        T: Fn() -> F + Send + Sync + Clone + 'static,
        F: Future<Output = O> + Send + 'static,
        O: ProbeOutput + Send + 'static,
    {
        let descriptor = self.descriptor(name, profile);
        Ok(self.driver.execute(name, &descriptor, probe).await?)
    }
}

/// Run the selected suites back to back and collect their results into a report.
pub async fn run(selection: SuiteSelection, ctx: &SuiteContext) -> Result<Report, SuiteError> {
    let start = Instant::now();
    let mut results = Vec::new();

    if selection.includes_auth() {
        info!("Running auth suite");
        results.extend(auth::run(ctx).await?);
    }

    if selection.includes_database() {
        info!("Running database suite");
        results.extend(database::run(ctx).await?);
    }

    Ok(Report::new(results, start.elapsed()))
}

/// Each case gets its own client; connections do not outlive the worker pool of the run that
/// opened them.
pub(crate) fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder().timeout(REQUEST_TIMEOUT).build()
}

pub(crate) fn pick(ids: &[u64]) -> Option<u64> {
    ids.choose(&mut rand::thread_rng()).copied()
}

pub(crate) fn missing_fixture(status: u32, reason: &str) -> InvocationOutcome {
    InvocationOutcome::failure(Duration::ZERO, status, reason)
}

#[probe]
pub(crate) async fn get(client: Client, url: String) -> Result<StatusCode, reqwest::Error> {
    let res = client.get(url).send().await?;
    let status = res.status();
    res.bytes().await?;
    Ok(status)
}

#[probe]
pub(crate) async fn post<B: Serialize + Send + Sync>(
    client: Client,
    url: String,
    body: B,
) -> Result<StatusCode, reqwest::Error> {
    let res = client.post(url).json(&body).send().await?;
    let status = res.status();
    res.bytes().await?;
    Ok(status)
}
