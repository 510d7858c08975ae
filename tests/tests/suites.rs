mod utils;
use utils::*;

use rampload::prelude::*;
use rampload::DriverConfig;
use rampload_runner::cli::SuiteSelection;
use rampload_runner::suites::{self, SuiteContext};
use std::time::Duration;

fn context(base_url: &str) -> SuiteContext {
    let driver = LoadDriver::with_config(DriverConfig {
        think_time: Duration::from_millis(1),
        ..DriverConfig::default()
    });
    SuiteContext::new(base_url, driver).with_profile(Some(LoadProfile::Light))
}

#[tokio::test]
#[ntest::timeout(120_000)]
async fn auth_suite_against_mock() {
    let base = mock_service().await;
    let report = suites::run(SuiteSelection::Auth, &context(&base))
        .await
        .unwrap();

    let names: Vec<_> = report.results().iter().map(|r| r.name()).collect();
    assert_eq!(
        names,
        [
            "User Registration",
            "User Login",
            "Username Availability Check",
            "Email Availability Check",
        ]
    );
    for result in report.results() {
        assert_eq!(result.total(), 250, "{}", result.name());
    }

    // Seeded logins always succeed; random registrations may collide.
    let login = &report.results()[1];
    assert_eq!(login.success_rate(), 1.);
}

#[tokio::test]
#[ntest::timeout(120_000)]
async fn database_suite_against_mock() {
    let base = mock_service().await;
    let report = suites::run(SuiteSelection::Database, &context(&base))
        .await
        .unwrap();

    assert_eq!(report.results().len(), 12);
    let overall = report.overall();
    assert_eq!(overall.requests, 12 * 250);
    assert!(overall.success_rate > 99., "{}", report);

    let text = report.to_string();
    assert!(text.contains("Get Task By ID"));
    assert!(text.contains("Health Check"));
}

#[tokio::test]
#[ntest::timeout(120_000)]
async fn seeding_tolerates_unreachable_service() {
    // Nothing listens here, so seeding produces no fixtures.
    let ctx = context("http://127.0.0.1:9");
    let fixtures = suites::database::seed(&ctx).await.unwrap();
    assert!(fixtures.users.is_empty());
    assert!(fixtures.teams.is_empty());
    assert!(fixtures.tasks.is_empty());
}
