mod utils;
use utils::*;

use rampload::prelude::*;
use reqwest::{Client, StatusCode};
use std::time::Duration;

#[probe]
async fn fetch(client: Client, url: String) -> Result<StatusCode, reqwest::Error> {
    Ok(client.get(url).send().await?.status())
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn measures_http_latency() {
    let base = mock_service().await;
    let client = Client::new();
    let url = format!("{base}/delay/ms/20");

    let descriptor = RunDescriptor::new("delay", 4, 5, Duration::from_millis(200));
    let result = LoadDriver::new()
        .think_time(Duration::from_millis(5))
        .execute("20ms delay", &descriptor, move || {
            fetch(client.clone(), url.clone())
        })
        .await
        .unwrap();

    assert_eq!(result.total(), 20);
    assert_eq!(result.successful(), 20);
    assert!(result.min() >= Duration::from_millis(20));
    assert!(result.min() <= result.p95() && result.p95() <= result.p99());
    assert!(result.p99() <= result.max());
    assert_eq!(Verdict::of(&result), Verdict::Pass);
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn error_statuses_are_failures() {
    let base = mock_service().await;
    let client = Client::new();
    let url = format!("{base}/status/503");

    let descriptor = RunDescriptor::new("unavailable", 2, 3, Duration::ZERO);
    let result = LoadDriver::new()
        .think_time(Duration::from_millis(1))
        .execute("503", &descriptor, move || fetch(client.clone(), url.clone()))
        .await
        .unwrap();

    assert_eq!(result.total(), 6);
    assert_eq!(result.successful(), 0);
    assert!(result.outcomes().iter().all(|o| o.status() == 503));
    assert_eq!(Verdict::of(&result), Verdict::Fail);
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn connection_errors_are_recorded() {
    // Nothing listens on the discard port.
    let client = Client::new();
    let url = "http://127.0.0.1:9/api/health".to_string();

    let descriptor = RunDescriptor::new("refused", 2, 2, Duration::ZERO);
    let result = LoadDriver::new()
        .think_time(Duration::from_millis(1))
        .execute("refused", &descriptor, move || {
            fetch(client.clone(), url.clone())
        })
        .await
        .unwrap();

    assert_eq!(result.total(), 4);
    assert_eq!(result.failed(), 4);
    assert!(result
        .outcomes()
        .iter()
        .all(|o| o.status() == 0 && o.error().is_some()));
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn slow_endpoint_times_out() {
    let base = mock_service().await;
    let client = Client::new();
    let url = format!("{base}/delay/ms/5000");

    let timeout = Duration::from_millis(300);
    let descriptor = RunDescriptor::new("slow", 3, 2, Duration::ZERO);
    let result = LoadDriver::new()
        .worker_timeout(timeout)
        .execute("slow", &descriptor, move || fetch(client.clone(), url.clone()))
        .await
        .unwrap();

    assert_eq!(result.total(), 3);
    assert!(result
        .outcomes()
        .iter()
        .all(|o| o.error() == Some("Timeout") && o.elapsed() == timeout));
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn rate_limited_endpoint_reports_errors() {
    let base = mock_service().await;
    let client = Client::new();
    let url = format!("{base}/max/20");

    let descriptor = RunDescriptor::new("limited", 5, 20, Duration::ZERO);
    let result = LoadDriver::new()
        .think_time(Duration::ZERO)
        .execute("limited", &descriptor, move || {
            fetch(client.clone(), url.clone())
        })
        .await
        .unwrap();

    assert_eq!(result.total(), 100);
    assert!(result.failed() > 0);
    assert!(result.successful() > 0);
    assert!(result
        .outcomes()
        .iter()
        .filter(|o| !o.is_success())
        .all(|o| o.status() == 500));
}
