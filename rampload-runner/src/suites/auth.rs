//! Registration, login and availability checks under `/api/auth`.
use super::{get, http_client, post, SuiteContext, SuiteError};
use rampload::prelude::*;
use rand::Rng;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

pub const LOGIN_USERS: usize = 20;
pub const PASSWORD: &str = "password123";

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl RegisterRequest {
    pub fn new(username: String, email: String, first_name: &str, last_name: &str) -> Self {
        Self {
            username,
            password: PASSWORD.to_string(),
            email,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn run(ctx: &SuiteContext) -> Result<Vec<RunResult>, SuiteError> {
    let mut results = Vec::with_capacity(4);
    results.push(user_registration(ctx).await?);

    seed_login_users(ctx).await?;
    results.push(user_login(ctx).await?);

    results.push(username_availability(ctx).await?);
    results.push(email_availability(ctx).await?);
    Ok(results)
}

async fn user_registration(ctx: &SuiteContext) -> Result<RunResult, SuiteError> {
    let client = http_client()?;
    let url = ctx.url("/api/auth/register");
    let counter = Arc::new(AtomicUsize::new(0));

    let probe = move || {
        let id = counter.fetch_add(1, Ordering::Relaxed) + 1;
        let mut rng = rand::thread_rng();
        let body = RegisterRequest::new(
            format!("testuser{id}_{}", rng.gen_range(0..10_000)),
            format!("testuser{id}_{}@example.com", rng.gen_range(0..10_000)),
            "Test",
            "User",
        );
        post(client.clone(), url.clone(), body)
    };

    ctx.run_case("User Registration", LoadProfile::Medium, probe)
        .await
}

async fn user_login(ctx: &SuiteContext) -> Result<RunResult, SuiteError> {
    let client = http_client()?;
    let url = ctx.url("/api/auth/login");

    let probe = move || {
        let n = rand::thread_rng().gen_range(1..=LOGIN_USERS);
        let body = LoginRequest {
            username: format!("logintest{n}"),
            password: PASSWORD.to_string(),
        };
        post(client.clone(), url.clone(), body)
    };

    ctx.run_case("User Login", LoadProfile::Heavy, probe).await
}

async fn username_availability(ctx: &SuiteContext) -> Result<RunResult, SuiteError> {
    let client = http_client()?;
    let base = ctx.url("/api/auth/check/username");

    let probe = move || {
        let username = format!("checkuser{}", rand::thread_rng().gen_range(0..100_000));
        get(client.clone(), format!("{base}/{username}"))
    };

    ctx.run_case("Username Availability Check", LoadProfile::Light, probe)
        .await
}

async fn email_availability(ctx: &SuiteContext) -> Result<RunResult, SuiteError> {
    let client = http_client()?;
    let base = ctx.url("/api/auth/check/email");

    let probe = move || {
        let email = format!(
            "checkemail{}@example.com",
            rand::thread_rng().gen_range(0..100_000)
        );
        get(client.clone(), format!("{base}/{email}"))
    };

    ctx.run_case("Email Availability Check", LoadProfile::Light, probe)
        .await
}

/// Register `logintest1..=20`. Users that already exist, or fail to register, are skipped; the
/// login case then simply records failed logins for them.
async fn seed_login_users(ctx: &SuiteContext) -> Result<(), SuiteError> {
    let client = http_client()?;
    let url = ctx.url("/api/auth/register");

    let mut created = 0;
    for i in 1..=LOGIN_USERS {
        let body = RegisterRequest::new(
            format!("logintest{i}"),
            format!("logintest{i}@example.com"),
            "Login",
            "Test",
        );
        match client.post(&url).json(&body).send().await {
            Ok(res) if res.status().is_success() => created += 1,
            Ok(res) => debug!("Skipping login user logintest{i}: {}", res.status()),
            Err(err) => debug!("Skipping login user logintest{i}: {err}"),
        }
    }

    info!("Seeded {created}/{LOGIN_USERS} login users");
    Ok(())
}
