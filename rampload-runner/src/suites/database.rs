//! CRUD endpoints under `/database`, plus the health check.
use super::{get, http_client, missing_fixture, pick, post, SuiteContext, SuiteError};
use rampload::prelude::*;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

pub const SEED_USERS: usize = 10;
pub const SEED_TEAMS: usize = 5;
pub const SEED_TASKS: usize = 5;

const DEFAULT_ROLE: &str = "użytkownik";
const DEFAULT_PRIORITY: u64 = 1;
const DEFAULT_STATUS: u64 = 1;

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_active: bool,
}

impl NewUser {
    pub fn new(username: String, first_name: &str, last_name: &str) -> Self {
        Self {
            email: format!("{username}@example.com"),
            username,
            password: super::auth::PASSWORD.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            role: DEFAULT_ROLE.to_string(),
            is_active: true,
        }
    }
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewTeam {
    pub name: String,
    pub manager_id: u64,
    pub is_active: bool,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority_id: u64,
    pub status_id: u64,
    pub created_by_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<u64>,
}

impl NewTask {
    pub fn new(title: String, created_by_id: u64, team_id: Option<u64>) -> Self {
        Self {
            title,
            description: "Performance test task".to_string(),
            priority_id: DEFAULT_PRIORITY,
            status_id: DEFAULT_STATUS,
            created_by_id,
            team_id,
        }
    }
}

#[derive(Deserialize)]
struct Created {
    id: u64,
}

/// Ids of the entities seeded before the cases run. Empty when seeding failed.
#[derive(Clone, Debug, Default)]
pub struct Fixtures {
    pub users: Arc<Vec<u64>>,
    pub teams: Arc<Vec<u64>>,
    pub tasks: Arc<Vec<u64>>,
}

pub async fn run(ctx: &SuiteContext) -> Result<Vec<RunResult>, SuiteError> {
    let fixtures = seed(ctx).await?;

    let mut results = Vec::with_capacity(12);
    results.push(list(ctx, "Get All Users", "/database/users", LoadProfile::Heavy).await?);
    results.push(get_user_by_id(ctx, &fixtures).await?);
    results.push(create_user(ctx).await?);

    results.push(list(ctx, "Get All Teams", "/database/teams", LoadProfile::Medium).await?);
    results.push(create_team(ctx, &fixtures).await?);
    results.push(get_team_by_id(ctx, &fixtures).await?);

    results.push(list(ctx, "Get All Tasks", "/database/tasks", LoadProfile::Heavy).await?);
    results.push(create_task(ctx, &fixtures).await?);
    results.push(get_task_by_id(ctx, &fixtures).await?);

    results.push(
        list(
            ctx,
            "Get All Task Statuses",
            "/database/task-statuses",
            LoadProfile::Light,
        )
        .await?,
    );
    results.push(
        list(
            ctx,
            "Get All Priorities",
            "/database/priorities",
            LoadProfile::Light,
        )
        .await?,
    );
    results.push(list(ctx, "Health Check", "/api/health", LoadProfile::Light).await?);

    Ok(results)
}

async fn list(
    ctx: &SuiteContext,
    name: &str,
    path: &str,
    profile: LoadProfile,
) -> Result<RunResult, SuiteError> {
    let client = http_client()?;
    let url = ctx.url(path);
    ctx.run_case(name, profile, move || get(client.clone(), url.clone()))
        .await
}

async fn get_user_by_id(ctx: &SuiteContext, fixtures: &Fixtures) -> Result<RunResult, SuiteError> {
    let (client, base, ids) = (http_client()?, ctx.url("/database/users"), fixtures.users.clone());
    let probe = move || lookup(&client, &base, &ids, "No test users");
    ctx.run_case("Get User By ID", LoadProfile::Heavy, probe).await
}

async fn get_team_by_id(ctx: &SuiteContext, fixtures: &Fixtures) -> Result<RunResult, SuiteError> {
    let (client, base, ids) = (http_client()?, ctx.url("/database/teams"), fixtures.teams.clone());
    let probe = move || lookup(&client, &base, &ids, "No test teams");
    ctx.run_case("Get Team By ID", LoadProfile::Medium, probe).await
}

async fn get_task_by_id(ctx: &SuiteContext, fixtures: &Fixtures) -> Result<RunResult, SuiteError> {
    let (client, base, ids) = (http_client()?, ctx.url("/database/tasks"), fixtures.tasks.clone());
    let probe = move || lookup(&client, &base, &ids, "No test tasks");
    ctx.run_case("Get Task By ID", LoadProfile::Medium, probe).await
}

/// Fetch a random seeded entity below `base`.
fn lookup(
    client: &Client,
    base: &str,
    ids: &[u64],
    missing: &'static str,
) -> impl Future<Output = InvocationOutcome> + Send + 'static {
    let target = pick(ids).map(|id| format!("{base}/{id}"));
    let client = client.clone();
    async move {
        match target {
            Some(url) => get(client, url).await,
            None => missing_fixture(404, missing),
        }
    }
}

async fn create_user(ctx: &SuiteContext) -> Result<RunResult, SuiteError> {
    let client = http_client()?;
    let url = ctx.url("/database/users");

    let probe = move || {
        let mut rng = rand::thread_rng();
        let mut user = NewUser::new(
            format!("perfuser{}", rng.gen_range(0..100_000)),
            "Performance",
            "User",
        );
        user.email = format!("perfuser{}@example.com", rng.gen_range(0..100_000));
        post(client.clone(), url.clone(), user)
    };

    ctx.run_case("Create User", LoadProfile::Medium, probe).await
}

async fn create_team(ctx: &SuiteContext, fixtures: &Fixtures) -> Result<RunResult, SuiteError> {
    let client = http_client()?;
    let url = ctx.url("/database/teams");
    let users = fixtures.users.clone();

    let probe = move || {
        let team = pick(&users).map(|manager_id| NewTeam {
            name: format!("Performance Team {}", rand::thread_rng().gen_range(0..100_000)),
            manager_id,
            is_active: true,
        });
        let (client, url) = (client.clone(), url.clone());
        async move {
            match team {
                Some(team) => post(client, url, team).await,
                None => missing_fixture(400, "No manager available"),
            }
        }
    };

    ctx.run_case("Create Team", LoadProfile::Medium, probe).await
}

async fn create_task(ctx: &SuiteContext, fixtures: &Fixtures) -> Result<RunResult, SuiteError> {
    let client = http_client()?;
    let url = ctx.url("/database/tasks");
    let fixtures = fixtures.clone();

    let probe = move || {
        let task = pick(&fixtures.users).map(|created_by| {
            let title = format!("Performance Task {}", rand::thread_rng().gen_range(0..100_000));
            NewTask::new(title, created_by, pick(&fixtures.teams))
        });
        let (client, url) = (client.clone(), url.clone());
        async move {
            match task {
                Some(task) => post(client, url, task).await,
                None => missing_fixture(400, "No user available"),
            }
        }
    };

    ctx.run_case("Create Task", LoadProfile::Medium, probe).await
}

/// Create the users, teams and tasks the lookup and create cases refer to.
///
/// Seeding is best effort: anything that fails to be created is left out, and cases that needed
/// it record failed outcomes instead.
pub async fn seed(ctx: &SuiteContext) -> Result<Fixtures, SuiteError> {
    info!("Preparing test data");
    let client = http_client()?;

    let mut users = Vec::with_capacity(SEED_USERS);
    for i in 1..=SEED_USERS {
        let user = NewUser::new(format!("perfuser{i}"), "Test", "User");
        if let Some(id) = create(&client, &ctx.url("/database/users"), &user).await {
            users.push(id);
        }
    }

    let mut teams = Vec::with_capacity(SEED_TEAMS);
    if let Some(&manager_id) = users.first() {
        for i in 1..=SEED_TEAMS {
            let team = NewTeam {
                name: format!("Performance Team {i}"),
                manager_id,
                is_active: true,
            };
            if let Some(id) = create(&client, &ctx.url("/database/teams"), &team).await {
                teams.push(id);
            }
        }
    }

    let mut tasks = Vec::with_capacity(SEED_TASKS);
    if let Some(&created_by) = users.first() {
        for i in 1..=SEED_TASKS {
            let task = NewTask::new(
                format!("Seeded Performance Task {i}"),
                created_by,
                teams.first().copied(),
            );
            if let Some(id) = create(&client, &ctx.url("/database/tasks"), &task).await {
                tasks.push(id);
            }
        }
    }

    info!(
        "Test data prepared: {} users, {} teams, {} tasks",
        users.len(),
        teams.len(),
        tasks.len()
    );

    Ok(Fixtures {
        users: Arc::new(users),
        teams: Arc::new(teams),
        tasks: Arc::new(tasks),
    })
}

async fn create<B: Serialize>(client: &Client, url: &str, body: &B) -> Option<u64> {
    let res = match client.post(url).json(body).send().await {
        Ok(res) if res.status().is_success() => res,
        Ok(res) => {
            debug!("Seeding {url} returned {}", res.status());
            return None;
        }
        Err(err) => {
            debug!("Seeding {url} failed: {err}");
            return None;
        }
    };

    match res.json::<Created>().await {
        Ok(created) => Some(created.id),
        Err(err) => {
            debug!("Seeding {url} returned an unexpected body: {err}");
            None
        }
    }
}
