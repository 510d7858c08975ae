use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: u64,
    pub name: String,
    pub manager_id: u64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeam {
    pub name: String,
    pub manager_id: u64,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub priority_id: u64,
    pub status_id: u64,
    pub created_by_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority_id: u64,
    pub status_id: u64,
    pub created_by_id: u64,
    #[serde(default)]
    pub team_id: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Named {
    pub id: u64,
    pub name: &'static str,
}

pub const TASK_STATUSES: [Named; 4] = [
    Named { id: 1, name: "To Do" },
    Named { id: 2, name: "In Progress" },
    Named { id: 3, name: "Review" },
    Named { id: 4, name: "Done" },
];

pub const PRIORITIES: [Named; 4] = [
    Named { id: 1, name: "Low" },
    Named { id: 2, name: "Medium" },
    Named { id: 3, name: "High" },
    Named { id: 4, name: "Critical" },
];

const DEFAULT_ROLE: &str = "użytkownik";

#[derive(Debug, PartialEq, Eq)]
pub enum StoreError {
    Conflict(&'static str),
    Invalid(&'static str),
}

/// In-memory stand-in for the BuildTask database.
#[derive(Debug, Default)]
pub struct Store {
    users: Vec<User>,
    passwords: HashMap<String, String>,
    teams: Vec<Team>,
    tasks: Vec<Task>,
}

impl Store {
    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn user(&self, id: u64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn team(&self, id: u64) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn task(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn username_taken(&self, username: &str) -> bool {
        self.passwords.contains_key(username)
    }

    pub fn email_taken(&self, email: &str) -> bool {
        self.users.iter().any(|u| u.email.eq_ignore_ascii_case(email))
    }

    pub fn create_user(&mut self, new: NewUser) -> Result<User, StoreError> {
        if new.username.is_empty() || new.password.is_empty() {
            return Err(StoreError::Invalid("username and password are required"));
        }
        if self.username_taken(&new.username) {
            return Err(StoreError::Conflict("username already taken"));
        }
        if self.email_taken(&new.email) {
            return Err(StoreError::Conflict("email already registered"));
        }

        let user = User {
            id: self.users.len() as u64 + 1,
            username: new.username,
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            role: new.role.unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            is_active: new.is_active.unwrap_or(true),
        };
        self.passwords.insert(user.username.clone(), new.password);
        self.users.push(user.clone());
        Ok(user)
    }

    pub fn login(&self, username: &str, password: &str) -> Option<&User> {
        match self.passwords.get(username) {
            Some(stored) if stored == password => self.users.iter().find(|u| u.username == username),
            _ => None,
        }
    }

    pub fn create_team(&mut self, new: NewTeam) -> Result<Team, StoreError> {
        if self.user(new.manager_id).is_none() {
            return Err(StoreError::Invalid("unknown manager"));
        }

        let team = Team {
            id: self.teams.len() as u64 + 1,
            name: new.name,
            manager_id: new.manager_id,
            is_active: new.is_active.unwrap_or(true),
        };
        self.teams.push(team.clone());
        Ok(team)
    }

    pub fn create_task(&mut self, new: NewTask) -> Result<Task, StoreError> {
        if self.user(new.created_by_id).is_none() {
            return Err(StoreError::Invalid("unknown creator"));
        }
        if new.team_id.is_some_and(|id| self.team(id).is_none()) {
            return Err(StoreError::Invalid("unknown team"));
        }
        if !PRIORITIES.iter().any(|p| p.id == new.priority_id) {
            return Err(StoreError::Invalid("unknown priority"));
        }
        if !TASK_STATUSES.iter().any(|s| s.id == new.status_id) {
            return Err(StoreError::Invalid("unknown status"));
        }

        let task = Task {
            id: self.tasks.len() as u64 + 1,
            title: new.title,
            description: new.description,
            priority_id: new.priority_id,
            status_id: new.status_id,
            created_by_id: new.created_by_id,
            team_id: new.team_id,
        };
        self.tasks.push(task.clone());
        Ok(task)
    }
}
