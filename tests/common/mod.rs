#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use boardust::api::TaskApi;
use boardust::error::ApiError;
use boardust::models::{NewTask, NewUser, Priority, Status, Task, TaskId, TaskPatch, User, UserId};

pub fn timestamp() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2025-03-10T09:30:00-03:00").unwrap()
}

pub fn task(id: TaskId, status: Status) -> Task {
    Task {
        id,
        user: 1,
        user_name: Some("Ana".into()),
        description: format!("Tarefa {}", id),
        sector_name: "TI".into(),
        priority: Priority::Medium,
        status,
        created_at: timestamp(),
    }
}

/// In-memory stand-in for the REST backend.
#[derive(Default)]
pub struct MemoryApi {
    pub users: Mutex<Vec<User>>,
    pub tasks: Mutex<Vec<Task>>,
    pub patches: Mutex<Vec<(TaskId, TaskPatch)>>,
    pub fail_updates: Mutex<bool>,
    next_id: Mutex<u64>,
}

impl MemoryApi {
    pub fn new() -> Self {
        MemoryApi {
            next_id: Mutex::new(100),
            ..MemoryApi::default()
        }
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let api = MemoryApi::new();
        *api.tasks.lock().unwrap() = tasks;
        api
    }

    pub fn failing_updates(self) -> Self {
        *self.fail_updates.lock().unwrap() = true;
        self
    }

    pub fn task(&self, id: TaskId) -> Option<Task> {
        self.tasks.lock().unwrap().iter().find(|t| t.id == id).cloned()
    }

    pub fn patches(&self) -> Vec<(TaskId, TaskPatch)> {
        self.patches.lock().unwrap().clone()
    }

    fn next_id(&self) -> u64 {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        *next
    }

    fn not_found() -> ApiError {
        ApiError::Server {
            status: 404,
            message: "Not found.".into(),
        }
    }
}

#[async_trait]
impl TaskApi for MemoryApi {
    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, ApiError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(ApiError::Server {
                status: 400,
                message: "email: user with this E-mail already exists.".into(),
            });
        }
        let created = User {
            id: self.next_id(),
            name: user.name.clone(),
            email: user.email.clone(),
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn delete_user(&self, id: UserId) -> Result<(), ApiError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(Self::not_found());
        }
        self.tasks.lock().unwrap().retain(|t| t.user != id);
        Ok(())
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError> {
        let user_name = self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == task.user)
            .map(|u| u.name.clone());
        let created = Task {
            id: self.next_id(),
            user: task.user,
            user_name,
            description: task.description.clone(),
            sector_name: task.sector_name.clone(),
            priority: task.priority,
            status: task.status,
            created_at: timestamp(),
        };
        self.tasks.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<Task, ApiError> {
        self.patches.lock().unwrap().push((id, patch.clone()));
        if *self.fail_updates.lock().unwrap() {
            return Err(ApiError::Server {
                status: 500,
                message: "Erro desconhecido.".into(),
            });
        }
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks.iter_mut().find(|t| t.id == id).ok_or_else(Self::not_found)?;
        if let Some(user) = patch.user {
            task.user = user;
        }
        if let Some(description) = &patch.description {
            task.description = description.clone();
        }
        if let Some(sector) = &patch.sector_name {
            task.sector_name = sector.clone();
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        Ok(task.clone())
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), ApiError> {
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(Self::not_found());
        }
        Ok(())
    }
}
