//! Access to the remote task/user store.
//!
//! [`TaskApi`] is the seam between the board and the REST backend;
//! [`HttpApi`] talks to the real server with `reqwest`.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::error::{server_message, ApiError};
use crate::models::{decode_records, NewTask, NewUser, Task, TaskId, TaskPatch, User, UserId};

/// Operations offered by the remote store.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, ApiError>;
    async fn create_user(&self, user: &NewUser) -> Result<User, ApiError>;
    async fn delete_user(&self, id: UserId) -> Result<(), ApiError>;

    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError>;
    async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError>;
    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<Task, ApiError>;
    async fn delete_task(&self, id: TaskId) -> Result<(), ApiError>;
}

/// REST client for `/api/usuarios/` and `/api/tasks/`.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base: Url,
}

impl HttpApi {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let base = config.base_url()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("boardust/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Client)?;
        Ok(HttpApi { client, base })
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|_| ApiError::InvalidUrl(format!("{}{}", self.base, path)))
    }

    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        self.client.request(method, url.clone())
    }

    /// Sends the request and maps transport failures and error statuses.
    async fn send(&self, url: &Url, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(|e| ApiError::Network {
            url: url.to_string(),
            source: e,
        })?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: server_message(&body),
            });
        }
        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(url: &Url, response: Response) -> Result<T, ApiError> {
        let bytes = response.bytes().await.map_err(|e| ApiError::Network {
            url: url.to_string(),
            source: e,
        })?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn fetch_collection<T: DeserializeOwned>(
        &self,
        kind: &str,
        path: &str,
    ) -> Result<Vec<T>, ApiError> {
        let url = self.url(path)?;
        let response = self.send(&url, self.request(Method::GET, &url)).await?;
        let values: Vec<serde_json::Value> = Self::read_json(&url, response).await?;
        let records = decode_records(kind, values);
        debug!(kind, count = records.len(), "fetched collection");
        Ok(records)
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path)?;
        self.send(&url, self.request(Method::DELETE, &url)).await?;
        Ok(())
    }
}

#[async_trait]
impl TaskApi for HttpApi {
    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.fetch_collection("user", "usuarios/").await
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create_user(&self, user: &NewUser) -> Result<User, ApiError> {
        let url = self.url("usuarios/")?;
        let response = self
            .send(&url, self.request(Method::POST, &url).json(user))
            .await?;
        let created: User = Self::read_json(&url, response).await?;
        info!(user_id = created.id, "user created");
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: UserId) -> Result<(), ApiError> {
        self.delete(&format!("usuarios/{}/", id)).await?;
        info!(user_id = id, "user deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.fetch_collection("task", "tasks/").await
    }

    #[instrument(skip(self, task))]
    async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError> {
        let url = self.url("tasks/")?;
        let response = self
            .send(&url, self.request(Method::POST, &url).json(task))
            .await?;
        let created: Task = Self::read_json(&url, response).await?;
        info!(task_id = created.id, "task created");
        Ok(created)
    }

    #[instrument(skip(self, patch))]
    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<Task, ApiError> {
        let url = self.url(&format!("tasks/{}/", id))?;
        let response = self
            .send(&url, self.request(Method::PATCH, &url).json(patch))
            .await?;
        let updated: Task = Self::read_json(&url, response).await?;
        info!(task_id = id, status = %updated.status, "task updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete_task(&self, id: TaskId) -> Result<(), ApiError> {
        self.delete(&format!("tasks/{}/", id)).await?;
        info!(task_id = id, "task deleted");
        Ok(())
    }
}
