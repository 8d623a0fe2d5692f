//! HTTP remote store
//!
//! Talks to a JSON todo API:
//! - `GET    {base}/todos?userId={owner}`
//! - `POST   {base}/todos`
//! - `DELETE {base}/todos/{id}`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::RemoteStore;
use crate::config::Config;
use crate::error::RemoteError;
use crate::models::{NewTask, OwnerId, ServerId, Task};

const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Remote store reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: Client,
    base_url: String,
}

impl HttpRemoteStore {
    /// Create a store for `base_url` with no client-side timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self, RemoteError> {
        Self::with_timeout(base_url, None)
    }

    /// Create a store with an optional request timeout
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, RemoteError> {
        let mut builder =
            Client::builder().user_agent(concat!("todosync/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a store from configuration
    pub fn from_config(config: &Config) -> Result<Self, RemoteError> {
        Self::with_timeout(&config.api_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn todos_url(&self) -> String {
        format!("{}/todos", self.base_url)
    }

    /// Fail on any non-success status
    fn check(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            warn!("{} returned {}", response.url(), status);
            Err(RemoteError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            })
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
        Self::check(response)?.json().await.map_err(|e| {
            if e.is_decode() {
                RemoteError::Decode(e)
            } else {
                RemoteError::Transport(e)
            }
        })
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn list(&self, owner: OwnerId) -> Result<Vec<Task>, RemoteError> {
        debug!("GET {}?userId={}", self.todos_url(), owner);
        let response = self
            .client
            .get(self.todos_url())
            .query(&[("userId", owner.0)])
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn create(&self, task: NewTask) -> Result<Task, RemoteError> {
        debug!("POST {} ({:?})", self.todos_url(), task.title);
        let response = self
            .client
            .post(self.todos_url())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .json(&task)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn delete(&self, id: ServerId) -> Result<(), RemoteError> {
        let url = format!("{}/{}", self.todos_url(), id);
        debug!("DELETE {}", url);
        let response = self.client.delete(&url).send().await?;
        Self::check(response)?;
        Ok(())
    }
}
