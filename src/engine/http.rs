//! HTTP client for the rule engine's task API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, error};

use super::{EngineError, RegisteredTask, Result, RuleEngine, TaskRegistration, TopicState};
use crate::config::EngineConfig;
use crate::domain::TaskId;

const TASKS_PATH: &str = "/kapacitor/v1/tasks";
const TOPICS_PATH: &str = "/kapacitor/v1preview/alerts/topics";

#[derive(Debug, Deserialize)]
struct TaskPage {
    #[serde(default)]
    tasks: Vec<RegisteredTask>,
}

#[derive(Debug, Deserialize)]
struct TopicPage {
    #[serde(default)]
    topics: Vec<TopicState>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Rule engine reached over HTTP.
pub struct HttpRuleEngine {
    client: Client,
    base_url: String,
    page_size: usize,
}

impl HttpRuleEngine {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            page_size: config.page_size.max(1),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response into an error, preferring the engine's
    /// own `{error}` message.
    async fn rejection(response: Response) -> EngineError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| body.chars().take(200).collect());

        error!(status = %status, message = %message, "Rule engine request failed");
        EngineError::Rejected {
            status: status.as_u16(),
            message,
        }
    }

    async fn decode<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T> {
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| EngineError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RuleEngine for HttpRuleEngine {
    async fn create_task(&self, task: &TaskRegistration) -> Result<()> {
        let response = self
            .client
            .post(self.url(TASKS_PATH))
            .json(task)
            .send()
            .await?;

        if response.status().is_success() {
            debug!(id = %task.id, "Task registered");
            Ok(())
        } else {
            Err(Self::rejection(response).await)
        }
    }

    async fn delete_task(&self, id: &TaskId) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("{TASKS_PATH}/{id}")))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                debug!(id = %id, "Task removed");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(EngineError::NotFound(id.to_string())),
            _ => Err(Self::rejection(response).await),
        }
    }

    async fn list_tasks(&self, pattern: &str) -> Result<Vec<RegisteredTask>> {
        let mut tasks = Vec::new();
        let mut offset = 0;

        loop {
            let response = self
                .client
                .get(self.url(TASKS_PATH))
                .query(&[
                    ("pattern", pattern.to_string()),
                    ("fields", "vars".to_string()),
                    ("offset", offset.to_string()),
                    ("limit", self.page_size.to_string()),
                ])
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(Self::rejection(response).await);
            }

            let page: TaskPage = Self::decode(response).await?;
            let fetched = page.tasks.len();
            tasks.extend(page.tasks);
            debug!(offset, fetched, "Fetched task page");

            if fetched < self.page_size {
                return Ok(tasks);
            }
            offset += fetched;
        }
    }

    async fn alert_topics(&self, pattern: &str) -> Result<Vec<TopicState>> {
        let response = self
            .client
            .get(self.url(TOPICS_PATH))
            .query(&[("pattern", pattern)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let page: TopicPage = Self::decode(response).await?;
        Ok(page.topics)
    }
}
