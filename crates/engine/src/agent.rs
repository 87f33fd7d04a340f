//! Client for the coding-agent service used by the plan, implement and
//! review phases. The engine only needs two calls: open a session, send one
//! prompt and read the reply text.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{EngineError, Result};

const DEFAULT_PROVIDER_ID: &str = "anthropic";
const DEFAULT_MODEL_ID: &str = "claude-sonnet-4-20250514";

#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Run one prompt in the given working directory and return the agent's
    /// final reply text.
    async fn run_prompt(&self, workdir: &Path, prompt: &str) -> Result<String>;
}

pub struct HttpAgentClient {
    http: reqwest::Client,
    base_url: String,
    provider_id: String,
    model_id: String,
}

#[derive(Debug, Deserialize)]
struct SessionCreated {
    id: String,
}

#[derive(Debug, Serialize)]
struct ModelSelection<'a> {
    provider_id: &'a str,
    model_id: &'a str,
}

#[derive(Debug, Serialize)]
struct PromptRequest<'a> {
    content: &'a str,
    directory: Option<&'a str>,
    model: ModelSelection<'a>,
}

#[derive(Debug, Deserialize)]
struct PromptResponse {
    message: PromptMessage,
}

#[derive(Debug, Deserialize)]
struct PromptMessage {
    content: String,
}

impl HttpAgentClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            provider_id: DEFAULT_PROVIDER_ID.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
        }
    }

    pub fn with_model(mut self, provider_id: &str, model_id: &str) -> Self {
        self.provider_id = provider_id.to_string();
        self.model_id = model_id.to_string();
        self
    }

    async fn create_session(&self) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/session", self.base_url))
            .json(&serde_json::json!({ "title": null }))
            .send()
            .await
            .map_err(|e| EngineError::Agent(format!("failed to reach agent service: {}", e)))?;

        if !response.status().is_success() {
            return Err(EngineError::Agent(format!(
                "session create returned {}",
                response.status()
            )));
        }

        let created: SessionCreated = response
            .json()
            .await
            .map_err(|e| EngineError::Agent(format!("malformed session payload: {}", e)))?;

        Ok(created.id)
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn run_prompt(&self, workdir: &Path, prompt: &str) -> Result<String> {
        let session_id = self.create_session().await?;

        info!(
            agent_session_id = %session_id,
            directory = %workdir.display(),
            "Sending prompt to agent"
        );

        let request = PromptRequest {
            content: prompt,
            directory: workdir.to_str(),
            model: ModelSelection {
                provider_id: &self.provider_id,
                model_id: &self.model_id,
            },
        };

        let response = self
            .http
            .post(format!("{}/session/{}/message", self.base_url, session_id))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send prompt to agent");
                EngineError::Agent(format!("failed to send prompt: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(EngineError::Agent(format!(
                "prompt returned {}",
                response.status()
            )));
        }

        let reply: PromptResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Agent(format!("malformed message payload: {}", e)))?;

        Ok(reply.message.content)
    }
}
