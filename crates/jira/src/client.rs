use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{JiraError, Result};
use crate::types::{Comment, Issue};

/// Thin client over the Jira Cloud REST v2 API, authenticated with an
/// account email plus API token (basic auth).
pub struct JiraClient {
    http: reqwest::Client,
    base_url: String,
    email: String,
    token: String,
}

impl JiraClient {
    pub fn new(base_url: &str, email: &str, token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            email: email.to_string(),
            token: token.to_string(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("JIRA_URL")
            .map_err(|_| JiraError::Config("JIRA_URL not set".to_string()))?;
        let email = std::env::var("JIRA_EMAIL")
            .map_err(|_| JiraError::Authentication("JIRA_EMAIL not set".to_string()))?;
        let token = std::env::var("JIRA_API_TOKEN")
            .map_err(|_| JiraError::Authentication("JIRA_API_TOKEN not set".to_string()))?;

        Ok(Self::new(&base_url, &email, &token))
    }

    pub async fn get_issue(&self, issue_key: &str) -> Result<Issue> {
        debug!(issue_key, "Fetching Jira issue");

        let url = format!("{}/rest/api/2/issue/{}", self.base_url, issue_key);
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.email, Some(&self.token))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(JiraError::IssueNotFound(issue_key.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(JiraError::Authentication(
                "Jira rejected the credentials".to_string(),
            )),
            status if !status.is_success() => {
                Err(JiraError::Api(format!("GET {} returned {}", url, status)))
            }
            _ => {
                let raw: Value = response.json().await?;
                Issue::from_api(&raw)
                    .ok_or_else(|| JiraError::Api(format!("malformed issue payload for {}", issue_key)))
            }
        }
    }

    pub async fn add_comment(&self, issue_key: &str, body: &str) -> Result<Comment> {
        info!(issue_key, "Adding Jira comment");

        let url = format!("{}/rest/api/2/issue/{}/comment", self.base_url, issue_key);
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.email, Some(&self.token))
            .json(&json!({ "body": body }))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(JiraError::IssueNotFound(issue_key.to_string())),
            status if !status.is_success() => {
                Err(JiraError::Api(format!("POST {} returned {}", url, status)))
            }
            _ => {
                let raw: Value = response.json().await?;
                Ok(Comment {
                    id: raw
                        .get("id")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    body: raw
                        .get("body")
                        .and_then(Value::as_str)
                        .unwrap_or(body)
                        .to_string(),
                    created: raw
                        .get("created")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
            }
        }
    }
}
