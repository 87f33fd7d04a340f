use thiserror::Error;

#[derive(Debug, Error)]
pub enum JiraError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Issue not found: {0}")]
    IssueNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for JiraError {
    fn from(err: reqwest::Error) -> Self {
        JiraError::Network(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, JiraError>;
