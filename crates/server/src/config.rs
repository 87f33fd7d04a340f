use std::path::PathBuf;

/// Server configuration, read from the environment with sensible defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: String,
    pub agent_url: String,
    pub workspace_root: PathBuf,
    pub base_branch: String,
    pub provider_id: String,
    pub model_id: String,
    /// Sessions untouched for this long are purged by the sweeper.
    pub session_ttl_secs: u64,
}

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_DATABASE_URL: &str = "sqlite:autofix.db";
const DEFAULT_AGENT_URL: &str = "http://localhost:4096";
const DEFAULT_WORKSPACE_ROOT: &str = ".autofix/workspaces";
const DEFAULT_BASE_BRANCH: &str = "main";
const DEFAULT_PROVIDER_ID: &str = "anthropic";
const DEFAULT_MODEL_ID: &str = "claude-sonnet-4-20250514";
const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            agent_url: DEFAULT_AGENT_URL.to_string(),
            workspace_root: PathBuf::from(DEFAULT_WORKSPACE_ROOT),
            base_branch: DEFAULT_BASE_BRANCH.to_string(),
            provider_id: DEFAULT_PROVIDER_ID.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            port: env_parsed("AUTOFIX_PORT").unwrap_or(defaults.port),
            database_url: env_string("AUTOFIX_DATABASE_URL").unwrap_or(defaults.database_url),
            agent_url: env_string("AUTOFIX_AGENT_URL").unwrap_or(defaults.agent_url),
            workspace_root: env_string("AUTOFIX_WORKSPACE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.workspace_root),
            base_branch: env_string("AUTOFIX_BASE_BRANCH").unwrap_or(defaults.base_branch),
            provider_id: env_string("AUTOFIX_PROVIDER").unwrap_or(defaults.provider_id),
            model_id: env_string("AUTOFIX_MODEL").unwrap_or(defaults.model_id),
            session_ttl_secs: env_parsed("AUTOFIX_SESSION_TTL_SECS")
                .unwrap_or(defaults.session_ttl_secs),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}
