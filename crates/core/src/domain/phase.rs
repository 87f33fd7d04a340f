use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Progress of a single pipeline phase within one session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    #[default]
    Pending,
    AwaitingApproval,
    Approved,
    Completed,
    Failed,
}

impl PhaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::AwaitingApproval => "awaiting_approval",
            Self::Approved => "approved",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "awaiting_approval" => Some(Self::AwaitingApproval),
            "approved" => Some(Self::Approved),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Configuration-time description of one pipeline step.
///
/// Specs are fixed when a pipeline is assembled; sessions copy them into
/// [`PhaseRecord`]s and never reorder or regenerate them afterwards.
#[derive(Debug, Clone)]
pub struct PhaseSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub requires_approval: bool,
    pub approval_message: Option<&'static str>,
}

impl PhaseSpec {
    pub const fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            requires_approval: false,
            approval_message: None,
        }
    }

    pub const fn gated(
        name: &'static str,
        description: &'static str,
        approval_message: &'static str,
    ) -> Self {
        Self {
            name,
            description,
            requires_approval: true,
            approval_message: Some(approval_message),
        }
    }
}

/// The standard seven-phase autofix pipeline.
///
/// Two phases are gated: the fix plan and the security review both pause
/// for a human before the pipeline moves on.
pub fn standard_pipeline() -> Vec<PhaseSpec> {
    vec![
        PhaseSpec::new("gather_context", "Gather Jira Context"),
        PhaseSpec::new("setup_repo", "Set Up Repository"),
        PhaseSpec::gated(
            "plan_fix",
            "Plan the Fix",
            "Please review the proposed fix plan before implementation.",
        ),
        PhaseSpec::new("implement_fix", "Implement the Fix"),
        PhaseSpec::gated(
            "security_review",
            "Security & Code Review",
            "Please review the security findings before creating a PR.",
        ),
        PhaseSpec::new("create_pr", "Create Pull Request"),
        PhaseSpec::new("update_jira", "Update Jira Ticket"),
    ]
}

/// One phase's record inside a session: the fixed spec fields plus
/// everything produced when the phase runs.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PhaseRecord {
    pub name: String,
    pub description: String,
    pub requires_approval: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_message: Option<String>,
    pub status: PhaseStatus,
    /// Opaque executor payload; absent until the phase has executed,
    /// written at most once.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<DateTime<Utc>>,
}

impl PhaseRecord {
    pub fn from_spec(spec: &PhaseSpec) -> Self {
        Self {
            name: spec.name.to_string(),
            description: spec.description.to_string(),
            requires_approval: spec.requires_approval,
            approval_message: spec.approval_message.map(str::to_string),
            status: PhaseStatus::default(),
            result: None,
            executed_at: None,
        }
    }

    pub fn is_executed(&self) -> bool {
        self.result.is_some()
    }
}
