use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The slice of a Jira issue the pipeline cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub key: String,
    pub summary: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub labels: Vec<String>,
    pub components: Vec<String>,
    pub issue_type: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
}

impl Issue {
    /// Flatten the raw REST payload. Jira nests almost everything under
    /// `fields`, with names one level deeper still (`status.name` etc.).
    pub fn from_api(raw: &Value) -> Option<Self> {
        let key = raw.get("key")?.as_str()?.to_string();
        let fields = raw.get("fields").cloned().unwrap_or_default();

        Some(Self {
            key,
            summary: str_field(&fields, "summary").unwrap_or_default(),
            description: str_field(&fields, "description"),
            status: nested_name(&fields, "status"),
            priority: nested_name(&fields, "priority"),
            assignee: fields
                .get("assignee")
                .and_then(|a| a.get("displayName"))
                .and_then(Value::as_str)
                .map(str::to_string),
            labels: str_array(&fields, "labels"),
            components: fields
                .get("components")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|c| c.get("name").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            issue_type: nested_name(&fields, "issuetype"),
            created: str_field(&fields, "created"),
            updated: str_field(&fields, "updated"),
        })
    }
}

/// A comment posted to an issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub body: String,
    pub created: Option<String>,
}

fn str_field(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_string)
}

fn nested_name(fields: &Value, field: &str) -> Option<String> {
    fields
        .get(field)
        .and_then(|v| v.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn str_array(value: &Value, field: &str) -> Vec<String> {
    value
        .get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_issue_from_full_payload() {
        let raw = json!({
            "key": "SCRUM-1",
            "fields": {
                "summary": "App crashes on save",
                "description": "Steps to reproduce…",
                "status": {"name": "To Do"},
                "priority": {"name": "High"},
                "assignee": {"displayName": "Dana Byrne"},
                "labels": ["bug", "crash"],
                "components": [{"name": "editor"}, {"name": "storage"}],
                "issuetype": {"name": "Bug"},
                "created": "2026-01-10T09:00:00.000+0000",
                "updated": "2026-01-11T10:00:00.000+0000"
            }
        });

        let issue = Issue::from_api(&raw).unwrap();
        assert_eq!(issue.key, "SCRUM-1");
        assert_eq!(issue.summary, "App crashes on save");
        assert_eq!(issue.status.as_deref(), Some("To Do"));
        assert_eq!(issue.assignee.as_deref(), Some("Dana Byrne"));
        assert_eq!(issue.labels, vec!["bug", "crash"]);
        assert_eq!(issue.components, vec!["editor", "storage"]);
        assert_eq!(issue.issue_type.as_deref(), Some("Bug"));
    }

    #[test]
    fn test_issue_tolerates_missing_fields() {
        let raw = json!({"key": "SCRUM-2", "fields": {"summary": "Minimal"}});

        let issue = Issue::from_api(&raw).unwrap();
        assert_eq!(issue.key, "SCRUM-2");
        assert!(issue.description.is_none());
        assert!(issue.assignee.is_none());
        assert!(issue.labels.is_empty());
    }

    #[test]
    fn test_issue_requires_key() {
        assert!(Issue::from_api(&json!({"fields": {}})).is_none());
    }
}
