use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub type TaskId = u64;
pub type UserId = u64;

/// Priority of a task.
///
/// The server stores medium priority as `"MED"`; `"MEDIUM"` is accepted when reading.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "MED", alias = "MEDIUM")]
    Medium,
    #[serde(rename = "HIGH")]
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Wire value sent to the server.
    pub fn code(self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MED",
            Priority::High => "HIGH",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Baixa",
            Priority::Medium => "Média",
            Priority::High => "Alta",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Priority::Low),
            "MED" | "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

/// Workflow status of a task. Each status is rendered as one board column.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    #[default]
    Todo,
    Doing,
    Done,
}

impl Status {
    pub fn code(self) -> &'static str {
        match self {
            Status::Todo => "TODO",
            Status::Doing => "DOING",
            Status::Done => "DONE",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A task as returned by `/api/tasks/`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    /// Server-assigned identifier.
    pub id: TaskId,
    /// Owner of the task (foreign key to [`User`]).
    pub user: UserId,
    /// Owner name, provided read-only by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// What needs to be done.
    pub description: String,
    /// Free-text department label.
    pub sector_name: String,
    pub priority: Priority,
    pub status: Status,
    /// Creation timestamp, set by the server.
    pub created_at: DateTime<FixedOffset>,
}

impl Task {
    /// Owner label for display: the server-provided name, else the raw id.
    pub fn owner_label(&self) -> String {
        self.user_name
            .clone()
            .unwrap_or_else(|| self.user.to_string())
    }
}

/// A registered user as returned by `/api/usuarios/`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// Body of `POST /api/usuarios/`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// Body of `POST /api/tasks/`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NewTask {
    pub user: UserId,
    pub description: String,
    pub sector_name: String,
    pub priority: Priority,
    pub status: Status,
}

/// Body of `PATCH /api/tasks/{id}/`. Only the fields that are set are sent.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl TaskPatch {
    /// A patch that only changes the status, as issued after a drag between columns.
    pub fn status(status: Status) -> Self {
        TaskPatch {
            status: Some(status),
            ..TaskPatch::default()
        }
    }
}

/// Decodes a fetched collection record by record.
///
/// Records that do not decode (`null`, `{}`, unknown enum values, missing
/// fields) are dropped with a warning instead of failing the whole fetch.
pub fn decode_records<T: DeserializeOwned>(kind: &str, values: Vec<serde_json::Value>) -> Vec<T> {
    let total = values.len();
    let records: Vec<T> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(kind, index, error = %e, "dropping malformed record");
                None
            }
        })
        .collect();
    if records.len() != total {
        warn!(kind, kept = records.len(), total, "collection contained malformed records");
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task_json(id: u64, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "user": 1,
            "user_name": "Ana",
            "description": "Revisar contrato",
            "sector_name": "Jurídico",
            "priority": "MED",
            "status": status,
            "created_at": "2025-03-10T14:22:05.123456-03:00"
        })
    }

    #[test]
    fn test_priority_reads_both_medium_spellings() {
        let a: Priority = serde_json::from_value(json!("MED")).unwrap();
        let b: Priority = serde_json::from_value(json!("MEDIUM")).unwrap();
        assert_eq!(a, Priority::Medium);
        assert_eq!(b, Priority::Medium);
        assert_eq!(serde_json::to_value(Priority::Medium).unwrap(), json!("MED"));
    }

    #[test]
    fn test_priority_from_str() {
        assert_eq!("low".parse::<Priority>().unwrap(), Priority::Low);
        assert_eq!(" Medium ".parse::<Priority>().unwrap(), Priority::Medium);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_decode_records_drops_malformed() {
        let values = vec![
            task_json(1, "TODO"),
            serde_json::Value::Null,
            json!({}),
            task_json(2, "BLOCKED"),
            task_json(3, "DONE"),
        ];
        let tasks: Vec<Task> = decode_records("task", values);
        let ids: Vec<u64> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_status_patch_serializes_only_status() {
        let body = serde_json::to_value(TaskPatch::status(Status::Doing)).unwrap();
        assert_eq!(body, json!({ "status": "DOING" }));
    }

    #[test]
    fn test_owner_label_falls_back_to_id() {
        let mut task: Task = serde_json::from_value(task_json(7, "TODO")).unwrap();
        assert_eq!(task.owner_label(), "Ana");
        task.user_name = None;
        assert_eq!(task.owner_label(), "1");
    }
}
