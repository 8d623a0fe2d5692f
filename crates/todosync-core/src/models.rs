//! Data models for todosync
//!
//! Defines the task representations used on both sides of the remote store:
//! confirmed [`Task`]s as returned by the server, optimistic [`PendingTask`]s
//! awaiting confirmation, and the [`TaskId`] that tells the two apart.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of the owner whose tasks are visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub u64);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned task identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(pub u64);

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ServerId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ServerId)
    }
}

/// Locally generated placeholder identity for a task awaiting confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalToken(Uuid);

impl LocalToken {
    /// Generate a fresh token
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LocalToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LocalToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to tell pending rows apart in output
        write!(f, "~{}", &self.0.simple().to_string()[..8])
    }
}

/// Identity of a visible task
///
/// A task under creation carries a `Pending` token until the server confirms
/// it; the confirmed task then replaces the pending entry rather than
/// mutating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskId {
    Pending(LocalToken),
    Confirmed(ServerId),
}

impl TaskId {
    /// The server id, if confirmed
    pub fn confirmed(&self) -> Option<ServerId> {
        match self {
            TaskId::Confirmed(id) => Some(*id),
            TaskId::Pending(_) => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, TaskId::Pending(_))
    }
}

impl From<ServerId> for TaskId {
    fn from(id: ServerId) -> Self {
        TaskId::Confirmed(id)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::Pending(token) => write!(f, "{}", token),
            TaskId::Confirmed(id) => write!(f, "{}", id),
        }
    }
}

/// A task as stored by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Server-assigned identifier
    pub id: ServerId,
    /// Display title
    pub title: String,
    /// Completion flag
    pub completed: bool,
    /// Owner of the task
    pub user_id: OwnerId,
}

/// Payload of a create request; the server assigns the id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub completed: bool,
    pub user_id: OwnerId,
}

impl NewTask {
    /// An incomplete task with the given title
    pub fn new(title: impl Into<String>, owner: OwnerId) -> Self {
        Self {
            title: title.into(),
            completed: false,
            user_id: owner,
        }
    }
}

/// Optimistic task shown while its create request is in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTask {
    pub token: LocalToken,
    pub title: String,
    pub owner: OwnerId,
}

/// A row of the visible projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibleTask {
    #[serde(serialize_with = "serialize_task_id")]
    pub id: TaskId,
    pub title: String,
    pub completed: bool,
}

impl VisibleTask {
    pub fn is_pending(&self) -> bool {
        self.id.is_pending()
    }
}

impl From<&Task> for VisibleTask {
    fn from(task: &Task) -> Self {
        Self {
            id: TaskId::Confirmed(task.id),
            title: task.title.clone(),
            completed: task.completed,
        }
    }
}

impl From<&PendingTask> for VisibleTask {
    fn from(task: &PendingTask) -> Self {
        Self {
            id: TaskId::Pending(task.token),
            title: task.title.clone(),
            completed: false,
        }
    }
}

fn serialize_task_id<S: serde::Serializer>(id: &TaskId, serializer: S) -> Result<S::Ok, S::Error> {
    match id {
        TaskId::Confirmed(id) => serializer.serialize_u64(id.0),
        TaskId::Pending(token) => serializer.collect_str(token),
    }
}

/// Status selector for the filtered projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    /// All selectors in display order
    pub const ALL: [StatusFilter; 3] = [
        StatusFilter::All,
        StatusFilter::Active,
        StatusFilter::Completed,
    ];

    /// Whether a task with the given completion flag passes this filter
    pub fn matches(self, completed: bool) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !completed,
            StatusFilter::Completed => completed,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusFilter::All => "All",
            StatusFilter::Active => "Active",
            StatusFilter::Completed => "Completed",
        };
        f.write_str(name)
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "completed" => Ok(StatusFilter::Completed),
            other => Err(format!(
                "unknown filter '{}' (expected all, active or completed)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_wire_format() {
        let json = r#"{"id":7,"title":"Buy milk","completed":false,"userId":1870}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, ServerId(7));
        assert_eq!(task.user_id, OwnerId(1870));

        let back = serde_json::to_value(&task).unwrap();
        assert_eq!(back["userId"], 1870);
        assert!(back.get("user_id").is_none());
    }

    #[test]
    fn test_new_task_is_incomplete() {
        let task = NewTask::new("Write docs", OwnerId(1));
        assert!(!task.completed);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["userId"], 1);
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_local_tokens_are_distinct() {
        let a = LocalToken::new();
        let b = LocalToken::new();
        assert_ne!(a, b);
        assert_ne!(TaskId::Pending(a), TaskId::Pending(b));
        assert!(TaskId::Pending(a).is_pending());
        assert_eq!(TaskId::Pending(a).confirmed(), None);
        assert_eq!(TaskId::from(ServerId(3)).confirmed(), Some(ServerId(3)));
    }

    #[test]
    fn test_filter_matches() {
        assert!(StatusFilter::All.matches(true));
        assert!(StatusFilter::All.matches(false));
        assert!(StatusFilter::Active.matches(false));
        assert!(!StatusFilter::Active.matches(true));
        assert!(StatusFilter::Completed.matches(true));
        assert!(!StatusFilter::Completed.matches(false));
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!("active".parse::<StatusFilter>(), Ok(StatusFilter::Active));
        assert_eq!(" completed ".parse::<StatusFilter>(), Ok(StatusFilter::Completed));
        assert_eq!("ALL".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert!("done".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn test_visible_task_id_serialization() {
        let confirmed = VisibleTask {
            id: TaskId::Confirmed(ServerId(12)),
            title: "a".into(),
            completed: true,
        };
        assert_eq!(serde_json::to_value(&confirmed).unwrap()["id"], 12);

        let pending = VisibleTask {
            id: TaskId::Pending(LocalToken::new()),
            title: "b".into(),
            completed: false,
        };
        let id = serde_json::to_value(&pending).unwrap()["id"].clone();
        assert!(id.as_str().unwrap().starts_with('~'));
    }
}
