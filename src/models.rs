use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub text: String,
    pub completed: bool,
    pub created_at: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Task {
    /// Builds a new task from raw input, or `None` when the trimmed text is empty.
    pub fn create(text: &str) -> Option<Task> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        let now = Utc::now();
        Some(Task {
            id: now.timestamp_millis(),
            text: trimmed.to_string(),
            completed: false,
            created_at: now.to_rfc3339(),
            tags: Vec::new(),
        })
    }
}

/// Partial update: `None` fields keep the stored value.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub completed: Option<bool>,
    pub tags: Option<Vec<String>>,
}

impl TaskPatch {
    pub fn text(value: impl Into<String>) -> Self {
        TaskPatch {
            text: Some(value.into()),
            ..TaskPatch::default()
        }
    }

    pub fn completed(value: bool) -> Self {
        TaskPatch {
            completed: Some(value),
            ..TaskPatch::default()
        }
    }

    pub fn tags(values: Vec<String>) -> Self {
        TaskPatch {
            tags: Some(values),
            ..TaskPatch::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PopupMode {
    None,
    AddTask,
    EditTask,
}
