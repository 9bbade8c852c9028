//! To-do task model.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `description` is non-empty after trimming.
//! - `date` is a day bucket serialized as `YYYY-MM-DD`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type TaskId = Uuid;

/// Fixed task categories offered by the task editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Work,
    Personal,
    Health,
    Study,
    Errand,
    #[default]
    Other,
}

impl TaskCategory {
    pub fn key(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Personal => "personal",
            Self::Health => "health",
            Self::Study => "study",
            Self::Errand => "errand",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "work" => Some(Self::Work),
            "personal" => Some(Self::Personal),
            "health" => Some(Self::Health),
            "study" => Some(Self::Study),
            "errand" => Some(Self::Errand),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyDescription,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDescription => write!(f, "task description cannot be empty"),
        }
    }
}

impl Error for TaskValidationError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToDoTask {
    pub id: TaskId,
    pub description: String,
    pub done: bool,
    pub category: TaskCategory,
    pub date: NaiveDate,
}

impl ToDoTask {
    /// Creates an open task with a generated id.
    pub fn new(
        description: impl Into<String>,
        category: TaskCategory,
        date: NaiveDate,
    ) -> Result<Self, TaskValidationError> {
        let description = normalize_description(description.into())?;
        Ok(Self {
            id: Uuid::new_v4(),
            description,
            done: false,
            category,
            date,
        })
    }
}

/// Trims a description and rejects blank input.
pub(crate) fn normalize_description(value: String) -> Result<String, TaskValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TaskValidationError::EmptyDescription);
    }
    Ok(trimmed.to_string())
}
