//! Task data structure.
//!
//! A `Task` is the only persisted record. Its serialized field names mirror the
//! on-disk table columns (`task_id`, `dueDate`, `isFinished`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::{Category, CategoryMatching};

/// Id carried by a task that has not been stored yet.
pub const UNSET_ID: u64 = 0;

/// A single to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "task_id")]
    pub id: u64,
    pub title: String,
    pub description: String,
    /// Category tag and display label in one.
    pub course: String,
    #[serde(rename = "dueDate", with = "chrono::serde::ts_milliseconds")]
    pub due_date: DateTime<Utc>,
    #[serde(rename = "isFinished", default)]
    pub is_finished: bool,
}

impl Task {
    /// Build an unsaved, unfinished task. The store assigns the id on insert.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        course: impl Into<String>,
        due_date: DateTime<Utc>,
    ) -> Self {
        Task {
            id: UNSET_ID,
            title: title.into(),
            description: description.into(),
            course: course.into(),
            due_date,
            is_finished: false,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != UNSET_ID
    }

    pub fn category(&self, matching: CategoryMatching) -> Category {
        Category::of(&self.course, matching)
    }
}
