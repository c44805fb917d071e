//! Per-screen state holders.
//!
//! A controller owns only ephemeral state: drafts, which dialog is open, the last
//! notice, and the projection it derived from the most recent store snapshot.
//! The store stays the single source of truth. Screens call `sync` before
//! drawing to fold in whatever the store published since.
//!
//! Dialog-bearing controllers share one state machine:
//!
//! ```text
//! Viewing --open_edit(id)-----> Edit(id)
//! Viewing --open_delete(task)-> Delete(task)
//! Edit | Delete --confirm-----> Viewing   (store mutated)
//! Edit | Delete --cancel------> Viewing   (nothing written)
//! ```
//!
//! A failed confirm reports a notice and leaves the dialog open.

pub mod add;
pub mod details;
pub mod edit;
pub mod finished;
pub mod home;

pub use add::AddController;
pub use details::DetailsController;
pub use edit::EditController;
pub use finished::FinishedController;
pub use home::HomeController;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::{Error, Result};
use crate::task::Task;

/// Shown when a required draft field is blank.
pub const FILL_ALL_FIELDS: &str = "Please fill in all fields";

/// Which modal, if any, sits over a list screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Dialog {
    #[default]
    Viewing,
    Edit(u64),
    Delete(Task),
}

impl Dialog {
    pub fn is_open(&self) -> bool {
        !matches!(self, Dialog::Viewing)
    }
}

/// Transient, user-visible message. Reading it with `take` clears it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Notice(Option<String>);

impl Notice {
    pub fn report(&mut self, err: &Error) {
        warn!(error = %err, "task intent failed");
        self.0 = Some(user_message(err));
    }

    pub fn peek(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn take(&mut self) -> Option<String> {
        self.0.take()
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }
}

fn user_message(err: &Error) -> String {
    match err {
        Error::Validation(msg) => msg.clone(),
        Error::Constraint { id } => format!("Task {id} already exists"),
        other => format!("Could not save changes: {other}"),
    }
}

/// Editable copy of a task's user-facing fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub course: String,
    pub due_date: DateTime<Utc>,
}

impl TaskDraft {
    /// Empty draft due now.
    pub fn blank() -> Self {
        TaskDraft {
            title: String::new(),
            description: String::new(),
            course: String::new(),
            due_date: Utc::now(),
        }
    }

    pub fn from_task(task: &Task) -> Self {
        TaskDraft {
            title: task.title.clone(),
            description: task.description.clone(),
            course: task.course.clone(),
            due_date: task.due_date,
        }
    }

    /// Title, description and course must all be non-empty. Whitespace counts
    /// as content.
    pub fn validate(&self) -> Result<()> {
        let empty = [&self.title, &self.description, &self.course]
            .iter()
            .any(|f| f.is_empty());
        if empty {
            return Err(Error::Validation(FILL_ALL_FIELDS.into()));
        }
        Ok(())
    }

    /// Build the full row. `course` is stored uppercased for display.
    pub fn to_task(&self, id: u64, is_finished: bool) -> Task {
        Task {
            id,
            title: self.title.clone(),
            description: self.description.clone(),
            course: self.course.to_uppercase(),
            due_date: self.due_date,
            is_finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_validation() {
        let mut draft = TaskDraft::blank();
        assert!(matches!(draft.validate(), Err(Error::Validation(m)) if m == FILL_ALL_FIELDS));
        draft.title = "Pay rent".into();
        draft.description = "monthly".into();
        draft.course = String::new();
        assert!(draft.validate().is_err());
        draft.course = "bill".into();
        assert!(draft.validate().is_ok());
        draft.title = " ".into();
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_draft_uppercases_course() {
        let mut draft = TaskDraft::blank();
        draft.course = "bill".into();
        let task = draft.to_task(3, true);
        assert_eq!(task.course, "BILL");
        assert_eq!(task.id, 3);
        assert!(task.is_finished);
    }

    #[test]
    fn test_notice_take_clears() {
        let mut notice = Notice::default();
        notice.report(&Error::Validation(FILL_ALL_FIELDS.into()));
        assert_eq!(notice.peek(), Some(FILL_ALL_FIELDS));
        assert_eq!(notice.take().as_deref(), Some(FILL_ALL_FIELDS));
        assert_eq!(notice.peek(), None);
    }
}
