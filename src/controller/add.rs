//! Add-task screen state.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::controller::{Notice, TaskDraft};
use crate::error::Result;
use crate::store::TaskStore;
use crate::task::{Task, UNSET_ID};

pub struct AddController {
    store: TaskStore,
    draft: TaskDraft,
    notice: Notice,
}

impl AddController {
    pub fn new(store: &TaskStore) -> Self {
        AddController {
            store: store.clone(),
            draft: TaskDraft::blank(),
            notice: Notice::default(),
        }
    }

    pub fn draft(&self) -> &TaskDraft {
        &self.draft
    }

    pub fn notice(&mut self) -> &mut Notice {
        &mut self.notice
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.draft.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.draft.description = description.into();
    }

    pub fn set_course(&mut self, course: impl Into<String>) {
        self.draft.course = course.into();
    }

    pub fn set_due_date(&mut self, due_date: DateTime<Utc>) {
        self.draft.due_date = due_date;
    }

    /// Insert the draft as a new, unfinished task and start a fresh draft.
    /// Blank fields are rejected before the store is touched.
    pub fn submit(&mut self) -> Result<Task> {
        let result = self
            .draft
            .validate()
            .and_then(|()| self.store.insert(self.draft.to_task(UNSET_ID, false)));
        match result {
            Ok(task) => {
                debug!(id = task.id, "task added");
                self.draft = TaskDraft::blank();
                self.notice.clear();
                Ok(task)
            }
            Err(e) => {
                self.notice.report(&e);
                Err(e)
            }
        }
    }
}
