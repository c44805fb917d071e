//! Edit dialog state.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::controller::{Notice, TaskDraft};
use crate::error::{Error, Result};
use crate::store::TaskStore;
use crate::task::Task;

/// Drafts for one task. The task is copied once on open; later store changes do
/// not overwrite what the user is typing.
pub struct EditController {
    store: TaskStore,
    original: Task,
    draft: TaskDraft,
    notice: Notice,
}

impl EditController {
    pub fn open(store: &TaskStore, id: u64) -> Result<Self> {
        let original = store
            .get(id)
            .ok_or_else(|| Error::Validation(format!("Task {id} no longer exists")))?;
        Ok(EditController {
            store: store.clone(),
            draft: TaskDraft::from_task(&original),
            original,
            notice: Notice::default(),
        })
    }

    pub fn task_id(&self) -> u64 {
        self.original.id
    }

    pub fn original(&self) -> &Task {
        &self.original
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

    /// Write the draft back as a full row, carrying the original id and
    /// completion flag. The draft is kept whatever the outcome.
    pub fn submit(&mut self) -> Result<Task> {
        let result = self.try_submit();
        if let Err(e) = &result {
            self.notice.report(e);
        }
        result
    }

    fn try_submit(&self) -> Result<Task> {
        self.draft.validate()?;
        let task = self.draft.to_task(self.original.id, self.original.is_finished);
        if !self.store.update(task.clone())? {
            return Err(Error::Validation(format!("Task {} no longer exists", task.id)));
        }
        debug!(id = task.id, "edit submitted");
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::controller::FILL_ALL_FIELDS;
    use crate::fields::ConflictPolicy;
    use crate::testing::FlakyStorage;

    fn seeded() -> (TaskStore, Task) {
        let store = TaskStore::in_memory();
        let mut t = Task::new("Pay rent", "monthly", "BILL", Utc::now());
        t.is_finished = true;
        let stored = store.insert(t).unwrap();
        (store, stored)
    }

    #[test]
    fn test_open_snapshots_fields() {
        let (store, task) = seeded();
        let edit = EditController::open(&store, task.id).unwrap();
        assert_eq!(edit.draft(), &TaskDraft::from_task(&task));
        assert!(EditController::open(&store, 999).is_err());
    }

    #[test]
    fn test_submit_carries_id_and_finished_flag() {
        let (store, task) = seeded();
        let mut edit = EditController::open(&store, task.id).unwrap();
        let due = task.due_date + Duration::days(2);
        edit.set_title("Pay rent early");
        edit.set_course("bill");
        edit.set_due_date(due);

        let saved = edit.submit().unwrap();
        assert_eq!(saved.id, task.id);
        assert!(saved.is_finished);
        assert_eq!(saved.course, "BILL");
        assert_eq!(store.get(task.id).unwrap(), saved);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_drafts_ignore_later_store_changes() {
        let (store, task) = seeded();
        let mut edit = EditController::open(&store, task.id).unwrap();
        edit.set_title("mine");
        store.update(Task { title: "theirs".into(), ..task.clone() }).unwrap();
        assert_eq!(edit.draft().title, "mine");
    }

    #[test]
    fn test_blank_field_is_rejected_without_writing() {
        let (store, task) = seeded();
        let sub = store.get_all();
        sub.drain();
        let mut edit = EditController::open(&store, task.id).unwrap();
        edit.set_description("");
        assert!(matches!(edit.submit(), Err(Error::Validation(_))));
        assert_eq!(edit.notice().take().as_deref(), Some(FILL_ALL_FIELDS));
        assert!(sub.drain().is_empty());
    }

    #[test]
    fn test_deleted_task_is_reported() {
        let (store, task) = seeded();
        let mut edit = EditController::open(&store, task.id).unwrap();
        store.delete(&task).unwrap();
        assert!(edit.submit().is_err());
        assert!(store.is_empty());
        assert!(edit.notice().peek().is_some());
    }

    #[test]
    fn test_storage_failure_keeps_draft() {
        let (storage, fail) = FlakyStorage::new();
        let store = TaskStore::open(Box::new(storage), ConflictPolicy::Replace).unwrap();
        let task = store.insert(Task::new("a", "b", "c", Utc::now())).unwrap();
        let mut edit = EditController::open(&store, task.id).unwrap();
        edit.set_title("changed");

        fail.set(true);
        assert!(edit.submit().unwrap_err().is_storage());
        assert_eq!(edit.draft().title, "changed");
        assert_eq!(store.get(task.id).unwrap().title, "a");

        fail.set(false);
        assert_eq!(edit.submit().unwrap().title, "changed");
    }
}
