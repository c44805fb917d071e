//! Read-only details screen for one task.

use crate::db::format_due;
use crate::store::{Subscription, TaskStore};
use crate::task::Task;

pub struct DetailsController {
    task_id: u64,
    feed: Subscription<Option<Task>>,
    task: Option<Task>,
    date_format: String,
}

impl DetailsController {
    pub fn new(store: &TaskStore, task_id: u64, date_format: impl Into<String>) -> Self {
        let mut details = DetailsController {
            task_id,
            feed: store.get_by_id(task_id),
            task: None,
            date_format: date_format.into(),
        };
        details.sync();
        details
    }

    pub fn sync(&mut self) -> bool {
        let Some(task) = self.feed.latest() else {
            return false;
        };
        self.task = task;
        true
    }

    pub fn task_id(&self) -> u64 {
        self.task_id
    }

    /// `None` once the task has been deleted.
    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    /// Label/value pairs in display order. Empty when the task is gone.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let Some(task) = &self.task else {
            return Vec::new();
        };
        vec![
            ("Title", task.title.clone()),
            ("Description", task.description.clone()),
            ("Course", task.course.clone()),
            ("Due", format_due(task.due_date, &self.date_format)),
            ("Status", if task.is_finished { "Finished" } else { "To do" }.to_string()),
        ]
    }
}
