//! Finished screen: completed tasks grouped by category.

use crate::controller::{Dialog, Notice};
use crate::error::Result;
use crate::fields::{Category, CategoryMatching};
use crate::projection::{finished_groups, FinishedGroups};
use crate::store::{Snapshot, Subscription, TaskStore};
use crate::task::Task;

pub struct FinishedController {
    store: TaskStore,
    feed: Subscription<Snapshot>,
    matching: CategoryMatching,
    groups: FinishedGroups,
    dialog: Dialog,
    notice: Notice,
}

impl FinishedController {
    pub fn new(store: &TaskStore, matching: CategoryMatching) -> Self {
        let mut finished = FinishedController {
            store: store.clone(),
            feed: store.get_all(),
            matching,
            groups: FinishedGroups::default(),
            dialog: Dialog::Viewing,
            notice: Notice::default(),
        };
        finished.sync();
        finished
    }

    /// Regroup from the newest published snapshot, if any.
    pub fn sync(&mut self) -> bool {
        let Some(snapshot) = self.feed.latest() else {
            return false;
        };
        self.groups = finished_groups(&snapshot, self.matching);
        true
    }

    pub fn groups(&self) -> &FinishedGroups {
        &self.groups
    }

    pub fn section(&self, category: Category) -> &[Task] {
        self.groups.section(category)
    }

    pub fn matching(&self) -> CategoryMatching {
        self.matching
    }

    pub fn dialog(&self) -> &Dialog {
        &self.dialog
    }

    pub fn notice(&mut self) -> &mut Notice {
        &mut self.notice
    }

    pub fn open_delete(&mut self, task: Task) {
        if !self.dialog.is_open() {
            self.dialog = Dialog::Delete(task);
        }
    }

    /// Delete the task under the open dialog. On failure the dialog stays open.
    pub fn confirm(&mut self) -> Result<()> {
        let Dialog::Delete(task) = &self.dialog else {
            self.dialog = Dialog::Viewing;
            return Ok(());
        };
        match self.store.delete(task) {
            Ok(_) => {
                self.dialog = Dialog::Viewing;
                self.sync();
                Ok(())
            }
            Err(e) => {
                self.notice.report(&e);
                Err(e)
            }
        }
    }

    pub fn cancel(&mut self) {
        self.dialog = Dialog::Viewing;
    }
}
