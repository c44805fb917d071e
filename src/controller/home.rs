//! Home screen: the to-do list.

use tracing::debug;

use crate::controller::{Dialog, EditController, Notice};
use crate::error::Result;
use crate::projection::{all_finished, incomplete};
use crate::store::{Snapshot, Subscription, TaskStore};
use crate::task::Task;

/// Incomplete tasks plus the edit and delete dialogs that act on them.
pub struct HomeController {
    store: TaskStore,
    feed: Subscription<Snapshot>,
    tasks: Vec<Task>,
    all_finished: bool,
    dialog: Dialog,
    editor: Option<EditController>,
    notice: Notice,
}

impl HomeController {
    /// Subscribe and derive the first view straight away.
    pub fn new(store: &TaskStore) -> Self {
        let mut home = HomeController {
            store: store.clone(),
            feed: store.get_all(),
            tasks: Vec::new(),
            all_finished: true,
            dialog: Dialog::Viewing,
            editor: None,
            notice: Notice::default(),
        };
        home.sync();
        home
    }

    /// Fold in the newest published snapshot. Returns true if the view changed.
    pub fn sync(&mut self) -> bool {
        let Some(snapshot) = self.feed.latest() else {
            return false;
        };
        self.tasks = incomplete(&snapshot);
        self.all_finished = all_finished(&snapshot);
        true
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Render the completion state instead of the list when true.
    pub fn all_finished(&self) -> bool {
        self.all_finished
    }

    pub fn dialog(&self) -> &Dialog {
        &self.dialog
    }

    pub fn editor(&self) -> Option<&EditController> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut EditController> {
        self.editor.as_mut()
    }

    pub fn notice(&mut self) -> &mut Notice {
        &mut self.notice
    }

    /// Checkbox toggle. Rewrites the current row with the new flag.
    pub fn set_finished(&mut self, id: u64, finished: bool) -> Result<()> {
        let Some(task) = self.store.get(id) else {
            debug!(id, "toggle on missing task ignored");
            return Ok(());
        };
        let result = self.store.update(Task { is_finished: finished, ..task });
        self.settle(result.map(drop))
    }

    pub fn open_edit(&mut self, id: u64) -> Result<()> {
        if self.dialog.is_open() {
            return Ok(());
        }
        match EditController::open(&self.store, id) {
            Ok(editor) => {
                self.editor = Some(editor);
                self.dialog = Dialog::Edit(id);
                Ok(())
            }
            Err(e) => {
                self.notice.report(&e);
                Err(e)
            }
        }
    }

    pub fn open_delete(&mut self, task: Task) {
        if !self.dialog.is_open() {
            self.dialog = Dialog::Delete(task);
        }
    }

    /// Apply the open dialog. On failure the dialog stays open.
    pub fn confirm(&mut self) -> Result<()> {
        let editing = matches!(self.dialog, Dialog::Edit(_));
        let result = match &self.dialog {
            Dialog::Viewing => return Ok(()),
            Dialog::Edit(_) => match self.editor.as_mut() {
                Some(editor) => editor.submit().map(drop),
                None => Ok(()),
            },
            Dialog::Delete(task) => self.store.delete(task).map(drop),
        };
        match result {
            Ok(()) => {
                self.close();
                self.sync();
                Ok(())
            }
            // The editor has already reported into its own notice.
            Err(e) if editing => Err(e),
            Err(e) => {
                self.notice.report(&e);
                Err(e)
            }
        }
    }

    pub fn cancel(&mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.dialog = Dialog::Viewing;
        if let Some(mut editor) = self.editor.take() {
            editor.notice().clear();
        }
    }

    fn settle(&mut self, result: Result<()>) -> Result<()> {
        match result {
            Ok(()) => {
                self.sync();
                Ok(())
            }
            Err(e) => {
                self.notice.report(&e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{AddController, FinishedController, FILL_ALL_FIELDS};
    use crate::error::Error;
    use crate::fields::{Category, CategoryMatching, ConflictPolicy};
    use crate::testing::FlakyStorage;

    fn add(store: &TaskStore, title: &str, course: &str) -> Task {
        let mut add = AddController::new(store);
        add.set_title(title);
        add.set_description("monthly");
        add.set_course(course);
        add.submit().unwrap()
    }

    #[test]
    fn test_empty_store_is_all_finished() {
        let store = TaskStore::in_memory();
        let home = HomeController::new(&store);
        assert!(home.tasks().is_empty());
        assert!(home.all_finished());
    }

    #[test]
    fn test_added_task_shows_as_incomplete() {
        let store = TaskStore::in_memory();
        let mut home = HomeController::new(&store);
        let task = add(&store, "Pay rent", "BILL");
        assert!(home.sync());
        assert_eq!(home.tasks(), &[task.clone()]);
        assert!(!home.tasks()[0].is_finished);
        assert!(!home.all_finished());
    }

    #[test]
    fn test_finishing_moves_task_to_other_section() {
        let store = TaskStore::in_memory();
        let mut home = HomeController::new(&store);
        let mut finished = FinishedController::new(&store, CategoryMatching::Exact);
        let task = add(&store, "Pay rent", "bill");

        home.set_finished(task.id, true).unwrap();
        finished.sync();
        assert!(home.tasks().is_empty());
        assert!(home.all_finished());
        // Stored uppercased, so exact matching misses the "bill" section.
        assert!(finished.groups().section(Category::Bill).is_empty());
        assert_eq!(finished.groups().other[0].id, task.id);
    }

    #[test]
    fn test_both_screens_see_one_update_once() {
        let store = TaskStore::in_memory();
        let task = add(&store, "Pay rent", "bill");
        let home_feed = store.get_all();
        let finished_feed = store.get_all();
        home_feed.drain();
        finished_feed.drain();

        let mut home = HomeController::new(&store);
        home.set_finished(task.id, true).unwrap();

        let home_seen = home_feed.drain();
        let finished_seen = finished_feed.drain();
        assert_eq!(home_seen.len(), 1);
        assert_eq!(home_seen, finished_seen);
    }

    #[test]
    fn test_edit_dialog_round_trip() {
        let store = TaskStore::in_memory();
        let mut home = HomeController::new(&store);
        let task = add(&store, "Pay rent", "bill");

        home.open_edit(task.id).unwrap();
        assert_eq!(home.dialog(), &Dialog::Edit(task.id));
        home.editor_mut().unwrap().set_title("Pay rent early");
        home.confirm().unwrap();

        assert_eq!(home.dialog(), &Dialog::Viewing);
        assert!(home.editor().is_none());
        assert_eq!(home.tasks()[0].title, "Pay rent early");
    }

    #[test]
    fn test_cancel_writes_nothing() {
        let store = TaskStore::in_memory();
        let mut home = HomeController::new(&store);
        let task = add(&store, "Pay rent", "bill");

        home.open_edit(task.id).unwrap();
        home.editor_mut().unwrap().set_title("changed");
        home.cancel();
        home.open_delete(task.clone());
        home.cancel();

        assert_eq!(home.dialog(), &Dialog::Viewing);
        assert_eq!(store.get(task.id), Some(task));
    }

    #[test]
    fn test_invalid_edit_keeps_dialog_open() {
        let store = TaskStore::in_memory();
        let mut home = HomeController::new(&store);
        let task = add(&store, "Pay rent", "bill");

        home.open_edit(task.id).unwrap();
        home.editor_mut().unwrap().set_title("");
        assert!(home.confirm().is_err());
        assert_eq!(home.dialog(), &Dialog::Edit(task.id));
        assert_eq!(home.notice().peek(), None);
        assert_eq!(
            home.editor_mut().unwrap().notice().take().as_deref(),
            Some(FILL_ALL_FIELDS)
        );
    }

    #[test]
    fn test_delete_dialog() {
        let store = TaskStore::in_memory();
        let mut home = HomeController::new(&store);
        let task = add(&store, "Pay rent", "bill");
        home.sync();

        home.open_delete(task.clone());
        assert_eq!(home.dialog(), &Dialog::Delete(task.clone()));
        home.confirm().unwrap();
        assert!(home.tasks().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_failed_delete_reports_and_stays_open() {
        let (storage, fail) = FlakyStorage::new();
        let store = TaskStore::open(Box::new(storage), ConflictPolicy::Replace).unwrap();
        let mut home = HomeController::new(&store);
        let task = add(&store, "Pay rent", "bill");

        fail.set(true);
        home.open_delete(task.clone());
        assert!(matches!(home.confirm(), Err(Error::Storage(_))));
        assert!(home.dialog().is_open());
        assert!(home.notice().take().is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_open_edit_on_missing_task() {
        let store = TaskStore::in_memory();
        let mut home = HomeController::new(&store);
        assert!(home.open_edit(7).is_err());
        assert_eq!(home.dialog(), &Dialog::Viewing);
        assert!(home.notice().peek().is_some());
    }

    #[test]
    fn test_toggle_missing_task_is_noop() {
        let store = TaskStore::in_memory();
        let mut home = HomeController::new(&store);
        assert!(home.set_finished(3, true).is_ok());
        assert!(store.is_empty());
    }
}
