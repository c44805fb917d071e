//! Task form handling for the terminal user interface.
//!
//! One form backs both the add screen and the edit dialog. It only holds raw
//! text; validation happens in the controller it is applied to.

use chrono::{DateTime, Local, Utc};

use crate::controller::{AddController, EditController, TaskDraft};
use crate::db::{due_on_at, parse_due_input};
use crate::error::{Error, Result};
use crate::task::Task;
use crate::tui::input::InputField;

/// Field order, top to bottom.
pub const TITLE_FIELD: usize = 0;
pub const DESCRIPTION_FIELD: usize = 1;
pub const COURSE_FIELD: usize = 2;
pub const DUE_FIELD: usize = 3;
pub const FIELD_COUNT: usize = 4;

pub const FIELD_LABELS: [&str; FIELD_COUNT] = ["Title *", "Description *", "Course *", "Due date"];

const DUE_INPUT_FORMAT: &str = "%Y-%m-%d";

pub struct TaskForm {
    pub title: InputField,
    pub description: InputField,
    pub course: InputField,
    pub due: InputField,
    pub current_field: usize,
    /// Instant the due field falls back to when left blank or unchanged.
    base_due: DateTime<Utc>,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskForm {
    /// Blank form, due now.
    pub fn new() -> Self {
        Self {
            title: InputField::new(),
            description: InputField::new(),
            course: InputField::new(),
            due: InputField::new(),
            current_field: TITLE_FIELD,
            base_due: Utc::now(),
        }
    }

    /// Form pre-filled from an existing row.
    pub fn from_task(task: &Task) -> Self {
        let due = task.due_date.with_timezone(&Local).format(DUE_INPUT_FORMAT).to_string();
        Self {
            title: InputField::with_value(&task.title),
            description: InputField::with_value(&task.description),
            course: InputField::with_value(&task.course),
            due: InputField::with_value(&due),
            current_field: TITLE_FIELD,
            base_due: task.due_date,
        }
    }

    pub fn field(&self, index: usize) -> &InputField {
        match index {
            TITLE_FIELD => &self.title,
            DESCRIPTION_FIELD => &self.description,
            COURSE_FIELD => &self.course,
            _ => &self.due,
        }
    }

    fn current_mut(&mut self) -> &mut InputField {
        match self.current_field {
            TITLE_FIELD => &mut self.title,
            DESCRIPTION_FIELD => &mut self.description,
            COURSE_FIELD => &mut self.course,
            _ => &mut self.due,
        }
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_COUNT;
    }

    pub fn prev_field(&mut self) {
        self.current_field = (self.current_field + FIELD_COUNT - 1) % FIELD_COUNT;
    }

    pub fn handle_char(&mut self, c: char) {
        self.current_mut().handle_char(c);
    }

    pub fn handle_backspace(&mut self) {
        self.current_mut().handle_backspace();
    }

    pub fn handle_delete(&mut self) {
        self.current_mut().handle_delete();
    }

    pub fn handle_left_right(&mut self, right: bool) {
        if right {
            self.current_mut().move_cursor_right();
        } else {
            self.current_mut().move_cursor_left();
        }
    }

    /// Resolve the due field. Blank keeps the base instant; a date keeps its
    /// time of day.
    pub fn due_date(&self) -> Result<DateTime<Utc>> {
        let text = self.due.value.trim();
        if text.is_empty() {
            return Ok(self.base_due);
        }
        let date = parse_due_input(text).ok_or_else(|| {
            Error::Validation(format!("Unrecognised due date '{text}'"))
        })?;
        let time = self.base_due.with_timezone(&Local).time();
        Ok(due_on_at(date, time))
    }

    /// Everything the controllers need, or the due-date parse error.
    pub fn to_draft(&self) -> Result<TaskDraft> {
        Ok(TaskDraft {
            title: self.title.value.clone(),
            description: self.description.value.clone(),
            course: self.course.value.clone(),
            due_date: self.due_date()?,
        })
    }

    pub fn apply_to_add(&self, add: &mut AddController) -> Result<()> {
        let draft = self.to_draft()?;
        add.set_title(draft.title);
        add.set_description(draft.description);
        add.set_course(draft.course);
        add.set_due_date(draft.due_date);
        Ok(())
    }

    pub fn apply_to_edit(&self, edit: &mut EditController) -> Result<()> {
        let draft = self.to_draft()?;
        edit.set_title(draft.title);
        edit.set_description(draft.description);
        edit.set_course(draft.course);
        edit.set_due_date(draft.due_date);
        Ok(())
    }
}
