//! Command implementations for the CLI interface.
//!
//! Handlers drive the same screen controllers the TUI uses, so validation and
//! error reporting behave identically in both front ends. Failures print to
//! stderr and exit with status 1.

use std::fmt::Display;

use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::config::Config;
use crate::controller::{
    AddController, DetailsController, EditController, FinishedController, HomeController,
};
use crate::db::{due_on, due_on_at, format_due_relative, local_date, parse_due_input, truncate};
use crate::error::{Error, Result};
use crate::fields::{Category, CategoryMatching};
use crate::store::TaskStore;
use crate::task::Task;
use crate::tui::run::run_tui;

const DUE_HELP: &str =
    "Unrecognised due date. Use YYYY-MM-DD, 'today', 'tomorrow', 'next friday', or 'in Nd'.";

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive UI interface.
    Ui,

    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Longer description.
        #[arg(long, default_value = "")]
        desc: String,
        /// Course or category tag: bill | food | meeting | medication | anything else.
        #[arg(long, default_value = "")]
        course: String,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "next friday", or "in Nd". Defaults to now.
        #[arg(long)]
        due: Option<String>,
    },

    /// List tasks still to do.
    List {
        /// Include finished tasks.
        #[arg(long)]
        all: bool,
    },

    /// Show finished tasks grouped by category.
    Finished,

    /// View a single task.
    View {
        /// Task ID.
        id: u64,
    },

    /// Edit fields on a task. Unset flags keep their current value.
    Edit {
        /// Task ID.
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        course: Option<String>,
        #[arg(long)]
        due: Option<String>,
    },

    /// Mark a task as finished.
    Done {
        /// Task ID.
        id: u64,
    },

    /// Mark a finished task as to do again.
    Reopen {
        /// Task ID.
        id: u64,
    },

    /// Delete a task.
    Delete {
        /// Task ID.
        id: u64,
    },

    /// Show application information.
    Info,

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn fail(context: &str, err: impl Display) -> ! {
    eprintln!("{context}: {err}");
    std::process::exit(1);
}

/// Parse CLI due input into an instant at the current time of day.
pub fn parse_due(input: &str) -> Result<DateTime<Utc>> {
    parse_due_input(input)
        .map(due_on)
        .ok_or_else(|| Error::Validation(DUE_HELP.into()))
}

fn require(store: &TaskStore, id: u64) -> Result<Task> {
    store
        .get(id)
        .ok_or_else(|| Error::Validation(format!("Task {id} not found.")))
}

/// Launch the terminal user interface.
pub fn cmd_ui(config: &Config, store: &TaskStore) {
    if let Err(e) = run_tui(config, store) {
        fail("UI error", e);
    }
}

/// Add a new task.
pub fn cmd_add(store: &TaskStore, title: String, desc: String, course: String, due: Option<String>) {
    let mut add = AddController::new(store);
    add.set_title(title);
    add.set_description(desc);
    add.set_course(course);
    if let Some(due) = due {
        match parse_due(&due) {
            Ok(due) => add.set_due_date(due),
            Err(e) => fail("Invalid due date", e),
        }
    }
    match add.submit() {
        Ok(task) => println!("Added task {}", task.id),
        Err(e) => fail("Could not add task", e),
    }
}

/// List incomplete tasks, or every task with `--all`.
pub fn cmd_list(store: &TaskStore, all: bool) {
    if all {
        print_table(&store.snapshot());
        return;
    }
    let home = HomeController::new(store);
    if home.all_finished() {
        println!("All tasks finished.");
        return;
    }
    print_table(home.tasks());
}

/// Finished tasks in their five sections.
pub fn cmd_finished(config: &Config, store: &TaskStore) {
    let finished = FinishedController::new(store, config.settings.category_matching);
    if finished.groups().is_empty() {
        println!("No finished tasks.");
        return;
    }
    for (category, tasks) in finished.groups().iter() {
        println!("{} ({})", category.label(), tasks.len());
        if tasks.is_empty() {
            println!("  -");
        }
        for t in tasks {
            println!("  {:<5} {:<12} {}", t.id, truncate(&t.course, 12), t.title);
        }
    }
}

/// View detailed information about a specific task.
pub fn cmd_view(config: &Config, store: &TaskStore, id: u64) {
    let details = DetailsController::new(store, id, config.settings.date_format.as_str());
    let Some(task) = details.task() else {
        fail("Error", format!("Task {id} not found."));
    };
    let today = Local::now().date_naive();
    println!("{:<14}{}", "ID:", task.id);
    for (label, value) in details.fields() {
        if label == "Due" {
            let relative = format_due_relative(local_date(task.due_date), today);
            println!("{:<14}{value} ({relative})", format!("{label}:"));
        } else {
            println!("{:<14}{value}", format!("{label}:"));
        }
    }
    println!("{:<14}{}", "Category:", task.category(config.settings.category_matching).label());
}

/// Update an existing task's fields.
pub fn cmd_edit(
    store: &TaskStore,
    id: u64,
    title: Option<String>,
    desc: Option<String>,
    course: Option<String>,
    due: Option<String>,
) {
    let mut edit = match EditController::open(store, id) {
        Ok(edit) => edit,
        Err(e) => fail("Error", e),
    };
    if let Some(title) = title {
        edit.set_title(title);
    }
    if let Some(desc) = desc {
        edit.set_description(desc);
    }
    if let Some(course) = course {
        edit.set_course(course);
    }
    if let Some(due) = due {
        let Some(date) = parse_due_input(&due) else {
            fail("Invalid due date", DUE_HELP);
        };
        // Keep the original time of day.
        let time = edit.original().due_date.with_timezone(&Local).time();
        edit.set_due_date(due_on_at(date, time));
    }
    match edit.submit() {
        Ok(task) => println!("Updated task {}", task.id),
        Err(e) => fail("Could not update task", e),
    }
}

/// Set or clear a task's finished flag.
pub fn cmd_set_finished(store: &TaskStore, id: u64, finished: bool) {
    if let Err(e) = require(store, id) {
        fail("Error", e);
    }
    let mut home = HomeController::new(store);
    if let Err(e) = home.set_finished(id, finished) {
        fail("Could not update task", e);
    }
    if finished {
        println!("Marked {id} done.");
    } else {
        println!("Reopened {id}");
    }
}

/// Delete a task.
pub fn cmd_delete(store: &TaskStore, id: u64) {
    let task = match require(store, id) {
        Ok(task) => task,
        Err(e) => fail("Error", e),
    };
    let mut home = HomeController::new(store);
    home.open_delete(task);
    if let Err(e) = home.confirm() {
        fail("Could not delete task", e);
    }
    println!("Deleted {id}.");
}

/// Print application information.
pub fn cmd_info(config: &Config) {
    for (label, value) in info_lines(config) {
        println!("{:<14}{value}", format!("{label}:"));
    }
}

/// Label/value pairs shown by `info` and the TUI's Info tab.
pub fn info_lines(config: &Config) -> Vec<(&'static str, String)> {
    let categories = Category::TAGGED
        .iter()
        .filter_map(|c| c.tag())
        .collect::<Vec<_>>()
        .join(", ");
    let matching = match config.settings.category_matching {
        CategoryMatching::Exact => "exact",
        CategoryMatching::CaseInsensitive => "case-insensitive",
    };
    vec![
        ("Name", "Taskify".to_string()),
        ("Version", env!("CARGO_PKG_VERSION").to_string()),
        ("About", env!("CARGO_PKG_DESCRIPTION").to_string()),
        ("Database", config.db_path.display().to_string()),
        ("Categories", categories),
        ("Matching", matching.to_string()),
    ]
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

/// Print tasks as an aligned table.
pub fn print_table(tasks: &[Task]) {
    println!("{:<5} {:<5} {:<10} {:<12} {}", "ID", "Done", "Due", "Course", "Title");
    let today = Local::now().date_naive();
    for t in tasks {
        println!("{}", format_row(t, today));
    }
}

fn format_row(t: &Task, today: NaiveDate) -> String {
    format!(
        "{:<5} {:<5} {:<10} {:<12} {}",
        t.id,
        if t.is_finished { "[x]" } else { "[ ]" },
        format_due_relative(local_date(t.due_date), today),
        truncate(&t.course, 12),
        t.title
    )
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::Duration;

    use super::*;
    use crate::config::Settings;

    fn config() -> Config {
        Config {
            data_dir: PathBuf::from("/tmp/taskify"),
            db_path: PathBuf::from("/tmp/taskify/tasks.json"),
            settings: Settings::default(),
        }
    }

    #[test]
    fn test_parse_due_rejects_garbage() {
        assert!(parse_due("tomorrow").is_ok());
        assert!(matches!(parse_due("someday"), Err(Error::Validation(m)) if m == DUE_HELP));
        assert!(matches!(parse_due("in 9999999999999d"), Err(Error::Validation(m)) if m == DUE_HELP));
    }

    #[test]
    fn test_format_row() {
        let today = Local::now().date_naive();
        let mut task = Task::new("Pay rent", "monthly", "BILL", due_on(today + Duration::days(3)));
        task.id = 7;
        let row = format_row(&task, today);
        assert!(row.starts_with("7     [ ]   in 3d"));
        assert!(row.ends_with("BILL         Pay rent"));

        task.is_finished = true;
        assert!(format_row(&task, today).contains("[x]"));
    }

    #[test]
    fn test_commands_drive_the_store() {
        let store = TaskStore::in_memory();
        cmd_add(&store, "Pay rent".into(), "monthly".into(), "bill".into(), Some("today".into()));
        let task = store.get(1).unwrap();
        assert_eq!(task.course, "BILL");

        cmd_set_finished(&store, 1, true);
        assert!(store.get(1).unwrap().is_finished);
        cmd_set_finished(&store, 1, false);
        assert!(!store.get(1).unwrap().is_finished);

        cmd_edit(&store, 1, Some("Pay rent early".into()), None, None, None);
        let edited = store.get(1).unwrap();
        assert_eq!(edited.title, "Pay rent early");
        assert_eq!(edited.due_date, task.due_date);

        cmd_delete(&store, 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_require_missing_task() {
        let store = TaskStore::in_memory();
        let err = require(&store, 9).unwrap_err();
        assert_eq!(err.to_string(), "Task 9 not found.");
    }

    #[test]
    fn test_info_lines() {
        let lines = info_lines(&config());
        assert_eq!(lines[0], ("Name", "Taskify".to_string()));
        assert!(lines.iter().any(|(l, v)| *l == "Database" && v.ends_with("tasks.json")));
        assert!(lines.iter().any(|(l, v)| *l == "Categories" && v == "bill, food, meeting, medication"));
        assert!(lines.iter().any(|(l, v)| *l == "Matching" && v == "exact"));
    }
}
