//! # Taskify
//!
//! A local-first to-do list. Tasks carry a title, description, course (a free-text
//! category tag) and due date, and are either to do or finished.
//!
//! ## Layout
//!
//! - [`store::TaskStore`]: the single source of truth. Every mutation is saved
//!   atomically, then the new snapshot is pushed to all live subscriptions.
//! - [`projection`]: pure functions deriving screen views from a snapshot.
//! - [`controller`]: per-screen state (drafts, open dialogs, notices) that turns
//!   user intents into store calls.
//! - [`cmd`] and [`tui`]: the two front ends, a scriptable CLI and a tabbed TUI.
//!
//! ## Quick Start
//!
//! ```bash
//! taskify add "Pay rent" --desc "monthly" --course bill --due "next friday"
//! taskify list
//! taskify done 1
//! taskify finished
//! taskify ui
//! ```
//!
//! Data lives in `~/.taskify/` (or `$TASKIFY_HOME`) as a single `tasks.json`.

pub mod cli;
pub mod cmd;
pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod fields;
pub mod logging;
pub mod projection;
pub mod store;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod task_form;
    pub mod utils;
}

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{Error, Result};
pub use fields::{Category, CategoryMatching, ConflictPolicy};
pub use store::{Snapshot, Subscription, TaskStore};
pub use task::Task;
