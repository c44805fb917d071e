//! Enumerations for TUI state management.

/// Which screen is on top of the current tab.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppState {
    Browsing,
    TaskDetail,
    AddTask,
    EditTask,
    Help,
    Confirm,
}

/// Top-level navigation tabs.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tab {
    Home,
    Finished,
    Info,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Home, Tab::Finished, Tab::Info];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Home => "Home",
            Tab::Finished => "Finished",
            Tab::Info => "Info",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Home => 0,
            Tab::Finished => 1,
            Tab::Info => 2,
        }
    }

    pub fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    pub fn prev(self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}
