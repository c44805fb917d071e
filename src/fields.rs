//! Enumerations used to categorise tasks and tune store behaviour.
//!
//! Categories are not stored on the task. They are derived from the free-text
//! `course` field whenever the finished view is built.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Finished-task sections, in display order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Bill,
    Food,
    Meeting,
    Medication,
    Other,
}

impl Category {
    /// The four named sections. `Other` is whatever matches none of them.
    pub const TAGGED: [Category; 4] = [
        Category::Bill,
        Category::Food,
        Category::Meeting,
        Category::Medication,
    ];

    pub const ALL: [Category; 5] = [
        Category::Bill,
        Category::Food,
        Category::Meeting,
        Category::Medication,
        Category::Other,
    ];

    /// Literal `course` value that selects this section, if any.
    pub fn tag(self) -> Option<&'static str> {
        match self {
            Category::Bill => Some("bill"),
            Category::Food => Some("food"),
            Category::Meeting => Some("meeting"),
            Category::Medication => Some("medication"),
            Category::Other => None,
        }
    }

    /// Section heading.
    pub fn label(self) -> &'static str {
        match self {
            Category::Bill => "Bills",
            Category::Food => "Food",
            Category::Meeting => "Meetings",
            Category::Medication => "Medication",
            Category::Other => "Other",
        }
    }

    /// Resolve a `course` value to its section.
    pub fn of(course: &str, matching: CategoryMatching) -> Category {
        Category::TAGGED
            .into_iter()
            .find(|c| c.tag().is_some_and(|tag| matching.matches(course, tag)))
            .unwrap_or(Category::Other)
    }
}

/// How `course` is compared against the category tags.
///
/// Add and edit store `course` uppercased, so with `Exact` nearly every finished
/// task lands in `Other`. `CaseInsensitive` makes the named sections reachable.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryMatching {
    #[default]
    Exact,
    CaseInsensitive,
}

impl CategoryMatching {
    pub fn matches(self, course: &str, tag: &str) -> bool {
        match self {
            CategoryMatching::Exact => course == tag,
            CategoryMatching::CaseInsensitive => course.eq_ignore_ascii_case(tag),
        }
    }
}

/// What `insert` does when the task carries an id that is already live.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Overwrite the existing row in place (upsert).
    #[default]
    Replace,
    /// Reject the insert with a constraint error.
    Abort,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_matching_is_case_sensitive() {
        assert_eq!(Category::of("bill", CategoryMatching::Exact), Category::Bill);
        assert_eq!(Category::of("BILL", CategoryMatching::Exact), Category::Other);
        assert_eq!(Category::of("Meeting", CategoryMatching::Exact), Category::Other);
        assert_eq!(Category::of("", CategoryMatching::Exact), Category::Other);
    }

    #[test]
    fn test_case_insensitive_matching() {
        let m = CategoryMatching::CaseInsensitive;
        assert_eq!(Category::of("BILL", m), Category::Bill);
        assert_eq!(Category::of("Food", m), Category::Food);
        assert_eq!(Category::of("MEDICATION", m), Category::Medication);
        assert_eq!(Category::of("groceries", m), Category::Other);
    }

    #[test]
    fn test_policy_parses_from_kebab_case() {
        let p: ConflictPolicy = serde_json::from_str("\"abort\"").unwrap();
        assert_eq!(p, ConflictPolicy::Abort);
        let m: CategoryMatching = serde_json::from_str("\"case-insensitive\"").unwrap();
        assert_eq!(m, CategoryMatching::CaseInsensitive);
    }
}
