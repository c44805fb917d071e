//! Pure views over the task table.
//!
//! Each function takes the full collection and returns a narrower view in
//! source order. None of them touch the store, so every screen can recompute its
//! view from a fresh snapshot on each notification.

use crate::fields::{Category, CategoryMatching};
use crate::task::Task;

/// Tasks still to do.
pub fn incomplete(tasks: &[Task]) -> Vec<Task> {
    tasks.iter().filter(|t| !t.is_finished).cloned().collect()
}

/// True when no task is left to do. An empty table counts as all finished.
pub fn all_finished(tasks: &[Task]) -> bool {
    tasks.iter().all(|t| t.is_finished)
}

/// Finished tasks whose `course` is exactly `tag`.
pub fn by_category(tasks: &[Task], tag: &str) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| t.is_finished && t.course == tag)
        .cloned()
        .collect()
}

/// Finished tasks whose `course` is none of the category tags.
pub fn other_finished(tasks: &[Task]) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| t.is_finished && t.category(CategoryMatching::Exact) == Category::Other)
        .cloned()
        .collect()
}

pub fn by_id(tasks: &[Task], id: u64) -> Option<Task> {
    tasks.iter().find(|t| t.id == id).cloned()
}

/// The finished screen's five sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinishedGroups {
    pub bill: Vec<Task>,
    pub food: Vec<Task>,
    pub meeting: Vec<Task>,
    pub medication: Vec<Task>,
    pub other: Vec<Task>,
}

impl FinishedGroups {
    pub fn section(&self, category: Category) -> &[Task] {
        match category {
            Category::Bill => &self.bill,
            Category::Food => &self.food,
            Category::Meeting => &self.meeting,
            Category::Medication => &self.medication,
            Category::Other => &self.other,
        }
    }

    fn section_mut(&mut self, category: Category) -> &mut Vec<Task> {
        match category {
            Category::Bill => &mut self.bill,
            Category::Food => &mut self.food,
            Category::Meeting => &mut self.meeting,
            Category::Medication => &mut self.medication,
            Category::Other => &mut self.other,
        }
    }

    pub fn len(&self) -> usize {
        Category::ALL.iter().map(|&c| self.section(c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sections in display order, paired with their category.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[Task])> {
        Category::ALL.into_iter().map(move |c| (c, self.section(c)))
    }
}

/// Group finished tasks by category in one pass.
///
/// With `CategoryMatching::Exact` this equals `by_category` for each tag plus
/// `other_finished`.
pub fn finished_groups(tasks: &[Task], matching: CategoryMatching) -> FinishedGroups {
    let mut groups = FinishedGroups::default();
    for task in tasks.iter().filter(|t| t.is_finished) {
        groups.section_mut(task.category(matching)).push(task.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn t(id: u64, course: &str, finished: bool) -> Task {
        Task {
            id,
            title: format!("task {id}"),
            description: "d".into(),
            course: course.into(),
            due_date: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
            is_finished: finished,
        }
    }

    fn sample() -> Vec<Task> {
        vec![
            t(1, "bill", true),
            t(2, "BILL", true),
            t(3, "food", false),
            t(4, "meeting", true),
            t(5, "gym", true),
            t(6, "medication", true),
            t(7, "bill", true),
            t(8, "", false),
        ]
    }

    fn ids(tasks: &[Task]) -> Vec<u64> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_incomplete_keeps_order() {
        assert_eq!(ids(&incomplete(&sample())), vec![3, 8]);
    }

    #[test]
    fn test_all_finished_boundaries() {
        assert!(all_finished(&[]));
        assert!(!all_finished(&[t(1, "x", false)]));
        assert!(all_finished(&[t(1, "x", true), t(2, "y", true)]));
    }

    #[test]
    fn test_projections_are_deterministic() {
        let tasks = sample();
        assert_eq!(incomplete(&tasks), incomplete(&tasks));
        assert_eq!(by_category(&tasks, "bill"), by_category(&tasks, "bill"));
        assert_eq!(other_finished(&tasks), other_finished(&tasks));
    }

    #[test]
    fn test_by_category_is_case_sensitive() {
        let tasks = sample();
        assert_eq!(ids(&by_category(&tasks, "bill")), vec![1, 7]);
        assert_eq!(ids(&by_category(&tasks, "food")), Vec::<u64>::new());
        assert_eq!(ids(&other_finished(&tasks)), vec![2, 5]);
    }

    #[test]
    fn test_finished_tasks_fall_in_exactly_one_section() {
        let tasks = sample();
        let sections = [
            by_category(&tasks, "bill"),
            by_category(&tasks, "food"),
            by_category(&tasks, "meeting"),
            by_category(&tasks, "medication"),
            other_finished(&tasks),
        ];
        for task in &tasks {
            let hits = sections.iter().filter(|s| s.contains(task)).count();
            assert_eq!(hits, usize::from(task.is_finished), "task {}", task.id);
        }
    }

    #[test]
    fn test_finished_groups_matches_individual_projections() {
        let tasks = sample();
        let groups = finished_groups(&tasks, CategoryMatching::Exact);
        assert_eq!(groups.bill, by_category(&tasks, "bill"));
        assert_eq!(groups.meeting, by_category(&tasks, "meeting"));
        assert_eq!(groups.medication, by_category(&tasks, "medication"));
        assert_eq!(groups.other, other_finished(&tasks));
        assert_eq!(groups.len(), 6);
    }

    #[test]
    fn test_finished_groups_case_insensitive() {
        let groups = finished_groups(&sample(), CategoryMatching::CaseInsensitive);
        assert_eq!(ids(&groups.bill), vec![1, 2, 7]);
        assert_eq!(ids(&groups.other), vec![5]);
    }

    #[test]
    fn test_by_id() {
        let tasks = sample();
        assert_eq!(by_id(&tasks, 4).map(|t| t.course), Some("meeting".to_string()));
        assert_eq!(by_id(&tasks, 42), None);
    }
}
