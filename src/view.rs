//! Ordering engine: filter, search, and sort a snapshot of tasks.
//!
//! `compute_view` is a pure function over an immutable snapshot. The
//! comparator is composite, evaluated top to bottom, first non-zero result
//! wins:
//!
//! 1. done tasks always sort after non-done tasks, in every mode
//! 2. smart mode only: assistant rank ascending (unranked treated as 9999)
//! 3. priority: critical < high < medium < low
//! 4. creation timestamp descending (newest first)

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Status filter applied before searching and sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    /// Everything not done.
    Active,
    /// Done only.
    Completed,
}

/// Sort mode for the computed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Priority, then creation date.
    #[default]
    Default,
    /// Assistant-assigned rank, falling back to priority and date on ties.
    Smart,
}

/// Compute the display order for a snapshot of tasks.
///
/// Deterministic for a given input; the underlying sort is stable, so tasks
/// equal under every comparator key keep their input order.
pub fn compute_view(
    tasks: &[Task],
    filter: StatusFilter,
    search: &str,
    sort: SortMode,
) -> Vec<Task> {
    let needle = search.to_lowercase();

    let mut view: Vec<Task> = tasks
        .iter()
        .filter(|t| matches_filter(t, filter))
        .filter(|t| matches_search(t, &needle))
        .cloned()
        .collect();

    view.sort_by(|a, b| compare(a, b, sort));
    view
}

fn matches_filter(task: &Task, filter: StatusFilter) -> bool {
    match filter {
        StatusFilter::All => true,
        StatusFilter::Active => !task.status.is_done(),
        StatusFilter::Completed => task.status.is_done(),
    }
}

/// Case-insensitive whole-string substring match against title, category, or
/// any tag. `needle` must already be lowercased; an empty needle matches
/// everything.
fn matches_search(task: &Task, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    task.title.to_lowercase().contains(needle)
        || task.category.to_lowercase().contains(needle)
        || task
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
}

fn compare(a: &Task, b: &Task, sort: SortMode) -> Ordering {
    // Done status dominates every other key.
    match (a.status.is_done(), b.status.is_done()) {
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }

    if sort == SortMode::Smart {
        let by_rank = a.effective_rank().cmp(&b.effective_rank());
        if by_rank != Ordering::Equal {
            return by_rank;
        }
    }

    let by_priority = a.priority.sort_key().cmp(&b.priority.sort_key());
    if by_priority != Ordering::Equal {
        return by_priority;
    }

    // Newest created first.
    b.created_at.cmp(&a.created_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Priority, TaskStatus};
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;
    use uuid::Uuid;

    fn task(title: &str, priority: Priority, status: TaskStatus, created_secs: i64) -> Task {
        let mut t = Task::new(title);
        t.priority = priority;
        t.status = status;
        t.created_at = Utc.timestamp_opt(created_secs, 0).unwrap();
        t
    }

    fn sample_tasks() -> Vec<Task> {
        let mut a = task("write report", Priority::High, TaskStatus::Todo, 100);
        a.category = "work".into();
        a.tags = vec!["writing".into()];

        let mut b = task("buy groceries", Priority::Low, TaskStatus::InProgress, 200);
        b.category = "errands".into();
        b.tags = vec!["shopping".into(), "food".into()];

        let mut c = task("file taxes", Priority::Critical, TaskStatus::Done, 300);
        c.category = "finance".into();

        let d = task("call dentist", Priority::Medium, TaskStatus::Todo, 400);

        vec![a, b, c, d]
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let view = compute_view(&[], StatusFilter::All, "", SortMode::Default);
        assert!(view.is_empty());
    }

    #[test]
    fn status_filters_partition_the_search_set() {
        let tasks = sample_tasks();
        // "f" hits "buy groceries" (tag "food", active) and "file taxes"
        // (title, done) but not the other two, so the search constraint is
        // part of the partition.
        let search = "f";

        let all: HashSet<Uuid> = compute_view(&tasks, StatusFilter::All, search, SortMode::Default)
            .iter()
            .map(|t| t.id)
            .collect();
        let active: HashSet<Uuid> =
            compute_view(&tasks, StatusFilter::Active, search, SortMode::Default)
                .iter()
                .map(|t| t.id)
                .collect();
        let completed: HashSet<Uuid> =
            compute_view(&tasks, StatusFilter::Completed, search, SortMode::Default)
                .iter()
                .map(|t| t.id)
                .collect();

        assert!(active.is_disjoint(&completed));
        let union: HashSet<Uuid> = active.union(&completed).copied().collect();
        assert_eq!(union, all);
        assert_eq!(all.len(), 2, "search must narrow the set being partitioned");
        assert_eq!(active.len(), 1);
        assert_eq!(completed.len(), 1);
    }

    #[test]
    fn search_matches_title_category_and_tags_case_insensitively() {
        let tasks = sample_tasks();

        let by_title = compute_view(&tasks, StatusFilter::All, "REPORT", SortMode::Default);
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].title, "write report");

        let by_category = compute_view(&tasks, StatusFilter::All, "finance", SortMode::Default);
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].title, "file taxes");

        let by_tag = compute_view(&tasks, StatusFilter::All, "food", SortMode::Default);
        assert_eq!(by_tag.len(), 1);
        assert_eq!(by_tag[0].title, "buy groceries");

        let none = compute_view(&tasks, StatusFilter::All, "zzz", SortMode::Default);
        assert!(none.is_empty());
    }

    #[test]
    fn empty_search_matches_everything() {
        let tasks = sample_tasks();
        let view = compute_view(&tasks, StatusFilter::All, "", SortMode::Default);
        assert_eq!(view.len(), tasks.len());
    }

    #[test]
    fn done_tasks_sort_last_in_every_mode() {
        let tasks = sample_tasks();
        for sort in [SortMode::Default, SortMode::Smart] {
            let view = compute_view(&tasks, StatusFilter::All, "", sort);
            let first_done = view.iter().position(|t| t.status.is_done());
            if let Some(pos) = first_done {
                assert!(
                    view[pos..].iter().all(|t| t.status.is_done()),
                    "done tasks must form the tail of the view"
                );
            }
        }
    }

    #[test]
    fn default_mode_orders_by_priority_then_newest() {
        let tasks = vec![
            task("medium old", Priority::Medium, TaskStatus::Todo, 100),
            task("medium new", Priority::Medium, TaskStatus::Todo, 500),
            task("critical", Priority::Critical, TaskStatus::Todo, 50),
            task("low", Priority::Low, TaskStatus::Todo, 900),
        ];
        let view = compute_view(&tasks, StatusFilter::All, "", SortMode::Default);
        let titles: Vec<&str> = view.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["critical", "medium new", "medium old", "low"]);
    }

    #[test]
    fn smart_mode_orders_by_rank_regardless_of_priority() {
        let mut low = task("low but first", Priority::Low, TaskStatus::Todo, 100);
        low.rank = Some(0);
        let mut critical = task("critical but second", Priority::Critical, TaskStatus::Todo, 200);
        critical.rank = Some(1);

        let view = compute_view(
            &[critical.clone(), low.clone()],
            StatusFilter::All,
            "",
            SortMode::Smart,
        );
        assert_eq!(view[0].id, low.id);
        assert_eq!(view[1].id, critical.id);
    }

    #[test]
    fn smart_mode_falls_back_to_priority_on_equal_ranks() {
        let mut a = task("medium", Priority::Medium, TaskStatus::Todo, 100);
        a.rank = Some(3);
        let mut b = task("high", Priority::High, TaskStatus::Todo, 100);
        b.rank = Some(3);

        let view = compute_view(&[a, b], StatusFilter::All, "", SortMode::Smart);
        assert_eq!(view[0].title, "high");
    }

    #[test]
    fn unranked_tasks_sort_after_ranked_in_smart_mode() {
        // Assistant returned [B, A]; C was not returned. Expected order: B, A, C.
        let mut a = task("A", Priority::Critical, TaskStatus::Todo, 300);
        a.rank = Some(1);
        let mut b = task("B", Priority::Low, TaskStatus::Todo, 100);
        b.rank = Some(0);
        let c = task("C", Priority::High, TaskStatus::Todo, 200);

        let view = compute_view(
            &[a.clone(), b.clone(), c.clone()],
            StatusFilter::All,
            "",
            SortMode::Smart,
        );
        let ids: Vec<Uuid> = view.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![b.id, a.id, c.id]);
    }

    #[test]
    fn compute_view_is_idempotent() {
        let tasks = sample_tasks();
        let first = compute_view(&tasks, StatusFilter::All, "e", SortMode::Smart);
        let second = compute_view(&tasks, StatusFilter::All, "e", SortMode::Smart);
        let first_ids: Vec<Uuid> = first.iter().map(|t| t.id).collect();
        let second_ids: Vec<Uuid> = second.iter().map(|t| t.id).collect();
        assert_eq!(first_ids, second_ids);
    }
}
