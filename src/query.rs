use crate::calendar::{end_of_day, local_date, start_of_day};
use crate::model::{Category, Event, Priority, Task};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::cmp::Ordering;
use std::str::FromStr;

pub const UPCOMING_DAYS: i64 = 7;

pub trait Searchable {
    fn title(&self) -> &str;
    fn description(&self) -> Option<&str>;
}

impl Searchable for Event {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl Searchable for Task {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
    pub due_today: usize,
    /// Whole percent, 0 when there are no tasks.
    pub completion_rate: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSort {
    DueDate,
    Priority,
    Created,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskView {
    All,
    Pending,
    Completed,
    Today,
    Overdue,
}

/// Case-insensitive substring match on the title, or the description if there is one.
pub fn matches_text<T: Searchable>(item: &T, query: &str) -> bool {
    let needle = query.to_lowercase();
    item.title().to_lowercase().contains(&needle)
        || item
            .description()
            .map(|d| d.to_lowercase().contains(&needle))
            .unwrap_or(false)
}

pub fn search<'a, T: Searchable>(items: &'a [T], query: &str) -> Vec<&'a T> {
    items.iter().filter(|item| matches_text(*item, query)).collect()
}

/// Inclusive overlap: an event that only partly reaches into the range counts.
pub fn overlaps(event: &Event, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    event.start_date <= end && event.end_date >= start
}

pub fn events_in_range(events: &[Event], start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<&Event> {
    events.iter().filter(|e| overlaps(e, start, end)).collect()
}

pub fn events_on_day<'a, Tz: TimeZone>(events: &'a [Event], date: NaiveDate, tz: &Tz) -> Vec<&'a Event> {
    events_in_range(events, start_of_day(date, tz), end_of_day(date, tz))
}

/// Events touching `date`, earliest start first.
pub fn agenda<'a, Tz: TimeZone>(events: &'a [Event], date: NaiveDate, tz: &Tz) -> Vec<&'a Event> {
    let mut day = events_on_day(events, date, tz);
    day.sort_by_key(|e| e.start_date);
    day
}

pub fn events_by_category<'a>(events: &'a [Event], category: &str) -> Vec<&'a Event> {
    events.iter().filter(|e| e.category == category).collect()
}

/// Events starting within the next seven days (both ends inclusive), soonest first.
pub fn upcoming_events<'a, Tz: TimeZone>(events: &'a [Event], now: &DateTime<Tz>) -> Vec<&'a Event> {
    let from = now.with_timezone(&Utc);
    let until = from + Duration::days(UPCOMING_DAYS);
    let mut upcoming: Vec<&Event> = events
        .iter()
        .filter(|e| e.start_date >= from && e.start_date <= until)
        .collect();
    upcoming.sort_by_key(|e| e.start_date);
    upcoming
}

pub fn tasks_by_status(tasks: &[Task], completed: bool) -> Vec<&Task> {
    tasks.iter().filter(|t| t.completed == completed).collect()
}

pub fn tasks_by_priority(tasks: &[Task], priority: Priority) -> Vec<&Task> {
    tasks.iter().filter(|t| t.priority == priority).collect()
}

pub fn tasks_by_category<'a>(tasks: &'a [Task], category: &str) -> Vec<&'a Task> {
    tasks.iter().filter(|t| t.category == category).collect()
}

/// Due in `[start of today, start of tomorrow)` on the wall clock of `now`.
pub fn is_due_today<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> bool {
    let today = now.date_naive();
    let tz = now.timezone();
    let from = start_of_day(today, &tz);
    let until = today
        .succ_opt()
        .map(|tomorrow| start_of_day(tomorrow, &tz))
        .unwrap_or(from + Duration::days(1));
    task.due_date.map_or(false, |due| due >= from && due < until)
}

pub fn is_overdue<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> bool {
    let now = now.with_timezone(&Utc);
    !task.completed && task.due_date.map_or(false, |due| due < now)
}

pub fn tasks_due_today<'a, Tz: TimeZone>(tasks: &'a [Task], now: &DateTime<Tz>) -> Vec<&'a Task> {
    tasks.iter().filter(|t| is_due_today(t, now)).collect()
}

pub fn tasks_due_on<'a, Tz: TimeZone>(tasks: &'a [Task], date: NaiveDate, tz: &Tz) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| t.due_date.map_or(false, |due| local_date(due, tz) == date))
        .collect()
}

pub fn overdue_tasks<'a, Tz: TimeZone>(tasks: &'a [Task], now: &DateTime<Tz>) -> Vec<&'a Task> {
    tasks.iter().filter(|t| is_overdue(t, now)).collect()
}

/// Open tasks due within the next seven days, soonest first. Undated tasks never qualify.
pub fn upcoming_tasks<'a, Tz: TimeZone>(tasks: &'a [Task], now: &DateTime<Tz>) -> Vec<&'a Task> {
    let from = now.with_timezone(&Utc);
    let until = from + Duration::days(UPCOMING_DAYS);
    let mut upcoming: Vec<&Task> = tasks
        .iter()
        .filter(|t| !t.completed)
        .filter(|t| t.due_date.map_or(false, |due| due >= from && due <= until))
        .collect();
    upcoming.sort_by_key(|t| t.due_date);
    upcoming
}

pub fn task_stats<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> TaskStats {
    let total = tasks.len();
    let completed = tasks.iter().filter(|t| t.completed).count();
    let completion_rate = if total == 0 {
        0
    } else {
        (completed as f64 / total as f64 * 100.0).round() as u32
    };
    TaskStats {
        total,
        completed,
        pending: total - completed,
        overdue: tasks.iter().filter(|t| is_overdue(t, now)).count(),
        due_today: tasks.iter().filter(|t| is_due_today(t, now)).count(),
        completion_rate,
    }
}

/// Stable sort. Undated tasks go after every dated one when sorting by due date.
pub fn sort_tasks(tasks: &mut [&Task], sort: TaskSort) {
    match sort {
        TaskSort::DueDate => tasks.sort_by(|a, b| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
        TaskSort::Priority => tasks.sort_by(|a, b| b.priority.weight().cmp(&a.priority.weight())),
        TaskSort::Created => tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
}

/// One tab of the task list: the matching tasks in the requested order.
pub fn task_view<'a, Tz: TimeZone>(
    tasks: &'a [Task],
    view: TaskView,
    sort: TaskSort,
    now: &DateTime<Tz>,
) -> Vec<&'a Task> {
    let mut selected: Vec<&Task> = match view {
        TaskView::All => tasks.iter().collect(),
        TaskView::Pending => tasks_by_status(tasks, false),
        TaskView::Completed => tasks_by_status(tasks, true),
        TaskView::Today => tasks_due_today(tasks, now),
        TaskView::Overdue => overdue_tasks(tasks, now),
    };
    sort_tasks(&mut selected, sort);
    selected
}

pub fn find_category<'a>(categories: &'a [Category], id: &str) -> Option<&'a Category> {
    categories.iter().find(|c| c.id == id)
}

pub fn categories_for_events(categories: &[Category]) -> Vec<&Category> {
    categories
        .iter()
        .filter(|c| c.kind.applies_to_events())
        .collect()
}

pub fn categories_for_tasks(categories: &[Category]) -> Vec<&Category> {
    categories
        .iter()
        .filter(|c| c.kind.applies_to_tasks())
        .collect()
}

/// How many events and tasks still point at `category`.
pub fn category_usage(events: &[Event], tasks: &[Task], category: &str) -> usize {
    events.iter().filter(|e| e.category == category).count()
        + tasks.iter().filter(|t| t.category == category).count()
}

impl TaskSort {
    pub fn label(self) -> &'static str {
        match self {
            TaskSort::DueDate => "due date",
            TaskSort::Priority => "priority",
            TaskSort::Created => "created",
        }
    }

    pub fn next(self) -> Self {
        match self {
            TaskSort::DueDate => TaskSort::Priority,
            TaskSort::Priority => TaskSort::Created,
            TaskSort::Created => TaskSort::DueDate,
        }
    }
}

impl TaskView {
    pub const ALL: [TaskView; 5] = [
        TaskView::All,
        TaskView::Pending,
        TaskView::Completed,
        TaskView::Today,
        TaskView::Overdue,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TaskView::All => "all",
            TaskView::Pending => "pending",
            TaskView::Completed => "completed",
            TaskView::Today => "today",
            TaskView::Overdue => "overdue",
        }
    }

    pub fn next(self) -> Self {
        match self {
            TaskView::All => TaskView::Pending,
            TaskView::Pending => TaskView::Completed,
            TaskView::Completed => TaskView::Today,
            TaskView::Today => TaskView::Overdue,
            TaskView::Overdue => TaskView::All,
        }
    }
}

impl FromStr for TaskSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "due" | "due-date" | "duedate" => Ok(TaskSort::DueDate),
            "priority" => Ok(TaskSort::Priority),
            "created" => Ok(TaskSort::Created),
            other => Err(format!("unknown sort '{}' (use due, priority or created)", other)),
        }
    }
}

impl FromStr for TaskView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        TaskView::ALL
            .into_iter()
            .find(|view| view.label() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown view '{}' (use all, pending, completed, today or overdue)",
                    wanted
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewEvent, NewTask};

    fn at(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, h, m, 0).unwrap()
    }

    fn ev(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Event {
        Event::new(
            id.into(),
            NewEvent {
                title: format!("Event {}", id),
                description: None,
                start_date: start,
                end_date: end,
                category: "default_0".into(),
                color: "#3b82f6".into(),
                recurring_pattern: None,
            },
            start,
        )
    }

    fn task(id: &str, due: Option<DateTime<Utc>>, priority: Priority) -> Task {
        Task::new(
            id.into(),
            NewTask {
                title: format!("Task {}", id),
                description: None,
                due_date: due,
                priority,
                category: "default_1".into(),
                color: "#10b981".into(),
            },
            at(1, 0, 0),
        )
    }

    fn ids<T: Searchable>(items: &[&T]) -> Vec<String> {
        items.iter().map(|i| i.title().to_string()).collect()
    }

    #[test]
    fn range_uses_overlap_not_containment() {
        let events = vec![
            ev("inside", at(10, 9, 0), at(10, 10, 0)),
            ev("straddle", at(9, 22, 0), at(10, 1, 0)),
            ev("before", at(9, 8, 0), at(9, 9, 0)),
        ];
        let found = events_in_range(&events, at(10, 0, 0), at(10, 23, 59));
        assert_eq!(ids(&found), ["Event inside", "Event straddle"]);
    }

    #[test]
    fn day_membership_includes_touching_events() {
        let events = vec![
            ev("ends-at-midnight", at(9, 23, 0), at(10, 0, 0)),
            ev("next-day", at(11, 0, 0), at(11, 1, 0)),
        ];
        let day = events_on_day(&events, at(10, 0, 0).date_naive(), &Utc);
        assert_eq!(ids(&day), ["Event ends-at-midnight"]);
    }

    #[test]
    fn agenda_sorts_by_start() {
        let events = vec![
            ev("late", at(10, 15, 0), at(10, 16, 0)),
            ev("early", at(10, 8, 0), at(10, 9, 0)),
        ];
        let day = agenda(&events, at(10, 0, 0).date_naive(), &Utc);
        assert_eq!(ids(&day), ["Event early", "Event late"]);
    }

    #[test]
    fn upcoming_events_window_is_inclusive() {
        let now = at(10, 12, 0);
        let events = vec![
            ev("edge", now + Duration::days(7), now + Duration::days(7) + Duration::hours(1)),
            ev("now", now, now + Duration::hours(1)),
            ev("past", now - Duration::minutes(1), now + Duration::hours(1)),
            ev("too-far", now + Duration::days(7) + Duration::minutes(1), now + Duration::days(8)),
        ];
        assert_eq!(ids(&upcoming_events(&events, &now)), ["Event now", "Event edge"]);
    }

    #[test]
    fn due_today_boundaries() {
        let now = at(10, 15, 0);
        let start_today = at(10, 0, 0);
        let tasks = vec![
            task("midnight", Some(start_today), Priority::Low),
            task("just-before", Some(start_today - Duration::milliseconds(1)), Priority::Low),
            task("tomorrow", Some(at(11, 0, 0)), Priority::Low),
        ];
        assert_eq!(ids(&tasks_due_today(&tasks, &now)), ["Task midnight"]);
        assert_eq!(
            ids(&overdue_tasks(&tasks, &now)),
            ["Task midnight", "Task just-before"]
        );
    }

    #[test]
    fn completed_tasks_are_never_overdue() {
        let now = at(10, 15, 0);
        let mut done = task("done", Some(at(1, 0, 0)), Priority::High);
        done.completed = true;
        assert!(!is_overdue(&done, &now));
        assert!(overdue_tasks(&[done], &now).is_empty());
    }

    #[test]
    fn upcoming_tasks_skip_done_and_undated() {
        let now = at(10, 12, 0);
        let mut done = task("done", Some(at(11, 9, 0)), Priority::Low);
        done.completed = true;
        let tasks = vec![
            task("later", Some(at(15, 9, 0)), Priority::Low),
            task("undated", None, Priority::High),
            done,
            task("soon", Some(at(11, 9, 0)), Priority::Low),
        ];
        assert_eq!(ids(&upcoming_tasks(&tasks, &now)), ["Task soon", "Task later"]);
    }

    #[test]
    fn stats_on_nothing_is_zero() {
        let stats = task_stats(&[], &at(10, 12, 0));
        assert_eq!(stats, TaskStats::default());
        assert_eq!(stats.completion_rate, 0);
    }

    #[test]
    fn stats_round_the_rate() {
        let now = at(10, 12, 0);
        let mut tasks = vec![
            task("a", Some(at(10, 18, 0)), Priority::Low),
            task("b", Some(at(2, 0, 0)), Priority::Low),
            task("c", None, Priority::Low),
        ];
        tasks[2].completed = true;
        let stats = task_stats(&tasks, &now);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.due_today, 1);
        assert_eq!(stats.completion_rate, 33);
    }

    #[test]
    fn due_date_sort_puts_undated_last_and_keeps_their_order() {
        let tasks = vec![
            task("u1", None, Priority::Low),
            task("late", Some(at(20, 0, 0)), Priority::Low),
            task("u2", None, Priority::Low),
            task("early", Some(at(12, 0, 0)), Priority::Low),
        ];
        let mut refs: Vec<&Task> = tasks.iter().collect();
        sort_tasks(&mut refs, TaskSort::DueDate);
        assert_eq!(ids(&refs), ["Task early", "Task late", "Task u1", "Task u2"]);
    }

    #[test]
    fn priority_and_created_sorts() {
        let mut tasks = vec![
            task("low", None, Priority::Low),
            task("high", None, Priority::High),
            task("medium", None, Priority::Medium),
        ];
        tasks[0].created_at = at(3, 0, 0);
        tasks[1].created_at = at(1, 0, 0);
        tasks[2].created_at = at(2, 0, 0);
        let mut refs: Vec<&Task> = tasks.iter().collect();
        sort_tasks(&mut refs, TaskSort::Priority);
        assert_eq!(ids(&refs), ["Task high", "Task medium", "Task low"]);
        sort_tasks(&mut refs, TaskSort::Created);
        assert_eq!(ids(&refs), ["Task low", "Task medium", "Task high"]);
    }

    #[test]
    fn search_checks_title_and_description() {
        let mut with_desc = task("plain", None, Priority::Low);
        with_desc.description = Some("Pick up the DRY cleaning".into());
        let tasks = vec![with_desc, task("Dryer repair", None, Priority::Low)];
        assert_eq!(search(&tasks, "dry").len(), 2);
        assert_eq!(search(&tasks, "cleaning").len(), 1);
        assert!(search(&tasks, "laundry").is_empty());
    }

    #[test]
    fn filters_by_equality() {
        let mut tasks = vec![
            task("a", None, Priority::High),
            task("b", None, Priority::Low),
        ];
        tasks[1].category = "default_5".into();
        tasks[1].completed = true;
        assert_eq!(tasks_by_priority(&tasks, Priority::High).len(), 1);
        assert_eq!(tasks_by_category(&tasks, "default_5").len(), 1);
        assert_eq!(tasks_by_status(&tasks, true).len(), 1);
        assert_eq!(tasks_by_status(&tasks, false).len(), 1);
    }

    #[test]
    fn task_views_filter_then_sort() {
        let now = at(10, 12, 0);
        let mut tasks = vec![
            task("overdue", Some(at(9, 0, 0)), Priority::Low),
            task("today", Some(at(10, 20, 0)), Priority::High),
            task("done", Some(at(10, 8, 0)), Priority::Medium),
        ];
        tasks[2].completed = true;
        let today = task_view(&tasks, TaskView::Today, TaskSort::Priority, &now);
        assert_eq!(ids(&today), ["Task today", "Task done"]);
        let overdue = task_view(&tasks, TaskView::Overdue, TaskSort::DueDate, &now);
        assert_eq!(ids(&overdue), ["Task overdue"]);
        let pending = task_view(&tasks, TaskView::Pending, TaskSort::DueDate, &now);
        assert_eq!(ids(&pending), ["Task overdue", "Task today"]);
    }

    #[test]
    fn due_on_a_given_date() {
        let tasks = vec![
            task("a", Some(at(12, 23, 59)), Priority::Low),
            task("b", Some(at(13, 0, 0)), Priority::Low),
            task("c", None, Priority::Low),
        ];
        let due = tasks_due_on(&tasks, at(12, 0, 0).date_naive(), &Utc);
        assert_eq!(ids(&due), ["Task a"]);
    }
}
