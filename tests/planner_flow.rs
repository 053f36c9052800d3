use chrono::{DateTime, Duration, TimeZone, Utc};
use planner::model::{
    CategoryKind, EventPatch, NewCategory, NewEvent, NewTask, Priority, RecurrenceKind,
    RecurringPattern, SettingsPatch, TaskPatch,
};
use planner::planner::UNCATEGORIZED;
use planner::query::{self, TaskSort, TaskView};
use planner::store::{CATEGORIES_KEY, EVENTS_KEY, TASKS_KEY};
use planner::{FileStore, FixedClock, KeyValueStore, Planner};
use std::fs;
use tempfile::tempdir;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn standup(start: DateTime<Utc>) -> NewEvent {
    NewEvent {
        title: "Standup".into(),
        description: Some("daily sync".into()),
        start_date: start,
        end_date: start + Duration::minutes(15),
        category: "default_0".into(),
        color: "#3b82f6".into(),
        recurring_pattern: None,
    }
}

fn chore(title: &str, due: Option<DateTime<Utc>>, priority: Priority) -> NewTask {
    NewTask {
        title: title.into(),
        description: None,
        due_date: due,
        priority,
        category: "default_1".into(),
        color: "#10b981".into(),
    }
}

#[test]
fn events_survive_a_reopen_with_their_timestamps() {
    let temp = tempdir().unwrap();
    let clock = FixedClock::new(at(2024, 3, 4, 8, 0));
    let start = at(2024, 3, 5, 9, 30);

    let until = at(2024, 6, 28, 23, 59);
    let created = {
        let mut planner = Planner::load(FileStore::open(temp.path()).unwrap(), &clock);
        let mut draft = standup(start);
        draft.recurring_pattern = Some(RecurringPattern {
            kind: RecurrenceKind::Weekly,
            interval: 2,
            end_date: Some(until),
            days_of_week: Some(vec![2]),
            day_of_month: None,
        });
        planner.add_event(draft).unwrap()
    };
    assert_eq!(created.created_at, at(2024, 3, 4, 8, 0));
    assert_eq!(created.updated_at, created.created_at);
    assert!(created.is_recurring);

    let planner = Planner::load(FileStore::open(temp.path()).unwrap(), &clock);
    assert_eq!(planner.events(), std::slice::from_ref(&created));
    assert_eq!(planner.events()[0].start_date, start);
    let pattern = planner.events()[0].recurring_pattern.as_ref().unwrap();
    assert_eq!(pattern.end_date, Some(until));
    assert_eq!(pattern.interval, 2);
    assert!(temp.path().join(format!("{}.json", EVENTS_KEY)).is_file());
}

#[test]
fn updates_touch_only_the_patched_fields() {
    let temp = tempdir().unwrap();
    let clock = FixedClock::new(at(2024, 3, 4, 8, 0));
    let mut planner = Planner::load(FileStore::open(temp.path()).unwrap(), &clock);
    let event = planner.add_event(standup(at(2024, 3, 5, 9, 30))).unwrap();

    clock.advance(Duration::minutes(5));
    let patch = EventPatch {
        title: Some("Team standup".into()),
        ..EventPatch::default()
    };
    let updated = planner.update_event(&event.id, &patch).unwrap().unwrap();
    assert_eq!(updated.title, "Team standup");
    assert_eq!(updated.description, event.description);
    assert_eq!(updated.start_date, event.start_date);
    assert_eq!(updated.created_at, event.created_at);
    assert!(updated.updated_at > event.updated_at);
    assert_eq!(planner.events()[0], updated);

    let missing = planner.update_event("nope", &patch).unwrap();
    assert!(missing.is_none());
    assert!(!planner.remove_event("nope").unwrap());
    assert!(planner.remove_event(&event.id).unwrap());
    assert!(planner.events().is_empty());
}

#[test]
fn fresh_directory_starts_with_default_categories() {
    let temp = tempdir().unwrap();
    let clock = FixedClock::new(at(2024, 1, 1, 0, 0));
    let planner = Planner::load(FileStore::open(temp.path()).unwrap(), &clock);
    let names: Vec<&str> = planner.categories().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        ["Work", "Personal", "Health", "Education", "Social", "Shopping"]
    );

    let store = FileStore::open(temp.path()).unwrap();
    assert!(store.get(CATEGORIES_KEY).unwrap().is_some());
    assert!(planner.events().is_empty());
    assert!(planner.tasks().is_empty());
}

#[test]
fn corrupt_files_read_as_empty() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join(format!("{}.json", TASKS_KEY)), "{not json").unwrap();
    let clock = FixedClock::new(at(2024, 1, 1, 0, 0));
    let mut planner = Planner::load(FileStore::open(temp.path()).unwrap(), &clock);
    assert!(planner.tasks().is_empty());

    let task = planner.add_task(chore("Recover", None, Priority::Low)).unwrap();
    let reopened = Planner::load(FileStore::open(temp.path()).unwrap(), &clock);
    assert_eq!(reopened.tasks(), std::slice::from_ref(&task));
}

#[test]
fn task_lifecycle_and_views() {
    let temp = tempdir().unwrap();
    let now = at(2024, 6, 10, 12, 0);
    let clock = FixedClock::new(now);
    let mut planner = Planner::load(FileStore::open(temp.path()).unwrap(), &clock);

    let late = planner
        .add_task(chore("File taxes", Some(now - Duration::days(2)), Priority::High))
        .unwrap();
    let soon = planner
        .add_task(chore("Water plants", Some(now + Duration::days(3)), Priority::Low))
        .unwrap();
    let someday = planner.add_task(chore("Learn piano", None, Priority::Medium)).unwrap();

    let overdue = query::overdue_tasks(planner.tasks(), &now);
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].id, late.id);

    let upcoming = query::upcoming_tasks(planner.tasks(), &now);
    assert_eq!(upcoming.iter().map(|t| &t.id).collect::<Vec<_>>(), [&soon.id]);

    let toggled = planner.toggle_task(&late.id).unwrap().unwrap();
    assert!(toggled.completed);
    assert!(query::overdue_tasks(planner.tasks(), &now).is_empty());

    let stats = query::task_stats(planner.tasks(), &now);
    assert_eq!(stats.total, 3);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.pending, 2);
    assert_eq!(stats.completion_rate, 33);

    let pending = query::task_view(planner.tasks(), TaskView::Pending, TaskSort::DueDate, &now);
    assert_eq!(
        pending.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
        [soon.id.as_str(), someday.id.as_str()]
    );

    let cleared = planner
        .update_task(
            &soon.id,
            &TaskPatch {
                due_date: Some(None),
                ..TaskPatch::default()
            },
        )
        .unwrap()
        .unwrap();
    assert!(cleared.due_date.is_none());
    assert_eq!(cleared.priority, Priority::Low);
}

#[test]
fn categories_and_settings_round_trip() {
    let temp = tempdir().unwrap();
    let clock = FixedClock::new(at(2024, 1, 1, 0, 0));
    let mut planner = Planner::load(FileStore::open(temp.path()).unwrap(), &clock);

    let travel = planner
        .add_category(NewCategory {
            name: "Travel".into(),
            color: "#f97316".into(),
            kind: CategoryKind::Event,
        })
        .unwrap();
    let mut trip = standup(at(2024, 2, 1, 7, 0));
    trip.category = travel.id.clone();
    planner.add_event(trip).unwrap();
    assert_eq!(planner.category_usage(&travel.id), 1);
    assert_eq!(planner.category_name(&travel.id), "Travel");

    assert!(planner.remove_category(&travel.id).unwrap());
    assert_eq!(planner.category_name(&travel.id), UNCATEGORIZED);
    assert_eq!(planner.events().len(), 1);

    planner
        .update_settings(&SettingsPatch {
            default_event_duration: Some(45),
            show_weekends: Some(false),
            ..SettingsPatch::default()
        })
        .unwrap();
    let reopened = Planner::load(FileStore::open(temp.path()).unwrap(), &clock);
    assert_eq!(reopened.settings().default_event_duration, 45);
    assert!(!reopened.settings().show_weekends);
    assert_eq!(reopened.categories().len(), 6);
}

#[test]
fn ids_resolve_by_unique_prefix() {
    let temp = tempdir().unwrap();
    let clock = FixedClock::new(at(2024, 1, 1, 0, 0));
    let mut planner = Planner::load(FileStore::open(temp.path()).unwrap(), &clock);
    let task = planner.add_task(chore("Only one", None, Priority::Low)).unwrap();

    let prefix = &task.id[..task.id.len() - 2];
    assert_eq!(planner.resolve_task(prefix).unwrap().id, task.id);
    assert!(planner.resolve_task("zzz-not-an-id").is_err());
    assert_eq!(planner.resolve_category("default_3").unwrap().name, "Education");
}
