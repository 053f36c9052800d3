use crate::cli::{
    CategoryCommand, EventCommand, EventEdit, EventFields, SettingsCommand, TaskCommand,
};
use crate::ui;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDate, Timelike, Utc};
use planner::calendar::{self, event_block, month_grid, view_range, week_grid, weekday_labels};
use planner::model::{
    validate_duration, validate_event, AppSettings, CalendarView, Category, CategoryPatch,
    Event, EventPatch, NewCategory, NewEvent, NewTask, RecurrenceKind, RecurringPattern,
    SettingsPatch, Task, TaskPatch, TimeFormat, DEFAULT_COLORS,
};
use planner::query;
use planner::storage::{init_project_dir, locate_data_dir, DataLocation, FileStore};
use planner::timefmt::{format_date_time, format_input, format_time, parse_date, parse_local, relative_date};
use planner::transfer::{default_file_name, render, DocumentFormat};
use planner::{Planner, SystemClock};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub type LocalPlanner = Planner<FileStore, SystemClock>;

pub fn init() -> Result<()> {
    let cwd = env::current_dir()?;
    let location = init_project_dir(&cwd)?;
    let store = FileStore::open(&location.dir)?;
    let planner = Planner::load(store, SystemClock);
    println!(
        "Initialized planner data at {} ({} categories)",
        location.dir.display(),
        planner.categories().len()
    );
    Ok(())
}

pub fn locate(data_dir: Option<&Path>) -> Result<DataLocation> {
    let cwd = env::current_dir()?;
    locate_data_dir(&cwd, data_dir)
}

pub fn open_at(location: &DataLocation) -> Result<LocalPlanner> {
    let store = FileStore::open(&location.dir)
        .with_context(|| format!("opening data directory {}", location.dir.display()))?;
    Ok(Planner::load(store, SystemClock))
}

fn open(data_dir: Option<&Path>) -> Result<(LocalPlanner, DataLocation)> {
    let location = locate(data_dir)?;
    Ok((open_at(&location)?, location))
}

pub fn event(data_dir: Option<&Path>, command: EventCommand) -> Result<()> {
    let (mut planner, _) = open(data_dir)?;
    match command {
        EventCommand::Add(fields) => add_event(&mut planner, fields),
        EventCommand::List {
            date,
            category,
            search,
        } => list_events(&planner, date, category, search),
        EventCommand::Edit { id, fields } => edit_event(&mut planner, &id, fields),
        EventCommand::Rm { id } => {
            let event = planner.resolve_event(&id)?.clone();
            planner
                .remove_event(&event.id)
                .with_context(|| format!("removing event {}", event.id))?;
            println!("Removed event {} ({})", event.id, event.title);
            Ok(())
        }
        EventCommand::Upcoming => {
            let now = planner.now_local();
            let upcoming = query::upcoming_events(planner.events(), &now);
            if upcoming.is_empty() {
                println!("No events in the next {} days", query::UPCOMING_DAYS);
            }
            for event in upcoming {
                print_event(&planner, event);
            }
            Ok(())
        }
    }
}

fn add_event(planner: &mut LocalPlanner, fields: EventFields) -> Result<()> {
    let start = parse_local(&fields.start)?;
    let end = match fields.end.as_deref() {
        Some(raw) => parse_local(raw)?,
        None => start + Duration::minutes(planner.settings().default_event_duration as i64),
    };
    let category = match fields.category.as_deref() {
        Some(needle) => planner.resolve_category(needle)?.id.clone(),
        None => query::categories_for_events(planner.categories())
            .first()
            .map(|c| c.id.clone())
            .unwrap_or_default(),
    };
    let color = match fields.color.as_deref() {
        Some(raw) => parse_color(raw)?,
        None => planner.category_color(&category),
    };
    let recurring_pattern = match fields.repeat {
        Some(kind) => Some(pattern(kind, fields.interval, fields.until.as_deref())?),
        None => None,
    };
    let draft = NewEvent {
        title: fields.title.trim().to_string(),
        description: fields.description.filter(|d| !d.trim().is_empty()),
        start_date: start,
        end_date: end,
        category,
        color,
        recurring_pattern,
    };
    draft.validate()?;
    let event = planner.add_event(draft).context("saving event")?;
    println!("Added event {} ({})", event.id, event.title);
    Ok(())
}

fn list_events(
    planner: &LocalPlanner,
    date: Option<String>,
    category: Option<String>,
    search: Option<String>,
) -> Result<()> {
    let mut events: Vec<&Event> = match date.as_deref() {
        Some(raw) => query::agenda(planner.events(), parse_date(raw)?, &Local),
        None => {
            let mut all: Vec<&Event> = planner.events().iter().collect();
            all.sort_by_key(|e| e.start_date);
            all
        }
    };
    if let Some(needle) = category.as_deref() {
        let id = planner.resolve_category(needle)?.id.clone();
        events.retain(|e| e.category == id);
    }
    if let Some(text) = search.as_deref() {
        events.retain(|e| query::matches_text(*e, text));
    }
    if events.is_empty() {
        println!("(no events)");
    }
    for event in events {
        print_event(planner, event);
    }
    Ok(())
}

fn edit_event(planner: &mut LocalPlanner, needle: &str, fields: EventEdit) -> Result<()> {
    let current = planner.resolve_event(needle)?.clone();
    let category = match fields.category.as_deref() {
        Some(needle) => Some(planner.resolve_category(needle)?.id.clone()),
        None => None,
    };
    let recurring_pattern = repeat_change(current.recurring_pattern.as_ref(), &fields)?;
    let description = if fields.clear_description {
        Some(None)
    } else {
        fields.description.map(Some)
    };
    let patch = EventPatch {
        title: fields.title.map(|t| t.trim().to_string()),
        description,
        start_date: fields.start.as_deref().map(parse_local).transpose()?,
        end_date: fields.end.as_deref().map(parse_local).transpose()?,
        category,
        color: fields.color.as_deref().map(parse_color).transpose()?,
        recurring_pattern,
    };
    if patch.is_empty() {
        bail!("nothing to change for event {}", current.id);
    }
    let mut preview = current.clone();
    patch.apply(&mut preview);
    validate_event(&preview)?;
    planner
        .update_event(&current.id, &patch)
        .with_context(|| format!("updating event {}", current.id))?;
    println!("Updated event {}", current.id);
    Ok(())
}

pub fn task(data_dir: Option<&Path>, command: TaskCommand) -> Result<()> {
    let (mut planner, _) = open(data_dir)?;
    let now = planner.now_local();
    match command {
        TaskCommand::Add {
            title,
            description,
            due,
            priority,
            category,
            color,
        } => {
            let category = match category.as_deref() {
                Some(needle) => planner.resolve_category(needle)?.id.clone(),
                None => query::categories_for_tasks(planner.categories())
                    .first()
                    .map(|c| c.id.clone())
                    .unwrap_or_default(),
            };
            let color = match color.as_deref() {
                Some(raw) => parse_color(raw)?,
                None => planner.category_color(&category),
            };
            let draft = NewTask {
                title: title.trim().to_string(),
                description: description.filter(|d| !d.trim().is_empty()),
                due_date: due.as_deref().map(parse_local).transpose()?,
                priority,
                category,
                color,
            };
            draft.validate()?;
            let task = planner.add_task(draft).context("saving task")?;
            println!("Added task {} ({})", task.id, task.title);
        }
        TaskCommand::List {
            view,
            sort,
            priority,
            category,
            search,
        } => {
            let mut tasks = query::task_view(planner.tasks(), view, sort, &now);
            if let Some(priority) = priority {
                tasks.retain(|t| t.priority == priority);
            }
            if let Some(needle) = category.as_deref() {
                let id = planner.resolve_category(needle)?.id.clone();
                tasks.retain(|t| t.category == id);
            }
            if let Some(text) = search.as_deref() {
                tasks.retain(|t| query::matches_text(*t, text));
            }
            println!("Tasks: {} (sorted by {})", view.label(), sort.label());
            if tasks.is_empty() {
                println!("  (empty)");
            }
            for task in tasks {
                print_task(&planner, task, &now);
            }
        }
        TaskCommand::Edit {
            id,
            title,
            description,
            clear_description,
            due,
            clear_due,
            priority,
            category,
            color,
        } => {
            let current = planner.resolve_task(&id)?.clone();
            let category = match category.as_deref() {
                Some(needle) => Some(planner.resolve_category(needle)?.id.clone()),
                None => None,
            };
            let due_date = if clear_due {
                Some(None)
            } else {
                due.as_deref().map(parse_local).transpose()?.map(Some)
            };
            let patch = TaskPatch {
                title: title.map(|t| t.trim().to_string()),
                description: if clear_description {
                    Some(None)
                } else {
                    description.map(Some)
                },
                due_date,
                priority,
                completed: None,
                category,
                color: color.as_deref().map(parse_color).transpose()?,
            };
            if patch.is_empty() {
                bail!("nothing to change for task {}", current.id);
            }
            if patch.title.as_deref().is_some_and(|t| t.is_empty()) {
                bail!("title must not be empty");
            }
            planner
                .update_task(&current.id, &patch)
                .with_context(|| format!("updating task {}", current.id))?;
            println!("Updated task {}", current.id);
        }
        TaskCommand::Done { id } => {
            let target = planner.resolve_task(&id)?.id.clone();
            if let Some(task) = planner
                .toggle_task(&target)
                .with_context(|| format!("updating task {}", target))?
            {
                let state = if task.completed { "done" } else { "not done" };
                println!("Marked task {} {}", task.id, state);
            }
        }
        TaskCommand::Rm { id } => {
            let task = planner.resolve_task(&id)?.clone();
            planner
                .remove_task(&task.id)
                .with_context(|| format!("removing task {}", task.id))?;
            println!("Removed task {} ({})", task.id, task.title);
        }
        TaskCommand::Stats => {
            let stats = query::task_stats(planner.tasks(), &now);
            println!(
                "Tasks: {} total, {} completed, {} pending",
                stats.total, stats.completed, stats.pending
            );
            println!("Overdue: {}  Due today: {}", stats.overdue, stats.due_today);
            println!("Completion: {}%", stats.completion_rate);
        }
        TaskCommand::Upcoming => {
            let upcoming = query::upcoming_tasks(planner.tasks(), &now);
            if upcoming.is_empty() {
                println!("No open tasks due in the next {} days", query::UPCOMING_DAYS);
            }
            for task in upcoming {
                print_task(&planner, task, &now);
            }
        }
    }
    Ok(())
}

pub fn category(data_dir: Option<&Path>, command: CategoryCommand) -> Result<()> {
    let (mut planner, _) = open(data_dir)?;
    match command {
        CategoryCommand::Add { name, color, kind } => {
            let color = match color.as_deref() {
                Some(raw) => parse_color(raw)?,
                None => DEFAULT_COLORS[0].to_string(),
            };
            let draft = NewCategory {
                name: name.trim().to_string(),
                color,
                kind,
            };
            draft.validate()?;
            let category = planner.add_category(draft).context("saving category")?;
            println!("Added category {} ({})", category.id, category.name);
        }
        CategoryCommand::List => {
            for category in planner.categories() {
                print_category(&planner, category);
            }
        }
        CategoryCommand::Edit {
            id,
            name,
            color,
            kind,
        } => {
            let current = planner.resolve_category(&id)?.clone();
            let patch = CategoryPatch {
                name: name.map(|n| n.trim().to_string()),
                color: color.as_deref().map(parse_color).transpose()?,
                kind,
            };
            if patch.name.as_deref().is_some_and(|n| n.is_empty()) {
                bail!("name must not be empty");
            }
            planner
                .update_category(&current.id, &patch)
                .with_context(|| format!("updating category {}", current.id))?;
            println!("Updated category {}", current.id);
        }
        CategoryCommand::Rm { id, force } => {
            let current = planner.resolve_category(&id)?.clone();
            let usage = planner.category_usage(&current.id);
            if usage > 0 && !force {
                bail!(
                    "category {} is used by {} item(s); pass --force to delete it anyway",
                    current.name,
                    usage
                );
            }
            if usage > 0 {
                warn!(category = %current.id, usage, "deleting a category that is still referenced");
                println!("{} item(s) will show as Uncategorized", usage);
            }
            planner
                .remove_category(&current.id)
                .with_context(|| format!("removing category {}", current.id))?;
            println!("Removed category {} ({})", current.id, current.name);
        }
    }
    Ok(())
}

pub fn settings(data_dir: Option<&Path>, command: SettingsCommand) -> Result<()> {
    let (mut planner, location) = open(data_dir)?;
    match command {
        SettingsCommand::Show => {
            println!(
                "Data: {} ({})",
                location.dir.display(),
                location.scope.label()
            );
            print_settings(planner.settings());
        }
        SettingsCommand::Set {
            theme,
            default_view,
            week_starts_on,
            time_format,
            default_event_duration,
            show_weekends,
        } => {
            let patch = SettingsPatch {
                theme,
                default_view,
                week_starts_on,
                time_format,
                default_event_duration: default_event_duration
                    .map(validate_duration)
                    .transpose()?,
                show_weekends,
            };
            if patch.is_empty() {
                bail!("nothing to change; pass at least one setting");
            }
            let settings = planner
                .update_settings(&patch)
                .context("saving settings")?;
            print_settings(settings);
        }
    }
    Ok(())
}

pub fn calendar(data_dir: Option<&Path>, view: Option<CalendarView>, date: Option<String>) -> Result<()> {
    let (planner, _) = open(data_dir)?;
    let settings = planner.settings().clone();
    let view = view.unwrap_or(settings.default_view);
    let anchor = match date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => planner.today(),
    };
    let (first, last) = view_range(anchor, view, settings.week_starts_on);
    match view {
        CalendarView::Month => print_month(&planner, anchor, &settings),
        CalendarView::Week => {
            println!("Week of {}", first.format("%b %-d, %Y"));
            for day in week_grid(anchor, settings.week_starts_on) {
                if !settings.show_weekends && calendar::is_weekend(day) {
                    continue;
                }
                print_day_agenda(&planner, day, settings.time_format);
            }
        }
        CalendarView::Day => print_day_slots(&planner, anchor, settings.time_format),
    }
    let tasks = first
        .iter_days()
        .take_while(|d| *d <= last)
        .flat_map(|d| query::tasks_due_on(planner.tasks(), d, &Local))
        .filter(|t| !t.completed)
        .count();
    if tasks > 0 {
        println!();
        println!("{} open task(s) due in this range", tasks);
    }
    Ok(())
}

pub fn export(data_dir: Option<&Path>, output: Option<PathBuf>, format: DocumentFormat) -> Result<()> {
    let (mut planner, _) = open(data_dir)?;
    let document = planner.export_document();
    let path = output.unwrap_or_else(|| PathBuf::from(default_file_name(planner.now(), format)));
    let text = render(&document, format)?;
    fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
    println!(
        "Exported {} events, {} tasks, {} categories to {}",
        document.events.len(),
        document.tasks.len(),
        document.categories.len(),
        path.display()
    );
    Ok(())
}

pub fn import(data_dir: Option<&Path>, file: PathBuf) -> Result<()> {
    let (mut planner, _) = open(data_dir)?;
    let text = fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
    let summary = planner
        .import_document(&text, DocumentFormat::from_path(&file))
        .with_context(|| format!("importing {}", file.display()))?;
    if summary.is_empty() {
        println!("Nothing to import in {}", file.display());
        return Ok(());
    }
    let mut parts = Vec::new();
    if let Some(n) = summary.events {
        parts.push(format!("{} events", n));
    }
    if let Some(n) = summary.tasks {
        parts.push(format!("{} tasks", n));
    }
    if let Some(n) = summary.categories {
        parts.push(format!("{} categories", n));
    }
    if summary.settings {
        parts.push("settings".to_string());
    }
    println!("Imported {} from {}", parts.join(", "), file.display());
    Ok(())
}

pub fn tui(location: DataLocation) -> Result<()> {
    let planner = open_at(&location)?;
    ui::run(planner, location)
}

fn pattern(kind: RecurrenceKind, interval: u32, until: Option<&str>) -> Result<RecurringPattern> {
    if interval == 0 {
        bail!("interval must be at least 1");
    }
    let end_date = match until {
        Some(raw) => Some(calendar::end_of_day(parse_date(raw)?, &Local)),
        None => None,
    };
    Ok(RecurringPattern {
        kind,
        interval,
        end_date,
        days_of_week: None,
        day_of_month: None,
    })
}

/// The pattern patch for `event edit`. `--repeat` without `--until` keeps
/// the current end date; `--until` alone moves the end of the current pattern.
fn repeat_change(
    current: Option<&RecurringPattern>,
    fields: &EventEdit,
) -> Result<Option<Option<RecurringPattern>>> {
    if fields.clear_repeat {
        return Ok(Some(None));
    }
    let until = fields.until.as_deref();
    match (fields.repeat, current) {
        (Some(kind), _) => {
            let mut next = pattern(kind, fields.interval, until)?;
            if until.is_none() {
                next.end_date = current.and_then(|p| p.end_date);
            }
            Ok(Some(Some(next)))
        }
        (None, Some(existing)) if until.is_some() => {
            let mut next = existing.clone();
            next.end_date = pattern(existing.kind, existing.interval, until)?.end_date;
            Ok(Some(Some(next)))
        }
        (None, None) if until.is_some() => {
            bail!("--until needs --repeat on an event that does not repeat")
        }
        (None, _) => Ok(None),
    }
}

/// Accepts `#rrggbb`, with or without the leading `#`.
pub fn parse_color(raw: &str) -> Result<String> {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("invalid color (use #rrggbb): {}", raw);
    }
    Ok(format!("#{}", hex.to_ascii_lowercase()))
}

fn local(dt: DateTime<Utc>) -> DateTime<Local> {
    dt.with_timezone(&Local)
}

fn print_event(planner: &LocalPlanner, event: &Event) {
    let tf = planner.settings().time_format;
    let start = local(event.start_date);
    let end = local(event.end_date);
    println!(
        "  - {}: {}  [{}]",
        event.id,
        event.title,
        planner.category_name(&event.category)
    );
    let end_text = if start.date_naive() == end.date_naive() {
        format_time(&end, tf)
    } else {
        format_date_time(&end, tf)
    };
    println!("    {} -> {}", format_date_time(&start, tf), end_text);
    if let Some(desc) = &event.description {
        println!("    {}", desc);
    }
    if let Some(pattern) = &event.recurring_pattern {
        println!(
            "    repeats {} every {}",
            pattern.kind.label(),
            pattern.interval
        );
    }
}

fn print_task(planner: &LocalPlanner, task: &Task, now: &DateTime<Local>) {
    let mark = if task.completed { "x" } else { " " };
    println!(
        "  - [{}] {}: {} ({})  [{}]",
        mark,
        task.id,
        task.title,
        task.priority,
        planner.category_name(&task.category)
    );
    if let Some(desc) = &task.description {
        println!("    {}", desc);
    }
    if let Some(due) = task.due_date {
        let due = local(due);
        let overdue = if query::is_overdue(task, now) {
            " (overdue)"
        } else {
            ""
        };
        println!(
            "    due: {} {} [{}]{}",
            relative_date(due.date_naive(), now.date_naive()),
            format_time(&due, planner.settings().time_format),
            format_input(&due),
            overdue
        );
    }
}

fn print_category(planner: &LocalPlanner, category: &Category) {
    println!(
        "  - {}: {} {} ({}), used by {}",
        category.id,
        category.name,
        category.color,
        category.kind,
        planner.category_usage(&category.id)
    );
}

fn print_settings(settings: &AppSettings) {
    println!("theme: {}", settings.theme.label());
    println!("default view: {}", settings.default_view.label());
    println!("week starts on: {:?}", settings.week_starts_on);
    println!("time format: {}", settings.time_format.label());
    println!(
        "default event duration: {} min",
        settings.default_event_duration
    );
    println!("show weekends: {}", settings.show_weekends);
}

fn print_month(planner: &LocalPlanner, anchor: NaiveDate, settings: &AppSettings) {
    let now = planner.now_local();
    let visible = |date: NaiveDate| settings.show_weekends || !calendar::is_weekend(date);
    let grid = month_grid(anchor, settings.week_starts_on);
    println!("{}", anchor.format("%B %Y"));
    let header: String = weekday_labels(settings.week_starts_on)
        .iter()
        .zip(&grid)
        .filter(|(_, day)| visible(day.date))
        .map(|(label, _)| format!("{:>5}", label))
        .collect();
    println!("{}", header);
    for row in grid.chunks(calendar::WEEK_DAYS) {
        let line: String = row
            .iter()
            .filter(|day| visible(day.date))
            .map(|day| {
                let busy = !query::events_on_day(planner.events(), day.date, &Local).is_empty();
                let marker = if calendar::is_today(day.date, &now) {
                    '*'
                } else if busy {
                    '+'
                } else {
                    ' '
                };
                let number = if day.in_month {
                    day.date.format("%-d").to_string()
                } else {
                    ".".to_string()
                };
                format!("{:>4}{}", number, marker)
            })
            .collect();
        println!("{}", line);
    }
    println!("(* today, + has events)");
}

fn print_day_agenda(planner: &LocalPlanner, day: NaiveDate, tf: TimeFormat) {
    println!();
    println!("{}", day.format("%a %b %-d"));
    let events = query::agenda(planner.events(), day, &Local);
    if events.is_empty() {
        println!("  (no events)");
    }
    for event in events {
        println!(
            "  {} - {}  {}  [{}]",
            format_time(&local(event.start_date), tf),
            format_time(&local(event.end_date), tf),
            event.title,
            planner.category_name(&event.category)
        );
    }
}

fn print_day_slots(planner: &LocalPlanner, day: NaiveDate, tf: TimeFormat) {
    println!("{}", day.format("%A, %B %-d, %Y"));
    let events = query::agenda(planner.events(), day, &Local);
    for slot in calendar::day_slots(day) {
        let minute = slot.hour() * 60;
        let label = match tf {
            TimeFormat::TwentyFourHour => slot.format("%H:%M").to_string(),
            TimeFormat::TwelveHour => slot.format("%l %p").to_string(),
        };
        let titles: Vec<&str> = events
            .iter()
            .filter(|e| {
                event_block(e, day, &Local).is_some_and(|b| {
                    b.top_minutes < minute + 60 && b.top_minutes + b.height_minutes > minute
                })
            })
            .map(|e| e.title.as_str())
            .collect();
        let mark = if calendar::is_business_hour(slot) { "|" } else { ":" };
        println!("{:>8} {} {}", label, mark, titles.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_are_normalised() {
        assert_eq!(parse_color("#3B82F6").unwrap(), "#3b82f6");
        assert_eq!(parse_color("10b981").unwrap(), "#10b981");
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("blue").is_err());
    }

    #[test]
    fn zero_interval_patterns_are_refused() {
        assert!(pattern(RecurrenceKind::Weekly, 0, None).is_err());
        let weekly = pattern(RecurrenceKind::Weekly, 2, None).unwrap();
        assert_eq!(weekly.interval, 2);
        assert!(weekly.end_date.is_none());
    }

    fn edit(repeat: Option<RecurrenceKind>, interval: u32, until: Option<&str>) -> EventEdit {
        EventEdit {
            title: None,
            start: None,
            end: None,
            description: None,
            clear_description: false,
            category: None,
            color: None,
            repeat,
            interval,
            until: until.map(str::to_string),
            clear_repeat: false,
        }
    }

    #[test]
    fn repeat_edits_keep_or_move_the_end_date() {
        let current = pattern(RecurrenceKind::Weekly, 1, Some("2024.12.31")).unwrap();
        let end = current.end_date;
        assert!(end.is_some());

        let monthly = repeat_change(Some(&current), &edit(Some(RecurrenceKind::Monthly), 2, None))
            .unwrap()
            .flatten()
            .unwrap();
        assert_eq!(monthly.kind, RecurrenceKind::Monthly);
        assert_eq!(monthly.interval, 2);
        assert_eq!(monthly.end_date, end);

        let moved = repeat_change(Some(&current), &edit(None, 1, Some("2025.06.30")))
            .unwrap()
            .flatten()
            .unwrap();
        assert_eq!(moved.kind, RecurrenceKind::Weekly);
        assert_eq!(
            moved.end_date,
            pattern(RecurrenceKind::Weekly, 1, Some("2025.06.30")).unwrap().end_date
        );

        assert_eq!(repeat_change(Some(&current), &edit(None, 1, None)).unwrap(), None);
        assert!(repeat_change(None, &edit(None, 1, Some("2025.06.30"))).is_err());

        let mut cleared = edit(None, 1, None);
        cleared.clear_repeat = true;
        assert_eq!(repeat_change(Some(&current), &cleared).unwrap(), Some(None));
    }
}
