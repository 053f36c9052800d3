use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type EntityId = String;

/// Palette offered for events, tasks and categories. The first entry is the
/// fallback color when nothing better is known.
pub const DEFAULT_COLORS: [&str; 10] = [
    "#3b82f6", // blue
    "#ef4444", // red
    "#10b981", // green
    "#f59e0b", // yellow
    "#8b5cf6", // purple
    "#06b6d4", // cyan
    "#f97316", // orange
    "#84cc16", // lime
    "#ec4899", // pink
    "#6b7280", // gray
];

const DEFAULT_CATEGORIES: [(&str, &str, CategoryKind); 6] = [
    ("Work", "#3b82f6", CategoryKind::Both),
    ("Personal", "#10b981", CategoryKind::Both),
    ("Health", "#ef4444", CategoryKind::Both),
    ("Education", "#8b5cf6", CategoryKind::Both),
    ("Social", "#f59e0b", CategoryKind::Event),
    ("Shopping", "#06b6d4", CategoryKind::Task),
];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EntityId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub category: EntityId,
    pub color: String,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_pattern: Option<RecurringPattern>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Repetition metadata. Kept alongside the event; occurrences are never
/// generated from it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecurringPattern {
    #[serde(rename = "type")]
    pub kind: RecurrenceKind,
    pub interval: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceKind {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: EntityId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    pub category: EntityId,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: EntityId,
    pub name: String,
    pub color: String,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Event,
    Task,
    Both,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    pub theme: Theme,
    pub default_view: CalendarView,
    pub week_starts_on: WeekStart,
    pub time_format: TimeFormat,
    pub default_event_duration: u32,
    pub show_weekends: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CalendarView {
    Month,
    Week,
    Day,
}

/// First column of the week grid. Stored as 0 (Sunday) or 1 (Monday).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub enum WeekStart {
    Sunday,
    Monday,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    #[serde(rename = "12h")]
    TwelveHour,
    #[serde(rename = "24h")]
    TwentyFourHour,
}

/// Everything an event carries before the store assigns identity and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub category: EntityId,
    pub color: String,
    pub recurring_pattern: Option<RecurringPattern>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub category: EntityId,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: String,
    pub color: String,
    pub kind: CategoryKind,
}

/// Partial update for an event. `None` leaves a field alone; the nested
/// options on optional fields distinguish "clear" from "keep".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub category: Option<EntityId>,
    pub color: Option<String>,
    pub recurring_pattern: Option<Option<RecurringPattern>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
    pub category: Option<EntityId>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub kind: Option<CategoryKind>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsPatch {
    pub theme: Option<Theme>,
    pub default_view: Option<CalendarView>,
    pub week_starts_on: Option<WeekStart>,
    pub time_format: Option<TimeFormat>,
    pub default_event_duration: Option<u32>,
    pub show_weekends: Option<bool>,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid {kind}: {value}")]
    Invalid { kind: &'static str, value: String },
}

/// Rejections raised by the forms before anything reaches the store.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("name must not be empty")]
    EmptyName,
    #[error("end must be after start")]
    EndNotAfterStart,
    #[error("duration must be positive")]
    NonPositiveDuration,
}

impl Event {
    pub fn new(id: EntityId, draft: NewEvent, now: DateTime<Utc>) -> Self {
        Event {
            id,
            title: draft.title,
            description: draft.description,
            start_date: draft.start_date,
            end_date: draft.end_date,
            category: draft.category,
            color: draft.color,
            is_recurring: draft.recurring_pattern.is_some(),
            recurring_pattern: draft.recurring_pattern,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Task {
    pub fn new(id: EntityId, draft: NewTask, now: DateTime<Utc>) -> Self {
        Task {
            id,
            title: draft.title,
            description: draft.description,
            due_date: draft.due_date,
            priority: draft.priority,
            completed: false,
            category: draft.category,
            color: draft.color,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Category {
    pub fn new(id: EntityId, draft: NewCategory, now: DateTime<Utc>) -> Self {
        Category {
            id,
            name: draft.name,
            color: draft.color,
            kind: draft.kind,
            created_at: now,
        }
    }
}

impl NewEvent {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.end_date <= self.start_date {
            return Err(ValidationError::EndNotAfterStart);
        }
        Ok(())
    }
}

impl NewTask {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(())
    }
}

impl NewCategory {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(())
    }
}

/// Checks an event after a patch would be applied to it.
pub fn validate_event(event: &Event) -> Result<(), ValidationError> {
    if event.title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if event.end_date <= event.start_date {
        return Err(ValidationError::EndNotAfterStart);
    }
    Ok(())
}

pub fn validate_duration(minutes: i64) -> Result<u32, ValidationError> {
    if minutes <= 0 {
        return Err(ValidationError::NonPositiveDuration);
    }
    u32::try_from(minutes).map_err(|_| ValidationError::NonPositiveDuration)
}

/// The six categories a fresh installation starts with, ids `default_0..5`.
pub fn default_categories(now: DateTime<Utc>) -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .enumerate()
        .map(|(idx, (name, color, kind))| Category {
            id: format!("default_{}", idx),
            name: (*name).to_string(),
            color: (*color).to_string(),
            kind: *kind,
            created_at: now,
        })
        .collect()
}

impl EventPatch {
    pub fn apply(&self, event: &mut Event) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(description) = &self.description {
            event.description = description.clone();
        }
        if let Some(start) = self.start_date {
            event.start_date = start;
        }
        if let Some(end) = self.end_date {
            event.end_date = end;
        }
        if let Some(category) = &self.category {
            event.category = category.clone();
        }
        if let Some(color) = &self.color {
            event.color = color.clone();
        }
        if let Some(pattern) = &self.recurring_pattern {
            event.is_recurring = pattern.is_some();
            event.recurring_pattern = pattern.clone();
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == EventPatch::default()
    }
}

impl TaskPatch {
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(due) = self.due_date {
            task.due_date = due;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(category) = &self.category {
            task.category = category.clone();
        }
        if let Some(color) = &self.color {
            task.color = color.clone();
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }
}

impl CategoryPatch {
    pub fn apply(&self, category: &mut Category) {
        if let Some(name) = &self.name {
            category.name = name.clone();
        }
        if let Some(color) = &self.color {
            category.color = color.clone();
        }
        if let Some(kind) = self.kind {
            category.kind = kind;
        }
    }
}

impl SettingsPatch {
    pub fn apply(&self, settings: &mut AppSettings) {
        if let Some(theme) = self.theme {
            settings.theme = theme;
        }
        if let Some(view) = self.default_view {
            settings.default_view = view;
        }
        if let Some(week_start) = self.week_starts_on {
            settings.week_starts_on = week_start;
        }
        if let Some(format) = self.time_format {
            settings.time_format = format;
        }
        if let Some(minutes) = self.default_event_duration {
            settings.default_event_duration = minutes;
        }
        if let Some(show) = self.show_weekends {
            settings.show_weekends = show;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == SettingsPatch::default()
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            theme: Theme::System,
            default_view: CalendarView::Month,
            week_starts_on: WeekStart::Sunday,
            time_format: TimeFormat::TwelveHour,
            default_event_duration: 60,
            show_weekends: true,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::System
    }
}

impl Default for CalendarView {
    fn default() -> Self {
        CalendarView::Month
    }
}

impl Default for WeekStart {
    fn default() -> Self {
        WeekStart::Sunday
    }
}

impl Default for TimeFormat {
    fn default() -> Self {
        TimeFormat::TwelveHour
    }
}

impl Priority {
    /// Ordering weight used when sorting by priority, highest first.
    pub fn weight(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl CategoryKind {
    pub fn applies_to_events(self) -> bool {
        matches!(self, CategoryKind::Event | CategoryKind::Both)
    }

    pub fn applies_to_tasks(self) -> bool {
        matches!(self, CategoryKind::Task | CategoryKind::Both)
    }

    pub fn label(self) -> &'static str {
        match self {
            CategoryKind::Event => "event",
            CategoryKind::Task => "task",
            CategoryKind::Both => "both",
        }
    }
}

impl RecurrenceKind {
    pub fn label(self) -> &'static str {
        match self {
            RecurrenceKind::Daily => "daily",
            RecurrenceKind::Weekly => "weekly",
            RecurrenceKind::Monthly => "monthly",
            RecurrenceKind::Yearly => "yearly",
        }
    }
}

impl CalendarView {
    pub fn label(self) -> &'static str {
        match self {
            CalendarView::Month => "month",
            CalendarView::Week => "week",
            CalendarView::Day => "day",
        }
    }
}

impl Theme {
    pub fn label(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }
}

impl TimeFormat {
    pub fn label(self) -> &'static str {
        match self {
            TimeFormat::TwelveHour => "12h",
            TimeFormat::TwentyFourHour => "24h",
        }
    }
}

impl WeekStart {
    pub fn weekday(self) -> chrono::Weekday {
        match self {
            WeekStart::Sunday => chrono::Weekday::Sun,
            WeekStart::Monday => chrono::Weekday::Mon,
        }
    }
}

impl TryFrom<u8> for WeekStart {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(WeekStart::Sunday),
            1 => Ok(WeekStart::Monday),
            other => Err(format!("weekStartsOn must be 0 or 1, got {}", other)),
        }
    }
}

impl From<WeekStart> for u8 {
    fn from(value: WeekStart) -> Self {
        match value {
            WeekStart::Sunday => 0,
            WeekStart::Monday => 1,
        }
    }
}

fn invalid(kind: &'static str, value: &str) -> ParseError {
    ParseError::Invalid {
        kind,
        value: value.to_string(),
    }
}

impl FromStr for Priority {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "l" => Ok(Priority::Low),
            "medium" | "med" | "m" => Ok(Priority::Medium),
            "high" | "h" => Ok(Priority::High),
            _ => Err(invalid("priority", s)),
        }
    }
}

impl FromStr for CategoryKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "event" => Ok(CategoryKind::Event),
            "task" => Ok(CategoryKind::Task),
            "both" => Ok(CategoryKind::Both),
            _ => Err(invalid("category type", s)),
        }
    }
}

impl FromStr for RecurrenceKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(RecurrenceKind::Daily),
            "weekly" => Ok(RecurrenceKind::Weekly),
            "monthly" => Ok(RecurrenceKind::Monthly),
            "yearly" => Ok(RecurrenceKind::Yearly),
            _ => Err(invalid("recurrence", s)),
        }
    }
}

impl FromStr for CalendarView {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "month" => Ok(CalendarView::Month),
            "week" => Ok(CalendarView::Week),
            "day" => Ok(CalendarView::Day),
            _ => Err(invalid("view", s)),
        }
    }
}

impl FromStr for Theme {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            _ => Err(invalid("theme", s)),
        }
    }
}

impl FromStr for WeekStart {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "sun" | "sunday" => Ok(WeekStart::Sunday),
            "1" | "mon" | "monday" => Ok(WeekStart::Monday),
            _ => Err(invalid("week start", s)),
        }
    }
}

impl FromStr for TimeFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "12h" | "12" => Ok(TimeFormat::TwelveHour),
            "24h" | "24" => Ok(TimeFormat::TwentyFourHour),
            _ => Err(invalid("time format", s)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, h, 0, 0).unwrap()
    }

    #[test]
    fn default_categories_match_the_seed_table() {
        let cats = default_categories(at(8));
        let names: Vec<&str> = cats.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            ["Work", "Personal", "Health", "Education", "Social", "Shopping"]
        );
        assert_eq!(cats[0].id, "default_0");
        assert_eq!(cats[4].kind, CategoryKind::Event);
        assert_eq!(cats[5].kind, CategoryKind::Task);
        assert_eq!(cats[5].color, "#06b6d4");
    }

    #[test]
    fn event_serializes_with_camel_case_and_type_keys() {
        let draft = NewEvent {
            title: "Standup".into(),
            description: None,
            start_date: at(9),
            end_date: at(10),
            category: "default_0".into(),
            color: DEFAULT_COLORS[0].into(),
            recurring_pattern: Some(RecurringPattern {
                kind: RecurrenceKind::Weekly,
                interval: 1,
                end_date: None,
                days_of_week: Some(vec![1, 3]),
                day_of_month: None,
            }),
        };
        let event = Event::new("abc".into(), draft, at(8));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["startDate"], "2024-03-10T09:00:00Z");
        assert_eq!(json["isRecurring"], true);
        assert_eq!(json["recurringPattern"]["type"], "weekly");
        assert_eq!(json["recurringPattern"]["daysOfWeek"][1], 3);
        assert!(json.get("description").is_none());
    }

    #[test]
    fn settings_fill_missing_fields_from_defaults() {
        let parsed: AppSettings =
            serde_json::from_str(r#"{"theme":"dark","weekStartsOn":1,"timeFormat":"24h"}"#)
                .unwrap();
        assert_eq!(parsed.theme, Theme::Dark);
        assert_eq!(parsed.week_starts_on, WeekStart::Monday);
        assert_eq!(parsed.time_format, TimeFormat::TwentyFourHour);
        assert_eq!(parsed.default_event_duration, 60);
        assert!(parsed.show_weekends);
    }

    #[test]
    fn week_start_rejects_out_of_range_numbers() {
        assert!(serde_json::from_str::<AppSettings>(r#"{"weekStartsOn":3}"#).is_err());
    }

    #[test]
    fn patch_clears_optional_fields_only_when_asked() {
        let mut task = Task::new(
            "t1".into(),
            NewTask {
                title: "Buy milk".into(),
                description: Some("2 litres".into()),
                due_date: Some(at(18)),
                priority: Priority::Low,
                category: "default_5".into(),
                color: "#06b6d4".into(),
            },
            at(8),
        );
        TaskPatch {
            priority: Some(Priority::High),
            ..TaskPatch::default()
        }
        .apply(&mut task);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.due_date, Some(at(18)));

        TaskPatch {
            due_date: Some(None),
            description: Some(None),
            ..TaskPatch::default()
        }
        .apply(&mut task);
        assert_eq!(task.due_date, None);
        assert_eq!(task.description, None);
        assert_eq!(task.title, "Buy milk");
    }

    #[test]
    fn clearing_the_pattern_clears_the_recurring_flag() {
        let mut event = Event::new(
            "e1".into(),
            NewEvent {
                title: "Gym".into(),
                description: None,
                start_date: at(6),
                end_date: at(7),
                category: "default_2".into(),
                color: "#ef4444".into(),
                recurring_pattern: Some(RecurringPattern {
                    kind: RecurrenceKind::Daily,
                    interval: 2,
                    end_date: None,
                    days_of_week: None,
                    day_of_month: None,
                }),
            },
            at(5),
        );
        assert!(event.is_recurring);
        EventPatch {
            recurring_pattern: Some(None),
            ..EventPatch::default()
        }
        .apply(&mut event);
        assert!(!event.is_recurring);
        assert!(event.recurring_pattern.is_none());
    }

    #[test]
    fn enums_parse_from_user_input() {
        assert_eq!("HIGH".parse::<Priority>(), Ok(Priority::High));
        assert_eq!("monday".parse::<WeekStart>(), Ok(WeekStart::Monday));
        assert_eq!("24h".parse::<TimeFormat>(), Ok(TimeFormat::TwentyFourHour));
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!(Priority::High.weight(), 3);
        assert_eq!(Priority::Low.weight(), 1);
    }

    #[test]
    fn forms_reject_blank_titles_and_backwards_ranges() {
        let mut draft = NewEvent {
            title: "  ".into(),
            description: None,
            start_date: at(9),
            end_date: at(10),
            category: "default_0".into(),
            color: DEFAULT_COLORS[0].into(),
            recurring_pattern: None,
        };
        assert_eq!(draft.validate(), Err(ValidationError::EmptyTitle));
        draft.title = "Dentist".into();
        assert_eq!(draft.validate(), Ok(()));
        draft.end_date = at(9);
        assert_eq!(draft.validate(), Err(ValidationError::EndNotAfterStart));
        assert_eq!(validate_duration(0), Err(ValidationError::NonPositiveDuration));
        assert_eq!(validate_duration(45), Ok(45));
    }
}
