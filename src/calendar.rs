//! Date sequences and layout arithmetic for the month, week and day views.
//!
//! Everything here works on calendar dates (`NaiveDate`) in the viewer's
//! zone; instants are only touched when an event has to be placed on a day.

use crate::model::{CalendarView, Event, WeekStart};
use chrono::{
    DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike,
    Utc, Weekday,
};

pub const MONTH_GRID_DAYS: usize = 42;
pub const WEEK_DAYS: usize = 7;
pub const HOURS_PER_DAY: u32 = 24;
pub const MINUTES_PER_DAY: u32 = 24 * 60;
/// Shortest block the day view draws, so brief events stay clickable.
pub const MIN_BLOCK_MINUTES: u32 = 30;
pub const DEFAULT_PX_PER_HOUR: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDay {
    pub date: NaiveDate,
    /// False for the leading and trailing days borrowed from adjacent months.
    pub in_month: bool,
}

/// Vertical placement of an event in a day column, in minutes from midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventBlock {
    pub top_minutes: u32,
    pub height_minutes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Prev,
    Next,
}

impl EventBlock {
    pub fn scaled(&self, px_per_hour: f32) -> (f32, f32) {
        let per_minute = px_per_hour / 60.0;
        (
            self.top_minutes as f32 * per_minute,
            self.height_minutes as f32 * per_minute,
        )
    }
}

pub fn start_of_week(date: NaiveDate, week_start: WeekStart) -> NaiveDate {
    let offset = match week_start {
        WeekStart::Sunday => date.weekday().num_days_from_sunday(),
        WeekStart::Monday => date.weekday().num_days_from_monday(),
    };
    date - Duration::days(offset as i64)
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Six full weeks starting on the week start on or before the 1st of `anchor`'s month.
pub fn month_grid(anchor: NaiveDate, week_start: WeekStart) -> Vec<GridDay> {
    let first = first_of_month(anchor);
    start_of_week(first, week_start)
        .iter_days()
        .take(MONTH_GRID_DAYS)
        .map(|date| GridDay {
            date,
            in_month: is_same_month(date, first),
        })
        .collect()
}

pub fn week_grid(anchor: NaiveDate, week_start: WeekStart) -> Vec<NaiveDate> {
    start_of_week(anchor, week_start)
        .iter_days()
        .take(WEEK_DAYS)
        .collect()
}

/// The start of each hour of `date`, midnight first.
pub fn day_slots(date: NaiveDate) -> Vec<NaiveDateTime> {
    let midnight = date.and_time(NaiveTime::default());
    (0..HOURS_PER_DAY as i64)
        .map(|hour| midnight + Duration::hours(hour))
        .collect()
}

/// Inclusive first and last date a view shows for `date`.
pub fn view_range(date: NaiveDate, view: CalendarView, week_start: WeekStart) -> (NaiveDate, NaiveDate) {
    match view {
        CalendarView::Month => (first_of_month(date), last_of_month(date)),
        CalendarView::Week => {
            let start = start_of_week(date, week_start);
            (start, start + Duration::days(6))
        }
        CalendarView::Day => (date, date),
    }
}

/// Moves one view unit. Months roll over by calendar, clamping the day to the
/// target month's length (Jan 31 + 1 month = Feb 28/29).
pub fn navigate(date: NaiveDate, view: CalendarView, step: Step) -> NaiveDate {
    let moved = match (view, step) {
        (CalendarView::Month, Step::Next) => date.checked_add_months(Months::new(1)),
        (CalendarView::Month, Step::Prev) => date.checked_sub_months(Months::new(1)),
        (CalendarView::Week, Step::Next) => date.checked_add_signed(Duration::weeks(1)),
        (CalendarView::Week, Step::Prev) => date.checked_sub_signed(Duration::weeks(1)),
        (CalendarView::Day, Step::Next) => date.succ_opt(),
        (CalendarView::Day, Step::Prev) => date.pred_opt(),
    };
    moved.unwrap_or(date)
}

pub fn is_today<Tz: TimeZone>(date: NaiveDate, now: &DateTime<Tz>) -> bool {
    date == now.date_naive()
}

pub fn is_same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

pub fn weekday_labels(week_start: WeekStart) -> [&'static str; 7] {
    match week_start {
        WeekStart::Sunday => ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"],
        WeekStart::Monday => ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// First instant of `date` in `tz`. When a DST jump skips midnight this is
/// the first wall-clock minute of the day that exists.
pub fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::default());
    (0..MINUTES_PER_DAY as i64)
        .find_map(|minute| {
            tz.from_local_datetime(&(midnight + Duration::minutes(minute)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Last millisecond of `date` in `tz`.
pub fn end_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let next = date.succ_opt().unwrap_or(date);
    start_of_day(next, tz) - Duration::milliseconds(1)
}

pub fn local_date<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

pub fn is_multi_day<Tz: TimeZone>(event: &Event, tz: &Tz) -> bool {
    local_date(event.start_date, tz) != local_date(event.end_date, tz)
}

pub fn duration_hours(event: &Event) -> f64 {
    (event.end_date - event.start_date).num_milliseconds() as f64 / 3_600_000.0
}

/// Monday to Friday, 09:00 to 17:00.
pub fn is_business_hour(at: NaiveDateTime) -> bool {
    let weekday = at.weekday().num_days_from_sunday();
    (1..=5).contains(&weekday) && (9..17).contains(&at.hour())
}

/// Where `event` sits in the column for `date`, or `None` if it does not
/// touch that day. Parts outside the day are clipped to midnight.
pub fn event_block<Tz: TimeZone>(event: &Event, date: NaiveDate, tz: &Tz) -> Option<EventBlock> {
    let day_start = start_of_day(date, tz);
    let day_end = end_of_day(date, tz);
    if event.start_date > day_end || event.end_date < day_start {
        return None;
    }
    let minutes_into_day = |at: DateTime<Utc>| {
        let clamped = at.clamp(day_start, day_end);
        ((clamped - day_start).num_minutes().max(0) as u32).min(MINUTES_PER_DAY)
    };
    let top = minutes_into_day(event.start_date);
    let bottom = if event.end_date > day_end {
        MINUTES_PER_DAY
    } else {
        minutes_into_day(event.end_date)
    };
    Some(EventBlock {
        top_minutes: top,
        height_minutes: bottom.saturating_sub(top).max(MIN_BLOCK_MINUTES),
    })
}
