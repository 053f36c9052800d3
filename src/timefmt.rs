use crate::model::TimeFormat;
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

const DATE_TIME_FORMATS: [&str; 3] = ["%Y.%m.%d@%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"];
const DATE_FORMATS: [&str; 2] = ["%Y.%m.%d", "%Y-%m-%d"];

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("invalid date format (use YYYY.MM.DD@hh:mm or YYYY.MM.DD): {0}")]
pub struct InvalidDate(pub String);

/// Parses a wall-clock date or date-time in `tz`. A bare date means midnight.
pub fn parse_in<Tz: TimeZone>(input: &str, tz: &Tz) -> Result<DateTime<Utc>, InvalidDate> {
    let raw = input.trim();
    let naive = DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| parse_date(raw).ok().map(|d| d.and_time(Default::default())))
        .ok_or_else(|| InvalidDate(raw.to_string()))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| InvalidDate(raw.to_string()))
}

pub fn parse_local(input: &str) -> Result<DateTime<Utc>, InvalidDate> {
    parse_in(input, &Local)
}

pub fn parse_date(input: &str) -> Result<NaiveDate, InvalidDate> {
    let raw = input.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| InvalidDate(raw.to_string()))
}

/// The editable form of an instant, in the same shape `parse_in` accepts.
pub fn format_input<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format("%Y.%m.%d@%H:%M").to_string()
}

pub fn format_time<Tz: TimeZone>(dt: &DateTime<Tz>, format: TimeFormat) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match format {
        TimeFormat::TwentyFourHour => dt.format("%H:%M").to_string(),
        TimeFormat::TwelveHour => dt.format("%-I:%M %p").to_string(),
    }
}

pub fn format_date_time<Tz: TimeZone>(dt: &DateTime<Tz>, format: TimeFormat) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{} at {}", dt.format("%b %-d, %Y"), format_time(dt, format))
}

/// "Today", "Tomorrow", "Yesterday", a weekday name within the current
/// Sunday-first week, "Mar 5" within the month, otherwise "Mar 5, 2024".
pub fn relative_date(date: NaiveDate, today: NaiveDate) -> String {
    let delta = date.signed_duration_since(today).num_days();
    match delta {
        0 => return "Today".to_string(),
        1 => return "Tomorrow".to_string(),
        -1 => return "Yesterday".to_string(),
        _ => {}
    }
    let week_start = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
    let week_end = week_start + Duration::days(6);
    if date >= week_start && date <= week_end {
        return date.format("%A").to_string();
    }
    if date.year() == today.year() && date.month() == today.month() {
        return date.format("%b %-d").to_string();
    }
    date.format("%b %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_dotted_and_iso_inputs() {
        let expected = Utc.with_ymd_and_hms(2024, 2, 29, 14, 5, 0).unwrap();
        assert_eq!(parse_in("2024.02.29@14:05", &Utc), Ok(expected));
        assert_eq!(parse_in("2024-02-29 14:05", &Utc), Ok(expected));
        assert_eq!(
            parse_in("2024.02.29", &Utc),
            Ok(Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap())
        );
        assert!(parse_in("29/02/2024", &Utc).is_err());
    }

    #[test]
    fn parsing_honours_the_zone() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let parsed = parse_in("2024.07.01@10:00", &plus_two).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 7, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn formats_both_clock_styles() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 5, 15, 7, 0).unwrap();
        assert_eq!(format_time(&dt, TimeFormat::TwentyFourHour), "15:07");
        assert_eq!(format_time(&dt, TimeFormat::TwelveHour), "3:07 PM");
        assert_eq!(
            format_date_time(&dt, TimeFormat::TwelveHour),
            "Mar 5, 2024 at 3:07 PM"
        );
        assert_eq!(format_input(&dt), "2024.03.05@15:07");
    }

    #[test]
    fn relative_descriptions() {
        let today = d(2024, 5, 15); // a Wednesday
        assert_eq!(relative_date(today, today), "Today");
        assert_eq!(relative_date(d(2024, 5, 16), today), "Tomorrow");
        assert_eq!(relative_date(d(2024, 5, 14), today), "Yesterday");
        assert_eq!(relative_date(d(2024, 5, 18), today), "Saturday");
        assert_eq!(relative_date(d(2024, 5, 28), today), "May 28");
        assert_eq!(relative_date(d(2023, 12, 1), today), "Dec 1, 2023");
    }
}
