//! Picking the service date a bulletin is built for.

use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;

/// Format of service-date keys in the parameter table.
pub const SERVICE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an English weekday name ("sunday") or abbreviation ("sun").
pub fn parse_weekday(value: &str) -> Option<Weekday> {
    match value.trim().to_ascii_lowercase().as_str() {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thur" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

pub fn parse_timezone(value: &str) -> Option<Tz> {
    value.trim().parse::<Tz>().ok()
}

/// Today's date as observed in `timezone`.
pub fn today_in(timezone: Tz) -> NaiveDate {
    Utc::now().with_timezone(&timezone).date_naive()
}

/// The next occurrence of `weekday` on or after `today`, moved by
/// `weeks_offset` weeks (negative looks back at past bulletins).
///
/// Returns `None` when the offset lands outside the supported calendar range.
pub fn find_service_date(
    today: NaiveDate,
    weekday: Weekday,
    weeks_offset: i32,
) -> Option<NaiveDate> {
    let today_num = today.weekday().num_days_from_monday();
    let target_num = weekday.num_days_from_monday();
    let days_until = (target_num + 7 - today_num) % 7;

    today
        .checked_add_signed(Duration::days(days_until as i64))?
        .checked_add_signed(Duration::try_weeks(weeks_offset as i64)?)
}

/// Parameter-table key for `date`.
pub fn service_date_key(date: NaiveDate) -> String {
    date.format(SERVICE_DATE_FORMAT).to_string()
}

pub fn parse_service_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), SERVICE_DATE_FORMAT).ok()
}

/// Long-form date for the bulletin cover, e.g. "August 20th, 2023".
pub fn display_date(date: NaiveDate) -> String {
    let day = date.day();
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{} {day}{suffix}, {}", date.format("%B"), date.year())
}
