use chrono::{DateTime, TimeZone};

use crate::error::CoreError;
use crate::models::{HolidayRecord, HolidayTable};

pub const MAX_UPCOMING_HOLIDAYS: usize = 5;
pub const NO_UPCOMING_HOLIDAYS: &str = "🎉 No upcoming holidays found in the calendar.";
pub const HOLIDAYS_HEADER: &str = "🎉 Upcoming holidays:";

// Authored in chronological order; ranges are inclusive.
const BUILTIN_HOLIDAYS: &[(&str, &str)] = &[
    ("Coptic Christmas", "2026-01-07"),
    ("January 25 Revolution Day", "2026-01-25"),
    ("Eid al-Fitr", "2026-03-20 to 2026-03-23"),
    ("Sham El-Nessim", "2026-04-13"),
    ("Sinai Liberation Day", "2026-04-25"),
    ("Labour Day", "2026-05-01"),
    ("Arafat Day", "2026-05-26"),
    ("Eid al-Adha", "2026-05-27 to 2026-05-30"),
    ("Islamic New Year", "2026-06-16"),
    ("June 30 Revolution Day", "2026-06-30"),
    ("July 23 Revolution Day", "2026-07-23"),
    ("Prophet's Birthday", "2026-08-25"),
    ("Armed Forces Day", "2026-10-06"),
    ("Winter Break", "2026-12-24 to 2027-01-02"),
    ("Coptic Christmas", "2027-01-07"),
    ("January 25 Revolution Day", "2027-01-25"),
    ("Mid-Year Break", "2027-01-30 to 2027-02-06"),
    ("Eid al-Fitr", "2027-03-10 to 2027-03-13"),
    ("Sinai Liberation Day", "2027-04-25"),
    ("Sham El-Nessim", "2027-05-03"),
];

impl HolidayTable {
    /// The bundled holiday calendar. Parsed at startup so a malformed entry
    /// fails the boot instead of a reply.
    pub fn builtin() -> Result<Self, CoreError> {
        Self::from_entries(BUILTIN_HOLIDAYS)
    }
}

/// Holidays ending today or later, in table order, capped at
/// [`MAX_UPCOMING_HOLIDAYS`].
pub fn upcoming_holidays<'a, Tz: TimeZone>(
    now: &DateTime<Tz>,
    holidays: &'a HolidayTable,
) -> Vec<&'a HolidayRecord> {
    let today = now.date_naive();
    holidays
        .iter()
        .filter(|record| record.date.comparison_date() >= today)
        .take(MAX_UPCOMING_HOLIDAYS)
        .collect()
}

pub fn render_holidays<Tz: TimeZone>(now: &DateTime<Tz>, holidays: &HolidayTable) -> String {
    let upcoming = upcoming_holidays(now, holidays);
    if upcoming.is_empty() {
        return NO_UPCOMING_HOLIDAYS.to_string();
    }

    let blocks = upcoming
        .iter()
        .map(|record| format!("• *{}*\n  📅 {}", record.name, record.raw))
        .collect::<Vec<_>>();

    format!("{}\n\n{}", HOLIDAYS_HEADER, blocks.join("\n\n"))
}
