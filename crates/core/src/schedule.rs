use chrono::{DateTime, Datelike, TimeZone, Weekday};

use crate::models::{DaySchedule, DayType, HolidayTable, ScheduleTable};

pub const TIME_DELIMITER: &str = " | ";
pub const TOWN_TO_CAMPUS_LABEL: &str = "Town → Campus";
pub const CAMPUS_TO_TOWN_LABEL: &str = "Campus → Town";
pub const WEEKEND_NOTE: &str = "ℹ️ Weekend/holiday timetable is in effect today. \
Times marked * are limited-stop services.";

const REGULAR_TOWN_TO_CAMPUS: &[&str] = &[
    "06:45", "07:15", "07:45", "08:15", "09:00", "10:00", "11:00", "12:30", "14:00", "15:30",
    "17:00", "18:30",
];
const REGULAR_CAMPUS_TO_TOWN: &[&str] = &[
    "08:00", "09:30", "11:30", "13:00", "14:30", "15:30", "16:30", "17:30", "18:30", "20:00",
    "21:30",
];
const WEEKEND_TOWN_TO_CAMPUS: &[&str] = &["08:00", "10:00*", "12:00", "14:00*", "16:00", "18:00"];
const WEEKEND_CAMPUS_TO_TOWN: &[&str] = &[
    "09:00", "11:00*", "13:00", "15:00*", "17:00", "19:00", "21:00*",
];

impl ScheduleTable {
    /// The timetable the community shuttle currently runs.
    pub fn builtin() -> Self {
        Self {
            regular: DaySchedule::from_times(REGULAR_TOWN_TO_CAMPUS, REGULAR_CAMPUS_TO_TOWN),
            weekend: DaySchedule::from_times(WEEKEND_TOWN_TO_CAMPUS, WEEKEND_CAMPUS_TO_TOWN),
        }
    }
}

impl DaySchedule {
    pub fn from_times(town_to_campus: &[&str], campus_to_town: &[&str]) -> Self {
        Self {
            town_to_campus: town_to_campus.iter().map(|t| t.to_string()).collect(),
            campus_to_town: campus_to_town.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Friday and Saturday form the weekend. A single-date holiday matching today
/// also switches to the weekend timetable; range holidays are not consulted.
pub fn classify_day<Tz: TimeZone>(now: &DateTime<Tz>, holidays: &HolidayTable) -> DayType {
    let today = now.date_naive();

    let is_holiday = holidays
        .iter()
        .any(|record| record.date.single_date() == Some(today));
    let is_weekend_day = matches!(now.weekday(), Weekday::Fri | Weekday::Sat);

    if is_weekend_day || is_holiday {
        DayType::Weekend
    } else {
        DayType::Regular
    }
}

pub fn render_schedule<Tz: TimeZone>(
    now: &DateTime<Tz>,
    holidays: &HolidayTable,
    table: &ScheduleTable,
) -> String {
    let day_type = classify_day(now, holidays);
    let schedule = &table[day_type];

    let mut lines = vec![
        format!("🚌 Shuttle schedule: {}", day_type.label()),
        format!("📅 {}", now.date_naive().format("%A, %-d %B %Y")),
        String::new(),
        format!("{}:", TOWN_TO_CAMPUS_LABEL),
        schedule.town_to_campus.join(TIME_DELIMITER),
        String::new(),
        format!("{}:", CAMPUS_TO_TOWN_LABEL),
        schedule.campus_to_town.join(TIME_DELIMITER),
    ];

    if day_type == DayType::Weekend {
        lines.push(String::new());
        lines.push(WEEKEND_NOTE.to_string());
    }

    lines.join("\n")
}
