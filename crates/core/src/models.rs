use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    Regular,
    Weekend,
}

impl DayType {
    pub fn as_code(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Weekend => "weekend",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Regular => "Regular weekday",
            Self::Weekend => "Weekend / holiday",
        }
    }
}

/// Departure times for one day type. Entries are `HH:MM`, optionally suffixed
/// with `*` for limited service, and are rendered exactly as authored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub town_to_campus: Vec<String>,
    pub campus_to_town: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTable {
    pub regular: DaySchedule,
    pub weekend: DaySchedule,
}

impl Index<DayType> for ScheduleTable {
    type Output = DaySchedule;

    fn index(&self, day_type: DayType) -> &Self::Output {
        match day_type {
            DayType::Regular => &self.regular,
            DayType::Weekend => &self.weekend,
        }
    }
}

/// A holiday date: one calendar day or an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSpec {
    Single(NaiveDate),
    Range { start: NaiveDate, end: NaiveDate },
}

impl DateSpec {
    pub const RANGE_SEPARATOR: &'static str = " to ";

    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let raw = raw.trim();
        match raw.split_once(Self::RANGE_SEPARATOR) {
            Some((start, end)) => {
                let start = parse_iso_date(start.trim(), raw)?;
                let end = parse_iso_date(end.trim(), raw)?;
                if end < start {
                    return Err(CoreError::InvertedRange {
                        raw: raw.to_string(),
                    });
                }
                Ok(Self::Range { start, end })
            }
            None => Ok(Self::Single(parse_iso_date(raw, raw)?)),
        }
    }

    /// The date used to decide whether a holiday is still upcoming.
    pub fn comparison_date(&self) -> NaiveDate {
        match self {
            Self::Single(date) => *date,
            Self::Range { end, .. } => *end,
        }
    }

    pub fn single_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Single(date) => Some(*date),
            Self::Range { .. } => None,
        }
    }
}

fn parse_iso_date(value: &str, raw: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|source| CoreError::InvalidDate {
        raw: raw.to_string(),
        source,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidayRecord {
    pub name: String,
    pub date: DateSpec,
    /// The date string as authored in the table.
    pub raw: String,
}

impl HolidayRecord {
    pub fn parse(name: &str, raw: &str) -> Result<Self, CoreError> {
        Ok(Self {
            name: name.to_string(),
            date: DateSpec::parse(raw)?,
            raw: raw.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayTable {
    records: Vec<HolidayRecord>,
}

impl HolidayTable {
    pub fn new(records: Vec<HolidayRecord>) -> Self {
        Self { records }
    }

    pub fn from_entries(entries: &[(&str, &str)]) -> Result<Self, CoreError> {
        entries
            .iter()
            .map(|(name, raw)| HolidayRecord::parse(name, raw))
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    pub fn records(&self) -> &[HolidayRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HolidayRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub sender_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundReply {
    pub recipient_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    Shuttle,
    Holidays,
    Assistant { prompt: String },
}

impl Intent {
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::Shuttle => "shuttle",
            Self::Holidays => "holidays",
            Self::Assistant { .. } => "assistant",
        }
    }
}

/// Deployment profile: a plain echo bot, or the full command router with the
/// generative fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayProfile {
    Echo,
    #[default]
    Assistant,
}

impl RelayProfile {
    pub fn as_code(self) -> &'static str {
        match self {
            Self::Echo => "echo",
            Self::Assistant => "assistant",
        }
    }
}

impl FromStr for RelayProfile {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "echo" => Ok(Self::Echo),
            "assistant" => Ok(Self::Assistant),
            other => Err(CoreError::UnknownProfile(other.to_string())),
        }
    }
}

impl fmt::Display for RelayProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}
