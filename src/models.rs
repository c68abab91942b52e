use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

pub const DAILY_STEP_GOAL: u32 = 10_000;

#[derive(Serialize, Clone, Debug)]
pub struct AuthRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AuthResponse {
    pub jwt: String,
}

/// One day-aggregate as returned by `GET /steps`.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DailyStepsResult {
    pub id: i64,
    #[serde(rename = "steps_datetime", with = "api_datetime")]
    pub datetime: DateTime<Utc>,
    #[serde(rename = "steps_total_by_day")]
    pub total_steps: u32,
}

impl DailyStepsResult {
    /// Chart label, e.g. `1/13`.
    pub fn month_and_day(&self) -> String {
        format!("{}/{}", self.datetime.month(), self.datetime.day())
    }
}

/// Body of `POST /steps`.
#[derive(Serialize, Clone, Debug)]
pub struct StepsUploadRecord {
    pub username: String,
    #[serde(rename = "steps_date", with = "api_date")]
    pub date: NaiveDate,
    #[serde(rename = "steps_datetime", with = "api_datetime")]
    pub datetime: DateTime<Utc>,
    #[serde(rename = "steps_count")]
    pub count: u32,
    // Always 0; the backend does not appear to read it.
    #[serde(rename = "steps_total_by_day")]
    pub total_by_day: u32,
}

impl StepsUploadRecord {
    pub fn new(username: &str, now: DateTime<Utc>, count: u32) -> StepsUploadRecord {
        StepsUploadRecord {
            username: username.to_string(),
            date: now.date_naive(),
            datetime: now,
            count,
            total_by_day: 0,
        }
    }
}

/// `yyyy-MM-dd'T'HH:mm:ss.SSS'Z'` in UTC.
pub mod api_datetime {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
    const PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

    pub fn format(datetime: &DateTime<Utc>) -> String {
        datetime.format(FORMAT).to_string()
    }

    pub fn parse(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        NaiveDateTime::parse_from_str(value, PARSE_FORMAT).map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(datetime: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(datetime))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let value = String::deserialize(deserializer)?;
        parse(&value).map_err(|e| de::Error::custom(format!("bad datetime {value:?}: {e}")))
    }
}

pub mod api_date {
    use chrono::NaiveDate;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }
}

/// Everything the today and history displays need.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SyncState {
    pub steps_by_hour: Vec<u32>,
    pub steps_by_day: Vec<DailyStepsResult>,
    pub is_authorized: bool,
    pub fatal_error: Option<SyncError>,
    pub error: Option<SyncError>,
}

impl SyncState {
    pub fn steps_today(&self) -> u64 {
        self.steps_by_hour.iter().map(|&steps| u64::from(steps)).sum()
    }

    pub fn progress(&self) -> f64 {
        self.steps_today() as f64 / f64::from(DAILY_STEP_GOAL)
    }
}

/// History window offered by the history display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum DateRange {
    #[default]
    #[serde(rename = "7")]
    SevenDays,
    #[serde(rename = "30")]
    ThirtyDays,
}

impl DateRange {
    pub fn title(&self) -> &'static str {
        match self {
            DateRange::SevenDays => "7 Days",
            DateRange::ThirtyDays => "30 Days",
        }
    }

    /// Newest entries of an ascending series that fall in this range. The long range is the
    /// whole fetched series, so its length follows `HISTORY_DAYS`.
    pub fn select<'a>(&self, steps_by_day: &'a [DailyStepsResult]) -> &'a [DailyStepsResult] {
        match self {
            DateRange::SevenDays => &steps_by_day[steps_by_day.len().saturating_sub(7)..],
            DateRange::ThirtyDays => steps_by_day,
        }
    }
}

/// `0 -> "12 AM"`, `13 -> "1 PM"`. Wraps past 23, so the extra hour of a 25-hour day is `12 AM`.
pub fn hour_label(index: usize) -> String {
    let hour = if index % 12 == 0 { 12 } else { index % 12 };
    let period = if index % 24 < 12 { "AM" } else { "PM" };
    format!("{hour} {period}")
}
