//! Bazaar and review domain models

use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::FoodType;

/// Moderation state of a bazaar listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BazaarStatus {
    Approved,
    #[default]
    Pending,
    Rejected,
}

impl BazaarStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Pending => "pending",
            Self::Rejected => "rejected",
        }
    }
}

/// Daily opening window, `HH:MM` 24-hour strings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OperatingHours {
    pub start: String,
    pub end: String,
}

impl OperatingHours {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// A user review of a bazaar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub rating: f64,
    pub comment: String,
    /// `YYYY-MM-DD`
    pub created_at: String,
}

/// A bazaar as shown to users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bazaar {
    pub id: String,
    pub name: String,
    pub description: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub food_types: Vec<FoodType>,
    pub rating: f64,
    pub review_count: usize,
    pub reviews: Vec<Review>,
    pub operating_hours: OperatingHours,
    /// Computed from `operating_hours` when the record was loaded
    pub is_open: bool,
    /// Absolute file URLs
    pub photos: Vec<String>,
    pub stall_count: u32,
    pub district: String,
    pub state: String,
    pub status: BazaarStatus,
}

/// Parse `HH:MM` into minutes since midnight.
pub fn parse_minute_of_day(value: &str) -> Option<u32> {
    let (hour, minute) = value.trim().split_once(':')?;
    let hour: u32 = hour.trim().parse().ok()?;
    let minute: u32 = minute.trim().parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(hour * 60 + minute)
}

/// Whether `hours` contains `now`, inclusive at both ends.
///
/// Windows that cross midnight (`end < start`) are never open. Unparseable
/// hours are treated as closed.
pub fn calculate_is_open_at(hours: &OperatingHours, now: NaiveTime) -> bool {
    let current = now.hour() * 60 + now.minute();
    match (
        parse_minute_of_day(&hours.start),
        parse_minute_of_day(&hours.end),
    ) {
        (Some(start), Some(end)) => current >= start && current <= end,
        _ => false,
    }
}

/// [`calculate_is_open_at`] against the local wall clock.
pub fn calculate_is_open(hours: &OperatingHours) -> bool {
    calculate_is_open_at(hours, Local::now().time())
}

/// Parse a backend timestamp: RFC 3339 or the backend's
/// `YYYY-MM-DD HH:MM:SS.sssZ` form (always UTC).
pub fn parse_timestamp(timestamp: &str) -> Option<DateTime<Utc>> {
    let trimmed = timestamp.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    let without_zone = trimmed.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(without_zone, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|parsed| parsed.and_utc())
}

/// Render a backend timestamp as `YYYY-MM-DD` (UTC); unparseable input is
/// returned unchanged.
pub fn format_date(timestamp: &str) -> String {
    parse_timestamp(timestamp).map_or_else(
        || timestamp.trim().to_string(),
        |parsed| parsed.format("%Y-%m-%d").to_string(),
    )
}
