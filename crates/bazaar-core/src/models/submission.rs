//! Multi-step bazaar submission form

use serde::{Deserialize, Serialize};

use super::bazaar::parse_minute_of_day;
use super::FoodType;
use crate::error::{Error, Result};

const DEFAULT_START_TIME: &str = "15:00";
const DEFAULT_END_TIME: &str = "19:00";

/// Steps of the submission form, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SubmissionStep {
    Info = 1,
    Location = 2,
    Food = 3,
    Photos = 4,
}

impl SubmissionStep {
    pub const ALL: [Self; 4] = [Self::Info, Self::Location, Self::Food, Self::Photos];

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Info => Some(Self::Location),
            Self::Location => Some(Self::Food),
            Self::Food => Some(Self::Photos),
            Self::Photos => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Location => "Location",
            Self::Food => "Food",
            Self::Photos => "Photos",
        }
    }
}

/// Raw form values. Numbers stay as text until [`BazaarSubmission::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BazaarSubmission {
    pub name: String,
    pub description: String,
    pub address: String,
    pub district: String,
    pub state: String,
    pub lat: String,
    pub lng: String,
    pub start_time: String,
    pub end_time: String,
    pub stall_count: String,
    pub food_types: Vec<FoodType>,
}

impl Default for BazaarSubmission {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            address: String::new(),
            district: String::new(),
            state: String::new(),
            lat: String::new(),
            lng: String::new(),
            start_time: DEFAULT_START_TIME.to_string(),
            end_time: DEFAULT_END_TIME.to_string(),
            stall_count: String::new(),
            food_types: Vec::new(),
        }
    }
}

/// Parsed numeric fields of a valid submission
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubmissionNumbers {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub stall_count: Option<u32>,
}

impl BazaarSubmission {
    /// Add the food type if missing, remove it otherwise.
    pub fn toggle_food_type(&mut self, food: FoodType) {
        if let Some(index) = self.food_types.iter().position(|f| *f == food) {
            self.food_types.remove(index);
        } else {
            self.food_types.push(food);
        }
    }

    /// Whether the required fields of `step` are filled in.
    #[must_use]
    pub fn can_advance(&self, step: SubmissionStep) -> bool {
        match step {
            SubmissionStep::Info => !is_blank(&self.name) && !is_blank(&self.address),
            SubmissionStep::Location => !is_blank(&self.district) && !is_blank(&self.state),
            SubmissionStep::Food => !self.food_types.is_empty(),
            SubmissionStep::Photos => true,
        }
    }

    /// First step whose requirements are not met.
    #[must_use]
    pub fn first_incomplete_step(&self) -> Option<SubmissionStep> {
        SubmissionStep::ALL
            .into_iter()
            .find(|step| !self.can_advance(*step))
    }

    /// Validate every step plus the free-form numeric and time fields.
    pub fn validate(&self) -> Result<SubmissionNumbers> {
        if let Some(step) = self.first_incomplete_step() {
            return Err(Error::InvalidInput(format!(
                "step {} ({}) is incomplete",
                step as u8,
                step.label()
            )));
        }

        for (field, value) in [("start time", &self.start_time), ("end time", &self.end_time)] {
            if parse_minute_of_day(value).is_none() {
                return Err(Error::InvalidInput(format!(
                    "{field} must be HH:MM, got '{value}'"
                )));
            }
        }

        Ok(SubmissionNumbers {
            lat: parse_optional(&self.lat, "latitude")?,
            lng: parse_optional(&self.lng, "longitude")?,
            stall_count: parse_optional(&self.stall_count, "stall count")?,
        })
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn parse_optional<T: std::str::FromStr>(value: &str, field: &str) -> Result<Option<T>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| Error::InvalidInput(format!("{field} is not a valid number: '{value}'")))
}
