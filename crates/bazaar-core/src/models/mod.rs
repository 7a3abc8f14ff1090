//! Data models for Bazaar

mod bazaar;
mod favorite;
mod food_type;
mod report;
mod submission;

pub use bazaar::{
    calculate_is_open, calculate_is_open_at, format_date, parse_minute_of_day, parse_timestamp,
    Bazaar, BazaarStatus, OperatingHours, Review,
};
pub use favorite::{FavoriteRecord, OwnerScope, ANONYMOUS_SCOPE};
pub use food_type::FoodType;
pub use report::{Report, ReportStatus};
pub use submission::{BazaarSubmission, SubmissionNumbers, SubmissionStep};
