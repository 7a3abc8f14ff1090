//! Directory read and write operations over the record API.
//!
//! Every call that reaches the backend logs its failure and returns an empty
//! list or `None`; callers render "nothing found" instead of an error.

mod bazaars;
mod reports;

pub use bazaars::{filter_expression, ids_filter, search_filter, BazaarApi, BazaarFilter};
pub use reports::ReportApi;

/// Relations inlined on list calls
pub const LIST_EXPAND: &str = "food_types,reviews";
/// Relations inlined on the detail call
pub const DETAIL_EXPAND: &str = "food_types,reviews,reviews.user";
pub const LIST_SORT: &str = "-avg_rating,-created";
pub const BY_IDS_SORT: &str = "-avg_rating";
