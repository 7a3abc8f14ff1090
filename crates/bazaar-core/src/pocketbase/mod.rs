//! Typed access to the PocketBase record API.

mod client;
#[cfg(test)]
pub(crate) mod fake;
mod filter;
mod records;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::util::compact_text;

pub use client::PocketBaseClient;
pub use filter::{Filter, FilterValue, Join, Op, Term};
pub use records::{
    BazaarExpand, BazaarRecord, FoodTypeRecord, RemoteFavoriteRecord, ReportRecord, ReviewExpand,
    ReviewRecord, UserRecord,
};

/// Collection names used by the directory
pub mod collections {
    pub const BAZAARS: &str = "bazaars";
    pub const REVIEWS: &str = "reviews";
    pub const FOOD_TYPES: &str = "food_types";
    pub const FAVORITES: &str = "favorites";
    pub const REPORTS: &str = "reports";
    pub const USERS: &str = "users";
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message} ({status})")]
    Response {
        status: u16,
        message: String,
        /// Fields the backend rejected, if any
        fields: Vec<String>,
    },
    #[error("Invalid response payload: {0}")]
    InvalidPayload(String),
    #[error("Invalid record API URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status of a backend rejection
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend rejected the session itself
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(404))
    }

    /// Build an error from a non-success response body.
    ///
    /// PocketBase answers `{"message": "...", "data": {"field": {...}}}`; other
    /// bodies fall back to their (shortened) text.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            #[serde(default)]
            message: Option<String>,
            #[serde(default)]
            data: serde_json::Map<String, serde_json::Value>,
        }

        if let Ok(payload) = serde_json::from_str::<ErrorBody>(body) {
            if let Some(message) = payload.message.filter(|m| !m.trim().is_empty()) {
                let mut fields: Vec<String> = payload.data.keys().cloned().collect();
                fields.sort_unstable();
                return Self::Response {
                    status,
                    message: message.trim().to_string(),
                    fields,
                };
            }
        }

        let text = compact_text(body);
        Self::Response {
            status,
            message: if text.is_empty() {
                "Request failed".to_string()
            } else {
                text
            },
            fields: Vec::new(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Query options shared by list and single-record calls
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    pub filter: Option<Filter>,
    pub sort: Option<String>,
    pub expand: Option<String>,
}

impl ListOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = if filter.is_empty() { None } else { Some(filter) };
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: &str) -> Self {
        self.sort = Some(sort.to_string());
        self
    }

    #[must_use]
    pub fn expand(mut self, expand: &str) -> Self {
        self.expand = Some(expand.to_string());
        self
    }

    /// Rendered filter text, if any
    #[must_use]
    pub fn filter_text(&self) -> Option<String> {
        self.filter.as_ref().map(ToString::to_string)
    }

    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(filter) = self.filter_text() {
            pairs.push(("filter", filter));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort", sort.clone()));
        }
        if let Some(expand) = &self.expand {
            pairs.push(("expand", expand.clone()));
        }
        pairs
    }
}

/// Collection-level record operations
///
/// Implemented over HTTP by [`PocketBaseClient`]; services are generic over
/// this trait so they can run against an in-memory backend in tests.
#[allow(async_fn_in_trait)]
pub trait RecordApi {
    /// Every record matching `options`, fetched page by page
    async fn get_full_list<T: DeserializeOwned>(
        &self,
        collection: &str,
        options: &ListOptions,
    ) -> ApiResult<Vec<T>>;

    /// A single record by id
    async fn get_one<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
        options: &ListOptions,
    ) -> ApiResult<T>;

    async fn create<T: DeserializeOwned>(
        &self,
        collection: &str,
        body: &serde_json::Value,
    ) -> ApiResult<T>;

    async fn update<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
        body: &serde_json::Value,
    ) -> ApiResult<T>;

    async fn delete(&self, collection: &str, id: &str) -> ApiResult<()>;

    /// Absolute URL of a file attached to a record
    fn file_url(&self, collection: &str, record_id: &str, filename: &str) -> String;
}

/// `{base}/api/files/{collection}/{record}/{filename}`
#[must_use]
pub fn file_url(base_url: &str, collection: &str, record_id: &str, filename: &str) -> String {
    format!(
        "{}/api/files/{}/{}/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(collection),
        urlencoding::encode(record_id),
        urlencoding::encode(filename)
    )
}
