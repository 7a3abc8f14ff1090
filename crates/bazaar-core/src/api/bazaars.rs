use std::collections::HashMap;

use chrono::{Local, NaiveTime};
use serde_json::json;

use super::{BY_IDS_SORT, DETAIL_EXPAND, LIST_EXPAND, LIST_SORT};
use crate::models::{Bazaar, BazaarStatus, BazaarSubmission, FoodType, OperatingHours};
use crate::pocketbase::{collections, BazaarRecord, Filter, FoodTypeRecord, ListOptions, RecordApi};

/// Criteria for [`BazaarApi::filter_bazaars`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BazaarFilter {
    /// Match bazaars selling any of these
    pub food_types: Vec<FoodType>,
    /// Ignored unless positive
    pub min_rating: Option<f64>,
    /// Applied after fetching, since opening state is computed locally
    pub open_only: bool,
}

fn approved() -> Filter {
    Filter::all().eq("status", BazaarStatus::Approved.as_str())
}

/// `status = "approved"`, narrowed by a substring match on name, address or
/// district when `query` is not blank.
pub fn search_filter(query: &str) -> Filter {
    let query = query.trim();
    if query.is_empty() {
        return approved();
    }
    approved().group(
        Filter::any()
            .like("name", query)
            .like("address", query)
            .like("district", query),
    )
}

/// Server-side part of a [`BazaarFilter`]
pub fn filter_expression(criteria: &BazaarFilter) -> Filter {
    let mut filter = approved();
    let min_rating = criteria
        .min_rating
        .filter(|rating| rating.is_finite() && *rating > 0.0);
    if let Some(min_rating) = min_rating {
        filter = filter.gte("avg_rating", min_rating);
    }
    let foods = criteria
        .food_types
        .iter()
        .fold(Filter::any(), |any, food| any.any_eq("food_types.slug", food.slug()));
    filter.group(foods)
}

/// Approved bazaars whose id is one of `ids`
pub fn ids_filter(ids: &[String]) -> Filter {
    let any_id = ids
        .iter()
        .fold(Filter::any(), |any, id| any.eq("id", id.as_str()));
    Filter::all().group(any_id).eq("status", BazaarStatus::Approved.as_str())
}

/// Bazaar listing, search and submission
pub struct BazaarApi<A> {
    remote: A,
    clock: fn() -> NaiveTime,
}

fn local_time() -> NaiveTime {
    Local::now().time()
}

impl<A: RecordApi> BazaarApi<A> {
    pub fn new(remote: A) -> Self {
        Self {
            remote,
            clock: local_time,
        }
    }

    /// Replace the wall clock used for `is_open`
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> NaiveTime) -> Self {
        self.clock = clock;
        self
    }

    fn translate(&self, record: BazaarRecord, now: NaiveTime) -> Bazaar {
        record.into_bazaar(
            |collection, id, filename| self.remote.file_url(collection, id, filename),
            now,
        )
    }

    async fn list(&self, action: &str, options: ListOptions) -> Vec<Bazaar> {
        match self
            .remote
            .get_full_list::<BazaarRecord>(collections::BAZAARS, &options)
            .await
        {
            Ok(records) => {
                let now = (self.clock)();
                records
                    .into_iter()
                    .map(|record| self.translate(record, now))
                    .collect()
            }
            Err(error) => {
                tracing::error!("Failed to {action}: {error}");
                Vec::new()
            }
        }
    }

    /// One bazaar with its food types, reviews and reviewers
    pub async fn get_bazaar_by_id(&self, id: &str) -> Option<Bazaar> {
        let options = ListOptions::new().expand(DETAIL_EXPAND);
        match self
            .remote
            .get_one::<BazaarRecord>(collections::BAZAARS, id.trim(), &options)
            .await
        {
            Ok(record) => Some(self.translate(record, (self.clock)())),
            Err(error) => {
                tracing::error!("Failed to fetch bazaar {id}: {error}");
                None
            }
        }
    }

    pub async fn search_bazaars(&self, query: &str) -> Vec<Bazaar> {
        let options = ListOptions::new()
            .filter(search_filter(query))
            .expand(LIST_EXPAND)
            .sort(LIST_SORT);
        self.list("search bazaars", options).await
    }

    /// Every approved bazaar, best rated first
    pub async fn get_all_bazaars(&self) -> Vec<Bazaar> {
        self.search_bazaars("").await
    }

    pub async fn filter_bazaars(&self, criteria: &BazaarFilter) -> Vec<Bazaar> {
        let options = ListOptions::new()
            .filter(filter_expression(criteria))
            .expand(LIST_EXPAND)
            .sort(LIST_SORT);
        let mut bazaars = self.list("filter bazaars", options).await;
        if criteria.open_only {
            bazaars.retain(|bazaar| bazaar.is_open);
        }
        bazaars
    }

    /// Approved bazaars among `ids`; no request is made for an empty slice
    pub async fn get_bazaars_by_ids(&self, ids: &[String]) -> Vec<Bazaar> {
        if ids.is_empty() {
            return Vec::new();
        }
        let options = ListOptions::new()
            .filter(ids_filter(ids))
            .expand(LIST_EXPAND)
            .sort(BY_IDS_SORT);
        self.list("fetch bazaars by id", options).await
    }

    /// Food type slug to record id, as stored by the backend
    async fn food_type_ids(&self) -> Option<HashMap<String, String>> {
        match self
            .remote
            .get_full_list::<FoodTypeRecord>(collections::FOOD_TYPES, &ListOptions::new())
            .await
        {
            Ok(records) => Some(
                records
                    .into_iter()
                    .map(|record| (record.slug, record.id))
                    .collect(),
            ),
            Err(error) => {
                tracing::error!("Failed to fetch food types: {error}");
                None
            }
        }
    }

    /// Create a pending listing from a validated submission.
    ///
    /// Returns `None` when validation or the backend rejects it.
    pub async fn submit_bazaar(
        &self,
        submission: &BazaarSubmission,
        submitted_by: &str,
    ) -> Option<Bazaar> {
        let numbers = match submission.validate() {
            Ok(numbers) => numbers,
            Err(error) => {
                tracing::warn!("Rejected bazaar submission: {error}");
                return None;
            }
        };

        let slugs = self.food_type_ids().await?;
        let food_types: Vec<&String> = submission
            .food_types
            .iter()
            .filter_map(|food| {
                let id = slugs.get(food.slug());
                if id.is_none() {
                    tracing::warn!("Food type {} is not in the catalogue", food.slug());
                }
                id
            })
            .collect();

        let body = json!({
            "name": submission.name.trim(),
            "description": submission.description.trim(),
            "address": submission.address.trim(),
            "district": submission.district.trim(),
            "state": submission.state.trim(),
            "lat": numbers.lat.unwrap_or(0.0),
            "lng": numbers.lng.unwrap_or(0.0),
            "stall_count": numbers.stall_count.unwrap_or(0),
            "food_types": food_types,
            "open_hours": OperatingHours::new(
                submission.start_time.trim(),
                submission.end_time.trim(),
            ),
            "status": BazaarStatus::Pending.as_str(),
            "submitted_by": submitted_by,
        });

        match self
            .remote
            .create::<BazaarRecord>(collections::BAZAARS, &body)
            .await
        {
            Ok(record) => {
                tracing::info!("Submitted bazaar {} for review", record.id);
                Some(self.translate(record, (self.clock)()))
            }
            Err(error) => {
                tracing::error!("Failed to submit bazaar: {error}");
                None
            }
        }
    }
}
