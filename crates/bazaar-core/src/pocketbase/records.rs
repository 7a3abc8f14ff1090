//! Wire records (snake_case) and their translation into domain models.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // stall counts are small non-negative numbers

use chrono::NaiveTime;
use serde::Deserialize;

use crate::models::{
    calculate_is_open_at, format_date, Bazaar, BazaarStatus, FoodType, OperatingHours, Report,
    ReportStatus, Review,
};

const ANONYMOUS_REVIEWER: &str = "Anonymous";

/// `food_types` collection row
#[derive(Debug, Clone, Deserialize)]
pub struct FoodTypeRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color_class: String,
}

/// `users` collection row (public fields only)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserRecord {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewExpand {
    #[serde(default)]
    pub user: Option<UserRecord>,
}

/// `reviews` collection row
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRecord {
    pub id: String,
    #[serde(default)]
    pub bazaar: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub expand: Option<ReviewExpand>,
}

impl From<ReviewRecord> for Review {
    fn from(record: ReviewRecord) -> Self {
        let user_name = record
            .expand
            .and_then(|expand| expand.user)
            .and_then(|user| user.username)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| ANONYMOUS_REVIEWER.to_string());

        Self {
            id: record.id,
            user_id: record.user,
            user_name,
            rating: record.rating,
            comment: record.comment,
            created_at: format_date(&record.created),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BazaarExpand {
    #[serde(default)]
    pub food_types: Vec<FoodTypeRecord>,
    #[serde(default)]
    pub reviews: Vec<ReviewRecord>,
}

/// `bazaars` collection row
#[derive(Debug, Clone, Deserialize)]
pub struct BazaarRecord {
    pub id: String,
    #[serde(default, rename = "collectionId")]
    pub collection_id: String,
    #[serde(default, rename = "collectionName")]
    pub collection_name: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub stall_count: f64,
    /// Relation ids
    #[serde(default)]
    pub food_types: Vec<String>,
    #[serde(default)]
    pub open_hours: Option<OperatingHours>,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub status: BazaarStatus,
    #[serde(default)]
    pub submitted_by: String,
    #[serde(default)]
    pub avg_rating: Option<f64>,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub updated: String,
    #[serde(default)]
    pub expand: Option<BazaarExpand>,
}

impl BazaarRecord {
    /// Collection segment used in file URLs
    pub fn file_collection(&self) -> &str {
        if self.collection_id.is_empty() {
            if self.collection_name.is_empty() {
                "bazaars"
            } else {
                &self.collection_name
            }
        } else {
            &self.collection_id
        }
    }

    /// Translate into the domain model.
    ///
    /// `file_url` maps `(collection, record_id, filename)` to an absolute URL
    /// and `now` is the wall-clock time used for `is_open`.
    pub fn into_bazaar(self, file_url: impl Fn(&str, &str, &str) -> String, now: NaiveTime) -> Bazaar {
        let photos = self
            .photos
            .iter()
            .map(|filename| file_url(self.file_collection(), &self.id, filename))
            .collect();

        let expand = self.expand.unwrap_or_default();
        let food_types = expand
            .food_types
            .iter()
            .filter_map(|record| match record.slug.parse::<FoodType>() {
                Ok(food) => Some(food),
                Err(error) => {
                    tracing::debug!("Skipping food type {}: {}", record.id, error);
                    None
                }
            })
            .collect();
        let reviews: Vec<Review> = expand.reviews.into_iter().map(Review::from).collect();

        let operating_hours = self.open_hours.unwrap_or_default();
        let is_open = calculate_is_open_at(&operating_hours, now);

        Bazaar {
            id: self.id,
            name: self.name,
            description: self.description,
            address: self.address,
            lat: self.lat,
            lng: self.lng,
            food_types,
            rating: self.avg_rating.unwrap_or(0.0),
            review_count: reviews.len(),
            reviews,
            operating_hours,
            is_open,
            photos,
            stall_count: self.stall_count.max(0.0).round() as u32,
            district: self.district,
            state: self.state,
            status: self.status,
        }
    }
}

/// `favorites` collection row
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteFavoriteRecord {
    pub id: String,
    pub user: String,
    pub bazaar: String,
    #[serde(default)]
    pub created: String,
}

/// `reports` collection row
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRecord {
    pub id: String,
    #[serde(default)]
    pub bazaar: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub status: ReportStatus,
    #[serde(default)]
    pub created: String,
}

impl From<ReportRecord> for Report {
    fn from(record: ReportRecord) -> Self {
        Self {
            id: record.id,
            bazaar_id: record.bazaar,
            reason: record.reason,
            details: record.details,
            status: record.status,
            created_at: record.created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn files(collection: &str, id: &str, name: &str) -> String {
        format!("https://pb.test/api/files/{collection}/{id}/{name}")
    }

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(15, 0, 0).unwrap()
    }

    fn bazaar_json() -> serde_json::Value {
        json!({
            "id": "baz1",
            "collectionId": "pbc_bazaars",
            "collectionName": "bazaars",
            "name": "Bazaar PJ",
            "description": "Test bazaar",
            "lat": 3.1,
            "lng": 101.6,
            "address": "Jalan PJ",
            "district": "Petaling",
            "state": "Selangor",
            "stall_count": 50,
            "food_types": ["ft1", "ft2"],
            "open_hours": { "start": "14:00", "end": "22:00" },
            "photos": ["front.jpg"],
            "status": "approved",
            "submitted_by": "usr1",
            "avg_rating": 4.0,
            "created": "2025-01-01 00:00:00.000Z",
            "updated": "2025-01-01 00:00:00.000Z",
            "expand": {
                "food_types": [
                    { "id": "ft1", "name": "Satay", "slug": "satay" },
                    { "id": "ft2", "name": "Pizza", "slug": "pizza" }
                ],
                "reviews": [
                    {
                        "id": "rev1", "bazaar": "baz1", "user": "usr2", "rating": 5,
                        "comment": "Sedap", "created": "2025-02-03 08:00:00.000Z",
                        "expand": { "user": { "id": "usr2", "username": "aminah" } }
                    },
                    {
                        "id": "rev2", "bazaar": "baz1", "user": "usr3", "rating": 3,
                        "comment": "Ok", "created": "2025-02-04 08:00:00.000Z"
                    }
                ]
            }
        })
    }

    #[test]
    fn bazaar_record_translates_to_domain() {
        let record: BazaarRecord = serde_json::from_value(bazaar_json()).unwrap();
        let bazaar = record.into_bazaar(files, noon());

        assert_eq!(bazaar.id, "baz1");
        assert_eq!(bazaar.stall_count, 50);
        assert_eq!(bazaar.food_types, vec![FoodType::Satay]);
        assert_eq!(bazaar.review_count, 2);
        assert_eq!(bazaar.reviews[0].user_name, "aminah");
        assert_eq!(bazaar.reviews[1].user_name, "Anonymous");
        assert_eq!(bazaar.reviews[0].created_at, "2025-02-03");
        assert!(bazaar.is_open);
        assert_eq!(
            bazaar.photos,
            vec!["https://pb.test/api/files/pbc_bazaars/baz1/front.jpg".to_string()]
        );
    }

    #[test]
    fn missing_optional_fields_use_defaults() {
        let record: BazaarRecord = serde_json::from_value(json!({
            "id": "baz2",
            "name": "Bazaar Kosong",
            "avg_rating": null,
            "open_hours": null
        }))
        .unwrap();
        let bazaar = record.into_bazaar(files, noon());

        assert_eq!(bazaar.rating, 0.0);
        assert!(!bazaar.is_open);
        assert!(bazaar.food_types.is_empty());
        assert!(bazaar.reviews.is_empty());
        assert_eq!(bazaar.status, BazaarStatus::Pending);
    }

    #[test]
    fn domain_bazaar_serializes_camel_case() {
        let record: BazaarRecord = serde_json::from_value(bazaar_json()).unwrap();
        let value = serde_json::to_value(record.into_bazaar(files, noon())).unwrap();
        assert!(value.get("stallCount").is_some());
        assert!(value.get("operatingHours").is_some());
        assert!(value.get("stall_count").is_none());
    }

    #[test]
    fn report_record_translates_to_domain() {
        let record: ReportRecord = serde_json::from_value(json!({
            "id": "rep1", "bazaar": "baz1", "reason": "closed", "details": "No longer here",
            "status": "resolved", "created": "2025-03-01 00:00:00.000Z"
        }))
        .unwrap();
        let report = Report::from(record);
        assert_eq!(report.bazaar_id, "baz1");
        assert_eq!(report.status, ReportStatus::Resolved);
    }
}
