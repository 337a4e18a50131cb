//! Domain DTOs for the RentKub API.
//!
//! # Design
//! These types mirror the backend's camelCase JSON but are defined
//! independently of the mock-server crate; integration tests catch schema
//! drift. Fields the backend omits on list endpoints (reviews, unavailable
//! dates, host profile) default to empty so one `Camping` type serves both
//! the collection and the detail view.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::amenities::{self, Amenities};

/// Identifier of a listing ("camping" / "landmark" on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampingId(pub i64);

impl fmt::Display for CampingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CampingId {
    fn from(id: i64) -> Self {
        CampingId(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Average rating per review category. Missing categories read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RatingBreakdown {
    pub overall: f64,
    pub customer_support: f64,
    pub convenience: f64,
    pub signal_quality: f64,
}

/// A user profile as embedded in listings (host) and reviews (author).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub clerk_id: Option<String>,
    pub username: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub image_url: Option<String>,
    #[serde(alias = "createAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// First and last name, falling back to `Host` when no first name is set.
    pub fn display_name(&self) -> String {
        let first = self.firstname.as_deref().unwrap_or("Host");
        match self.lastname.as_deref() {
            Some(last) if !last.is_empty() => format!("{first} {last}"),
            _ => first.to_string(),
        }
    }

    /// Month and year the profile was created, e.g. `March 2024`.
    pub fn joined_label(&self) -> String {
        match self.created_at {
            Some(at) => at.format("%B %Y").to_string(),
            None => "Date unavailable".to_string(),
        }
    }
}

/// A bookable camping spot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camping {
    pub id: CampingId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
    #[serde(default, deserialize_with = "amenities::deserialize")]
    pub amenities: Amenities,
    #[serde(default)]
    pub rooms: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_favorite: bool,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub average_ratings_by_category: Option<RatingBreakdown>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub total_reviews: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reviews: Vec<Review>,
    #[serde(default, deserialize_with = "dates::deserialize_list")]
    pub unavailable_dates: Vec<NaiveDate>,
    /// `None` when the backend did not send the field; an empty list is
    /// still authoritative.
    #[serde(default, deserialize_with = "dates::deserialize_optional_list")]
    pub publicly_unavailable_dates: Option<Vec<NaiveDate>>,
    #[serde(default)]
    pub profile: Option<Profile>,
}

impl Camping {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        }
    }

    /// Server-supplied review total: `totalReviews`, else `reviewCount`, else 0.
    pub fn review_total(&self) -> u32 {
        self.total_reviews.or(self.review_count).unwrap_or(0)
    }

    /// Dates a new booking may not cover. The publicly visible set wins when
    /// the backend sent one.
    pub fn blocked_dates(&self) -> &[NaiveDate] {
        self.publicly_unavailable_dates
            .as_deref()
            .unwrap_or(&self.unavailable_dates)
    }

    /// Per-category averages, with `overall` taken from `averageRating` when
    /// the breakdown does not carry one.
    pub fn rating_breakdown(&self) -> RatingBreakdown {
        let mut breakdown = self.average_ratings_by_category.clone().unwrap_or_default();
        if breakdown.overall == 0.0 {
            breakdown.overall = self.average_rating.unwrap_or(0.0);
        }
        breakdown
    }

    /// Take `newer` as the current snapshot while keeping detail-only fields
    /// that `newer` (typically a list summary) does not carry.
    pub fn absorb(&mut self, newer: Camping) {
        let previous = std::mem::replace(self, newer);
        if self.reviews.is_empty() {
            self.reviews = previous.reviews;
        }
        if self.unavailable_dates.is_empty() {
            self.unavailable_dates = previous.unavailable_dates;
        }
        if self.publicly_unavailable_dates.is_none() {
            self.publicly_unavailable_dates = previous.publicly_unavailable_dates;
        }
        if self.average_ratings_by_category.is_none() {
            self.average_ratings_by_category = previous.average_ratings_by_category;
        }
        if self.total_reviews.is_none() {
            self.total_reviews = previous.total_reviews;
        }
        if self.profile.is_none() {
            self.profile = previous.profile;
        }
    }
}

/// A guest review of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub landmark_id: CampingId,
    #[serde(default)]
    pub customer_support_rating: f64,
    #[serde(default)]
    pub convenience_rating: f64,
    #[serde(default)]
    pub signal_quality_rating: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default)]
    pub profile_id: Option<String>,
    #[serde(default)]
    pub profile: Option<Profile>,
    pub created_at: DateTime<Utc>,
}

/// A stay booked by a user. Status flags are owned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub landmark_id: CampingId,
    pub profile_id: String,
    #[serde(deserialize_with = "dates::deserialize")]
    pub check_in: NaiveDate,
    #[serde(deserialize_with = "dates::deserialize")]
    pub check_out: NaiveDate,
    #[serde(default)]
    pub nights: u32,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub payment_status: bool,
    #[serde(default)]
    pub confirm_status: bool,
    #[serde(default)]
    pub check_in_status: bool,
    #[serde(default)]
    pub cancel_status: bool,
    #[serde(default)]
    pub landmark: Option<Camping>,
}

/// A listing saved by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    #[serde(default)]
    pub id: i64,
    pub profile_id: String,
    pub landmark_id: CampingId,
    pub landmark: Camping,
}

/// `{"result": ...}` wrapper used by most endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEnvelope<T> {
    pub result: T,
}

/// Listing collection plus the map-center hint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampingList {
    #[serde(default)]
    pub result: Vec<Camping>,
    #[serde(default)]
    pub center: Option<Coordinates>,
}

/// One page of a listing's reviews.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    pub total_reviews: u32,
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Payment session created for a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub client_secret: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub url: String,
}

/// Search criteria for the collection view. Empty fields are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampingFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub price_min: Option<u32>,
    pub price_max: Option<u32>,
    pub amenities: Vec<String>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
}

impl CampingFilter {
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category) = self.category.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("category", category.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(min) = self.price_min {
            pairs.push(("priceMin", min.to_string()));
        }
        if let Some(max) = self.price_max {
            pairs.push(("priceMax", max.to_string()));
        }
        if !self.amenities.is_empty() {
            pairs.push(("amenities", self.amenities.join(",")));
        }
        if let Some(check_in) = self.check_in {
            pairs.push(("checkIn", check_in.to_string()));
        }
        if let Some(check_out) = self.check_out {
            pairs.push(("checkOut", check_out.to_string()));
        }
        pairs
    }
}

/// Flip request for a listing's favorite flag. `is_favorite` is the state
/// the viewer saw before toggling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteToggle {
    pub camping_id: CampingId,
    pub is_favorite: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBooking {
    pub camping_id: CampingId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

/// Host-side status change. Only the fields present are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingStatusUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirm_status: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_status: Option<bool>,
}

/// Optional filters for the viewer's booking list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingQuery {
    pub status: Option<String>,
    pub camping_id: Option<CampingId>,
}

impl BookingQuery {
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("status", status.to_string()));
        }
        if let Some(id) = self.camping_id {
            pairs.push(("campingId", id.to_string()));
        }
        pairs
    }
}

/// Body shared by checkout and retry-payment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub(crate) struct BookingRef {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ImageUpload<'a> {
    pub image: &'a str,
}

/// Lenient date parsing: the backend sends plain dates for some fields and
/// full timestamps for others.
mod dates {
    use super::*;
    use serde::de::Error;

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        raw.parse::<NaiveDate>()
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|at| at.date_naive()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid date: {raw}")))
    }

    pub fn deserialize_list<'de, D>(deserializer: D) -> Result<Vec<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(deserialize_optional_list(deserializer)?.unwrap_or_default())
    }

    pub fn deserialize_optional_list<'de, D>(deserializer: D) -> Result<Option<Vec<NaiveDate>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<Vec<String>>::deserialize(deserializer)? else {
            return Ok(None);
        };
        raw.iter()
            .map(|s| parse(s).ok_or_else(|| D::Error::custom(format!("invalid date: {s}"))))
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn camping_json() -> serde_json::Value {
        json!({
            "id": 42,
            "title": "Pine Ridge",
            "description": "Quiet spot by the lake",
            "price": 900,
            "lat": 18.79,
            "lng": 98.98,
            "images": ["https://img/1.jpg", "https://img/2.jpg"],
            "amenities": "[\"wifi\",\"pool\"]",
            "isFavorite": true,
            "averageRating": 4.5,
            "totalReviews": 12,
            "unavailableDates": ["2025-06-01", "2025-06-02T00:00:00.000Z"]
        })
    }

    #[test]
    fn camping_parses_encoded_amenities() {
        let camping: Camping = serde_json::from_value(camping_json()).unwrap();
        assert_eq!(camping.id, CampingId(42));
        assert!(camping.amenities.contains("wifi"));
        assert!(camping.amenities.contains("pool"));
        assert_eq!(camping.images.len(), 2);
        assert!(camping.is_favorite);
    }

    #[test]
    fn camping_accepts_timestamps_in_date_lists() {
        let camping: Camping = serde_json::from_value(camping_json()).unwrap();
        assert_eq!(
            camping.unavailable_dates,
            vec![
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            ]
        );
    }

    #[test]
    fn camping_with_malformed_amenities_still_parses() {
        let mut value = camping_json();
        value["amenities"] = json!("not json");
        let camping: Camping = serde_json::from_value(value).unwrap();
        assert!(camping.amenities.is_empty());

        let mut value = camping_json();
        value["amenities"] = json!(null);
        let camping: Camping = serde_json::from_value(value).unwrap();
        assert!(camping.amenities.is_empty());
    }

    #[test]
    fn camping_with_bad_date_is_rejected() {
        let mut value = camping_json();
        value["unavailableDates"] = json!(["someday"]);
        assert!(serde_json::from_value::<Camping>(value).is_err());
    }

    #[test]
    fn minimal_camping_defaults_optional_fields() {
        let camping: Camping = serde_json::from_value(json!({"id": 1})).unwrap();
        assert!(camping.title.is_empty());
        assert!(!camping.is_favorite);
        assert!(camping.reviews.is_empty());
        assert_eq!(camping.review_total(), 0);
        assert!(camping.coordinates().is_none());
    }

    #[test]
    fn review_total_prefers_total_reviews() {
        let mut camping: Camping = serde_json::from_value(json!({"id": 1, "reviewCount": 3})).unwrap();
        assert_eq!(camping.review_total(), 3);
        camping.total_reviews = Some(7);
        assert_eq!(camping.review_total(), 7);
    }

    #[test]
    fn null_fields_in_one_listing_do_not_fail_the_list() {
        let list: CampingList = serde_json::from_value(json!({
            "result": [
                camping_json(),
                {"id": 2, "title": null, "description": null, "price": null, "images": null,
                 "isFavorite": null, "reviews": null}
            ]
        }))
        .unwrap();
        assert_eq!(list.result.len(), 2);
        let second = &list.result[1];
        assert!(second.description.is_empty());
        assert!(second.images.is_empty());
        assert_eq!(second.price, 0.0);
    }

    #[test]
    fn empty_public_date_list_still_wins() {
        let camping: Camping = serde_json::from_value(json!({
            "id": 1,
            "unavailableDates": ["2025-01-01"],
            "publiclyUnavailableDates": []
        }))
        .unwrap();
        assert!(camping.blocked_dates().is_empty());

        let camping: Camping = serde_json::from_value(json!({
            "id": 1,
            "unavailableDates": ["2025-01-01"],
            "publiclyUnavailableDates": null
        }))
        .unwrap();
        assert_eq!(camping.blocked_dates().len(), 1);
    }

    #[test]
    fn blocked_dates_prefer_public_set() {
        let camping: Camping = serde_json::from_value(json!({
            "id": 1,
            "unavailableDates": ["2025-01-01"],
            "publiclyUnavailableDates": ["2025-02-01"]
        }))
        .unwrap();
        assert_eq!(camping.blocked_dates(), &[NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()]);
    }

    #[test]
    fn rating_breakdown_falls_back_to_average_rating() {
        let camping: Camping = serde_json::from_value(json!({
            "id": 1,
            "averageRating": 4.0,
            "averageRatingsByCategory": {"convenience": 3.5}
        }))
        .unwrap();
        let breakdown = camping.rating_breakdown();
        assert_eq!(breakdown.overall, 4.0);
        assert_eq!(breakdown.convenience, 3.5);
        assert_eq!(breakdown.signal_quality, 0.0);
    }

    #[test]
    fn absorb_keeps_detail_fields_missing_from_summary() {
        let mut detail: Camping = serde_json::from_value(camping_json()).unwrap();
        detail.profile = Some(Profile {
            firstname: Some("Ann".to_string()),
            ..Profile::default()
        });
        let summary: Camping = serde_json::from_value(json!({
            "id": 42,
            "title": "Pine Ridge (renamed)",
            "isFavorite": false
        }))
        .unwrap();

        detail.absorb(summary);
        assert_eq!(detail.title, "Pine Ridge (renamed)");
        assert!(!detail.is_favorite);
        assert_eq!(detail.unavailable_dates.len(), 2);
        assert_eq!(detail.total_reviews, Some(12));
        assert!(detail.profile.is_some());
    }

    #[test]
    fn profile_labels() {
        let profile: Profile = serde_json::from_value(json!({
            "firstname": "Somchai",
            "createAt": "2024-03-05T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(profile.display_name(), "Somchai");
        assert_eq!(profile.joined_label(), "March 2024");
        assert_eq!(Profile::default().display_name(), "Host");
        assert_eq!(Profile::default().joined_label(), "Date unavailable");
    }

    #[test]
    fn filter_skips_empty_fields() {
        let filter = CampingFilter {
            category: Some(String::new()),
            search: Some("lake".to_string()),
            price_max: Some(1500),
            amenities: vec!["wifi".to_string(), "pool".to_string()],
            check_in: NaiveDate::from_ymd_opt(2025, 7, 1),
            ..CampingFilter::default()
        };
        let pairs = filter.query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("search", "lake".to_string()),
                ("priceMax", "1500".to_string()),
                ("amenities", "wifi,pool".to_string()),
                ("checkIn", "2025-07-01".to_string()),
            ]
        );
    }

    #[test]
    fn booking_status_update_omits_unset_fields() {
        let update = BookingStatusUpdate {
            confirm_status: Some(true),
            check_in_status: None,
        };
        let body = serde_json::to_value(update).unwrap();
        assert_eq!(body, json!({"confirmStatus": true}));
    }
}
