use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub clerk_id: String,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A listing row. `amenities` is kept as stored: some rows hold an array,
/// older rows hold the array serialized into a string.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camping {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub location_name: Option<String>,
    pub images: Vec<String>,
    pub amenities: Value,
    pub rooms: u32,
    pub profile_id: String,
}

impl Camping {
    pub fn amenity_tags(&self) -> Vec<String> {
        let parsed = match &self.amenities {
            Value::String(raw) => serde_json::from_str(raw).unwrap_or(Value::Null),
            other => other.clone(),
        };
        match parsed {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub landmark_id: i64,
    pub customer_support_rating: f64,
    pub convenience_rating: f64,
    pub signal_quality_rating: f64,
    pub text: String,
    pub profile_id: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn overall(&self) -> f64 {
        (self.customer_support_rating + self.convenience_rating + self.signal_quality_rating) / 3.0
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub landmark_id: i64,
    pub profile_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: u32,
    pub total: f64,
    pub payment_status: bool,
    pub confirm_status: bool,
    pub check_in_status: bool,
    pub cancel_status: bool,
}

impl Booking {
    /// Nights this booking blocks, unless it was cancelled.
    pub fn blocked_nights(&self) -> Vec<NaiveDate> {
        if self.cancel_status {
            return Vec::new();
        }
        self.check_in
            .iter_days()
            .take_while(|day| *day < self.check_out)
            .collect()
    }

    pub fn overlaps(&self, check_in: NaiveDate, check_out: NaiveDate) -> bool {
        !self.cancel_status && self.check_in < check_out && check_in < self.check_out
    }
}

#[derive(Clone, Debug)]
pub struct FavoriteRow {
    pub id: i64,
    pub profile_id: String,
    pub landmark_id: i64,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingBreakdown {
    pub overall: f64,
    pub customer_support: f64,
    pub convenience: f64,
    pub signal_quality: f64,
}

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub result: T,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Center {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize)]
pub struct CampingCollection {
    pub result: Vec<CampingSummary>,
    pub center: Option<Center>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampingSummary {
    #[serde(flatten)]
    pub camping: Camping,
    pub is_favorite: bool,
    pub average_rating: Option<f64>,
    pub review_count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampingDetail {
    #[serde(flatten)]
    pub summary: CampingSummary,
    pub total_reviews: u32,
    pub average_ratings_by_category: RatingBreakdown,
    pub unavailable_dates: Vec<NaiveDate>,
    pub profile: Option<Profile>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPage {
    pub reviews: Vec<ReviewView>,
    pub total_reviews: u32,
    pub current_page: u32,
    pub total_pages: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    #[serde(flatten)]
    pub review: Review,
    pub profile: Option<Profile>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteView {
    pub id: i64,
    pub profile_id: String,
    pub landmark_id: i64,
    pub landmark: CampingSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    pub landmark: Option<Camping>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub client_secret: String,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutStatus {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UploadedImage {
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteToggle {
    pub camping_id: i64,
    pub is_favorite: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBooking {
    pub camping_id: i64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct BookingRef {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingStatusUpdate {
    pub confirm_status: Option<bool>,
    pub check_in_status: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ImageUpload {
    pub image: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampingFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub amenities: Option<String>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingFilter {
    pub status: Option<String>,
    pub camping_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ReverseQuery {
    pub lat: f64,
    pub lon: f64,
}
