//! Stateless HTTP request builder and response parser for the RentKub API.
//!
//! # Design
//! `RentkubClient` holds only a `base_url` and carries no mutable state
//! between calls. Each endpoint is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. The caller executes the HTTP round-trip in between; there
//! is no retry and no timeout at this layer.
//!
//! Public endpoints take `Option<&str>` tokens, protected endpoints take
//! `&str`. A present token always becomes `Authorization: Bearer <token>`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::form_urlencoded;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    Booking, BookingQuery, BookingRef, BookingStatusUpdate, Camping, CampingFilter, CampingId,
    CampingList, CheckoutSession, CheckoutStatus, CreateBooking, Favorite, FavoriteToggle,
    ImageUpload, MessageResponse, ResultEnvelope, ReviewPage, UploadedImage,
};

/// Default page size for review pagination.
pub const DEFAULT_REVIEW_PAGE_SIZE: u32 = 5;

/// Synchronous, stateless client for the RentKub API.
#[derive(Debug, Clone)]
pub struct RentkubClient {
    base_url: String,
}

impl RentkubClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.api_base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// All listings, or only those hosted by `profile_id`.
    pub fn build_list_campings(&self, profile_id: Option<&str>, token: Option<&str>) -> HttpRequest {
        let path = match profile_id {
            Some(profile_id) => format!("/api/camping/profile/{}", encode_segment(profile_id)),
            None => "/api/camping".to_string(),
        };
        self.request(HttpMethod::Get, &path, token)
    }

    pub fn build_filter_campings(&self, filter: &CampingFilter, token: Option<&str>) -> HttpRequest {
        let path = with_query("/api/filter-camping", &filter.query_pairs());
        self.request(HttpMethod::Get, &path, token)
    }

    pub fn build_read_camping(&self, id: CampingId, token: Option<&str>) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/api/camping/{id}"), token)
    }

    pub fn build_list_reviews(&self, id: CampingId, page: u32, limit: u32) -> HttpRequest {
        let path = with_query(
            &format!("/api/camping/{id}/reviews"),
            &[("page", page.to_string()), ("limit", limit.to_string())],
        );
        self.request(HttpMethod::Get, &path, None)
    }

    pub fn build_host_landmarks(&self, token: &str) -> HttpRequest {
        self.request(HttpMethod::Get, "/api/host/landmarks", Some(token))
    }

    pub fn parse_list_campings(&self, response: HttpResponse) -> Result<CampingList, ApiError> {
        check_status(&response)?;
        decode(&response.body)
    }

    pub fn parse_filter_campings(&self, response: HttpResponse) -> Result<CampingList, ApiError> {
        self.parse_list_campings(response)
    }

    /// The backend answers with either one listing or a one-element array.
    pub fn parse_read_camping(&self, response: HttpResponse) -> Result<Camping, ApiError> {
        check_status(&response)?;
        let envelope: ResultEnvelope<Value> = decode(&response.body)?;
        let value = match envelope.result {
            Value::Array(items) => items.into_iter().next().ok_or(ApiError::NotFound)?,
            Value::Null => return Err(ApiError::NotFound),
            other => other,
        };
        serde_json::from_value(value).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn parse_list_reviews(&self, response: HttpResponse) -> Result<ReviewPage, ApiError> {
        check_status(&response)?;
        decode(&response.body)
    }

    pub fn parse_host_landmarks(&self, response: HttpResponse) -> Result<Vec<Camping>, ApiError> {
        parse_result(response)
    }

    pub fn build_list_favorites(&self, token: &str) -> HttpRequest {
        self.request(HttpMethod::Get, "/api/favorites", Some(token))
    }

    pub fn build_toggle_favorite(&self, token: &str, toggle: &FavoriteToggle) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/api/favorite", Some(token), toggle)
    }

    pub fn parse_list_favorites(&self, response: HttpResponse) -> Result<Vec<Favorite>, ApiError> {
        parse_result(response)
    }

    /// Returns the backend's confirmation message.
    pub fn parse_toggle_favorite(&self, response: HttpResponse) -> Result<String, ApiError> {
        check_status(&response)?;
        let body: MessageResponse = decode(&response.body)?;
        Ok(body.message)
    }

    /// Date validity is the backend's call; an inverted range comes back as
    /// a 400 through `parse_create_booking`.
    pub fn build_create_booking(&self, token: &str, input: &CreateBooking) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/api/booking", Some(token), input)
    }

    pub fn build_list_bookings(&self, token: &str, query: &BookingQuery) -> HttpRequest {
        let path = with_query("/api/bookings", &query.query_pairs());
        self.request(HttpMethod::Get, &path, Some(token))
    }

    pub fn build_list_bookings_by_camping(&self, token: &str, id: CampingId) -> Result<HttpRequest, ApiError> {
        if id.0 <= 0 {
            return Err(ApiError::InvalidInput("camping id is required".to_string()));
        }
        Ok(self.request(HttpMethod::Get, &format!("/api/booking/by-camping/{id}"), Some(token)))
    }

    pub fn build_checkout(&self, token: &str, booking_id: i64) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/api/checkout", Some(token), &BookingRef { id: booking_id })
    }

    pub fn build_checkout_status(&self, token: &str, session_id: &str) -> HttpRequest {
        let path = format!("/api/checkout-status/{}", encode_segment(session_id));
        self.request(HttpMethod::Get, &path, Some(token))
    }

    /// Open a new payment session for a booking whose payment failed.
    pub fn build_retry_payment(&self, token: &str, booking_id: i64) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/api/retry-payment", Some(token), &BookingRef { id: booking_id })
    }

    pub fn build_update_booking_status(
        &self,
        token: &str,
        booking_id: i64,
        update: &BookingStatusUpdate,
    ) -> Result<HttpRequest, ApiError> {
        let path = format!("/api/booking/{booking_id}/status");
        self.json_request(HttpMethod::Patch, &path, Some(token), update)
    }

    pub fn build_cancel_booking(&self, token: &str, booking_id: i64) -> Result<HttpRequest, ApiError> {
        let path = format!("/api/booking/{booking_id}/cancel");
        self.json_request(HttpMethod::Patch, &path, Some(token), &serde_json::json!({}))
    }

    pub fn build_delete_booking(&self, token: &str, booking_id: i64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/api/booking/{booking_id}"), Some(token))
    }

    pub fn build_host_bookings(&self, token: &str) -> HttpRequest {
        self.request(HttpMethod::Get, "/api/host/bookings", Some(token))
    }

    pub fn parse_create_booking(&self, response: HttpResponse) -> Result<Booking, ApiError> {
        parse_result(response)
    }

    pub fn parse_list_bookings(&self, response: HttpResponse) -> Result<Vec<Booking>, ApiError> {
        parse_result(response)
    }

    pub fn parse_checkout(&self, response: HttpResponse) -> Result<CheckoutSession, ApiError> {
        check_status(&response)?;
        decode(&response.body)
    }

    pub fn parse_checkout_status(&self, response: HttpResponse) -> Result<CheckoutStatus, ApiError> {
        check_status(&response)?;
        decode(&response.body)
    }

    pub fn parse_retry_payment(&self, response: HttpResponse) -> Result<CheckoutSession, ApiError> {
        self.parse_checkout(response)
    }

    /// Bookings on every listing the caller hosts.
    pub fn parse_host_bookings(&self, response: HttpResponse) -> Result<Vec<Booking>, ApiError> {
        parse_result(response)
    }

    pub fn parse_update_booking_status(&self, response: HttpResponse) -> Result<Booking, ApiError> {
        parse_result(response)
    }

    pub fn parse_cancel_booking(&self, response: HttpResponse) -> Result<Booking, ApiError> {
        parse_result(response)
    }

    pub fn parse_delete_booking(&self, response: HttpResponse) -> Result<String, ApiError> {
        check_status(&response)?;
        let body: MessageResponse = decode(&response.body)?;
        Ok(body.message)
    }

    /// Upload an image given as a data URL.
    pub fn build_upload_image(&self, token: &str, image: &str) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/api/images", Some(token), &ImageUpload { image })
    }

    pub fn parse_upload_image(&self, response: HttpResponse) -> Result<UploadedImage, ApiError> {
        parse_result(response)
    }

    fn request(&self, method: HttpMethod, path: &str, token: Option<&str>) -> HttpRequest {
        let url = format!("{}{path}", self.base_url);
        debug!(method = method.as_str(), url = %url, authorized = token.is_some(), "built request");
        HttpRequest {
            method,
            path: url,
            headers: auth_headers(token),
            body: None,
        }
    }

    fn json_request<T: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        token: Option<&str>,
        body: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut request = self.request(method, path, token);
        request
            .headers
            .push(("content-type".to_string(), "application/json".to_string()));
        request.body = Some(body);
        Ok(request)
    }
}

fn auth_headers(token: Option<&str>) -> Vec<(String, String)> {
    match token {
        Some(token) => vec![("authorization".to_string(), format!("Bearer {token}"))],
        None => Vec::new(),
    }
}

fn with_query(path: &str, pairs: &[(&str, String)]) -> String {
    if pairs.is_empty() {
        return path.to_string();
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())))
        .finish();
    format!("{path}?{query}")
}

/// Percent-encode one path segment; a space becomes `%20`, never `+`.
fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

fn parse_result<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    let envelope: ResultEnvelope<T> = decode(&response.body)?;
    Ok(envelope.result)
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    match response.status {
        401 => Err(ApiError::Unauthorized),
        404 => Err(ApiError::NotFound),
        status => Err(ApiError::Http {
            status,
            message: serde_json::from_str::<MessageResponse>(&response.body)
                .ok()
                .map(|m| m.message),
            body: response.body.clone(),
        }),
    }
}
