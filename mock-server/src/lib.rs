//! In-memory stand-in for the RentKub backend and the reverse-geocoding
//! service. The bearer token is taken as the caller's profile id.

mod handlers;
pub mod models;
pub mod seed;

use std::{collections::HashMap, sync::Arc};

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use models::{Booking, Camping, FavoriteRow, Message, Profile, Review};

pub struct Db {
    pub profiles: HashMap<String, Profile>,
    pub campings: Vec<Camping>,
    pub reviews: Vec<Review>,
    pub bookings: Vec<Booking>,
    pub favorites: Vec<FavoriteRow>,
    /// Checkout session id to booking id.
    pub checkout_sessions: HashMap<String, i64>,
    pub next_booking_id: i64,
    pub next_favorite_id: i64,
}

pub type SharedDb = Arc<RwLock<Db>>;

pub fn app() -> Router {
    let db: SharedDb = Arc::new(RwLock::new(seed::seeded()));
    Router::new()
        .route("/api/camping", get(handlers::list_campings))
        .route("/api/camping/profile/{profile_id}", get(handlers::list_profile_campings))
        .route("/api/camping/{id}", get(handlers::read_camping))
        .route("/api/camping/{id}/reviews", get(handlers::list_reviews))
        .route("/api/filter-camping", get(handlers::filter_campings))
        .route("/api/favorites", get(handlers::list_favorites))
        .route("/api/favorite", post(handlers::toggle_favorite))
        .route("/api/booking", post(handlers::create_booking))
        .route("/api/bookings", get(handlers::list_bookings))
        .route("/api/booking/by-camping/{id}", get(handlers::list_bookings_by_camping))
        .route("/api/booking/{id}", axum::routing::delete(handlers::delete_booking))
        .route("/api/booking/{id}/status", patch(handlers::update_booking_status))
        .route("/api/booking/{id}/cancel", patch(handlers::cancel_booking))
        .route("/api/checkout", post(handlers::checkout))
        .route("/api/checkout-status/{session}", get(handlers::checkout_status))
        .route("/api/retry-payment", post(handlers::retry_payment))
        .route("/api/host/landmarks", get(handlers::host_landmarks))
        .route("/api/host/bookings", get(handlers::host_bookings))
        .route("/api/images", post(handlers::upload_image))
        .route("/reverse", get(handlers::reverse_geocode))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Error response carrying the `{"message": ...}` body the client reads.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    message: String,
}

impl ApiFailure {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} not found"))
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Forbidden")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(Message::new(self.message))).into_response()
    }
}

/// Profile id from `Authorization: Bearer <profile>`, if any.
pub(crate) fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

pub(crate) fn require_profile(headers: &HeaderMap) -> Result<String, ApiFailure> {
    bearer(headers).ok_or_else(|| ApiFailure::new(StatusCode::UNAUTHORIZED, "Unauthorized"))
}
