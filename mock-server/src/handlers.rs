use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::models::{
    Booking, BookingFilter, BookingRef, BookingStatusUpdate, BookingView, Camping, CampingCollection,
    CampingDetail, CampingFilter, CampingSummary, Center, CheckoutSession, CheckoutStatus,
    CreateBooking, Envelope, FavoriteRow, FavoriteToggle, FavoriteView, ImageUpload, Message,
    RatingBreakdown, ReverseQuery, ReviewPage, ReviewQuery, ReviewView, UploadedImage,
};
use crate::{bearer, require_profile, ApiFailure, Db, SharedDb};

type ApiResult<T> = Result<Json<T>, ApiFailure>;

impl Db {
    fn camping(&self, id: i64) -> Result<&Camping, ApiFailure> {
        self.campings
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| ApiFailure::not_found("Camping"))
    }

    fn is_favorite(&self, id: i64, viewer: Option<&str>) -> bool {
        viewer.is_some_and(|profile| {
            self.favorites
                .iter()
                .any(|f| f.landmark_id == id && f.profile_id == profile)
        })
    }

    fn summary(&self, camping: &Camping, viewer: Option<&str>) -> CampingSummary {
        let ratings: Vec<f64> = self
            .reviews
            .iter()
            .filter(|r| r.landmark_id == camping.id)
            .map(|r| r.overall())
            .collect();
        let average_rating = if ratings.is_empty() {
            None
        } else {
            Some(round1(ratings.iter().sum::<f64>() / ratings.len() as f64))
        };
        CampingSummary {
            camping: camping.clone(),
            is_favorite: self.is_favorite(camping.id, viewer),
            average_rating,
            review_count: ratings.len() as u32,
        }
    }

    fn detail(&self, camping: &Camping, viewer: Option<&str>) -> CampingDetail {
        let summary = self.summary(camping, viewer);
        let reviews: Vec<_> = self.reviews.iter().filter(|r| r.landmark_id == camping.id).collect();
        let breakdown = if reviews.is_empty() {
            RatingBreakdown::default()
        } else {
            let n = reviews.len() as f64;
            RatingBreakdown {
                overall: summary.average_rating.unwrap_or(0.0),
                customer_support: round1(reviews.iter().map(|r| r.customer_support_rating).sum::<f64>() / n),
                convenience: round1(reviews.iter().map(|r| r.convenience_rating).sum::<f64>() / n),
                signal_quality: round1(reviews.iter().map(|r| r.signal_quality_rating).sum::<f64>() / n),
            }
        };
        let mut unavailable_dates: Vec<_> = self
            .bookings
            .iter()
            .filter(|b| b.landmark_id == camping.id)
            .flat_map(Booking::blocked_nights)
            .collect();
        unavailable_dates.sort();
        unavailable_dates.dedup();
        CampingDetail {
            total_reviews: summary.review_count,
            summary,
            average_ratings_by_category: breakdown,
            unavailable_dates,
            profile: self.profiles.get(&camping.profile_id).cloned(),
        }
    }

    fn collection<'a>(&self, campings: impl Iterator<Item = &'a Camping>, viewer: Option<&str>) -> CampingCollection {
        let result: Vec<_> = campings.map(|c| self.summary(c, viewer)).collect();
        let located: Vec<_> = result
            .iter()
            .filter_map(|s| Some((s.camping.lat?, s.camping.lng?)))
            .collect();
        let center = if located.is_empty() {
            None
        } else {
            let n = located.len() as f64;
            Some(Center {
                lat: located.iter().map(|(lat, _)| lat).sum::<f64>() / n,
                lng: located.iter().map(|(_, lng)| lng).sum::<f64>() / n,
            })
        };
        CampingCollection { result, center }
    }

    fn booking_view(&self, booking: &Booking) -> BookingView {
        BookingView {
            booking: booking.clone(),
            landmark: self.campings.iter().find(|c| c.id == booking.landmark_id).cloned(),
        }
    }

    fn owned_booking_mut(&mut self, id: i64, profile: &str) -> Result<&mut Booking, ApiFailure> {
        let booking = self
            .bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| ApiFailure::not_found("Booking"))?;
        if booking.profile_id != profile {
            return Err(ApiFailure::forbidden());
        }
        Ok(booking)
    }

    fn open_checkout(&mut self, booking_id: i64, profile: &str) -> Result<CheckoutSession, ApiFailure> {
        let booking = self.owned_booking_mut(booking_id, profile)?;
        if booking.cancel_status {
            return Err(ApiFailure::bad_request("Booking is cancelled"));
        }
        if booking.payment_status {
            return Err(ApiFailure::bad_request("Booking is already paid"));
        }
        let session_id = format!("cs_{}", Uuid::new_v4().simple());
        self.checkout_sessions.insert(session_id.clone(), booking_id);
        Ok(CheckoutSession {
            client_secret: format!("{session_id}_secret"),
            session_id,
        })
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub async fn list_campings(State(db): State<SharedDb>, headers: HeaderMap) -> Json<CampingCollection> {
    let viewer = bearer(&headers);
    let db = db.read().await;
    Json(db.collection(db.campings.iter(), viewer.as_deref()))
}

pub async fn list_profile_campings(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Path(profile_id): Path<String>,
) -> Json<CampingCollection> {
    let viewer = bearer(&headers);
    let db = db.read().await;
    let hosted = db.campings.iter().filter(|c| c.profile_id == profile_id);
    Json(db.collection(hosted, viewer.as_deref()))
}

pub async fn filter_campings(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Query(filter): Query<CampingFilter>,
) -> ApiResult<CampingCollection> {
    if let (Some(check_in), Some(check_out)) = (filter.check_in, filter.check_out) {
        if check_out <= check_in {
            return Err(ApiFailure::bad_request("checkOut must be after checkIn"));
        }
    }
    let viewer = bearer(&headers);
    let db = db.read().await;
    let wanted: Vec<String> = filter
        .amenities
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect();
    let search = filter.search.as_deref().map(str::to_lowercase);
    let matches = db.campings.iter().filter(|c| {
        let category_ok = filter
            .category
            .as_deref()
            .is_none_or(|cat| cat.is_empty() || c.category == cat);
        let search_ok = search
            .as_deref()
            .is_none_or(|s| c.title.to_lowercase().contains(s) || c.description.to_lowercase().contains(s));
        let price_ok = filter.price_min.is_none_or(|min| c.price >= min)
            && filter.price_max.is_none_or(|max| c.price <= max);
        let tags = c.amenity_tags();
        let amenities_ok = wanted.iter().all(|tag| tags.contains(tag));
        let dates_ok = match (filter.check_in, filter.check_out) {
            (Some(check_in), Some(check_out)) => !db
                .bookings
                .iter()
                .any(|b| b.landmark_id == c.id && b.overlaps(check_in, check_out)),
            _ => true,
        };
        category_ok && search_ok && price_ok && amenities_ok && dates_ok
    });
    Ok(Json(db.collection(matches, viewer.as_deref())))
}

pub async fn read_camping(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Envelope<CampingDetail>> {
    let viewer = bearer(&headers);
    let db = db.read().await;
    let camping = db.camping(id)?;
    Ok(Json(Envelope {
        result: db.detail(camping, viewer.as_deref()),
    }))
}

pub async fn list_reviews(
    State(db): State<SharedDb>,
    Path(id): Path<i64>,
    Query(query): Query<ReviewQuery>,
) -> ApiResult<ReviewPage> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(5).clamp(1, 50);
    let db = db.read().await;
    db.camping(id)?;
    let mut reviews: Vec<_> = db.reviews.iter().filter(|r| r.landmark_id == id).collect();
    reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let total = reviews.len() as u32;
    let page_reviews = reviews
        .into_iter()
        .skip(((page - 1) * limit) as usize)
        .take(limit as usize)
        .map(|r| ReviewView {
            review: r.clone(),
            profile: db.profiles.get(&r.profile_id).cloned(),
        })
        .collect();
    Ok(Json(ReviewPage {
        reviews: page_reviews,
        total_reviews: total,
        current_page: page,
        total_pages: total.div_ceil(limit),
    }))
}

pub async fn host_landmarks(State(db): State<SharedDb>, headers: HeaderMap) -> ApiResult<Envelope<Vec<CampingSummary>>> {
    let profile = require_profile(&headers)?;
    let db = db.read().await;
    let result = db
        .campings
        .iter()
        .filter(|c| c.profile_id == profile)
        .map(|c| db.summary(c, Some(&profile)))
        .collect();
    Ok(Json(Envelope { result }))
}

pub async fn list_favorites(State(db): State<SharedDb>, headers: HeaderMap) -> ApiResult<Envelope<Vec<FavoriteView>>> {
    let profile = require_profile(&headers)?;
    let db = db.read().await;
    let result = db
        .favorites
        .iter()
        .filter(|f| f.profile_id == profile)
        .filter_map(|f| {
            let camping = db.campings.iter().find(|c| c.id == f.landmark_id)?;
            Some(FavoriteView {
                id: f.id,
                profile_id: f.profile_id.clone(),
                landmark_id: f.landmark_id,
                landmark: db.summary(camping, Some(&profile)),
            })
        })
        .collect();
    Ok(Json(Envelope { result }))
}

/// `isFavorite` is the state the caller saw: true removes, false adds.
pub async fn toggle_favorite(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Json(input): Json<FavoriteToggle>,
) -> ApiResult<Message> {
    let profile = require_profile(&headers)?;
    let mut db = db.write().await;
    db.camping(input.camping_id)?;
    if input.is_favorite {
        db.favorites
            .retain(|f| !(f.landmark_id == input.camping_id && f.profile_id == profile));
        Ok(Json(Message::new("Remove Favorite")))
    } else {
        if !db.is_favorite(input.camping_id, Some(&profile)) {
            let id = db.next_favorite_id;
            db.next_favorite_id += 1;
            db.favorites.push(FavoriteRow {
                id,
                profile_id: profile,
                landmark_id: input.camping_id,
            });
        }
        Ok(Json(Message::new("Add Favorite")))
    }
}

pub async fn create_booking(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Json(input): Json<CreateBooking>,
) -> Result<(StatusCode, Json<Envelope<Booking>>), ApiFailure> {
    let profile = require_profile(&headers)?;
    if input.check_out <= input.check_in {
        return Err(ApiFailure::bad_request("checkOut must be after checkIn"));
    }
    let mut db = db.write().await;
    let price = db.camping(input.camping_id)?.price;
    let taken = db
        .bookings
        .iter()
        .any(|b| b.landmark_id == input.camping_id && b.overlaps(input.check_in, input.check_out));
    if taken {
        return Err(ApiFailure::new(StatusCode::CONFLICT, "Dates unavailable"));
    }
    let nights = (input.check_out - input.check_in).num_days() as u32;
    let booking = Booking {
        id: db.next_booking_id,
        landmark_id: input.camping_id,
        profile_id: profile,
        check_in: input.check_in,
        check_out: input.check_out,
        nights,
        total: price * nights as f64,
        payment_status: false,
        confirm_status: false,
        check_in_status: false,
        cancel_status: false,
    };
    db.next_booking_id += 1;
    db.bookings.push(booking.clone());
    info!(id = booking.id, camping = booking.landmark_id, "booking created");
    Ok((StatusCode::CREATED, Json(Envelope { result: booking })))
}

pub async fn list_bookings(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Query(filter): Query<BookingFilter>,
) -> ApiResult<Envelope<Vec<BookingView>>> {
    let profile = require_profile(&headers)?;
    let db = db.read().await;
    let result = db
        .bookings
        .iter()
        .filter(|b| b.profile_id == profile)
        .filter(|b| filter.camping_id.is_none_or(|id| b.landmark_id == id))
        .filter(|b| match filter.status.as_deref() {
            Some("paid") => b.payment_status && !b.cancel_status,
            Some("pending") => !b.payment_status && !b.cancel_status,
            Some("cancelled") => b.cancel_status,
            _ => true,
        })
        .map(|b| db.booking_view(b))
        .collect();
    Ok(Json(Envelope { result }))
}

pub async fn list_bookings_by_camping(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Envelope<Vec<BookingView>>> {
    require_profile(&headers)?;
    let db = db.read().await;
    db.camping(id)?;
    let result = db
        .bookings
        .iter()
        .filter(|b| b.landmark_id == id && !b.cancel_status)
        .map(|b| db.booking_view(b))
        .collect();
    Ok(Json(Envelope { result }))
}

pub async fn update_booking_status(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(update): Json<BookingStatusUpdate>,
) -> ApiResult<Envelope<Booking>> {
    let profile = require_profile(&headers)?;
    let mut db = db.write().await;
    let landmark_id = db
        .bookings
        .iter()
        .find(|b| b.id == id)
        .map(|b| b.landmark_id)
        .ok_or_else(|| ApiFailure::not_found("Booking"))?;
    if db.camping(landmark_id)?.profile_id != profile {
        return Err(ApiFailure::forbidden());
    }
    let booking = db
        .bookings
        .iter_mut()
        .find(|b| b.id == id)
        .ok_or_else(|| ApiFailure::not_found("Booking"))?;
    if let Some(confirm) = update.confirm_status {
        booking.confirm_status = confirm;
    }
    if let Some(checked_in) = update.check_in_status {
        booking.check_in_status = checked_in;
    }
    Ok(Json(Envelope {
        result: booking.clone(),
    }))
}

pub async fn cancel_booking(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Envelope<Booking>> {
    let profile = require_profile(&headers)?;
    let mut db = db.write().await;
    let booking = db.owned_booking_mut(id, &profile)?;
    if booking.check_in_status {
        return Err(ApiFailure::bad_request("Booking already checked in"));
    }
    booking.cancel_status = true;
    Ok(Json(Envelope {
        result: booking.clone(),
    }))
}

pub async fn delete_booking(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Message> {
    let profile = require_profile(&headers)?;
    let mut db = db.write().await;
    db.owned_booking_mut(id, &profile)?;
    db.bookings.retain(|b| b.id != id);
    db.checkout_sessions.retain(|_, booking| *booking != id);
    Ok(Json(Message::new("Booking deleted")))
}

pub async fn checkout(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Json(input): Json<BookingRef>,
) -> ApiResult<CheckoutSession> {
    let profile = require_profile(&headers)?;
    let mut db = db.write().await;
    Ok(Json(db.open_checkout(input.id, &profile)?))
}

pub async fn retry_payment(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Json(input): Json<BookingRef>,
) -> ApiResult<CheckoutSession> {
    let profile = require_profile(&headers)?;
    let mut db = db.write().await;
    db.checkout_sessions.retain(|_, booking| *booking != input.id);
    Ok(Json(db.open_checkout(input.id, &profile)?))
}

/// Completing the status lookup marks the booking paid, standing in for the
/// payment provider's redirect.
pub async fn checkout_status(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Path(session): Path<String>,
) -> ApiResult<CheckoutStatus> {
    let profile = require_profile(&headers)?;
    let mut db = db.write().await;
    let booking_id = *db
        .checkout_sessions
        .get(&session)
        .ok_or_else(|| ApiFailure::not_found("Session"))?;
    let booking = db.owned_booking_mut(booking_id, &profile)?;
    booking.payment_status = true;
    Ok(Json(CheckoutStatus {
        status: "complete".to_string(),
        message: "Payment completed".to_string(),
    }))
}

pub async fn host_bookings(State(db): State<SharedDb>, headers: HeaderMap) -> ApiResult<Envelope<Vec<BookingView>>> {
    let profile = require_profile(&headers)?;
    let db = db.read().await;
    let hosted: Vec<i64> = db
        .campings
        .iter()
        .filter(|c| c.profile_id == profile)
        .map(|c| c.id)
        .collect();
    let result = db
        .bookings
        .iter()
        .filter(|b| hosted.contains(&b.landmark_id))
        .map(|b| db.booking_view(b))
        .collect();
    Ok(Json(Envelope { result }))
}

pub async fn upload_image(headers: HeaderMap, Json(input): Json<ImageUpload>) -> ApiResult<Envelope<UploadedImage>> {
    require_profile(&headers)?;
    let extension = input
        .image
        .strip_prefix("data:image/")
        .and_then(|rest| rest.split(';').next())
        .filter(|ext| !ext.is_empty())
        .ok_or_else(|| ApiFailure::bad_request("Expected an image data URL"))?;
    Ok(Json(Envelope {
        result: UploadedImage {
            url: format!("https://images.mock/{}.{extension}", Uuid::new_v4()),
        },
    }))
}

/// Northern Thailand resolves to a town; anywhere else gets nominatim's
/// "unable to geocode" body.
pub async fn reverse_geocode(Query(query): Query<ReverseQuery>) -> Json<serde_json::Value> {
    if (17.0..21.0).contains(&query.lat) && (97.0..101.0).contains(&query.lon) {
        Json(serde_json::json!({
            "display_name": "Mae Rim, Chiang Mai, Thailand",
            "address": {
                "town": "Mae Rim",
                "state": "Chiang Mai",
                "country": "Thailand"
            }
        }))
    } else {
        Json(serde_json::json!({ "error": "Unable to geocode" }))
    }
}
