//! Client core for the RentKub camping marketplace.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), and keeps the client-side
//! state of the listing, favorites and detail views.
//!
//! # Design
//! - `RentkubClient` and `GeocodeClient` are stateless; every endpoint is a
//!   `build_*` / `parse_*` pair so the I/O boundary is explicit.
//! - `CampingStore` is plain owned state with synchronous transitions over a
//!   normalized entity table.
//! - `Session` drives store actions through a caller-supplied `Transport`
//!   under a single-writer lock.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod amenities;
pub mod client;
pub mod config;
pub mod error;
pub mod geocode;
pub mod http;
pub mod session;
pub mod store;
pub mod types;

pub use amenities::{format_amenity_label, parse_amenities, Amenities};
pub use client::{RentkubClient, DEFAULT_REVIEW_PAGE_SIZE};
pub use config::ClientConfig;
pub use error::ApiError;
pub use geocode::{GeocodeClient, LocationLookup, LookupDecision, DEFAULT_LOCATION_NAME};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use session::{FavoriteOutcome, ReviewFetch, Session};
pub use store::CampingStore;
pub use types::{
    Booking, BookingQuery, BookingStatusUpdate, Camping, CampingFilter, CampingId, CampingList,
    CheckoutSession, CheckoutStatus, Coordinates, CreateBooking, Favorite, FavoriteToggle, Profile,
    RatingBreakdown, Review, ReviewPage, UploadedImage,
};
