//! Fixed demo data loaded into every fresh router.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use serde_json::json;

use crate::models::{Booking, Camping, Profile, Review};
use crate::Db;

pub const HOST_PROFILE: &str = "user_host";
pub const GUEST_PROFILE: &str = "user_guest";

/// Listing with twelve reviews and amenities stored as an encoded string.
pub const PINE_RIDGE: i64 = 42;
pub const LAKESIDE: i64 = 7;
pub const HILLTOP: i64 = 8;

pub fn seeded() -> Db {
    let joined = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).single().unwrap_or_default();
    let mut profiles = HashMap::new();
    profiles.insert(
        HOST_PROFILE.to_string(),
        Profile {
            clerk_id: HOST_PROFILE.to_string(),
            username: "somchai".to_string(),
            firstname: "Somchai".to_string(),
            lastname: "K.".to_string(),
            image_url: None,
            created_at: joined,
        },
    );
    profiles.insert(
        GUEST_PROFILE.to_string(),
        Profile {
            clerk_id: GUEST_PROFILE.to_string(),
            username: "ann".to_string(),
            firstname: "Ann".to_string(),
            lastname: String::new(),
            image_url: None,
            created_at: joined + Duration::days(30),
        },
    );

    let campings = vec![
        Camping {
            id: PINE_RIDGE,
            title: "Pine Ridge".to_string(),
            description: "Tent pitches under the pines, ten minutes from the falls.".to_string(),
            price: 900.0,
            category: "forest".to_string(),
            lat: Some(18.7883),
            lng: Some(98.9853),
            location_name: None,
            images: vec![
                "https://images.mock/pine-1.jpg".to_string(),
                "https://images.mock/pine-2.jpg".to_string(),
            ],
            amenities: json!("[\"wifi\",\"pool\",\"hot_shower\"]"),
            rooms: 4,
            profile_id: HOST_PROFILE.to_string(),
        },
        Camping {
            id: LAKESIDE,
            title: "Lakeside Deck".to_string(),
            description: "Floating deck on the reservoir.".to_string(),
            price: 1500.0,
            category: "lake".to_string(),
            lat: Some(14.3532),
            lng: Some(99.0125),
            location_name: Some("Kanchanaburi".to_string()),
            images: vec!["https://images.mock/lake-1.jpg".to_string()],
            amenities: json!(["kayak", "wifi"]),
            rooms: 2,
            profile_id: HOST_PROFILE.to_string(),
        },
        Camping {
            id: HILLTOP,
            title: "Hilltop Field".to_string(),
            description: "Open field, bring your own tent.".to_string(),
            price: 300.0,
            category: "mountain".to_string(),
            lat: None,
            lng: None,
            location_name: None,
            images: Vec::new(),
            amenities: json!("not json"),
            rooms: 10,
            profile_id: GUEST_PROFILE.to_string(),
        },
    ];

    let first_review = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).single().unwrap_or_default();
    let reviews = (1..=12)
        .map(|n| Review {
            id: n,
            landmark_id: PINE_RIDGE,
            customer_support_rating: 5.0,
            convenience_rating: 4.0,
            signal_quality_rating: if n % 2 == 0 { 3.0 } else { 2.0 },
            text: format!("Stay number {n} was lovely."),
            profile_id: GUEST_PROFILE.to_string(),
            created_at: first_review + Duration::days(n),
        })
        .collect();

    let bookings = vec![Booking {
        id: 1,
        landmark_id: PINE_RIDGE,
        profile_id: GUEST_PROFILE.to_string(),
        check_in: date(2025, 12, 24),
        check_out: date(2025, 12, 27),
        nights: 3,
        total: 2700.0,
        payment_status: true,
        confirm_status: true,
        check_in_status: false,
        cancel_status: false,
    }];

    Db {
        profiles,
        campings,
        reviews,
        bookings,
        favorites: Vec::new(),
        checkout_sessions: HashMap::new(),
        next_booking_id: 2,
        next_favorite_id: 1,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}
