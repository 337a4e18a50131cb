//! Best-effort reverse geocoding of a listing's coordinates.
//!
//! `GeocodeClient` follows the same build/parse split as `RentkubClient`.
//! `LocationLookup` binds one lookup to the lifetime of a view: a newer
//! request or an explicit `cancel` invalidates older tickets, and completing
//! an invalidated ticket writes nothing.

use serde::Deserialize;
use tracing::debug;
use url::form_urlencoded;

use crate::config::ClientConfig;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::Coordinates;

/// Label shown when a listing carries neither a name nor coordinates.
pub const DEFAULT_LOCATION_NAME: &str = "Location details unavailable";

#[derive(Debug, Clone)]
pub struct GeocodeClient {
    base_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<Address>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl GeocodeClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.geocoder_base_url)
    }

    pub fn build_reverse(&self, at: Coordinates) -> HttpRequest {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("format", "jsonv2")
            .append_pair("lat", &at.lat.to_string())
            .append_pair("lon", &at.lng.to_string())
            .append_pair("zoom", "10")
            .append_pair("addressdetails", "1")
            .finish();
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/reverse?{query}", self.base_url),
            headers: vec![("accept".to_string(), "application/json".to_string())],
            body: None,
        }
    }

    /// Most specific place name in the response, or a coordinate label when
    /// the lookup failed or named nothing.
    pub fn parse_reverse(&self, response: HttpResponse, at: Coordinates) -> String {
        if !response.is_success() {
            debug!(status = response.status, "reverse geocode failed");
            return fallback_label(at);
        }
        let parsed: ReverseResponse = match serde_json::from_str(&response.body) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(error = %e, "reverse geocode body unreadable");
                return fallback_label(at);
            }
        };
        parsed
            .address
            .and_then(|a| {
                [a.city, a.town, a.village, a.county, a.state, a.country]
                    .into_iter()
                    .flatten()
                    .find(|name| !name.is_empty())
            })
            .unwrap_or_else(|| fallback_label(at))
    }
}

/// `Area near (18.79, 98.98)`.
pub fn fallback_label(at: Coordinates) -> String {
    format!("Area near ({:.2}, {:.2})", at.lat, at.lng)
}

/// Proof that a lookup was issued; only the newest ticket may complete.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookupTicket {
    generation: u64,
    pub at: Coordinates,
}

/// What a view should do about its location label.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupDecision {
    /// The label is already known; no network call.
    Known(String),
    /// Issue this request and hand the outcome back with the ticket.
    Fetch(LookupTicket),
}

/// Location label state owned by one detail view.
#[derive(Debug, Default)]
pub struct LocationLookup {
    generation: u64,
    label: Option<String>,
}

impl LocationLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide how to label a listing. Any earlier ticket is invalidated.
    pub fn request(&mut self, at: Option<Coordinates>, known_name: Option<&str>) -> LookupDecision {
        self.generation += 1;
        let known = known_name.filter(|name| !name.is_empty() && *name != DEFAULT_LOCATION_NAME);
        match (known, at) {
            (Some(name), _) => {
                self.label = Some(name.to_string());
                LookupDecision::Known(name.to_string())
            }
            (None, Some(at)) => {
                self.label = None;
                LookupDecision::Fetch(LookupTicket {
                    generation: self.generation,
                    at,
                })
            }
            (None, None) => {
                self.label = Some(DEFAULT_LOCATION_NAME.to_string());
                LookupDecision::Known(DEFAULT_LOCATION_NAME.to_string())
            }
        }
    }

    /// Store the lookup result. Returns false and leaves the label untouched
    /// when the ticket has been superseded or cancelled.
    pub fn complete(&mut self, ticket: LookupTicket, label: String) -> bool {
        if ticket.generation != self.generation {
            debug!(stale = ticket.generation, current = self.generation, "dropping stale location");
            return false;
        }
        self.label = Some(label);
        true
    }

    /// The view went away or its coordinates changed.
    pub fn cancel(&mut self) {
        self.generation += 1;
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHIANG_MAI: Coordinates = Coordinates { lat: 18.7883, lng: 98.9853 };

    fn geocoder() -> GeocodeClient {
        GeocodeClient::new("https://nominatim.openstreetmap.org/")
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn reverse_request_query() {
        let req = geocoder().build_reverse(CHIANG_MAI);
        assert_eq!(
            req.path,
            "https://nominatim.openstreetmap.org/reverse?format=jsonv2&lat=18.7883&lon=98.9853&zoom=10&addressdetails=1"
        );
    }

    #[test]
    fn picks_most_specific_place() {
        let label = geocoder().parse_reverse(
            ok(r#"{"address":{"village":"Mae Rim","state":"Chiang Mai","country":"Thailand"}}"#),
            CHIANG_MAI,
        );
        assert_eq!(label, "Mae Rim");
    }

    #[test]
    fn failures_fall_back_to_coordinates() {
        let g = geocoder();
        assert_eq!(g.parse_reverse(ok("{}"), CHIANG_MAI), "Area near (18.79, 98.99)");
        assert_eq!(g.parse_reverse(ok("<html>"), CHIANG_MAI), "Area near (18.79, 98.99)");
        let error = HttpResponse {
            status: 503,
            headers: Vec::new(),
            body: String::new(),
        };
        assert_eq!(g.parse_reverse(error, CHIANG_MAI), "Area near (18.79, 98.99)");
    }

    #[test]
    fn known_name_skips_lookup() {
        let mut lookup = LocationLookup::new();
        let decision = lookup.request(Some(CHIANG_MAI), Some("Doi Suthep"));
        assert_eq!(decision, LookupDecision::Known("Doi Suthep".to_string()));
        assert_eq!(lookup.label(), Some("Doi Suthep"));
    }

    #[test]
    fn default_name_with_coordinates_fetches() {
        let mut lookup = LocationLookup::new();
        let decision = lookup.request(Some(CHIANG_MAI), Some(DEFAULT_LOCATION_NAME));
        assert!(matches!(decision, LookupDecision::Fetch(_)));
        assert_eq!(lookup.label(), None);
    }

    #[test]
    fn no_coordinates_uses_default_label() {
        let mut lookup = LocationLookup::new();
        let decision = lookup.request(None, None);
        assert_eq!(decision, LookupDecision::Known(DEFAULT_LOCATION_NAME.to_string()));
    }

    #[test]
    fn cancelled_ticket_writes_nothing() {
        let mut lookup = LocationLookup::new();
        let LookupDecision::Fetch(ticket) = lookup.request(Some(CHIANG_MAI), None) else {
            panic!("expected fetch");
        };
        lookup.cancel();
        assert!(!lookup.complete(ticket, "Mae Rim".to_string()));
        assert_eq!(lookup.label(), None);
    }

    #[test]
    fn superseded_ticket_writes_nothing() {
        let mut lookup = LocationLookup::new();
        let LookupDecision::Fetch(first) = lookup.request(Some(CHIANG_MAI), None) else {
            panic!("expected fetch");
        };
        let other = Coordinates { lat: 7.88, lng: 98.39 };
        let LookupDecision::Fetch(second) = lookup.request(Some(other), None) else {
            panic!("expected fetch");
        };
        assert!(!lookup.complete(first, "Mae Rim".to_string()));
        assert!(lookup.complete(second, "Phuket".to_string()));
        assert_eq!(lookup.label(), Some("Phuket"));
    }
}
