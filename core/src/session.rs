//! Store actions driven over a host transport.
//!
//! # Design
//! `Session` is the single writer of a `CampingStore`. Each action takes the
//! lock to run the `*_requested` transition, releases it for the network
//! round-trip, and takes it again to apply the outcome. Readers either clone
//! a `snapshot` or borrow the state through `read`; neither can observe a
//! half-applied update.

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::client::RentkubClient;
use crate::error::ApiError;
use crate::geocode::{GeocodeClient, LocationLookup, LookupDecision};
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::store::CampingStore;
use crate::types::{CampingFilter, CampingId, Coordinates, FavoriteToggle};

/// Message reported when a failed toggle carries no backend message.
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred";

/// Result of a favorite toggle, suitable for a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteOutcome {
    pub success: bool,
    pub message: String,
}

/// What happened to a "load more reviews" call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewFetch {
    /// The page was appended to the current detail's reviews.
    Applied { appended: usize },
    /// A fetch for the same listing was already in flight; nothing was sent.
    Skipped,
    /// The page arrived after the viewer left the listing.
    Discarded,
}

pub struct Session<T> {
    client: RentkubClient,
    transport: T,
    store: Mutex<CampingStore>,
}

impl<T: Transport> Session<T> {
    pub fn new(client: RentkubClient, transport: T) -> Self {
        Self {
            client,
            transport,
            store: Mutex::new(CampingStore::new()),
        }
    }

    pub fn client(&self) -> &RentkubClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> CampingStore {
        self.store.lock().clone()
    }

    /// Borrow the current state for the duration of `f`.
    pub fn read<R>(&self, f: impl FnOnce(&CampingStore) -> R) -> R {
        f(&self.store.lock())
    }

    /// Load every listing, or the listings hosted by `profile_id`.
    pub fn load_campings(&self, profile_id: Option<&str>, token: Option<&str>) -> Result<(), ApiError> {
        let request = self.client.build_list_campings(profile_id, token);
        self.load_collection(request)
    }

    pub fn filter_campings(&self, filter: &CampingFilter, token: Option<&str>) -> Result<(), ApiError> {
        let request = self.client.build_filter_campings(filter, token);
        self.load_collection(request)
    }

    fn load_collection(&self, request: HttpRequest) -> Result<(), ApiError> {
        self.store.lock().collection_requested();
        let outcome = self
            .round_trip(&request)
            .and_then(|response| self.client.parse_list_campings(response));
        let mut store = self.store.lock();
        match outcome {
            Ok(list) => {
                store.collection_loaded(list);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "loading listings failed");
                store.collection_failed();
                Err(e)
            }
        }
    }

    /// Load one listing into the detail slot. The previous detail and its
    /// reviews are cleared before the request is sent.
    pub fn load_detail(&self, id: CampingId, token: Option<&str>) -> Result<(), ApiError> {
        let request = self.client.build_read_camping(id, token);
        self.store.lock().detail_requested(id);
        let outcome = self
            .round_trip(&request)
            .and_then(|response| self.client.parse_read_camping(response));
        let mut store = self.store.lock();
        match outcome {
            Ok(camping) if camping.id == id => {
                store.detail_loaded(camping);
                Ok(())
            }
            Ok(camping) => {
                store.detail_failed(id);
                Err(ApiError::Deserialization(format!(
                    "requested listing {id}, received {}",
                    camping.id
                )))
            }
            Err(e) => {
                warn!(%id, error = %e, "loading listing failed");
                store.detail_failed(id);
                Err(e)
            }
        }
    }

    /// Flip a listing's favorite flag on the backend, then mirror the change
    /// into every view. Failures leave the store untouched.
    pub fn toggle_favorite(&self, token: &str, toggle: FavoriteToggle) -> FavoriteOutcome {
        let outcome = self
            .client
            .build_toggle_favorite(token, &toggle)
            .and_then(|request| self.round_trip(&request))
            .and_then(|response| self.client.parse_toggle_favorite(response));
        match outcome {
            Ok(message) => {
                self.store.lock().favorite_toggled(toggle);
                FavoriteOutcome {
                    success: true,
                    message,
                }
            }
            Err(e) => {
                warn!(id = %toggle.camping_id, error = %e, "favorite toggle failed");
                FavoriteOutcome {
                    success: false,
                    message: e.server_message().unwrap_or(GENERIC_FAILURE_MESSAGE).to_string(),
                }
            }
        }
    }

    pub fn load_favorites(&self, token: &str) -> Result<(), ApiError> {
        let request = self.client.build_list_favorites(token);
        let favorites = self
            .round_trip(&request)
            .and_then(|response| self.client.parse_list_favorites(response))?;
        self.store.lock().favorites_loaded(favorites);
        Ok(())
    }

    /// Fetch one more page of a listing's reviews. At most one fetch per
    /// listing is in flight; extra calls return `Skipped` without I/O.
    pub fn load_more_reviews(&self, listing: CampingId, page: u32, limit: u32) -> Result<ReviewFetch, ApiError> {
        let ticket = match self.store.lock().reviews_requested(listing) {
            Some(ticket) => ticket,
            None => return Ok(ReviewFetch::Skipped),
        };
        let request = self.client.build_list_reviews(listing, page, limit);
        let outcome = self
            .round_trip(&request)
            .and_then(|response| self.client.parse_list_reviews(response));
        let mut store = self.store.lock();
        match outcome {
            Ok(page) => Ok(match store.reviews_loaded(ticket, page) {
                Some(appended) => ReviewFetch::Applied { appended },
                None => ReviewFetch::Discarded,
            }),
            Err(e) => {
                warn!(%listing, page, error = %e, "loading reviews failed");
                store.reviews_failed(ticket);
                Err(e)
            }
        }
    }

    pub fn clear_detail(&self) {
        self.store.lock().clear_detail();
    }

    pub fn set_user_location(&self, location: Coordinates) {
        self.store.lock().set_user_location(location);
    }

    /// Resolve a place name for the current detail. Lookups are best-effort:
    /// transport failures become a coordinate label, and a lookup that was
    /// cancelled meanwhile writes nothing.
    pub fn resolve_location(&self, geocoder: &GeocodeClient, lookup: &mut LocationLookup) -> Option<String> {
        let (at, known) = self.read(|store| {
            store
                .current_detail()
                .map(|c| (c.coordinates(), c.location_name.clone()))
        })?;
        match lookup.request(at, known.as_deref()) {
            LookupDecision::Known(label) => Some(label),
            LookupDecision::Fetch(ticket) => {
                let request = geocoder.build_reverse(ticket.at);
                let label = match self.round_trip(&request) {
                    Ok(response) => geocoder.parse_reverse(response, ticket.at),
                    Err(e) => {
                        debug!(error = %e, "reverse geocode transport failed");
                        crate::geocode::fallback_label(ticket.at)
                    }
                };
                lookup.complete(ticket, label);
                lookup.label().map(str::to_string)
            }
        }
    }

    fn round_trip(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = request.method.as_str(), url = %request.path, "sending");
        self.transport.execute(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DEFAULT_REVIEW_PAGE_SIZE;
    use parking_lot::Mutex as PlMutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    /// Replays canned responses in order and records every request.
    #[derive(Default)]
    struct Scripted {
        responses: PlMutex<VecDeque<Result<HttpResponse, ApiError>>>,
        sent: PlMutex<Vec<HttpRequest>>,
    }

    impl Scripted {
        fn reply(self, status: u16, body: &str) -> Self {
            self.responses.lock().push_back(Ok(HttpResponse {
                status,
                headers: Vec::new(),
                body: body.to_string(),
            }));
            self
        }

        fn fail(self) -> Self {
            self.responses
                .lock()
                .push_back(Err(ApiError::Transport("connection refused".to_string())));
            self
        }

        fn sent(&self) -> Vec<HttpRequest> {
            self.sent.lock().clone()
        }
    }

    impl Transport for Scripted {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            self.sent.lock().push(request.clone());
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::Transport("no scripted response".to_string())))
        }
    }

    fn session(transport: Scripted) -> Session<Scripted> {
        Session::new(RentkubClient::new("http://api.test"), transport)
    }

    fn reviews_body(range: std::ops::Range<i64>, current: u32, total: u32) -> String {
        let reviews: Vec<_> = range
            .map(|id| {
                serde_json::json!({
                    "id": id,
                    "landmarkId": 42,
                    "text": "ok",
                    "createdAt": "2025-01-01T00:00:00Z"
                })
            })
            .collect();
        serde_json::json!({
            "reviews": reviews,
            "totalReviews": total,
            "currentPage": current
        })
        .to_string()
    }

    #[test]
    fn load_campings_replaces_collection() {
        let s = session(Scripted::default().reply(200, r#"{"result":[{"id":1},{"id":2}],"center":null}"#));
        s.load_campings(None, None).unwrap();
        let store = s.snapshot();
        assert_eq!(store.campings().len(), 2);
        assert!(!store.is_loading());
    }

    #[test]
    fn failed_collection_load_keeps_listings() {
        let s = session(
            Scripted::default()
                .reply(200, r#"{"result":[{"id":1}]}"#)
                .fail(),
        );
        s.load_campings(None, None).unwrap();
        assert!(s.filter_campings(&CampingFilter::default(), None).is_err());
        s.read(|store| {
            assert_eq!(store.campings().len(), 1);
            assert!(!store.is_loading());
        });
    }

    #[test]
    fn detail_then_reviews_end_to_end() {
        let s = session(
            Scripted::default()
                .reply(200, r#"{"result":{"id":42,"title":"Pine","amenities":"[\"wifi\",\"pool\"]","totalReviews":12}}"#)
                .reply(200, &reviews_body(0..5, 1, 12))
                .reply(200, &reviews_body(5..10, 2, 12)),
        );
        s.load_detail(CampingId(42), Some("tok")).unwrap();
        assert_eq!(s.read(|st| st.total_reviews()), 12);

        let first = s.load_more_reviews(CampingId(42), 1, DEFAULT_REVIEW_PAGE_SIZE).unwrap();
        assert_eq!(first, ReviewFetch::Applied { appended: 5 });
        let second = s.load_more_reviews(CampingId(42), 2, DEFAULT_REVIEW_PAGE_SIZE).unwrap();
        assert_eq!(second, ReviewFetch::Applied { appended: 5 });

        let store = s.snapshot();
        assert_eq!(store.reviews().len(), 10);
        assert_eq!(store.current_reviews_page(), 2);
        let detail = store.current_detail().unwrap();
        assert_eq!(detail.amenities.len(), 2);
        assert!(detail.amenities.contains("pool"));
        assert_eq!(
            s.transport().sent()[2].path,
            "http://api.test/api/camping/42/reviews?page=2&limit=5"
        );
    }

    #[test]
    fn mismatched_detail_id_is_rejected() {
        let s = session(Scripted::default().reply(200, r#"{"result":{"id":7}}"#));
        let err = s.load_detail(CampingId(42), None).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
        s.read(|store| {
            assert!(store.current_detail().is_none());
            assert!(!store.is_loading_detail());
        });
    }

    #[test]
    fn detail_failure_leaves_slot_empty() {
        let s = session(Scripted::default().reply(404, ""));
        assert!(matches!(s.load_detail(CampingId(3), None), Err(ApiError::NotFound)));
        s.read(|store| {
            assert!(store.current_detail().is_none());
            assert!(!store.is_loading_detail());
        });
    }

    #[test]
    fn toggle_success_mirrors_state() {
        let s = session(
            Scripted::default()
                .reply(200, r#"{"result":[{"id":42}]}"#)
                .reply(200, r#"{"result":{"id":42}}"#)
                .reply(200, r#"{"message":"Add Favorite"}"#),
        );
        s.load_campings(None, None).unwrap();
        s.load_detail(CampingId(42), Some("tok")).unwrap();
        let outcome = s.toggle_favorite(
            "tok",
            FavoriteToggle {
                camping_id: CampingId(42),
                is_favorite: false,
            },
        );
        assert_eq!(
            outcome,
            FavoriteOutcome {
                success: true,
                message: "Add Favorite".to_string()
            }
        );
        s.read(|store| {
            assert!(store.campings()[0].is_favorite);
            assert!(store.current_detail().unwrap().is_favorite);
            assert_eq!(store.favorites().len(), 1);
        });
    }

    #[test]
    fn toggle_failure_reports_server_message() {
        let s = session(
            Scripted::default()
                .reply(200, r#"{"result":[{"id":42}]}"#)
                .reply(500, r#"{"message":"Server Error"}"#)
                .fail(),
        );
        s.load_campings(None, None).unwrap();
        let toggle = FavoriteToggle {
            camping_id: CampingId(42),
            is_favorite: false,
        };
        let outcome = s.toggle_favorite("tok", toggle);
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Server Error");

        let outcome = s.toggle_favorite("tok", toggle);
        assert_eq!(outcome.message, GENERIC_FAILURE_MESSAGE);
        assert!(!s.read(|store| store.is_favorite(CampingId(42))));
    }

    #[test]
    fn failed_review_fetch_releases_guard() {
        let s = session(
            Scripted::default()
                .reply(200, r#"{"result":{"id":42,"totalReviews":12}}"#)
                .reply(500, "")
                .reply(200, &reviews_body(0..5, 1, 12)),
        );
        s.load_detail(CampingId(42), None).unwrap();
        assert!(s.load_more_reviews(CampingId(42), 1, 5).is_err());
        assert!(!s.read(|st| st.is_loading_more_reviews(CampingId(42))));
        assert_eq!(
            s.load_more_reviews(CampingId(42), 1, 5).unwrap(),
            ReviewFetch::Applied { appended: 5 }
        );
    }

    #[test]
    fn reviews_without_detail_are_discarded() {
        let s = session(Scripted::default().reply(200, &reviews_body(0..5, 1, 12)));
        assert_eq!(
            s.load_more_reviews(CampingId(42), 1, 5).unwrap(),
            ReviewFetch::Discarded
        );
        assert!(s.read(|st| st.reviews().is_empty()));
    }

    /// Holds review requests until the test releases them.
    struct Gated {
        entered: mpsc::SyncSender<()>,
        release: PlMutex<mpsc::Receiver<()>>,
        review_calls: AtomicUsize,
    }

    impl Transport for Gated {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            let body = if request.path.contains("/reviews") {
                self.review_calls.fetch_add(1, Ordering::SeqCst);
                let _ = self.entered.send(());
                let _ = self.release.lock().recv();
                reviews_body(0..5, 1, 12)
            } else {
                r#"{"result":{"id":42,"totalReviews":12}}"#.to_string()
            };
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body,
            })
        }
    }

    #[test]
    fn concurrent_review_loads_send_one_request() {
        let (entered_tx, entered_rx) = mpsc::sync_channel(1);
        let (release_tx, release_rx) = mpsc::channel();
        let s = Session::new(
            RentkubClient::new("http://api.test"),
            Gated {
                entered: entered_tx,
                release: PlMutex::new(release_rx),
                review_calls: AtomicUsize::new(0),
            },
        );
        s.load_detail(CampingId(42), None).unwrap();

        std::thread::scope(|scope| {
            let first = scope.spawn(|| s.load_more_reviews(CampingId(42), 1, 5));
            entered_rx.recv().unwrap();
            assert_eq!(
                s.load_more_reviews(CampingId(42), 1, 5).unwrap(),
                ReviewFetch::Skipped
            );
            assert!(s.read(|st| st.is_loading_more_reviews(CampingId(42))));
            release_tx.send(()).unwrap();
            assert_eq!(
                first.join().unwrap().unwrap(),
                ReviewFetch::Applied { appended: 5 }
            );
        });

        assert_eq!(s.transport().review_calls.load(Ordering::SeqCst), 1);
        assert_eq!(s.read(|st| st.reviews().len()), 5);
    }

    #[test]
    fn location_resolves_through_geocoder() {
        let s = session(
            Scripted::default()
                .reply(200, r#"{"result":{"id":42,"lat":18.79,"lng":98.98}}"#)
                .reply(200, r#"{"address":{"town":"Mae Rim"}}"#),
        );
        s.load_detail(CampingId(42), None).unwrap();
        let geocoder = GeocodeClient::new("http://geo.test");
        let mut lookup = LocationLookup::new();
        assert_eq!(s.resolve_location(&geocoder, &mut lookup).as_deref(), Some("Mae Rim"));
        assert!(s.transport().sent()[1].path.starts_with("http://geo.test/reverse?"));
    }

    #[test]
    fn location_falls_back_when_transport_fails() {
        let s = session(
            Scripted::default()
                .reply(200, r#"{"result":{"id":42,"lat":18.79,"lng":98.98}}"#)
                .fail(),
        );
        s.load_detail(CampingId(42), None).unwrap();
        let geocoder = GeocodeClient::new("http://geo.test");
        let mut lookup = LocationLookup::new();
        assert_eq!(
            s.resolve_location(&geocoder, &mut lookup).as_deref(),
            Some("Area near (18.79, 98.98)")
        );
    }
}
