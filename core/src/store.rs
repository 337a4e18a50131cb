//! Client-side state for the collection, favorites and detail views.
//!
//! # Design
//! Listings live once in an entity table keyed by `CampingId`. The
//! collection, the favorites list and the current detail are ordered id
//! lists over that table, so a listing's favorite flag has exactly one home
//! and every view observes a toggle in the same mutation.
//!
//! Every network-backed operation is split into `*_requested` (runs before
//! the request is sent), `*_loaded` and `*_failed`. Failures only unwind
//! loading flags; they never apply part of an update. `Session` composes
//! these transitions around the transport call.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::types::{Camping, CampingId, CampingList, Coordinates, Favorite, FavoriteToggle, Review, ReviewPage};

/// Proof that a review page fetch was admitted by the in-flight guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewTicket {
    pub listing: CampingId,
    seq: u64,
}

#[derive(Debug, Clone)]
pub struct CampingStore {
    entities: HashMap<CampingId, Camping>,
    collection: Vec<CampingId>,
    favorites: Vec<CampingId>,
    center: Option<Coordinates>,
    is_loading: bool,

    detail: Option<CampingId>,
    pending_detail: Option<CampingId>,
    is_loading_detail: bool,
    reviews: Vec<Review>,
    current_reviews_page: u32,
    total_reviews: u32,
    reviews_in_flight: HashMap<CampingId, u64>,
    next_ticket: u64,

    user_location: Option<Coordinates>,
}

impl Default for CampingStore {
    fn default() -> Self {
        Self {
            entities: HashMap::new(),
            collection: Vec::new(),
            favorites: Vec::new(),
            center: None,
            is_loading: true,
            detail: None,
            pending_detail: None,
            is_loading_detail: false,
            reviews: Vec::new(),
            current_reviews_page: 1,
            total_reviews: 0,
            reviews_in_flight: HashMap::new(),
            next_ticket: 0,
            user_location: None,
        }
    }
}

impl CampingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection_requested(&mut self) {
        self.is_loading = true;
    }

    /// Replace the collection and the map-center hint.
    pub fn collection_loaded(&mut self, list: CampingList) {
        self.collection = list.result.iter().map(|c| c.id).collect();
        for camping in list.result {
            self.upsert(camping);
        }
        self.center = list.center;
        self.is_loading = false;
        self.prune();
    }

    pub fn collection_failed(&mut self) {
        self.is_loading = false;
    }

    /// Drop the current detail and its review pagination before the new
    /// request goes out, so the previous listing is never shown under `id`.
    pub fn detail_requested(&mut self, id: CampingId) {
        self.reset_detail();
        self.reviews_in_flight.clear();
        self.pending_detail = Some(id);
        self.is_loading_detail = true;
        self.prune();
    }

    /// Install a fetched detail. Returns false when `camping` answers a
    /// request that has since been superseded or cleared.
    pub fn detail_loaded(&mut self, camping: Camping) -> bool {
        if self.pending_detail != Some(camping.id) {
            debug!(id = %camping.id, "discarding stale detail");
            return false;
        }
        let id = camping.id;
        self.total_reviews = camping.review_total();
        self.reviews.clear();
        self.current_reviews_page = 1;
        self.upsert(camping);
        self.detail = Some(id);
        self.pending_detail = None;
        self.is_loading_detail = false;
        true
    }

    pub fn detail_failed(&mut self, id: CampingId) {
        if self.pending_detail == Some(id) {
            self.pending_detail = None;
            self.is_loading_detail = false;
        }
    }

    /// Reset every detail and review-pagination field.
    pub fn clear_detail(&mut self) {
        self.reset_detail();
        self.reviews_in_flight.clear();
        self.prune();
    }

    fn reset_detail(&mut self) {
        self.detail = None;
        self.pending_detail = None;
        self.is_loading_detail = false;
        self.reviews.clear();
        self.current_reviews_page = 1;
        self.total_reviews = 0;
    }

    /// Apply a confirmed toggle. The new flag is the negation of the state
    /// the viewer saw; nothing is refetched.
    pub fn favorite_toggled(&mut self, toggle: FavoriteToggle) {
        let id = toggle.camping_id;
        let now_favorite = !toggle.is_favorite;
        let known = match self.entities.get_mut(&id) {
            Some(camping) => {
                camping.is_favorite = now_favorite;
                true
            }
            None => false,
        };
        if now_favorite {
            if known && !self.favorites.contains(&id) {
                self.favorites.push(id);
            }
        } else {
            self.favorites.retain(|fav| *fav != id);
            self.prune();
        }
    }

    pub fn favorites_loaded(&mut self, favorites: Vec<Favorite>) {
        self.favorites = favorites.iter().map(|f| f.landmark.id).collect();
        for favorite in favorites {
            let mut camping = favorite.landmark;
            camping.is_favorite = true;
            self.upsert(camping);
        }
        self.prune();
    }

    /// Admit a review page fetch unless one is already in flight for
    /// `listing`.
    pub fn reviews_requested(&mut self, listing: CampingId) -> Option<ReviewTicket> {
        if self.reviews_in_flight.contains_key(&listing) {
            debug!(%listing, "review fetch already in flight");
            return None;
        }
        self.next_ticket += 1;
        self.reviews_in_flight.insert(listing, self.next_ticket);
        Some(ReviewTicket {
            listing,
            seq: self.next_ticket,
        })
    }

    /// Append a fetched page and adopt the server's page and total. Returns
    /// the number of appended reviews, or `None` when the page no longer
    /// belongs to the current detail.
    pub fn reviews_loaded(&mut self, ticket: ReviewTicket, page: ReviewPage) -> Option<usize> {
        if !self.release(ticket) || self.detail != Some(ticket.listing) {
            debug!(listing = %ticket.listing, "discarding stale review page");
            return None;
        }
        let appended = page.reviews.len();
        self.reviews.extend(page.reviews);
        self.current_reviews_page = page.current_page;
        self.total_reviews = page.total_reviews;
        Some(appended)
    }

    pub fn reviews_failed(&mut self, ticket: ReviewTicket) {
        self.release(ticket);
    }

    fn release(&mut self, ticket: ReviewTicket) -> bool {
        if self.reviews_in_flight.get(&ticket.listing) == Some(&ticket.seq) {
            self.reviews_in_flight.remove(&ticket.listing);
            true
        } else {
            false
        }
    }

    pub fn set_user_location(&mut self, location: Coordinates) {
        self.user_location = Some(location);
    }

    pub fn campings(&self) -> Vec<&Camping> {
        self.resolve(&self.collection)
    }

    /// Collection sorted by average rating, best first. Unrated listings
    /// count as zero.
    pub fn campings_by_rating(&self) -> Vec<&Camping> {
        let mut sorted = self.campings();
        sorted.sort_by(|a, b| {
            let ra = a.average_rating.unwrap_or(0.0);
            let rb = b.average_rating.unwrap_or(0.0);
            rb.total_cmp(&ra)
        });
        sorted
    }

    pub fn favorites(&self) -> Vec<&Camping> {
        self.resolve(&self.favorites)
    }

    pub fn current_detail(&self) -> Option<&Camping> {
        self.detail.and_then(|id| self.entities.get(&id))
    }

    pub fn get(&self, id: CampingId) -> Option<&Camping> {
        self.entities.get(&id)
    }

    pub fn is_favorite(&self, id: CampingId) -> bool {
        self.entities.get(&id).is_some_and(|c| c.is_favorite)
    }

    pub fn center(&self) -> Option<Coordinates> {
        self.center
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_loading_detail(&self) -> bool {
        self.is_loading_detail
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    pub fn current_reviews_page(&self) -> u32 {
        self.current_reviews_page
    }

    pub fn total_reviews(&self) -> u32 {
        self.total_reviews
    }

    /// Page to request for "load more": 1 until the first page lands.
    pub fn next_reviews_page(&self) -> u32 {
        if self.reviews.is_empty() {
            1
        } else {
            self.current_reviews_page + 1
        }
    }

    pub fn has_more_reviews(&self) -> bool {
        (self.reviews.len() as u32) < self.total_reviews
    }

    pub fn is_loading_more_reviews(&self, listing: CampingId) -> bool {
        self.reviews_in_flight.contains_key(&listing)
    }

    pub fn user_location(&self) -> Option<Coordinates> {
        self.user_location
    }

    fn upsert(&mut self, mut camping: Camping) {
        if self.favorites.contains(&camping.id) {
            camping.is_favorite = true;
        }
        match self.entities.get_mut(&camping.id) {
            Some(existing) => existing.absorb(camping),
            None => {
                self.entities.insert(camping.id, camping);
            }
        }
    }

    fn resolve(&self, ids: &[CampingId]) -> Vec<&Camping> {
        ids.iter().filter_map(|id| self.entities.get(id)).collect()
    }

    /// Drop entities no view refers to.
    fn prune(&mut self) {
        let referenced: HashSet<CampingId> = self
            .collection
            .iter()
            .chain(self.favorites.iter())
            .chain(self.detail.iter())
            .copied()
            .collect();
        self.entities.retain(|id, _| referenced.contains(id));
    }
}
