//! Discovery state machine.
//!
//! A [`DiscoverySession`] owns one device's card queue, the set of listings
//! already decided, the favorites list and the paging cursor. It never
//! performs I/O: operations that need data hand out a [`FetchTicket`], the
//! caller fetches that page, and feeds the result back through
//! [`DiscoverySession::apply_page`].
//!
//! Every restart (new filters, "review again") bumps a generation counter.
//! Tickets carry the generation they were issued under, so a page that
//! arrives after a newer restart is discarded instead of mixing results from
//! two filter states.

use std::collections::{BTreeSet, HashSet, VecDeque};

use thiserror::Error;

use crate::swipe::SwipeDirection;
use crate::types::{FilterState, Listing, ListingId};

/// Queue length below which another page is requested.
pub const REFILL_BELOW: usize = 3;

/// Number of cards rendered in the stack.
pub const VISIBLE_CARDS: usize = 3;

/// Errors from discovery operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("listing {0} is not in the active queue")]
    NotInQueue(ListingId),
}

/// Permission to fetch one page for one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub page: u32,
}

impl FetchTicket {
    /// Whether this ticket replaces the queue rather than extending it.
    #[must_use]
    pub const fn is_first_page(&self) -> bool {
        self.page == 0
    }
}

/// Result of a successful swipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwipeOutcome {
    /// The listing that left the queue.
    pub listing: Listing,
    pub direction: SwipeDirection,
    /// Next page to fetch, when the queue ran low and more pages may exist.
    pub refill: Option<FetchTicket>,
}

impl SwipeOutcome {
    /// The listing to record remotely as a favorite, if any.
    #[must_use]
    pub const fn favorite(&self) -> Option<&Listing> {
        match self.direction {
            SwipeDirection::Right => Some(&self.listing),
            SwipeDirection::Left => None,
        }
    }
}

/// What [`DiscoverySession::apply_page`] did with a fetched page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The ticket belongs to an older generation; nothing changed.
    Stale,
    /// The page was empty; no further pages will be requested.
    Exhausted,
    /// `added` new listings joined the queue.
    Applied { added: usize },
}

/// One device's browsing state.
#[derive(Debug, Clone)]
pub struct DiscoverySession {
    filters: FilterState,
    queue: VecDeque<Listing>,
    swiped: HashSet<ListingId>,
    favorites: Vec<Listing>,
    next_page: u32,
    /// Pages whose fetch failed under the current generation.
    retry_pages: BTreeSet<u32>,
    has_more: bool,
    generation: u64,
    pending: usize,
}

impl DiscoverySession {
    /// A session with an empty queue. Call [`Self::restart`] to get the
    /// first ticket.
    #[must_use]
    pub fn new(filters: FilterState) -> Self {
        Self {
            filters,
            queue: VecDeque::new(),
            swiped: HashSet::new(),
            favorites: Vec::new(),
            next_page: 0,
            retry_pages: BTreeSet::new(),
            has_more: true,
            generation: 0,
            pending: 0,
        }
    }

    /// Start over under `filters`.
    ///
    /// Clears the queue and the decided set, marks more pages available,
    /// invalidates every outstanding ticket and returns the page-0 ticket.
    /// Favorites are kept.
    pub fn restart(&mut self, filters: FilterState) -> FetchTicket {
        self.filters = filters;
        self.review_again()
    }

    /// Start over under the current filters.
    pub fn review_again(&mut self) -> FetchTicket {
        self.generation += 1;
        self.queue.clear();
        self.swiped.clear();
        self.has_more = true;
        self.next_page = 1;
        self.retry_pages.clear();
        self.pending = 1;

        FetchTicket {
            generation: self.generation,
            page: 0,
        }
    }

    /// Decide on the listing `id`.
    ///
    /// The listing leaves the queue and joins the decided set. A right swipe
    /// adds it to favorites once. When the queue drops below
    /// [`REFILL_BELOW`] and more pages may exist, the outcome carries the
    /// next page's ticket.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::NotInQueue`] when `id` is not queued; the
    /// session is unchanged.
    pub fn swipe(
        &mut self,
        id: &ListingId,
        direction: SwipeDirection,
    ) -> Result<SwipeOutcome, DiscoveryError> {
        let index = self
            .queue
            .iter()
            .position(|l| &l.id == id)
            .ok_or_else(|| DiscoveryError::NotInQueue(id.clone()))?;
        let listing = self
            .queue
            .remove(index)
            .ok_or_else(|| DiscoveryError::NotInQueue(id.clone()))?;

        self.swiped.insert(listing.id.clone());
        if direction == SwipeDirection::Right && !self.is_favorite(&listing.id) {
            self.favorites.push(listing.clone());
        }

        Ok(SwipeOutcome {
            listing,
            direction,
            refill: self.refill_ticket(),
        })
    }

    /// Ticket for the next page, if the queue is low and more may exist.
    ///
    /// Pages whose fetch failed are asked for again first. Otherwise each
    /// issued ticket advances the page cursor, so tickets issued before
    /// earlier ones resolve still ask for distinct pages.
    pub fn refill_ticket(&mut self) -> Option<FetchTicket> {
        if !self.needs_refill() {
            return None;
        }

        let page = self.retry_pages.pop_first().unwrap_or_else(|| {
            let page = self.next_page;
            self.next_page += 1;
            page
        });
        let ticket = FetchTicket {
            generation: self.generation,
            page,
        };
        self.pending += 1;
        Some(ticket)
    }

    /// Feed back the listings fetched for `ticket`.
    ///
    /// Listings already decided or already queued are dropped. The first
    /// page replaces the queue; later pages append.
    pub fn apply_page(&mut self, ticket: FetchTicket, listings: Vec<Listing>) -> ApplyOutcome {
        if ticket.generation != self.generation {
            return ApplyOutcome::Stale;
        }
        self.pending = self.pending.saturating_sub(1);

        if listings.is_empty() {
            self.has_more = false;
            return ApplyOutcome::Exhausted;
        }

        if ticket.is_first_page() {
            self.queue.clear();
        }

        let mut added = 0;
        for listing in listings {
            if self.swiped.contains(&listing.id) || self.is_queued(&listing.id) {
                continue;
            }
            self.queue.push_back(listing);
            added += 1;
        }

        ApplyOutcome::Applied { added }
    }

    /// Record that the fetch for `ticket` failed.
    ///
    /// "More available" keeps its value and the page is handed out again by
    /// the next [`Self::refill_ticket`].
    pub fn fail_page(&mut self, ticket: FetchTicket) -> ApplyOutcome {
        if ticket.generation != self.generation {
            return ApplyOutcome::Stale;
        }
        self.pending = self.pending.saturating_sub(1);
        self.retry_pages.insert(ticket.page);
        ApplyOutcome::Applied { added: 0 }
    }

    /// Whether the queue is low and more pages may exist.
    #[must_use]
    pub fn needs_refill(&self) -> bool {
        self.queue.len() < REFILL_BELOW && self.has_more
    }

    /// The cards to render, front card first.
    pub fn visible(&self) -> impl Iterator<Item = &Listing> {
        self.queue.iter().take(VISIBLE_CARDS)
    }

    /// Look up a listing the device has seen, queued or favorited.
    #[must_use]
    pub fn find(&self, id: &ListingId) -> Option<&Listing> {
        self.queue
            .iter()
            .chain(self.favorites.iter())
            .find(|l| &l.id == id)
    }

    #[must_use]
    pub fn is_favorite(&self, id: &ListingId) -> bool {
        self.favorites.iter().any(|l| &l.id == id)
    }

    #[must_use]
    pub fn is_swiped(&self, id: &ListingId) -> bool {
        self.swiped.contains(id)
    }

    fn is_queued(&self, id: &ListingId) -> bool {
        self.queue.iter().any(|l| &l.id == id)
    }

    #[must_use]
    pub const fn filters(&self) -> &FilterState {
        &self.filters
    }

    #[must_use]
    pub fn favorites(&self) -> &[Listing] {
        &self.favorites
    }

    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Whether another page may exist under the current filters.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    /// Whether a fetch for the current generation is outstanding.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.pending > 0
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

impl Default for DiscoverySession {
    fn default() -> Self {
        Self::new(FilterState::initial())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::listing::fixtures::listing;

    fn page(ids: &[&str]) -> Vec<Listing> {
        ids.iter().map(|id| listing(id)).collect()
    }

    fn started(ids: &[&str]) -> DiscoverySession {
        let mut session = DiscoverySession::default();
        let ticket = session.restart(FilterState::initial());
        session.apply_page(ticket, page(ids));
        session
    }

    fn queued_ids(session: &DiscoverySession) -> Vec<String> {
        session
            .queue
            .iter()
            .map(|l| l.id.as_str().to_owned())
            .collect()
    }

    #[test]
    fn test_restart_issues_page_zero() {
        let mut session = DiscoverySession::default();
        let ticket = session.restart(FilterState::onboarding_draft());

        assert_eq!(ticket.page, 0);
        assert_eq!(ticket.generation, 1);
        assert!(session.is_loading());
        assert_eq!(session.filters(), &FilterState::onboarding_draft());
    }

    #[test]
    fn test_swiped_listing_never_reappears() {
        let mut session = started(&["a", "b", "c", "d", "e"]);
        session
            .swipe(&ListingId::new("a"), SwipeDirection::Left)
            .unwrap();

        let ticket = FetchTicket {
            generation: session.generation(),
            page: 1,
        };
        let outcome = session.apply_page(ticket, page(&["a", "f"]));

        assert_eq!(outcome, ApplyOutcome::Applied { added: 1 });
        assert_eq!(queued_ids(&session), ["b", "c", "d", "e", "f"]);
        assert!(session.is_swiped(&ListingId::new("a")));
    }

    #[test]
    fn test_incoming_pages_dedupe_against_queue() {
        let mut session = started(&["a", "b"]);
        let ticket = session.refill_ticket().unwrap();

        let outcome = session.apply_page(ticket, page(&["b", "c", "c"]));

        assert_eq!(outcome, ApplyOutcome::Applied { added: 1 });
        assert_eq!(queued_ids(&session), ["a", "b", "c"]);
    }

    #[test]
    fn test_right_swipe_favorites_once() {
        let mut session = started(&["a", "b", "c", "d"]);
        let outcome = session
            .swipe(&ListingId::new("a"), SwipeDirection::Right)
            .unwrap();
        assert_eq!(outcome.favorite().map(|l| l.id.as_str()), Some("a"));

        // Review again brings "a" back; liking it again must not duplicate it.
        let ticket = session.review_again();
        session.apply_page(ticket, page(&["a", "b", "c", "d"]));
        session
            .swipe(&ListingId::new("a"), SwipeDirection::Right)
            .unwrap();

        assert_eq!(session.favorites().len(), 1);
        assert!(session.is_favorite(&ListingId::new("a")));
    }

    #[test]
    fn test_left_swipe_is_not_a_favorite() {
        let mut session = started(&["a", "b", "c", "d"]);
        let outcome = session
            .swipe(&ListingId::new("b"), SwipeDirection::Left)
            .unwrap();

        assert_eq!(outcome.favorite(), None);
        assert!(session.favorites().is_empty());
        assert_eq!(queued_ids(&session), ["a", "c", "d"]);
    }

    #[test]
    fn test_swipe_unknown_id_leaves_state_untouched() {
        let mut session = started(&["a", "b"]);
        let before = queued_ids(&session);

        let err = session
            .swipe(&ListingId::new("zzz"), SwipeDirection::Right)
            .unwrap_err();

        assert_eq!(err, DiscoveryError::NotInQueue(ListingId::new("zzz")));
        assert_eq!(queued_ids(&session), before);
        assert!(session.favorites().is_empty());
        assert!(!session.is_swiped(&ListingId::new("zzz")));
    }

    #[test]
    fn test_refill_only_when_low_and_more_available() {
        let mut session = started(&["a", "b", "c", "d"]);

        let outcome = session
            .swipe(&ListingId::new("a"), SwipeDirection::Left)
            .unwrap();
        assert_eq!(outcome.refill, None, "three cards left is not low");

        let outcome = session
            .swipe(&ListingId::new("b"), SwipeDirection::Left)
            .unwrap();
        assert_eq!(
            outcome.refill,
            Some(FetchTicket {
                generation: 1,
                page: 1
            })
        );
    }

    #[test]
    fn test_empty_page_stops_refills_until_restart() {
        let mut session = started(&["a", "b"]);
        let ticket = session.refill_ticket().unwrap();

        assert_eq!(session.apply_page(ticket, Vec::new()), ApplyOutcome::Exhausted);
        assert!(!session.has_more());

        let outcome = session
            .swipe(&ListingId::new("a"), SwipeDirection::Left)
            .unwrap();
        assert_eq!(outcome.refill, None);
        assert_eq!(session.refill_ticket(), None);

        session.restart(FilterState::initial());
        assert!(session.has_more());
    }

    #[test]
    fn test_restart_resets_swiped_and_more_available() {
        let mut session = started(&["a", "b"]);
        session
            .swipe(&ListingId::new("a"), SwipeDirection::Left)
            .unwrap();
        let ticket = session.refill_ticket().unwrap();
        session.apply_page(ticket, Vec::new());

        let mut filters = FilterState::initial();
        filters.location = "Austin".to_string();
        let ticket = session.restart(filters);

        assert_eq!(ticket.page, 0);
        assert!(session.has_more());
        assert!(!session.is_swiped(&ListingId::new("a")));
        assert_eq!(session.queue_len(), 0);
        assert_eq!(session.filters().location, "Austin");
    }

    #[test]
    fn test_stale_ticket_is_discarded() {
        let mut session = DiscoverySession::default();
        let old = session.restart(FilterState::initial());
        let new = session.restart(FilterState::onboarding_draft());

        assert_eq!(session.apply_page(new, page(&["n1", "n2"])), ApplyOutcome::Applied { added: 2 });
        assert_eq!(session.apply_page(old, page(&["o1", "o2"])), ApplyOutcome::Stale);
        assert_eq!(session.fail_page(old), ApplyOutcome::Stale);

        assert_eq!(queued_ids(&session), ["n1", "n2"]);
    }

    #[test]
    fn test_outstanding_refills_fetch_distinct_pages() {
        let mut session = started(&["a"]);
        let first = session.refill_ticket().unwrap();
        let second = session.refill_ticket().unwrap();

        assert_eq!(first.page, 1);
        assert_eq!(second.page, 2);
    }

    #[test]
    fn test_first_page_replaces_queue() {
        let mut session = started(&["a", "b"]);
        let ticket = session.review_again();
        session.apply_page(ticket, page(&["c"]));
        assert_eq!(queued_ids(&session), ["c"]);
    }

    #[test]
    fn test_failed_fetch_keeps_more_available() {
        let mut session = DiscoverySession::default();
        let ticket = session.restart(FilterState::initial());

        session.fail_page(ticket);

        assert!(session.has_more());
        assert!(!session.is_loading());
        assert_eq!(session.queue_len(), 0);
    }

    #[test]
    fn test_failed_page_is_asked_for_again() {
        let mut session = started(&["a"]);
        let first = session.refill_ticket().unwrap();
        assert_eq!(first.page, 1);

        session.fail_page(first);
        assert!(session.needs_refill());

        let retry = session.refill_ticket().unwrap();
        assert_eq!(retry.page, 1);
        session.apply_page(retry, page(&["b", "c", "d"]));

        let next = session.refill_ticket();
        assert_eq!(next, None, "queue is full again");
        assert_eq!(queued_ids(&session), ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_failed_first_page_retries_page_zero() {
        let mut session = DiscoverySession::default();
        let ticket = session.restart(FilterState::initial());
        session.fail_page(ticket);

        let retry = session.refill_ticket().unwrap();
        assert!(retry.is_first_page());

        // A restart forgets failures from the old generation.
        session.restart(FilterState::initial());
        let ticket = session.refill_ticket().unwrap();
        assert_eq!(ticket.page, 1);
    }

    #[test]
    fn test_needs_refill_after_duplicate_only_page() {
        let mut session = started(&["a", "b"]);
        let ticket = session.refill_ticket().unwrap();

        let outcome = session.apply_page(ticket, page(&["a", "b"]));

        assert_eq!(outcome, ApplyOutcome::Applied { added: 0 });
        assert!(session.needs_refill());
        assert_eq!(session.refill_ticket().map(|t| t.page), Some(2));
    }

    #[test]
    fn test_visible_shows_top_three() {
        let session = started(&["a", "b", "c", "d", "e"]);
        let ids: Vec<_> = session.visible().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn test_find_covers_queue_and_favorites() {
        let mut session = started(&["a", "b", "c", "d"]);
        session
            .swipe(&ListingId::new("a"), SwipeDirection::Right)
            .unwrap();
        session
            .swipe(&ListingId::new("b"), SwipeDirection::Left)
            .unwrap();

        assert!(session.find(&ListingId::new("a")).is_some());
        assert!(session.find(&ListingId::new("b")).is_none());
        assert!(session.find(&ListingId::new("c")).is_some());
    }
}
