//! Per-device discovery sessions.
//!
//! Each device gets a [`DiscoverySession`] behind a `tokio` mutex, kept in a
//! `moka` cache that forgets devices idle for a week. The mutex is never held
//! across a remote call: a ticket is issued under the lock, the page is
//! fetched without it, and the result is applied under the lock again. Pages
//! that come back after a newer restart are discarded by the session.
//!
//! After a swipe, the favorite insert and any refill run as a [`FollowUp`]
//! on a spawned task so the response does not wait for Supabase.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use rentswipe_core::{
    ApplyOutcome, DeviceId, DiscoveryError, DiscoverySession, FetchTicket, FilterState, Listing, ListingId,
    ListingQuery, SwipeDirection,
};

use crate::supabase::{
    AuthSession, FavoriteInsert, FavoriteRequest, SupabaseClient, SupabaseError,
};

/// How long an untouched device session is kept.
const SESSION_IDLE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const MAX_SESSIONS: u64 = 100_000;

/// Where listings come from and favorites go to.
pub trait ListingBackend: Clone + Send + Sync + 'static {
    /// Fetch the page described by `query`.
    fn fetch_page(
        &self,
        query: ListingQuery,
    ) -> impl Future<Output = Result<Vec<Listing>, SupabaseError>> + Send;

    /// Record a favorite for a signed-in user.
    fn add_favorite(
        &self,
        request: FavoriteRequest,
    ) -> impl Future<Output = Result<FavoriteInsert, SupabaseError>> + Send;
}

impl ListingBackend for SupabaseClient {
    async fn fetch_page(&self, query: ListingQuery) -> Result<Vec<Listing>, SupabaseError> {
        self.fetch_rentals(&query).await
    }

    async fn add_favorite(&self, request: FavoriteRequest) -> Result<FavoriteInsert, SupabaseError> {
        Self::add_favorite(self, &request).await
    }
}

type SharedSession = Arc<Mutex<DiscoverySession>>;

/// What the card stack shows.
#[derive(Debug, Clone)]
pub struct Deck {
    /// Visible cards, front card first.
    pub cards: Vec<Listing>,
    pub loading: bool,
    pub has_more: bool,
    pub favorite_count: usize,
}

impl Deck {
    fn capture(session: &DiscoverySession) -> Self {
        Self {
            cards: session.visible().cloned().collect(),
            loading: session.is_loading(),
            has_more: session.has_more(),
            favorite_count: session.favorites().len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Remote work left over after a swipe.
pub struct FollowUp {
    session: SharedSession,
    filters: FilterState,
    refill: Option<FetchTicket>,
    favorite: Option<FavoriteRequest>,
}

impl FollowUp {
    fn is_empty(&self) -> bool {
        self.refill.is_none() && self.favorite.is_none()
    }

    /// Whether this follow-up fetches another page.
    #[must_use]
    pub const fn refills(&self) -> bool {
        self.refill.is_some()
    }
}

/// Discovery sessions for every device.
#[derive(Clone)]
pub struct DiscoveryService<B> {
    backend: B,
    sessions: Cache<DeviceId, SharedSession>,
}

impl<B: ListingBackend> DiscoveryService<B> {
    #[must_use]
    pub fn new(backend: B) -> Self {
        let sessions = Cache::builder()
            .max_capacity(MAX_SESSIONS)
            .time_to_idle(SESSION_IDLE)
            .build();

        Self { backend, sessions }
    }

    async fn session(&self, device: &DeviceId, filters: &FilterState) -> SharedSession {
        let filters = filters.clone();
        self.sessions
            .get_with(device.clone(), async move {
                Arc::new(Mutex::new(DiscoverySession::new(filters)))
            })
            .await
    }

    /// The card stack.
    ///
    /// Loads page 0 first if the device has not started. Otherwise, when the
    /// queue is low and nothing is in flight (a refill failed, or a page held
    /// only duplicates), the next page is fetched before answering.
    #[instrument(skip(self, filters), fields(device = %device))]
    pub async fn deck(&self, device: &DeviceId, filters: &FilterState) -> Deck {
        let session = self.session(device, filters).await;
        let (ticket, current) = {
            let mut guard = session.lock().await;
            if guard.generation() == 0 {
                drop(guard);
                return self.restart(device, filters.clone()).await;
            }
            if guard.is_loading() {
                return Deck::capture(&guard);
            }
            match guard.refill_ticket() {
                Some(ticket) => (ticket, guard.filters().clone()),
                None => return Deck::capture(&guard),
            }
        };

        debug!(page = ticket.page, "Refilling low queue");
        self.load(&session, ticket, &current).await;
        let deck = Deck::capture(&*session.lock().await);
        deck
    }

    /// Start over under new filters and wait for page 0.
    #[instrument(skip(self, filters), fields(device = %device))]
    pub async fn restart(&self, device: &DeviceId, filters: FilterState) -> Deck {
        let session = self.session(device, &filters).await;
        let ticket = session.lock().await.restart(filters.clone());

        self.load(&session, ticket, &filters).await;
        let deck = Deck::capture(&*session.lock().await);
        deck
    }

    /// Clear the decided set under the current filters and wait for page 0.
    #[instrument(skip(self, filters), fields(device = %device))]
    pub async fn review_again(&self, device: &DeviceId, filters: &FilterState) -> Deck {
        let session = self.session(device, filters).await;
        let (ticket, current) = {
            let mut guard = session.lock().await;
            let ticket = guard.review_again();
            (ticket, guard.filters().clone())
        };

        self.load(&session, ticket, &current).await;
        let deck = Deck::capture(&*session.lock().await);
        deck
    }

    /// Decide on a card.
    ///
    /// Returns the updated deck and the remote work to run afterwards. A right
    /// swipe is recorded remotely only when `user` is signed in.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::NotInQueue`] if the card is not in the
    /// device's queue (already decided, or the session expired).
    #[instrument(skip(self, filters, user), fields(device = %device, listing_id = %id, %direction))]
    pub async fn swipe(
        &self,
        device: &DeviceId,
        filters: &FilterState,
        id: &ListingId,
        direction: SwipeDirection,
        user: Option<&AuthSession>,
    ) -> Result<(Deck, FollowUp), DiscoveryError> {
        let session = self.session(device, filters).await;
        let mut guard = session.lock().await;
        let outcome = guard.swipe(id, direction)?;

        let favorite = outcome.favorite().and_then(|listing| {
            user.map(|auth| FavoriteRequest {
                access_token: auth.access_token.clone(),
                user_id: auth.user.id.clone(),
                listing_id: listing.id.clone(),
            })
        });

        let follow_up = FollowUp {
            session: Arc::clone(&session),
            filters: guard.filters().clone(),
            refill: outcome.refill,
            favorite,
        };

        Ok((Deck::capture(&guard), follow_up))
    }

    /// Run a swipe's remote work on a background task.
    pub fn spawn_follow_up(&self, follow_up: FollowUp) {
        if follow_up.is_empty() {
            return;
        }
        let service = self.clone();
        tokio::spawn(async move {
            service.run_follow_up(follow_up).await;
        });
    }

    /// Run a swipe's remote work now and return the deck afterwards.
    ///
    /// Used when the swipe emptied the visible stack, so there is nothing to
    /// show until the refill lands.
    pub async fn settle_follow_up(&self, follow_up: FollowUp) -> Deck {
        let session = Arc::clone(&follow_up.session);
        self.run_follow_up(follow_up).await;
        let deck = Deck::capture(&*session.lock().await);
        deck
    }

    /// Insert the favorite and fetch the refill page, if any.
    ///
    /// Favorite failures are logged and otherwise ignored; the local
    /// favorite stays.
    pub async fn run_follow_up(&self, follow_up: FollowUp) {
        if let Some(request) = follow_up.favorite {
            let listing_id = request.listing_id.clone();
            match self.backend.add_favorite(request).await {
                Ok(FavoriteInsert::Inserted) => debug!(%listing_id, "Favorite saved"),
                Ok(FavoriteInsert::AlreadyFavorited) => {
                    debug!(%listing_id, "Favorite already saved");
                }
                Err(e) => tracing::warn!(%listing_id, error = %e, "Failed to save favorite"),
            }
        }

        if let Some(ticket) = follow_up.refill {
            self.load(&follow_up.session, ticket, &follow_up.filters)
                .await;
        }
    }

    /// Favorites collected on this device, oldest first.
    pub async fn favorites(&self, device: &DeviceId) -> Vec<Listing> {
        match self.sessions.get(device).await {
            Some(session) => session.lock().await.favorites().to_vec(),
            None => Vec::new(),
        }
    }

    /// A listing this device has queued or favorited.
    pub async fn find(&self, device: &DeviceId, id: &ListingId) -> Option<Listing> {
        let session = self.sessions.get(device).await?;
        let guard = session.lock().await;
        guard.find(id).cloned()
    }

    /// Fetch the page for `ticket` and feed the result back.
    ///
    /// A page that leaves the queue low (every listing was a duplicate) is
    /// followed by the next one until the queue fills or the pages run out.
    /// A failed fetch stops here; the page is retried on the next refill.
    async fn load(&self, session: &SharedSession, ticket: FetchTicket, filters: &FilterState) {
        let mut ticket = ticket;
        loop {
            let query = ListingQuery::for_filters(filters, ticket.page);
            let result = self.backend.fetch_page(query).await;

            let mut guard = session.lock().await;
            match result {
                Ok(listings) => {
                    let outcome = guard.apply_page(ticket, listings);
                    debug!(page = ticket.page, ?outcome, "Applied listings page");
                    if outcome == ApplyOutcome::Stale {
                        return;
                    }
                }
                Err(e) => {
                    tracing::error!(page = ticket.page, error = %e, "Failed to fetch listings");
                    guard.fail_page(ticket);
                    return;
                }
            }

            match guard.refill_ticket() {
                Some(next) => ticket = next,
                None => return,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use rust_decimal::Decimal;

    use rentswipe_core::{Owner, User, UserId, UserMetadata};

    use super::*;

    fn listing(id: &str) -> Listing {
        Listing {
            id: ListingId::new(id),
            images: vec![],
            price: Decimal::from(1500),
            currency: "$".to_string(),
            address: "1 Main St".to_string(),
            city: "Austin".to_string(),
            bedrooms: 1,
            bathrooms: 1,
            parking: false,
            sqft: Decimal::from(600),
            description: String::new(),
            amenities: vec![],
            owner: Some(Owner::host()),
        }
    }

    fn listings(ids: &[&str]) -> Vec<Listing> {
        ids.iter().map(|id| listing(id)).collect()
    }

    /// Serves pages keyed by (location, page) and records favorites.
    #[derive(Clone, Default)]
    struct FakeBackend {
        pages: Arc<std::sync::Mutex<HashMap<(String, u32), Vec<Listing>>>>,
        favorites: Arc<std::sync::Mutex<Vec<FavoriteRequest>>>,
        queries: Arc<std::sync::Mutex<Vec<ListingQuery>>>,
        /// Pages whose next fetch fails.
        flaky_pages: Arc<std::sync::Mutex<HashSet<u32>>>,
        fail_fetches: bool,
        fail_favorites: bool,
    }

    impl FakeBackend {
        fn with_page(self, location: &str, page: u32, ids: &[&str]) -> Self {
            self.pages
                .lock()
                .unwrap()
                .insert((location.to_string(), page), listings(ids));
            self
        }

        fn failing_once(self, page: u32) -> Self {
            self.flaky_pages.lock().unwrap().insert(page);
            self
        }

        fn fetched_pages(&self) -> Vec<u32> {
            self.queries.lock().unwrap().iter().map(|q| q.page).collect()
        }

        fn saved_favorites(&self) -> Vec<String> {
            self.favorites
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.listing_id.as_str().to_owned())
                .collect()
        }
    }

    impl ListingBackend for FakeBackend {
        async fn fetch_page(&self, query: ListingQuery) -> Result<Vec<Listing>, SupabaseError> {
            self.queries.lock().unwrap().push(query.clone());
            if self.fail_fetches || self.flaky_pages.lock().unwrap().remove(&query.page) {
                return Err(SupabaseError::RateLimited(1));
            }
            let location = query
                .predicates
                .iter()
                .find(|p| p.column() == "city")
                .map(|p| p.operand().trim_matches('%').to_string())
                .unwrap_or_default();
            Ok(self
                .pages
                .lock()
                .unwrap()
                .get(&(location, query.page))
                .cloned()
                .unwrap_or_default())
        }

        async fn add_favorite(
            &self,
            request: FavoriteRequest,
        ) -> Result<FavoriteInsert, SupabaseError> {
            if self.fail_favorites {
                return Err(SupabaseError::Api {
                    status: 500,
                    code: None,
                    message: "boom".to_string(),
                });
            }
            self.favorites.lock().unwrap().push(request);
            Ok(FavoriteInsert::Inserted)
        }
    }

    fn auth() -> AuthSession {
        AuthSession {
            access_token: "token".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: i64::MAX,
            user: User::from_parts(UserId::new("u-1"), None, UserMetadata::default()),
        }
    }

    fn ids(deck: &Deck) -> Vec<&str> {
        deck.cards.iter().map(|l| l.id.as_str()).collect()
    }

    fn device() -> DeviceId {
        DeviceId::new("device-1")
    }

    #[tokio::test]
    async fn test_first_deck_waits_for_page_zero() {
        let backend = FakeBackend::default().with_page("", 0, &["a", "b", "c", "d"]);
        let service = DiscoveryService::new(backend.clone());

        let deck = service.deck(&device(), &FilterState::initial()).await;

        assert_eq!(ids(&deck), ["a", "b", "c"]);
        assert!(!deck.loading);
        assert_eq!(backend.queries.lock().unwrap().len(), 1);

        // A second render reuses the session.
        service.deck(&device(), &FilterState::initial()).await;
        assert_eq!(backend.queries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_swipe_right_saves_favorite_and_refills() {
        let backend = FakeBackend::default()
            .with_page("", 0, &["a", "b", "c"])
            .with_page("", 1, &["d", "e"]);
        let service = DiscoveryService::new(backend.clone());
        let filters = FilterState::initial();
        service.deck(&device(), &filters).await;

        let (deck, follow_up) = service
            .swipe(&device(), &filters, &ListingId::new("a"), SwipeDirection::Right, Some(&auth()))
            .await
            .unwrap();
        assert_eq!(ids(&deck), ["b", "c"]);

        service.run_follow_up(follow_up).await;

        assert_eq!(backend.saved_favorites(), ["a"]);
        let deck = service.deck(&device(), &filters).await;
        assert_eq!(ids(&deck), ["b", "c", "d"]);
        assert_eq!(service.favorites(&device()).await.len(), 1);
    }

    #[tokio::test]
    async fn test_favorite_failure_keeps_local_favorite() {
        let backend = FakeBackend {
            fail_favorites: true,
            ..FakeBackend::default()
        }
        .with_page("", 0, &["a", "b", "c", "d"]);
        let service = DiscoveryService::new(backend.clone());
        let filters = FilterState::initial();
        service.deck(&device(), &filters).await;

        let (_, follow_up) = service
            .swipe(&device(), &filters, &ListingId::new("a"), SwipeDirection::Right, Some(&auth()))
            .await
            .unwrap();
        service.run_follow_up(follow_up).await;

        let favorites = service.favorites(&device()).await;
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id.as_str(), "a");
    }

    #[tokio::test]
    async fn test_anonymous_right_swipe_stays_local() {
        let backend = FakeBackend::default().with_page("", 0, &["a", "b", "c", "d"]);
        let service = DiscoveryService::new(backend.clone());
        let filters = FilterState::initial();
        service.deck(&device(), &filters).await;

        let (_, follow_up) = service
            .swipe(&device(), &filters, &ListingId::new("a"), SwipeDirection::Right, None)
            .await
            .unwrap();
        assert!(follow_up.is_empty());

        assert!(backend.saved_favorites().is_empty());
        assert_eq!(service.favorites(&device()).await.len(), 1);
    }

    #[tokio::test]
    async fn test_refill_after_restart_is_discarded() {
        let backend = FakeBackend::default()
            .with_page("", 0, &["a", "b"])
            .with_page("", 1, &["old"])
            .with_page("Denver", 0, &["x", "y", "z"]);
        let service = DiscoveryService::new(backend.clone());
        let filters = FilterState::initial();
        service.deck(&device(), &filters).await;

        let (_, follow_up) = service
            .swipe(&device(), &filters, &ListingId::new("a"), SwipeDirection::Left, None)
            .await
            .unwrap();

        let denver = FilterState {
            location: "Denver".to_string(),
            ..FilterState::initial()
        };
        service.restart(&device(), denver.clone()).await;
        service.run_follow_up(follow_up).await;

        let deck = service.deck(&device(), &denver).await;
        assert_eq!(ids(&deck), ["x", "y", "z"]);
    }

    #[tokio::test]
    async fn test_failed_refill_is_retried_on_next_deck() {
        let backend = FakeBackend::default()
            .with_page("", 0, &["a", "b", "c"])
            .with_page("", 1, &["d", "e", "f"])
            .failing_once(1);
        let service = DiscoveryService::new(backend.clone());
        let filters = FilterState::initial();
        service.deck(&device(), &filters).await;

        let (_, follow_up) = service
            .swipe(&device(), &filters, &ListingId::new("a"), SwipeDirection::Left, None)
            .await
            .unwrap();
        service.run_follow_up(follow_up).await;

        let deck = service.deck(&device(), &filters).await;

        assert_eq!(ids(&deck), ["b", "c", "d"]);
        assert!(!deck.loading);
        assert_eq!(backend.fetched_pages(), [0, 1, 1]);
    }

    #[tokio::test]
    async fn test_emptied_deck_recovers_after_failed_refill() {
        let backend = FakeBackend::default()
            .with_page("", 0, &["a"])
            .with_page("", 1, &["b", "c", "d"])
            .failing_once(1);
        let service = DiscoveryService::new(backend.clone());
        let filters = FilterState::initial();

        // Page 1 fails while the first deck loads.
        let deck = service.deck(&device(), &filters).await;
        assert_eq!(ids(&deck), ["a"]);

        let (deck, follow_up) = service
            .swipe(&device(), &filters, &ListingId::new("a"), SwipeDirection::Left, None)
            .await
            .unwrap();
        assert!(deck.is_empty());
        assert!(follow_up.refills());

        let deck = service.settle_follow_up(follow_up).await;

        assert_eq!(ids(&deck), ["b", "c", "d"]);
        assert!(!deck.loading);
        assert_eq!(backend.fetched_pages(), [0, 1, 1]);
    }

    #[tokio::test]
    async fn test_duplicate_only_page_fetches_the_next() {
        let backend = FakeBackend::default()
            .with_page("", 0, &["a", "b", "c"])
            .with_page("", 1, &["b", "c"])
            .with_page("", 2, &["d"]);
        let service = DiscoveryService::new(backend.clone());
        let filters = FilterState::initial();
        service.deck(&device(), &filters).await;

        let (_, follow_up) = service
            .swipe(&device(), &filters, &ListingId::new("a"), SwipeDirection::Left, None)
            .await
            .unwrap();
        service.run_follow_up(follow_up).await;

        let deck = service.deck(&device(), &filters).await;
        assert_eq!(ids(&deck), ["b", "c", "d"]);
        assert_eq!(backend.fetched_pages(), [0, 1, 2]);
    }

    #[tokio::test]
    async fn test_swipe_unknown_card() {
        let backend = FakeBackend::default().with_page("", 0, &["a"]);
        let service = DiscoveryService::new(backend);
        let filters = FilterState::initial();
        service.deck(&device(), &filters).await;

        let result = service
            .swipe(&device(), &filters, &ListingId::new("nope"), SwipeDirection::Left, None)
            .await;

        assert!(matches!(result, Err(DiscoveryError::NotInQueue(_))));
    }

    #[tokio::test]
    async fn test_fetch_failure_shows_empty_deck() {
        let backend = FakeBackend {
            fail_fetches: true,
            ..FakeBackend::default()
        };
        let service = DiscoveryService::new(backend);

        let deck = service.deck(&device(), &FilterState::initial()).await;

        assert!(deck.is_empty());
        assert!(deck.has_more);
        assert!(!deck.loading);
    }

    #[tokio::test]
    async fn test_review_again_brings_back_decided_cards() {
        let backend = FakeBackend::default().with_page("", 0, &["a", "b", "c", "d"]);
        let service = DiscoveryService::new(backend);
        let filters = FilterState::initial();
        service.deck(&device(), &filters).await;
        service
            .swipe(&device(), &filters, &ListingId::new("a"), SwipeDirection::Left, None)
            .await
            .unwrap();

        let deck = service.review_again(&device(), &filters).await;

        assert_eq!(ids(&deck), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_find_and_favorites_for_unknown_device() {
        let service = DiscoveryService::new(FakeBackend::default());
        assert!(service.favorites(&DeviceId::new("ghost")).await.is_empty());
        assert!(service
            .find(&DeviceId::new("ghost"), &ListingId::new("a"))
            .await
            .is_none());
    }
}
