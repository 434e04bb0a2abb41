//! Debounced location search with stale-response suppression.
//!
//! [`LocationSearch`] is owned by the session controller and driven from a
//! single task:
//!
//! 1. [`LocationSearch::input`] is called on every keystroke. It restarts
//!    the debounce timer; nothing is sent until the input has been quiet
//!    for the debounce interval.
//! 2. [`LocationSearch::next_update`] is awaited by the controller's event
//!    loop. When the timer expires it issues the request under a fresh
//!    generation token. When a response arrives it is applied only if its
//!    token is still the latest one issued; superseded responses are
//!    dropped even if they resolve after newer ones.
//!
//! Geocoding failures are logged and shown as an empty result set. The
//! adapter stays usable for the next keystroke.

use std::sync::Arc;
use std::time::Duration;

use geofence_map::Viewport;
use geofence_map_models::FlyToOptions;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::service_registry::{FlyToSettings, GeocodingService};
use crate::{GeocodeError, Geocoder, SearchResult};

/// Timing and viewport settings of a [`LocationSearch`].
#[derive(Debug, Clone, Copy)]
pub struct SearchSettings {
    /// Quiet period after the last keystroke before a query is sent.
    pub debounce: Duration,
    /// Viewport transition used when a result is selected.
    pub fly_to: FlyToSettings,
}

impl From<&GeocodingService> for SearchSettings {
    fn from(service: &GeocodingService) -> Self {
        Self {
            debounce: service.debounce(),
            fly_to: service.fly_to,
        }
    }
}

/// What the search box should currently show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// Nothing to show.
    Idle,
    /// Waiting for the input to settle.
    Debouncing,
    /// A request for the current query is in flight.
    Searching,
    /// The latest request returned places.
    Results,
    /// The latest request returned nothing or failed.
    NoResults,
}

/// A change produced by [`LocationSearch::next_update`].
#[derive(Debug, Clone, PartialEq)]
pub enum SearchUpdate {
    /// A request was sent.
    Issued {
        /// Generation token of the request.
        token: u64,
        /// The query that was sent.
        query: String,
    },
    /// The latest request's response was applied.
    Applied {
        /// Generation token of the request.
        token: u64,
        /// Number of results now shown.
        count: usize,
    },
    /// A superseded response was dropped.
    Discarded {
        /// Generation token of the dropped response.
        token: u64,
    },
}

enum Message {
    DebounceElapsed {
        seq: u64,
    },
    Completed {
        token: u64,
        query: String,
        outcome: Result<Vec<SearchResult>, GeocodeError>,
    },
}

/// Search box state machine in front of a [`Geocoder`].
///
/// Must be used from within a tokio runtime.
pub struct LocationSearch {
    geocoder: Arc<dyn Geocoder>,
    settings: SearchSettings,
    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
    timer: Option<JoinHandle<()>>,
    debounce_seq: u64,
    latest_token: u64,
    in_flight: usize,
    query: String,
    display_value: String,
    results: Vec<SearchResult>,
    status: SearchStatus,
    closed: bool,
}

impl std::fmt::Debug for LocationSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationSearch")
            .field("settings", &self.settings)
            .field("latest_token", &self.latest_token)
            .field("in_flight", &self.in_flight)
            .field("query", &self.query)
            .field("status", &self.status)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl LocationSearch {
    /// Creates an idle search adapter.
    #[must_use]
    pub fn new(geocoder: Arc<dyn Geocoder>, settings: SearchSettings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            geocoder,
            settings,
            tx,
            rx,
            timer: None,
            debounce_seq: 0,
            latest_token: 0,
            in_flight: 0,
            query: String::new(),
            display_value: String::new(),
            results: Vec::new(),
            status: SearchStatus::Idle,
            closed: false,
        }
    }

    /// The raw query text.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The text shown in the search box.
    ///
    /// Equals the query while typing and the selected place's name after a
    /// selection.
    #[must_use]
    pub fn display_value(&self) -> &str {
        &self.display_value
    }

    /// Results of the latest applied response.
    #[must_use]
    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> SearchStatus {
        self.status
    }

    /// Whether a request for the current query is in flight.
    #[must_use]
    pub const fn is_searching(&self) -> bool {
        matches!(self.status, SearchStatus::Searching)
    }

    /// Whether the results dropdown should be open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(
            self.status,
            SearchStatus::Searching | SearchStatus::Results | SearchStatus::NoResults
        )
    }

    /// Token of the most recently issued (or invalidated) generation.
    #[must_use]
    pub const fn latest_token(&self) -> u64 {
        self.latest_token
    }

    /// Whether a debounce timer or request is still outstanding.
    #[must_use]
    pub const fn has_pending_work(&self) -> bool {
        self.timer.is_some() || self.in_flight > 0
    }

    /// Accepts the search box's new text.
    ///
    /// Whitespace-only text cancels any pending search and clears results
    /// without contacting the service. Changed text also invalidates any
    /// request still in flight, so results for replaced text never show.
    pub fn input(&mut self, text: &str) {
        if self.closed {
            return;
        }
        let changed = text != self.query;
        self.query = text.to_string();
        self.display_value = text.to_string();
        self.cancel_timer();

        if text.trim().is_empty() {
            self.invalidate();
            self.results.clear();
            self.status = SearchStatus::Idle;
            return;
        }

        if changed && self.in_flight > 0 {
            self.invalidate();
        }

        self.debounce_seq += 1;
        let seq = self.debounce_seq;
        let delay = self.settings.debounce;
        let tx = self.tx.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(Message::DebounceElapsed { seq }).is_err() {
                log::trace!("Debounce {seq} elapsed after the search was dropped");
            }
        }));
        self.status = SearchStatus::Debouncing;
    }

    /// Waits for the next timer expiry or response and applies it.
    ///
    /// Returns `None` immediately when nothing is outstanding.
    pub async fn next_update(&mut self) -> Option<SearchUpdate> {
        while self.has_pending_work() {
            let message = self.rx.recv().await?;
            if let Some(update) = self.handle(message) {
                return Some(update);
            }
        }
        None
    }

    /// Processes updates until nothing is outstanding.
    pub async fn settle(&mut self) -> Vec<SearchUpdate> {
        let mut updates = Vec::new();
        while let Some(update) = self.next_update().await {
            updates.push(update);
        }
        updates
    }

    fn handle(&mut self, message: Message) -> Option<SearchUpdate> {
        match message {
            Message::DebounceElapsed { seq } => {
                if seq != self.debounce_seq || self.timer.is_none() {
                    return None;
                }
                self.timer = None;
                Some(self.issue())
            }
            Message::Completed {
                token,
                query,
                outcome,
            } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                if token != self.latest_token {
                    log::debug!("Discarding stale search response {token} for {query:?}");
                    return Some(SearchUpdate::Discarded { token });
                }
                self.results = match outcome {
                    Ok(results) => results,
                    Err(e) => {
                        log::warn!("Geocoding failed for {query:?}: {e}");
                        Vec::new()
                    }
                };
                self.status = if self.results.is_empty() {
                    SearchStatus::NoResults
                } else {
                    SearchStatus::Results
                };
                Some(SearchUpdate::Applied {
                    token,
                    count: self.results.len(),
                })
            }
        }
    }

    fn issue(&mut self) -> SearchUpdate {
        self.latest_token += 1;
        let token = self.latest_token;
        let query = self.query.clone();
        self.in_flight += 1;
        self.status = SearchStatus::Searching;

        log::debug!("Issuing search {token} for {query:?}");

        let geocoder = Arc::clone(&self.geocoder);
        let tx = self.tx.clone();
        let sent = query.clone();
        tokio::spawn(async move {
            let outcome = geocoder.search(&sent).await;
            if tx
                .send(Message::Completed {
                    token,
                    query: sent,
                    outcome,
                })
                .is_err()
            {
                log::trace!("Search {token} completed after the search was dropped");
            }
        });

        SearchUpdate::Issued { token, query }
    }

    /// Flies `viewport` to the result at `index` and closes the dropdown.
    ///
    /// Returns the transition that was issued, or `None` if there is no
    /// result at `index`.
    pub fn select(&mut self, index: usize, viewport: &mut dyn Viewport) -> Option<FlyToOptions> {
        let result = self.results.get(index)?.clone();
        let options = FlyToOptions {
            center: result.center,
            zoom: self.settings.fly_to.zoom,
            speed: self.settings.fly_to.speed,
            curve: self.settings.fly_to.curve,
            essential: true,
        };

        log::info!("Flying to {} ({:?})", result.place_name, result.id);
        viewport.fly_to(&options);

        self.display_value = result.place_name;
        self.cancel_timer();
        self.invalidate();
        self.results.clear();
        self.status = SearchStatus::Idle;
        Some(options)
    }

    /// Empties the search box.
    pub fn clear(&mut self) {
        self.query.clear();
        self.display_value.clear();
        self.cancel_timer();
        self.invalidate();
        self.results.clear();
        self.status = SearchStatus::Idle;
    }

    /// Cancels the debounce timer and invalidates in-flight requests.
    ///
    /// Later input is ignored.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.cancel_timer();
        self.invalidate();
        log::debug!("Location search shut down");
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Burns a token so no in-flight response matches the latest one.
    const fn invalidate(&mut self) {
        self.latest_token += 1;
    }
}

impl Drop for LocationSearch {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use geofence_geometry_models::Coordinate;

    use super::*;

    #[derive(Default)]
    struct FakeGeocoder {
        calls: Mutex<Vec<String>>,
        delays: BTreeMap<String, Duration>,
        failing: bool,
    }

    impl FakeGeocoder {
        fn with_delays(delays: &[(&str, u64)]) -> Self {
            Self {
                delays: delays
                    .iter()
                    .map(|(q, ms)| ((*q).to_string(), Duration::from_millis(*ms)))
                    .collect(),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Geocoder for FakeGeocoder {
        async fn search(&self, query: &str) -> Result<Vec<SearchResult>, GeocodeError> {
            self.calls.lock().unwrap().push(query.to_string());
            if let Some(delay) = self.delays.get(query) {
                tokio::time::sleep(*delay).await;
            }
            if self.failing {
                return Err(GeocodeError::Status { status: 503 });
            }
            if query == "nowhere" {
                return Ok(Vec::new());
            }
            Ok(vec![SearchResult {
                id: format!("place.{query}"),
                text: query.to_string(),
                place_name: format!("{query}, Delhi, India"),
                center: Coordinate::new(77.2, 28.6),
            }])
        }
    }

    #[derive(Default)]
    struct FakeViewport {
        flights: Vec<FlyToOptions>,
    }

    impl Viewport for FakeViewport {
        fn fly_to(&mut self, options: &FlyToOptions) {
            self.flights.push(*options);
        }
    }

    fn settings() -> SearchSettings {
        SearchSettings {
            debounce: Duration::from_millis(400),
            fly_to: FlyToSettings {
                zoom: 14.0,
                speed: 1.5,
                curve: 1.0,
            },
        }
    }

    fn search(geocoder: &Arc<FakeGeocoder>) -> LocationSearch {
        LocationSearch::new(geocoder.clone(), settings())
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_keystrokes_send_one_request() {
        let geocoder = Arc::new(FakeGeocoder::default());
        let mut s = search(&geocoder);

        s.input("a");
        tokio::time::advance(Duration::from_millis(100)).await;
        s.input("ab");
        tokio::time::advance(Duration::from_millis(100)).await;
        s.input("abc");
        assert_eq!(s.status(), SearchStatus::Debouncing);

        let updates = s.settle().await;
        assert_eq!(geocoder.calls(), vec!["abc".to_string()]);
        assert!(matches!(&updates[0], SearchUpdate::Issued { query, .. } if query == "abc"));
        assert!(matches!(updates[1], SearchUpdate::Applied { count: 1, .. }));
        assert_eq!(s.results()[0].text, "abc");
        assert_eq!(s.status(), SearchStatus::Results);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_sent_before_the_debounce_interval() {
        let geocoder = Arc::new(FakeGeocoder::default());
        let mut s = search(&geocoder);

        s.input("okhla");
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(399)).await;
        tokio::task::yield_now().await;
        assert!(geocoder.calls().is_empty());

        s.settle().await;
        assert_eq!(geocoder.calls(), vec!["okhla".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn late_response_of_superseded_request_is_discarded() {
        let geocoder = Arc::new(FakeGeocoder::with_delays(&[("foo", 1_000), ("bar", 10)]));
        let mut s = search(&geocoder);

        s.input("foo");
        let issued = s.next_update().await.unwrap();
        assert!(matches!(issued, SearchUpdate::Issued { token: 1, .. }));
        assert!(s.is_searching());

        s.input("bar");
        let updates = s.settle().await;

        assert_eq!(geocoder.calls(), vec!["foo".to_string(), "bar".to_string()]);
        assert!(updates.contains(&SearchUpdate::Discarded { token: 1 }));
        assert_eq!(s.results().len(), 1);
        assert_eq!(s.results()[0].text, "bar");
    }

    #[tokio::test(start_paused = true)]
    async fn response_for_replaced_text_is_not_shown_while_debouncing() {
        let geocoder = Arc::new(FakeGeocoder::with_delays(&[("foo", 100)]));
        let mut s = search(&geocoder);

        s.input("foo");
        s.next_update().await;
        s.input("bar");

        let update = s.next_update().await.unwrap();
        assert_eq!(update, SearchUpdate::Discarded { token: 1 });
        assert_eq!(s.status(), SearchStatus::Debouncing);
        assert!(s.results().is_empty());

        s.settle().await;
        assert_eq!(s.results()[0].text, "bar");
    }

    #[tokio::test(start_paused = true)]
    async fn earlier_request_resolving_first_is_still_discarded() {
        let geocoder = Arc::new(FakeGeocoder::with_delays(&[("foo", 450), ("bar", 500)]));
        let mut s = search(&geocoder);

        s.input("foo");
        s.next_update().await;
        s.input("bar");
        let updates = s.settle().await;

        let discarded = updates.iter().position(|u| matches!(u, SearchUpdate::Discarded { .. }));
        let applied = updates.iter().position(|u| matches!(u, SearchUpdate::Applied { .. }));
        assert!(discarded.unwrap() < applied.unwrap());
        assert_eq!(s.results()[0].text, "bar");
    }

    #[tokio::test(start_paused = true)]
    async fn blank_input_cancels_without_contacting_service() {
        let geocoder = Arc::new(FakeGeocoder::default());
        let mut s = search(&geocoder);

        s.input("delhi");
        s.input("   ");
        assert!(!s.has_pending_work());
        assert!(s.settle().await.is_empty());
        assert!(geocoder.calls().is_empty());
        assert_eq!(s.status(), SearchStatus::Idle);
        assert!(!s.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn blank_input_drops_in_flight_response() {
        let geocoder = Arc::new(FakeGeocoder::with_delays(&[("delhi", 200)]));
        let mut s = search(&geocoder);

        s.input("delhi");
        s.next_update().await;
        s.input("");
        let updates = s.settle().await;

        assert!(matches!(updates[..], [SearchUpdate::Discarded { .. }]));
        assert!(s.results().is_empty());
        assert_eq!(s.status(), SearchStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn service_failure_yields_no_results_and_stays_usable() {
        let geocoder = Arc::new(FakeGeocoder {
            failing: true,
            ..FakeGeocoder::default()
        });
        let mut s = search(&geocoder);

        s.input("gurgaon");
        s.settle().await;
        assert!(s.results().is_empty());
        assert_eq!(s.status(), SearchStatus::NoResults);
        assert!(s.is_open());

        s.input("gurugram");
        s.settle().await;
        assert_eq!(geocoder.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_response_shows_no_results() {
        let geocoder = Arc::new(FakeGeocoder::default());
        let mut s = search(&geocoder);

        s.input("nowhere");
        s.settle().await;
        assert_eq!(s.status(), SearchStatus::NoResults);
    }

    #[tokio::test(start_paused = true)]
    async fn select_flies_viewport_and_closes_results() {
        let geocoder = Arc::new(FakeGeocoder::default());
        let mut s = search(&geocoder);
        let mut viewport = FakeViewport::default();

        s.input("noida");
        s.settle().await;
        let options = s.select(0, &mut viewport).unwrap();

        assert_eq!(viewport.flights, vec![options]);
        assert_eq!(options.center, Coordinate::new(77.2, 28.6));
        assert!((options.zoom - 14.0).abs() < f64::EPSILON);
        assert!((options.speed - 1.5).abs() < f64::EPSILON);
        assert!((options.curve - 1.0).abs() < f64::EPSILON);
        assert_eq!(s.display_value(), "noida, Delhi, India");
        assert_eq!(s.query(), "noida");
        assert!(s.results().is_empty());
        assert!(!s.is_open());

        assert!(s.select(0, &mut viewport).is_none());
        assert_eq!(viewport.flights.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_resets_everything() {
        let geocoder = Arc::new(FakeGeocoder::default());
        let mut s = search(&geocoder);

        s.input("saket");
        s.settle().await;
        s.clear();
        assert_eq!(s.query(), "");
        assert_eq!(s.display_value(), "");
        assert!(s.results().is_empty());
        assert_eq!(s.status(), SearchStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn response_after_drop_is_dropped_quietly() {
        let geocoder = Arc::new(FakeGeocoder::with_delays(&[("hauz khas", 100)]));
        let mut s = search(&geocoder);

        s.input("hauz khas");
        s.next_update().await;
        drop(s);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(geocoder.calls(), vec!["hauz khas".to_string()]);
        assert_eq!(Arc::strong_count(&geocoder), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_timer_and_ignores_input() {
        let geocoder = Arc::new(FakeGeocoder::with_delays(&[("first", 300)]));
        let mut s = search(&geocoder);

        s.input("first");
        s.next_update().await;
        s.shutdown();
        s.input("second");

        let updates = s.settle().await;
        assert!(matches!(updates[..], [SearchUpdate::Discarded { .. }]));
        assert_eq!(geocoder.calls(), vec!["first".to_string()]);
        assert!(s.results().is_empty());
    }
}
