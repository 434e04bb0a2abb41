//! The site selector controller.
//!
//! [`SiteSelector`] owns the map session, the overlay event stream, the
//! boundary coordinator, and the location search. All state changes happen
//! on the task that drives it, either by calling its methods directly or
//! by awaiting [`SiteSelector::next_event`] in a loop.

use std::sync::Arc;

use geofence_boundary::{BoundaryError, DrawCoordinator, DrawState, SiteBoundaryState, Transition};
use geofence_geocoder::mapbox::MapboxGeocoder;
use geofence_geocoder::service_registry::default_service;
use geofence_geocoder::{Geocoder, LocationSearch, SearchSettings, SearchUpdate};
use geofence_geometry_models::HandoffPayload;
use geofence_map::{DrawEventStream, MapSession, MapSurface};
use geofence_map_models::{DrawEvent, DrawMode, FlyToOptions};

use crate::{GeofenceConfig, SessionError};

/// Something the selector reacted to.
#[derive(Debug)]
pub enum SelectorEvent {
    /// An overlay event was applied to the boundary.
    Draw(Transition),
    /// The location search advanced.
    Search(SearchUpdate),
}

/// One open site selection screen.
#[derive(Debug)]
pub struct SiteSelector {
    map: MapSession,
    draw_events: DrawEventStream,
    coordinator: DrawCoordinator,
    search: LocationSearch,
    torn_down: bool,
}

impl SiteSelector {
    /// Opens a selector on `surface`, searching through the Mapbox
    /// geocoder with the config's access token.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// See [`Self::open`].
    pub fn connect(
        config: &GeofenceConfig,
        surface: Box<dyn MapSurface>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let service = default_service();
        let geocoder = MapboxGeocoder::new(
            reqwest::Client::new(),
            &service,
            config.access_token.clone(),
        );
        let mut settings = SearchSettings::from(&service);
        if let Some(debounce) = config.search_debounce {
            settings.debounce = debounce;
        }
        Self::open(config, surface, Arc::new(geocoder), settings)
    }

    /// Opens a selector on `surface`.
    ///
    /// The config is validated before the surface is touched, so a missing
    /// credential leaves the surface uninitialized.
    ///
    /// # Errors
    ///
    /// * [`SessionError::Config`] if the config has no access token
    /// * [`SessionError::Map`] if the drawing overlay cannot be mounted
    pub fn open(
        config: &GeofenceConfig,
        surface: Box<dyn MapSurface>,
        geocoder: Arc<dyn Geocoder>,
        settings: SearchSettings,
    ) -> Result<Self, SessionError> {
        config.validate()?;

        let view = config.initial_view;
        log::info!(
            "Opening site selector at {:.4}, {:.4} (zoom {})",
            view.longitude,
            view.latitude,
            view.zoom
        );

        let (map, draw_events) = MapSession::open(surface, &config.overlay)?;

        Ok(Self {
            map,
            draw_events,
            coordinator: DrawCoordinator::new(),
            search: LocationSearch::new(geocoder, settings),
            torn_down: false,
        })
    }

    /// The current boundary slot.
    #[must_use]
    pub const fn boundary(&self) -> &SiteBoundaryState {
        self.coordinator.boundary()
    }

    /// Whether a boundary is drawn.
    #[must_use]
    pub const fn draw_state(&self) -> DrawState {
        self.coordinator.draw_state()
    }

    /// Whether the proceed action is available.
    #[must_use]
    pub const fn can_proceed(&self) -> bool {
        matches!(self.coordinator.draw_state(), DrawState::Active)
    }

    /// The location search state.
    #[must_use]
    pub const fn search(&self) -> &LocationSearch {
        &self.search
    }

    /// The map session.
    #[must_use]
    pub const fn map(&self) -> &MapSession {
        &self.map
    }

    /// Applies one overlay event to the boundary.
    pub fn handle_draw_event(&mut self, event: &DrawEvent) -> Transition {
        self.coordinator.handle(event)
    }

    /// Applies every overlay event already queued, in emission order.
    pub fn pump_draw_events(&mut self) -> Vec<Transition> {
        let mut transitions = Vec::new();
        while let Ok(event) = self.draw_events.try_recv() {
            transitions.push(self.coordinator.handle(&event));
        }
        transitions
    }

    /// Waits for the next overlay event or search update and applies it.
    ///
    /// Returns `None` once the selector is torn down and both sources are
    /// exhausted.
    pub async fn next_event(&mut self) -> Option<SelectorEvent> {
        tokio::select! {
            Some(event) = self.draw_events.recv() => {
                Some(SelectorEvent::Draw(self.coordinator.handle(&event)))
            }
            Some(update) = self.search.next_update() => Some(SelectorEvent::Search(update)),
            else => None,
        }
    }

    /// Clears any drawing and puts the overlay into polygon mode.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Map`] after teardown.
    pub fn start_polygon_drawing(&mut self) -> Result<(), SessionError> {
        self.map.delete_all_drawings()?;
        self.coordinator.restart_draw();
        self.map.change_draw_mode(DrawMode::DrawPolygon)?;
        log::debug!("Polygon drawing started");
        Ok(())
    }

    /// Removes the drawing and the boundary.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Map`] after teardown.
    pub fn clear_drawing(&mut self) -> Result<(), SessionError> {
        self.map.delete_all_drawings()?;
        self.coordinator.restart_draw();
        Ok(())
    }

    /// Builds the hand-off payload for the next workflow step.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError::NotReady`] if no boundary is drawn.
    pub fn proceed(&self) -> Result<HandoffPayload, BoundaryError> {
        self.coordinator.boundary().build_handoff_payload()
    }

    /// Feeds the search box's new text.
    pub fn search_input(&mut self, text: &str) {
        self.search.input(text);
    }

    /// Processes search updates until nothing is outstanding.
    pub async fn settle_search(&mut self) -> Vec<SearchUpdate> {
        self.search.settle().await
    }

    /// Flies the map to the search result at `index`.
    pub fn select_result(&mut self, index: usize) -> Option<FlyToOptions> {
        self.search.select(index, &mut self.map)
    }

    /// Empties the search box.
    pub fn clear_search(&mut self) {
        self.search.clear();
    }

    /// Switches the base map style.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Map`] for an unknown style or after teardown.
    pub fn set_style(&mut self, style_id: &str) -> Result<(), SessionError> {
        Ok(self.map.set_style(style_id)?)
    }

    /// Zooms in one level.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Map`] after teardown.
    pub fn zoom_in(&mut self) -> Result<(), SessionError> {
        Ok(self.map.zoom_in()?)
    }

    /// Zooms out one level.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Map`] after teardown.
    pub fn zoom_out(&mut self) -> Result<(), SessionError> {
        Ok(self.map.zoom_out()?)
    }

    /// Releases the screen's resources.
    ///
    /// Pending search timers are cancelled and in-flight responses
    /// invalidated before the overlay subscriptions are cancelled and the
    /// surface destroyed. Only the first call has any effect; it also runs
    /// on drop.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.search.shutdown();
        self.map.teardown();
        self.draw_events.close();
        log::info!("Site selector torn down");
    }
}

impl Drop for SiteSelector {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use geofence_geocoder::service_registry::FlyToSettings;
    use geofence_geocoder::{GeocodeError, SearchResult, SearchStatus};
    use geofence_geometry_models::{Coordinate, GeometryKind};
    use geofence_map::recording::{RecordingSurface, SurfaceCommand, SurfaceHandle};
    use geojson::Feature;

    use super::*;

    struct StaticGeocoder;

    #[async_trait::async_trait]
    impl Geocoder for StaticGeocoder {
        async fn search(&self, query: &str) -> Result<Vec<SearchResult>, GeocodeError> {
            Ok(vec![SearchResult {
                id: format!("place.{query}"),
                text: query.to_string(),
                place_name: format!("{query}, New Delhi, India"),
                center: Coordinate::new(77.27, 28.53),
            }])
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

    fn open() -> (SiteSelector, SurfaceHandle) {
        let (surface, handle) = RecordingSurface::new();
        let selector = SiteSelector::open(
            &GeofenceConfig::new("pk.test"),
            Box::new(surface),
            Arc::new(StaticGeocoder),
            settings(),
        )
        .unwrap();
        (selector, handle)
    }

    fn square() -> Feature {
        serde_json::from_value(serde_json::json!({
            "type": "Feature",
            "id": "d1",
            "properties": {},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [77.20, 28.60], [77.20, 28.62], [77.22, 28.62], [77.22, 28.60], [77.20, 28.60]
                ]]
            }
        }))
        .unwrap()
    }

    fn create(feature: Feature) -> DrawEvent {
        DrawEvent::Create {
            features: vec![feature],
        }
    }

    #[test]
    fn missing_token_prevents_initialization() {
        let (surface, handle) = RecordingSurface::new();
        let err = SiteSelector::open(
            &GeofenceConfig::new(""),
            Box::new(surface),
            Arc::new(StaticGeocoder),
            settings(),
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
        assert!(handle.commands().is_empty());
        assert_eq!(handle.subscriber_count(), 0);
    }

    #[test]
    fn overlay_failure_releases_surface() {
        let (surface, handle) = RecordingSurface::refusing_overlay();
        let err = SiteSelector::open(
            &GeofenceConfig::new("pk.test"),
            Box::new(surface),
            Arc::new(StaticGeocoder),
            settings(),
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::Map(_)));
        assert_eq!(handle.removals(), 1);
    }

    #[tokio::test]
    async fn drawn_polygon_enables_proceed() {
        let (mut selector, handle) = open();
        assert!(!selector.can_proceed());
        assert!(matches!(
            selector.proceed(),
            Err(BoundaryError::NotReady)
        ));

        assert_eq!(handle.emit(&create(square())), 1);
        let transitions = selector.pump_draw_events();
        assert!(matches!(transitions[..], [Transition::Created]));
        assert!(selector.can_proceed());

        let payload = selector.proceed().unwrap();
        assert_eq!(payload.kind, GeometryKind::Polygon);
        assert_eq!(payload.site_coordinates.len(), 5);
        assert!((payload.center.longitude - 77.21).abs() < 1e-9);
        assert!((payload.center.latitude - 28.61).abs() < 1e-9);
    }

    #[tokio::test]
    async fn events_are_applied_in_emission_order() {
        let (mut selector, handle) = open();
        assert_eq!(handle.emit(&create(square())), 1);
        assert_eq!(
            handle.emit(&DrawEvent::Delete {
                features: vec![square()]
            }),
            1
        );

        let first = selector.next_event().await;
        assert!(matches!(first, Some(SelectorEvent::Draw(Transition::Created))));
        let second = selector.next_event().await;
        assert!(matches!(second, Some(SelectorEvent::Draw(Transition::Cleared))));
        assert_eq!(selector.draw_state(), DrawState::Idle);
    }

    #[tokio::test]
    async fn start_drawing_clears_previous_boundary() {
        let (mut selector, handle) = open();
        assert_eq!(handle.emit(&create(square())), 1);
        selector.pump_draw_events();

        selector.start_polygon_drawing().unwrap();
        assert_eq!(selector.draw_state(), DrawState::Idle);
        assert!(selector.boundary().current_snapshot().is_none());

        let commands = handle.commands();
        let tail = &commands[commands.len() - 2..];
        assert_eq!(
            tail,
            [
                SurfaceCommand::DeleteAll,
                SurfaceCommand::ChangeMode(DrawMode::DrawPolygon)
            ]
        );
    }

    #[tokio::test]
    async fn clear_drawing_removes_boundary() {
        let (mut selector, handle) = open();
        assert_eq!(handle.emit(&create(square())), 1);
        selector.pump_draw_events();

        selector.clear_drawing().unwrap();
        assert!(!selector.can_proceed());
        assert_eq!(handle.commands().last(), Some(&SurfaceCommand::DeleteAll));
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_a_result_flies_the_map() {
        let (mut selector, handle) = open();
        selector.search_input("okhla");
        let updates = selector.settle_search().await;
        assert_eq!(updates.len(), 2);
        assert_eq!(selector.search().status(), SearchStatus::Results);

        let options = selector.select_result(0).unwrap();
        assert!(options.essential);
        assert_eq!(options.center, Coordinate::new(77.27, 28.53));
        assert_eq!(handle.commands().last(), Some(&SurfaceCommand::FlyTo(options)));
        assert_eq!(selector.search().display_value(), "okhla, New Delhi, India");
        assert!(!selector.search().is_open());
    }

    #[tokio::test]
    async fn style_and_zoom_controls_reach_the_surface() {
        let (mut selector, handle) = open();
        selector.set_style("streets").unwrap();
        selector.set_style("satellite").unwrap();
        selector.zoom_in().unwrap();
        selector.zoom_out().unwrap();
        assert!(matches!(
            selector.set_style("watercolor"),
            Err(SessionError::Map(_))
        ));

        let commands = handle.commands();
        assert_eq!(
            commands[commands.len() - 3..],
            [
                SurfaceCommand::SetStyle("mapbox://styles/mapbox/satellite-v9".to_string()),
                SurfaceCommand::ZoomIn,
                SurfaceCommand::ZoomOut,
            ]
        );
        assert_eq!(selector.map().active_style(), "satellite");
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_invalidates_search_then_releases_map() {
        let (mut selector, handle) = open();
        selector.search_input("saket");
        tokio::task::yield_now().await;
        let token_before = selector.search().latest_token();

        selector.teardown();
        selector.teardown();

        assert!(selector.search().latest_token() > token_before);
        assert!(!selector.search().has_pending_work());
        assert_eq!(handle.subscriber_count(), 0);
        assert_eq!(handle.removals(), 1);
        assert_eq!(handle.commands().last(), Some(&SurfaceCommand::Remove));

        assert!(selector.zoom_in().is_err());
        assert!(selector.start_polygon_drawing().is_err());
        assert!(selector.next_event().await.is_none());
    }

    #[tokio::test]
    async fn drop_tears_down_once() {
        let (selector, handle) = open();
        drop(selector);
        assert_eq!(handle.removals(), 1);
        assert_eq!(handle.subscriber_count(), 0);
    }
}
