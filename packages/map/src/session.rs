//! Lifecycle of one map surface and its drawing overlay.
//!
//! A [`MapSession`] is the explicit handle passed to every component that
//! needs the map. Opening it mounts the overlay and subscribes to the
//! create/update/delete events; [`MapSession::teardown`] releases the
//! subscriptions and the surface exactly once, and runs on drop if it was
//! not called.

use geofence_map_models::{DrawEvent, DrawEventKind, DrawMode, FlyToOptions, OverlayConfig};
use tokio::sync::mpsc;

use crate::MapError;
use crate::styles::{DEFAULT_STYLE_ID, find_style};
use crate::surface::{DrawOverlay, MapSurface, SubscriptionId, Viewport};

/// Receiving end of the overlay event stream of a session.
pub type DrawEventStream = mpsc::UnboundedReceiver<DrawEvent>;

/// An open map surface with its drawing overlay mounted.
pub struct MapSession {
    surface: Box<dyn MapSurface>,
    overlay: Box<dyn DrawOverlay>,
    subscriptions: Vec<SubscriptionId>,
    active_style: String,
    torn_down: bool,
}

impl std::fmt::Debug for MapSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSession")
            .field("subscriptions", &self.subscriptions)
            .field("active_style", &self.active_style)
            .field("torn_down", &self.torn_down)
            .finish_non_exhaustive()
    }
}

impl MapSession {
    /// Mounts the drawing overlay on `surface` and subscribes to its
    /// create, update, and delete events.
    ///
    /// If any step fails, whatever was set up is released before the error
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] if the overlay cannot be mounted or a
    /// subscription is refused.
    pub fn open(
        mut surface: Box<dyn MapSurface>,
        overlay_config: &OverlayConfig,
    ) -> Result<(Self, DrawEventStream), MapError> {
        let overlay = match surface.add_overlay(overlay_config) {
            Ok(overlay) => overlay,
            Err(e) => {
                surface.remove();
                return Err(e);
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscriptions = Vec::with_capacity(DrawEventKind::ALL.len());

        for kind in DrawEventKind::ALL {
            match surface.on_feature_event(kind, tx.clone()) {
                Ok(id) => subscriptions.push(id),
                Err(e) => {
                    for id in subscriptions {
                        surface.off_feature_event(id);
                    }
                    surface.remove();
                    return Err(e);
                }
            }
        }

        log::info!(
            "Map session opened with {} overlay subscriptions",
            subscriptions.len()
        );

        Ok((
            Self {
                surface,
                overlay,
                subscriptions,
                active_style: DEFAULT_STYLE_ID.to_string(),
                torn_down: false,
            },
            rx,
        ))
    }

    /// Whether [`Self::teardown`] has already run.
    #[must_use]
    pub const fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Identifier of the active base style.
    #[must_use]
    pub fn active_style(&self) -> &str {
        &self.active_style
    }

    fn ensure_open(&self) -> Result<(), MapError> {
        if self.torn_down {
            Err(MapError::AlreadyTornDown)
        } else {
            Ok(())
        }
    }

    /// Switches the base style. Selecting the active style is a no-op.
    ///
    /// # Errors
    ///
    /// * [`MapError::UnknownStyle`] if no style has this identifier
    /// * [`MapError::AlreadyTornDown`] after teardown
    pub fn set_style(&mut self, style_id: &str) -> Result<(), MapError> {
        self.ensure_open()?;
        if style_id == self.active_style {
            return Ok(());
        }
        let style = find_style(style_id).ok_or_else(|| MapError::UnknownStyle {
            id: style_id.to_string(),
        })?;

        log::debug!("Switching map style to {} ({})", style.name, style.url);
        self.surface.set_style(&style.url);
        self.active_style = style.id;
        Ok(())
    }

    /// Zooms in one level.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::AlreadyTornDown`] after teardown.
    pub fn zoom_in(&mut self) -> Result<(), MapError> {
        self.ensure_open()?;
        self.surface.zoom_in();
        Ok(())
    }

    /// Zooms out one level.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::AlreadyTornDown`] after teardown.
    pub fn zoom_out(&mut self) -> Result<(), MapError> {
        self.ensure_open()?;
        self.surface.zoom_out();
        Ok(())
    }

    /// Removes every drawing from the overlay.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::AlreadyTornDown`] after teardown.
    pub fn delete_all_drawings(&mut self) -> Result<(), MapError> {
        self.ensure_open()?;
        self.overlay.delete_all();
        Ok(())
    }

    /// Switches the overlay's interaction mode.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::AlreadyTornDown`] after teardown.
    pub fn change_draw_mode(&mut self, mode: DrawMode) -> Result<(), MapError> {
        self.ensure_open()?;
        self.overlay.change_mode(mode);
        Ok(())
    }

    /// Cancels the overlay subscriptions and destroys the surface.
    ///
    /// Only the first call has any effect.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        for id in self.subscriptions.drain(..) {
            self.surface.off_feature_event(id);
        }
        self.surface.remove();
        log::info!("Map session torn down");
    }
}

impl Viewport for MapSession {
    fn fly_to(&mut self, options: &FlyToOptions) {
        if self.torn_down {
            log::debug!("Ignoring fly-to on a torn down map session");
            return;
        }
        self.surface.fly_to(options);
    }
}

impl Drop for MapSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
