//! Capability traits for the host-provided map surface and drawing overlay.
//!
//! The real implementations are native widgets; everything in the
//! boundary pipeline talks to them through these traits so it can run
//! against an in-memory surface.

use geofence_map_models::{DrawEvent, DrawEventKind, DrawMode, FlyToOptions, OverlayConfig};
use tokio::sync::mpsc;

use crate::MapError;

/// Channel end a surface delivers overlay events into.
///
/// Events are delivered in the order the overlay emits them.
pub type DrawEventSink = mpsc::UnboundedSender<DrawEvent>;

/// Handle of one overlay event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

/// A map rendering surface.
pub trait MapSurface: Send {
    /// Mounts a drawing overlay on the surface.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Overlay`] if the overlay cannot be mounted.
    fn add_overlay(&mut self, config: &OverlayConfig) -> Result<Box<dyn DrawOverlay>, MapError>;

    /// Subscribes `sink` to overlay events of one kind.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Overlay`] if the subscription is refused.
    fn on_feature_event(
        &mut self,
        kind: DrawEventKind,
        sink: DrawEventSink,
    ) -> Result<SubscriptionId, MapError>;

    /// Cancels a subscription made with [`Self::on_feature_event`].
    fn off_feature_event(&mut self, id: SubscriptionId);

    /// Animates the viewport to a new center and zoom.
    fn fly_to(&mut self, options: &FlyToOptions);

    /// Replaces the base map style.
    fn set_style(&mut self, url: &str);

    /// Zooms in one level.
    fn zoom_in(&mut self);

    /// Zooms out one level.
    fn zoom_out(&mut self);

    /// Destroys the surface and everything mounted on it.
    fn remove(&mut self);
}

/// The polygon drawing overlay mounted on a [`MapSurface`].
pub trait DrawOverlay: Send {
    /// Removes every drawn feature.
    fn delete_all(&mut self);

    /// Switches the interaction mode.
    fn change_mode(&mut self, mode: DrawMode);
}

/// Anything that can perform a viewport transition.
pub trait Viewport {
    /// Animates the viewport.
    fn fly_to(&mut self, options: &FlyToOptions);
}
