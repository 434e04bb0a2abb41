//! In-memory [`MapSurface`] that records every command it receives.
//!
//! Used by the headless CLI and by tests. A [`SurfaceHandle`] shares the
//! surface's log so callers can emit overlay events and inspect commands
//! after the surface has been handed to a session.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use geofence_map_models::{DrawEvent, DrawEventKind, DrawMode, FlyToOptions, OverlayConfig};

use crate::MapError;
use crate::surface::{DrawEventSink, DrawOverlay, MapSurface, SubscriptionId};

/// A command received by a [`RecordingSurface`] or its overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCommand {
    /// An overlay was mounted.
    AddOverlay,
    /// A subscription was cancelled.
    Unsubscribe(SubscriptionId),
    /// The viewport was animated.
    FlyTo(FlyToOptions),
    /// The base style was replaced.
    SetStyle(String),
    /// Zoomed in one level.
    ZoomIn,
    /// Zoomed out one level.
    ZoomOut,
    /// The overlay removed all drawings.
    DeleteAll,
    /// The overlay changed mode.
    ChangeMode(DrawMode),
    /// The surface was destroyed.
    Remove,
}

#[derive(Debug, Default)]
struct SurfaceLog {
    commands: Vec<SurfaceCommand>,
    subscribers: BTreeMap<SubscriptionId, (DrawEventKind, DrawEventSink)>,
    next_id: u64,
    refuse_overlay: bool,
}

type SharedLog = Arc<Mutex<SurfaceLog>>;

fn lock(log: &SharedLog) -> MutexGuard<'_, SurfaceLog> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A surface that renders nothing and records everything.
#[derive(Debug)]
pub struct RecordingSurface {
    log: SharedLog,
}

/// Shared view of a [`RecordingSurface`]'s log.
#[derive(Debug, Clone)]
pub struct SurfaceHandle {
    log: SharedLog,
}

impl RecordingSurface {
    /// Creates a surface and a handle onto its log.
    #[must_use]
    pub fn new() -> (Self, SurfaceHandle) {
        let log = SharedLog::default();
        (Self { log: log.clone() }, SurfaceHandle { log })
    }

    /// Creates a surface whose [`MapSurface::add_overlay`] always fails.
    #[must_use]
    pub fn refusing_overlay() -> (Self, SurfaceHandle) {
        let (surface, handle) = Self::new();
        lock(&surface.log).refuse_overlay = true;
        (surface, handle)
    }

    fn record(&self, command: SurfaceCommand) {
        lock(&self.log).commands.push(command);
    }
}

impl MapSurface for RecordingSurface {
    fn add_overlay(&mut self, _config: &OverlayConfig) -> Result<Box<dyn DrawOverlay>, MapError> {
        if lock(&self.log).refuse_overlay {
            return Err(MapError::Overlay {
                message: "overlay refused by surface".to_string(),
            });
        }
        self.record(SurfaceCommand::AddOverlay);
        Ok(Box::new(RecordingOverlay {
            log: self.log.clone(),
        }))
    }

    fn on_feature_event(
        &mut self,
        kind: DrawEventKind,
        sink: DrawEventSink,
    ) -> Result<SubscriptionId, MapError> {
        let mut log = lock(&self.log);
        log.next_id += 1;
        let id = SubscriptionId(log.next_id);
        log.subscribers.insert(id, (kind, sink));
        Ok(id)
    }

    fn off_feature_event(&mut self, id: SubscriptionId) {
        let mut log = lock(&self.log);
        log.subscribers.remove(&id);
        log.commands.push(SurfaceCommand::Unsubscribe(id));
    }

    fn fly_to(&mut self, options: &FlyToOptions) {
        self.record(SurfaceCommand::FlyTo(*options));
    }

    fn set_style(&mut self, url: &str) {
        self.record(SurfaceCommand::SetStyle(url.to_string()));
    }

    fn zoom_in(&mut self) {
        self.record(SurfaceCommand::ZoomIn);
    }

    fn zoom_out(&mut self) {
        self.record(SurfaceCommand::ZoomOut);
    }

    fn remove(&mut self) {
        self.record(SurfaceCommand::Remove);
    }
}

struct RecordingOverlay {
    log: SharedLog,
}

impl DrawOverlay for RecordingOverlay {
    fn delete_all(&mut self) {
        lock(&self.log).commands.push(SurfaceCommand::DeleteAll);
    }

    fn change_mode(&mut self, mode: DrawMode) {
        lock(&self.log).commands.push(SurfaceCommand::ChangeMode(mode));
    }
}

impl SurfaceHandle {
    /// Delivers an overlay event to every subscriber of its kind.
    ///
    /// Returns the number of subscribers that received it.
    #[must_use = "zero deliveries means nothing is listening"]
    pub fn emit(&self, event: &DrawEvent) -> usize {
        let log = lock(&self.log);
        log.subscribers
            .values()
            .filter(|(kind, _)| *kind == event.kind())
            .filter(|(_, sink)| sink.send(event.clone()).is_ok())
            .count()
    }

    /// Every command received so far, in order.
    #[must_use]
    pub fn commands(&self) -> Vec<SurfaceCommand> {
        lock(&self.log).commands.clone()
    }

    /// How many times the surface was destroyed.
    #[must_use]
    pub fn removals(&self) -> usize {
        lock(&self.log)
            .commands
            .iter()
            .filter(|c| matches!(c, SurfaceCommand::Remove))
            .count()
    }

    /// Number of live overlay event subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.log).subscribers.len()
    }
}
