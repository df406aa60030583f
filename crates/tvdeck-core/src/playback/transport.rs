//! Transport contract shared by every backend

use super::{Backend, PlaybackState};
use crate::Result;
use std::time::Duration;

/// Completion or lifecycle report from a backend.
///
/// Backends answer asynchronously; the deck collects these through
/// [`Transport::poll_events`] and delivers them on the bus.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Preparation finished, the transport can play
    Prepared,
    /// Preparation failed
    PrepareFailed(String),
    /// Duration is known
    MetadataLoaded,
    /// Playback position advanced
    TimeUpdate,
    /// Backend started buffering
    BufferingStarted,
    /// End of stream reached
    Ended,
    /// Backend reported an error
    Error { message: String, fatal: bool },
    /// Asynchronous release finished
    Released,
    /// Asynchronous release failed
    ReleaseFailed(String),
}

/// Behavior that differs between backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// `pause()` is accepted while only Ready
    pub pause_when_ready: bool,
    /// `stop()` must be issued, and only from Playing or Paused
    pub explicit_stop: bool,
    /// `release()` completes later with `Released` or `ReleaseFailed`
    pub async_release: bool,
}

/// A playback backend as seen by the engine.
///
/// Positions and jumps cross this boundary as [`Duration`]; each transport
/// converts to its backend's native unit.
pub trait Transport {
    fn backend(&self) -> Backend;

    fn capabilities(&self) -> Capabilities;

    /// Attach a source
    fn open(&mut self, url: &str) -> Result<()>;

    /// Current state, read live from the backend
    fn state(&self) -> PlaybackState;

    /// Begin preparing; completion arrives as `Prepared` or `PrepareFailed`
    fn prepare(&mut self) -> Result<()>;

    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    fn stop(&mut self) -> Result<()>;

    fn set_speed(&mut self, speed: f64) -> Result<()>;

    /// Move to an absolute position, already clamped by the caller
    fn seek_to(&mut self, target: Duration) -> Result<()>;

    fn position(&self) -> Duration;

    /// Content duration, once known
    fn duration(&self) -> Option<Duration>;

    /// Give back backend resources
    fn release(&mut self) -> Result<()>;

    fn show_surface(&mut self) -> Result<()>;

    fn hide_surface(&mut self) -> Result<()>;

    /// The application went to the background
    fn suspend(&mut self) -> Result<()> {
        Ok(())
    }

    /// The application came back to the foreground
    fn restore(&mut self) -> Result<()> {
        Ok(())
    }

    /// Drain events produced since the last poll. `now` is deck time.
    fn poll_events(&mut self, now: Duration) -> Vec<TransportEvent>;
}

/// Builds transports for a backend selection
pub trait TransportFactory {
    fn create(&self, backend: Backend) -> Result<Box<dyn Transport>>;
}
