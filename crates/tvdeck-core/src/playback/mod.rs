//! Playback control
//!
//! One [`PlaybackEngine`] drives whichever [`Transport`] the deck was
//! composed with. The engine owns the shared behavior (state checks, speed
//! cycling, progressive seek, lifecycle, progress reporting); transports
//! only adapt a concrete backend:
//! - [`NativeTransport`] for the platform's hardware player
//! - [`MediaElementTransport`] for a plain media element
//! - [`AdaptiveTransport`] for an adaptive-streaming player on a media element

mod adaptive;
mod engine;
mod host;
mod media_element;
mod native;
mod progress;
#[cfg(feature = "sim")]
pub mod sim;
mod transport;

pub use adaptive::{AdaptiveTransport, StreamingEvent, StreamingPlayer, StreamingSettings};
pub use engine::{EngineSettings, PlaybackEngine};
pub use host::PlayerHost;
pub use media_element::{
    element_state, MediaElement, MediaElementTransport, MediaEvent, HAVE_FUTURE_DATA,
};
pub use native::{DisplayMode, NativeCallback, NativePlatform, NativeTransport};
pub use progress::{Progress, ProgressLayout};
pub use transport::{Capabilities, Transport, TransportEvent, TransportFactory};

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Playback rates cycled by the speed control
pub const PLAYBACK_SPEEDS: [f64; 5] = [1.0, 1.25, 1.5, 1.75, 2.0];

/// Rate following `current` in [`PLAYBACK_SPEEDS`], wrapping to 1x.
///
/// A rate outside the list restarts the cycle at 1x.
pub fn next_speed(current: f64) -> f64 {
    let next = PLAYBACK_SPEEDS
        .iter()
        .position(|speed| *speed == current)
        .map(|index| (index + 1) % PLAYBACK_SPEEDS.len())
        .unwrap_or(0);
    PLAYBACK_SPEEDS[next]
}

/// Player state as reported by (or derived from) the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Nothing attached
    Idle,
    /// Attached but not prepared
    None,
    /// Prepared or buffering, not playing
    Ready,
    Playing,
    Paused,
}

impl PlaybackState {
    /// Check if a transition to `target` is valid
    pub fn can_transition_to(&self, target: PlaybackState) -> bool {
        match target {
            PlaybackState::Playing => {
                matches!(self, PlaybackState::Ready | PlaybackState::Paused)
            }
            PlaybackState::Paused => matches!(self, PlaybackState::Playing),
            _ => true,
        }
    }

    /// True before the transport has been prepared
    pub fn is_unprepared(&self) -> bool {
        matches!(self, PlaybackState::Idle | PlaybackState::None)
    }

    /// True once content is playing or paused
    pub fn is_started(&self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Paused)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::None => write!(f, "none"),
            PlaybackState::Ready => write!(f, "ready"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
        }
    }
}

/// Which transport the deck is composed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Platform hardware player
    Native,
    /// Plain media element
    #[default]
    MediaElement,
    /// Adaptive-streaming player
    Adaptive,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Native => write!(f, "native"),
            Backend::MediaElement => write!(f, "media_element"),
            Backend::Adaptive => write!(f, "adaptive"),
        }
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "native" | "avplayer" => Ok(Backend::Native),
            "media_element" | "media-element" | "videotag" => Ok(Backend::MediaElement),
            "adaptive" | "shakaplayer" => Ok(Backend::Adaptive),
            other => Err(Error::InvalidConfig(format!("unknown backend: {}", other))),
        }
    }
}
