//! Transport over an adaptive-streaming player attached to a media element
//!
//! The streaming player feeds the element; the element still owns playback
//! state, rate and position. Manifest loading and teardown are both
//! asynchronous and report back through [`StreamingEvent`].

use super::media_element::{element_state, seconds_to_duration, MediaElement, MediaEvent};
use super::transport::{Capabilities, Transport, TransportEvent};
use super::{Backend, PlaybackState};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

/// Buffering goals handed to the streaming player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingSettings {
    pub buffering_goal_secs: f64,
    pub rebuffering_goal_secs: f64,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            buffering_goal_secs: 30.0,
            rebuffering_goal_secs: 15.0,
        }
    }
}

/// Completions reported by the streaming player
#[derive(Debug, Clone, PartialEq)]
pub enum StreamingEvent {
    ManifestLoaded,
    ManifestFailed(String),
    Error { message: String, critical: bool },
    Destroyed,
    DestroyFailed(String),
}

/// Adaptive-streaming player API
pub trait StreamingPlayer {
    fn configure(&mut self, settings: &StreamingSettings) -> Result<()>;
    /// Completion arrives as `ManifestLoaded` or `ManifestFailed`
    fn load(&mut self, url: &str) -> Result<()>;
    /// Completion arrives as `Destroyed` or `DestroyFailed`
    fn destroy(&mut self) -> Result<()>;
    fn take_events(&mut self, now: Duration) -> Vec<StreamingEvent>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Manifest {
    NotRequested,
    Loading,
    Loaded,
    Failed,
}

/// Adaptive-streaming transport
pub struct AdaptiveTransport<E: MediaElement, S: StreamingPlayer> {
    element: E,
    player: S,
    settings: StreamingSettings,
    manifest: Manifest,
    preparing: bool,
    /// Prepared is owed to the engine on the next poll
    prepared_pending: bool,
}

impl<E: MediaElement, S: StreamingPlayer> AdaptiveTransport<E, S> {
    pub fn new(element: E, player: S, settings: StreamingSettings) -> Self {
        Self {
            element,
            player,
            settings,
            manifest: Manifest::NotRequested,
            preparing: false,
            prepared_pending: false,
        }
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn player(&self) -> &S {
        &self.player
    }

    fn streaming_event(&mut self, event: StreamingEvent, events: &mut Vec<TransportEvent>) {
        match event {
            StreamingEvent::ManifestLoaded => {
                info!("Manifest loaded");
                self.manifest = Manifest::Loaded;
                if self.preparing {
                    self.preparing = false;
                    events.push(TransportEvent::Prepared);
                }
            }
            StreamingEvent::ManifestFailed(reason) => {
                error!(reason = %reason, "Manifest failed to load");
                self.manifest = Manifest::Failed;
                if self.preparing {
                    self.preparing = false;
                    events.push(TransportEvent::PrepareFailed(reason));
                }
            }
            StreamingEvent::Error { message, critical } => events.push(TransportEvent::Error {
                message,
                fatal: critical,
            }),
            StreamingEvent::Destroyed => events.push(TransportEvent::Released),
            StreamingEvent::DestroyFailed(reason) => {
                events.push(TransportEvent::ReleaseFailed(reason))
            }
        }
    }
}

impl<E: MediaElement, S: StreamingPlayer> Transport for AdaptiveTransport<E, S> {
    fn backend(&self) -> Backend {
        Backend::Adaptive
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            pause_when_ready: false,
            explicit_stop: false,
            async_release: true,
        }
    }

    fn open(&mut self, url: &str) -> Result<()> {
        let rejected = |e: Error| Error::SourceRejected {
            url: url.to_string(),
            reason: e.to_string(),
        };

        self.player.configure(&self.settings).map_err(rejected)?;
        self.player.load(url).map_err(rejected)?;
        self.manifest = Manifest::Loading;
        debug!(url, "Manifest requested");
        Ok(())
    }

    fn state(&self) -> PlaybackState {
        element_state(&self.element)
    }

    fn prepare(&mut self) -> Result<()> {
        match self.manifest {
            Manifest::NotRequested => Err(Error::transport("no manifest requested")),
            Manifest::Failed => Err(Error::transport("manifest failed to load")),
            Manifest::Loading => {
                self.preparing = true;
                Ok(())
            }
            Manifest::Loaded => {
                self.prepared_pending = true;
                Ok(())
            }
        }
    }

    fn play(&mut self) -> Result<()> {
        self.element.play()
    }

    fn pause(&mut self) -> Result<()> {
        self.element.pause();
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.element.pause();
        self.element.set_current_time(0.0);
        Ok(())
    }

    fn set_speed(&mut self, speed: f64) -> Result<()> {
        self.element.set_playback_rate(speed);
        Ok(())
    }

    fn seek_to(&mut self, target: Duration) -> Result<()> {
        self.element.set_current_time(target.as_secs_f64());
        Ok(())
    }

    fn position(&self) -> Duration {
        seconds_to_duration(self.element.current_time()).unwrap_or_default()
    }

    fn duration(&self) -> Option<Duration> {
        seconds_to_duration(self.element.duration())
    }

    fn release(&mut self) -> Result<()> {
        self.preparing = false;
        self.prepared_pending = false;
        self.player.destroy()
    }

    fn show_surface(&mut self) -> Result<()> {
        self.element.set_visible(true)
    }

    fn hide_surface(&mut self) -> Result<()> {
        self.element.set_visible(false)
    }

    fn poll_events(&mut self, now: Duration) -> Vec<TransportEvent> {
        let mut events = Vec::new();

        if self.prepared_pending {
            self.prepared_pending = false;
            events.push(TransportEvent::Prepared);
        }

        for event in self.player.take_events(now) {
            self.streaming_event(event, &mut events);
        }

        for event in self.element.take_events(now) {
            match event {
                MediaEvent::LoadedMetadata => events.push(TransportEvent::MetadataLoaded),
                MediaEvent::TimeUpdate => events.push(TransportEvent::TimeUpdate),
                MediaEvent::Ended => events.push(TransportEvent::Ended),
                MediaEvent::Error(message) => events.push(TransportEvent::Error {
                    message,
                    fatal: true,
                }),
                MediaEvent::CanPlay => {}
            }
        }

        events
    }
}
