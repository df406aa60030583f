//! Transport over a plain media element

use super::transport::{Capabilities, Transport, TransportEvent};
use super::{Backend, PlaybackState};
use crate::{Error, Result};
use std::time::Duration;
use tracing::debug;

/// Ready state from which the element can play without stalling
pub const HAVE_FUTURE_DATA: u8 = 3;

/// Events a media element fires
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    LoadedMetadata,
    CanPlay,
    TimeUpdate,
    Ended,
    Error(String),
}

/// Media element API. Times are in seconds.
pub trait MediaElement {
    fn has_source(&self) -> bool;
    fn set_src(&mut self, url: Option<&str>) -> Result<()>;
    fn load(&mut self) -> Result<()>;
    fn ready_state(&self) -> u8;
    fn paused(&self) -> bool;
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self);
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    /// NaN while unknown
    fn duration(&self) -> f64;
    fn set_playback_rate(&mut self, rate: f64);
    /// Fails with [`Error::MissingTarget`] when the element is not in the page
    fn set_visible(&mut self, visible: bool) -> Result<()>;
    fn take_events(&mut self, now: Duration) -> Vec<MediaEvent>;
}

/// State of an element, derived from its flags
pub fn element_state(element: &dyn MediaElement) -> PlaybackState {
    if !element.has_source() {
        PlaybackState::Idle
    } else if element.ready_state() < HAVE_FUTURE_DATA {
        PlaybackState::Ready
    } else if element.paused() {
        PlaybackState::Paused
    } else {
        PlaybackState::Playing
    }
}

pub(crate) fn seconds_to_duration(seconds: f64) -> Option<Duration> {
    (seconds.is_finite() && seconds >= 0.0).then(|| Duration::from_secs_f64(seconds))
}

/// Element-backed transport
pub struct MediaElementTransport<E: MediaElement> {
    element: E,
    preparing: bool,
}

impl<E: MediaElement> MediaElementTransport<E> {
    pub fn new(element: E) -> Self {
        Self {
            element,
            preparing: false,
        }
    }

    pub fn element(&self) -> &E {
        &self.element
    }
}

impl<E: MediaElement> Transport for MediaElementTransport<E> {
    fn backend(&self) -> Backend {
        Backend::MediaElement
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    fn open(&mut self, url: &str) -> Result<()> {
        self.element
            .set_src(Some(url))
            .map_err(|e| Error::SourceRejected {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    fn state(&self) -> PlaybackState {
        element_state(&self.element)
    }

    fn prepare(&mut self) -> Result<()> {
        if !self.element.has_source() {
            return Err(Error::transport("no source attached"));
        }
        self.preparing = true;
        self.element.load()
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
        self.element.set_src(None)
    }

    fn show_surface(&mut self) -> Result<()> {
        self.element.set_visible(true)
    }

    fn hide_surface(&mut self) -> Result<()> {
        self.element.set_visible(false)
    }

    fn poll_events(&mut self, now: Duration) -> Vec<TransportEvent> {
        let mut events = Vec::new();
        for event in self.element.take_events(now) {
            match event {
                MediaEvent::LoadedMetadata => events.push(TransportEvent::MetadataLoaded),
                MediaEvent::CanPlay => {
                    if self.preparing {
                        self.preparing = false;
                        events.push(TransportEvent::Prepared);
                    } else {
                        debug!("Element can play");
                    }
                }
                MediaEvent::TimeUpdate => events.push(TransportEvent::TimeUpdate),
                MediaEvent::Ended => events.push(TransportEvent::Ended),
                MediaEvent::Error(message) => events.push(TransportEvent::Error {
                    message,
                    fatal: true,
                }),
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_to_duration_rejects_unknown() {
        assert_eq!(seconds_to_duration(f64::NAN), None);
        assert_eq!(seconds_to_duration(f64::INFINITY), None);
        assert_eq!(seconds_to_duration(-1.0), None);
        assert_eq!(seconds_to_duration(1.5), Some(Duration::from_millis(1500)));
    }
}
