//! Transport over the platform's hardware player

use super::transport::{Capabilities, Transport, TransportEvent};
use super::{Backend, PlaybackState};
use crate::{Error, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Display modes understood by the hardware player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    AutoAspectRatio,
    FullScreen,
}

/// Callbacks the hardware player delivers asynchronously
#[derive(Debug, Clone, PartialEq)]
pub enum NativeCallback {
    Prepared,
    PrepareError(String),
    BufferingStart,
    /// Current play time in milliseconds
    CurrentPlaytime(u64),
    StreamCompleted,
    Error(String),
}

/// Hardware player API. Times are in milliseconds.
pub trait NativePlatform {
    fn open(&mut self, url: &str) -> Result<()>;
    fn close(&mut self) -> Result<()>;
    /// State as the player reports it
    fn state(&self) -> PlaybackState;
    /// Completion arrives as [`NativeCallback::Prepared`]
    fn prepare_async(&mut self) -> Result<()>;
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn set_speed(&mut self, speed: f64) -> Result<()>;
    fn jump_forward(&mut self, ms: u64) -> Result<()>;
    fn jump_backward(&mut self, ms: u64) -> Result<()>;
    /// Zero until prepared
    fn duration_ms(&self) -> u64;
    fn set_display_rect(&mut self, x: u32, y: u32, width: u32, height: u32) -> Result<()>;
    fn set_display_mode(&mut self, mode: DisplayMode) -> Result<()>;
    fn is_uhd_panel(&self) -> bool;
    fn set_streaming_property(&mut self, key: &str, value: &str) -> Result<()>;
    fn suspend(&mut self) -> Result<()>;
    fn restore(&mut self) -> Result<()>;
    fn show_surface(&mut self) -> Result<()>;
    fn hide_surface(&mut self) -> Result<()>;
    fn take_callbacks(&mut self, now: Duration) -> Vec<NativeCallback>;
}

/// Full-screen display rectangle
const SCREEN: (u32, u32) = (1920, 1080);

/// Hardware player transport.
///
/// The player reports its state directly; the play time is tracked from
/// its callbacks and from our own jumps.
pub struct NativeTransport<P: NativePlatform> {
    platform: P,
    current_ms: u64,
    duration_ms: u64,
}

impl<P: NativePlatform> NativeTransport<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            current_ms: 0,
            duration_ms: 0,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    fn configure_display(&mut self) {
        if let Err(e) = self.platform.set_display_mode(DisplayMode::AutoAspectRatio) {
            warn!(error = %e, "Aspect ratio mode rejected");
        }

        if self.platform.is_uhd_panel() {
            info!("4K panel detected, enabling 4K mode");
            if let Err(e) = self.platform.set_streaming_property("SET_MODE_4K", "true") {
                warn!(error = %e, "4K mode not supported");
            }
        }

        let fullscreen = self
            .platform
            .set_display_rect(0, 0, SCREEN.0, SCREEN.1)
            .and_then(|_| self.platform.set_display_mode(DisplayMode::FullScreen));
        if let Err(e) = fullscreen {
            warn!(error = %e, "Fullscreen initialization failed");
        }
    }
}

fn as_millis(value: Duration) -> u64 {
    u64::try_from(value.as_millis()).unwrap_or(u64::MAX)
}

impl<P: NativePlatform> Transport for NativeTransport<P> {
    fn backend(&self) -> Backend {
        Backend::Native
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            pause_when_ready: true,
            explicit_stop: true,
            async_release: false,
        }
    }

    fn open(&mut self, url: &str) -> Result<()> {
        self.platform.open(url).map_err(|e| Error::SourceRejected {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        self.current_ms = 0;
        self.duration_ms = 0;
        self.configure_display();
        Ok(())
    }

    fn state(&self) -> PlaybackState {
        self.platform.state()
    }

    fn prepare(&mut self) -> Result<()> {
        self.platform.prepare_async()
    }

    fn play(&mut self) -> Result<()> {
        self.platform.play()
    }

    fn pause(&mut self) -> Result<()> {
        self.platform.pause()
    }

    fn stop(&mut self) -> Result<()> {
        self.platform.stop()?;
        self.current_ms = 0;
        Ok(())
    }

    fn set_speed(&mut self, speed: f64) -> Result<()> {
        self.platform.set_speed(speed)
    }

    fn seek_to(&mut self, target: Duration) -> Result<()> {
        let target_ms = as_millis(target);
        if target_ms >= self.current_ms {
            self.platform.jump_forward(target_ms - self.current_ms)?;
        } else {
            self.platform.jump_backward(self.current_ms - target_ms)?;
        }
        self.current_ms = target_ms;
        Ok(())
    }

    fn position(&self) -> Duration {
        Duration::from_millis(self.current_ms)
    }

    fn duration(&self) -> Option<Duration> {
        (self.duration_ms > 0).then(|| Duration::from_millis(self.duration_ms))
    }

    fn release(&mut self) -> Result<()> {
        self.platform.close()
    }

    fn show_surface(&mut self) -> Result<()> {
        self.platform.show_surface()
    }

    fn hide_surface(&mut self) -> Result<()> {
        self.platform.hide_surface()
    }

    fn suspend(&mut self) -> Result<()> {
        let state = self.platform.state();
        if matches!(
            state,
            PlaybackState::Ready | PlaybackState::Playing | PlaybackState::Paused
        ) {
            self.platform.suspend()?;
            info!("Player suspended");
        } else {
            debug!(state = %state, "Nothing to suspend");
        }
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        let state = self.platform.state();
        if matches!(
            state,
            PlaybackState::None | PlaybackState::Playing | PlaybackState::Paused
        ) {
            self.platform.restore()?;
            info!("Player restored");
        } else {
            debug!(state = %state, "Nothing to restore");
        }
        Ok(())
    }

    fn poll_events(&mut self, now: Duration) -> Vec<TransportEvent> {
        let callbacks = self.platform.take_callbacks(now);
        let mut events = Vec::with_capacity(callbacks.len());

        for callback in callbacks {
            match callback {
                NativeCallback::Prepared => {
                    self.duration_ms = self.platform.duration_ms();
                    events.push(TransportEvent::Prepared);
                }
                NativeCallback::PrepareError(reason) => {
                    events.push(TransportEvent::PrepareFailed(reason));
                }
                NativeCallback::BufferingStart => {
                    events.push(TransportEvent::BufferingStarted);
                }
                NativeCallback::CurrentPlaytime(ms) => {
                    self.current_ms = ms;
                    events.push(TransportEvent::TimeUpdate);
                }
                NativeCallback::StreamCompleted => events.push(TransportEvent::Ended),
                NativeCallback::Error(message) => events.push(TransportEvent::Error {
                    message,
                    fatal: false,
                }),
            }
        }

        events
    }
}
