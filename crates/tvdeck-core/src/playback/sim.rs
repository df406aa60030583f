//! Simulated backends
//!
//! In-memory stand-ins for the hardware player, the media element and the
//! streaming player. They follow deck time handed to them on every poll,
//! record each call, and can be told to fail.

use super::adaptive::{AdaptiveTransport, StreamingEvent, StreamingPlayer, StreamingSettings};
use super::media_element::{MediaElement, MediaElementTransport, MediaEvent};
use super::native::{DisplayMode, NativeCallback, NativePlatform, NativeTransport};
use super::transport::{Transport, TransportFactory};
use super::{Backend, PlaybackState};
use crate::{Error, Result};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

/// A recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum SimCall {
    Open(String),
    Close,
    PrepareAsync,
    Play,
    Pause,
    Stop,
    SetSpeed(f64),
    JumpForward(u64),
    JumpBackward(u64),
    SetDisplayRect,
    SetDisplayMode(DisplayMode),
    SetStreamingProperty(String, String),
    Suspend,
    Restore,
    ShowSurface,
    HideSurface,
    SetSource(Option<String>),
    Load,
    SetCurrentTime(f64),
    SetPlaybackRate(f64),
    Configure(StreamingSettings),
    LoadManifest(String),
    Destroy,
}

/// Behavior knobs for the simulated backends
#[derive(Debug, Clone)]
pub struct SimOptions {
    /// Length of every simulated title
    pub media_duration: Duration,
    /// Refuse every source on open
    pub reject_sources: bool,
    /// Act as if the playback surface is missing from the page
    pub missing_surface: bool,
    /// Make the streaming player's teardown fail
    pub fail_destroy: bool,
    /// Report a 4K panel to the hardware player
    pub uhd_panel: bool,
    pub streaming: StreamingSettings,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            media_duration: Duration::from_secs(600),
            reject_sources: false,
            missing_surface: false,
            fail_destroy: false,
            uhd_panel: false,
            streaming: StreamingSettings::default(),
        }
    }
}

#[derive(Debug, Default)]
struct Recorder {
    native: Vec<SimCall>,
    element: Vec<SimCall>,
    streaming: Vec<SimCall>,
}

#[derive(Debug, Default)]
struct Shared {
    options: SimOptions,
    calls: Recorder,
    created: usize,
    native: Option<Rc<RefCell<NativeModel>>>,
    element: Option<Rc<RefCell<ElementModel>>>,
}

type SharedRef = Rc<RefCell<Shared>>;

#[derive(Debug)]
struct NativeModel {
    state: PlaybackState,
    position_ms: u64,
    duration_ms: u64,
    speed: f64,
    prepare_pending: bool,
    prepared: bool,
    last_poll: Option<Duration>,
    injected: Vec<NativeCallback>,
}

impl NativeModel {
    fn new(duration: Duration) -> Self {
        Self {
            state: PlaybackState::None,
            position_ms: 0,
            duration_ms: duration.as_millis() as u64,
            speed: 1.0,
            prepare_pending: false,
            prepared: false,
            last_poll: None,
            injected: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct ElementModel {
    source: Option<String>,
    ready_state: u8,
    paused: bool,
    current_time: f64,
    duration: f64,
    media_duration: f64,
    rate: f64,
    load_pending: bool,
    last_poll: Option<Duration>,
    injected: Vec<MediaEvent>,
}

impl ElementModel {
    fn new(duration: Duration) -> Self {
        Self {
            source: None,
            ready_state: 0,
            paused: true,
            current_time: 0.0,
            duration: f64::NAN,
            media_duration: duration.as_secs_f64(),
            rate: 1.0,
            load_pending: false,
            last_poll: None,
            injected: Vec::new(),
        }
    }

    fn attach(&mut self, source: Option<String>) {
        self.load_pending = source.is_some();
        self.source = source;
        self.ready_state = 0;
        self.paused = true;
        self.current_time = 0.0;
        self.duration = f64::NAN;
    }
}

fn missing_surface(shared: &SharedRef, what: &str) -> Result<()> {
    if shared.borrow().options.missing_surface {
        Err(Error::missing(what))
    } else {
        Ok(())
    }
}

/// Simulated hardware player
#[derive(Debug)]
pub struct SimNative {
    shared: SharedRef,
    model: Rc<RefCell<NativeModel>>,
}

impl SimNative {
    fn log(&self, call: SimCall) {
        self.shared.borrow_mut().calls.native.push(call);
    }

    fn require(&self, operation: &str, allowed: &[PlaybackState]) -> Result<PlaybackState> {
        let state = self.model.borrow().state;
        if allowed.contains(&state) {
            Ok(state)
        } else {
            Err(Error::transport(format!("{} refused in state {}", operation, state)))
        }
    }
}

impl NativePlatform for SimNative {
    fn open(&mut self, url: &str) -> Result<()> {
        self.log(SimCall::Open(url.to_string()));
        if self.shared.borrow().options.reject_sources {
            return Err(Error::transport("unsupported source"));
        }
        let mut model = self.model.borrow_mut();
        model.state = PlaybackState::Idle;
        model.position_ms = 0;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.log(SimCall::Close);
        let mut model = self.model.borrow_mut();
        model.state = PlaybackState::None;
        model.prepare_pending = false;
        model.prepared = false;
        Ok(())
    }

    fn state(&self) -> PlaybackState {
        self.model.borrow().state
    }

    fn prepare_async(&mut self) -> Result<()> {
        self.log(SimCall::PrepareAsync);
        self.require("prepare", &[PlaybackState::Idle])?;
        self.model.borrow_mut().prepare_pending = true;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.log(SimCall::Play);
        self.require("play", &[PlaybackState::Ready, PlaybackState::Paused])?;
        self.model.borrow_mut().state = PlaybackState::Playing;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.log(SimCall::Pause);
        self.require("pause", &[PlaybackState::Ready, PlaybackState::Playing])?;
        self.model.borrow_mut().state = PlaybackState::Paused;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.log(SimCall::Stop);
        let mut model = self.model.borrow_mut();
        model.state = PlaybackState::Idle;
        model.position_ms = 0;
        Ok(())
    }

    fn set_speed(&mut self, speed: f64) -> Result<()> {
        self.log(SimCall::SetSpeed(speed));
        self.require("set_speed", &[PlaybackState::Playing, PlaybackState::Paused])?;
        self.model.borrow_mut().speed = speed;
        Ok(())
    }

    fn jump_forward(&mut self, ms: u64) -> Result<()> {
        self.log(SimCall::JumpForward(ms));
        self.require(
            "jump",
            &[PlaybackState::Ready, PlaybackState::Playing, PlaybackState::Paused],
        )?;
        let mut model = self.model.borrow_mut();
        model.position_ms = model.position_ms.saturating_add(ms).min(model.duration_ms);
        Ok(())
    }

    fn jump_backward(&mut self, ms: u64) -> Result<()> {
        self.log(SimCall::JumpBackward(ms));
        self.require(
            "jump",
            &[PlaybackState::Ready, PlaybackState::Playing, PlaybackState::Paused],
        )?;
        let mut model = self.model.borrow_mut();
        model.position_ms = model.position_ms.saturating_sub(ms);
        Ok(())
    }

    fn duration_ms(&self) -> u64 {
        let model = self.model.borrow();
        if model.prepared {
            model.duration_ms
        } else {
            0
        }
    }

    fn set_display_rect(&mut self, _x: u32, _y: u32, _width: u32, _height: u32) -> Result<()> {
        self.log(SimCall::SetDisplayRect);
        Ok(())
    }

    fn set_display_mode(&mut self, mode: DisplayMode) -> Result<()> {
        self.log(SimCall::SetDisplayMode(mode));
        Ok(())
    }

    fn is_uhd_panel(&self) -> bool {
        self.shared.borrow().options.uhd_panel
    }

    fn set_streaming_property(&mut self, key: &str, value: &str) -> Result<()> {
        self.log(SimCall::SetStreamingProperty(key.to_string(), value.to_string()));
        Ok(())
    }

    fn suspend(&mut self) -> Result<()> {
        self.log(SimCall::Suspend);
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        self.log(SimCall::Restore);
        Ok(())
    }

    fn show_surface(&mut self) -> Result<()> {
        self.log(SimCall::ShowSurface);
        missing_surface(&self.shared, "native player surface")
    }

    fn hide_surface(&mut self) -> Result<()> {
        self.log(SimCall::HideSurface);
        missing_surface(&self.shared, "native player surface")
    }

    fn take_callbacks(&mut self, now: Duration) -> Vec<NativeCallback> {
        let mut model = self.model.borrow_mut();
        let mut callbacks = std::mem::take(&mut model.injected);

        if model.prepare_pending {
            model.prepare_pending = false;
            model.prepared = true;
            model.state = PlaybackState::Ready;
            callbacks.push(NativeCallback::Prepared);
        }

        let elapsed = model.last_poll.map(|last| now.saturating_sub(last));
        model.last_poll = Some(now);

        if let (PlaybackState::Playing, Some(elapsed)) = (model.state, elapsed) {
            if !elapsed.is_zero() {
                let advanced = (elapsed.as_millis() as f64 * model.speed) as u64;
                model.position_ms = model.position_ms.saturating_add(advanced).min(model.duration_ms);
                callbacks.push(NativeCallback::CurrentPlaytime(model.position_ms));

                if model.position_ms >= model.duration_ms {
                    model.state = PlaybackState::Paused;
                    callbacks.push(NativeCallback::StreamCompleted);
                }
            }
        }

        callbacks
    }
}

/// Simulated media element
#[derive(Debug)]
pub struct SimMediaElement {
    shared: SharedRef,
    model: Rc<RefCell<ElementModel>>,
}

impl SimMediaElement {
    fn log(&self, call: SimCall) {
        self.shared.borrow_mut().calls.element.push(call);
    }
}

impl MediaElement for SimMediaElement {
    fn has_source(&self) -> bool {
        self.model.borrow().source.is_some()
    }

    fn set_src(&mut self, url: Option<&str>) -> Result<()> {
        self.log(SimCall::SetSource(url.map(str::to_string)));
        if url.is_some() && self.shared.borrow().options.reject_sources {
            return Err(Error::transport("unsupported source"));
        }
        self.model.borrow_mut().attach(url.map(str::to_string));
        Ok(())
    }

    fn load(&mut self) -> Result<()> {
        self.log(SimCall::Load);
        let mut model = self.model.borrow_mut();
        let source = model.source.take();
        model.attach(source);
        Ok(())
    }

    fn ready_state(&self) -> u8 {
        self.model.borrow().ready_state
    }

    fn paused(&self) -> bool {
        self.model.borrow().paused
    }

    fn play(&mut self) -> Result<()> {
        self.log(SimCall::Play);
        let mut model = self.model.borrow_mut();
        if model.source.is_none() {
            return Err(Error::transport("no source to play"));
        }
        model.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.log(SimCall::Pause);
        self.model.borrow_mut().paused = true;
    }

    fn current_time(&self) -> f64 {
        self.model.borrow().current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.log(SimCall::SetCurrentTime(seconds));
        let mut model = self.model.borrow_mut();
        let upper = if model.duration.is_finite() {
            model.duration
        } else {
            f64::MAX
        };
        model.current_time = seconds.clamp(0.0, upper);
    }

    fn duration(&self) -> f64 {
        self.model.borrow().duration
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.log(SimCall::SetPlaybackRate(rate));
        self.model.borrow_mut().rate = rate;
    }

    fn set_visible(&mut self, visible: bool) -> Result<()> {
        self.log(if visible {
            SimCall::ShowSurface
        } else {
            SimCall::HideSurface
        });
        missing_surface(&self.shared, "video element")
    }

    fn take_events(&mut self, now: Duration) -> Vec<MediaEvent> {
        let mut model = self.model.borrow_mut();
        let mut events = std::mem::take(&mut model.injected);

        let elapsed = model.last_poll.map(|last| now.saturating_sub(last));
        model.last_poll = Some(now);

        if model.load_pending && model.source.is_some() {
            model.load_pending = false;
            model.ready_state = 4;
            model.duration = model.media_duration;
            events.push(MediaEvent::LoadedMetadata);
            events.push(MediaEvent::CanPlay);
            return events;
        }

        let playing = model.source.is_some() && model.ready_state >= 3 && !model.paused;
        if let (true, Some(elapsed)) = (playing, elapsed) {
            if !elapsed.is_zero() {
                model.current_time =
                    (model.current_time + elapsed.as_secs_f64() * model.rate).min(model.duration);
                events.push(MediaEvent::TimeUpdate);

                if model.current_time >= model.duration {
                    model.paused = true;
                    events.push(MediaEvent::Ended);
                }
            }
        }

        events
    }
}

/// Simulated adaptive-streaming player, feeding one [`SimMediaElement`]
#[derive(Debug)]
pub struct SimStreamingPlayer {
    shared: SharedRef,
    element: Rc<RefCell<ElementModel>>,
    manifest_pending: Option<String>,
    destroy_pending: bool,
}

impl SimStreamingPlayer {
    fn log(&self, call: SimCall) {
        self.shared.borrow_mut().calls.streaming.push(call);
    }
}

impl StreamingPlayer for SimStreamingPlayer {
    fn configure(&mut self, settings: &StreamingSettings) -> Result<()> {
        self.log(SimCall::Configure(*settings));
        Ok(())
    }

    fn load(&mut self, url: &str) -> Result<()> {
        self.log(SimCall::LoadManifest(url.to_string()));
        self.manifest_pending = Some(url.to_string());
        Ok(())
    }

    fn destroy(&mut self) -> Result<()> {
        self.log(SimCall::Destroy);
        self.manifest_pending = None;
        self.destroy_pending = true;
        Ok(())
    }

    fn take_events(&mut self, _now: Duration) -> Vec<StreamingEvent> {
        let mut events = Vec::new();

        if let Some(url) = self.manifest_pending.take() {
            if self.shared.borrow().options.reject_sources {
                events.push(StreamingEvent::ManifestFailed(format!("cannot load {}", url)));
            } else {
                self.element
                    .borrow_mut()
                    .attach(Some(format!("blob:{}", url)));
                events.push(StreamingEvent::ManifestLoaded);
            }
        }

        if self.destroy_pending {
            self.destroy_pending = false;
            self.element.borrow_mut().attach(None);
            if self.shared.borrow().options.fail_destroy {
                events.push(StreamingEvent::DestroyFailed("player busy".into()));
            } else {
                events.push(StreamingEvent::Destroyed);
            }
        }

        events
    }
}

/// Builds simulated transports and keeps a handle on the latest one.
///
/// Clones share state, so a test can keep one clone and hand another to
/// the deck.
#[derive(Debug, Clone, Default)]
pub struct SimulatedFactory {
    shared: SharedRef,
}

impl SimulatedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SimOptions) -> Self {
        let factory = Self::default();
        factory.shared.borrow_mut().options = options;
        factory
    }

    pub fn options(&self) -> SimOptions {
        self.shared.borrow().options.clone()
    }

    /// Change the length of the current and future titles
    pub fn set_media_duration(&self, duration: Duration) {
        let mut shared = self.shared.borrow_mut();
        shared.options.media_duration = duration;
        if let Some(native) = &shared.native {
            native.borrow_mut().duration_ms = duration.as_millis() as u64;
        }
        if let Some(element) = &shared.element {
            let mut element = element.borrow_mut();
            element.media_duration = duration.as_secs_f64();
            if element.duration.is_finite() {
                element.duration = element.media_duration;
            }
        }
    }

    pub fn set_missing_surface(&self, missing: bool) {
        self.shared.borrow_mut().options.missing_surface = missing;
    }

    pub fn set_reject_sources(&self, reject: bool) {
        self.shared.borrow_mut().options.reject_sources = reject;
    }

    pub fn set_fail_destroy(&self, fail: bool) {
        self.shared.borrow_mut().options.fail_destroy = fail;
    }

    /// Queue a backend error on the latest transport
    pub fn inject_error(&self, message: &str) {
        let shared = self.shared.borrow();
        if let Some(native) = &shared.native {
            native
                .borrow_mut()
                .injected
                .push(NativeCallback::Error(message.to_string()));
        }
        if let Some(element) = &shared.element {
            element
                .borrow_mut()
                .injected
                .push(MediaEvent::Error(message.to_string()));
        }
    }

    pub fn native_calls(&self) -> Vec<SimCall> {
        self.shared.borrow().calls.native.clone()
    }

    pub fn element_calls(&self) -> Vec<SimCall> {
        self.shared.borrow().calls.element.clone()
    }

    pub fn streaming_calls(&self) -> Vec<SimCall> {
        self.shared.borrow().calls.streaming.clone()
    }

    pub fn clear_calls(&self) {
        self.shared.borrow_mut().calls = Recorder::default();
    }

    /// Number of transports built so far
    pub fn created(&self) -> usize {
        self.shared.borrow().created
    }
}

impl TransportFactory for SimulatedFactory {
    fn create(&self, backend: Backend) -> Result<Box<dyn Transport>> {
        let mut shared = self.shared.borrow_mut();
        shared.created += 1;
        let duration = shared.options.media_duration;
        debug!(backend = %backend, "Building simulated transport");

        let transport: Box<dyn Transport> = match backend {
            Backend::Native => {
                let model = Rc::new(RefCell::new(NativeModel::new(duration)));
                shared.native = Some(model.clone());
                shared.element = None;
                Box::new(NativeTransport::new(SimNative {
                    shared: self.shared.clone(),
                    model,
                }))
            }
            Backend::MediaElement => {
                let model = Rc::new(RefCell::new(ElementModel::new(duration)));
                shared.element = Some(model.clone());
                shared.native = None;
                Box::new(MediaElementTransport::new(SimMediaElement {
                    shared: self.shared.clone(),
                    model,
                }))
            }
            Backend::Adaptive => {
                let model = Rc::new(RefCell::new(ElementModel::new(duration)));
                shared.element = Some(model.clone());
                shared.native = None;
                let element = SimMediaElement {
                    shared: self.shared.clone(),
                    model: model.clone(),
                };
                let player = SimStreamingPlayer {
                    shared: self.shared.clone(),
                    element: model,
                    manifest_pending: None,
                    destroy_pending: false,
                };
                Box::new(AdaptiveTransport::new(
                    element,
                    player,
                    shared.options.streaming,
                ))
            }
        };

        Ok(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::TransportEvent;

    #[test]
    fn test_native_prepare_completes_on_next_poll() {
        let factory = SimulatedFactory::new();
        let mut transport = factory.create(Backend::Native).unwrap();
        transport.open("file:///media/heat.mkv").unwrap();
        transport.prepare().unwrap();

        assert_eq!(transport.state(), PlaybackState::Idle);
        let events = transport.poll_events(Duration::ZERO);
        assert_eq!(events, vec![TransportEvent::Prepared]);
        assert_eq!(transport.state(), PlaybackState::Ready);
        assert_eq!(transport.duration(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_native_enables_4k_on_uhd_panel() {
        let factory = SimulatedFactory::with_options(SimOptions {
            uhd_panel: true,
            ..Default::default()
        });
        let mut transport = factory.create(Backend::Native).unwrap();
        transport.open("file:///media/heat.mkv").unwrap();

        let calls = factory.native_calls();
        assert!(calls.contains(&SimCall::SetStreamingProperty(
            "SET_MODE_4K".into(),
            "true".into()
        )));
        assert!(calls.contains(&SimCall::SetDisplayMode(DisplayMode::FullScreen)));
    }

    #[test]
    fn test_element_state_follows_flags() {
        let factory = SimulatedFactory::new();
        let mut transport = factory.create(Backend::MediaElement).unwrap();
        assert_eq!(transport.state(), PlaybackState::Idle);

        transport.open("https://media.example/a.mp4").unwrap();
        assert_eq!(transport.state(), PlaybackState::Ready);

        transport.poll_events(Duration::ZERO);
        assert_eq!(transport.state(), PlaybackState::Paused);

        transport.play().unwrap();
        assert_eq!(transport.state(), PlaybackState::Playing);

        transport.poll_events(Duration::from_secs(2));
        assert_eq!(transport.position(), Duration::from_secs(2));
    }

    #[test]
    fn test_adaptive_manifest_attaches_element() {
        let factory = SimulatedFactory::new();
        let mut transport = factory.create(Backend::Adaptive).unwrap();
        transport.open("https://media.example/a.mpd").unwrap();
        transport.prepare().unwrap();

        let events = transport.poll_events(Duration::ZERO);

        assert_eq!(events[0], TransportEvent::Prepared);
        assert!(events.contains(&TransportEvent::MetadataLoaded));
        assert_eq!(transport.state(), PlaybackState::Paused);
        assert!(factory
            .streaming_calls()
            .contains(&SimCall::Configure(StreamingSettings::default())));
    }

    #[test]
    fn test_adaptive_release_reports_failure() {
        let factory = SimulatedFactory::new();
        factory.set_fail_destroy(true);
        let mut transport = factory.create(Backend::Adaptive).unwrap();
        transport.open("https://media.example/a.mpd").unwrap();
        transport.poll_events(Duration::ZERO);

        transport.release().unwrap();
        let events = transport.poll_events(Duration::from_millis(16));

        assert!(matches!(events.as_slice(), [TransportEvent::ReleaseFailed(_)]));
        assert_eq!(transport.state(), PlaybackState::Idle);
    }
}
