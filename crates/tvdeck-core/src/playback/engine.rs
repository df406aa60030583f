//! Playback engine
//!
//! Holds every rule shared by the backends: state checks, speed cycling,
//! progressive seek, lifecycle and progress reporting. The backend itself
//! sits behind [`Transport`].
//!
//! Public operations never fail outward. Rejected requests are logged as
//! warnings, transport failures as errors, and the engine stays usable.

use super::progress::{Progress, ProgressLayout};
use super::transport::{Transport, TransportEvent};
use super::{next_speed, Backend, PlaybackState};
use crate::bus::{EventBus, TimerId};
use crate::error::Severity;
use crate::seek::{seek_target, SeekDirection, SeekSession, SeekTable};
use crate::signal::{Signal, SignalKind, Subscriber};
use crate::{Error, Result};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Bus signals the engine listens to while it is live
const PLAYER_SIGNALS: [SignalKind; 9] = [
    SignalKind::ChangeSpeed,
    SignalKind::FastForward,
    SignalKind::Rewind,
    SignalKind::StopFastForward,
    SignalKind::StopRewind,
    SignalKind::PlayPause,
    SignalKind::Kill,
    SignalKind::SeekTick,
    SignalKind::Transport,
];

/// Tunables the engine reads from the deck configuration
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub seek_table: SeekTable,
    pub seek_tick: Duration,
    pub layout: ProgressLayout,
    /// Progress at which the "next" button is offered
    pub almost_finished_percent: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            seek_table: SeekTable::default(),
            seek_tick: Duration::from_millis(500),
            layout: ProgressLayout::default(),
            almost_finished_percent: 90.0,
        }
    }
}

#[derive(Debug)]
struct ActiveSeek {
    session: SeekSession,
    timer: TimerId,
}

/// The single live player
pub struct PlaybackEngine {
    transport: Box<dyn Transport>,
    settings: EngineSettings,
    speed: f64,
    seek: Option<ActiveSeek>,
    next_session: u64,
    /// `play()` is waiting for preparation to complete
    awaiting_prepare: bool,
    next_button_shown: bool,
    stopped: bool,
}

impl PlaybackEngine {
    pub fn new(transport: Box<dyn Transport>, settings: EngineSettings) -> Self {
        Self {
            transport,
            settings,
            speed: 1.0,
            seek: None,
            next_session: 0,
            awaiting_prepare: false,
            next_button_shown: false,
            stopped: false,
        }
    }

    pub fn backend(&self) -> Backend {
        self.transport.backend()
    }

    /// Live transport state
    pub fn state(&self) -> PlaybackState {
        self.transport.state()
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_awaiting_prepare(&self) -> bool {
        self.awaiting_prepare
    }

    /// Active seek session, if a seek key is held
    pub fn seek_session(&self) -> Option<SeekSession> {
        self.seek.as_ref().map(|active| active.session)
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn progress(&self) -> Progress {
        Progress::compute(
            self.transport.position(),
            self.transport.duration(),
            &self.settings.layout,
        )
    }

    /// Hand the transport back once the engine is done with it
    pub fn into_transport(self) -> Box<dyn Transport> {
        self.transport
    }

    /// Attach the transport to `url` and start listening on the bus.
    ///
    /// A rejected source is logged; the engine stays idle but still answers
    /// `Kill` so the UI can leave the player.
    #[instrument(skip(self, bus))]
    pub fn initialize(&mut self, url: &str, bus: &mut EventBus) {
        for kind in PLAYER_SIGNALS {
            bus.subscribe(kind, Subscriber::Player);
        }

        match self.transport.open(url) {
            Ok(()) => info!(backend = %self.backend(), "Source attached"),
            Err(e) => error!(error = %e, code = e.error_code(), "Source rejected"),
        }
    }

    /// Route a bus signal addressed to the player
    pub fn handle(&mut self, signal: &Signal, bus: &mut EventBus) {
        if self.stopped {
            debug!(kind = ?signal.kind(), "Engine stopped, signal ignored");
            return;
        }

        match signal {
            Signal::ChangeSpeed => self.change_speed(bus),
            Signal::FastForward => self.fast_forward(bus),
            Signal::Rewind => self.rewind(bus),
            Signal::StopFastForward => self.stop_fast_forward(bus),
            Signal::StopRewind => self.stop_rewind(bus),
            Signal::PlayPause => self.play_pause(bus),
            Signal::Kill => self.stop(bus),
            Signal::SeekTick { session } => self.seek_tick(*session, bus),
            Signal::Transport(event) => self.on_transport_event(event, bus),
            other => debug!(kind = ?other.kind(), "Signal not handled by player"),
        }
    }

    fn report(&self, operation: &str, e: Error) {
        match e.severity() {
            Severity::Warning => warn!(operation, error = %e, "Request ignored"),
            Severity::Error => error!(operation, error = %e, code = e.error_code(), "Transport call failed"),
        }
    }

    /// Start or resume playback.
    ///
    /// From Idle/None this prepares first; `play()` runs again once
    /// preparation completes.
    #[instrument(skip(self, bus))]
    pub fn play(&mut self, bus: &mut EventBus) {
        if let Err(e) = self.try_play(bus) {
            self.report("play", e);
        }
    }

    fn try_play(&mut self, bus: &mut EventBus) -> Result<()> {
        let state = self.transport.state();
        match state {
            PlaybackState::Idle | PlaybackState::None => {
                if self.awaiting_prepare {
                    debug!("Preparation already in progress");
                    return Ok(());
                }
                self.transport.prepare()?;
                self.awaiting_prepare = true;
                info!(state = %state, "Preparing");
                Ok(())
            }
            PlaybackState::Ready | PlaybackState::Paused => {
                self.transport.play()?;
                bus.publish(Signal::PauseUpdated { paused: false });
                info!(from = %state, "Playing");
                Ok(())
            }
            PlaybackState::Playing => Err(Error::InvalidState {
                operation: "play",
                state,
            }),
        }
    }

    #[instrument(skip(self, bus))]
    pub fn pause(&mut self, bus: &mut EventBus) {
        if let Err(e) = self.try_pause(bus) {
            self.report("pause", e);
        }
    }

    fn try_pause(&mut self, bus: &mut EventBus) -> Result<()> {
        let state = self.transport.state();
        let allowed = state == PlaybackState::Playing
            || (state == PlaybackState::Ready && self.transport.capabilities().pause_when_ready);
        if !allowed {
            return Err(Error::InvalidState {
                operation: "pause",
                state,
            });
        }

        self.transport.pause()?;
        bus.publish(Signal::PauseUpdated { paused: true });
        info!(from = %state, "Paused");
        Ok(())
    }

    pub fn play_pause(&mut self, bus: &mut EventBus) {
        if self.transport.state() == PlaybackState::Playing {
            self.pause(bus);
        } else {
            self.play(bus);
        }
    }

    /// Cycle to the next playback rate and announce it
    pub fn change_speed(&mut self, bus: &mut EventBus) {
        if let Err(e) = self.try_change_speed(bus) {
            self.report("change_speed", e);
        }
    }

    fn try_change_speed(&mut self, bus: &mut EventBus) -> Result<()> {
        let state = self.transport.state();
        if !state.is_started() {
            return Err(Error::InvalidState {
                operation: "change_speed",
                state,
            });
        }

        let speed = next_speed(self.speed);
        self.transport.set_speed(speed)?;
        self.speed = speed;
        bus.publish(Signal::SpeedUpdated { speed });
        info!(speed, "Playback speed changed");
        Ok(())
    }

    pub fn fast_forward(&mut self, bus: &mut EventBus) {
        self.start_seek(SeekDirection::Forward, bus);
    }

    pub fn rewind(&mut self, bus: &mut EventBus) {
        self.start_seek(SeekDirection::Backward, bus);
    }

    pub fn stop_fast_forward(&mut self, bus: &mut EventBus) {
        self.stop_seek(SeekDirection::Forward, bus);
    }

    pub fn stop_rewind(&mut self, bus: &mut EventBus) {
        self.stop_seek(SeekDirection::Backward, bus);
    }

    #[instrument(skip(self, bus))]
    fn start_seek(&mut self, direction: SeekDirection, bus: &mut EventBus) {
        if self.seek_session().map(|s| s.direction) == Some(direction) {
            return;
        }

        self.cancel_seek(bus);

        let session = SeekSession::new(self.next_session, direction, bus.now());
        self.next_session += 1;
        debug!(direction = %direction, session = session.id, "Seek started");

        self.seek_step(&session, bus.now());
        let timer = bus.schedule(
            self.settings.seek_tick,
            Signal::SeekTick {
                session: session.id,
            },
        );
        self.seek = Some(ActiveSeek { session, timer });
    }

    fn stop_seek(&mut self, direction: SeekDirection, bus: &mut EventBus) {
        if self.seek_session().map(|s| s.direction) == Some(direction) {
            self.cancel_seek(bus);
            debug!(direction = %direction, "Seek stopped");
        }
    }

    fn cancel_seek(&mut self, bus: &mut EventBus) {
        if let Some(active) = self.seek.take() {
            bus.cancel(active.timer);
        }
    }

    fn seek_tick(&mut self, session_id: u64, bus: &mut EventBus) {
        let Some(session) = self.seek_session().filter(|s| s.id == session_id) else {
            debug!(session = session_id, "Stale seek tick");
            return;
        };

        self.seek_step(&session, bus.now());
        let timer = bus.schedule(
            self.settings.seek_tick,
            Signal::SeekTick {
                session: session.id,
            },
        );
        self.seek = Some(ActiveSeek { session, timer });
    }

    /// One seek jump, sized by how long the key has been held
    fn seek_step(&mut self, session: &SeekSession, now: Duration) {
        let jump = self.settings.seek_table.jump_for(Some(session.held_for(now)));
        let position = self.transport.position();
        let target = seek_target(
            session.direction,
            position,
            jump,
            self.transport.duration(),
        );

        match self.transport.seek_to(target) {
            Ok(()) => info!(
                direction = %session.direction,
                jump_ms = jump.as_millis() as u64,
                target_ms = target.as_millis() as u64,
                "Seek step"
            ),
            Err(e) => self.report("seek", e),
        }
    }

    /// Tear the player down.
    ///
    /// The transport-level stop may be refused, but the cleanup after it
    /// always runs. Calling this again on a stopped engine does nothing.
    #[instrument(skip(self, bus))]
    pub fn stop(&mut self, bus: &mut EventBus) {
        if self.teardown(bus) {
            bus.publish(Signal::PlayerStopped);
            info!(backend = %self.backend(), "Player stopped");
        }
    }

    /// Same cleanup as `stop`, without announcing `PlayerStopped`.
    ///
    /// Used when another player takes over: the rest of the deck stays in
    /// the player context.
    pub fn stop_for_replacement(&mut self, bus: &mut EventBus) {
        if self.teardown(bus) {
            info!(backend = %self.backend(), "Player stopped for replacement");
        }
    }

    /// Returns false when the engine was already stopped
    fn teardown(&mut self, bus: &mut EventBus) -> bool {
        if self.stopped {
            debug!("Engine already stopped");
            return false;
        }

        let state = self.transport.state();
        if self.transport.capabilities().explicit_stop && !state.is_started() {
            warn!(state = %state, "Stop not allowed in current state");
        } else if let Err(e) = self.transport.stop() {
            self.report("stop", e);
        }

        self.speed = 1.0;
        self.awaiting_prepare = false;
        self.next_button_shown = false;
        self.cancel_seek(bus);
        bus.unsubscribe_all(Subscriber::Player);

        if let Err(e) = self.transport.release() {
            self.report("release", e);
        }
        if let Err(e) = self.transport.hide_surface() {
            self.report("hide_surface", e);
        }

        self.stopped = true;
        true
    }

    pub fn suspend(&mut self) {
        if let Err(e) = self.transport.suspend() {
            self.report("suspend", e);
        }
    }

    pub fn restore(&mut self) {
        if let Err(e) = self.transport.restore() {
            self.report("restore", e);
        }
    }

    /// Drain completions from the transport
    pub fn poll_transport(&mut self, now: Duration) -> Vec<TransportEvent> {
        self.transport.poll_events(now)
    }

    fn on_transport_event(&mut self, event: &TransportEvent, bus: &mut EventBus) {
        match event {
            TransportEvent::Prepared => self.on_prepared(bus),
            TransportEvent::PrepareFailed(reason) => {
                error!(reason = %reason, "Preparation failed");
                self.awaiting_prepare = false;
                self.stop(bus);
            }
            TransportEvent::MetadataLoaded => self.publish_progress(bus),
            TransportEvent::TimeUpdate => {
                self.publish_progress(bus);
                self.check_almost_finished(bus);
            }
            TransportEvent::BufferingStarted => debug!("Buffering"),
            TransportEvent::Ended => {
                info!("Playback ended");
                self.stop(bus);
            }
            TransportEvent::Error { message, fatal } => {
                error!(message = %message, fatal, "Transport reported an error");
                if *fatal {
                    self.stop(bus);
                }
            }
            TransportEvent::Released | TransportEvent::ReleaseFailed(_) => {
                debug!(event = ?event, "Release completion ignored by live engine")
            }
        }
    }

    fn on_prepared(&mut self, bus: &mut EventBus) {
        if !self.awaiting_prepare {
            debug!("Unsolicited preparation completion");
            return;
        }
        self.awaiting_prepare = false;

        if self.transport.duration().is_some() {
            self.publish_progress(bus);
        }

        let state = self.transport.state();
        if state.is_unprepared() {
            warn!(state = %state, "Transport still unprepared after preparation");
            return;
        }
        self.play(bus);
    }

    fn publish_progress(&self, bus: &mut EventBus) {
        bus.publish(Signal::ProgressUpdated(self.progress()));
    }

    fn check_almost_finished(&mut self, bus: &mut EventBus) {
        if self.next_button_shown || self.transport.duration().is_none() {
            return;
        }

        let progress = self.progress();
        if progress.percent() >= self.settings.almost_finished_percent {
            self.next_button_shown = true;
            debug!(percent = progress.percent(), "Content almost finished");
            bus.publish(Signal::ShowNextButton);
        }
    }
}

#[cfg(all(test, feature = "sim"))]
mod tests {
    use super::*;
    use crate::playback::sim::{SimCall, SimulatedFactory};
    use crate::playback::TransportFactory;

    fn engine(backend: Backend) -> (PlaybackEngine, SimulatedFactory, EventBus) {
        let factory = SimulatedFactory::new();
        let transport = factory.create(backend).unwrap();
        let mut bus = EventBus::new();
        let mut engine = PlaybackEngine::new(transport, EngineSettings::default());
        engine.initialize("https://media.example/clip.mp4", &mut bus);
        (engine, factory, bus)
    }

    /// Poll and deliver transport events until the bus settles
    fn pump(engine: &mut PlaybackEngine, bus: &mut EventBus, now: Duration) {
        bus.set_now(now);
        for event in engine.poll_transport(now) {
            bus.publish(Signal::Transport(event));
        }
        while let Some(signal) = bus.pop() {
            if bus.subscribers(signal.kind()).contains(&Subscriber::Player) {
                engine.handle(&signal, bus);
            }
        }
    }

    fn ready_engine(backend: Backend) -> (PlaybackEngine, SimulatedFactory, EventBus) {
        let (mut engine, factory, mut bus) = engine(backend);
        engine.play(&mut bus);
        pump(&mut engine, &mut bus, Duration::from_millis(100));
        (engine, factory, bus)
    }

    #[test]
    fn test_initialize_subscribes_player_signals() {
        let (_engine, _factory, bus) = engine(Backend::MediaElement);
        assert_eq!(bus.subscription_count(Subscriber::Player), PLAYER_SIGNALS.len());
    }

    #[test]
    fn test_native_play_prepares_then_plays() {
        let (mut engine, _factory, mut bus) = engine(Backend::Native);
        assert_eq!(engine.state(), PlaybackState::Idle);

        engine.play(&mut bus);
        assert!(engine.is_awaiting_prepare());
        assert_eq!(engine.state(), PlaybackState::Idle);

        pump(&mut engine, &mut bus, Duration::from_millis(100));
        assert!(!engine.is_awaiting_prepare());
        assert_eq!(engine.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_play_pause_play_resumes() {
        let (mut engine, _factory, mut bus) = ready_engine(Backend::MediaElement);
        assert_eq!(engine.state(), PlaybackState::Playing);
        bus.record(true);

        engine.pause(&mut bus);
        assert_eq!(engine.state(), PlaybackState::Paused);
        engine.play(&mut bus);
        assert_eq!(engine.state(), PlaybackState::Playing);

        assert_eq!(
            bus.take_recorded(),
            vec![
                Signal::PauseUpdated { paused: true },
                Signal::PauseUpdated { paused: false },
            ]
        );
    }

    #[test]
    fn test_pause_while_idle_is_ignored() {
        let (mut engine, factory, mut bus) = engine(Backend::Native);
        let calls = factory.native_calls().len();

        engine.pause(&mut bus);

        assert_eq!(factory.native_calls().len(), calls);
        assert_eq!(engine.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_change_speed_cycles_back_to_one() {
        let (mut engine, _factory, mut bus) = ready_engine(Backend::MediaElement);
        bus.record(true);

        for _ in 0..5 {
            engine.change_speed(&mut bus);
        }

        assert_eq!(engine.speed(), 1.0);
        let announced: Vec<f64> = bus
            .take_recorded()
            .into_iter()
            .filter_map(|s| match s {
                Signal::SpeedUpdated { speed } => Some(speed),
                _ => None,
            })
            .collect();
        assert_eq!(announced, vec![1.25, 1.5, 1.75, 2.0, 1.0]);
    }

    #[test]
    fn test_change_speed_requires_started_playback() {
        let (mut engine, _factory, mut bus) = engine(Backend::MediaElement);
        bus.record(true);

        engine.change_speed(&mut bus);

        assert_eq!(engine.speed(), 1.0);
        assert!(bus.take_recorded().is_empty());
    }

    #[test]
    fn test_seek_same_direction_is_reentrant_noop() {
        let (mut engine, _factory, mut bus) = ready_engine(Backend::MediaElement);

        engine.fast_forward(&mut bus);
        let first = engine.seek_session().unwrap();
        engine.fast_forward(&mut bus);

        assert_eq!(engine.seek_session(), Some(first));
        assert_eq!(bus.pending_timers(), 1);
    }

    #[test]
    fn test_opposite_direction_replaces_session() {
        let (mut engine, _factory, mut bus) = ready_engine(Backend::MediaElement);

        engine.fast_forward(&mut bus);
        engine.rewind(&mut bus);

        let session = engine.seek_session().unwrap();
        assert_eq!(session.direction, SeekDirection::Backward);
        assert_eq!(bus.pending_timers(), 1);

        // Stray key-up of the old direction leaves the new session alone
        engine.stop_fast_forward(&mut bus);
        assert!(engine.seek_session().is_some());

        engine.stop_rewind(&mut bus);
        assert!(engine.seek_session().is_none());
        assert_eq!(bus.pending_timers(), 0);
    }

    #[test]
    fn test_rewind_clamps_at_zero() {
        let (mut engine, _factory, mut bus) = ready_engine(Backend::MediaElement);

        engine.rewind(&mut bus);

        assert_eq!(engine.transport().position(), Duration::ZERO);
    }

    #[test]
    fn test_stop_twice_has_no_second_effect() {
        let (mut engine, factory, mut bus) = ready_engine(Backend::Native);
        bus.record(true);

        engine.stop(&mut bus);
        let calls = factory.native_calls().len();
        engine.stop(&mut bus);

        assert!(engine.is_stopped());
        assert_eq!(factory.native_calls().len(), calls);
        let stopped = bus
            .take_recorded()
            .into_iter()
            .filter(|s| *s == Signal::PlayerStopped)
            .count();
        assert_eq!(stopped, 1);
        assert_eq!(bus.subscription_count(Subscriber::Player), 0);
    }

    #[test]
    fn test_native_stop_refused_before_start_still_cleans_up() {
        let (mut engine, factory, mut bus) = engine(Backend::Native);
        engine.fast_forward(&mut bus);
        bus.record(true);

        engine.stop(&mut bus);

        assert!(!factory.native_calls().contains(&SimCall::Stop));
        assert!(factory.native_calls().contains(&SimCall::Close));
        assert!(engine.seek_session().is_none());
        assert_eq!(bus.pending_timers(), 0);
        assert_eq!(bus.take_recorded(), vec![Signal::PlayerStopped]);
    }

    #[test]
    fn test_stop_for_replacement_is_silent() {
        let (mut engine, factory, mut bus) = ready_engine(Backend::Native);
        engine.fast_forward(&mut bus);
        bus.record(true);

        engine.stop_for_replacement(&mut bus);

        assert!(engine.is_stopped());
        assert!(factory.native_calls().contains(&SimCall::Stop));
        assert_eq!(bus.pending_timers(), 0);
        assert_eq!(bus.subscription_count(Subscriber::Player), 0);
        assert!(bus.take_recorded().is_empty());
    }

    #[test]
    fn test_ended_stops_engine() {
        let (mut engine, factory, mut bus) = ready_engine(Backend::MediaElement);
        factory.set_media_duration(Duration::from_secs(2));

        pump(&mut engine, &mut bus, Duration::from_secs(5));

        assert!(engine.is_stopped());
    }
}
