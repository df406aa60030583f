//! Deck - composition root
//!
//! Owns the bus and every component, routes queued signals to their
//! subscribers and moves the virtual clock forward. Nothing here runs on
//! its own: the embedder feeds keys and time in through [`Deck::key`] and
//! [`Deck::advance`].

use crate::bus::EventBus;
use crate::catalog::CatalogEntry;
use crate::config::DeckConfig;
use crate::focus::{FocusNavigator, FocusTarget};
use crate::input::{InputContext, InputDispatcher, KeyEvent, RemoteKey};
use crate::overlay::{OverlayController, OverlayView};
use crate::playback::{PlaybackState, PlayerHost, TransportFactory};
use crate::sequencer::ContentSequencer;
use crate::signal::{Signal, Subscriber};
use crate::Result;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info, trace};

/// Upper bound on signals delivered in one drain
const MAX_DRAIN: usize = 10_000;

/// Serializable picture of the deck at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckSnapshot {
    pub now_ms: u64,
    pub context: InputContext,
    pub focus: Option<FocusTarget>,
    pub scroll_offset: f64,
    pub playing_index: Option<usize>,
    pub player_state: Option<PlaybackState>,
    pub speed: Option<f64>,
    pub overlay: OverlayView,
}

pub struct Deck {
    config: DeckConfig,
    bus: EventBus,
    input: InputDispatcher,
    sequencer: ContentSequencer,
    host: PlayerHost,
    focus: FocusNavigator,
    overlay: OverlayController,
}

impl Deck {
    /// Build a deck from a validated configuration
    pub fn new(config: DeckConfig, factory: Box<dyn TransportFactory>) -> Result<Self> {
        config.validate()?;

        let mut bus = EventBus::new();
        InputDispatcher::subscribe(&mut bus);
        ContentSequencer::subscribe(&mut bus);
        PlayerHost::subscribe(&mut bus);
        FocusNavigator::subscribe(&mut bus);
        OverlayController::subscribe(&mut bus);

        let host = PlayerHost::new(config.backend, factory, config.engine_settings()?);
        let sequencer = ContentSequencer::new(
            config.playback.fallback_url.clone(),
            config.playback.advance_delay(),
        );
        let focus = FocusNavigator::new(config.grid.clone(), &config.scroll);
        let overlay = OverlayController::new(config.overlay.clone());

        info!(backend = %config.backend, "Deck ready");

        Ok(Self {
            config,
            bus,
            input: InputDispatcher::new(),
            sequencer,
            host,
            focus,
            overlay,
        })
    }

    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    /// Hand the catalog to the deck and focus its first card
    pub fn load_catalog(&mut self, entries: Vec<CatalogEntry>) {
        let size = entries.len();
        self.sequencer.set_catalog(entries);
        self.publish(Signal::CatalogReady { size });
    }

    pub fn key(&mut self, event: KeyEvent) {
        self.publish(Signal::Key(event));
    }

    pub fn key_down(&mut self, key: RemoteKey) {
        self.key(KeyEvent::down(key));
    }

    pub fn key_up(&mut self, key: RemoteKey) {
        self.key(KeyEvent::up(key));
    }

    /// Key down immediately followed by key up
    pub fn press(&mut self, key: RemoteKey) {
        self.key_down(key);
        self.key_up(key);
    }

    /// The platform hid or showed the application
    pub fn set_app_hidden(&mut self, hidden: bool) {
        self.publish(Signal::AppVisibility { hidden });
    }

    /// Publish a signal and deliver everything it sets off
    pub fn publish(&mut self, signal: Signal) {
        self.bus.publish(signal);
        self.run_until_idle();
    }

    /// Move the clock forward by `by`, firing timers in deadline order
    pub fn advance(&mut self, by: Duration) {
        let target = self.bus.now() + by;
        self.run_until_idle();

        while self.bus.fire_next_due(target) {
            let now = self.bus.now();
            self.host.poll(now, &mut self.bus);
            self.run_until_idle();
        }

        self.bus.set_now(target);
        self.host.poll(target, &mut self.bus);
        self.run_until_idle();
    }

    /// Deliver queued signals until the queue is empty
    pub fn run_until_idle(&mut self) {
        let mut delivered = 0usize;

        while let Some(signal) = self.bus.pop() {
            delivered += 1;
            if delivered > MAX_DRAIN {
                error!(limit = MAX_DRAIN, kind = ?signal.kind(), "Signal cascade did not settle, queue dropped");
                self.bus.clear_queue();
                return;
            }
            self.dispatch(&signal);
        }

        if delivered > 0 {
            trace!(delivered, "Queue drained");
        }
    }

    fn dispatch(&mut self, signal: &Signal) {
        let subscribers = self.bus.subscribers(signal.kind());
        if subscribers.is_empty() {
            debug!(kind = ?signal.kind(), "No subscriber");
            return;
        }

        for subscriber in subscribers {
            let bus = &mut self.bus;
            match subscriber {
                Subscriber::Input => self.input.handle(signal, bus),
                Subscriber::Sequencer => self.sequencer.handle(signal, bus),
                Subscriber::PlayerHost => self.host.handle(signal, bus),
                Subscriber::Player => self.host.handle_player(signal, bus),
                Subscriber::Focus => self.focus.handle(signal, bus),
                Subscriber::Overlay => self.overlay.handle(signal, bus),
            }
        }
    }

    pub fn now(&self) -> Duration {
        self.bus.now()
    }

    pub fn focus(&self) -> Option<FocusTarget> {
        self.focus.current()
    }

    pub fn context(&self) -> InputContext {
        self.input.context()
    }

    pub fn navigator(&self) -> &FocusNavigator {
        &self.focus
    }

    pub fn overlay(&self) -> &OverlayController {
        &self.overlay
    }

    pub fn host(&self) -> &PlayerHost {
        &self.host
    }

    pub fn sequencer(&self) -> &ContentSequencer {
        &self.sequencer
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Start or stop keeping a copy of every published signal
    pub fn record_signals(&mut self, enabled: bool) {
        self.bus.record(enabled);
    }

    pub fn take_signals(&mut self) -> Vec<Signal> {
        self.bus.take_recorded()
    }

    pub fn snapshot(&self) -> DeckSnapshot {
        let engine = self.host.engine();
        DeckSnapshot {
            now_ms: self.bus.now().as_millis() as u64,
            context: self.input.context(),
            focus: self.focus.current(),
            scroll_offset: self.focus.scroll_offset(),
            playing_index: self.sequencer.playing(),
            player_state: engine.map(|e| e.state()),
            speed: engine.map(|e| e.speed()),
            overlay: self.overlay.view(),
        }
    }
}
