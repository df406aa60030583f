//! Owner of the live player
//!
//! Builds an engine on `CreatePlayer`, forwards player-addressed signals to
//! it, and drops it once it has stopped. Transports whose release finishes
//! later are kept until they report back.

use super::engine::{EngineSettings, PlaybackEngine};
use super::transport::{Transport, TransportEvent, TransportFactory};
use super::Backend;
use crate::bus::EventBus;
use crate::signal::{Signal, SignalKind, Subscriber};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Signals the host itself listens to
const HOST_SIGNALS: [SignalKind; 2] =
    [SignalKind::CreatePlayer, SignalKind::AppVisibility];

pub struct PlayerHost {
    backend: Backend,
    factory: Box<dyn TransportFactory>,
    settings: EngineSettings,
    engine: Option<PlaybackEngine>,
    retiring: Vec<Box<dyn Transport>>,
}

impl PlayerHost {
    pub fn new(
        backend: Backend,
        factory: Box<dyn TransportFactory>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            backend,
            factory,
            settings,
            engine: None,
            retiring: Vec::new(),
        }
    }

    pub fn subscribe(bus: &mut EventBus) {
        for kind in HOST_SIGNALS {
            bus.subscribe(kind, Subscriber::PlayerHost);
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// The live engine, if a player is up
    pub fn engine(&self) -> Option<&PlaybackEngine> {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> Option<&mut PlaybackEngine> {
        self.engine.as_mut()
    }

    /// Transports still waiting for their release to complete
    pub fn retiring(&self) -> usize {
        self.retiring.len()
    }

    /// Handle a signal addressed to the host
    pub fn handle(&mut self, signal: &Signal, bus: &mut EventBus) {
        match signal {
            Signal::CreatePlayer { url, title } => self.create_player(url, title, bus),
            Signal::AppVisibility { hidden } => self.app_visibility(*hidden),
            other => debug!(kind = ?other.kind(), "Signal not handled by host"),
        }
    }

    /// Handle a signal addressed to the live engine
    pub fn handle_player(&mut self, signal: &Signal, bus: &mut EventBus) {
        if let Some(engine) = self.engine.as_mut() {
            engine.handle(signal, bus);
        }
        self.retire_if_stopped();
    }

    #[instrument(skip(self, bus))]
    fn create_player(&mut self, url: &str, title: &str, bus: &mut EventBus) {
        if let Some(engine) = self.engine.as_mut() {
            info!("Replacing live player");
            engine.stop_for_replacement(bus);
        }
        self.retire_if_stopped();

        let mut transport = match self.factory.create(self.backend) {
            Ok(transport) => transport,
            Err(e) => {
                error!(error = %e, code = e.error_code(), backend = %self.backend, "Cannot build transport");
                bus.publish(Signal::PlayerStopped);
                return;
            }
        };

        if let Err(e) = transport.show_surface() {
            error!(error = %e, code = e.error_code(), "Playback surface not found");
            bus.publish(Signal::PlayerStopped);
            return;
        }

        let mut engine = PlaybackEngine::new(transport, self.settings.clone());
        engine.initialize(url, bus);
        engine.play(bus);
        info!(backend = %self.backend, title, "Player created");
        self.engine = Some(engine);
    }

    fn app_visibility(&mut self, hidden: bool) {
        let Some(engine) = self.engine.as_mut() else {
            debug!(hidden, "No player to suspend or restore");
            return;
        };

        if hidden {
            engine.suspend();
        } else {
            engine.restore();
        }
    }

    fn retire_if_stopped(&mut self) {
        if !self.engine.as_ref().is_some_and(|e| e.is_stopped()) {
            return;
        }
        let Some(engine) = self.engine.take() else {
            return;
        };

        let transport = engine.into_transport();
        if transport.capabilities().async_release {
            self.retiring.push(transport);
        }
    }

    /// Collect completions from the live transport and from retiring ones
    pub fn poll(&mut self, now: Duration, bus: &mut EventBus) {
        if let Some(engine) = self.engine.as_mut() {
            for event in engine.poll_transport(now) {
                bus.publish(Signal::Transport(event));
            }
        }

        self.retiring.retain_mut(|transport| {
            let mut done = false;
            for event in transport.poll_events(now) {
                match event {
                    TransportEvent::Released => {
                        info!(backend = %transport.backend(), "Player released");
                        done = true;
                    }
                    TransportEvent::ReleaseFailed(reason) => {
                        error!(backend = %transport.backend(), reason = %reason, "Player release failed");
                        done = true;
                    }
                    other => debug!(event = ?other, "Event from retiring transport dropped"),
                }
            }
            !done
        });
    }
}
