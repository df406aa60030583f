//! Content sequencing
//!
//! Turns "play card N", "next" and "previous" into player requests. Moving
//! on from a live player tears it down first and starts the new title after
//! a short delay, so the old transport has let go before a new one attaches.

use crate::bus::EventBus;
use crate::catalog::CatalogEntry;
use crate::signal::{Signal, SignalKind, Subscriber};
use std::time::Duration;
use tracing::{info, instrument, warn};

const SEQUENCER_SIGNALS: [SignalKind; 4] = [
    SignalKind::PlayIndex,
    SignalKind::PlayNext,
    SignalKind::PlayPrevious,
    SignalKind::PlayerStopped,
];

#[derive(Debug)]
pub struct ContentSequencer {
    entries: Vec<CatalogEntry>,
    fallback_url: String,
    advance_delay: Duration,
    playing: Option<usize>,
}

impl ContentSequencer {
    pub fn new(fallback_url: impl Into<String>, advance_delay: Duration) -> Self {
        Self {
            entries: Vec::new(),
            fallback_url: fallback_url.into(),
            advance_delay,
            playing: None,
        }
    }

    pub fn subscribe(bus: &mut EventBus) {
        for kind in SEQUENCER_SIGNALS {
            bus.subscribe(kind, Subscriber::Sequencer);
        }
    }

    pub fn set_catalog(&mut self, entries: Vec<CatalogEntry>) {
        self.entries = entries;
        self.playing = None;
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Index of the title on screen, if any
    pub fn playing(&self) -> Option<usize> {
        self.playing
    }

    pub fn handle(&mut self, signal: &Signal, bus: &mut EventBus) {
        match signal {
            Signal::PlayIndex(index) => self.play_index(*index, bus),
            Signal::PlayNext => self.advance(1, bus),
            Signal::PlayPrevious => self.advance(-1, bus),
            Signal::PlayerStopped => self.playing = None,
            _ => {}
        }
    }

    #[instrument(skip(self, bus))]
    fn play_index(&mut self, index: usize, bus: &mut EventBus) {
        if index >= self.entries.len() {
            warn!(size = self.entries.len(), "No title at index");
            return;
        }

        if let Some(current) = self.playing {
            info!(current, "Player live, switching titles");
            self.kill_then_play(index, bus);
            return;
        }

        let entry = &self.entries[index];
        let url = entry
            .playable_source()
            .unwrap_or(self.fallback_url.as_str())
            .to_string();
        let title = entry.display_name.clone();
        info!(title = %title, url = %url, "Starting title");

        self.playing = Some(index);
        bus.publish(Signal::CreatePlayer { url, title });
        bus.publish(Signal::ShowPreviousButton);
    }

    fn advance(&mut self, step: isize, bus: &mut EventBus) {
        let Some(current) = self.playing else {
            warn!(step, "Nothing playing to move on from");
            return;
        };

        let target = match current.checked_add_signed(step) {
            Some(target) if target < self.entries.len() => target,
            _ => {
                info!(current, step, "Already at the end of the catalog");
                return;
            }
        };

        self.kill_then_play(target, bus);
    }

    fn kill_then_play(&mut self, index: usize, bus: &mut EventBus) {
        self.playing = None;
        bus.publish(Signal::Kill);
        bus.schedule(self.advance_delay, Signal::PlayIndex(index));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequencer() -> ContentSequencer {
        let mut sequencer =
            ContentSequencer::new("https://media.example/fallback.mpd", Duration::from_millis(100));
        sequencer.set_catalog(vec![
            CatalogEntry::placeholder("Avatar"),
            CatalogEntry::file("Heat (1995)", "file:///media/heat.mkv"),
            CatalogEntry::placeholder("Brave"),
        ]);
        sequencer
    }

    fn drain(bus: &mut EventBus) -> Vec<Signal> {
        std::iter::from_fn(|| bus.pop()).collect()
    }

    #[test]
    fn test_play_index_resolves_source() {
        let mut sequencer = sequencer();
        let mut bus = EventBus::new();

        sequencer.handle(&Signal::PlayIndex(1), &mut bus);

        assert_eq!(sequencer.playing(), Some(1));
        assert_eq!(
            drain(&mut bus),
            vec![
                Signal::CreatePlayer {
                    url: "file:///media/heat.mkv".into(),
                    title: "Heat (1995)".into(),
                },
                Signal::ShowPreviousButton,
            ]
        );
    }

    #[test]
    fn test_placeholder_uses_fallback() {
        let mut sequencer = sequencer();
        let mut bus = EventBus::new();

        sequencer.handle(&Signal::PlayIndex(0), &mut bus);

        assert!(matches!(
            bus.pop(),
            Some(Signal::CreatePlayer { url, .. }) if url == "https://media.example/fallback.mpd"
        ));
    }

    #[test]
    fn test_out_of_range_index_is_ignored() {
        let mut sequencer = sequencer();
        let mut bus = EventBus::new();

        sequencer.handle(&Signal::PlayIndex(3), &mut bus);

        assert_eq!(sequencer.playing(), None);
        assert_eq!(bus.queued(), 0);
    }

    #[test]
    fn test_next_kills_then_schedules() {
        let mut sequencer = sequencer();
        let mut bus = EventBus::new();
        sequencer.handle(&Signal::PlayIndex(0), &mut bus);
        drain(&mut bus);

        sequencer.handle(&Signal::PlayNext, &mut bus);

        assert_eq!(drain(&mut bus), vec![Signal::Kill]);
        assert_eq!(bus.next_deadline(), Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_moves_stop_at_the_ends() {
        let mut sequencer = sequencer();
        let mut bus = EventBus::new();

        sequencer.handle(&Signal::PlayNext, &mut bus);
        assert_eq!(bus.queued(), 0);

        sequencer.handle(&Signal::PlayIndex(0), &mut bus);
        drain(&mut bus);
        sequencer.handle(&Signal::PlayPrevious, &mut bus);
        assert_eq!(bus.queued(), 0);
        assert_eq!(bus.pending_timers(), 0);
    }

    #[test]
    fn test_player_stopped_clears_playing() {
        let mut sequencer = sequencer();
        let mut bus = EventBus::new();
        sequencer.handle(&Signal::PlayIndex(2), &mut bus);

        sequencer.handle(&Signal::PlayerStopped, &mut bus);

        assert_eq!(sequencer.playing(), None);
    }
}
