//! Real-time driver
//!
//! Maps wall-clock time onto the deck's virtual clock. Remote input arrives
//! over a channel and is handled as soon as it is received; between inputs
//! the deck is advanced one frame at a time.
//!
//! The deck is single-threaded, so [`drive`] must be awaited on the task
//! that owns it rather than spawned.

use crate::deck::Deck;
use crate::input::KeyEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Input fed to a running deck
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteInput {
    Key(KeyEvent),
    Visibility { hidden: bool },
    Shutdown,
}

/// Run `deck` until `Shutdown` arrives or every sender is dropped
pub async fn drive(deck: &mut Deck, mut rx: mpsc::Receiver<RemoteInput>, frame: Duration) {
    let mut ticker = time::interval(frame);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();

    info!(frame_ms = frame.as_millis() as u64, "Driver started");

    loop {
        tokio::select! {
            input = rx.recv() => {
                let now = Instant::now();
                deck.advance(now - last);
                last = now;

                match input {
                    Some(RemoteInput::Key(event)) => deck.key(event),
                    Some(RemoteInput::Visibility { hidden }) => deck.set_app_hidden(hidden),
                    Some(RemoteInput::Shutdown) | None => {
                        debug!("Input closed");
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                let now = Instant::now();
                deck.advance(now - last);
                last = now;
            }
        }
    }

    info!(elapsed_ms = deck.now().as_millis() as u64, "Driver stopped");
}

#[cfg(all(test, feature = "sim"))]
mod tests {
    use super::*;
    use crate::catalog::MockCatalog;
    use crate::config::DeckConfig;
    use crate::focus::FocusTarget;
    use crate::input::RemoteKey;
    use crate::playback::sim::SimulatedFactory;

    fn deck() -> Deck {
        let mut deck =
            Deck::new(DeckConfig::default(), Box::new(SimulatedFactory::new())).unwrap();
        deck.load_catalog(MockCatalog::entries());
        deck
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_handles_keys_and_time() {
        let mut deck = deck();
        let (tx, rx) = mpsc::channel(8);

        tx.send(RemoteInput::Key(KeyEvent::down(RemoteKey::Right)))
            .await
            .unwrap();
        tx.send(RemoteInput::Key(KeyEvent::up(RemoteKey::Right)))
            .await
            .unwrap();
        tx.send(RemoteInput::Shutdown).await.unwrap();

        drive(&mut deck, rx, Duration::from_millis(16)).await;

        assert_eq!(deck.focus(), Some(FocusTarget::Card(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_advances_clock_between_inputs() {
        let mut deck = deck();
        let (tx, rx) = mpsc::channel(8);

        let sender = async move {
            time::sleep(Duration::from_millis(500)).await;
            tx.send(RemoteInput::Shutdown).await.unwrap();
        };

        tokio::join!(drive(&mut deck, rx, Duration::from_millis(16)), sender);

        assert!(deck.now() >= Duration::from_millis(500));
    }
}
