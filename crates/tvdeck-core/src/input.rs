//! Remote key dispatch
//!
//! Maps raw key codes to bus signals. While browsing, arrows move across
//! the card grid. While a player is up, every key first wakes the overlay,
//! and the arrows act on whichever part of the overlay holds focus.

use crate::bus::EventBus;
use crate::focus::FocusTarget;
use crate::signal::{Signal, SignalKind, Subscriber};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Keys the remote sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteKey {
    Back,
    Down,
    Enter,
    FastForward,
    Left,
    Return,
    Rewind,
    Right,
    Up,
}

impl RemoteKey {
    pub const ALL: [RemoteKey; 9] = [
        RemoteKey::Back,
        RemoteKey::Down,
        RemoteKey::Enter,
        RemoteKey::FastForward,
        RemoteKey::Left,
        RemoteKey::Return,
        RemoteKey::Rewind,
        RemoteKey::Right,
        RemoteKey::Up,
    ];

    /// Platform key code
    pub fn code(self) -> u32 {
        match self {
            RemoteKey::Back => 8,
            RemoteKey::Down => 40,
            RemoteKey::Enter => 13,
            RemoteKey::FastForward => 417,
            RemoteKey::Left => 37,
            RemoteKey::Return => 10009,
            RemoteKey::Rewind => 412,
            RemoteKey::Right => 39,
            RemoteKey::Up => 38,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.code() == code)
    }
}

impl fmt::Display for RemoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemoteKey::Back => "back",
            RemoteKey::Down => "down",
            RemoteKey::Enter => "enter",
            RemoteKey::FastForward => "ff",
            RemoteKey::Left => "left",
            RemoteKey::Return => "return",
            RemoteKey::Rewind => "rw",
            RemoteKey::Right => "right",
            RemoteKey::Up => "up",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for RemoteKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "back" => Ok(RemoteKey::Back),
            "down" => Ok(RemoteKey::Down),
            "enter" | "ok" => Ok(RemoteKey::Enter),
            "ff" | "fast_forward" | "fastforward" => Ok(RemoteKey::FastForward),
            "left" => Ok(RemoteKey::Left),
            "return" => Ok(RemoteKey::Return),
            "rw" | "rewind" => Ok(RemoteKey::Rewind),
            "right" => Ok(RemoteKey::Right),
            "up" => Ok(RemoteKey::Up),
            other => Err(Error::InvalidConfig(format!("unknown key: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPhase {
    Down,
    Up,
}

/// A raw key transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub code: u32,
    pub phase: KeyPhase,
}

impl KeyEvent {
    pub fn down(key: RemoteKey) -> Self {
        Self {
            code: key.code(),
            phase: KeyPhase::Down,
        }
    }

    pub fn up(key: RemoteKey) -> Self {
        Self {
            code: key.code(),
            phase: KeyPhase::Up,
        }
    }

    pub fn key(&self) -> Option<RemoteKey> {
        RemoteKey::from_code(self.code)
    }
}

/// Which part of the overlay receives the arrows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayArea {
    ActionRow,
    Bar,
    FloatingButtons,
}

/// Top-level input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "area")]
pub enum InputContext {
    Browsing,
    Player(OverlayArea),
}

const INPUT_SIGNALS: [SignalKind; 4] = [
    SignalKind::Key,
    SignalKind::CreatePlayer,
    SignalKind::PlayerStopped,
    SignalKind::FocusChanged,
];

#[derive(Debug)]
pub struct InputDispatcher {
    player_active: bool,
    area: OverlayArea,
    focused_card: usize,
}

impl Default for InputDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl InputDispatcher {
    pub fn new() -> Self {
        Self {
            player_active: false,
            area: OverlayArea::ActionRow,
            focused_card: 0,
        }
    }

    pub fn subscribe(bus: &mut EventBus) {
        for kind in INPUT_SIGNALS {
            bus.subscribe(kind, Subscriber::Input);
        }
    }

    pub fn context(&self) -> InputContext {
        if self.player_active {
            InputContext::Player(self.area)
        } else {
            InputContext::Browsing
        }
    }

    pub fn handle(&mut self, signal: &Signal, bus: &mut EventBus) {
        match signal {
            Signal::Key(event) => self.on_key(*event, bus),
            Signal::CreatePlayer { .. } => {
                self.player_active = true;
                self.area = OverlayArea::ActionRow;
            }
            Signal::PlayerStopped => self.player_active = false,
            Signal::FocusChanged { current, .. } => match current {
                FocusTarget::Card(index) => self.focused_card = *index,
                FocusTarget::Control(_) => self.area = OverlayArea::ActionRow,
                FocusTarget::ProgressBar => self.area = OverlayArea::Bar,
                FocusTarget::Floating(_) => self.area = OverlayArea::FloatingButtons,
            },
            _ => {}
        }
    }

    fn on_key(&mut self, event: KeyEvent, bus: &mut EventBus) {
        let Some(key) = event.key() else {
            if event.phase == KeyPhase::Down {
                warn!(code = event.code, "Unhandled key");
            }
            return;
        };

        match event.phase {
            KeyPhase::Down => self.key_down(key, bus),
            KeyPhase::Up => self.key_up(key, bus),
        }
    }

    fn key_down(&mut self, key: RemoteKey, bus: &mut EventBus) {
        debug!(key = %key, context = ?self.context(), "Key down");

        if !self.player_active {
            let signal = match key {
                RemoteKey::Right => Signal::FocusNextCard,
                RemoteKey::Left => Signal::FocusPreviousCard,
                RemoteKey::Down => Signal::FocusNextLineCard,
                RemoteKey::Up => Signal::FocusPreviousLineCard,
                RemoteKey::Enter => Signal::PlayIndex(self.focused_card),
                RemoteKey::Back
                | RemoteKey::Return
                | RemoteKey::FastForward
                | RemoteKey::Rewind => return,
            };
            bus.publish(signal);
            return;
        }

        bus.publish(Signal::ShowOverlay);

        let signal = match (key, self.area) {
            (RemoteKey::Right, _) => Signal::FocusNextButton,
            (RemoteKey::Left, _) => Signal::FocusPreviousButton,

            (RemoteKey::Up, OverlayArea::ActionRow) => Signal::FocusFloatingButtons,
            (RemoteKey::Up, OverlayArea::Bar) => Signal::FocusButtons(None),
            (RemoteKey::Up, OverlayArea::FloatingButtons) => return,

            (RemoteKey::Down, OverlayArea::ActionRow) => Signal::FocusBar,
            (RemoteKey::Down, OverlayArea::FloatingButtons) => Signal::FocusButtons(None),
            (RemoteKey::Down, OverlayArea::Bar) => return,

            (RemoteKey::Enter, OverlayArea::ActionRow) => Signal::ToggleButton,
            (RemoteKey::Enter, OverlayArea::FloatingButtons) => Signal::ToggleFloatingButton,
            (RemoteKey::Enter, OverlayArea::Bar) => return,

            (RemoteKey::Back | RemoteKey::Return, _) => Signal::Kill,
            (RemoteKey::FastForward, _) => Signal::FastForward,
            (RemoteKey::Rewind, _) => Signal::Rewind,
        };
        bus.publish(signal);
    }

    fn key_up(&mut self, key: RemoteKey, bus: &mut EventBus) {
        if !self.player_active {
            return;
        }

        match key {
            RemoteKey::FastForward | RemoteKey::Right => bus.publish(Signal::StopFastForward),
            RemoteKey::Rewind | RemoteKey::Left => bus.publish(Signal::StopRewind),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::focus::ControlId;

    fn dispatch(input: &mut InputDispatcher, signal: Signal) -> Vec<Signal> {
        let mut bus = EventBus::new();
        input.handle(&signal, &mut bus);
        std::iter::from_fn(|| bus.pop()).collect()
    }

    fn active() -> InputDispatcher {
        let mut input = InputDispatcher::new();
        dispatch(
            &mut input,
            Signal::CreatePlayer {
                url: "https://media.example/a.mp4".into(),
                title: "Avatar".into(),
            },
        );
        input
    }

    #[test]
    fn test_key_codes_round_trip() {
        for key in RemoteKey::ALL {
            assert_eq!(RemoteKey::from_code(key.code()), Some(key));
        }
        assert_eq!(RemoteKey::from_code(10009), Some(RemoteKey::Return));
        assert_eq!(RemoteKey::from_code(999), None);
    }

    #[test]
    fn test_browsing_arrows_move_cards() {
        let mut input = InputDispatcher::new();
        assert_eq!(
            dispatch(&mut input, Signal::Key(KeyEvent::down(RemoteKey::Down))),
            vec![Signal::FocusNextLineCard]
        );
        assert_eq!(
            dispatch(&mut input, Signal::Key(KeyEvent::down(RemoteKey::Left))),
            vec![Signal::FocusPreviousCard]
        );
        assert!(dispatch(&mut input, Signal::Key(KeyEvent::down(RemoteKey::Back))).is_empty());
    }

    #[test]
    fn test_enter_plays_focused_card() {
        let mut input = InputDispatcher::new();
        dispatch(
            &mut input,
            Signal::FocusChanged {
                previous: Some(FocusTarget::Card(0)),
                current: FocusTarget::Card(7),
            },
        );

        assert_eq!(
            dispatch(&mut input, Signal::Key(KeyEvent::down(RemoteKey::Enter))),
            vec![Signal::PlayIndex(7)]
        );
    }

    #[test]
    fn test_player_keys_wake_overlay_first() {
        let mut input = active();
        assert_eq!(
            dispatch(&mut input, Signal::Key(KeyEvent::down(RemoteKey::Enter))),
            vec![Signal::ShowOverlay, Signal::ToggleButton]
        );
        assert_eq!(
            dispatch(&mut input, Signal::Key(KeyEvent::down(RemoteKey::Return))),
            vec![Signal::ShowOverlay, Signal::Kill]
        );
    }

    #[test]
    fn test_vertical_moves_follow_overlay_area() {
        let mut input = active();
        assert_eq!(
            dispatch(&mut input, Signal::Key(KeyEvent::down(RemoteKey::Down))),
            vec![Signal::ShowOverlay, Signal::FocusBar]
        );

        dispatch(
            &mut input,
            Signal::FocusChanged {
                previous: Some(FocusTarget::Control(ControlId::Pause)),
                current: FocusTarget::ProgressBar,
            },
        );
        assert_eq!(input.context(), InputContext::Player(OverlayArea::Bar));
        assert_eq!(
            dispatch(&mut input, Signal::Key(KeyEvent::down(RemoteKey::Down))),
            vec![Signal::ShowOverlay]
        );
        assert_eq!(
            dispatch(&mut input, Signal::Key(KeyEvent::down(RemoteKey::Up))),
            vec![Signal::ShowOverlay, Signal::FocusButtons(None)]
        );
        assert_eq!(
            dispatch(&mut input, Signal::Key(KeyEvent::down(RemoteKey::Enter))),
            vec![Signal::ShowOverlay]
        );
    }

    #[test]
    fn test_key_up_stops_seek_only_while_active() {
        let mut input = InputDispatcher::new();
        assert!(dispatch(&mut input, Signal::Key(KeyEvent::up(RemoteKey::Right))).is_empty());

        let mut input = active();
        assert_eq!(
            dispatch(&mut input, Signal::Key(KeyEvent::up(RemoteKey::Right))),
            vec![Signal::StopFastForward]
        );
        assert_eq!(
            dispatch(&mut input, Signal::Key(KeyEvent::up(RemoteKey::Rewind))),
            vec![Signal::StopRewind]
        );
        assert!(dispatch(&mut input, Signal::Key(KeyEvent::up(RemoteKey::Enter))).is_empty());
    }

    #[test]
    fn test_player_stopped_returns_to_browsing() {
        let mut input = active();
        dispatch(&mut input, Signal::PlayerStopped);
        assert_eq!(input.context(), InputContext::Browsing);
    }
}
