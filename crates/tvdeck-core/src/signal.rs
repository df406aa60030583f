//! Signals carried by the event bus

use crate::focus::{ControlId, FloatingButton, FocusTarget};
use crate::input::KeyEvent;
use crate::playback::{Progress, TransportEvent};

/// Everything that travels over the bus
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    // Platform boundary
    Key(KeyEvent),
    AppVisibility { hidden: bool },
    CatalogReady { size: usize },

    // Sequencing
    PlayIndex(usize),
    PlayNext,
    PlayPrevious,

    // Player control
    CreatePlayer { url: String, title: String },
    ChangeSpeed,
    FastForward,
    Rewind,
    StopFastForward,
    StopRewind,
    PlayPause,
    Kill,
    SeekTick { session: u64 },
    Transport(TransportEvent),

    // Player output
    PlayerStopped,
    SpeedUpdated { speed: f64 },
    /// The transport accepted a play (`false`) or pause (`true`) request
    PauseUpdated { paused: bool },
    ProgressUpdated(Progress),

    // Focus
    FocusElement(FocusTarget),
    FocusNextCard,
    FocusPreviousCard,
    FocusNextLineCard,
    FocusPreviousLineCard,
    FocusNextButton,
    FocusPreviousButton,
    FocusBar,
    /// Back to the action row; `None` means the last remembered control
    FocusButtons(Option<ControlId>),
    FocusFloatingButtons,
    FocusChanged {
        previous: Option<FocusTarget>,
        current: FocusTarget,
    },
    ScrollFrame,

    // Overlay
    ShowOverlay,
    ToggleButton,
    ToggleFloatingButton,
    ShowNextButton,
    ShowPreviousButton,
    OverlayTimeout,
    FloatingButtonExpired(FloatingButton),
    ControlVisibility { control: ControlId, visible: bool },
    FloatingVisibility { button: FloatingButton, visible: bool },
}

/// Payload-free discriminant of a [`Signal`], used as the subscription key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignalKind {
    Key,
    AppVisibility,
    CatalogReady,
    PlayIndex,
    PlayNext,
    PlayPrevious,
    CreatePlayer,
    ChangeSpeed,
    FastForward,
    Rewind,
    StopFastForward,
    StopRewind,
    PlayPause,
    Kill,
    SeekTick,
    Transport,
    PlayerStopped,
    SpeedUpdated,
    PauseUpdated,
    ProgressUpdated,
    FocusElement,
    FocusNextCard,
    FocusPreviousCard,
    FocusNextLineCard,
    FocusPreviousLineCard,
    FocusNextButton,
    FocusPreviousButton,
    FocusBar,
    FocusButtons,
    FocusFloatingButtons,
    FocusChanged,
    ScrollFrame,
    ShowOverlay,
    ToggleButton,
    ToggleFloatingButton,
    ShowNextButton,
    ShowPreviousButton,
    OverlayTimeout,
    FloatingButtonExpired,
    ControlVisibility,
    FloatingVisibility,
}

impl Signal {
    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::Key(_) => SignalKind::Key,
            Signal::AppVisibility { .. } => SignalKind::AppVisibility,
            Signal::CatalogReady { .. } => SignalKind::CatalogReady,
            Signal::PlayIndex(_) => SignalKind::PlayIndex,
            Signal::PlayNext => SignalKind::PlayNext,
            Signal::PlayPrevious => SignalKind::PlayPrevious,
            Signal::CreatePlayer { .. } => SignalKind::CreatePlayer,
            Signal::ChangeSpeed => SignalKind::ChangeSpeed,
            Signal::FastForward => SignalKind::FastForward,
            Signal::Rewind => SignalKind::Rewind,
            Signal::StopFastForward => SignalKind::StopFastForward,
            Signal::StopRewind => SignalKind::StopRewind,
            Signal::PlayPause => SignalKind::PlayPause,
            Signal::Kill => SignalKind::Kill,
            Signal::SeekTick { .. } => SignalKind::SeekTick,
            Signal::Transport(_) => SignalKind::Transport,
            Signal::PlayerStopped => SignalKind::PlayerStopped,
            Signal::SpeedUpdated { .. } => SignalKind::SpeedUpdated,
            Signal::PauseUpdated { .. } => SignalKind::PauseUpdated,
            Signal::ProgressUpdated(_) => SignalKind::ProgressUpdated,
            Signal::FocusElement(_) => SignalKind::FocusElement,
            Signal::FocusNextCard => SignalKind::FocusNextCard,
            Signal::FocusPreviousCard => SignalKind::FocusPreviousCard,
            Signal::FocusNextLineCard => SignalKind::FocusNextLineCard,
            Signal::FocusPreviousLineCard => SignalKind::FocusPreviousLineCard,
            Signal::FocusNextButton => SignalKind::FocusNextButton,
            Signal::FocusPreviousButton => SignalKind::FocusPreviousButton,
            Signal::FocusBar => SignalKind::FocusBar,
            Signal::FocusButtons(_) => SignalKind::FocusButtons,
            Signal::FocusFloatingButtons => SignalKind::FocusFloatingButtons,
            Signal::FocusChanged { .. } => SignalKind::FocusChanged,
            Signal::ScrollFrame => SignalKind::ScrollFrame,
            Signal::ShowOverlay => SignalKind::ShowOverlay,
            Signal::ToggleButton => SignalKind::ToggleButton,
            Signal::ToggleFloatingButton => SignalKind::ToggleFloatingButton,
            Signal::ShowNextButton => SignalKind::ShowNextButton,
            Signal::ShowPreviousButton => SignalKind::ShowPreviousButton,
            Signal::OverlayTimeout => SignalKind::OverlayTimeout,
            Signal::FloatingButtonExpired(_) => SignalKind::FloatingButtonExpired,
            Signal::ControlVisibility { .. } => SignalKind::ControlVisibility,
            Signal::FloatingVisibility { .. } => SignalKind::FloatingVisibility,
        }
    }
}

/// Components that can hold subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subscriber {
    Input,
    Sequencer,
    PlayerHost,
    /// The live playback engine; everything it holds is dropped on stop
    Player,
    Focus,
    Overlay,
}
