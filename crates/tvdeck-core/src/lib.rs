//! tvdeck Core - Playback control and focus engine for TV media browsers
//!
//! This crate provides everything between the remote control and the video
//! backend:
//! - Remote key dispatch by input context
//! - One playback engine over three transports (native, media element, adaptive)
//! - Progressive seek while a seek key is held
//! - Spatial focus across the card grid and the player overlay
//! - Overlay visibility with auto-hide and floating next/previous buttons
//! - Title sequencing (play, next, previous)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                              Deck                                │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐          │
//! │  │    Input     │   │  Sequencer   │   │    Focus     │          │
//! │  │  Dispatcher  │   │              │   │  Navigator   │          │
//! │  └──────┬───────┘   └──────┬───────┘   └──────┬───────┘          │
//! │         │                  │                  │                  │
//! │         └──────────┬───────┴──────────┬───────┘                  │
//! │                    │                  │                          │
//! │             ┌──────┴──────┐    ┌──────┴──────┐                   │
//! │             │  Event Bus  │    │   Overlay   │                   │
//! │             │ (virtual t) │    │ Controller  │                   │
//! │             └──────┬──────┘    └─────────────┘                   │
//! │                    │                                             │
//! │             ┌──────┴──────┐    ┌─────────────────────────┐       │
//! │             │   Player    │────│ Transport: native |     │       │
//! │             │ Host/Engine │    │ media element | adaptive│       │
//! │             └─────────────┘    └─────────────────────────┘       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod bus;
pub mod catalog;
pub mod config;
pub mod deck;
pub mod error;
pub mod focus;
pub mod format;
pub mod input;
pub mod overlay;
pub mod playback;
pub mod runtime;
pub mod scroll;
pub mod seek;
pub mod sequencer;
pub mod signal;

pub use bus::{EventBus, TimerId};
pub use catalog::{
    clean_title, load_catalog_or_mock, CatalogEntry, CatalogSource, DirectoryCatalog, MockCatalog,
};
pub use config::{DeckConfig, GridConfig, OverlayConfig, PlaybackConfig, ScrollConfig};
pub use deck::{Deck, DeckSnapshot};
pub use error::{Error, Result, Severity};
pub use focus::{ControlId, FloatingButton, FocusNavigator, FocusTarget};
pub use input::{InputContext, InputDispatcher, KeyEvent, KeyPhase, OverlayArea, RemoteKey};
pub use overlay::{OverlayController, OverlayView};
pub use playback::{
    Backend, EngineSettings, PlaybackEngine, PlaybackState, PlayerHost, Progress, Transport,
    TransportEvent, TransportFactory,
};
pub use runtime::{drive, RemoteInput};
pub use seek::{SeekDirection, SeekLevel, SeekSession, SeekTable};
pub use sequencer::ContentSequencer;
pub use signal::{Signal, SignalKind, Subscriber};

#[cfg(feature = "sim")]
pub use playback::sim::{SimCall, SimOptions, SimulatedFactory};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version once at startup
pub fn init() {
    tracing::info!(version = VERSION, "tvdeck core initialized");
}
