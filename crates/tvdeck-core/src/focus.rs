//! Focus navigation
//!
//! The navigator owns the single focus slot. Browsing, it walks a flat
//! list of cards laid out in rows; with a player up, it walks the overlay:
//! the floating buttons on top, the action row in the middle and the
//! progress bar below.
//!
//! Every change is announced with [`Signal::FocusChanged`] so other
//! components can follow focus without writing it.

use crate::bus::{EventBus, TimerId};
use crate::config::{GridConfig, ScrollConfig};
use crate::scroll::{card_bounds, centered_offset, SmoothScroll};
use crate::signal::{Signal, SignalKind, Subscriber};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, warn};

/// Controls of the action row, in on-screen order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlId {
    Play,
    Pause,
    Speed,
}

impl ControlId {
    pub const ORDER: [ControlId; 3] = [ControlId::Play, ControlId::Pause, ControlId::Speed];

    fn position(self) -> usize {
        match self {
            ControlId::Play => 0,
            ControlId::Pause => 1,
            ControlId::Speed => 2,
        }
    }

    /// The control sharing this control's slot, if any
    pub fn mirror(self) -> Option<ControlId> {
        match self {
            ControlId::Play => Some(ControlId::Pause),
            ControlId::Pause => Some(ControlId::Play),
            ControlId::Speed => None,
        }
    }
}

/// Transient buttons above the action row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloatingButton {
    Previous,
    Next,
}

/// What can hold focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum FocusTarget {
    Card(usize),
    Control(ControlId),
    ProgressBar,
    Floating(FloatingButton),
}

impl FocusTarget {
    /// True for anything that lives in the overlay
    pub fn is_overlay(&self) -> bool {
        !matches!(self, FocusTarget::Card(_))
    }
}

impl fmt::Display for FocusTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FocusTarget::Card(index) => write!(f, "card {}", index),
            FocusTarget::Control(control) => write!(f, "control {:?}", control),
            FocusTarget::ProgressBar => write!(f, "progress bar"),
            FocusTarget::Floating(button) => write!(f, "floating {:?}", button),
        }
    }
}

/// Which overlay controls are currently shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlVisibility {
    pub play: bool,
    pub pause: bool,
    pub speed: bool,
    pub previous: bool,
    pub next: bool,
}

impl Default for ControlVisibility {
    fn default() -> Self {
        Self {
            play: false,
            pause: true,
            speed: true,
            previous: false,
            next: false,
        }
    }
}

impl ControlVisibility {
    pub fn control(&self, control: ControlId) -> bool {
        match control {
            ControlId::Play => self.play,
            ControlId::Pause => self.pause,
            ControlId::Speed => self.speed,
        }
    }

    pub fn floating(&self, button: FloatingButton) -> bool {
        match button {
            FloatingButton::Previous => self.previous,
            FloatingButton::Next => self.next,
        }
    }

    fn set_control(&mut self, control: ControlId, visible: bool) {
        match control {
            ControlId::Play => self.play = visible,
            ControlId::Pause => self.pause = visible,
            ControlId::Speed => self.speed = visible,
        }
    }

    fn set_floating(&mut self, button: FloatingButton, visible: bool) {
        match button {
            FloatingButton::Previous => self.previous = visible,
            FloatingButton::Next => self.next = visible,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Forward,
    Backward,
}

/// Nearest visible control from `from` in the given direction
fn nearest_visible(from: ControlId, step: Step, visible: &ControlVisibility) -> Option<ControlId> {
    let index = from.position();
    let candidates: Vec<ControlId> = match step {
        Step::Forward => ControlId::ORDER[index + 1..].to_vec(),
        Step::Backward => ControlId::ORDER[..index].iter().rev().copied().collect(),
    };
    candidates.into_iter().find(|c| visible.control(*c))
}

const FOCUS_SIGNALS: [SignalKind; 16] = [
    SignalKind::CatalogReady,
    SignalKind::CreatePlayer,
    SignalKind::FocusElement,
    SignalKind::FocusNextCard,
    SignalKind::FocusPreviousCard,
    SignalKind::FocusNextLineCard,
    SignalKind::FocusPreviousLineCard,
    SignalKind::FocusNextButton,
    SignalKind::FocusPreviousButton,
    SignalKind::FocusBar,
    SignalKind::FocusButtons,
    SignalKind::FocusFloatingButtons,
    SignalKind::PlayerStopped,
    SignalKind::ScrollFrame,
    SignalKind::ControlVisibility,
    SignalKind::FloatingVisibility,
];

#[derive(Debug)]
pub struct FocusNavigator {
    grid: GridConfig,
    catalog_size: usize,
    /// Overlay targets only take focus while a player is up
    player_active: bool,
    current: Option<FocusTarget>,
    last_card: usize,
    last_control: ControlId,
    visible: ControlVisibility,
    scroll: SmoothScroll,
    /// The one scheduled animation frame
    scroll_timer: Option<TimerId>,
}

impl FocusNavigator {
    pub fn new(grid: GridConfig, scroll: &ScrollConfig) -> Self {
        Self {
            grid,
            catalog_size: 0,
            player_active: false,
            current: None,
            last_card: 0,
            last_control: ControlId::Pause,
            visible: ControlVisibility::default(),
            scroll: SmoothScroll::new(scroll),
            scroll_timer: None,
        }
    }

    pub fn subscribe(bus: &mut EventBus) {
        for kind in FOCUS_SIGNALS {
            bus.subscribe(kind, Subscriber::Focus);
        }
    }

    pub fn current(&self) -> Option<FocusTarget> {
        self.current
    }

    /// Card that keeps focus memory while the player is up
    pub fn last_card(&self) -> usize {
        self.last_card
    }

    pub fn last_control(&self) -> ControlId {
        self.last_control
    }

    pub fn visibility(&self) -> &ControlVisibility {
        &self.visible
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll.offset()
    }

    pub fn is_scrolling(&self) -> bool {
        self.scroll.is_animating()
    }

    pub fn handle(&mut self, signal: &Signal, bus: &mut EventBus) {
        match signal {
            Signal::CatalogReady { size } => self.catalog_ready(*size, bus),
            Signal::CreatePlayer { .. } => self.player_active = true,
            Signal::FocusElement(target) => self.focus_element(*target, bus),
            Signal::FocusNextCard => self.move_card(1, bus),
            Signal::FocusPreviousCard => self.move_card(-1, bus),
            Signal::FocusNextLineCard => self.move_card(self.grid.row_size as isize, bus),
            Signal::FocusPreviousLineCard => self.move_card(-(self.grid.row_size as isize), bus),
            Signal::FocusNextButton => self.move_button(Step::Forward, bus),
            Signal::FocusPreviousButton => self.move_button(Step::Backward, bus),
            Signal::FocusBar => self.focus_bar(bus),
            Signal::FocusButtons(target) => self.focus_buttons(*target, bus),
            Signal::FocusFloatingButtons => self.focus_floating_buttons(bus),
            Signal::PlayerStopped => self.player_stopped(bus),
            Signal::ScrollFrame => self.on_scroll_frame(bus),
            Signal::ControlVisibility { control, visible } => {
                self.visible.set_control(*control, *visible)
            }
            Signal::FloatingVisibility { button, visible } => {
                self.visible.set_floating(*button, *visible)
            }
            _ => {}
        }
    }

    fn set_focus(&mut self, target: FocusTarget, scroll: bool, bus: &mut EventBus) {
        if self.current == Some(target) {
            return;
        }
        if target.is_overlay() && !self.player_active {
            debug!(target = %target, "No player, overlay focus dropped");
            return;
        }

        let previous = self.current.replace(target);
        if let FocusTarget::Card(index) = target {
            self.last_card = index;
            if scroll {
                self.scroll_into_view(index, bus);
            }
        }

        debug!(?previous, current = %target, "Focus changed");
        bus.publish(Signal::FocusChanged {
            previous,
            current: target,
        });
    }

    fn catalog_ready(&mut self, size: usize, bus: &mut EventBus) {
        self.catalog_size = size;
        if size == 0 {
            error!("Catalog is empty, nothing to focus");
            return;
        }
        self.set_focus(FocusTarget::Card(0), false, bus);
    }

    fn focus_element(&mut self, target: FocusTarget, bus: &mut EventBus) {
        match target {
            FocusTarget::Card(index) if index >= self.catalog_size => {
                error!(index, size = self.catalog_size, "No card to focus");
            }
            FocusTarget::Control(control) if !self.visible.control(control) => {
                match control.mirror().filter(|m| self.visible.control(*m)) {
                    Some(mirror) => self.set_focus(FocusTarget::Control(mirror), false, bus),
                    None => warn!(?control, "Control hidden, focus unchanged"),
                }
            }
            FocusTarget::Floating(button) if !self.visible.floating(button) => {
                warn!(?button, "Floating button hidden, focus unchanged");
            }
            target => self.set_focus(target, true, bus),
        }
    }

    /// Move across the grid by `delta` cards, clamped to the catalog
    fn move_card(&mut self, delta: isize, bus: &mut EventBus) {
        if self.catalog_size == 0 {
            debug!("No cards to move across");
            return;
        }

        let from = match self.current {
            Some(FocusTarget::Card(index)) => index,
            _ => self.last_card,
        };
        let last = self.catalog_size - 1;
        let to = from.saturating_add_signed(delta).min(last);

        self.set_focus(FocusTarget::Card(to), true, bus);
    }

    fn move_button(&mut self, step: Step, bus: &mut EventBus) {
        match self.current {
            Some(FocusTarget::ProgressBar) => bus.publish(match step {
                Step::Forward => Signal::FastForward,
                Step::Backward => Signal::Rewind,
            }),
            Some(FocusTarget::Control(control)) => {
                match nearest_visible(control, step, &self.visible) {
                    Some(next) => self.set_focus(FocusTarget::Control(next), false, bus),
                    None => debug!(?control, "No visible control further along"),
                }
            }
            Some(FocusTarget::Floating(button)) => {
                let other = match (button, step) {
                    (FloatingButton::Previous, Step::Forward) => FloatingButton::Next,
                    (FloatingButton::Next, Step::Backward) => FloatingButton::Previous,
                    _ => return,
                };
                if self.visible.floating(other) {
                    self.set_focus(FocusTarget::Floating(other), false, bus);
                }
            }
            Some(FocusTarget::Card(_)) | None => warn!("No overlay control focused"),
        }
    }

    fn focus_bar(&mut self, bus: &mut EventBus) {
        if let Some(FocusTarget::Control(control)) = self.current {
            self.last_control = control;
        }
        self.set_focus(FocusTarget::ProgressBar, false, bus);
    }

    /// Back to the action row, on `target` or on the remembered control
    fn focus_buttons(&mut self, target: Option<ControlId>, bus: &mut EventBus) {
        let wanted = target.unwrap_or(self.last_control);
        let control = if self.visible.control(wanted) {
            wanted
        } else {
            wanted.mirror().unwrap_or(wanted)
        };
        self.set_focus(FocusTarget::Control(control), false, bus);
    }

    fn focus_floating_buttons(&mut self, bus: &mut EventBus) {
        if let Some(FocusTarget::Control(control)) = self.current {
            self.last_control = control;
        }
        let target = [FloatingButton::Next, FloatingButton::Previous]
            .into_iter()
            .find(|button| self.visible.floating(*button));

        match target {
            Some(button) => self.set_focus(FocusTarget::Floating(button), false, bus),
            None => debug!("No floating button shown"),
        }
    }

    fn player_stopped(&mut self, bus: &mut EventBus) {
        self.player_active = false;
        if self.catalog_size == 0 {
            return;
        }
        // The page did not move while playing
        self.set_focus(FocusTarget::Card(self.last_card), false, bus);
    }

    fn scroll_into_view(&mut self, index: usize, bus: &mut EventBus) {
        let bounds = card_bounds(&self.grid, index, self.scroll.offset());
        if bounds.is_fully_visible(self.grid.viewport_height) {
            return;
        }

        let target = centered_offset(&self.grid, index, self.catalog_size);
        self.scroll.start(target, bus.now());
        if let Some(timer) = self.scroll_timer.take() {
            bus.cancel(timer);
        }
        self.scroll_frame(bus);
    }

    fn on_scroll_frame(&mut self, bus: &mut EventBus) {
        // A frame from a chain that a newer scroll replaced
        if self.scroll_timer.is_some_and(|timer| bus.is_pending(timer)) {
            return;
        }
        self.scroll_timer = None;
        self.scroll_frame(bus);
    }

    fn scroll_frame(&mut self, bus: &mut EventBus) {
        if self.scroll.step(bus.now()) {
            let timer = bus.schedule(self.scroll.frame_interval(), Signal::ScrollFrame);
            self.scroll_timer = Some(timer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn navigator(size: usize) -> (FocusNavigator, EventBus) {
        let mut nav = FocusNavigator::new(GridConfig::default(), &ScrollConfig::default());
        let mut bus = EventBus::new();
        nav.handle(&Signal::CatalogReady { size }, &mut bus);
        bus.clear_queue();
        (nav, bus)
    }

    /// Navigator with a player up
    fn playing(size: usize) -> (FocusNavigator, EventBus) {
        let (mut nav, mut bus) = navigator(size);
        nav.handle(
            &Signal::CreatePlayer {
                url: "https://media.example/a.mp4".into(),
                title: "Avatar".into(),
            },
            &mut bus,
        );
        (nav, bus)
    }

    fn card(nav: &FocusNavigator) -> Option<usize> {
        match nav.current() {
            Some(FocusTarget::Card(index)) => Some(index),
            _ => None,
        }
    }

    #[test]
    fn test_catalog_ready_focuses_first_card() {
        let (nav, _bus) = navigator(19);
        assert_eq!(card(&nav), Some(0));
    }

    #[test]
    fn test_card_moves_clamp() {
        let (mut nav, mut bus) = navigator(19);

        nav.handle(&Signal::FocusPreviousCard, &mut bus);
        assert_eq!(card(&nav), Some(0));
        assert!(bus.pop().is_none());

        nav.handle(&Signal::FocusElement(FocusTarget::Card(18)), &mut bus);
        nav.handle(&Signal::FocusNextCard, &mut bus);
        assert_eq!(card(&nav), Some(18));
    }

    #[test]
    fn test_line_moves() {
        let (mut nav, mut bus) = navigator(19);

        nav.handle(&Signal::FocusNextLineCard, &mut bus);
        assert_eq!(card(&nav), Some(5));
        nav.handle(&Signal::FocusPreviousLineCard, &mut bus);
        assert_eq!(card(&nav), Some(0));

        nav.handle(&Signal::FocusElement(FocusTarget::Card(17)), &mut bus);
        nav.handle(&Signal::FocusNextLineCard, &mut bus);
        assert_eq!(card(&nav), Some(18));

        nav.handle(&Signal::FocusElement(FocusTarget::Card(2)), &mut bus);
        nav.handle(&Signal::FocusPreviousLineCard, &mut bus);
        assert_eq!(card(&nav), Some(0));
    }

    #[test]
    fn test_focus_change_is_announced() {
        let (mut nav, mut bus) = navigator(19);
        nav.handle(&Signal::FocusNextCard, &mut bus);

        assert_eq!(
            bus.pop(),
            Some(Signal::FocusChanged {
                previous: Some(FocusTarget::Card(0)),
                current: FocusTarget::Card(1),
            })
        );
    }

    #[test]
    fn test_offscreen_card_scrolls() {
        let (mut nav, mut bus) = navigator(19);

        nav.handle(&Signal::FocusElement(FocusTarget::Card(16)), &mut bus);

        assert!(nav.is_scrolling());
        assert_eq!(bus.pending_timers(), 1);
    }

    #[test]
    fn test_overlapping_scrolls_keep_one_frame() {
        let (mut nav, mut bus) = navigator(19);

        nav.handle(&Signal::FocusElement(FocusTarget::Card(16)), &mut bus);
        bus.set_now(Duration::from_millis(20));
        nav.handle(&Signal::FocusElement(FocusTarget::Card(17)), &mut bus);
        assert_eq!(bus.pending_timers(), 1);

        // Run the animation out frame by frame
        while bus.fire_next_due(Duration::from_secs(1)) {
            while let Some(signal) = bus.pop() {
                nav.handle(&signal, &mut bus);
                assert!(bus.pending_timers() <= 1);
            }
        }
        assert!(!nav.is_scrolling());
        assert_eq!(
            nav.scroll_offset(),
            centered_offset(&GridConfig::default(), 17, 19)
        );
    }

    #[test]
    fn test_visible_card_does_not_scroll() {
        let (mut nav, mut bus) = navigator(19);
        nav.handle(&Signal::FocusElement(FocusTarget::Card(12)), &mut bus);

        assert!(!nav.is_scrolling());
        assert_eq!(bus.pending_timers(), 0);
    }

    #[test]
    fn test_controls_skip_hidden_mirror() {
        let (mut nav, mut bus) = playing(19);
        nav.handle(&Signal::FocusElement(FocusTarget::Control(ControlId::Speed)), &mut bus);

        // Play is hidden while playing: Speed goes back to Pause, then stops
        nav.handle(&Signal::FocusPreviousButton, &mut bus);
        assert_eq!(nav.current(), Some(FocusTarget::Control(ControlId::Pause)));
        nav.handle(&Signal::FocusPreviousButton, &mut bus);
        assert_eq!(nav.current(), Some(FocusTarget::Control(ControlId::Pause)));

        // Paused: Play is shown and Pause hidden, Play -> Speed skips one slot
        nav.handle(
            &Signal::ControlVisibility { control: ControlId::Play, visible: true },
            &mut bus,
        );
        nav.handle(
            &Signal::ControlVisibility { control: ControlId::Pause, visible: false },
            &mut bus,
        );
        nav.handle(&Signal::FocusElement(FocusTarget::Control(ControlId::Play)), &mut bus);
        nav.handle(&Signal::FocusNextButton, &mut bus);
        assert_eq!(nav.current(), Some(FocusTarget::Control(ControlId::Speed)));
    }

    #[test]
    fn test_bar_remembers_control_and_seeks() {
        let (mut nav, mut bus) = playing(19);
        nav.handle(&Signal::FocusElement(FocusTarget::Control(ControlId::Speed)), &mut bus);
        nav.handle(&Signal::FocusBar, &mut bus);
        bus.clear_queue();

        nav.handle(&Signal::FocusNextButton, &mut bus);
        assert_eq!(bus.pop(), Some(Signal::FastForward));
        nav.handle(&Signal::FocusPreviousButton, &mut bus);
        assert_eq!(bus.pop(), Some(Signal::Rewind));

        nav.handle(&Signal::FocusButtons(None), &mut bus);
        assert_eq!(nav.current(), Some(FocusTarget::Control(ControlId::Speed)));
    }

    #[test]
    fn test_focus_buttons_maps_hidden_control_to_mirror() {
        let (mut nav, mut bus) = playing(19);
        nav.handle(&Signal::FocusButtons(Some(ControlId::Play)), &mut bus);
        assert_eq!(nav.current(), Some(FocusTarget::Control(ControlId::Pause)));
    }

    #[test]
    fn test_floating_buttons_prefer_next() {
        let (mut nav, mut bus) = playing(19);
        nav.handle(&Signal::FocusElement(FocusTarget::Control(ControlId::Pause)), &mut bus);

        nav.handle(&Signal::FocusFloatingButtons, &mut bus);
        assert_eq!(nav.current(), Some(FocusTarget::Control(ControlId::Pause)));

        for button in [FloatingButton::Previous, FloatingButton::Next] {
            nav.handle(&Signal::FloatingVisibility { button, visible: true }, &mut bus);
        }
        nav.handle(&Signal::FocusFloatingButtons, &mut bus);
        assert_eq!(nav.current(), Some(FocusTarget::Floating(FloatingButton::Next)));

        nav.handle(&Signal::FocusPreviousButton, &mut bus);
        assert_eq!(nav.current(), Some(FocusTarget::Floating(FloatingButton::Previous)));
    }

    #[test]
    fn test_floating_buttons_remember_control() {
        let (mut nav, mut bus) = playing(19);
        nav.handle(
            &Signal::FloatingVisibility { button: FloatingButton::Next, visible: true },
            &mut bus,
        );
        nav.handle(&Signal::FocusElement(FocusTarget::Control(ControlId::Speed)), &mut bus);

        nav.handle(&Signal::FocusFloatingButtons, &mut bus);
        assert_eq!(nav.current(), Some(FocusTarget::Floating(FloatingButton::Next)));
        assert_eq!(nav.last_control(), ControlId::Speed);

        nav.handle(&Signal::FocusButtons(None), &mut bus);
        assert_eq!(nav.current(), Some(FocusTarget::Control(ControlId::Speed)));
    }

    #[test]
    fn test_overlay_focus_needs_player() {
        let (mut nav, mut bus) = navigator(19);
        nav.handle(&Signal::FocusElement(FocusTarget::Control(ControlId::Pause)), &mut bus);
        assert_eq!(nav.current(), Some(FocusTarget::Card(0)));
    }

    #[test]
    fn test_player_stopped_restores_last_card() {
        let (mut nav, mut bus) = playing(19);
        nav.handle(&Signal::FocusElement(FocusTarget::Card(4)), &mut bus);
        nav.handle(&Signal::FocusElement(FocusTarget::Control(ControlId::Pause)), &mut bus);
        nav.handle(&Signal::FocusBar, &mut bus);

        nav.handle(&Signal::PlayerStopped, &mut bus);

        assert_eq!(nav.current(), Some(FocusTarget::Card(4)));
        assert!(!nav.is_scrolling());
    }
}
