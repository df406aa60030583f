//! Player overlay
//!
//! Shows and hides the controls drawn over the video, keeps the renderable
//! [`OverlayView`] up to date and turns "enter" on a control into a player
//! request. Visibility is driven by a single auto-hide timer; the floating
//! previous/next buttons each have their own window.

use crate::bus::{EventBus, TimerId};
use crate::config::OverlayConfig;
use crate::focus::{ControlId, FloatingButton, FocusTarget};
use crate::format::format_speed;
use crate::playback::Progress;
use crate::signal::{Signal, SignalKind, Subscriber};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What the overlay currently shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayView {
    pub visible: bool,
    pub title: String,
    pub elapsed_label: String,
    pub duration_label: String,
    pub progress_percent: f64,
    pub indicator_left: f64,
    pub speed_label: String,
    /// Which of play/pause occupies the shared slot
    pub shown_toggle: ControlId,
    pub previous_visible: bool,
    pub next_visible: bool,
}

const OVERLAY_SIGNALS: [SignalKind; 13] = [
    SignalKind::CreatePlayer,
    SignalKind::ShowOverlay,
    SignalKind::ToggleButton,
    SignalKind::ToggleFloatingButton,
    SignalKind::ShowNextButton,
    SignalKind::ShowPreviousButton,
    SignalKind::OverlayTimeout,
    SignalKind::FloatingButtonExpired,
    SignalKind::PlayerStopped,
    SignalKind::SpeedUpdated,
    SignalKind::PauseUpdated,
    SignalKind::ProgressUpdated,
    SignalKind::FocusChanged,
];

#[derive(Debug, Default)]
struct FloatingWindow {
    visible: bool,
    timer: Option<TimerId>,
}

#[derive(Debug)]
pub struct OverlayController {
    config: OverlayConfig,
    player_active: bool,
    visible: bool,
    hide_timer: Option<TimerId>,
    /// Focus to restore when the overlay comes back
    last_focused: FocusTarget,
    focus: Option<FocusTarget>,
    title: String,
    progress: Option<Progress>,
    speed: f64,
    shown_toggle: ControlId,
    previous: FloatingWindow,
    next: FloatingWindow,
}

impl OverlayController {
    pub fn new(config: OverlayConfig) -> Self {
        Self {
            config,
            player_active: false,
            visible: false,
            hide_timer: None,
            last_focused: FocusTarget::Control(ControlId::Pause),
            focus: None,
            title: String::new(),
            progress: None,
            speed: 1.0,
            shown_toggle: ControlId::Pause,
            previous: FloatingWindow::default(),
            next: FloatingWindow::default(),
        }
    }

    pub fn subscribe(bus: &mut EventBus) {
        for kind in OVERLAY_SIGNALS {
            bus.subscribe(kind, Subscriber::Overlay);
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Focus recorded when the overlay last hid
    pub fn last_focused(&self) -> FocusTarget {
        self.last_focused
    }

    pub fn view(&self) -> OverlayView {
        let (elapsed_label, duration_label, progress_percent, indicator_left) =
            match &self.progress {
                Some(p) => (
                    p.elapsed_label.clone(),
                    p.duration_label.clone(),
                    p.percent(),
                    p.indicator_left,
                ),
                None => (
                    "00:00".to_string(),
                    "00:00".to_string(),
                    0.0,
                    self.config.time_label_width,
                ),
            };

        OverlayView {
            visible: self.visible,
            title: self.title.clone(),
            elapsed_label,
            duration_label,
            progress_percent,
            indicator_left,
            speed_label: format_speed(self.speed),
            shown_toggle: self.shown_toggle,
            previous_visible: self.previous.visible,
            next_visible: self.next.visible,
        }
    }

    pub fn handle(&mut self, signal: &Signal, bus: &mut EventBus) {
        match signal {
            Signal::CreatePlayer { title, .. } => {
                self.player_active = true;
                self.title = title.clone();
                self.progress = None;
                self.show(true, bus);
            }
            Signal::ShowOverlay if self.player_active => self.show(false, bus),
            Signal::ToggleButton => self.toggle_button(bus),
            Signal::ToggleFloatingButton => self.toggle_floating_button(bus),
            Signal::ShowNextButton => self.open_window(FloatingButton::Next, bus),
            Signal::ShowPreviousButton => self.open_window(FloatingButton::Previous, bus),
            Signal::OverlayTimeout => self.hide(),
            Signal::FloatingButtonExpired(button) => self.window_expired(*button, bus),
            Signal::PlayerStopped => self.player_stopped(bus),
            Signal::SpeedUpdated { speed } => self.speed = *speed,
            Signal::PauseUpdated { paused } => self.pause_updated(*paused, bus),
            Signal::ProgressUpdated(progress) => self.progress = Some(progress.clone()),
            Signal::FocusChanged { current, .. } => self.focus = Some(*current),
            _ => {}
        }
    }

    /// Make the overlay visible and restart the auto-hide countdown.
    ///
    /// Focus goes back to the remembered control when the overlay was
    /// hidden or `should_focus` is set.
    pub fn show(&mut self, should_focus: bool, bus: &mut EventBus) {
        let was_hidden = !self.visible;
        self.visible = true;

        if (was_hidden || should_focus) && self.focus != Some(self.last_focused) {
            bus.publish(Signal::FocusElement(self.last_focused));
        }

        self.reset_timeout(bus);
    }

    fn reset_timeout(&mut self, bus: &mut EventBus) {
        if let Some(timer) = self.hide_timer.take() {
            bus.cancel(timer);
        }
        self.hide_timer = Some(bus.schedule(self.config.hide_delay(), Signal::OverlayTimeout));
    }

    fn hide(&mut self) {
        self.hide_timer = None;
        if !self.visible {
            return;
        }

        self.last_focused = match self.focus {
            Some(target) if target.is_overlay() => target,
            _ => FocusTarget::Control(ControlId::Pause),
        };
        self.visible = false;
        debug!(last_focused = %self.last_focused, "Overlay hidden");
    }

    /// The play/pause slot only flips once the player reports the change
    fn toggle_button(&mut self, bus: &mut EventBus) {
        match self.focus {
            Some(FocusTarget::Control(ControlId::Play | ControlId::Pause)) => {
                bus.publish(Signal::PlayPause)
            }
            Some(FocusTarget::Control(ControlId::Speed)) => bus.publish(Signal::ChangeSpeed),
            other => warn!(focus = ?other, "Nothing to toggle"),
        }
    }

    /// Show Play while paused and Pause while playing. Focus on the control
    /// being hidden follows to its replacement.
    fn pause_updated(&mut self, paused: bool, bus: &mut EventBus) {
        let wanted = if paused { ControlId::Play } else { ControlId::Pause };
        if !self.player_active || wanted == self.shown_toggle {
            return;
        }

        let hidden = self.shown_toggle;
        self.shown_toggle = wanted;
        bus.publish(Signal::ControlVisibility {
            control: wanted,
            visible: true,
        });
        bus.publish(Signal::ControlVisibility {
            control: hidden,
            visible: false,
        });
        if self.focus == Some(FocusTarget::Control(hidden)) {
            bus.publish(Signal::FocusElement(FocusTarget::Control(wanted)));
        }
        debug!(shown = ?wanted, "Play/pause slot updated");
    }

    fn toggle_floating_button(&mut self, bus: &mut EventBus) {
        if self.next.visible {
            self.close_window(FloatingButton::Next, bus);
            bus.publish(Signal::PlayNext);
        } else if self.previous.visible {
            self.close_window(FloatingButton::Previous, bus);
            bus.publish(Signal::PlayPrevious);
        } else {
            warn!("No floating button to activate");
        }
    }

    fn window(&mut self, button: FloatingButton) -> &mut FloatingWindow {
        match button {
            FloatingButton::Previous => &mut self.previous,
            FloatingButton::Next => &mut self.next,
        }
    }

    fn window_length(&self, button: FloatingButton) -> Duration {
        Duration::from_millis(match button {
            FloatingButton::Previous => self.config.previous_button_ms,
            FloatingButton::Next => self.config.next_button_ms,
        })
    }

    fn open_window(&mut self, button: FloatingButton, bus: &mut EventBus) {
        if !self.player_active {
            debug!(?button, "No player, floating button not shown");
            return;
        }

        let length = self.window_length(button);
        let window = self.window(button);
        if let Some(timer) = window.timer.take() {
            bus.cancel(timer);
        }
        window.visible = true;
        window.timer = Some(bus.schedule(length, Signal::FloatingButtonExpired(button)));

        bus.publish(Signal::FloatingVisibility {
            button,
            visible: true,
        });
        info!(?button, window_ms = length.as_millis() as u64, "Floating button shown");
    }

    fn close_window(&mut self, button: FloatingButton, bus: &mut EventBus) {
        let window = self.window(button);
        if let Some(timer) = window.timer.take() {
            bus.cancel(timer);
        }
        if !window.visible {
            return;
        }
        window.visible = false;

        bus.publish(Signal::FloatingVisibility {
            button,
            visible: false,
        });
    }

    fn window_expired(&mut self, button: FloatingButton, bus: &mut EventBus) {
        self.window(button).timer = None;
        self.close_window(button, bus);

        if self.focus == Some(FocusTarget::Floating(button)) {
            debug!(?button, "Focused floating button expired");
            bus.publish(Signal::FocusButtons(Some(self.shown_toggle)));
        }
    }

    fn player_stopped(&mut self, bus: &mut EventBus) {
        if let Some(timer) = self.hide_timer.take() {
            bus.cancel(timer);
        }
        self.close_window(FloatingButton::Previous, bus);
        self.close_window(FloatingButton::Next, bus);

        if self.shown_toggle != ControlId::Pause {
            bus.publish(Signal::ControlVisibility {
                control: ControlId::Pause,
                visible: true,
            });
            bus.publish(Signal::ControlVisibility {
                control: ControlId::Play,
                visible: false,
            });
        }

        self.player_active = false;
        self.visible = false;
        self.last_focused = FocusTarget::Control(ControlId::Pause);
        self.shown_toggle = ControlId::Pause;
        self.speed = 1.0;
        self.progress = None;
    }
}
