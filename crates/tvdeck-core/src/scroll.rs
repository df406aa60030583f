//! Smooth vertical scrolling of the card grid
//!
//! A scroll runs for a fixed duration whatever the distance, eased with a
//! half cosine, and lands exactly on its target on the last frame.

use crate::config::{GridConfig, ScrollConfig};
use std::f64::consts::PI;
use std::time::Duration;

/// Half-cosine ease over `t` in `[0, 1]`
pub fn ease(t: f64) -> f64 {
    0.5 * (1.0 - (PI * t.clamp(0.0, 1.0)).cos())
}

/// Vertical position of a card, relative to the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardBounds {
    pub top: f64,
    pub bottom: f64,
}

impl CardBounds {
    pub fn is_fully_visible(&self, viewport_height: f64) -> bool {
        self.top >= 0.0 && self.bottom <= viewport_height
    }
}

/// Bounds of card `index` with the page scrolled to `offset`
pub fn card_bounds(grid: &GridConfig, index: usize, offset: f64) -> CardBounds {
    let row = (index / grid.row_size) as f64;
    let top = grid.top_offset + row * grid.row_height - offset;
    CardBounds {
        top,
        bottom: top + grid.row_height,
    }
}

/// Offset that centers card `index`, kept within the page
pub fn centered_offset(grid: &GridConfig, index: usize, catalog_size: usize) -> f64 {
    let rows = catalog_size.div_ceil(grid.row_size) as f64;
    let page_height = grid.top_offset + rows * grid.row_height;
    let max_offset = (page_height - grid.viewport_height).max(0.0);

    let absolute_top = card_bounds(grid, index, 0.0).top;
    let target = absolute_top - grid.viewport_height / 2.0 + grid.row_height / 2.0;
    target.clamp(0.0, max_offset)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Animation {
    from: f64,
    to: f64,
    started_at: Duration,
}

/// Current scroll offset and any animation in flight
#[derive(Debug, Clone)]
pub struct SmoothScroll {
    offset: f64,
    animation: Option<Animation>,
    duration: Duration,
    frame: Duration,
}

impl SmoothScroll {
    pub fn new(config: &ScrollConfig) -> Self {
        Self {
            offset: 0.0,
            animation: None,
            duration: Duration::from_millis(config.duration_ms),
            frame: Duration::from_millis(config.frame_ms),
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Interval between animation frames
    pub fn frame_interval(&self) -> Duration {
        self.frame
    }

    /// Begin scrolling from the current offset towards `target`
    pub fn start(&mut self, target: f64, now: Duration) {
        self.animation = Some(Animation {
            from: self.offset,
            to: target,
            started_at: now,
        });
    }

    /// Apply the frame for `now`. Returns true while more frames are needed.
    pub fn step(&mut self, now: Duration) -> bool {
        let Some(animation) = self.animation else {
            return false;
        };

        let elapsed = now.saturating_sub(animation.started_at);
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();

        if t >= 1.0 {
            self.offset = animation.to;
            self.animation = None;
            return false;
        }

        self.offset = animation.from + (animation.to - animation.from) * ease(t);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_endpoints() {
        assert_eq!(ease(0.0), 0.0);
        assert!((ease(0.5) - 0.5).abs() < 1e-12);
        assert_eq!(ease(1.0), 1.0);
        assert_eq!(ease(2.0), 1.0);
    }

    #[test]
    fn test_first_rows_are_visible() {
        let grid = GridConfig::default();
        assert!(card_bounds(&grid, 0, 0.0).is_fully_visible(grid.viewport_height));
        assert!(card_bounds(&grid, 14, 0.0).is_fully_visible(grid.viewport_height));
        assert!(!card_bounds(&grid, 15, 0.0).is_fully_visible(grid.viewport_height));
    }

    #[test]
    fn test_centered_offset_is_clamped() {
        let grid = GridConfig::default();
        assert_eq!(centered_offset(&grid, 0, 19), 0.0);

        // 4 rows: page is 60 + 4 * 330 = 1380 high, so at most 300 of scroll
        assert_eq!(centered_offset(&grid, 18, 19), 300.0);
    }

    #[test]
    fn test_animation_lands_exactly_on_target() {
        let mut scroll = SmoothScroll::new(&ScrollConfig::default());
        scroll.start(300.0, Duration::ZERO);

        assert!(scroll.step(Duration::from_millis(100)));
        assert!((scroll.offset() - 150.0).abs() < 1e-9);

        let mut now = Duration::from_millis(100);
        while scroll.step(now) {
            now += scroll.frame_interval();
        }
        assert_eq!(scroll.offset(), 300.0);
        assert!(!scroll.is_animating());
    }
}
