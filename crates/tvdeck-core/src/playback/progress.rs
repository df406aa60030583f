//! Progress reporting for the overlay

use crate::format::format_clock;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Horizontal layout of the progress row, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressLayout {
    /// Margin reserved for the elapsed-time label
    pub time_label_width: f64,
    /// Width the indicator travels across
    pub progress_bar_width: f64,
}

impl Default for ProgressLayout {
    fn default() -> Self {
        Self {
            time_label_width: 80.0,
            progress_bar_width: 1760.0,
        }
    }
}

/// Snapshot of playback progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub elapsed: Duration,
    pub duration: Option<Duration>,
    /// Elapsed share of the duration, in `[0, 1]`
    pub fraction: f64,
    /// Indicator x position: label margin plus the elapsed share of the bar
    pub indicator_left: f64,
    pub elapsed_label: String,
    pub duration_label: String,
}

impl Progress {
    pub fn compute(elapsed: Duration, duration: Option<Duration>, layout: &ProgressLayout) -> Self {
        let fraction = match duration {
            Some(total) if !total.is_zero() => {
                (elapsed.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
            }
            _ => 0.0,
        };

        Self {
            elapsed,
            duration,
            fraction,
            indicator_left: layout.time_label_width + fraction * layout.progress_bar_width,
            elapsed_label: format_clock(Some(elapsed)),
            duration_label: format_clock(duration),
        }
    }

    pub fn percent(&self) -> f64 {
        self.fraction * 100.0
    }
}
