//! Deck configuration
//!
//! Loaded from JSON; every field has a default so a partial file works.
//! The backend can be overridden through `TVDECK_BACKEND`.

use crate::playback::{Backend, EngineSettings, ProgressLayout, StreamingSettings};
use crate::seek::{SeekLevel, SeekTable};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Environment variable selecting the backend
pub const BACKEND_ENV: &str = "TVDECK_BACKEND";

/// Complete deck configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    pub backend: Backend,
    pub grid: GridConfig,
    pub overlay: OverlayConfig,
    pub playback: PlaybackConfig,
    pub scroll: ScrollConfig,
    pub streaming: StreamingSettings,
    /// Folder scanned for titles; demo titles are used when absent
    pub media_dir: Option<PathBuf>,
}

/// Card grid geometry, in pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Cards per row
    pub row_size: usize,
    pub row_height: f64,
    /// Space above the first row
    pub top_offset: f64,
    pub viewport_height: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            row_size: 5,
            row_height: 330.0,
            top_offset: 60.0,
            viewport_height: 1080.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Idle time before the overlay hides itself
    pub hide_delay_ms: u64,
    /// How long the "previous" button stays up
    pub previous_button_ms: u64,
    /// How long the "next" button stays up
    pub next_button_ms: u64,
    /// Progress at which the "next" button appears
    pub almost_finished_percent: f64,
    pub time_label_width: f64,
    pub progress_bar_width: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            hide_delay_ms: 5_000,
            previous_button_ms: 15_000,
            next_button_ms: 30_000,
            almost_finished_percent: 90.0,
            time_label_width: 80.0,
            progress_bar_width: 1760.0,
        }
    }
}

impl OverlayConfig {
    pub fn hide_delay(&self) -> Duration {
        Duration::from_millis(self.hide_delay_ms)
    }

    pub fn layout(&self) -> ProgressLayout {
        ProgressLayout {
            time_label_width: self.time_label_width,
            progress_bar_width: self.progress_bar_width,
        }
    }
}

/// One seek level as written in the configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeekLevelConfig {
    pub hold_ms: u64,
    pub jump_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Interval between seek steps while a seek key is held
    pub seek_tick_ms: u64,
    pub seek_levels: Vec<SeekLevelConfig>,
    /// Pause between tearing a player down and starting the next title
    pub advance_delay_ms: u64,
    /// Played for catalog entries that are not files
    pub fallback_url: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        let seek_levels = SeekTable::default()
            .levels()
            .iter()
            .map(|level| SeekLevelConfig {
                hold_ms: level.hold.as_millis() as u64,
                jump_ms: level.jump.as_millis() as u64,
            })
            .collect();

        Self {
            seek_tick_ms: 500,
            seek_levels,
            advance_delay_ms: 100,
            fallback_url: "https://storage.googleapis.com/shaka-demo-assets/angel-one/dash.mpd"
                .to_string(),
        }
    }
}

impl PlaybackConfig {
    pub fn seek_table(&self) -> Result<SeekTable> {
        SeekTable::new(
            self.seek_levels
                .iter()
                .map(|level| {
                    SeekLevel::new(
                        Duration::from_millis(level.hold_ms),
                        Duration::from_millis(level.jump_ms),
                    )
                })
                .collect(),
        )
    }

    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }
}

/// Smooth grid scrolling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub duration_ms: u64,
    /// Animation frame interval
    pub frame_ms: u64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            duration_ms: 200,
            frame_ms: 16,
        }
    }
}

impl DeckConfig {
    /// Load from a JSON file and validate
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: DeckConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        info!(path = %path.display(), backend = %config.backend, "Configuration loaded");
        Ok(config)
    }

    /// File (or defaults), then the `TVDECK_BACKEND` override
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_backend(path, std::env::var(BACKEND_ENV).ok().as_deref())
    }

    fn load_with_backend(path: Option<&Path>, backend: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.apply_backend_override(backend)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the backend when an override is given
    pub fn apply_backend_override(&mut self, value: Option<&str>) -> Result<()> {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.backend = value.trim().parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid.row_size == 0 {
            return Err(Error::InvalidConfig("grid.row_size must be at least 1".into()));
        }
        if self.grid.row_height <= 0.0 || self.grid.viewport_height <= 0.0 {
            return Err(Error::InvalidConfig(
                "grid heights must be positive".into(),
            ));
        }

        self.playback.seek_table()?;
        if self.playback.seek_tick_ms == 0 {
            return Err(Error::InvalidConfig("playback.seek_tick_ms must be positive".into()));
        }

        if self.scroll.duration_ms == 0 || self.scroll.frame_ms == 0 {
            return Err(Error::InvalidConfig("scroll durations must be positive".into()));
        }

        let overlay = &self.overlay;
        if overlay.hide_delay_ms == 0 {
            return Err(Error::InvalidConfig("overlay.hide_delay_ms must be positive".into()));
        }
        if overlay.time_label_width <= 0.0 || overlay.progress_bar_width <= 0.0 {
            return Err(Error::InvalidConfig("overlay widths must be positive".into()));
        }
        if !(overlay.almost_finished_percent > 0.0 && overlay.almost_finished_percent <= 100.0) {
            return Err(Error::InvalidConfig(format!(
                "overlay.almost_finished_percent out of range: {}",
                overlay.almost_finished_percent
            )));
        }

        Ok(())
    }

    pub fn engine_settings(&self) -> Result<EngineSettings> {
        Ok(EngineSettings {
            seek_table: self.playback.seek_table()?,
            seek_tick: Duration::from_millis(self.playback.seek_tick_ms),
            layout: self.overlay.layout(),
            almost_finished_percent: self.overlay.almost_finished_percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = DeckConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.backend, Backend::MediaElement);
        assert_eq!(config.grid.row_size, 5);
        assert_eq!(config.playback.seek_table().unwrap(), SeekTable::default());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: DeckConfig =
            serde_json::from_str(r#"{ "backend": "native", "grid": { "row_size": 4 } }"#).unwrap();

        assert_eq!(config.backend, Backend::Native);
        assert_eq!(config.grid.row_size, 4);
        assert_eq!(config.grid.row_height, 330.0);
        assert_eq!(config.overlay.hide_delay_ms, 5_000);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = DeckConfig::default();
        config.grid.row_size = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = DeckConfig::default();
        config.playback.seek_levels = vec![
            SeekLevelConfig { hold_ms: 3000, jump_ms: 60_000 },
            SeekLevelConfig { hold_ms: 0, jump_ms: 10_000 },
        ];
        assert!(config.validate().is_err());

        let mut config = DeckConfig::default();
        config.overlay.almost_finished_percent = 120.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backend_override() {
        let mut config = DeckConfig::default();
        config.apply_backend_override(Some("avplayer")).unwrap();
        assert_eq!(config.backend, Backend::Native);

        config.apply_backend_override(None).unwrap();
        assert_eq!(config.backend, Backend::Native);

        assert!(config.apply_backend_override(Some("flash")).is_err());
    }

    #[test]
    fn test_backend_override_applies_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "backend": "native" }}"#).unwrap();

        let config = DeckConfig::load_with_backend(Some(file.path()), Some("adaptive")).unwrap();
        assert_eq!(config.backend, Backend::Adaptive);

        let config = DeckConfig::load_with_backend(Some(file.path()), None).unwrap();
        assert_eq!(config.backend, Backend::Native);

        let config = DeckConfig::load_with_backend(None, Some("native")).unwrap();
        assert_eq!(config.backend, Backend::Native);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "overlay": {{ "hide_delay_ms": 3000 }} }}"#).unwrap();

        let config = DeckConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.overlay.hide_delay(), Duration::from_millis(3000));
    }
}
