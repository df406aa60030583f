//! Progressive seek
//!
//! A held seek key jumps further the longer it stays down. The jump for a
//! tick is looked up from a [`SeekTable`] using the hold time elapsed at
//! that tick, so a single press produces a non-decreasing series of jumps.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Seek direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekDirection {
    Forward,
    Backward,
}

impl fmt::Display for SeekDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeekDirection::Forward => write!(f, "forward"),
            SeekDirection::Backward => write!(f, "backward"),
        }
    }
}

/// One row of the seek table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeekLevel {
    /// Hold time needed to reach this level
    pub hold: Duration,
    /// Distance jumped per tick at this level
    pub jump: Duration,
}

impl SeekLevel {
    pub fn new(hold: Duration, jump: Duration) -> Self {
        Self { hold, jump }
    }
}

/// Ordered seek levels, ascending in both hold time and jump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeekTable {
    levels: Vec<SeekLevel>,
}

impl SeekTable {
    /// Build a table, rejecting empty or unsorted input
    pub fn new(levels: Vec<SeekLevel>) -> Result<Self> {
        if levels.is_empty() {
            return Err(Error::InvalidConfig("seek table is empty".into()));
        }

        for pair in levels.windows(2) {
            if pair[1].hold <= pair[0].hold || pair[1].jump < pair[0].jump {
                return Err(Error::InvalidConfig(format!(
                    "seek levels must ascend: {:?} then {:?}",
                    pair[0], pair[1]
                )));
            }
        }

        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[SeekLevel] {
        &self.levels
    }

    /// Jump for the given hold time.
    ///
    /// Picks the level with the largest threshold not above `hold`. Without
    /// an active hold (or before the first threshold) the first level wins.
    pub fn jump_for(&self, hold: Option<Duration>) -> Duration {
        let first = self.levels[0].jump;
        let Some(hold) = hold else {
            return first;
        };

        self.levels
            .iter()
            .rev()
            .find(|level| hold >= level.hold)
            .map(|level| level.jump)
            .unwrap_or(first)
    }
}

impl Default for SeekTable {
    fn default() -> Self {
        Self {
            levels: vec![
                SeekLevel::new(Duration::ZERO, Duration::from_secs(10)),
                SeekLevel::new(Duration::from_millis(3_000), Duration::from_secs(60)),
                SeekLevel::new(Duration::from_millis(6_000), Duration::from_secs(180)),
                SeekLevel::new(Duration::from_millis(9_000), Duration::from_secs(350)),
                SeekLevel::new(Duration::from_millis(12_000), Duration::from_secs(600)),
            ],
        }
    }
}

/// A held seek key. Lives from key-down to key-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekSession {
    /// Distinguishes ticks of this session from stale ticks of older ones
    pub id: u64,
    pub direction: SeekDirection,
    /// Bus time at key-down
    pub started_at: Duration,
}

impl SeekSession {
    pub fn new(id: u64, direction: SeekDirection, started_at: Duration) -> Self {
        Self {
            id,
            direction,
            started_at,
        }
    }

    /// How long the key has been held at `now`
    pub fn held_for(&self, now: Duration) -> Duration {
        now.saturating_sub(self.started_at)
    }
}

/// Compute the position a seek step lands on.
///
/// Forward targets never pass the end of the content, backward targets
/// never go below zero.
pub fn seek_target(
    direction: SeekDirection,
    position: Duration,
    jump: Duration,
    duration: Option<Duration>,
) -> Duration {
    match direction {
        SeekDirection::Forward => {
            let target = position.saturating_add(jump);
            match duration {
                Some(end) => target.min(end),
                None => target,
            }
        }
        SeekDirection::Backward => position.saturating_sub(jump),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn three_levels() -> SeekTable {
        SeekTable::new(vec![
            SeekLevel::new(ms(0), ms(10)),
            SeekLevel::new(ms(3000), ms(60)),
            SeekLevel::new(ms(6000), ms(180)),
        ])
        .unwrap()
    }

    #[test]
    fn test_jump_picks_largest_threshold_reached() {
        let table = three_levels();
        assert_eq!(table.jump_for(Some(ms(2000))), ms(10));
        assert_eq!(table.jump_for(Some(ms(4000))), ms(60));
        assert_eq!(table.jump_for(Some(ms(7000))), ms(180));
        assert_eq!(table.jump_for(Some(ms(3000))), ms(60));
    }

    #[test]
    fn test_jump_without_session_uses_first_level() {
        let table = three_levels();
        assert_eq!(table.jump_for(None), ms(10));
        assert_eq!(table.jump_for(Some(Duration::ZERO)), ms(10));
    }

    #[test]
    fn test_jump_is_monotonic_in_hold_time() {
        let table = SeekTable::default();
        let mut last = Duration::ZERO;
        for step in 0..400 {
            let jump = table.jump_for(Some(ms(step * 50)));
            assert!(jump >= last, "jump shrank at {}ms", step * 50);
            last = jump;
        }
        assert_eq!(last, Duration::from_secs(600));
    }

    #[test]
    fn test_first_threshold_above_zero_falls_back_to_first_jump() {
        let table = SeekTable::new(vec![
            SeekLevel::new(ms(500), ms(5)),
            SeekLevel::new(ms(1000), ms(20)),
        ])
        .unwrap();
        assert_eq!(table.jump_for(Some(ms(100))), ms(5));
    }

    #[test]
    fn test_rejects_unsorted_table() {
        let err = SeekTable::new(vec![
            SeekLevel::new(ms(3000), ms(60)),
            SeekLevel::new(ms(0), ms(10)),
        ]);
        assert!(matches!(err, Err(Error::InvalidConfig(_))));
        assert!(SeekTable::new(Vec::new()).is_err());
    }

    #[test]
    fn test_seek_target_clamps() {
        let end = Some(Duration::from_secs(100));
        assert_eq!(
            seek_target(SeekDirection::Forward, Duration::from_secs(95), Duration::from_secs(10), end),
            Duration::from_secs(100)
        );
        assert_eq!(
            seek_target(SeekDirection::Backward, Duration::from_secs(4), Duration::from_secs(10), end),
            Duration::ZERO
        );
        assert_eq!(
            seek_target(SeekDirection::Forward, Duration::from_secs(5), Duration::from_secs(10), None),
            Duration::from_secs(15)
        );
    }

    #[test]
    fn test_session_hold_time() {
        let session = SeekSession::new(1, SeekDirection::Forward, ms(1000));
        assert_eq!(session.held_for(ms(4500)), ms(3500));
        assert_eq!(session.held_for(ms(500)), Duration::ZERO);
    }
}
