//! Label formatting for the overlay

use std::time::Duration;

/// Format a playback time as `MM:SS`, or `H:MM:SS` past the hour.
///
/// Unknown times render as `00:00`.
pub fn format_clock(time: Option<Duration>) -> String {
    let Some(time) = time else {
        return "00:00".to_string();
    };

    let total = time.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Format a playback rate the way the speed indicator shows it
pub fn format_speed(speed: f64) -> String {
    format!("{}x", speed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(None), "00:00");
        assert_eq!(format_clock(Some(Duration::ZERO)), "00:00");
        assert_eq!(format_clock(Some(Duration::from_secs(65))), "01:05");
        assert_eq!(format_clock(Some(Duration::from_millis(599_999))), "09:59");
        assert_eq!(format_clock(Some(Duration::from_secs(3723))), "1:02:03");
    }

    #[test]
    fn test_format_speed() {
        assert_eq!(format_speed(1.0), "1x");
        assert_eq!(format_speed(1.25), "1.25x");
        assert_eq!(format_speed(2.0), "2x");
    }
}
