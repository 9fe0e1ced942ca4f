//! Rendering of requested access windows.

use chrono_tz::Tz;

use crate::domain::RequestTiming;
use crate::util::{duration::format_duration, timezone::format_timestamp};

/// Render a timing as `"{duration} starting {when}"`; absent timings render empty.
pub fn render_timing(timing: Option<&RequestTiming>, tz: Tz) -> String {
    let Some(timing) = timing else {
        return String::new();
    };

    let duration = format_duration(timing.duration_seconds);
    match timing.start_time {
        Some(start) => format!("{duration} starting {}", format_timestamp(start, tz)),
        None => format!("{duration} starting immediately"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn immediate_window() {
        let timing = RequestTiming {
            duration_seconds: 3_600,
            start_time: None,
        };
        assert_eq!(
            render_timing(Some(&timing), Tz::UTC),
            "1 hour starting immediately"
        );
    }

    #[test]
    fn scheduled_window_uses_display_zone() {
        let timing = RequestTiming {
            duration_seconds: 1_800,
            start_time: Some(datetime!(2024-05-02 08:30:00 UTC)),
        };
        assert_eq!(
            render_timing(Some(&timing), Tz::UTC),
            "30 minutes starting 2024/05/02 08:30:00"
        );
    }

    #[test]
    fn absent_timing_is_blank() {
        assert_eq!(render_timing(None, Tz::UTC), "");
    }
}
