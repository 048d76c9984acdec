use chrono::{DateTime, Timelike};
use chrono_tz::Tz;
use pulsebar_proto::config::{ClockModuleConfig, TextStyle};

use crate::render::StyledSpan;

/// Compose the display text for a zoned time, along with size spans for
/// segments configured as [`TextStyle::Small`].
///
/// Segments are independent: day-of-week, the time itself, and the AM/PM
/// marker each follow their own style. The marker is only meaningful in
/// 12-hour mode and is suppressed entirely in 24-hour mode.
pub(super) fn compose(
    datetime: &DateTime<Tz>,
    config: &ClockModuleConfig,
) -> (String, Vec<StyledSpan>) {
    let mut text = String::new();
    let mut spans = Vec::new();

    if config.day_of_week_style != TextStyle::Gone {
        let day = datetime.format("%a").to_string();
        if config.day_of_week_style == TextStyle::Small {
            spans.push(StyledSpan::reduced(0..day.len()));
        }
        text.push_str(&day);
        text.push(' ');
    }

    if config.is_24_hour {
        text.push_str(&format!("{:02}:{:02}", datetime.hour(), datetime.minute()));
    } else {
        let (is_pm, hour12) = datetime.hour12();
        text.push_str(&format!("{}:{:02}", hour12, datetime.minute()));

        if config.am_pm_style != TextStyle::Gone {
            text.push(' ');
            let start = text.len();
            text.push_str(if is_pm { "PM" } else { "AM" });
            if config.am_pm_style == TextStyle::Small {
                spans.push(StyledSpan::reduced(start..text.len()));
            }
        }
    }

    (text, spans)
}
