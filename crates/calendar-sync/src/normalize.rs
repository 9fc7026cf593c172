//! Convert calendar API events into rows for the `events` table.

use regex::Regex;
use shared_types::{CalendarEvent, EventTime, NewEvent};
use std::sync::LazyLock;

static UTC_OFFSET_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+[0-9:]+$").expect("offset pattern is valid"));

/// Drop a trailing `+hh:mm` offset, leaving a naive local timestamp.
///
/// Only positive offsets made of ASCII digits are stripped; `Z` and negative
/// offsets pass through.
pub fn strip_utc_offset(time_with_offset: &str) -> String {
    UTC_OFFSET_SUFFIX.replace(time_with_offset, "").into_owned()
}

/// Precise timestamp when present, otherwise the all-day date verbatim
pub fn normalize_time(time: &EventTime) -> Option<String> {
    match (&time.date_time, &time.date) {
        (Some(date_time), _) => Some(strip_utc_offset(date_time)),
        (None, Some(date)) => Some(date.clone()),
        (None, None) => None,
    }
}

pub fn normalize_event(event: CalendarEvent, slack_user_id: &str) -> NewEvent {
    NewEvent {
        start_time: normalize_time(&event.start),
        end_time: normalize_time(&event.end),
        summary: event.summary,
        link: event.html_link.unwrap_or_default(),
        slack_user_id: slack_user_id.to_string(),
    }
}
