use serde::{Deserialize, Serialize};

/// Webhook registration row. A non-null `webhook_id` marks the user as an
/// active sync target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "diesel", derive(diesel::Queryable))]
pub struct Webhook {
    pub slack_user_id: String,
    pub webhook_id: Option<String>,
    pub slack_channel: String,
    pub calendar: String,
}

/// OAuth grant stored for a Slack user. `refresh_token` is null until the
/// user completes the consent flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "diesel", derive(diesel::Queryable))]
pub struct User {
    pub slack_user_id: String,
    pub slack_team_id: String,
    pub refresh_token: Option<String>,
}

/// Row for the `events` table. Rows are fully replaced on every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub summary: Option<String>,
    /// Empty string when the calendar did not supply a link, never null
    pub link: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub slack_user_id: String,
}

/// Where a user's events come from, resolved by joining `webhooks` and `users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "diesel", derive(diesel::Queryable))]
pub struct SyncTarget {
    pub slack_user_id: String,
    pub calendar_id: String,
    pub slack_channel: String,
    pub slack_team_id: String,
}

/// Time of a calendar event as returned on the wire. Timed events carry an
/// RFC 3339 `date_time`; all-day events carry only a `YYYY-MM-DD` `date`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTime {
    pub date_time: Option<String>,
    pub date: Option<String>,
}

/// Event fetched from the calendar API, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub summary: Option<String>,
    pub html_link: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
}

impl EventTime {
    pub fn timed(date_time: impl Into<String>) -> Self {
        Self {
            date_time: Some(date_time.into()),
            date: None,
        }
    }

    pub fn all_day(date: impl Into<String>) -> Self {
        Self {
            date_time: None,
            date: Some(date.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_time_constructors() {
        let timed = EventTime::timed("2024-05-01T10:00:00+09:00");
        assert_eq!(timed.date_time.as_deref(), Some("2024-05-01T10:00:00+09:00"));
        assert_eq!(timed.date, None);

        let all_day = EventTime::all_day("2024-05-01");
        assert_eq!(all_day.date.as_deref(), Some("2024-05-01"));
        assert_eq!(all_day.date_time, None);
    }

    #[test]
    fn test_new_event_serde() {
        let event = NewEvent {
            summary: Some("Standup".to_string()),
            link: String::new(),
            start_time: Some("2024-05-01T10:00:00".to_string()),
            end_time: Some("2024-05-01T10:15:00".to_string()),
            slack_user_id: "U123".to_string(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["link"], "");
        assert_eq!(json["slack_user_id"], "U123");

        let parsed: NewEvent = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, event);
    }
}
