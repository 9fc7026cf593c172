//! Google Calendar API client for listing a user's events.

use chrono::SecondsFormat;
use chrono_tz::Tz;
use google_calendar3::api::{Event, EventDateTime};
use google_calendar3::hyper_rustls::HttpsConnector;
use google_calendar3::CalendarHub;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use shared_types::{CalendarEvent, EventTime};

use crate::error::{SyncError, SyncResult};
use crate::session::SessionConfig;
use crate::window::EventWindow;

/// Source of calendar events for a sync run
#[allow(async_fn_in_trait)]
pub trait CalendarSource {
    /// List single (expanded) events in `window`, ordered by start time.
    async fn list_events(
        &self,
        session: &SessionConfig,
        calendar_id: &str,
        window: &EventWindow,
    ) -> SyncResult<Vec<CalendarEvent>>;
}

/// Client for the Google Calendar `events.list` endpoint
pub struct GoogleCalendarSource {
    time_zone: Tz,
}

impl GoogleCalendarSource {
    /// `time_zone` is sent with every request and used to render event times.
    pub fn new(time_zone: Tz) -> Self {
        Self { time_zone }
    }

    /// Create a hub whose authenticator trades the stored refresh token for
    /// access tokens on demand
    async fn hub(
        &self,
        session: &SessionConfig,
    ) -> SyncResult<CalendarHub<HttpsConnector<HttpConnector>>> {
        // Use the yup_oauth2 re-exported by google_calendar3 to avoid version mismatch
        let secret = google_calendar3::yup_oauth2::authorized_user::AuthorizedUserSecret {
            client_id: session.client_id.clone(),
            client_secret: session.client_secret.clone(),
            refresh_token: session.refresh_token.clone(),
            key_type: "authorized_user".to_string(),
        };

        let auth = google_calendar3::yup_oauth2::AuthorizedUserAuthenticator::builder(secret)
            .build()
            .await
            .map_err(|e| {
                SyncError::calendar(format!(
                    "Failed to build authenticator from refresh token: {}",
                    e
                ))
            })?;

        let connector = google_calendar3::hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|e| SyncError::calendar(format!("Failed to load native TLS roots: {}", e)))?
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(CalendarHub::new(client, auth))
    }
}

impl CalendarSource for GoogleCalendarSource {
    async fn list_events(
        &self,
        session: &SessionConfig,
        calendar_id: &str,
        window: &EventWindow,
    ) -> SyncResult<Vec<CalendarEvent>> {
        let hub = self.hub(session).await?;

        // Only the first page is read.
        let (_, events) = hub
            .events()
            .list(calendar_id)
            .time_min(window.start)
            .time_max(window.end)
            .single_events(true)
            .order_by("startTime")
            .time_zone(self.time_zone.name())
            .doit()
            .await
            .map_err(|e| {
                SyncError::calendar(format!("Failed to list events for {}: {}", calendar_id, e))
            })?;

        if events.next_page_token.is_some() {
            tracing::warn!(
                "Calendar {} has more events than one page; the rest are ignored",
                calendar_id
            );
        }

        Ok(events
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|event| convert_event(event, self.time_zone))
            .collect())
    }
}

/// Render a parsed API event back into its wire form for `zone`.
fn convert_event(event: Event, zone: Tz) -> CalendarEvent {
    CalendarEvent {
        start: convert_time(event.start.as_ref(), zone),
        end: convert_time(event.end.as_ref(), zone),
        summary: event.summary,
        html_link: event.html_link,
    }
}

fn convert_time(time: Option<&EventDateTime>, zone: Tz) -> EventTime {
    match time {
        Some(time) => EventTime {
            date_time: time.date_time.map(|dt| {
                dt.with_timezone(&zone)
                    .to_rfc3339_opts(SecondsFormat::AutoSi, false)
            }),
            date: time.date.map(|d| d.format("%Y-%m-%d").to_string()),
        },
        None => EventTime::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn test_timed_event_rendered_in_request_zone() {
        let event = Event {
            summary: Some("Standup".to_string()),
            html_link: Some("https://www.google.com/calendar/event?eid=1".to_string()),
            start: Some(EventDateTime {
                date_time: Some(Utc.with_ymd_and_hms(2024, 5, 1, 1, 0, 0).unwrap()),
                ..Default::default()
            }),
            end: Some(EventDateTime {
                date_time: Some(Utc.with_ymd_and_hms(2024, 5, 1, 1, 15, 0).unwrap()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let converted = convert_event(event, chrono_tz::Asia::Seoul);
        assert_eq!(
            converted.start.date_time.as_deref(),
            Some("2024-05-01T10:00:00+09:00")
        );
        assert_eq!(
            converted.end.date_time.as_deref(),
            Some("2024-05-01T10:15:00+09:00")
        );
        assert_eq!(converted.summary.as_deref(), Some("Standup"));
    }

    #[test]
    fn test_all_day_event_keeps_date() {
        let event = Event {
            summary: Some("Holiday".to_string()),
            start: Some(EventDateTime {
                date: NaiveDate::from_ymd_opt(2024, 5, 1),
                ..Default::default()
            }),
            end: Some(EventDateTime {
                date: NaiveDate::from_ymd_opt(2024, 5, 2),
                ..Default::default()
            }),
            ..Default::default()
        };

        let converted = convert_event(event, chrono_tz::Asia::Seoul);
        assert_eq!(converted.start, EventTime::all_day("2024-05-01"));
        assert_eq!(converted.end, EventTime::all_day("2024-05-02"));
        assert_eq!(converted.html_link, None);
    }

    #[test]
    fn test_missing_times_are_empty() {
        let converted = convert_event(Event::default(), chrono_tz::Asia::Seoul);
        assert_eq!(converted.start, EventTime::default());
        assert_eq!(converted.end, EventTime::default());
    }
}
