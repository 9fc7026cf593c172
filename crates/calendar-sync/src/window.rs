//! Fetch window for a sync run.
//!
//! The window starts at 09:00:00.000 today and ends at `end_hour`:59:59.999
//! counted from today's midnight, so hours past 23 roll over into the next
//! day. With the default end hour of 32 the window closes at 08:59:59.999
//! tomorrow.

use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{SyncError, SyncResult};

const START_HOUR: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl EventWindow {
    /// Build the window for the calendar day `now` falls on, in `now`'s zone.
    pub fn for_day<Z: TimeZone>(now: &DateTime<Z>, end_hour: u32) -> SyncResult<Self> {
        let today = now.date_naive();

        let start_naive = today
            .and_hms_milli_opt(START_HOUR, 0, 0, 0)
            .ok_or_else(|| SyncError::InvalidWindow(format!("no 09:00 on {}", today)))?;

        let midnight = today
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| SyncError::InvalidWindow(format!("no midnight on {}", today)))?;
        let end_naive = midnight
            + Duration::hours(i64::from(end_hour))
            + Duration::minutes(59)
            + Duration::seconds(59)
            + Duration::milliseconds(999);

        let zone = now.timezone();
        Ok(Self {
            start: resolve_local(&zone, start_naive)?,
            end: resolve_local(&zone, end_naive)?,
        })
    }

    /// Build today's window in `zone`, or in the host's local zone when unset.
    pub fn for_now(now: DateTime<Utc>, zone: Option<Tz>, end_hour: u32) -> SyncResult<Self> {
        match zone {
            Some(tz) => Self::for_day(&now.with_timezone(&tz), end_hour),
            None => Self::for_day(&now.with_timezone(&Local), end_hour),
        }
    }
}

fn resolve_local<Z: TimeZone>(zone: &Z, naive: NaiveDateTime) -> SyncResult<DateTime<Utc>> {
    zone.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| SyncError::InvalidWindow(format!("{} does not exist locally", naive)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_default_end_hour_rolls_into_next_day() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 14, 30, 0).unwrap();
        let window = EventWindow::for_day(&now, 32).unwrap();

        assert_eq!(window.start.to_rfc3339(), "2024-05-01T09:00:00+00:00");
        assert_eq!(
            window.end,
            Utc.with_ymd_and_hms(2024, 5, 2, 8, 59, 59).unwrap() + Duration::milliseconds(999)
        );
    }

    #[test]
    fn test_end_hour_23_stays_on_same_day() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 1).unwrap();
        let window = EventWindow::for_day(&now, 23).unwrap();

        assert_eq!(
            window.end,
            Utc.with_ymd_and_hms(2024, 5, 1, 23, 59, 59).unwrap() + Duration::milliseconds(999)
        );
    }

    #[test]
    fn test_window_uses_local_calendar_day() {
        // 2024-04-30T20:00Z is already May 1st in Seoul.
        let seoul = FixedOffset::east_opt(9 * 3600).unwrap();
        let now = Utc
            .with_ymd_and_hms(2024, 4, 30, 20, 0, 0)
            .unwrap()
            .with_timezone(&seoul);
        let window = EventWindow::for_day(&now, 32).unwrap();

        assert_eq!(window.start.to_rfc3339(), "2024-05-01T00:00:00+00:00");
        assert_eq!(
            window.end,
            Utc.with_ymd_and_hms(2024, 5, 1, 23, 59, 59).unwrap() + Duration::milliseconds(999)
        );
    }

    #[test]
    fn test_for_now_with_named_zone() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 3, 0, 0).unwrap();
        let window = EventWindow::for_now(now, Some(chrono_tz::Asia::Seoul), 32).unwrap();

        assert_eq!(window.start.to_rfc3339(), "2024-05-01T00:00:00+00:00");
        assert!(window.end > window.start);
    }
}
