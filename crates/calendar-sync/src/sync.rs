//! One sync run: truncate the events table, then fetch and insert every
//! active user's events for the window.
//!
//! Users are processed one after another on the caller's task. Each insert
//! commits on its own, so readers can see a partially loaded table while a
//! run is in progress, and a failed run leaves whatever was written before
//! the failure.

use serde::Serialize;
use std::str::FromStr;

use crate::calendar_client::CalendarSource;
use crate::config::GoogleConfig;
use crate::error::{SyncError, SyncResult};
use crate::normalize::normalize_event;
use crate::session::SessionConfig;
use crate::store::EventStore;
use crate::window::EventWindow;

/// What to do when one user's sync fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run at the first failing user
    #[default]
    Abort,
    /// Record the failure and continue with the next user
    Isolate,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "isolate" => Ok(FailurePolicy::Isolate),
            "abort" => Ok(FailurePolicy::Abort),
            other => Err(format!("unknown failure policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UserStatus {
    Synced { events: usize },
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserOutcome {
    pub slack_user_id: String,
    #[serde(flatten)]
    pub status: UserStatus,
}

/// Per-user results of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub total_events: usize,
    pub users: Vec<UserOutcome>,
}

impl RunReport {
    fn record(&mut self, slack_user_id: &str, status: UserStatus) {
        if let UserStatus::Synced { events } = status {
            self.total_events += events;
        }
        self.users.push(UserOutcome {
            slack_user_id: slack_user_id.to_string(),
            status,
        });
    }

    pub fn synced(&self) -> usize {
        self.count(|s| matches!(s, UserStatus::Synced { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, UserStatus::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, UserStatus::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&UserStatus) -> bool) -> usize {
        self.users.iter().filter(|u| pred(&u.status)).count()
    }
}

/// Run a full truncate-and-reload of the events table.
///
/// Truncation and user enumeration failures always abort. A user with no
/// refresh token or no webhook target is skipped. Any other per-user error
/// is handled according to `policy`.
pub async fn run_sync<S, C>(
    store: &mut S,
    source: &C,
    google: &GoogleConfig,
    policy: FailurePolicy,
    window: &EventWindow,
) -> SyncResult<RunReport>
where
    S: EventStore,
    C: CalendarSource,
{
    tracing::info!(
        "Starting calendar sync (window: {} .. {}, policy: {:?})",
        window.start,
        window.end,
        policy
    );

    store.truncate_events().await?;

    let user_ids = store.list_active_users().await?;
    tracing::info!("Found {} users with active webhooks", user_ids.len());

    let mut report = RunReport::default();

    for slack_user_id in &user_ids {
        match sync_user(store, source, google, window, slack_user_id).await {
            Ok(events) => {
                tracing::info!("Synced {} events for {}", events, slack_user_id);
                report.record(slack_user_id, UserStatus::Synced { events });
            }
            Err(e) if e.is_skippable() => {
                tracing::warn!("Skipping {}: {}", slack_user_id, e);
                report.record(
                    slack_user_id,
                    UserStatus::Skipped {
                        reason: e.to_string(),
                    },
                );
            }
            Err(e) => match policy {
                FailurePolicy::Abort => {
                    tracing::error!("Sync aborted at {}: {}", slack_user_id, e);
                    return Err(e);
                }
                FailurePolicy::Isolate => {
                    tracing::error!("Failed to sync {}: {}", slack_user_id, e);
                    report.record(
                        slack_user_id,
                        UserStatus::Failed {
                            error: e.to_string(),
                        },
                    );
                }
            },
        }
    }

    tracing::info!(
        "Calendar sync finished: {} events, {} synced, {} skipped, {} failed",
        report.total_events,
        report.synced(),
        report.skipped(),
        report.failed()
    );

    Ok(report)
}

/// Fetch and store one user's events, returning how many rows were written.
async fn sync_user<S, C>(
    store: &mut S,
    source: &C,
    google: &GoogleConfig,
    window: &EventWindow,
    slack_user_id: &str,
) -> SyncResult<usize>
where
    S: EventStore,
    C: CalendarSource,
{
    let refresh_token = store
        .find_refresh_token(slack_user_id)
        .await?
        .ok_or_else(|| SyncError::not_found(format!("Refresh token for {}", slack_user_id)))?;
    let session = SessionConfig::new(google, refresh_token);

    let target = store
        .find_sync_target(slack_user_id)
        .await?
        .ok_or_else(|| SyncError::not_found(format!("Webhook target for {}", slack_user_id)))?;

    let events = source
        .list_events(&session, &target.calendar_id, window)
        .await?;

    let mut written = 0;
    for event in events {
        let row = normalize_event(event, slack_user_id);
        store.insert_event(&row).await?;
        written += 1;
    }

    Ok(written)
}
