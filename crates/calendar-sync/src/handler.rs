//! Invocation wrapper around a sync run.
//!
//! A scheduler or Lambda trigger calls `handle`, which never fails: the
//! outcome is folded into a status-code response.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::calendar_client::GoogleCalendarSource;
use crate::config::Config;
use crate::db::{DbPool, PgEventStore};
use crate::error::SyncError;
use crate::sync::{run_sync, RunReport};
use crate::window::EventWindow;

/// Result object returned to the invoking environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl InvocationResponse {
    pub fn ok(report: &RunReport) -> Self {
        Self {
            status_code: 200,
            body: serde_json::to_string(report).ok(),
        }
    }

    /// 500 whose body carries the full error chain
    pub fn error(err: &anyhow::Error) -> Self {
        Self {
            status_code: 500,
            body: Some(serde_json::json!({ "error": format!("{:?}", err) }).to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Run one sync and report the outcome as a response.
pub async fn handle(pool: &DbPool, config: &Config, now: DateTime<Utc>) -> InvocationResponse {
    match run_once(pool, config, now).await {
        Ok(report) => InvocationResponse::ok(&report),
        Err(e) => {
            tracing::error!("Calendar sync failed: {:?}", e);
            InvocationResponse::error(&e)
        }
    }
}

/// Run one sync on a connection checked out for the duration of the call.
pub async fn run_once(
    pool: &DbPool,
    config: &Config,
    now: DateTime<Utc>,
) -> anyhow::Result<RunReport> {
    let window = EventWindow::for_now(now, config.sync.window_zone, config.sync.end_hour)?;

    // Returned to the pool when this scope ends, on success and error alike.
    let mut conn = pool
        .get()
        .await
        .map_err(SyncError::from)
        .context("Failed to get DB connection")?;
    let mut store = PgEventStore::new(&mut conn);
    let source = GoogleCalendarSource::new(config.sync.calendar_time_zone);

    let report = run_sync(
        &mut store,
        &source,
        &config.google,
        config.sync.failure_policy,
        &window,
    )
    .await
    .context("Calendar sync run failed")?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::establish_connection_pool;
    use crate::sync::UserStatus;
    use std::collections::HashMap;

    #[test]
    fn test_success_response() {
        let report = RunReport {
            total_events: 3,
            users: vec![crate::sync::UserOutcome {
                slack_user_id: "UA".to_string(),
                status: UserStatus::Synced { events: 3 },
            }],
        };

        let response = InvocationResponse::ok(&report);
        assert!(response.is_success());

        let body: serde_json::Value =
            serde_json::from_str(response.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["total_events"], 3);
        assert_eq!(body["users"][0]["slack_user_id"], "UA");
    }

    #[test]
    fn test_error_response_carries_cause_chain() {
        let err = anyhow::Error::new(SyncError::calendar("invalid_grant"))
            .context("Calendar sync run failed");

        let response = InvocationResponse::error(&err);
        assert_eq!(response.status_code, 500);
        assert!(!response.is_success());

        let body: serde_json::Value =
            serde_json::from_str(response.body.as_deref().unwrap()).unwrap();
        let error = body["error"].as_str().unwrap();
        assert!(error.starts_with("Calendar sync run failed"));
        assert!(error.contains("Calendar API error: invalid_grant"));
    }

    #[test]
    fn test_response_uses_status_code_key() {
        let response = InvocationResponse {
            status_code: 200,
            body: None,
        };
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"statusCode":200}"#
        );
    }

    #[tokio::test]
    async fn test_unreachable_database_returns_500() {
        let env = HashMap::from([
            ("GOOGLE_CLIENT_ID", "client-id"),
            ("GOOGLE_SECRET", "client-secret"),
            ("OAUTH_REDIRECT_URI", "https://example.com/oauth/callback"),
            ("DB_HOST", "127.0.0.1"),
            ("DB_PORT", "1"),
            ("DB_DATABASE", "calendar"),
            ("DB_USERNAME", "sync"),
            ("DB_PASSWORD", "secret"),
            ("DB_TLS", "false"),
            ("SYNC_WINDOW_TZ", "UTC"),
        ]);
        let config = Config::from_lookup(|key| env.get(key).map(|v| v.to_string()))
            .expect("should load config");
        let pool = establish_connection_pool(&config.database).expect("pool builds lazily");

        let response = handle(&pool, &config, Utc::now()).await;

        assert_eq!(response.status_code, 500);
        let body: serde_json::Value =
            serde_json::from_str(response.body.as_deref().unwrap()).unwrap();
        let error = body["error"].as_str().unwrap();
        assert!(error.starts_with("Failed to get DB connection"));
        assert!(error.contains("Database connection error"));
    }
}
