//! Storage operations a sync run needs.
//!
//! The runner only talks to this trait, so a run can be driven against
//! Postgres (`db::PgEventStore`) or an in-memory store in tests.

use shared_types::{NewEvent, SyncTarget};

use crate::error::SyncResult;

#[allow(async_fn_in_trait)]
pub trait EventStore {
    /// Remove every row from the events table.
    async fn truncate_events(&mut self) -> SyncResult<()>;

    /// Slack user ids that have an active webhook registration, in database order.
    async fn list_active_users(&mut self) -> SyncResult<Vec<String>>;

    /// Stored OAuth refresh token, `None` when the user row or token is missing.
    async fn find_refresh_token(&mut self, slack_user_id: &str) -> SyncResult<Option<String>>;

    /// Calendar, channel and team for a user, `None` when the join finds nothing.
    async fn find_sync_target(&mut self, slack_user_id: &str) -> SyncResult<Option<SyncTarget>>;

    /// Insert one normalized event. Each insert commits on its own.
    async fn insert_event(&mut self, event: &NewEvent) -> SyncResult<()>;
}
