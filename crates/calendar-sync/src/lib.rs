//! Daily calendar sync job.
//!
//! Reloads the shared `events` table with today's Google Calendar events for
//! every Slack user that has an active webhook registration.

pub mod calendar_client;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod normalize;
mod schema;
pub mod session;
pub mod store;
pub mod sync;
pub mod window;
