use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use std::time::Duration;

use crate::sync::FailurePolicy;

/// Zone the calendar API renders event times in
pub const DEFAULT_CALENDAR_TIME_ZONE: Tz = chrono_tz::Asia::Seoul;

/// Hour field used for the end of the fetch window. 32 rolls over to
/// 08:59:59.999 on the next day.
pub const DEFAULT_END_HOUR: u32 = 32;

#[derive(Debug, Clone)]
pub struct Config {
    pub google: GoogleConfig,
    pub database: DatabaseConfig,
    pub sync: SyncSettings,
}

/// OAuth client registration shared by every user session
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub database: String,
    pub username: String,
    pub password: String,
    pub port: u16,
    /// Connect through rustls (default: true)
    pub tls: bool,
    pub pool_size: usize,
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Zone sent to the calendar API (default: Asia/Seoul)
    pub calendar_time_zone: Tz,
    /// Zone used to build the fetch window; host local time when unset
    pub window_zone: Option<Tz>,
    /// Hour field of the window end, counted from today's midnight
    pub end_hour: u32,
    pub failure_policy: FailurePolicy,
    /// How often the `poll` command runs a sync (default: 1 day)
    pub interval: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            calendar_time_zone: DEFAULT_CALENDAR_TIME_ZONE,
            window_zone: None,
            end_hour: DEFAULT_END_HOUR,
            failure_policy: FailurePolicy::default(),
            interval: Duration::from_secs(86400),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key).ok_or_else(|| anyhow!("{} environment variable must be set", key))
        };

        let google = GoogleConfig {
            client_id: required("GOOGLE_CLIENT_ID")?,
            client_secret: required("GOOGLE_SECRET")?,
            redirect_uri: required("OAUTH_REDIRECT_URI")?,
        };

        let database = DatabaseConfig {
            host: required("DB_HOST")?,
            database: required("DB_DATABASE")?,
            username: required("DB_USERNAME")?,
            password: required("DB_PASSWORD")?,
            port: lookup("DB_PORT")
                .unwrap_or_else(|| "5432".to_string())
                .parse()
                .context("DB_PORT must be a valid port number")?,
            tls: parse_bool(lookup("DB_TLS").as_deref(), true).context("DB_TLS must be a boolean")?,
            pool_size: lookup("DB_POOL_SIZE")
                .unwrap_or_else(|| "4".to_string())
                .parse()
                .context("DB_POOL_SIZE must be a valid number")?,
        };

        let calendar_time_zone = match lookup("CALENDAR_TIME_ZONE") {
            Some(name) => parse_zone(&name).context("CALENDAR_TIME_ZONE is not a known zone")?,
            None => DEFAULT_CALENDAR_TIME_ZONE,
        };

        let window_zone = lookup("SYNC_WINDOW_TZ")
            .map(|name| parse_zone(&name))
            .transpose()
            .context("SYNC_WINDOW_TZ is not a known zone")?;

        let end_hour: u32 = lookup("SYNC_END_HOUR")
            .unwrap_or_else(|| DEFAULT_END_HOUR.to_string())
            .parse()
            .context("SYNC_END_HOUR must be a valid number")?;
        if end_hour > 47 {
            anyhow::bail!("SYNC_END_HOUR must be between 0 and 47, got {}", end_hour);
        }

        let failure_policy = match lookup("SYNC_FAILURE_POLICY") {
            Some(value) => value
                .parse()
                .map_err(|e: String| anyhow!(e))
                .context("SYNC_FAILURE_POLICY must be 'isolate' or 'abort'")?,
            None => FailurePolicy::default(),
        };

        let interval_secs: u64 = lookup("SYNC_INTERVAL_SECS")
            .unwrap_or_else(|| "86400".to_string())
            .parse()
            .context("SYNC_INTERVAL_SECS must be a valid number")?;

        Ok(Self {
            google,
            database,
            sync: SyncSettings {
                calendar_time_zone,
                window_zone,
                end_hour,
                failure_policy,
                interval: Duration::from_secs(interval_secs),
            },
        })
    }
}

impl DatabaseConfig {
    /// Postgres connection URL with credentials percent-encoded
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            urlencoding::encode(&self.username),
            urlencoding::encode(&self.password),
            self.host,
            self.port,
            self.database
        )
    }
}

fn parse_zone(name: &str) -> Result<Tz> {
    name.parse::<Tz>().map_err(|e| anyhow!("{}: {}", name, e))
}

fn parse_bool(value: Option<&str>, default: bool) -> Result<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => anyhow::bail!("'{}' is not a boolean", other),
        },
    }
}
