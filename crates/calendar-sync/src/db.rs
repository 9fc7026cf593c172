use diesel::prelude::*;
use diesel_async::{
    pooled_connection::{deadpool::Pool, AsyncDieselConnectionManager, ManagerConfig},
    AsyncPgConnection, RunQueryDsl,
};
use shared_types::{NewEvent, SyncTarget, User, Webhook};

use crate::config::DatabaseConfig;
use crate::error::SyncResult;
use crate::store::EventStore;

pub type DbPool = Pool<AsyncPgConnection>;

async fn establish_tls_connection(config: String) -> diesel::ConnectionResult<AsyncPgConnection> {
    // Set up rustls TLS configuration
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

    let (client, connection) = tokio_postgres::connect(&config, tls)
        .await
        .map_err(|e| diesel::ConnectionError::BadConnection(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Connection error: {}", e);
        }
    });

    AsyncPgConnection::try_from(client).await
}

/// Build the connection pool. No connection is opened until the first checkout.
pub fn establish_connection_pool(config: &DatabaseConfig) -> anyhow::Result<DbPool> {
    let database_url = config.connection_url();

    let manager = if config.tls {
        let mut manager_config = ManagerConfig::default();
        manager_config.custom_setup =
            Box::new(|url| Box::pin(establish_tls_connection(url.to_string())));
        AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(
            database_url,
            manager_config,
        )
    } else {
        AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url)
    };

    let pool = Pool::builder(manager).max_size(config.pool_size).build()?;

    tracing::debug!(
        "Database pool configured for {}:{}/{} (tls: {})",
        config.host,
        config.port,
        config.database,
        config.tls
    );

    Ok(pool)
}

/// `EventStore` backed by one checked-out Postgres connection
pub struct PgEventStore<'a> {
    conn: &'a mut AsyncPgConnection,
}

impl<'a> PgEventStore<'a> {
    pub fn new(conn: &'a mut AsyncPgConnection) -> Self {
        Self { conn }
    }
}

impl EventStore for PgEventStore<'_> {
    async fn truncate_events(&mut self) -> SyncResult<()> {
        diesel::sql_query("TRUNCATE TABLE events")
            .execute(self.conn)
            .await?;

        Ok(())
    }

    async fn list_active_users(&mut self) -> SyncResult<Vec<String>> {
        use crate::schema::webhooks::dsl::*;

        let active = webhooks
            .filter(webhook_id.is_not_null())
            .load::<Webhook>(self.conn)
            .await?;

        Ok(active.into_iter().map(|w| w.slack_user_id).collect())
    }

    async fn find_refresh_token(&mut self, user_id: &str) -> SyncResult<Option<String>> {
        use crate::schema::users::dsl::*;

        let user = users
            .filter(slack_user_id.eq(user_id))
            .first::<User>(self.conn)
            .await
            .optional()?;

        Ok(user.and_then(|u| u.refresh_token))
    }

    async fn find_sync_target(&mut self, user_id: &str) -> SyncResult<Option<SyncTarget>> {
        use crate::schema::{users, webhooks};

        let target = webhooks::table
            .inner_join(users::table)
            .filter(webhooks::slack_user_id.eq(user_id))
            .select((
                webhooks::slack_user_id,
                webhooks::calendar,
                webhooks::slack_channel,
                users::slack_team_id,
            ))
            .first::<SyncTarget>(self.conn)
            .await
            .optional()?;

        Ok(target)
    }

    async fn insert_event(&mut self, event: &NewEvent) -> SyncResult<()> {
        use crate::schema::events::dsl::*;

        diesel::insert_into(events)
            .values((
                summary.eq(&event.summary),
                link.eq(&event.link),
                start_time.eq(&event.start_time),
                end_time.eq(&event.end_time),
                slack_user_id.eq(&event.slack_user_id),
            ))
            .execute(self.conn)
            .await?;

        Ok(())
    }
}
