use calendar_sync::config::Config;
use calendar_sync::db;
use calendar_sync::handler::{self, InvocationResponse};
use chrono::Utc;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let _ = rustls::crypto::ring::default_provider().install_default();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "calendar_sync=info".into()),
        )
        .with_current_span(false)
        .with_target(false)
        .with_ansi(false)
        .without_time()
        .init();

    let config = Config::from_env()?;
    // Kept for the lifetime of the execution environment; warm invocations
    // reuse its connections.
    let pool = db::establish_connection_pool(&config.database)?;

    let service = service_fn(move |event: LambdaEvent<Value>| {
        let pool = pool.clone();
        let config = config.clone();
        async move {
            tracing::info!(request_id = %event.context.request_id, "Calendar sync invoked");
            Ok::<InvocationResponse, Error>(handler::handle(&pool, &config, Utc::now()).await)
        }
    });

    lambda_runtime::run(service).await
}
