use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tower::make::Shared;
use tracing_subscriber::EnvFilter;

use docvault::auth::session::SessionService;
use docvault::config::AppConfig;
use docvault::db;
use docvault::mailer::ResendMailer;
use docvault::provider::GoTrueProvider;
use docvault::routes;
use docvault::s3::build_client;
use docvault::state::{AppState, HostedAvatars};
use docvault::storage::S3Storage;
use docvault::store::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        database_url = %config.redacted_database_url(),
        pool_size = config.database_max_pool_size,
        server_host = %config.server_host,
        server_port = config.server_port,
        app_base_url = %config.app_base_url,
        s3_bucket = %config.s3_bucket,
        avatar_bucket = config.avatar_bucket.as_deref().unwrap_or("-"),
        email_enabled = config.resend_api_key.is_some(),
        invite_ttl_days = config.invite_ttl_days,
        "loaded configuration"
    );

    let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
    let applied = db::run_migrations(&pool)?;
    tracing::info!(applied, "database migrations up to date");

    let s3_client = build_client(&config).await?;
    let storage = Arc::new(S3Storage::new(s3_client.clone(), config.s3_bucket.clone()));
    let avatars = match (config.avatar_bucket.clone(), config.avatar_base_url()) {
        (Some(bucket), Some(public_base_url)) => Some(HostedAvatars {
            storage: Arc::new(S3Storage::new(s3_client, bucket)),
            public_base_url,
        }),
        _ => None,
    };
    let mailer = config
        .resend_api_key
        .clone()
        .map(|key| Arc::new(ResendMailer::new(key)));
    let provider = Arc::new(GoTrueProvider::from_config(&config));
    let sessions = SessionService::from_config(&config)?;
    let store = Arc::new(PgStore::new(pool));

    let listen_addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;

    let mut state = AppState::new(config, store, storage, provider, sessions);
    if let Some(avatars) = avatars {
        state = state.with_avatars(avatars);
    }
    if let Some(mailer) = mailer {
        state = state.with_mailer(mailer);
    }

    let router = routes::create_router(state);
    let listener = TcpListener::bind(listen_addr).await?;
    tracing::info!("listening on {}", listen_addr);

    axum::serve(listener, Shared::new(router))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
