use std::sync::Arc;

use letmeask::{
    config::Config,
    store::{MemoryStore, RemoteStore, SqliteStore},
    AppState,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore as SessionStore, SessionManagerLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "letmeask=debug,tower_http=debug,info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();

    let default_filter = config
        .as_ref()
        .ok()
        .and_then(|config| config.log_filter.clone())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned());
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .init();

    let config = config.inspect(|config| info!("configuration loaded: {config:?}")).unwrap_or_else(|e| {
        error!("failed to load configuration: {e}");
        warn!("using default configuration");
        Config::default()
    });

    let store: Arc<dyn RemoteStore> = match &config.database_url {
        Some(database_url) => Arc::new(SqliteStore::connect(database_url).await?),
        None => {
            warn!("no DATABASE_URL configured, rooms are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let session_layer = SessionManagerLayer::new(SessionStore::default())
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(config.session_inactivity_minutes)));

    let app = letmeask::router()
        .with_state(AppState { store })
        .layer(session_layer)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.server_address()).await?;
    info!("letmeask listening on http://{}", config.server_address());
    axum::serve(listener, app).await?;

    Ok(())
}
