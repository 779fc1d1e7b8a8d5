use anaya_candles_server::{
    app,
    auth::{
        AppState, OidcClient,
        db::{MemoryUserStore, PgUserStore, UserStore},
    },
    config::ServerConfig,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let users: Arc<dyn UserStore> = match &config.database_url {
        Some(database_url) => {
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await
                .expect("failed to connect to database");

            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&db_pool)
                .await
                .expect("failed to run migrations");

            Arc::new(PgUserStore::new(db_pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; users are kept in memory and lost on restart");
            Arc::new(MemoryUserStore::new())
        }
    };

    let oidc_client = match config.oidc.clone() {
        Some(oidc_config) => {
            tracing::info!("Discovering OIDC provider...");
            Some(
                OidcClient::discover(oidc_config)
                    .await
                    .expect("failed to discover OIDC provider"),
            )
        }
        None => {
            tracing::info!("OIDC not configured; federated login disabled");
            None
        }
    };

    let app_state = Arc::new(AppState::from_config(&config, users, oidc_client));
    let app = app::router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.listen_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    tracing::info!("shutting down");
}
