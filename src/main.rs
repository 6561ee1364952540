use std::sync::Arc;

use clap::Parser;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zpay_checkout::config::Config;
use zpay_checkout::db::{AppState, create_pool, init_db};
use zpay_checkout::handlers;
use zpay_checkout::jwt::SessionVerifier;

#[derive(Parser, Debug)]
#[command(name = "zpay-checkout")]
#[command(about = "Plan checkout and payment reconciliation for the Z-Pay gateway")]
struct Cli {
    /// Create the database schema and exit
    #[arg(long)]
    init_db: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zpay_checkout=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::debug!("Loaded configuration: {:?}", config);

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    if cli.init_db {
        tracing::info!("Database schema initialized at {}", config.database_path);
        return;
    }

    if config.gateway.credentials().is_err() {
        tracing::warn!("Checkout will fail until ZPAY_PID, ZPAY_KEY and APP_URL are set");
    }

    let session_verifier = match &config.auth_jwt_secret {
        Some(secret) => Some(Arc::new(SessionVerifier::new(secret, &config.auth_audience))),
        None => {
            tracing::warn!("AUTH_JWT_SECRET is not set; authenticated routes will fail");
            None
        }
    };

    let state = AppState {
        db: db_pool,
        gateway: Arc::new(config.gateway.clone()),
        session_verifier,
    };

    let app = handlers::app(state.clone(), config.rate_limit)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::new()),
        )
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("zpay-checkout listening on {}", addr);

    // Connect info feeds the per-IP rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
