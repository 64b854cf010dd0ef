use std::sync::Arc;

use identity_service::config::IdentityConfig;
use identity_service::services::{IdentityStore, MongoStore, SessionService, TokenCodec};
use identity_service::{AppState, build_router, permission_registry};
use platform_core::error::AppError;
use platform_core::observability::logging::init_tracing;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = IdentityConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting identity service"
    );

    let mongo = MongoStore::connect(&config.mongodb.uri, &config.mongodb.database).await?;
    mongo.initialize_indexes().await?;

    let store: Arc<dyn IdentityStore> = Arc::new(mongo);
    let tokens = TokenCodec::new(&config.tokens);
    let sessions = SessionService::new(store.clone(), tokens.clone());
    let permissions = Arc::new(permission_registry());
    tracing::info!(
        catalog_size = permissions.catalog().len(),
        "Permission registry initialized"
    );

    let bind_addr = config.common.bind_addr();
    let state = AppState {
        config,
        store,
        tokens,
        sessions,
        permissions,
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(address = %bind_addr, "Listening");

    platform_core::axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
