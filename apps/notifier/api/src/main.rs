use axum::{Router, extract::State, response::IntoResponse, routing::get};
use axum_helpers::server::{
    ShutdownCoordinator, create_app, create_router, health_router, run_health_checks,
};
use axum_helpers::JwtAuth;
use core_config::tracing::{init_tracing, install_color_eyre};
use database::postgres::{DatabaseConnection, check_health};
use domain_notifications::{ApiDoc, NotificationService, Repositories, handlers};
use migration::Migrator;
use std::sync::Arc;
use tracing::info;

mod config;

use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    database::postgres::run_migrations::<Migrator>(&db, env!("CARGO_PKG_NAME"))
        .await
        .map_err(|e| eyre::eyre!("Migrations failed: {}", e))?;

    let service = NotificationService::new(Repositories::postgres(db.clone()), config.notifications)
        .map_err(|e| eyre::eyre!("Failed to build notification service: {}", e))?;

    let coordinator = ShutdownCoordinator::new();

    // Delayed trigger dispatches run until the shutdown signal.
    let worker = service.worker();
    let worker_shutdown = coordinator.subscribe();
    let worker_handle = tokio::spawn(async move { worker.run(worker_shutdown).await });

    let api_routes = Router::new().nest(
        "/notifications",
        handlers::router(Arc::new(service), JwtAuth::new(&config.jwt)),
    );

    let router = create_router::<ApiDoc>(api_routes)?;

    // - /health: liveness with app name/version
    // - /ready: readiness with a database round trip
    let app = router
        .merge(health_router(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")))
        .merge(
            Router::new()
                .route("/ready", get(ready))
                .with_state(db.clone()),
        );

    info!("Starting notifier API");

    create_app(app, &config.server, coordinator)
        .await
        .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    if let Err(e) = worker_handle.await {
        tracing::error!("Delayed dispatch worker panicked: {}", e);
    }

    match db.close().await {
        Ok(_) => info!("PostgreSQL connection closed successfully"),
        Err(e) => tracing::error!("Error closing PostgreSQL: {}", e),
    }

    info!("Notifier API shutdown complete");
    Ok(())
}

async fn ready(State(db): State<DatabaseConnection>) -> impl IntoResponse {
    run_health_checks(vec![(
        "database",
        Box::pin(async move { check_health(&db).await.map_err(|e| e.to_string()) }),
    )])
    .await
}
