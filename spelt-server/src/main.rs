use std::sync::Arc;
use tokio::signal;
use tracing::info;

use spelt_core::SystemClock;
use spelt_persistence::{ScoreRepository, connect_and_migrate};
use spelt_server::{
    auth::AuthService, config::Config, create_routes, leaderboard::LeaderboardService,
    session_settings::SessionSettings, websocket::ConnectionManager,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    info!("Starting Spelt server...");

    let config = Config::new();

    let settings = match SessionSettings::from_config(&config) {
        Ok(settings) => {
            info!("Loaded {} words", settings.catalog.len());
            Arc::new(settings)
        }
        Err(e) => {
            tracing::error!("Failed to load word catalog: {:#}", e);
            std::process::exit(1);
        }
    };

    let db = match connect_and_migrate(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to connect to database and run migrations: {}", e);
            std::process::exit(1);
        }
    };

    let leaderboard = Arc::new(LeaderboardService::new(
        Arc::new(ScoreRepository::new(db)),
        Arc::new(SystemClock),
        config.scoring_day(),
        config.leaderboard_policy(),
    ));
    leaderboard.spawn_refresh_task(config.leaderboard_refresh_period());
    leaderboard.spawn_cleanup_task(config.leaderboard_cleanup_period());

    let auth_service = Arc::new(if config.auth_dev_mode {
        AuthService::new_dev_mode()
    } else {
        AuthService::new(config.google_client_id.clone())
    });
    if auth_service.is_dev_mode() {
        tracing::warn!("Development authentication mode - token signatures are not checked");
    }

    let connection_manager = Arc::new(ConnectionManager::new());
    let routes = create_routes(connection_manager, auth_service, leaderboard, settings);

    let ip = match config.host.parse::<std::net::IpAddr>() {
        Ok(ip) => ip,
        Err(e) => {
            tracing::error!("Invalid HOST '{}': {}", config.host, e);
            std::process::exit(1);
        }
    };

    info!("Server starting on {}:{}", config.host, config.port);

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown((ip, config.port), async {
        // Wait for SIGINT (Ctrl+C) or SIGTERM
        #[cfg(unix)]
        {
            let mut sigint = match signal::unix::signal(signal::unix::SignalKind::interrupt()) {
                Ok(signal) => signal,
                Err(e) => {
                    tracing::error!("Failed to listen for SIGINT: {}", e);
                    return;
                }
            };
            let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(e) => {
                    tracing::error!("Failed to listen for SIGTERM: {}", e);
                    return;
                }
            };

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!("Failed to listen for ctrl+c: {}", e);
                return;
            }
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    });

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}
