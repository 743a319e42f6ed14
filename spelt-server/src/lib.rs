use std::sync::Arc;
use warp::Filter;

use crate::auth::AuthService;
use crate::leaderboard::LeaderboardService;
use crate::session_settings::SessionSettings;
use crate::websocket::ConnectionManager;

pub mod auth;
pub mod config;
pub mod leaderboard;
pub mod session_settings;
pub mod websocket;

pub fn create_routes(
    connection_manager: Arc<ConnectionManager>,
    auth_service: Arc<AuthService>,
    leaderboard: Arc<LeaderboardService>,
    settings: Arc<SessionSettings>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let connection_manager_filter = warp::any().map({
        let connection_manager = connection_manager.clone();
        move || connection_manager.clone()
    });

    let auth_filter = warp::any().map({
        let auth_service = auth_service.clone();
        move || auth_service.clone()
    });

    let leaderboard_filter = warp::any().map({
        let leaderboard = leaderboard.clone();
        move || leaderboard.clone()
    });

    let settings_filter = warp::any().map({
        let settings = settings.clone();
        move || settings.clone()
    });

    // WebSocket endpoint
    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(connection_manager_filter)
        .and(auth_filter)
        .and(leaderboard_filter.clone())
        .and(settings_filter)
        .map(|ws: warp::ws::Ws, conn_mgr, auth, leaderboard, settings| {
            ws.on_upgrade(move |socket| {
                websocket::handle_connection(socket, conn_mgr, auth, leaderboard, settings)
            })
        });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    // Cached daily leaderboard
    let leaderboard = warp::path("leaderboard")
        .and(warp::get())
        .and(leaderboard_filter)
        .map(|leaderboard: Arc<LeaderboardService>| warp::reply::json(&leaderboard.view()));

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type", "authorization"])
        .allow_methods(vec!["GET"]);

    websocket
        .or(health)
        .or(leaderboard)
        .with(cors)
        .with(warp::log("spelt"))
}
