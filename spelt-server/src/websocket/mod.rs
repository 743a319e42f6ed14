use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{error, info, warn};
use warp::ws::{Message, WebSocket};

use crate::auth::AuthService;
use crate::leaderboard::LeaderboardService;
use crate::session_settings::SessionSettings;
use spelt_types::{ClientMessage, RequestError, ServerMessage};

pub mod connection;
pub mod handlers;
pub mod rate_limiter;


use connection::ConnectionId;
pub use connection::ConnectionManager;
use handlers::MessageHandler;
use rate_limiter::RateLimiter;

pub async fn handle_connection(
    websocket: WebSocket,
    connection_manager: Arc<ConnectionManager>,
    auth_service: Arc<AuthService>,
    leaderboard: Arc<LeaderboardService>,
    settings: Arc<SessionSettings>,
) {
    let connection_id = ConnectionId::new();

    let (mut ws_sender, mut ws_receiver) = websocket.split();
    let mut rate_limiter =
        RateLimiter::new_with_limits(settings.rate_limit_burst, settings.rate_limit_refill);
    let idle_timeout = settings.connection_timeout;

    let (sender, mut outgoing) = connection_manager.create_connection(connection_id).await;
    info!(
        "New WebSocket connection: {} ({} open)",
        connection_id,
        connection_manager.connection_count().await
    );
    let mut message_handler = MessageHandler::new(
        connection_id,
        connection_manager.clone(),
        auth_service,
        leaderboard.clone(),
        settings,
        sender,
    );

    let mut leaderboard_updates = leaderboard.subscribe();
    let current = leaderboard_updates.borrow_and_update().clone();
    if let Err(e) = message_handler.send_leaderboard(current).await {
        warn!("Failed to queue leaderboard for {}: {}", connection_id, e);
    }

    let mut leaderboard_open = true;
    let mut last_activity = tokio::time::Instant::now();

    loop {
        let deadline = message_handler.next_deadline();

        tokio::select! {
            incoming = ws_receiver.next() => {
                match incoming {
                    Some(Ok(msg)) => {
                        last_activity = tokio::time::Instant::now();
                        if msg.is_close() {
                            break;
                        }
                        if let Err(e) =
                            handle_message(msg, &mut rate_limiter, &mut message_handler, connection_id)
                                .await
                        {
                            error!("Error handling message for {}: {}", connection_id, e);
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", connection_id, e);
                        break;
                    }
                    None => break,
                }
            }
            Some(message) = outgoing.recv() => {
                if let Err(e) = send_server_message(&mut ws_sender, &message).await {
                    warn!("Failed to send message to {}: {:?}", connection_id, e);
                    break;
                }
            }
            _ = sleep_until_deadline(deadline) => {
                if let Err(e) = message_handler.poll_session(std::time::Instant::now()).await {
                    error!("Failed to advance session for {}: {}", connection_id, e);
                    break;
                }
            }
            changed = leaderboard_updates.changed(), if leaderboard_open => {
                match changed {
                    Ok(()) => {
                        let view = leaderboard_updates.borrow_and_update().clone();
                        if let Err(e) = message_handler.send_leaderboard(view).await {
                            warn!("Failed to queue leaderboard for {}: {}", connection_id, e);
                        }
                    }
                    Err(_) => leaderboard_open = false,
                }
            }
            _ = tokio::time::sleep_until(last_activity + idle_timeout) => {
                info!("Connection {} idle for {:?}, closing", connection_id, idle_timeout);
                break;
            }
        }
    }

    message_handler.handle_disconnect().await;
    let removed = connection_manager.remove_connection(connection_id).await;

    // Deliver whatever was queued before closing, e.g. a rate limit error
    while let Ok(message) = outgoing.try_recv() {
        if send_server_message(&mut ws_sender, &message).await.is_err() {
            break;
        }
    }
    let _ = ws_sender.close().await;

    let duration = removed.map(|connection| connection.connected_at.elapsed());
    info!(
        "Connection {} disconnected after {:?}, {} signed in",
        connection_id,
        duration.unwrap_or_default(),
        connection_manager.signed_in_count().await
    );
}

async fn sleep_until_deadline(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(deadline) => {
            tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await
        }
        None => std::future::pending().await,
    }
}

async fn send_server_message<S>(ws_sender: &mut S, message: &ServerMessage) -> Result<(), warp::Error>
where
    S: futures_util::Sink<Message, Error = warp::Error> + Unpin,
{
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize message: {:?}", e);
            return Ok(());
        }
    };

    ws_sender.send(Message::text(json)).await
}

async fn handle_message(
    msg: Message,
    rate_limiter: &mut RateLimiter,
    message_handler: &mut MessageHandler,
    connection_id: ConnectionId,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if !rate_limiter.check_rate_limit() {
        warn!("Rate limit exceeded for connection {}", connection_id);
        message_handler
            .send_error(RequestError::RateLimitExceeded)
            .await?;
        return Err("Rate limit exceeded".into());
    }

    // Only handle text messages
    if !msg.is_text() {
        return Ok(());
    }

    let text = msg.to_str().map_err(|_| "Invalid text message")?;

    let client_message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            // Malformed input is reported, not fatal
            message_handler
                .send_error(RequestError::InvalidMessage {
                    reason: e.to_string(),
                })
                .await?;
            return Ok(());
        }
    };

    message_handler
        .handle_message(client_message)
        .await
        .map_err(|e| format!("Message handling error: {}", e))?;

    Ok(())
}
