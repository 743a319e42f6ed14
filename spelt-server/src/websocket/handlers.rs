use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::auth::AuthService;
use crate::leaderboard::LeaderboardService;
use crate::session_settings::SessionSettings;
use crate::websocket::connection::{ConnectionId, ConnectionManager};
use spelt_core::{AudioOutput, SessionController, SessionEvent, SessionEventHandler};
use spelt_types::{ClientMessage, LeaderboardView, RequestError, ServerMessage, User};

/// Plays words by telling the browser which recording to play
pub struct ClientAudio {
    sender: mpsc::UnboundedSender<ServerMessage>,
}

impl ClientAudio {
    pub fn new(sender: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self { sender }
    }
}

impl AudioOutput for ClientAudio {
    fn play(&mut self, audio_ref: &str) -> anyhow::Result<()> {
        self.sender
            .send(ServerMessage::PlayWord {
                audio_ref: audio_ref.to_string(),
            })
            .map_err(|_| anyhow::anyhow!("Connection closed"))
    }

    fn stop(&mut self) {
        let _ = self.sender.send(ServerMessage::StopAudio);
    }
}

/// Forwards the session events the browser reacts to
pub struct ClientNotifier {
    sender: mpsc::UnboundedSender<ServerMessage>,
}

impl ClientNotifier {
    pub fn new(sender: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self { sender }
    }
}

impl SessionEventHandler for ClientNotifier {
    fn handle_event(&mut self, event: SessionEvent) {
        let message = match event {
            SessionEvent::InputCleared => ServerMessage::ClearInput,
            SessionEvent::SessionCompleted { final_score } => {
                ServerMessage::GameCompleted { final_score }
            }
            _ => return,
        };
        let _ = self.sender.send(message);
    }
}

/// Serves one connection. Owns that connection's session, so every session
/// operation happens on the connection's own task.
pub struct MessageHandler {
    connection_id: ConnectionId,
    connection_manager: Arc<ConnectionManager>,
    auth_service: Arc<AuthService>,
    leaderboard: Arc<LeaderboardService>,
    settings: Arc<SessionSettings>,
    sender: mpsc::UnboundedSender<ServerMessage>,
    session: Option<SessionController>,
}

impl MessageHandler {
    pub fn new(
        connection_id: ConnectionId,
        connection_manager: Arc<ConnectionManager>,
        auth_service: Arc<AuthService>,
        leaderboard: Arc<LeaderboardService>,
        settings: Arc<SessionSettings>,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Self {
        Self {
            connection_id,
            connection_manager,
            auth_service,
            leaderboard,
            settings,
            sender,
            session: None,
        }
    }

    pub async fn handle_message(&mut self, message: ClientMessage) -> Result<(), String> {
        match message {
            ClientMessage::Authenticate { token } => self.handle_authenticate(token).await,
            ClientMessage::SignOut => self.handle_sign_out().await,
            ClientMessage::StartGame => self.handle_start_game().await,
            ClientMessage::SubmitAnswer { answer } => self.handle_submit_answer(answer).await,
            ClientMessage::ReplayWord => self.handle_replay_word().await,
            ClientMessage::PlaybackEnded => self.handle_playback_ended().await,
            ClientMessage::PlaybackFailed { reason } => self.handle_playback_failed(reason).await,
            ClientMessage::SubmitScore => self.handle_submit_score().await,
            ClientMessage::Heartbeat => Ok(()),
        }
    }

    /// When the session's pending step is due
    pub fn next_deadline(&self) -> Option<Instant> {
        self.session
            .as_ref()
            .and_then(SessionController::next_deadline)
    }

    /// Run due session steps and report the new state
    pub async fn poll_session(&mut self, now: Instant) -> Result<(), String> {
        let steps_run = match self.session.as_mut() {
            Some(session) => session.poll(now),
            None => 0,
        };

        if steps_run > 0 {
            self.send_session_update().await?;
        }
        Ok(())
    }

    pub async fn send_leaderboard(&self, leaderboard: LeaderboardView) -> Result<(), String> {
        self.send_message(ServerMessage::LeaderboardUpdate { leaderboard })
            .await
    }

    pub async fn handle_disconnect(&mut self) {
        info!("Handling disconnect for connection {}", self.connection_id);
        self.end_session();
    }

    async fn handle_authenticate(&mut self, token: String) -> Result<(), String> {
        info!("Authenticating connection {}", self.connection_id);

        match self.auth_service.validate_token(&token).await {
            Ok(user) => {
                let previous = self.connection_manager.get_user(self.connection_id).await;
                if previous.is_some_and(|previous| previous.id != user.id) {
                    self.end_session();
                }

                self.connection_manager
                    .set_connection_user(self.connection_id, Some(user.clone()))
                    .await;
                self.send_message(ServerMessage::AuthenticationSuccess { user })
                    .await
            }
            Err(e) => {
                warn!(
                    "Authentication failed for connection {}: {}",
                    self.connection_id, e
                );
                self.send_message(ServerMessage::AuthenticationFailed {
                    reason: e.to_string(),
                })
                .await
            }
        }
    }

    async fn handle_sign_out(&mut self) -> Result<(), String> {
        info!("Signing out connection {}", self.connection_id);

        self.end_session();
        self.connection_manager
            .set_connection_user(self.connection_id, None)
            .await;
        self.send_message(ServerMessage::SignedOut).await
    }

    async fn handle_start_game(&mut self) -> Result<(), String> {
        if self.current_user().await.is_none() {
            return self.send_error(RequestError::AuthenticationRequired).await;
        }

        if self.session.is_none() {
            let session = self.create_session();
            self.session = Some(session);
        }
        if let Some(session) = self.session.as_mut() {
            session.start();
        }

        self.send_session_update().await
    }

    async fn handle_submit_answer(&mut self, answer: String) -> Result<(), String> {
        if self.current_user().await.is_none() {
            return self.send_error(RequestError::AuthenticationRequired).await;
        }
        let Some(session) = self.session.as_mut() else {
            return self.send_error(RequestError::NoActiveSession).await;
        };

        session.submit_answer(&answer, Instant::now());
        self.send_session_update().await
    }

    async fn handle_replay_word(&mut self) -> Result<(), String> {
        let Some(session) = self.session.as_mut() else {
            return self.send_error(RequestError::NoActiveSession).await;
        };

        if session.replay_word() {
            self.send_session_update().await?;
        }
        Ok(())
    }

    async fn handle_playback_ended(&mut self) -> Result<(), String> {
        if let Some(session) = self.session.as_mut() {
            session.playback_finished();
            self.send_session_update().await?;
        }
        Ok(())
    }

    async fn handle_playback_failed(&mut self, reason: String) -> Result<(), String> {
        if let Some(session) = self.session.as_mut() {
            session.playback_failed(&reason);
            self.send_session_update().await?;
        }
        Ok(())
    }

    async fn handle_submit_score(&mut self) -> Result<(), String> {
        let Some(user) = self.current_user().await else {
            return self.send_error(RequestError::AuthenticationRequired).await;
        };
        let Some(session) = self.session.as_mut() else {
            return self.send_error(RequestError::NoActiveSession).await;
        };

        let submission = match session.begin_score_submission() {
            Ok(Some(submission)) => submission,
            // Already submitted or in flight
            Ok(None) => return Ok(()),
            Err(_) => return self.send_error(RequestError::GameNotCompleted).await,
        };

        let result = self
            .leaderboard
            .record(&user.display_name, submission.final_score)
            .await;

        if let Some(session) = self.session.as_mut() {
            session.finish_score_submission(result.is_ok());
        }

        match result {
            Ok(entry) => {
                info!(
                    "Connection {} submitted score {}",
                    self.connection_id, entry.score
                );
                self.send_message(ServerMessage::ScoreSubmitted { entry })
                    .await?;
            }
            Err(e) => {
                warn!(
                    "Score submission failed for connection {}: {}",
                    self.connection_id, e
                );
                self.send_message(ServerMessage::ScoreSubmissionFailed {
                    reason: e.to_string(),
                })
                .await?;
            }
        }

        self.send_session_update().await
    }

    fn create_session(&self) -> SessionController {
        let mut session = self
            .settings
            .new_session(Box::new(ClientAudio::new(self.sender.clone())));
        session.add_event_handler(Box::new(ClientNotifier::new(self.sender.clone())));
        session
    }

    fn end_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.reset();
        }
    }

    async fn current_user(&self) -> Option<User> {
        self.connection_manager.get_user(self.connection_id).await
    }

    async fn send_session_update(&self) -> Result<(), String> {
        match &self.session {
            Some(session) => {
                self.send_message(ServerMessage::SessionUpdate {
                    state: session.snapshot(),
                })
                .await
            }
            None => Ok(()),
        }
    }

    async fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.connection_manager
            .send_to_connection(self.connection_id, message)
            .await
    }

    pub async fn send_error(&self, error: RequestError) -> Result<(), String> {
        self.send_message(ServerMessage::error(error)).await
    }
}
