use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{LeaderboardView, RequestError, ScoreEntry, SessionSnapshot, User};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClientMessage {
    Authenticate { token: String },
    SignOut,
    StartGame,
    SubmitAnswer { answer: String },
    ReplayWord,
    PlaybackEnded,
    PlaybackFailed { reason: String },
    SubmitScore,
    Heartbeat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ServerMessage {
    AuthenticationSuccess { user: User },
    AuthenticationFailed { reason: String },
    SignedOut,
    SessionUpdate { state: SessionSnapshot },
    PlayWord { audio_ref: String },
    StopAudio,
    ClearInput,
    GameCompleted { final_score: u32 },
    ScoreSubmitted { entry: ScoreEntry },
    ScoreSubmissionFailed { reason: String },
    LeaderboardUpdate { leaderboard: LeaderboardView },
    Error { error: RequestError, message: String },
}

impl ServerMessage {
    pub fn error(error: RequestError) -> Self {
        let message = error.to_string();
        ServerMessage::Error { error, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_wire_format() {
        let json = r#"{"SubmitAnswer":{"answer":"Accommodate"}}"#;
        let message: ClientMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            message,
            ClientMessage::SubmitAnswer {
                answer: "Accommodate".to_string()
            }
        );

        let unit: ClientMessage = serde_json::from_str(r#""StartGame""#).unwrap();
        assert_eq!(unit, ClientMessage::StartGame);
    }

    #[test]
    fn test_error_message_carries_display_text() {
        let message = ServerMessage::error(RequestError::AuthenticationRequired);
        match message {
            ServerMessage::Error { error, message } => {
                assert_eq!(error, RequestError::AuthenticationRequired);
                assert_eq!(message, "Sign in to play");
            }
            other => panic!("Expected Error, got {:?}", other),
        }
    }
}
