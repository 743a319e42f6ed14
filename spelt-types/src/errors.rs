use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Client-visible reasons a request was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RequestError {
    AuthenticationRequired,
    NoActiveSession,
    GameNotCompleted,
    InvalidMessage { reason: String },
    RateLimitExceeded,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::AuthenticationRequired => write!(f, "Sign in to play"),
            RequestError::NoActiveSession => write!(f, "No game in progress"),
            RequestError::GameNotCompleted => {
                write!(f, "Scores can only be submitted once the game is completed")
            }
            RequestError::InvalidMessage { reason } => write!(f, "Invalid message: {}", reason),
            RequestError::RateLimitExceeded => write!(f, "Too many requests"),
        }
    }
}

impl std::error::Error for RequestError {}
