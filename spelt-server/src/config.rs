use std::env;
use std::str::FromStr;
use std::time::Duration;

use spelt_core::{LeaderboardPolicy, ScoringDay, SessionTimings};
use spelt_persistence::connection::DEFAULT_DATABASE_URL;

/// Leaderboard tasks run at least once per day
const MAX_PERIOD_MINUTES: u64 = 24 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth_dev_mode: bool,
    pub google_client_id: String,
    pub word_catalog_path: Option<String>,
    pub scoring_day_utc_offset_minutes: i32,
    pub leaderboard_size: usize,
    pub leaderboard_batch_size: usize,
    pub leaderboard_refresh_minutes: u64,
    pub leaderboard_cleanup_minutes: u64,
    pub correct_feedback_ms: u64,
    pub retry_feedback_ms: u64,
    pub reveal_feedback_ms: u64,
    pub next_word_delay_ms: u64,
    pub connection_timeout_seconds: u64,
    pub rate_limit_burst: u32,
    pub rate_limit_refill_ms: u64,
}

impl Config {
    pub fn new() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_or("PORT", 8080),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            auth_dev_mode: env::var("AUTH_DEV_MODE").unwrap_or_else(|_| "false".to_string())
                == "true",
            google_client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            word_catalog_path: env::var("WORD_CATALOG_PATH").ok(),
            scoring_day_utc_offset_minutes: env_or(
                "SCORING_DAY_UTC_OFFSET_MINUTES",
                ScoringDay::DEFAULT_UTC_OFFSET_MINUTES,
            ),
            leaderboard_size: env_or("LEADERBOARD_SIZE", 3),
            leaderboard_batch_size: env_or("LEADERBOARD_BATCH_SIZE", 50),
            leaderboard_refresh_minutes: env_or("LEADERBOARD_REFRESH_MINUTES", 30),
            leaderboard_cleanup_minutes: env_or("LEADERBOARD_CLEANUP_MINUTES", 60),
            correct_feedback_ms: env_or("CORRECT_FEEDBACK_MS", 2000),
            retry_feedback_ms: env_or("RETRY_FEEDBACK_MS", 2000),
            reveal_feedback_ms: env_or("REVEAL_FEEDBACK_MS", 3000),
            next_word_delay_ms: env_or("NEXT_WORD_DELAY_MS", 500),
            connection_timeout_seconds: env_or("CONNECTION_TIMEOUT_SECONDS", 300),
            rate_limit_burst: env_or("RATE_LIMIT_BURST", 30),
            rate_limit_refill_ms: env_or("RATE_LIMIT_REFILL_MS", 2000),
        }
    }

    pub fn session_timings(&self) -> SessionTimings {
        SessionTimings {
            correct_feedback: Duration::from_millis(self.correct_feedback_ms),
            retry_feedback: Duration::from_millis(self.retry_feedback_ms),
            reveal_feedback: Duration::from_millis(self.reveal_feedback_ms),
            next_word_delay: Duration::from_millis(self.next_word_delay_ms),
        }
    }

    pub fn leaderboard_policy(&self) -> LeaderboardPolicy {
        LeaderboardPolicy {
            batch_size: self.leaderboard_batch_size.max(1),
            top_n: self.leaderboard_size.max(1),
        }
    }

    /// Falls back to the default day when the offset is out of range
    pub fn scoring_day(&self) -> ScoringDay {
        ScoringDay::from_utc_offset_minutes(self.scoring_day_utc_offset_minutes).unwrap_or_else(
            |e| {
                tracing::warn!("{}; using the default scoring day", e);
                ScoringDay::default()
            },
        )
    }

    pub fn leaderboard_refresh_period(&self) -> Duration {
        Duration::from_secs(self.leaderboard_refresh_minutes.clamp(1, MAX_PERIOD_MINUTES) * 60)
    }

    pub fn leaderboard_cleanup_period(&self) -> Duration {
        Duration::from_secs(self.leaderboard_cleanup_minutes.clamp(1, MAX_PERIOD_MINUTES) * 60)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {} value '{}', using default", key, value);
            default
        }),
        Err(_) => default,
    }
}
