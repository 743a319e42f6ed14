pub mod score_repository;

pub use score_repository::ScoreRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use spelt_types::ScoreEntry;
use uuid::Uuid;

use crate::errors::StoreError;

/// A submission about to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScore {
    pub id: Uuid,
    pub username: String,
    pub score: u32,
    pub submitted_at: DateTime<Utc>,
}

impl NewScore {
    pub fn new(username: &str, score: u32, submitted_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            score,
            submitted_at,
        }
    }
}

/// Document store holding leaderboard submissions.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Entries submitted strictly after `boundary`, most recent first
    async fn find_submitted_after(
        &self,
        boundary: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<ScoreEntry>, StoreError>;

    async fn insert(&self, score: NewScore) -> Result<ScoreEntry, StoreError>;

    /// Returns the number of entries removed
    async fn delete_submitted_at_or_before(&self, boundary: DateTime<Utc>)
    -> Result<u64, StoreError>;
}
