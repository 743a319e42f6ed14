use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// A persisted leaderboard submission, one per completed game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScoreEntry {
    pub id: Uuid,
    pub username: String,
    pub score: u32,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RankedScore {
    pub rank: u32,
    pub entry: ScoreEntry,
}

/// Top scores of the current scoring day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeaderboardView {
    pub entries: Vec<RankedScore>,
    pub day_start: Option<DateTime<Utc>>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl LeaderboardView {
    /// View shown before the first successful refresh
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            day_start: None,
            refreshed_at: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn leader(&self) -> Option<&ScoreEntry> {
        self.entries.first().map(|ranked| &ranked.entry)
    }
}

impl Default for LeaderboardView {
    fn default() -> Self {
        Self::empty()
    }
}
