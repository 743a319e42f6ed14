use chrono::{DateTime, Utc};
use spelt_types::{LeaderboardView, RankedScore, ScoreEntry};

use crate::scoring_day::ScoringDay;

/// How many submissions are considered and how many are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaderboardPolicy {
    pub batch_size: usize,
    pub top_n: usize,
}

impl Default for LeaderboardPolicy {
    fn default() -> Self {
        Self {
            batch_size: 50,
            top_n: 3,
        }
    }
}

impl LeaderboardPolicy {
    /// Build the ranked view for the scoring day containing `now`.
    ///
    /// `entries` is expected most recent first, as the store returns them. Only
    /// the first `batch_size` of those are ranked. Entries are ordered by score
    /// descending; equal scores keep the more recent submission ahead.
    pub fn rank(
        &self,
        entries: Vec<ScoreEntry>,
        scoring_day: &ScoringDay,
        now: DateTime<Utc>,
    ) -> LeaderboardView {
        let mut candidates: Vec<ScoreEntry> = entries
            .into_iter()
            .take(self.batch_size)
            .filter(|entry| scoring_day.is_current(entry.submitted_at, now))
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.submitted_at.cmp(&a.submitted_at))
        });
        candidates.truncate(self.top_n);

        let entries = candidates
            .into_iter()
            .enumerate()
            .map(|(index, entry)| RankedScore {
                rank: (index + 1) as u32,
                entry,
            })
            .collect();

        LeaderboardView {
            entries,
            day_start: Some(scoring_day.boundary(now)),
            refreshed_at: Some(now),
        }
    }
}
