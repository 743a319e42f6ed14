use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use spelt_core::{Clock, LeaderboardPolicy, ScoringDay};
use spelt_persistence::{NewScore, ScoreStore, StoreError};
use spelt_types::{LeaderboardView, ScoreEntry};

/// Owns the cached daily leaderboard and the store behind it.
///
/// The cached view is published through a watch channel so every connection
/// sees each replacement as a whole.
pub struct LeaderboardService {
    store: Arc<dyn ScoreStore>,
    clock: Arc<dyn Clock>,
    scoring_day: ScoringDay,
    policy: LeaderboardPolicy,
    view: watch::Sender<LeaderboardView>,
}

impl LeaderboardService {
    pub fn new(
        store: Arc<dyn ScoreStore>,
        clock: Arc<dyn Clock>,
        scoring_day: ScoringDay,
        policy: LeaderboardPolicy,
    ) -> Self {
        let (view, _) = watch::channel(LeaderboardView::empty());

        Self {
            store,
            clock,
            scoring_day,
            policy,
            view,
        }
    }

    pub fn view(&self) -> LeaderboardView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LeaderboardView> {
        self.view.subscribe()
    }

    /// Start of the current scoring day
    pub fn day_start(&self) -> DateTime<Utc> {
        self.scoring_day.boundary(self.clock.now())
    }

    /// Re-read today's entries and replace the cached view
    pub async fn try_refresh(&self) -> Result<LeaderboardView, StoreError> {
        let now = self.clock.now();
        let day_start = self.scoring_day.boundary(now);

        let entries = self
            .store
            .find_submitted_after(day_start, self.policy.batch_size as u64)
            .await?;
        let view = self.policy.rank(entries, &self.scoring_day, now);

        self.view.send_replace(view.clone());
        debug!("Leaderboard refreshed with {} entries", view.len());

        Ok(view)
    }

    /// Like `try_refresh`, but keeps serving the previous view on failure
    pub async fn refresh(&self) -> LeaderboardView {
        match self.try_refresh().await {
            Ok(view) => view,
            Err(e) => {
                warn!("Leaderboard refresh failed, keeping previous view: {}", e);
                self.view()
            }
        }
    }

    /// Store a finished game's score, then refresh
    pub async fn record(&self, username: &str, score: u32) -> Result<ScoreEntry, StoreError> {
        let entry = self
            .store
            .insert(NewScore::new(username, score, self.clock.now()))
            .await?;
        info!("Recorded score {} for {}", entry.score, entry.username);

        self.refresh().await;
        Ok(entry)
    }

    /// Delete every entry from previous scoring days
    pub async fn cleanup(&self) -> Result<u64, StoreError> {
        let day_start = self.day_start();
        let removed = self.store.delete_submitted_at_or_before(day_start).await?;

        if removed > 0 {
            info!("Removed {} scores from before {}", removed, day_start);
        }
        Ok(removed)
    }

    /// Refresh now and then every `period`
    pub fn spawn_refresh_task(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                service.refresh().await;
            }
        })
    }

    /// Sweep now and then every `period`
    pub fn spawn_cleanup_task(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if let Err(e) = service.cleanup().await {
                    warn!("Leaderboard cleanup failed: {}", e);
                }
            }
        })
    }
}
