use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use tracing::{debug, warn};

use super::{NewScore, ScoreStore};
use crate::entities::{prelude::*, scores};
use crate::errors::{DataError, StoreError};
use spelt_types::ScoreEntry;

pub struct ScoreRepository {
    db: DatabaseConnection,
}

impl ScoreRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_entry(model: scores::Model) -> Result<ScoreEntry, DataError> {
        if model.username.is_empty() {
            return Err(DataError::EmptyUsername);
        }
        let score = u32::try_from(model.score).map_err(|_| DataError::NegativeScore(model.score))?;

        Ok(ScoreEntry {
            id: model.id,
            username: model.username,
            score,
            submitted_at: model.submitted_at,
        })
    }
}

#[async_trait]
impl ScoreStore for ScoreRepository {
    async fn find_submitted_after(
        &self,
        boundary: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<ScoreEntry>, StoreError> {
        let models = Scores::find()
            .filter(scores::Column::SubmittedAt.gt(boundary))
            .order_by_desc(scores::Column::SubmittedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(StoreError::Read)?;

        // A malformed row is dropped so the rest of the day stays readable
        let entries = models
            .into_iter()
            .filter_map(|model| {
                let id = model.id;
                Self::model_to_entry(model)
                    .inspect_err(|e| warn!("Skipping malformed score {}: {}", id, e))
                    .ok()
            })
            .collect();

        Ok(entries)
    }

    async fn insert(&self, score: NewScore) -> Result<ScoreEntry, StoreError> {
        if score.username.is_empty() {
            return Err(DataError::EmptyUsername.into());
        }
        let stored_score =
            i32::try_from(score.score).map_err(|_| DataError::ScoreOutOfRange(score.score))?;

        let score_model = scores::ActiveModel {
            id: ActiveValue::Set(score.id),
            username: ActiveValue::Set(score.username.clone()),
            score: ActiveValue::Set(stored_score),
            submitted_at: ActiveValue::Set(score.submitted_at),
        };

        Scores::insert(score_model)
            .exec(&self.db)
            .await
            .map_err(StoreError::Write)?;

        debug!("Stored score {} for {}", score.score, score.username);

        Ok(ScoreEntry {
            id: score.id,
            username: score.username,
            score: score.score,
            submitted_at: score.submitted_at,
        })
    }

    async fn delete_submitted_at_or_before(
        &self,
        boundary: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = Scores::delete_many()
            .filter(scores::Column::SubmittedAt.lte(boundary))
            .exec(&self.db)
            .await
            .map_err(StoreError::Write)?;

        Ok(result.rows_affected)
    }
}
