use sea_orm::DbErr;
use thiserror::Error;

/// A score record that cannot be represented as a `ScoreEntry`
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataError {
    #[error("Stored score {0} is negative")]
    NegativeScore(i32),
    #[error("Score {0} is too large to store")]
    ScoreOutOfRange(u32),
    #[error("Username is empty")]
    EmptyUsername,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to write scores: {0}")]
    Write(#[source] DbErr),
    #[error("Failed to read scores: {0}")]
    Read(#[source] DbErr),
    #[error(transparent)]
    Data(#[from] DataError),
}
