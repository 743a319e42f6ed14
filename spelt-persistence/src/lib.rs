pub mod connection;
pub mod entities;
pub mod errors;
pub mod repositories;

pub use connection::{connect_and_migrate, connect_to_database, connect_to_memory_database};
pub use errors::{DataError, StoreError};
pub use repositories::{NewScore, ScoreRepository, ScoreStore};
