pub mod audio;
pub mod clock;
pub mod leaderboard;
pub mod scoring;
pub mod scoring_day;
pub mod session;
pub mod session_events;
pub mod word_catalog;

// Re-export main components
pub use audio::*;
pub use clock::*;
pub use leaderboard::*;
pub use scoring::*;
pub use scoring_day::*;
pub use session::*;
pub use session_events::*;
pub use word_catalog::*;
