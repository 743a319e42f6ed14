use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SessionPhase {
    NotStarted,     // No game yet, or signed out
    AwaitingAnswer, // Word played, waiting for the player to type it
    Feedback,       // Showing the result of an answer; input is locked
    Completed,      // Past the last word; final score captured
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum FeedbackKind {
    Correct,  // Green - answer matched
    TryAgain, // Red - wrong, attempts remain
    Revealed, // Red - out of attempts, spelling shown
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SubmissionState {
    NotSubmitted,
    InFlight,
    Submitted,
}

/// Client-facing view of a session. Never carries the canonical spelling of
/// the current word; the only time a spelling leaves the server is inside a
/// `Revealed` feedback message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub current_word_index: Option<u32>,
    pub word_count: u32,
    pub incorrect_attempts: u32,
    pub attempts_remaining: u32,
    pub score: u32,
    pub final_score: Option<u32>,
    pub feedback: Option<Feedback>,
    pub is_playing: bool,
    pub submission: SubmissionState,
}

impl SessionSnapshot {
    pub fn is_completed(&self) -> bool {
        self.phase == SessionPhase::Completed
    }

    /// Whether the "Submit Score" affordance should be offered
    pub fn can_submit_score(&self) -> bool {
        self.is_completed() && self.submission == SubmissionState::NotSubmitted
    }
}
