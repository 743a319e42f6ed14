use serde::{Deserialize, Serialize};

/// Points and attempt limits applied to each answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub correct_award: u32,
    pub incorrect_penalty: u32,
    pub max_attempts: u32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            correct_award: 10,    // Correct spelling: +10
            incorrect_penalty: 5, // Wrong spelling: -5, never below zero
            max_attempts: 3,      // Third miss reveals the word
        }
    }
}

impl ScoringPolicy {
    /// Score after a correct answer
    pub fn award(&self, score: u32) -> u32 {
        score.saturating_add(self.correct_award)
    }

    /// Score after a wrong answer, floored at zero
    pub fn penalize(&self, score: u32) -> u32 {
        score.saturating_sub(self.incorrect_penalty)
    }

    pub fn attempts_remaining(&self, incorrect_attempts: u32) -> u32 {
        self.max_attempts.saturating_sub(incorrect_attempts)
    }

    /// True once the player has used every attempt on the current word
    pub fn is_exhausted(&self, incorrect_attempts: u32) -> bool {
        incorrect_attempts >= self.max_attempts
    }
}
