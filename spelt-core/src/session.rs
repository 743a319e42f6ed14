use anyhow::{Result, anyhow};
use spelt_types::{Feedback, FeedbackKind, SessionPhase, SessionSnapshot, SubmissionState};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::{
    AudioOutput, ScoringPolicy, SessionEvent, SessionEventBus, SessionEventHandler, WordCatalog,
};

/// Pacing of the feedback sequence. Feedback always finishes before the next
/// word is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    pub correct_feedback: Duration,
    pub retry_feedback: Duration,
    pub reveal_feedback: Duration,
    pub next_word_delay: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            correct_feedback: Duration::from_secs(2),
            retry_feedback: Duration::from_secs(2),
            reveal_feedback: Duration::from_secs(3),
            next_word_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScheduledStep {
    ClearFeedback,
    AdvanceWord,
    PlayNextWord,
}

#[derive(Debug, Clone, Copy)]
struct PendingStep {
    due: Instant,
    step: ScheduledStep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Not accepting answers right now
    Ignored,
    Correct {
        score: u32,
    },
    Incorrect {
        attempts_remaining: u32,
        score: u32,
    },
    Revealed {
        spelling: String,
        score: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreSubmission {
    pub final_score: u32,
}

/// One player's pass through the word catalog.
///
/// Timed transitions are modelled as a single pending step. Callers pass the
/// current instant in, ask for [`SessionController::next_deadline`], and call
/// [`SessionController::poll`] once it has passed.
pub struct SessionController {
    catalog: WordCatalog,
    scoring: ScoringPolicy,
    timings: SessionTimings,
    audio: Box<dyn AudioOutput + Send + Sync>,
    event_bus: SessionEventBus,
    phase: SessionPhase,
    current_word_index: Option<usize>,
    incorrect_attempts: u32,
    score: u32,
    final_score: Option<u32>,
    feedback: Option<Feedback>,
    pending: Option<PendingStep>,
    is_playing: bool,
    submission: SubmissionState,
}

impl SessionController {
    pub fn new(
        catalog: WordCatalog,
        scoring: ScoringPolicy,
        timings: SessionTimings,
        audio: Box<dyn AudioOutput + Send + Sync>,
    ) -> Self {
        Self {
            catalog,
            scoring,
            timings,
            audio,
            event_bus: SessionEventBus::new(),
            phase: SessionPhase::NotStarted,
            current_word_index: None,
            incorrect_attempts: 0,
            score: 0,
            final_score: None,
            feedback: None,
            pending: None,
            is_playing: false,
            submission: SubmissionState::NotSubmitted,
        }
    }

    /// Standard catalog, scoring and pacing
    pub fn standard(audio: Box<dyn AudioOutput + Send + Sync>) -> Self {
        Self::new(
            WordCatalog::standard(),
            ScoringPolicy::default(),
            SessionTimings::default(),
            audio,
        )
    }

    pub fn add_event_handler(&mut self, handler: Box<dyn SessionEventHandler>) {
        self.event_bus.add_handler(handler);
    }

    pub fn start(&mut self) {
        self.stop_playback();
        self.clear_progress();
        self.phase = SessionPhase::AwaitingAnswer;
        self.current_word_index = Some(0);

        info!("Session started with {} words", self.catalog.len());
        self.event_bus.publish(SessionEvent::SessionStarted {
            word_count: self.catalog.len(),
        });
        self.event_bus.publish(SessionEvent::InputCleared);
        self.present_current_word();
    }

    pub fn submit_answer(&mut self, input: &str, now: Instant) -> AnswerOutcome {
        if self.phase != SessionPhase::AwaitingAnswer {
            debug!("Ignoring answer in phase {:?}", self.phase);
            return AnswerOutcome::Ignored;
        }

        let Some(index) = self.current_word_index else {
            return AnswerOutcome::Ignored;
        };
        let Some(word) = self.catalog.get(index) else {
            return AnswerOutcome::Ignored;
        };
        let correct = word.is_spelled_by(input);
        let spelling = word.spelling.clone();

        if correct {
            self.score = self.scoring.award(self.score);
            self.incorrect_attempts = 0;
            self.phase = SessionPhase::Feedback;
            self.show_feedback(
                index,
                true,
                FeedbackKind::Correct,
                format!("Correct! +{} points", self.scoring.correct_award),
            );
            self.schedule(now + self.timings.correct_feedback, ScheduledStep::AdvanceWord);

            return AnswerOutcome::Correct { score: self.score };
        }

        self.score = self.scoring.penalize(self.score);
        self.incorrect_attempts += 1;

        if self.scoring.is_exhausted(self.incorrect_attempts) {
            self.phase = SessionPhase::Feedback;
            self.show_feedback(
                index,
                false,
                FeedbackKind::Revealed,
                format!("Incorrect! The correct spelling is: {}", spelling),
            );
            self.schedule(now + self.timings.reveal_feedback, ScheduledStep::AdvanceWord);

            AnswerOutcome::Revealed {
                spelling,
                score: self.score,
            }
        } else {
            let attempts_remaining = self.scoring.attempts_remaining(self.incorrect_attempts);
            self.show_feedback(
                index,
                false,
                FeedbackKind::TryAgain,
                format!(
                    "Incorrect! Try again. ({} attempts remaining)",
                    attempts_remaining
                ),
            );
            self.schedule(now + self.timings.retry_feedback, ScheduledStep::ClearFeedback);

            AnswerOutcome::Incorrect {
                attempts_remaining,
                score: self.score,
            }
        }
    }

    /// Run every scheduled step due at `now`. Returns how many ran.
    pub fn poll(&mut self, now: Instant) -> usize {
        let mut steps_run = 0;

        while let Some(pending) = self.pending {
            if pending.due > now {
                break;
            }
            self.pending = None;
            self.run_step(pending);
            steps_run += 1;
        }

        steps_run
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|pending| pending.due)
    }

    /// Play the current word again. Only while answering and not already playing.
    pub fn replay_word(&mut self) -> bool {
        if self.phase != SessionPhase::AwaitingAnswer || self.is_playing {
            return false;
        }

        let audio_ref = self
            .current_word_index
            .and_then(|index| self.catalog.get(index))
            .map(|word| word.audio_ref.clone());

        match audio_ref {
            Some(audio_ref) => {
                self.play(&audio_ref);
                true
            }
            None => false,
        }
    }

    pub fn playback_finished(&mut self) {
        self.set_playing(false);
    }

    pub fn playback_failed(&mut self, reason: &str) {
        warn!("Playback failed: {}", reason);
        self.set_playing(false);
    }

    /// Claim the final score for submission. `Ok(None)` means a submission
    /// is already in flight or done for this game.
    pub fn begin_score_submission(&mut self) -> Result<Option<ScoreSubmission>> {
        if self.phase != SessionPhase::Completed {
            return Err(anyhow!("Game is not completed"));
        }

        match self.submission {
            SubmissionState::NotSubmitted => {
                self.submission = SubmissionState::InFlight;
                Ok(Some(ScoreSubmission {
                    final_score: self.final_score.unwrap_or(self.score),
                }))
            }
            SubmissionState::InFlight | SubmissionState::Submitted => Ok(None),
        }
    }

    /// Record the outcome of the write started by `begin_score_submission`.
    /// A failed write leaves the game submittable again.
    pub fn finish_score_submission(&mut self, succeeded: bool) {
        if self.submission != SubmissionState::InFlight {
            return;
        }

        if succeeded {
            self.submission = SubmissionState::Submitted;
            let final_score = self.final_score.unwrap_or(self.score);
            self.event_bus
                .publish(SessionEvent::ScoreSubmitted { final_score });
        } else {
            self.submission = SubmissionState::NotSubmitted;
        }
    }

    /// Abandon the session, e.g. on sign-out
    pub fn reset(&mut self) {
        self.stop_playback();
        self.clear_progress();
        self.phase = SessionPhase::NotStarted;
        self.event_bus.publish(SessionEvent::SessionReset);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            current_word_index: self.current_word_index.map(|index| index as u32),
            word_count: self.catalog.len() as u32,
            incorrect_attempts: self.incorrect_attempts,
            attempts_remaining: self.scoring.attempts_remaining(self.incorrect_attempts),
            score: self.score,
            final_score: self.final_score,
            feedback: self.feedback.clone(),
            is_playing: self.is_playing,
            submission: self.submission,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn final_score(&self) -> Option<u32> {
        self.final_score
    }

    pub fn incorrect_attempts(&self) -> u32 {
        self.incorrect_attempts
    }

    pub fn current_word_index(&self) -> Option<usize> {
        self.current_word_index
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn submission(&self) -> SubmissionState {
        self.submission
    }

    pub fn word_count(&self) -> usize {
        self.catalog.len()
    }

    fn clear_progress(&mut self) {
        self.current_word_index = None;
        self.incorrect_attempts = 0;
        self.score = 0;
        self.final_score = None;
        self.feedback = None;
        self.pending = None;
        self.submission = SubmissionState::NotSubmitted;
    }

    fn schedule(&mut self, due: Instant, step: ScheduledStep) {
        self.pending = Some(PendingStep { due, step });
    }

    fn run_step(&mut self, pending: PendingStep) {
        match pending.step {
            ScheduledStep::ClearFeedback => {
                self.feedback = None;
                self.event_bus.publish(SessionEvent::FeedbackCleared);
            }
            ScheduledStep::AdvanceWord => self.advance_word(pending.due),
            ScheduledStep::PlayNextWord => {
                self.phase = SessionPhase::AwaitingAnswer;
                self.event_bus.publish(SessionEvent::InputCleared);
                self.present_current_word();
            }
        }
    }

    fn advance_word(&mut self, advanced_at: Instant) {
        self.incorrect_attempts = 0;
        self.feedback = None;
        self.event_bus.publish(SessionEvent::FeedbackCleared);

        let next_index = self.current_word_index.map_or(0, |index| index + 1);
        if next_index < self.catalog.len() {
            self.current_word_index = Some(next_index);
            self.event_bus
                .publish(SessionEvent::WordAdvanced { index: next_index });
            self.schedule(
                advanced_at + self.timings.next_word_delay,
                ScheduledStep::PlayNextWord,
            );
        } else {
            self.complete();
        }
    }

    fn complete(&mut self) {
        self.stop_playback();
        self.phase = SessionPhase::Completed;
        self.current_word_index = None;
        self.final_score = Some(self.score);

        info!("Session completed with final score {}", self.score);
        self.event_bus.publish(SessionEvent::InputCleared);
        self.event_bus.publish(SessionEvent::SessionCompleted {
            final_score: self.score,
        });
    }

    fn show_feedback(&mut self, index: usize, correct: bool, kind: FeedbackKind, message: String) {
        let feedback = Feedback { kind, message };
        self.feedback = Some(feedback.clone());
        self.event_bus.publish(SessionEvent::AnswerEvaluated {
            index,
            correct,
            score: self.score,
            feedback,
        });
    }

    fn present_current_word(&mut self) {
        let Some(index) = self.current_word_index else {
            return;
        };
        let Some(audio_ref) = self.catalog.get(index).map(|word| word.audio_ref.clone()) else {
            return;
        };

        self.event_bus.publish(SessionEvent::WordPresented {
            index,
            audio_ref: audio_ref.clone(),
        });
        self.play(&audio_ref);
    }

    fn play(&mut self, audio_ref: &str) {
        self.stop_playback();

        match self.audio.play(audio_ref) {
            Ok(()) => self.set_playing(true),
            Err(e) => {
                warn!("Failed to start playback of {}: {}", audio_ref, e);
                self.set_playing(false);
            }
        }
    }

    fn stop_playback(&mut self) {
        if self.is_playing {
            self.audio.stop();
            self.set_playing(false);
        }
    }

    fn set_playing(&mut self, is_playing: bool) {
        if self.is_playing != is_playing {
            self.is_playing = is_playing;
            self.event_bus
                .publish(SessionEvent::PlaybackChanged { is_playing });
        }
    }
}
