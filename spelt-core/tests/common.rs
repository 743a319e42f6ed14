#![allow(dead_code)]

use spelt_core::{
    AudioOutput, ScoringPolicy, SessionController, SessionEvent, SessionEventHandler,
    SessionTimings, WordCatalog,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Creates a small catalog with known spellings
pub fn create_test_catalog() -> WordCatalog {
    WordCatalog::from_manifest(
        "apple,apple.mp3,apple\n\
         banana,banana.mp3,banana\n\
         cherry,cherry.mp3,cherry",
    )
    .unwrap()
}

/// Creates a session over the test catalog with default pacing
pub fn create_test_session() -> (SessionController, AudioLog, EventCollector) {
    create_session_with(create_test_catalog(), SessionTimings::default())
}

/// Creates a session over the five standard words
pub fn create_standard_session() -> (SessionController, AudioLog, EventCollector) {
    create_session_with(WordCatalog::standard(), SessionTimings::default())
}

pub fn create_session_with(
    catalog: WordCatalog,
    timings: SessionTimings,
) -> (SessionController, AudioLog, EventCollector) {
    let audio = AudioLog::new();
    let events = EventCollector::new();

    let mut session = SessionController::new(
        catalog,
        ScoringPolicy::default(),
        timings,
        Box::new(audio.clone()),
    );
    session.add_event_handler(Box::new(events.clone()));

    (session, audio, events)
}

/// Event collector for testing event emissions
#[derive(Clone)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn get_events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn last_event(&self) -> Option<SessionEvent> {
        self.events.lock().unwrap().last().cloned()
    }

    pub fn has_event_type(&self, check_fn: impl Fn(&SessionEvent) -> bool) -> bool {
        self.events.lock().unwrap().iter().any(check_fn)
    }
}

impl SessionEventHandler for EventCollector {
    fn handle_event(&mut self, event: SessionEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Audio output that records every call
#[derive(Clone)]
pub struct AudioLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl AudioLog {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn played(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| call.strip_prefix("play:").map(str::to_string))
            .collect()
    }
}

impl AudioOutput for AudioLog {
    fn play(&mut self, audio_ref: &str) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(format!("play:{}", audio_ref));
        Ok(())
    }

    fn stop(&mut self) {
        self.calls.lock().unwrap().push("stop".to_string());
    }
}

/// Answer the current word and let the whole feedback sequence run.
/// Returns the instant at which the next word became answerable.
pub fn answer_and_settle(session: &mut SessionController, answer: &str, now: Instant) -> Instant {
    session.submit_answer(answer, now);
    let mut now = now;
    while let Some(deadline) = session.next_deadline() {
        now = deadline;
        session.poll(now);
    }
    now
}

/// Play through a whole round answering every word with `answers`
pub fn play_round(session: &mut SessionController, answers: &[&str], start: Instant) -> Instant {
    let mut now = start;
    for answer in answers {
        now = answer_and_settle(session, answer, now) + Duration::from_millis(1);
    }
    now
}
