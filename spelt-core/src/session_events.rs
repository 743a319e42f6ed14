use spelt_types::Feedback;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SessionStarted {
        word_count: usize,
    },
    WordPresented {
        index: usize,
        audio_ref: String,
    },
    AnswerEvaluated {
        index: usize,
        correct: bool,
        score: u32,
        feedback: Feedback,
    },
    FeedbackCleared,
    InputCleared,
    WordAdvanced {
        index: usize,
    },
    SessionCompleted {
        final_score: u32,
    },
    PlaybackChanged {
        is_playing: bool,
    },
    ScoreSubmitted {
        final_score: u32,
    },
    SessionReset,
}

/// Event handler trait for processing session events
pub trait SessionEventHandler: Send + Sync {
    fn handle_event(&mut self, event: SessionEvent);
}

/// Fans session events out to every registered handler
pub struct SessionEventBus {
    handlers: Vec<Box<dyn SessionEventHandler>>,
}

impl SessionEventBus {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Box<dyn SessionEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn publish(&mut self, event: SessionEvent) {
        tracing::debug!("Session event: {:?}", event);
        for handler in &mut self.handlers {
            handler.handle_event(event.clone());
        }
    }
}

impl Default for SessionEventBus {
    fn default() -> Self {
        Self::new()
    }
}
