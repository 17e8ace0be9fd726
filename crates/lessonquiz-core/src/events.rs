//! Event output of the interaction and session state machines.
//!
//! State machines only ever `emit` events; whatever renders them (a
//! terminal, a web page, a test) subscribes. Nothing in the core depends on
//! a rendering surface.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::model::Answer;
use crate::results::Evaluation;

/// Why a navigation request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// The current question must be answered first.
    Unanswered,
    /// Already on the first question.
    AtStart,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuizEvent {
    /// The learner's current (possibly partial) input changed.
    AnswerChanged {
        question_id: String,
        answer: Option<Answer>,
    },
    /// An answer was checked and feedback revealed.
    AnswerChecked {
        question_id: String,
        evaluation: Evaluation,
    },
    TestStarted {
        session_id: Uuid,
        chapter_id: String,
        total: usize,
    },
    QuestionShown {
        question_id: String,
        index: usize,
        total: usize,
    },
    NavigationBlocked {
        question_id: String,
        reason: BlockReason,
    },
    /// Finishing with unanswered questions needs the learner's confirmation.
    ConfirmFinish { unanswered: usize },
    TestFinished {
        chapter_id: String,
        correct_count: u32,
        total: u32,
        percentage: u32,
    },
    ResultNotSaved { chapter_id: String, message: String },
}

/// Receiver of state machine events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &QuizEvent);
}

/// Discards every event.
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _: &QuizEvent) {}
}

/// Shared handle to a sink.
pub type SharedSink = Arc<dyn EventSink>;

type Handler = Box<dyn Fn(&QuizEvent) + Send + Sync>;

/// Fan-out sink: every subscribed handler sees every event, in
/// subscription order.
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<Vec<Handler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F)
    where
        F: Fn(&QuizEvent) + Send + Sync + 'static,
    {
        self.handlers.write().push(Box::new(handler));
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: &QuizEvent) {
        for handler in self.handlers.read().iter() {
            handler(event);
        }
    }
}

/// Records events for later inspection.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<QuizEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every event recorded so far.
    pub fn flush(&self) -> Vec<QuizEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn contains(&self, event: &QuizEvent) -> bool {
        self.events.lock().iter().any(|e| e == event)
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &QuizEvent) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn bus_fans_out_to_all_subscribers() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let count = Arc::clone(&count);
            bus.subscribe(move |_| {
                count.fetch_add(1, Ordering::Relaxed);
            });
        }
        bus.emit(&QuizEvent::ConfirmFinish { unanswered: 1 });
        assert_eq!(count.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn recording_sink_flushes() {
        let sink = RecordingSink::new();
        let event = QuizEvent::ConfirmFinish { unanswered: 2 };
        sink.emit(&event);
        assert!(sink.contains(&event));
        assert_eq!(sink.flush(), vec![event]);
        assert!(sink.flush().is_empty());
    }
}
