//! Final test session: `NotStarted → InProgress → Finished`.
//!
//! The session owns its question list and answers. Rendering surfaces talk
//! to it through method calls and observe it through the [`EventSink`];
//! nothing here touches a terminal or a page.
//!
//! [`EventSink`]: crate::events::EventSink

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use uuid::Uuid;

use crate::error::{InteractionError, SessionError};
use crate::evaluator::is_answered;
use crate::events::{BlockReason, QuizEvent, SharedSink};
use crate::interaction::{QuestionController, QuestionView};
use crate::model::{Answer, Chapter, Question};
use crate::results::{percentage, TestResult};
use crate::selector::generate_chapter_test_with;
use crate::store::ResultStore;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    NotStarted,
    InProgress,
    Finished(TestResult),
}

impl SessionPhase {
    fn name(&self) -> &'static str {
        match self {
            SessionPhase::NotStarted => "not started",
            SessionPhase::InProgress => "in progress",
            SessionPhase::Finished(_) => "finished",
        }
    }
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Moved { index: usize },
    /// Refused; the cursor did not move.
    Blocked(BlockReason),
    /// Some questions are unanswered; call
    /// [`TestSession::confirm_finish`] to finish anyway.
    NeedsConfirmation { unanswered: usize },
    Finished,
}

/// Position within the test, for progress displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// 1-based.
    pub position: usize,
    pub total: usize,
    pub percent: u32,
}

pub struct TestSession {
    chapter: Chapter,
    store: Arc<dyn ResultStore>,
    sink: SharedSink,
    rng: Box<dyn RngCore + Send>,
    session_id: Uuid,
    phase: SessionPhase,
    questions: Vec<Question>,
    answers: HashMap<String, Answer>,
    current: usize,
    controller: Option<QuestionController>,
    awaiting_confirmation: bool,
}

impl TestSession {
    pub fn new(chapter: Chapter, store: Arc<dyn ResultStore>, sink: SharedSink) -> Self {
        Self {
            chapter,
            store,
            sink,
            rng: Box::new(StdRng::from_os_rng()),
            session_id: Uuid::new_v4(),
            phase: SessionPhase::NotStarted,
            questions: Vec::new(),
            answers: HashMap::new(),
            current: 0,
            controller: None,
            awaiting_confirmation: false,
        }
    }

    /// Use a specific random source for question selection.
    pub fn with_rng<R: RngCore + Send + 'static>(mut self, rng: R) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn chapter(&self) -> &Chapter {
        &self.chapter
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            SessionPhase::InProgress => self.questions.get(self.current),
            _ => None,
        }
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    /// The finished result, once the session reached `Finished`.
    pub fn result(&self) -> Option<&TestResult> {
        match &self.phase {
            SessionPhase::Finished(result) => Some(result),
            _ => None,
        }
    }

    /// Render model of the current question.
    pub fn view(&self) -> Option<QuestionView> {
        self.controller.as_ref().map(QuestionController::view)
    }

    pub fn progress(&self) -> Progress {
        let total = self.questions.len();
        let position = if total == 0 { 0 } else { self.current + 1 };
        Progress {
            position,
            total,
            percent: percentage(position as u32, total as u32),
        }
    }

    /// Generate the question list and show the first question.
    ///
    /// A failure leaves the session in `NotStarted`.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::NotStarted {
            return Err(self.invalid("start"));
        }

        let questions = generate_chapter_test_with(&self.chapter, &mut *self.rng)?;
        if questions.is_empty() {
            return Err(SessionError::EmptyTest {
                chapter_id: self.chapter.id.clone(),
            });
        }

        self.questions = questions;
        self.answers.clear();
        self.current = 0;
        self.phase = SessionPhase::InProgress;

        tracing::info!(
            chapter = %self.chapter.id,
            session = %self.session_id,
            questions = self.questions.len(),
            "test started"
        );
        self.sink.emit(&QuizEvent::TestStarted {
            session_id: self.session_id,
            chapter_id: self.chapter.id.clone(),
            total: self.questions.len(),
        });
        self.show_current();
        Ok(())
    }

    /// Run an input against the current question and keep the stored answer
    /// in sync with it.
    ///
    /// The stored answer follows the controller even when the input fails
    /// after changing it.
    pub fn with_current<F, R>(&mut self, input: F) -> Result<R, SessionError>
    where
        F: FnOnce(&mut QuestionController) -> Result<R, InteractionError>,
    {
        self.ensure_in_progress("answer")?;
        let Some(controller) = self.controller.as_mut() else {
            return Err(self.invalid("answer"));
        };
        let outcome = input(controller);
        let question_id = controller.question().id.clone();
        let answer = controller.current_answer();
        self.store_answer(question_id, answer);
        Ok(outcome?)
    }

    pub fn select(&mut self, choice_id: &str) -> Result<(), SessionError> {
        self.with_current(|c| c.select(choice_id)).map(drop)
    }

    pub fn toggle(&mut self, choice_id: &str) -> Result<(), SessionError> {
        self.with_current(|c| c.toggle(choice_id)).map(drop)
    }

    pub fn type_text(&mut self, text: &str) -> Result<(), SessionError> {
        self.with_current(|c| c.type_text(text)).map(drop)
    }

    pub fn place_token(&mut self, pool_index: usize) -> Result<(), SessionError> {
        self.with_current(|c| c.place_token(pool_index)).map(drop)
    }

    pub fn remove_token(&mut self, sentence_index: usize) -> Result<(), SessionError> {
        self.with_current(|c| c.remove_token(sentence_index)).map(drop)
    }

    /// Record an answer for any question of the test. Unanswered values
    /// (empty selection, blank text, `None`) clear the stored answer.
    pub fn record_answer(
        &mut self,
        question_id: &str,
        answer: Option<Answer>,
    ) -> Result<(), SessionError> {
        self.ensure_in_progress("answer")?;
        if !self.questions.iter().any(|q| q.id == question_id) {
            return Err(SessionError::UnknownQuestion(question_id.to_string()));
        }
        self.store_answer(question_id.to_string(), answer);
        if self.questions[self.current].id == question_id {
            self.show_current();
        }
        Ok(())
    }

    pub fn is_current_answered(&self) -> bool {
        self.questions
            .get(self.current)
            .is_some_and(|q| is_answered(q.kind(), self.answers.get(&q.id)))
    }

    /// Advance to the next question; on the last question this finishes.
    pub fn next(&mut self) -> Result<Navigation, SessionError> {
        self.ensure_in_progress("advance")?;
        if !self.is_current_answered() {
            return Ok(self.block(BlockReason::Unanswered));
        }
        if self.current + 1 >= self.questions.len() {
            return self.request_finish();
        }
        self.awaiting_confirmation = false;
        self.current += 1;
        self.show_current();
        Ok(Navigation::Moved {
            index: self.current,
        })
    }

    /// Go back one question. Does not require an answer.
    pub fn prev(&mut self) -> Result<Navigation, SessionError> {
        self.ensure_in_progress("go back")?;
        if self.current == 0 {
            return Ok(self.block(BlockReason::AtStart));
        }
        self.awaiting_confirmation = false;
        self.current -= 1;
        self.show_current();
        Ok(Navigation::Moved {
            index: self.current,
        })
    }

    /// Finish if the current question is answered. With other questions
    /// still unanswered, asks for confirmation instead.
    pub fn request_finish(&mut self) -> Result<Navigation, SessionError> {
        self.ensure_in_progress("finish")?;
        self.awaiting_confirmation = false;
        if !self.is_current_answered() {
            return Ok(self.block(BlockReason::Unanswered));
        }
        let unanswered = self
            .questions
            .iter()
            .filter(|q| !is_answered(q.kind(), self.answers.get(&q.id)))
            .count();
        if unanswered > 0 {
            self.awaiting_confirmation = true;
            self.sink.emit(&QuizEvent::ConfirmFinish { unanswered });
            return Ok(Navigation::NeedsConfirmation { unanswered });
        }
        self.finish();
        Ok(Navigation::Finished)
    }

    /// Finish regardless of unanswered questions, once `request_finish`
    /// asked for confirmation. Without a pending request the current
    /// question must be answered.
    pub fn confirm_finish(&mut self) -> Result<Navigation, SessionError> {
        self.ensure_in_progress("finish")?;
        if !self.awaiting_confirmation && !self.is_current_answered() {
            return Ok(self.block(BlockReason::Unanswered));
        }
        self.finish();
        Ok(Navigation::Finished)
    }

    /// Start over with cleared answers and a freshly generated question list.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        tracing::debug!(chapter = %self.chapter.id, "restarting test");
        self.phase = SessionPhase::NotStarted;
        self.questions.clear();
        self.answers.clear();
        self.current = 0;
        self.controller = None;
        self.awaiting_confirmation = false;
        self.session_id = Uuid::new_v4();
        self.start()
    }

    fn finish(&mut self) {
        let answers = &self.answers;
        let result = TestResult::score(&self.chapter.id, &self.questions, |id| answers.get(id));

        if let Err(e) = self.store.save_test_result(&result) {
            tracing::error!(chapter = %self.chapter.id, error = %e, "failed to save test result");
            self.sink.emit(&QuizEvent::ResultNotSaved {
                chapter_id: self.chapter.id.clone(),
                message: e.to_string(),
            });
        }

        tracing::info!(
            chapter = %self.chapter.id,
            correct = result.correct_count,
            total = result.total,
            percentage = result.percentage,
            "test finished"
        );
        self.sink.emit(&QuizEvent::TestFinished {
            chapter_id: self.chapter.id.clone(),
            correct_count: result.correct_count,
            total: result.total,
            percentage: result.percentage,
        });
        self.controller = None;
        self.awaiting_confirmation = false;
        self.phase = SessionPhase::Finished(result);
    }

    fn store_answer(&mut self, question_id: String, answer: Option<Answer>) {
        let kind = self
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .map(Question::kind);
        match (kind, answer) {
            (Some(kind), Some(answer)) if is_answered(kind, Some(&answer)) => {
                self.answers.insert(question_id, answer);
            }
            _ => {
                self.answers.remove(&question_id);
            }
        }
    }

    fn show_current(&mut self) {
        let Some(question) = self.questions.get(self.current).cloned() else {
            return;
        };
        let mut controller = QuestionController::new(question, false, Arc::clone(&self.sink));
        if let Some(answer) = self.answers.get(&controller.question().id) {
            controller.restore(answer);
        }
        tracing::debug!(question = %controller.question().id, index = self.current, "question shown");
        self.sink.emit(&QuizEvent::QuestionShown {
            question_id: controller.question().id.clone(),
            index: self.current,
            total: self.questions.len(),
        });
        self.controller = Some(controller);
    }

    fn block(&self, reason: BlockReason) -> Navigation {
        let question_id = self
            .questions
            .get(self.current)
            .map(|q| q.id.clone())
            .unwrap_or_default();
        tracing::warn!(question = %question_id, ?reason, "navigation blocked");
        self.sink.emit(&QuizEvent::NavigationBlocked {
            question_id,
            reason,
        });
        Navigation::Blocked(reason)
    }

    fn ensure_in_progress(&self, action: &'static str) -> Result<(), SessionError> {
        if self.phase != SessionPhase::InProgress {
            return Err(self.invalid(action));
        }
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            phase: self.phase.name(),
        }
    }
}
