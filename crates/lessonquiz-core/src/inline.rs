//! In-lesson quizzes.
//!
//! An inline quiz shows a fixed list of questions from the chapter bank. No
//! selection runs and nothing is persisted; feedback is immediate when the
//! block asks for it.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::debounce::Debouncer;
use crate::error::{InteractionError, SessionError};
use crate::events::SharedSink;
use crate::interaction::{CheckTicket, QuestionController, Response, DEFAULT_MULTI_SELECT_DEBOUNCE};
use crate::model::{Answer, Chapter};
use crate::results::Evaluation;

pub struct InlineQuiz {
    block_id: String,
    title: Option<String>,
    controllers: Vec<QuestionController>,
    answers: HashMap<String, Answer>,
    debouncer: Debouncer<String, CheckTicket>,
    due: mpsc::UnboundedReceiver<CheckTicket>,
}

impl InlineQuiz {
    /// Build the quiz of a `quiz_inline` block. Unknown question ids are
    /// dropped. Returns `None` when the chapter has no such block.
    pub fn from_chapter(chapter: &Chapter, block_id: &str, sink: SharedSink) -> Option<Self> {
        Self::with_debounce(chapter, block_id, sink, DEFAULT_MULTI_SELECT_DEBOUNCE)
    }

    pub fn with_debounce(
        chapter: &Chapter,
        block_id: &str,
        sink: SharedSink,
        debounce: Duration,
    ) -> Option<Self> {
        let (id, title, spec) = chapter
            .inline_quizzes()
            .into_iter()
            .find(|(id, _, _)| *id == block_id)?;

        let controllers = chapter
            .questions_by_ids(&spec.question_ids)
            .into_iter()
            .map(|q| {
                QuestionController::new(q, spec.show_answers_immediately, sink.clone())
                    .with_debounce(debounce)
            })
            .collect();

        let (debouncer, due) = Debouncer::new();
        Some(Self {
            block_id: id.to_string(),
            title: title.map(String::from),
            controllers,
            answers: HashMap::new(),
            debouncer,
            due,
        })
    }

    pub fn block_id(&self) -> &str {
        &self.block_id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn controllers(&self) -> &[QuestionController] {
        &self.controllers
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    /// Number of questions already checked.
    pub fn checked(&self) -> usize {
        self.controllers.iter().filter(|c| c.is_locked()).count()
    }

    /// Run an input against question `index`. A scheduled check is handed
    /// to the debouncer, replacing any pending one for the same question.
    /// The recorded answer follows the controller even when the input fails.
    ///
    /// Must be called from within a tokio runtime.
    pub fn apply<F>(&mut self, index: usize, input: F) -> Result<Response, SessionError>
    where
        F: FnOnce(&mut QuestionController) -> Result<Response, InteractionError>,
    {
        let Some(controller) = self.controllers.get_mut(index) else {
            return Err(SessionError::UnknownQuestion(format!("#{index}")));
        };
        let outcome = input(controller);

        let question_id = controller.question().id.clone();
        match controller.current_answer() {
            Some(answer) => self.answers.insert(question_id.clone(), answer),
            None => self.answers.remove(&question_id),
        };
        let response = outcome?;

        match &response {
            Response::CheckScheduled(ticket) => {
                self.debouncer
                    .schedule(question_id, ticket.delay, ticket.clone());
            }
            Response::Checked(_) => self.debouncer.cancel(&question_id),
            Response::Recorded => {}
        }
        Ok(response)
    }

    /// Wait for the next debounced check and run it.
    ///
    /// Returns the question id and its evaluation. Tickets made stale by a
    /// later input are skipped. Returns `None` once no check can arrive.
    pub async fn next_check(&mut self) -> Option<(String, Evaluation)> {
        loop {
            if self.debouncer.pending() == 0 && self.due.is_empty() {
                return None;
            }
            let ticket = self.due.recv().await?;
            let Some(controller) = self
                .controllers
                .iter_mut()
                .find(|c| c.question().id == ticket.question_id)
            else {
                continue;
            };
            if let Some(evaluation) = controller.debounce_elapsed(&ticket) {
                return Some((ticket.question_id, evaluation));
            }
        }
    }
}
