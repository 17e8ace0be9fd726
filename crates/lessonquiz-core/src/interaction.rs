//! Per-question interaction state machine.
//!
//! A [`QuestionController`] owns the learner's current input for one
//! question, reports every change through an [`EventSink`], and, in
//! immediate-check mode, evaluates and reveals feedback as soon as an
//! answer is committed:
//!
//! - single-choice kinds check on selection;
//! - `mcq_multi` asks the caller to schedule a debounced check
//!   ([`CheckTicket`]); a newer toggle invalidates older tickets;
//! - `fill_blank` checks on an explicit submit;
//! - `reorder` checks once every token is placed.
//!
//! Once checked, a question is locked for the lifetime of the controller.

use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::InteractionError;
use crate::evaluator::{check_answer, is_answered};
use crate::events::{QuizEvent, SharedSink};
use crate::model::{Answer, Question, QuestionBody, QuestionKind};
use crate::results::Evaluation;

/// Grace window between the last multi-select toggle and the check.
pub const DEFAULT_MULTI_SELECT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Characters treated as sentence-final punctuation in reorder questions.
const SENTENCE_END: &[char] = &['.', '!', '?', '…'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Unanswered,
    /// An answer is present but has not been checked.
    Answered,
    /// Terminal: inputs disabled, correctness and explanation visible.
    Checked(Evaluation),
}

/// Request to run a debounced check after `delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTicket {
    pub question_id: String,
    pub generation: u64,
    pub delay: Duration,
}

/// What an accepted input led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The input was stored; nothing was checked.
    Recorded,
    /// The answer was checked and feedback revealed.
    Checked(Evaluation),
    /// The caller should deliver this ticket back after its delay.
    CheckScheduled(CheckTicket),
}

/// Word tokens of a reorder question split between the available pool and
/// the sentence under construction.
#[derive(Debug, Clone)]
pub struct ReorderBoard {
    tokens: Vec<String>,
    pool: Vec<usize>,
    sentence: Vec<usize>,
    punctuation: String,
}

/// Split a sentence into word tokens and its trailing punctuation.
pub fn split_sentence(sentence: &str) -> (Vec<String>, String) {
    let trimmed = sentence.trim();
    let body = trimmed.trim_end_matches(SENTENCE_END);
    let punctuation = trimmed[body.len()..].to_string();
    let tokens = body.split_whitespace().map(String::from).collect();
    (tokens, punctuation)
}

impl ReorderBoard {
    pub fn new<R: Rng + ?Sized>(correct: &str, rng: &mut R) -> Self {
        let (tokens, punctuation) = split_sentence(correct);
        let mut pool: Vec<usize> = (0..tokens.len()).collect();
        pool.shuffle(rng);
        Self {
            tokens,
            pool,
            sentence: Vec::new(),
            punctuation,
        }
    }

    pub fn available(&self) -> Vec<&str> {
        self.pool.iter().map(|&i| self.tokens[i].as_str()).collect()
    }

    pub fn placed(&self) -> Vec<&str> {
        self.sentence.iter().map(|&i| self.tokens[i].as_str()).collect()
    }

    pub fn is_complete(&self) -> bool {
        !self.tokens.is_empty() && self.sentence.len() == self.tokens.len()
    }

    /// Move a token from the pool to the end of the sentence.
    fn place(&mut self, pool_index: usize) -> bool {
        if pool_index >= self.pool.len() {
            return false;
        }
        let token = self.pool.remove(pool_index);
        self.sentence.push(token);
        true
    }

    /// Move a token from the sentence back to the pool.
    fn unplace(&mut self, sentence_index: usize) -> bool {
        if sentence_index >= self.sentence.len() {
            return false;
        }
        let token = self.sentence.remove(sentence_index);
        self.pool.push(token);
        true
    }

    /// The sentence built so far. Punctuation is reattached only once every
    /// token is placed.
    fn text(&self) -> Option<String> {
        if self.sentence.is_empty() {
            return None;
        }
        let mut text = self.placed().join(" ");
        if self.is_complete() {
            text.push_str(&self.punctuation);
        }
        Some(text)
    }

    /// Rebuild the sentence from a previously reported answer.
    fn restore(&mut self, text: &str) {
        self.pool.extend(self.sentence.drain(..));
        let (words, _) = split_sentence(text);
        for word in words {
            if let Some(pos) = self.pool.iter().position(|&i| self.tokens[i] == word) {
                self.place(pos);
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Input {
    Single(Option<String>),
    Multi(Vec<String>),
    Text(String),
    Reorder(ReorderBoard),
}

/// How an option should be marked once the answer is revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub id: String,
    pub text: String,
    pub selected: bool,
    pub mark: Option<OptionMark>,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderView {
    pub available: Vec<String>,
    pub sentence: Vec<String>,
}

/// Render-ready snapshot of a question.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionView {
    pub question_id: String,
    pub kind: QuestionKind,
    pub prompt: String,
    pub state: InteractionState,
    pub inputs_enabled: bool,
    pub options: Vec<OptionView>,
    pub text: Option<String>,
    pub reorder: Option<ReorderView>,
    /// Shown inline for wrong text answers after checking.
    pub correct_answer: Option<String>,
    /// Shown only after checking.
    pub explanation: Option<String>,
}

pub struct QuestionController {
    question: Question,
    check_immediately: bool,
    debounce: Duration,
    state: InteractionState,
    input: Input,
    generation: u64,
    sink: SharedSink,
}

impl QuestionController {
    pub fn new(question: Question, check_immediately: bool, sink: SharedSink) -> Self {
        Self::with_rng(question, check_immediately, sink, &mut rand::rng())
    }

    /// Like [`QuestionController::new`] with an explicit source for the
    /// reorder token shuffle.
    pub fn with_rng<R: Rng + ?Sized>(
        question: Question,
        check_immediately: bool,
        sink: SharedSink,
        rng: &mut R,
    ) -> Self {
        let input = match &question.body {
            QuestionBody::McqSingle { .. }
            | QuestionBody::TrueFalse { .. }
            | QuestionBody::ErrorSpotting { .. } => Input::Single(None),
            QuestionBody::McqMulti { .. } => Input::Multi(Vec::new()),
            QuestionBody::FillBlank { .. } => Input::Text(String::new()),
            QuestionBody::Reorder { correct } => Input::Reorder(ReorderBoard::new(correct, rng)),
        };
        Self {
            question,
            check_immediately,
            debounce: DEFAULT_MULTI_SELECT_DEBOUNCE,
            state: InteractionState::Unanswered,
            input,
            generation: 0,
            sink,
        }
    }

    /// A controller with answers already shown: inputs disabled, the given
    /// answer (if any) filled in and judged. No events are emitted.
    pub fn revealed(question: Question, answer: Option<&Answer>, sink: SharedSink) -> Self {
        let mut controller = Self::new(question, false, sink);
        if let Some(answer) = answer {
            controller.fill(answer);
        }
        let evaluation = check_answer(&controller.question, answer);
        controller.state = InteractionState::Checked(evaluation);
        controller
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.state, InteractionState::Checked(_))
    }

    pub fn checks_immediately(&self) -> bool {
        self.check_immediately
    }

    /// The current input as an answer; `None` while nothing is entered.
    pub fn current_answer(&self) -> Option<Answer> {
        let answer = match &self.input {
            Input::Single(selected) => selected.clone().map(Answer::One),
            Input::Multi(selected) => Some(Answer::Many(selected.clone())),
            Input::Text(text) => Some(Answer::One(text.trim().to_string())),
            Input::Reorder(board) => board.text().map(Answer::One),
        };
        answer.filter(|a| is_answered(self.question.kind(), Some(a)))
    }

    /// Pick an option of a single-choice question.
    pub fn select(&mut self, choice_id: &str) -> Result<Response, InteractionError> {
        self.ensure_open()?;
        self.ensure_choice(choice_id)?;
        let Input::Single(selected) = &mut self.input else {
            return Err(self.wrong_input());
        };
        *selected = Some(choice_id.to_string());
        self.after_change();
        if self.check_immediately {
            return Ok(Response::Checked(self.check()));
        }
        Ok(Response::Recorded)
    }

    /// Check or uncheck an option of a multi-select question.
    pub fn toggle(&mut self, choice_id: &str) -> Result<Response, InteractionError> {
        self.ensure_open()?;
        self.ensure_choice(choice_id)?;
        let order: Vec<String> = self.question.choices().into_iter().map(|c| c.id).collect();
        let Input::Multi(selected) = &mut self.input else {
            return Err(self.wrong_input());
        };
        if let Some(pos) = selected.iter().position(|c| c == choice_id) {
            selected.remove(pos);
        } else {
            selected.push(choice_id.to_string());
            selected.sort_by_key(|c| order.iter().position(|o| o == c));
        }
        self.after_change();
        if self.check_immediately {
            self.generation += 1;
            return Ok(Response::CheckScheduled(CheckTicket {
                question_id: self.question.id.clone(),
                generation: self.generation,
                delay: self.debounce,
            }));
        }
        Ok(Response::Recorded)
    }

    /// Deliver a debounced check. Stale tickets, locked questions and empty
    /// selections yield `None`.
    pub fn debounce_elapsed(&mut self, ticket: &CheckTicket) -> Option<Evaluation> {
        if ticket.question_id != self.question.id
            || ticket.generation != self.generation
            || self.is_locked()
            || self.current_answer().is_none()
        {
            return None;
        }
        Some(self.check())
    }

    /// Replace the text of a fill-in-the-blank question.
    ///
    /// In deferred mode every change is reported; in immediate mode the text
    /// is only reported when submitted.
    pub fn type_text(&mut self, text: &str) -> Result<Response, InteractionError> {
        self.ensure_open()?;
        let Input::Text(current) = &mut self.input else {
            return Err(self.wrong_input());
        };
        *current = text.to_string();
        if self.check_immediately {
            return Ok(Response::Recorded);
        }
        self.after_change();
        Ok(Response::Recorded)
    }

    /// Move a token from the available pool into the sentence.
    pub fn place_token(&mut self, pool_index: usize) -> Result<Response, InteractionError> {
        self.move_token(pool_index, true)
    }

    /// Move a token from the sentence back into the available pool.
    pub fn remove_token(&mut self, sentence_index: usize) -> Result<Response, InteractionError> {
        self.move_token(sentence_index, false)
    }

    /// Place the first unused token matching `word`, exactly or ignoring
    /// case.
    pub fn place_word(&mut self, word: &str) -> Result<Response, InteractionError> {
        self.ensure_open()?;
        let Input::Reorder(board) = &self.input else {
            return Err(self.wrong_input());
        };
        let available = board.available();
        let position = available
            .iter()
            .position(|t| *t == word)
            .or_else(|| available.iter().position(|t| t.to_lowercase() == word.to_lowercase()));
        match position {
            Some(index) => self.place_token(index),
            None => Err(InteractionError::UnknownWord {
                question_id: self.question.id.clone(),
                word: word.to_string(),
            }),
        }
    }

    /// Move every placed token back to the pool.
    pub fn clear_sentence(&mut self) -> Result<Response, InteractionError> {
        self.ensure_open()?;
        let Input::Reorder(board) = &mut self.input else {
            return Err(self.wrong_input());
        };
        if board.sentence.is_empty() {
            return Ok(Response::Recorded);
        }
        board.pool.extend(board.sentence.drain(..));
        self.after_change();
        Ok(Response::Recorded)
    }

    fn move_token(&mut self, index: usize, to_sentence: bool) -> Result<Response, InteractionError> {
        self.ensure_open()?;
        let question_id = self.question.id.clone();
        let Input::Reorder(board) = &mut self.input else {
            return Err(self.wrong_input());
        };
        let moved = if to_sentence {
            board.place(index)
        } else {
            board.unplace(index)
        };
        if !moved {
            return Err(InteractionError::NoSuchToken { question_id, index });
        }
        let complete = board.is_complete();
        self.after_change();
        if self.check_immediately && complete {
            return Ok(Response::Checked(self.check()));
        }
        Ok(Response::Recorded)
    }

    /// The explicit "Check" action (button or Enter).
    ///
    /// Deferred questions are not self-checked, so this only records.
    pub fn submit(&mut self) -> Result<Response, InteractionError> {
        self.ensure_open()?;
        if !self.check_immediately {
            return Ok(Response::Recorded);
        }
        if self.current_answer().is_none() {
            return Err(InteractionError::NothingToCheck(self.question.id.clone()));
        }
        // Supersedes any pending debounced check.
        self.generation += 1;
        if matches!(self.input, Input::Text(_)) {
            self.report();
        }
        Ok(Response::Checked(self.check()))
    }

    /// Pre-fill a previously given answer without reporting it.
    pub fn restore(&mut self, answer: &Answer) {
        if self.is_locked() {
            return;
        }
        self.fill(answer);
        self.state = if self.current_answer().is_some() {
            InteractionState::Answered
        } else {
            InteractionState::Unanswered
        };
    }

    fn fill(&mut self, answer: &Answer) {
        match &mut self.input {
            Input::Single(selected) => *selected = answer.as_one().map(String::from),
            Input::Multi(selected) => {
                *selected = answer.values().into_iter().map(String::from).collect();
            }
            Input::Text(text) => *text = answer.as_one().unwrap_or_default().to_string(),
            Input::Reorder(board) => board.restore(answer.as_one().unwrap_or_default()),
        }
    }

    pub fn view(&self) -> QuestionView {
        let checked = self.is_locked();
        let correct = self.question.correct_answer();
        let correct_ids = correct.values();

        let selected_ids: Vec<&str> = match &self.input {
            Input::Single(Some(id)) => vec![id.as_str()],
            Input::Multi(ids) => ids.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        };

        let options = self
            .question
            .choices()
            .into_iter()
            .map(|choice| {
                let selected = selected_ids.contains(&choice.id.as_str());
                let mark = if !checked {
                    None
                } else if correct_ids.contains(&choice.id.as_str()) {
                    Some(OptionMark::Correct)
                } else if selected {
                    Some(OptionMark::Incorrect)
                } else {
                    None
                };
                OptionView {
                    selected,
                    mark,
                    feedback: if checked { choice.feedback } else { None },
                    id: choice.id,
                    text: choice.text,
                }
            })
            .collect();

        let correct_answer = match self.state {
            InteractionState::Checked(eval) if !eval.correct && self.question.kind().is_text() => {
                correct.as_one().map(String::from)
            }
            _ => None,
        };

        QuestionView {
            question_id: self.question.id.clone(),
            kind: self.question.kind(),
            prompt: self.question.prompt.clone(),
            state: self.state,
            inputs_enabled: !checked,
            options,
            text: match &self.input {
                Input::Text(text) => Some(text.clone()),
                _ => None,
            },
            reorder: match &self.input {
                Input::Reorder(board) => Some(ReorderView {
                    available: board.available().into_iter().map(String::from).collect(),
                    sentence: board.placed().into_iter().map(String::from).collect(),
                }),
                _ => None,
            },
            correct_answer,
            explanation: if checked {
                self.question.explanation.clone()
            } else {
                None
            },
        }
    }

    fn ensure_open(&self) -> Result<(), InteractionError> {
        if self.is_locked() {
            return Err(InteractionError::Locked(self.question.id.clone()));
        }
        Ok(())
    }

    fn ensure_choice(&self, choice_id: &str) -> Result<(), InteractionError> {
        if self.question.choices().iter().any(|c| c.id == choice_id) {
            return Ok(());
        }
        if self.question.kind().is_text() {
            return Err(self.wrong_input());
        }
        Err(InteractionError::UnknownChoice {
            question_id: self.question.id.clone(),
            choice_id: choice_id.to_string(),
        })
    }

    fn wrong_input(&self) -> InteractionError {
        InteractionError::WrongInput {
            question_id: self.question.id.clone(),
            kind: self.question.kind(),
        }
    }

    fn after_change(&mut self) {
        self.state = if self.current_answer().is_some() {
            InteractionState::Answered
        } else {
            InteractionState::Unanswered
        };
        self.report();
    }

    fn report(&self) {
        self.sink.emit(&QuizEvent::AnswerChanged {
            question_id: self.question.id.clone(),
            answer: self.current_answer(),
        });
    }

    fn check(&mut self) -> Evaluation {
        let evaluation = check_answer(&self.question, self.current_answer().as_ref());
        self.state = InteractionState::Checked(evaluation);
        tracing::debug!(question = %self.question.id, correct = evaluation.correct, "answer checked");
        self.sink.emit(&QuizEvent::AnswerChecked {
            question_id: self.question.id.clone(),
            evaluation,
        });
        evaluation
    }
}
