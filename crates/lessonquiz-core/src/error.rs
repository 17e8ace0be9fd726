//! Error types for content loading, test generation, interaction and sessions.
//!
//! Answer checking has no error type: it fails closed. Rejected navigation
//! is not an error either; see [`crate::session::Navigation`].

use thiserror::Error;

use crate::model::QuestionKind;

/// A question or chapter that violates the content schema.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("question {id}: unknown question type '{kind}'")]
    UnknownQuestionType { id: String, kind: String },

    #[error("question {id}: {kind} question has no choices")]
    MissingChoices { id: String, kind: QuestionKind },

    #[error("question {id}: duplicate choice id '{choice}'")]
    DuplicateChoice { id: String, choice: String },

    #[error("question {id}: invalid correct_answer, {reason}")]
    InvalidCorrectAnswer { id: String, reason: String },

    #[error("question {id}: difficulty must be at least 1")]
    InvalidDifficulty { id: String },
}

/// Failure to build a final test for a chapter.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// The chapter lacks `chapter_test` or `question_bank`.
    #[error("cannot start test: chapter {chapter_id} has no test configuration")]
    MissingTestConfig { chapter_id: String },
}

/// Input that a question controller refuses.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InteractionError {
    /// The answer has been checked; inputs are disabled.
    #[error("question {0} is already answered")]
    Locked(String),

    #[error("question {question_id} has no choice '{choice_id}'")]
    UnknownChoice {
        question_id: String,
        choice_id: String,
    },

    #[error("{kind} question {question_id} does not accept this input")]
    WrongInput {
        question_id: String,
        kind: QuestionKind,
    },

    #[error("question {question_id} has no token at position {index}")]
    NoSuchToken { question_id: String, index: usize },

    #[error("question {question_id} has no unused word '{word}'")]
    UnknownWord { question_id: String, word: String },

    /// A check was requested with an empty selection or blank text.
    #[error("question {0} has nothing to check yet")]
    NothingToCheck(String),
}

/// Invalid use of a test session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot {action} while the test is {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },

    #[error("cannot start test: chapter {chapter_id} has no eligible questions")]
    EmptyTest { chapter_id: String },

    #[error("question {0} is not part of this test")]
    UnknownQuestion(String),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Interaction(#[from] InteractionError),
}

/// Failure of the result persistence sink.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("result store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("result store data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
