//! lessonquiz-core: Content model, answer checking, test selection and the
//! quiz state machines.
//!
//! This crate holds everything that decides what a learner sees and how
//! their answers are judged. It has no rendering surface: state machines
//! emit [`events::QuizEvent`]s and persist through [`store::ResultStore`].

pub mod debounce;
pub mod error;
pub mod evaluator;
pub mod events;
pub mod inline;
pub mod interaction;
pub mod model;
pub mod parser;
pub mod results;
pub mod selector;
pub mod session;
pub mod source;
pub mod store;

pub use error::{ContentError, InteractionError, SelectionError, SessionError, StoreError};
pub use evaluator::check_answer;
pub use model::{Answer, Chapter, Question, QuestionKind};
pub use results::{Evaluation, TestResult};
pub use selector::generate_chapter_test;
pub use session::TestSession;
