//! Answer checking for all six question kinds.
//!
//! Checking is total: a missing, empty or mis-shaped answer is simply
//! incorrect, so one bad record never aborts the scoring of a test.

use crate::model::{Answer, QuestionBody, QuestionKind, Question, FALSE_ID, TRUE_ID};
use crate::results::Evaluation;

/// Check a learner's answer against a question.
pub fn check_answer(question: &Question, answer: Option<&Answer>) -> Evaluation {
    let Some(answer) = answer else {
        return Evaluation::incorrect();
    };

    let correct = match &question.body {
        QuestionBody::McqSingle { correct, .. } | QuestionBody::ErrorSpotting { correct, .. } => {
            answer.as_one().is_some_and(|a| !a.is_empty() && a == correct)
        }
        QuestionBody::TrueFalse { correct } => {
            let expected = if *correct { TRUE_ID } else { FALSE_ID };
            answer.as_one().is_some_and(|a| a == expected)
        }
        QuestionBody::McqMulti { correct, .. } => same_id_set(correct, &answer.values()),
        QuestionBody::FillBlank { correct } | QuestionBody::Reorder { correct } => answer
            .as_one()
            .is_some_and(|a| !a.is_empty() && normalize_text(a) == normalize_text(correct)),
    };

    Evaluation::from_correct(correct)
}

/// Case-fold and trim free text before comparison.
pub fn normalize_text(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Exact set equality by comparing sorted id sequences.
fn same_id_set(expected: &[String], given: &[&str]) -> bool {
    if given.is_empty() || expected.len() != given.len() {
        return false;
    }
    let mut expected: Vec<&str> = expected.iter().map(String::as_str).collect();
    let mut given = given.to_vec();
    expected.sort_unstable();
    given.sort_unstable();
    expected == given
}

/// Whether an answer counts as given for navigation purposes.
///
/// Choice kinds need a non-empty value, `mcq_multi` needs at least one
/// selection, text kinds need non-whitespace text.
pub fn is_answered(kind: QuestionKind, answer: Option<&Answer>) -> bool {
    let Some(answer) = answer else {
        return false;
    };
    match kind {
        QuestionKind::McqMulti => !answer.values().is_empty(),
        QuestionKind::FillBlank | QuestionKind::Reorder => {
            answer.as_one().is_some_and(|a| !a.trim().is_empty())
        }
        QuestionKind::McqSingle | QuestionKind::TrueFalse | QuestionKind::ErrorSpotting => {
            answer.as_one().is_some_and(|a| !a.is_empty())
        }
    }
}
