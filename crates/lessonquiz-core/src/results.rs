//! Evaluation and test result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::evaluator::check_answer;
use crate::model::{Answer, Question};

/// Outcome of checking one answer. `score` is 1 when correct, else 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub correct: bool,
    pub score: u32,
}

impl Evaluation {
    pub fn from_correct(correct: bool) -> Self {
        Self {
            correct,
            score: u32::from(correct),
        }
    }

    pub fn incorrect() -> Self {
        Self::from_correct(false)
    }
}

/// Per-question line of a finished test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOutcome {
    /// Snapshot of the question as it was asked.
    pub question: Question,
    #[serde(default)]
    pub user_answer: Option<Answer>,
    pub correct: bool,
    pub score: u32,
}

/// Persisted record of a chapter's most recent final test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub chapter_id: String,
    pub score: u32,
    pub total: u32,
    /// `round(100 * correct_count / total)`.
    pub percentage: u32,
    pub correct_count: u32,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub details: Vec<QuestionOutcome>,
}

impl TestResult {
    /// Score every question against the stored answers.
    ///
    /// `answer_for` returns `None` for unanswered questions, which count as
    /// incorrect.
    pub fn score<'a, F>(chapter_id: &str, questions: &[Question], answer_for: F) -> Self
    where
        F: Fn(&str) -> Option<&'a Answer>,
    {
        let details: Vec<QuestionOutcome> = questions
            .iter()
            .map(|q| {
                let user_answer = answer_for(&q.id);
                let evaluation = check_answer(q, user_answer);
                QuestionOutcome {
                    question: q.clone(),
                    user_answer: user_answer.cloned(),
                    correct: evaluation.correct,
                    score: evaluation.score,
                }
            })
            .collect();

        let total = details.len() as u32;
        let correct_count = details.iter().filter(|d| d.correct).count() as u32;
        let score = details.iter().map(|d| d.score).sum();

        Self {
            chapter_id: chapter_id.to_string(),
            score,
            total,
            percentage: percentage(correct_count, total),
            correct_count,
            completed_at: Utc::now(),
            details,
        }
    }

    /// Whether the percentage reaches the given pass mark.
    pub fn passed(&self, pass_percentage: u32) -> bool {
        self.percentage >= pass_percentage
    }
}

/// Rounded whole percentage; 0 when there is nothing to score.
pub fn percentage(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * f64::from(correct) / f64::from(total)).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionBody;
    use std::collections::HashMap;

    fn fill(id: &str, correct: &str) -> Question {
        Question {
            id: id.into(),
            prompt: format!("prompt {id}"),
            difficulty: 1,
            theory_block_id: None,
            explanation: None,
            body: QuestionBody::FillBlank {
                correct: correct.into(),
            },
        }
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn scores_two_of_three() {
        let questions = vec![fill("a", "am"), fill("b", "is"), fill("c", "are")];
        let answers: HashMap<String, Answer> = [
            ("a".to_string(), Answer::from("am")),
            ("b".to_string(), Answer::from("IS ")),
            ("c".to_string(), Answer::from("is")),
        ]
        .into_iter()
        .collect();

        let result = TestResult::score("ch1", &questions, |id| answers.get(id));
        assert_eq!(result.score, 2);
        assert_eq!(result.total, 3);
        assert_eq!(result.correct_count, 2);
        assert_eq!(result.percentage, 67);
        assert!(!result.details[2].correct);
        assert!(result.passed(60));
        assert!(!result.passed(70));
    }

    #[test]
    fn unanswered_counts_as_incorrect() {
        let questions = vec![fill("a", "am")];
        let result = TestResult::score("ch1", &questions, |_| None);
        assert_eq!(result.correct_count, 0);
        assert!(result.details[0].user_answer.is_none());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let questions = vec![fill("a", "am")];
        let result = TestResult::score("ch1", &questions, |_| None);
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("correctCount").is_some());
        assert!(json.get("completedAt").is_some());
        assert!(json["details"][0].get("userAnswer").is_some());
    }
}
