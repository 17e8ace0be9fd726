//! Plain-text result breakdown.

use std::fmt::Write;

use lessonquiz_core::model::{Answer, Question, QuestionKind};
use lessonquiz_core::results::TestResult;

/// Placeholder for a question left unanswered.
pub const NOT_ANSWERED: &str = "(not answered)";

/// Human-readable form of an answer.
///
/// Choice ids become their texts (unknown ids are shown as-is), multi
/// answers are joined with ", ", text answers are shown verbatim.
pub fn format_answer(question: &Question, answer: Option<&Answer>) -> String {
    let Some(answer) = answer else {
        return NOT_ANSWERED.to_string();
    };

    let text = match question.kind() {
        QuestionKind::FillBlank | QuestionKind::Reorder => answer.values().join(", "),
        _ => answer
            .values()
            .into_iter()
            .map(|id| question.choice_text(id).unwrap_or_else(|| id.to_string()))
            .collect::<Vec<_>>()
            .join(", "),
    };

    if text.trim().is_empty() {
        NOT_ANSWERED.to_string()
    } else {
        text
    }
}

/// Score line plus one entry per question: the learner's answer, the
/// correct answer when wrong, and the explanation.
pub fn render_breakdown(result: &TestResult, pass_percentage: u32) -> String {
    let mut out = String::new();
    let verdict = if result.passed(pass_percentage) {
        "PASSED"
    } else {
        "NOT PASSED"
    };
    let _ = writeln!(
        out,
        "Result: {}/{} correct ({}%) {}",
        result.correct_count, result.total, result.percentage, verdict
    );

    for (i, outcome) in result.details.iter().enumerate() {
        let q = &outcome.question;
        let mark = if outcome.correct { "✓" } else { "✗" };
        let _ = writeln!(out);
        let _ = writeln!(out, "{mark} Question {}: {}", i + 1, q.prompt);
        let _ = writeln!(
            out,
            "  Your answer: {}",
            format_answer(q, outcome.user_answer.as_ref())
        );
        if !outcome.correct {
            let _ = writeln!(
                out,
                "  Correct answer: {}",
                format_answer(q, Some(&q.correct_answer()))
            );
        }
        if let Some(explanation) = &q.explanation {
            let _ = writeln!(out, "  {explanation}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lessonquiz_core::model::{Choice, QuestionBody};

    fn question(body: QuestionBody) -> Question {
        Question {
            id: "q".into(),
            prompt: "She ___ home.".into(),
            difficulty: 1,
            theory_block_id: None,
            explanation: Some("Third person takes -s.".into()),
            body,
        }
    }

    fn choices() -> Vec<Choice> {
        [("a", "go"), ("b", "goes"), ("c", "going")]
            .iter()
            .map(|(id, text)| Choice {
                id: id.to_string(),
                text: text.to_string(),
                feedback: None,
            })
            .collect()
    }

    #[test]
    fn choice_ids_become_texts() {
        let q = question(QuestionBody::McqSingle {
            choices: choices(),
            correct: "b".into(),
        });
        assert_eq!(format_answer(&q, Some(&"b".into())), "goes");
        assert_eq!(format_answer(&q, Some(&"zz".into())), "zz");
        assert_eq!(format_answer(&q, None), NOT_ANSWERED);
    }

    #[test]
    fn multi_answers_are_joined() {
        let q = question(QuestionBody::McqMulti {
            choices: choices(),
            correct: vec!["a".into(), "b".into()],
        });
        assert_eq!(format_answer(&q, Some(&vec!["a", "c"].into())), "go, going");
        assert_eq!(format_answer(&q, Some(&Answer::Many(vec![]))), NOT_ANSWERED);
    }

    #[test]
    fn true_false_reads_as_words() {
        let q = question(QuestionBody::TrueFalse { correct: true });
        assert_eq!(format_answer(&q, Some(&"true".into())), "True");
        assert_eq!(format_answer(&q, Some(&"false".into())), "False");
    }

    #[test]
    fn text_answers_are_verbatim() {
        let q = question(QuestionBody::FillBlank {
            correct: "goes".into(),
        });
        assert_eq!(format_answer(&q, Some(&"Goes".into())), "Goes");
    }

    #[test]
    fn breakdown_shows_correction_only_when_wrong() {
        let right = question(QuestionBody::FillBlank {
            correct: "goes".into(),
        });
        let mut wrong = right.clone();
        wrong.id = "q2".into();
        let answers = [Answer::from("goes"), Answer::from("go")];
        let questions = vec![right, wrong];
        let result = TestResult::score("ch1", &questions, |id| {
            Some(if id == "q" { &answers[0] } else { &answers[1] })
        });

        let text = render_breakdown(&result, 70);
        assert!(text.starts_with("Result: 1/2 correct (50%) NOT PASSED"));
        assert_eq!(text.matches("Correct answer: goes").count(), 1);
        assert!(text.contains("Your answer: go\n"));
        assert_eq!(text.matches("Third person takes -s.").count(), 2);
    }
}
