//! Line-oriented rendering of question views and parsing of typed answers.

use std::fmt::Write;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use lessonquiz_core::error::InteractionError;
use lessonquiz_core::events::{BlockReason, QuizEvent};
use lessonquiz_core::interaction::{
    InteractionState, OptionMark, QuestionController, QuestionView, Response,
};
use lessonquiz_core::model::{Question, QuestionKind};

/// Lines typed by the learner.
pub struct Input {
    lines: Lines<BufReader<Stdin>>,
}

impl Input {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// The next line, trimmed. `None` at end of input.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }
}

/// Print the events a test session reports to the learner.
pub fn print_event(event: &QuizEvent) {
    match event {
        QuizEvent::TestStarted { total, .. } => {
            println!("Test started: {total} questions.");
            println!("Type an answer and press Enter. Commands: :back, :finish, :restart, :quit");
        }
        QuizEvent::NavigationBlocked { reason, .. } => match reason {
            BlockReason::Unanswered => println!("Please answer this question first."),
            BlockReason::AtStart => println!("This is the first question."),
        },
        QuizEvent::ConfirmFinish { unanswered } => {
            println!("{unanswered} question(s) unanswered. Finish anyway? [y/N]");
        }
        QuizEvent::ResultNotSaved { message, .. } => {
            eprintln!("Warning: result not saved: {message}");
        }
        _ => {}
    }
}

fn input_hint(kind: QuestionKind) -> &'static str {
    match kind {
        QuestionKind::McqSingle | QuestionKind::ErrorSpotting => "Enter an option number",
        QuestionKind::TrueFalse => "Enter 1 (True) or 2 (False)",
        QuestionKind::McqMulti => "Enter every correct option number, separated by commas",
        QuestionKind::FillBlank => "Type the missing word(s)",
        QuestionKind::Reorder => "Type the words in order",
    }
}

/// Render a question view. `position` is `(1-based index, total)`.
pub fn render_view(view: &QuestionView, position: Option<(usize, usize)>) -> String {
    let mut out = String::new();
    match position {
        Some((index, total)) => {
            let _ = writeln!(out, "\nQuestion {index}/{total}: {}", view.prompt);
        }
        None => {
            let _ = writeln!(out, "\n{}", view.prompt);
        }
    }

    let multi = view.kind == QuestionKind::McqMulti;
    for (i, option) in view.options.iter().enumerate() {
        let box_ = match (multi, option.selected) {
            (true, true) => "[x]",
            (true, false) => "[ ]",
            (false, true) => "(*)",
            (false, false) => "( )",
        };
        let mark = match option.mark {
            Some(OptionMark::Correct) => " ✓",
            Some(OptionMark::Incorrect) => " ✗",
            None => "",
        };
        let _ = writeln!(out, "  {box_} {}. {}{mark}", i + 1, option.text);
        if let Some(feedback) = &option.feedback {
            let _ = writeln!(out, "        {feedback}");
        }
    }

    if let Some(text) = view.text.as_deref().filter(|t| !t.is_empty()) {
        let _ = writeln!(out, "  Your answer: {text}");
    }
    if let Some(board) = &view.reorder {
        if !board.available.is_empty() {
            let _ = writeln!(out, "  Words: {}", board.available.join(" | "));
        }
        if !board.sentence.is_empty() {
            let _ = writeln!(out, "  Sentence: {}", board.sentence.join(" "));
        }
    }

    match view.state {
        InteractionState::Checked(evaluation) => {
            let verdict = if evaluation.correct {
                "Correct!"
            } else {
                "Incorrect."
            };
            let _ = writeln!(out, "{verdict}");
            if let Some(correct) = &view.correct_answer {
                let _ = writeln!(out, "Correct answer: {correct}");
            }
            if let Some(explanation) = &view.explanation {
                let _ = writeln!(out, "{explanation}");
            }
        }
        _ if view.inputs_enabled => {
            let _ = writeln!(out, "{}:", input_hint(view.kind));
        }
        _ => {}
    }
    out
}

/// Map a typed token to a choice id: an exact id, an id ignoring case, or
/// a 1-based option number. Anything else is passed through unchanged so
/// the controller can refuse it.
fn resolve_choice(question: &Question, token: &str) -> String {
    let choices = question.choices();
    if let Some(choice) = choices
        .iter()
        .find(|c| c.id == token)
        .or_else(|| choices.iter().find(|c| c.id.eq_ignore_ascii_case(token)))
    {
        return choice.id.clone();
    }
    match token.parse::<usize>() {
        Ok(n) if (1..=choices.len()).contains(&n) => choices[n - 1].id.clone(),
        _ => token.to_string(),
    }
}

/// Apply one typed line as the answer to a question.
///
/// The line replaces whatever was entered before. Fill-in and reorder
/// answers are submitted as well, which checks them in immediate mode.
/// Refuse a reorder line before touching the board if any word is not one
/// of the question's tokens.
fn check_words(controller: &QuestionController, words: &[String]) -> Result<(), InteractionError> {
    let mut tokens: Vec<String> = controller
        .view()
        .reorder
        .map(|board| board.available.into_iter().chain(board.sentence).collect())
        .unwrap_or_default();
    for word in words {
        let found = tokens
            .iter()
            .position(|t| t == word)
            .or_else(|| tokens.iter().position(|t| t.to_lowercase() == word.to_lowercase()));
        match found {
            Some(i) => {
                tokens.swap_remove(i);
            }
            None => {
                return Err(InteractionError::UnknownWord {
                    question_id: controller.question().id.clone(),
                    word: word.clone(),
                })
            }
        }
    }
    Ok(())
}

pub fn enter_answer(
    controller: &mut QuestionController,
    line: &str,
) -> Result<Response, InteractionError> {
    let question = controller.question().clone();
    match question.kind() {
        QuestionKind::McqSingle | QuestionKind::TrueFalse | QuestionKind::ErrorSpotting => {
            controller.select(&resolve_choice(&question, line))
        }
        QuestionKind::McqMulti => {
            let mut wanted: Vec<String> = Vec::new();
            for token in line.split([',', ' ']).filter(|t| !t.is_empty()) {
                let id = resolve_choice(&question, token);
                if !question.choices().iter().any(|c| c.id == id) {
                    return Err(InteractionError::UnknownChoice {
                        question_id: question.id.clone(),
                        choice_id: id,
                    });
                }
                if !wanted.contains(&id) {
                    wanted.push(id);
                }
            }
            let current: Vec<String> = controller
                .current_answer()
                .map(|a| a.values().into_iter().map(String::from).collect())
                .unwrap_or_default();

            let mut response = Response::Recorded;
            for id in current.iter().filter(|id| !wanted.contains(id)) {
                response = controller.toggle(id)?;
            }
            for id in wanted.iter().filter(|id| !current.contains(id)) {
                response = controller.toggle(id)?;
            }
            Ok(response)
        }
        QuestionKind::FillBlank => {
            controller.type_text(line)?;
            controller.submit()
        }
        QuestionKind::Reorder => {
            let (words, _) = lessonquiz_core::interaction::split_sentence(line);
            check_words(controller, &words)?;
            controller.clear_sentence()?;
            let mut response = Response::Recorded;
            for word in &words {
                response = controller.place_word(word)?;
            }
            if controller.is_locked() {
                return Ok(response);
            }
            controller.submit()
        }
    }
}
