//! The `lessonquiz quiz` command.

use std::sync::Arc;

use anyhow::{Context, Result};

use lessonquiz_core::check_answer;
use lessonquiz_core::events::NoopSink;
use lessonquiz_core::inline::InlineQuiz;
use lessonquiz_core::interaction::{QuestionController, Response};
use lessonquiz_core::source::ContentSource;

use crate::terminal::{self, Input};
use crate::Paths;

pub async fn execute(chapter_id: String, block: Option<String>, paths: Paths) -> Result<()> {
    let config = super::settings(&paths)?;
    let chapter = super::content_source(&config)
        .load_chapter(&chapter_id)
        .await?;

    let block_id = match block {
        Some(id) => id,
        None => chapter
            .inline_quizzes()
            .first()
            .map(|(id, _, _)| id.to_string())
            .with_context(|| format!("chapter {chapter_id} has no inline quizzes"))?,
    };

    let mut quiz = InlineQuiz::with_debounce(
        &chapter,
        &block_id,
        Arc::new(NoopSink),
        config.multi_select_debounce(),
    )
    .with_context(|| format!("chapter {chapter_id} has no quiz block '{block_id}'"))?;
    if quiz.is_empty() {
        anyhow::bail!("quiz block '{block_id}' has no questions");
    }

    println!("{}", quiz.title().unwrap_or(chapter.display_title()));
    let total = quiz.len();
    let mut input = Input::stdin();

    for index in 0..total {
        print!(
            "{}",
            terminal::render_view(&quiz.controllers()[index].view(), Some((index + 1, total)))
        );
        loop {
            let Some(line) = input.next_line().await? else {
                return Ok(());
            };
            match quiz.apply(index, |c| terminal::enter_answer(c, &line)) {
                Ok(Response::CheckScheduled(_)) => {
                    quiz.next_check().await;
                    break;
                }
                Ok(_) => break,
                Err(e) => println!("{e}"),
            }
        }

        let controller = &quiz.controllers()[index];
        if controller.is_locked() {
            print!("{}", terminal::render_view(&controller.view(), None));
        }
    }

    // Deferred blocks reveal everything once the last answer is in.
    let mut correct = 0;
    for controller in quiz.controllers() {
        let question = controller.question();
        let answer = quiz.answer_for(&question.id);
        if check_answer(question, answer).correct {
            correct += 1;
        }
        if !controller.checks_immediately() {
            let revealed =
                QuestionController::revealed(question.clone(), answer, Arc::new(NoopSink));
            print!("{}", terminal::render_view(&revealed.view(), None));
        }
    }
    println!("\nScore: {correct}/{total}");
    Ok(())
}
