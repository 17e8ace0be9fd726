//! The `lessonquiz play` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use lessonquiz_core::events::EventBus;
use lessonquiz_core::session::{Navigation, SessionPhase, TestSession};
use lessonquiz_core::source::ContentSource;
use lessonquiz_report::{render_breakdown, write_html_report};

use crate::terminal::{self, Input};
use crate::Paths;

pub async fn execute(
    chapter_id: String,
    seed: Option<u64>,
    html: Option<PathBuf>,
    paths: Paths,
) -> Result<()> {
    let config = super::settings(&paths)?;
    let chapter = super::content_source(&config)
        .load_chapter(&chapter_id)
        .await?;
    println!("{}", chapter.display_title());

    let bus = Arc::new(EventBus::new());
    bus.subscribe(terminal::print_event);

    let store = Arc::new(super::result_store(&config));
    let mut session = TestSession::new(chapter, store, bus);
    if let Some(seed) = seed {
        session = session.with_rng(StdRng::seed_from_u64(seed));
    }
    session.start()?;

    let mut input = Input::stdin();
    let mut show = true;
    while !matches!(session.phase(), SessionPhase::Finished(_)) {
        if show {
            if let Some(view) = session.view() {
                let progress = session.progress();
                print!(
                    "{}",
                    terminal::render_view(&view, Some((progress.position, progress.total)))
                );
            }
        }
        show = true;

        let Some(line) = input.next_line().await? else {
            println!("Test abandoned.");
            return Ok(());
        };

        let navigation = match line.as_str() {
            ":quit" => {
                println!("Test abandoned.");
                return Ok(());
            }
            ":back" => session.prev()?,
            ":finish" => session.request_finish()?,
            ":restart" => {
                session.restart()?;
                continue;
            }
            "" => session.next()?,
            answer => match session.with_current(|c| terminal::enter_answer(c, answer)) {
                Ok(_) => session.next()?,
                Err(e) => {
                    println!("{e}");
                    show = false;
                    continue;
                }
            },
        };

        match navigation {
            Navigation::NeedsConfirmation { .. } => {
                let confirmed = input
                    .next_line()
                    .await?
                    .is_some_and(|reply| reply.eq_ignore_ascii_case("y"));
                if confirmed {
                    session.confirm_finish()?;
                }
            }
            Navigation::Blocked(_) => show = false,
            Navigation::Moved { .. } | Navigation::Finished => {}
        }
    }

    let pass_percentage = config.pass_percentage;
    let result = session
        .result()
        .context("test finished without a result")?;
    println!();
    print!("{}", render_breakdown(result, pass_percentage));

    if let Some(path) = html {
        write_html_report(std::slice::from_ref(result), pass_percentage, &path)?;
        println!("\nHTML results written to {}", path.display());
    }
    Ok(())
}
