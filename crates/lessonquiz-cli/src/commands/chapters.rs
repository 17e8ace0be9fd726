//! The `lessonquiz chapters` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use lessonquiz_core::source::{group_chapters_by_section, ContentSource};
use lessonquiz_core::store::ResultStore;

use crate::Paths;

pub async fn execute(paths: Paths) -> Result<()> {
    let config = super::settings(&paths)?;
    let chapters = super::content_source(&config).load_all_chapters().await?;
    if chapters.is_empty() {
        println!("No chapters found in {}", config.content_dir.display());
        return Ok(());
    }

    // Listing still works when the results file is unreadable.
    let results = super::result_store(&config)
        .all_results()
        .unwrap_or_default();

    for section in group_chapters_by_section(chapters) {
        println!("\nSection: {}", section.id);

        let mut table = Table::new();
        table.set_header(vec!["Chapter", "Title", "Level", "Questions", "Quizzes", "Last test"]);
        for chapter in &section.chapters {
            let last = match results.get(&chapter.id) {
                Some(r) => format!("{}%", r.percentage),
                None if chapter.has_test() => "-".to_string(),
                None => "no test".to_string(),
            };
            table.add_row(vec![
                Cell::new(&chapter.id),
                Cell::new(chapter.display_title()),
                Cell::new(chapter.level.as_deref().unwrap_or("")),
                Cell::new(chapter.questions().len()),
                Cell::new(chapter.inline_quizzes().len()),
                Cell::new(last),
            ]);
        }
        println!("{table}");
    }
    Ok(())
}
