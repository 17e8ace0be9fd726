//! The `lessonquiz validate` command.

use std::path::PathBuf;

use anyhow::Result;

use lessonquiz_core::parser::{
    chapter_paths, find_cross_chapter_duplicates, parse_chapter, validate_chapter,
    ValidationWarning,
};

use crate::Paths;

pub fn execute(path: Option<PathBuf>, paths: Paths) -> Result<()> {
    let config = super::settings(&paths)?;
    let path = path.unwrap_or_else(|| config.content_dir.clone());

    let chapters = if path.is_dir() {
        let mut chapters = Vec::new();
        let mut failed = 0;
        for file in chapter_paths(&path, &config.chapter_file)? {
            match parse_chapter(&file) {
                Ok(chapter) => chapters.push(chapter),
                Err(e) => {
                    println!("ERROR: {e:#}");
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            anyhow::bail!("{failed} chapter file(s) could not be parsed");
        }
        chapters
    } else {
        vec![parse_chapter(&path)?]
    };

    let mut total_warnings = 0;

    for chapter in &chapters {
        println!(
            "Chapter: {} ({} questions)",
            chapter.display_title(),
            chapter.questions().len()
        );

        let warnings = validate_chapter(chapter);
        print_warnings(&warnings);
        total_warnings += warnings.len();
    }

    let cross = find_cross_chapter_duplicates(&chapters);
    if !cross.is_empty() {
        println!("Across chapters:");
        print_warnings(&cross);
        total_warnings += cross.len();
    }

    if total_warnings == 0 {
        println!("All chapters valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}

fn print_warnings(warnings: &[ValidationWarning]) {
    for w in warnings {
        let prefix = w
            .question_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }
}
