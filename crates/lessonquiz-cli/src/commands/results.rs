//! The `lessonquiz results` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use lessonquiz_core::results::TestResult;
use lessonquiz_core::store::ResultStore;
use lessonquiz_report::{render_breakdown, results_summary, write_html_report};

use crate::Paths;

pub fn execute(
    chapter: Option<String>,
    clear: bool,
    format: String,
    html: Option<PathBuf>,
    paths: Paths,
) -> Result<()> {
    let config = super::settings(&paths)?;
    let store = super::result_store(&config);

    if clear {
        match &chapter {
            Some(id) => {
                store.clear_test_result(id)?;
                println!("Cleared result for {id}.");
            }
            None => {
                store.clear_all_results()?;
                println!("Cleared all results.");
            }
        }
        return Ok(());
    }

    let results: Vec<TestResult> = match &chapter {
        Some(id) => vec![store
            .get_test_result(id)?
            .with_context(|| format!("no stored result for chapter {id}"))?],
        None => store.all_results()?.into_values().collect(),
    };

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&results)?),
        "markdown" => print!("{}", results_summary(&results, config.pass_percentage)),
        "table" => {
            if results.is_empty() {
                println!("No results yet.");
            } else if chapter.is_some() {
                for result in &results {
                    print!("{}", render_breakdown(result, config.pass_percentage));
                }
            } else {
                print_table(&results, config.pass_percentage);
            }
        }
        other => anyhow::bail!("unknown format '{other}' (expected table, markdown or json)"),
    }

    if let Some(path) = html {
        write_html_report(&results, config.pass_percentage, &path)?;
        println!("HTML results written to {}", path.display());
    }

    Ok(())
}

fn print_table(results: &[TestResult], pass_percentage: u32) {
    let mut table = Table::new();
    table.set_header(vec!["Chapter", "Correct", "Score", "Status", "Completed"]);

    for r in results {
        let status = if r.passed(pass_percentage) {
            "pass"
        } else {
            "fail"
        };
        table.add_row(vec![
            Cell::new(&r.chapter_id),
            Cell::new(format!("{}/{}", r.correct_count, r.total)),
            Cell::new(format!("{}%", r.percentage)),
            Cell::new(status),
            Cell::new(r.completed_at.format("%Y-%m-%d %H:%M")),
        ]);
    }

    println!("{table}");
}
