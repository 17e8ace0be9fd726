//! HTML results page.
//!
//! A single self-contained file: styles and the small filter script are
//! inlined, so the page can be opened straight from disk.

use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};

use lessonquiz_core::results::{QuestionOutcome, TestResult};

use crate::text::format_answer;

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn status_class(result: &TestResult, pass_percentage: u32) -> &'static str {
    if result.passed(pass_percentage) {
        "pass"
    } else if result.percentage * 2 >= pass_percentage {
        "near"
    } else {
        "fail"
    }
}

/// Render a results page for one or more finished tests.
pub fn generate_html(results: &[TestResult], pass_percentage: u32) -> String {
    let passed = results
        .iter()
        .filter(|r| r.passed(pass_percentage))
        .count();

    let mut page = String::new();
    let _ = write!(
        page,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>lessonquiz results</title>\n<style>{STYLE}</style>\n</head>\n<body>\n"
    );
    let _ = writeln!(
        page,
        "<h1>lessonquiz results</h1>\n<p class=\"meta\">{} chapters | {} passed | pass mark {}%</p>",
        results.len(),
        passed,
        pass_percentage
    );

    if !results.is_empty() {
        page.push_str("<ul class=\"scores\">\n");
        for r in results {
            render_score_row(&mut page, r, pass_percentage);
        }
        page.push_str("</ul>\n");
        page.push_str(
            "<label><input type=\"checkbox\" id=\"only-wrong\"> Show only wrong answers</label>\n",
        );
    }

    for r in results {
        render_chapter(&mut page, r);
    }

    let _ = write!(
        page,
        "<details>\n<summary>Stored data</summary>\n<pre>{}</pre>\n</details>\n",
        escape(&serde_json::to_string_pretty(results).unwrap_or_default())
    );
    let _ = write!(page, "<script>{SCRIPT}</script>\n</body>\n</html>\n");
    page
}

/// One summary line per chapter with a score meter.
fn render_score_row(page: &mut String, result: &TestResult, pass_percentage: u32) {
    let id = escape(&result.chapter_id);
    let _ = writeln!(
        page,
        "<li class=\"{class}\"><a href=\"#{id}\">{id}</a> \
         <span class=\"meter\"><span style=\"width: {width}%\"></span></span> \
         {correct}/{total} ({percentage}%) <time>{completed}</time></li>",
        class = status_class(result, pass_percentage),
        width = result.percentage.min(100),
        correct = result.correct_count,
        total = result.total,
        percentage = result.percentage,
        completed = result.completed_at.format("%Y-%m-%d %H:%M UTC"),
    );
}

fn render_chapter(page: &mut String, result: &TestResult) {
    let id = escape(&result.chapter_id);
    let _ = writeln!(
        page,
        "<section id=\"{id}\">\n<h2>{id}: {}/{} ({}%)</h2>\n<ol>",
        result.correct_count, result.total, result.percentage
    );
    for outcome in &result.details {
        render_outcome(page, outcome);
    }
    page.push_str("</ol>\n</section>\n");
}

fn render_outcome(page: &mut String, outcome: &QuestionOutcome) {
    let q = &outcome.question;
    let class = if outcome.correct { "right" } else { "wrong" };
    let _ = writeln!(
        page,
        "<li class=\"{class}\">\n<p class=\"prompt\">{}</p>\n<p>Your answer: <strong>{}</strong></p>",
        escape(&q.prompt),
        escape(&format_answer(q, outcome.user_answer.as_ref()))
    );
    if !outcome.correct {
        let _ = writeln!(
            page,
            "<p>Correct answer: <strong>{}</strong></p>",
            escape(&format_answer(q, Some(&q.correct_answer())))
        );
    }
    if let Some(explanation) = &q.explanation {
        let _ = writeln!(page, "<p class=\"explanation\">{}</p>", escape(explanation));
    }
    page.push_str("</li>\n");
}

/// Write a results page, creating parent directories as needed.
pub fn write_html_report(results: &[TestResult], pass_percentage: u32, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, generate_html(results, pass_percentage))
        .with_context(|| format!("failed to write HTML results: {}", path.display()))
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 52rem; margin: 2rem auto; padding: 0 1rem; color: #1f2937; }
.meta, time, .explanation { color: #6b7280; }
.scores { list-style: none; padding: 0; }
.scores li { display: flex; gap: 0.75rem; align-items: center; padding: 0.25rem 0; }
.scores a { min-width: 12rem; }
.meter { flex: 1; height: 0.75rem; background: #e5e7eb; border-radius: 999px; overflow: hidden; }
.meter span { display: block; height: 100%; background: #9ca3af; }
.pass .meter span { background: #16a34a; }
.near .meter span { background: #ca8a04; }
.fail .meter span { background: #dc2626; }
ol li { margin: 0.75rem 0; padding: 0.5rem 1rem; border-left: 4px solid; }
li.right { border-color: #16a34a; }
li.wrong { border-color: #dc2626; }
.prompt { font-weight: 600; }
.explanation { font-style: italic; }
pre { overflow-x: auto; background: #f3f4f6; padding: 1rem; }
body.only-wrong li.right { display: none; }
"#;

const SCRIPT: &str = r#"
const toggle = document.getElementById('only-wrong');
if (toggle) {
  toggle.addEventListener('change', () => document.body.classList.toggle('only-wrong', toggle.checked));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use lessonquiz_core::model::{Answer, Question, QuestionBody};

    fn fill(id: &str, prompt: &str, correct: &str, explanation: Option<&str>) -> Question {
        Question {
            id: id.into(),
            prompt: prompt.into(),
            difficulty: 1,
            theory_block_id: None,
            explanation: explanation.map(String::from),
            body: QuestionBody::FillBlank {
                correct: correct.into(),
            },
        }
    }

    fn make_result() -> TestResult {
        let questions = vec![
            fill("q1", "I ___ <happy>.", "am", Some("Use am with I.")),
            fill("q2", "She ___ here.", "is", None),
        ];
        let given = Answer::from("am");
        TestResult::score("be-basics", &questions, |id| (id == "q1").then_some(&given))
    }

    #[test]
    fn page_lists_scores_and_answers() {
        let html = generate_html(&[make_result()], 70);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.trim_end().ends_with("</html>"));
        assert!(html.contains("<h2>be-basics: 1/2 (50%)</h2>"));
        assert!(html.contains("<li class=\"near\">"));
        assert!(html.contains("width: 50%"));
        assert!(html.contains("Use am with I."));
        assert!(html.contains("Your answer: <strong>(not answered)</strong>"));
        assert!(html.contains("Correct answer: <strong>is</strong>"));
    }

    #[test]
    fn prompts_are_escaped() {
        let html = generate_html(&[make_result()], 70);
        assert!(html.contains("I ___ &lt;happy&gt;."));
        assert!(!html.contains("<happy>"));
    }

    #[test]
    fn empty_page_has_no_score_list() {
        let html = generate_html(&[], 70);
        assert!(html.contains("0 chapters | 0 passed"));
        assert!(!html.contains("class=\"scores\""));
    }

    #[test]
    fn written_to_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("results.html");

        write_html_report(&[make_result()], 70, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("be-basics"));
    }
}
