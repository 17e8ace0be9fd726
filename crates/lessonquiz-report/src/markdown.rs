//! Markdown summary of stored results, e.g. for a course README or a PR.

use std::fmt::Write;

use lessonquiz_core::results::TestResult;

/// One table row per result, then a totals line.
pub fn results_summary(results: &[TestResult], pass_percentage: u32) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "| Chapter | Correct | Score | Status | Completed |");
    let _ = writeln!(md, "|---|---|---|---|---|");
    for r in results {
        let status = if r.passed(pass_percentage) {
            "pass"
        } else {
            "fail"
        };
        let _ = writeln!(
            md,
            "| {} | {}/{} | {}% | {} | {} |",
            r.chapter_id.replace('|', "\\|"),
            r.correct_count,
            r.total,
            r.percentage,
            status,
            r.completed_at.format("%Y-%m-%d")
        );
    }

    let passed = results.iter().filter(|r| r.passed(pass_percentage)).count();
    let _ = writeln!(md);
    let _ = writeln!(
        md,
        "{passed} of {} chapters passed (pass mark {pass_percentage}%).",
        results.len()
    );
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn result(chapter_id: &str, correct_count: u32, total: u32) -> TestResult {
        TestResult {
            chapter_id: chapter_id.into(),
            score: correct_count,
            total,
            percentage: lessonquiz_core::results::percentage(correct_count, total),
            correct_count,
            completed_at: Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).unwrap(),
            details: vec![],
        }
    }

    #[test]
    fn summary_table() {
        let md = results_summary(&[result("be", 8, 10), result("have", 1, 3)], 70);
        assert!(md.contains("| be | 8/10 | 80% | pass | 2026-05-04 |"));
        assert!(md.contains("| have | 1/3 | 33% | fail | 2026-05-04 |"));
        assert!(md.ends_with("1 of 2 chapters passed (pass mark 70%).\n"));
    }

    #[test]
    fn pipes_in_ids_are_escaped() {
        let md = results_summary(&[result("a|b", 1, 1)], 70);
        assert!(md.contains("| a\\|b |"));
    }
}
