//! Chapter document parser and content checks.
//!
//! Loads chapter JSON files and validates them for authoring mistakes that
//! do not prevent loading but degrade a test.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::model::{Chapter, QuestionKind};

/// Default name of the chapter document inside a chapter folder.
pub const DEFAULT_CHAPTER_FILE: &str = "05-final.json";

/// Minimum choices of an error-spotting question: one correct answer and
/// at least three distractors.
pub const MIN_ERROR_SPOTTING_CHOICES: usize = 4;

/// Generic prompts that may legitimately repeat.
const ALLOWED_DUPLICATE_PREFIXES: &[&str] = &[
    "Choose the correct option",
    "Choose the correct sentence",
    "Choose the correct question",
    "Choose the correct negative",
    "Выберите правильный вариант",
    "Выберите правильное предложение",
    "Выберите правильное отрицательное предложение",
    "Выберите правильный императив",
    "Выберите правильный вопрос",
];

const ALLOWED_DUPLICATE_EXACT: &[&str] = &[
    "Which sentence is a question?",
    "Which sentence is a negative?",
    "Which sentence is a statement?",
    "Какое из предложений является вопросом?",
    "Какое из предложений является отрицанием?",
    "Какое из предложений является утверждением?",
];

/// Parse a chapter document from disk.
pub fn parse_chapter(path: &Path) -> Result<Chapter> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read chapter file: {}", path.display()))?;

    parse_chapter_str(&content, path)
}

/// Parse a chapter document from a string (useful for testing).
pub fn parse_chapter_str(content: &str, source_path: &Path) -> Result<Chapter> {
    let chapter: Chapter = serde_json::from_str(content)
        .with_context(|| format!("failed to parse chapter JSON: {}", source_path.display()))?;

    if let Some(bank) = &chapter.question_bank {
        for rejected in &bank.rejected {
            tracing::warn!(
                chapter = %chapter.id,
                question = rejected.id.as_deref().unwrap_or("?"),
                "skipping malformed question: {}",
                rejected.reason
            );
        }
    }

    Ok(chapter)
}

/// Chapter documents under `dir`, one per immediate subfolder that contains
/// `chapter_file`. Hidden folders are ignored. Sorted by folder name.
pub fn chapter_paths(dir: &Path, chapter_file: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !path.is_dir() || hidden {
            continue;
        }
        let file = path.join(chapter_file);
        if file.is_file() {
            paths.push(file);
        }
    }
    paths.sort();
    Ok(paths)
}

/// A warning from chapter validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub chapter_id: String,
    /// The question concerned (if applicable).
    pub question_id: Option<String>,
    pub message: String,
}

impl ValidationWarning {
    fn chapter(chapter: &Chapter, message: impl Into<String>) -> Self {
        Self {
            chapter_id: chapter.id.clone(),
            question_id: None,
            message: message.into(),
        }
    }

    fn question(chapter: &Chapter, question_id: &str, message: impl Into<String>) -> Self {
        Self {
            chapter_id: chapter.id.clone(),
            question_id: Some(question_id.to_string()),
            message: message.into(),
        }
    }
}

/// Whether a prompt is a generic one that may repeat across questions.
pub fn is_allowed_duplicate(prompt: &str) -> bool {
    let prompt = prompt.trim();
    ALLOWED_DUPLICATE_EXACT.contains(&prompt)
        || ALLOWED_DUPLICATE_PREFIXES
            .iter()
            .any(|p| prompt.starts_with(p))
}

/// Validate a chapter for common content issues.
pub fn validate_chapter(chapter: &Chapter) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let Some(bank) = &chapter.question_bank else {
        warnings.push(ValidationWarning::chapter(
            chapter,
            "no question_bank: final test cannot start",
        ));
        return warnings;
    };

    for rejected in &bank.rejected {
        warnings.push(ValidationWarning {
            chapter_id: chapter.id.clone(),
            question_id: rejected.id.clone(),
            message: format!("rejected question: {}", rejected.reason),
        });
    }

    // Duplicate question ids
    let mut seen_ids = HashSet::new();
    for q in &bank.questions {
        if !seen_ids.insert(q.id.as_str()) {
            warnings.push(ValidationWarning::question(
                chapter,
                &q.id,
                format!("duplicate question ID: {}", q.id),
            ));
        }
    }

    // Error spotting needs enough distractors
    for q in &bank.questions {
        let choices = q.choices().len();
        if q.kind() == QuestionKind::ErrorSpotting && choices < MIN_ERROR_SPOTTING_CHOICES {
            warnings.push(ValidationWarning::question(
                chapter,
                &q.id,
                format!(
                    "error_spotting has {choices} choices, expected at least {MIN_ERROR_SPOTTING_CHOICES}"
                ),
            ));
        }
    }

    // Repeated prompts
    let mut by_prompt: HashMap<&str, Vec<&str>> = HashMap::new();
    for q in &bank.questions {
        let prompt = q.prompt.trim();
        if q.kind() == QuestionKind::Reorder || prompt.is_empty() || is_allowed_duplicate(prompt)
        {
            continue;
        }
        by_prompt.entry(prompt).or_default().push(q.id.as_str());
    }
    let mut repeated: Vec<(&str, Vec<&str>)> =
        by_prompt.into_iter().filter(|(_, ids)| ids.len() > 1).collect();
    repeated.sort();
    for (prompt, ids) in repeated {
        warnings.push(ValidationWarning::question(
            chapter,
            ids[1],
            format!("duplicate prompt \"{prompt}\" in {}", ids.join(", ")),
        ));
    }

    // Inline quizzes pointing nowhere
    for (block_id, _, spec) in chapter.inline_quizzes() {
        for id in &spec.question_ids {
            if !seen_ids.contains(id.as_str()) {
                warnings.push(ValidationWarning::question(
                    chapter,
                    id,
                    format!("inline quiz {block_id} references unknown question {id}"),
                ));
            }
        }
    }

    let Some(test) = &chapter.chapter_test else {
        warnings.push(ValidationWarning::chapter(
            chapter,
            "no chapter_test: final test cannot start",
        ));
        return warnings;
    };

    let mut pool = HashSet::new();
    for id in &test.pool_question_ids {
        if !seen_ids.contains(id.as_str()) {
            warnings.push(ValidationWarning::question(
                chapter,
                id,
                format!("pool question {id} is not in the question bank"),
            ));
        } else {
            pool.insert(id.as_str());
        }
    }

    if test.num_questions > pool.len() {
        warnings.push(ValidationWarning::chapter(
            chapter,
            format!(
                "num_questions is {} but the pool has only {} questions",
                test.num_questions,
                pool.len()
            ),
        ));
    }

    if test.num_questions == 0 {
        warnings.push(ValidationWarning::chapter(chapter, "num_questions is 0"));
    }

    warnings
}

/// Prompts repeated across different chapters.
pub fn find_cross_chapter_duplicates(chapters: &[Chapter]) -> Vec<ValidationWarning> {
    let mut by_prompt: HashMap<&str, Vec<(&str, &str)>> = HashMap::new();
    for chapter in chapters {
        for q in chapter.questions() {
            let prompt = q.prompt.trim();
            if q.kind() == QuestionKind::Reorder || prompt.is_empty() || is_allowed_duplicate(prompt)
            {
                continue;
            }
            by_prompt
                .entry(prompt)
                .or_default()
                .push((chapter.id.as_str(), q.id.as_str()));
        }
    }

    let mut warnings = Vec::new();
    let mut prompts: Vec<_> = by_prompt.into_iter().collect();
    prompts.sort();
    for (prompt, hits) in prompts {
        let chapters: HashSet<&str> = hits.iter().map(|(c, _)| *c).collect();
        if chapters.len() < 2 {
            continue;
        }
        let locations: Vec<String> = hits.iter().map(|(c, q)| format!("{c}/{q}")).collect();
        let (chapter_id, question_id) = hits[1];
        warnings.push(ValidationWarning {
            chapter_id: chapter_id.to_string(),
            question_id: Some(question_id.to_string()),
            message: format!(
                "prompt \"{prompt}\" repeated across chapters: {}",
                locations.join(", ")
            ),
        });
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_JSON: &str = r#"{
        "id": "present-simple",
        "section_id": "tenses",
        "title": "Present Simple",
        "order": 2,
        "blocks": [
            {"type": "theory", "id": "t1", "title": "Form",
             "theory": {"content_md": "I work, she works", "key_points": ["-s in 3rd person"]}},
            {"type": "quiz_inline", "id": "qi1", "theory_block_id": "t1",
             "quiz_inline": {"question_ids": ["q1", "q2"], "show_answers_immediately": true}},
            {"type": "video", "id": "v1"}
        ],
        "question_bank": {
            "questions": [
                {"id": "q1", "type": "fill_blank", "prompt": "She ___ (work).", "correct_answer": "works", "theory_block_id": "t1"},
                {"id": "q2", "type": "true_false", "prompt": "'He go' is correct.", "correct_answer": false},
                {"id": "q3", "type": "mcq_single", "prompt": "Pick",
                 "choices": [{"id": "a", "text": "do"}], "correct_answer": "z"}
            ]
        },
        "chapter_test": {
            "num_questions": 2,
            "pool_question_ids": ["q1", "q2"],
            "selection_strategy": {"type": "stratified_by_theory_block", "min_per_theory_block": 1}
        }
    }"#;

    fn parse(json: &str) -> Chapter {
        parse_chapter_str(json, Path::new("05-final.json")).unwrap()
    }

    #[test]
    fn parse_valid_chapter() {
        let chapter = parse(VALID_JSON);
        assert_eq!(chapter.id, "present-simple");
        assert_eq!(chapter.display_title(), "Present Simple");
        assert_eq!(chapter.blocks.len(), 3);
        assert_eq!(chapter.questions().len(), 2);
        assert_eq!(chapter.inline_quizzes().len(), 1);
        assert!(chapter.has_test());
    }

    #[test]
    fn malformed_question_does_not_fail_chapter() {
        let chapter = parse(VALID_JSON);
        let bank = chapter.question_bank.as_ref().unwrap();
        assert_eq!(bank.rejected.len(), 1);
        assert_eq!(bank.rejected[0].id.as_deref(), Some("q3"));

        let warnings = validate_chapter(&chapter);
        assert!(warnings
            .iter()
            .any(|w| w.message.starts_with("rejected question")));
    }

    #[test]
    fn parse_malformed_json() {
        let result = parse_chapter_str("{ not json", Path::new("bad.json"));
        assert!(result.is_err());
        assert!(format!("{:#}", result.unwrap_err()).contains("bad.json"));
    }

    #[test]
    fn validate_pool_and_size() {
        let json = r#"{
            "id": "c",
            "question_bank": {"questions": [
                {"id": "q1", "type": "fill_blank", "prompt": "a", "correct_answer": "x"}
            ]},
            "chapter_test": {"num_questions": 3, "pool_question_ids": ["q1", "ghost"]}
        }"#;
        let warnings = validate_chapter(&parse(json));
        assert!(warnings
            .iter()
            .any(|w| w.question_id.as_deref() == Some("ghost")));
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("pool has only 1")));
    }

    #[test]
    fn validate_missing_test_config() {
        let json = r#"{"id": "c", "question_bank": {"questions": []}}"#;
        let warnings = validate_chapter(&parse(json));
        assert!(warnings.iter().any(|w| w.message.contains("no chapter_test")));

        let warnings = validate_chapter(&parse(r#"{"id": "c"}"#));
        assert!(warnings.iter().any(|w| w.message.contains("no question_bank")));
    }

    #[test]
    fn validate_duplicates_and_error_spotting() {
        let json = r#"{
            "id": "c",
            "question_bank": {"questions": [
                {"id": "q1", "type": "fill_blank", "prompt": "She ___ tea.", "correct_answer": "drinks"},
                {"id": "q1", "type": "fill_blank", "prompt": "He ___ milk.", "correct_answer": "drinks"},
                {"id": "q2", "type": "fill_blank", "prompt": " She ___ tea. ", "correct_answer": "likes"},
                {"id": "q3", "type": "reorder", "prompt": "Order the words", "correct_answer": "I am here."},
                {"id": "q4", "type": "reorder", "prompt": "Order the words", "correct_answer": "You are here."},
                {"id": "q5", "type": "error_spotting", "prompt": "Find the error",
                 "choices": [{"id": "a", "text": "He"}, {"id": "b", "text": "go"}], "correct_answer": "b"},
                {"id": "q6", "type": "mcq_single", "prompt": "Choose the correct option: I ___",
                 "choices": [{"id": "a", "text": "am"}], "correct_answer": "a"},
                {"id": "q7", "type": "mcq_single", "prompt": "Choose the correct option: I ___",
                 "choices": [{"id": "a", "text": "am"}], "correct_answer": "a"}
            ]},
            "chapter_test": {"num_questions": 1, "pool_question_ids": ["q1"]}
        }"#;
        let warnings = validate_chapter(&parse(json));
        let messages: Vec<&str> = warnings.iter().map(|w| w.message.as_str()).collect();

        assert!(messages.iter().any(|m| m.contains("duplicate question ID: q1")));
        assert!(messages.iter().any(|m| m.contains("error_spotting has 2 choices")));
        let prompt_dupes: Vec<&&str> = messages
            .iter()
            .filter(|m| m.starts_with("duplicate prompt"))
            .collect();
        assert_eq!(prompt_dupes.len(), 1);
        assert!(prompt_dupes[0].contains("q1, q2"));
    }

    #[test]
    fn validate_inline_quiz_references() {
        let json = r#"{
            "id": "c",
            "blocks": [{"type": "quiz_inline", "id": "qi", "quiz_inline": {"question_ids": ["q1", "nope"]}}],
            "question_bank": {"questions": [
                {"id": "q1", "type": "fill_blank", "prompt": "a", "correct_answer": "x"}
            ]},
            "chapter_test": {"num_questions": 1, "pool_question_ids": ["q1"]}
        }"#;
        let warnings = validate_chapter(&parse(json));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("inline quiz qi"));
    }

    #[test]
    fn clean_chapter_has_no_warnings() {
        let json = VALID_JSON.replace(r#""correct_answer": "z""#, r#""correct_answer": "a""#);
        assert!(validate_chapter(&parse(&json)).is_empty());
    }

    #[test]
    fn allowed_duplicates() {
        assert!(is_allowed_duplicate("  Choose the correct option: He ___ "));
        assert!(is_allowed_duplicate("Which sentence is a question?"));
        assert!(!is_allowed_duplicate("She ___ tea."));
    }

    #[test]
    fn cross_chapter_duplicates() {
        let a = parse(
            r#"{"id": "a", "question_bank": {"questions": [
                {"id": "a1", "type": "fill_blank", "prompt": "I ___ here.", "correct_answer": "am"}]}}"#,
        );
        let b = parse(
            r#"{"id": "b", "question_bank": {"questions": [
                {"id": "b1", "type": "fill_blank", "prompt": "I ___ here.", "correct_answer": "am"},
                {"id": "b2", "type": "fill_blank", "prompt": "We ___ here.", "correct_answer": "are"}]}}"#,
        );
        let warnings = find_cross_chapter_duplicates(&[a, b]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].chapter_id, "b");
        assert!(warnings[0].message.contains("a/a1, b/b1"));
    }

    #[test]
    fn chapter_paths_finds_chapter_folders() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["02-b", "01-a", ".hidden"] {
            let folder = dir.path().join(name);
            std::fs::create_dir(&folder).unwrap();
            std::fs::write(folder.join(DEFAULT_CHAPTER_FILE), VALID_JSON).unwrap();
        }
        std::fs::create_dir(dir.path().join("03-empty")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let paths = chapter_paths(dir.path(), DEFAULT_CHAPTER_FILE).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].starts_with(dir.path().join("01-a")));

        assert!(chapter_paths(&dir.path().join("notes.txt"), DEFAULT_CHAPTER_FILE).is_err());
    }
}
