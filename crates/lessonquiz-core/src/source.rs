//! Where chapter documents come from.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::model::Chapter;
use crate::parser::{chapter_paths, parse_chapter_str, DEFAULT_CHAPTER_FILE};

/// Section id for chapters without a `section_id`.
pub const UNKNOWN_SECTION: &str = "unknown";

/// Trait for backends that provide chapter documents.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Load one chapter by id.
    async fn load_chapter(&self, chapter_id: &str) -> Result<Chapter>;

    /// Load every available chapter, sorted by `order`. Chapters that fail
    /// to load are skipped.
    async fn load_all_chapters(&self) -> Result<Vec<Chapter>>;
}

/// Chapters stored as `<content_dir>/<chapter_id>/<chapter_file>`.
#[derive(Debug, Clone)]
pub struct FsContentSource {
    content_dir: PathBuf,
    chapter_file: String,
}

impl FsContentSource {
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
            chapter_file: DEFAULT_CHAPTER_FILE.to_string(),
        }
    }

    pub fn with_chapter_file(mut self, chapter_file: impl Into<String>) -> Self {
        self.chapter_file = chapter_file.into();
        self
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    fn chapter_path(&self, chapter_id: &str) -> PathBuf {
        self.content_dir.join(chapter_id).join(&self.chapter_file)
    }
}

#[async_trait]
impl ContentSource for FsContentSource {
    async fn load_chapter(&self, chapter_id: &str) -> Result<Chapter> {
        let path = self.chapter_path(chapter_id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                anyhow::bail!("chapter not found: {chapter_id}");
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read chapter file: {}", path.display()))
            }
        };
        parse_chapter_str(&content, &path)
    }

    async fn load_all_chapters(&self) -> Result<Vec<Chapter>> {
        let paths = chapter_paths(&self.content_dir, &self.chapter_file)?;
        let ids: Vec<String> = paths
            .iter()
            .filter_map(|p| p.parent()?.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();

        let loaded = futures::future::join_all(ids.iter().map(|id| self.load_chapter(id))).await;

        let mut chapters = Vec::new();
        for (id, result) in ids.iter().zip(loaded) {
            match result {
                Ok(chapter) => chapters.push(chapter),
                Err(e) => tracing::warn!("skipping chapter {id}: {e:#}"),
            }
        }
        sort_by_order(&mut chapters);

        tracing::debug!(count = chapters.len(), dir = %self.content_dir.display(), "loaded chapters");
        Ok(chapters)
    }
}

fn sort_by_order(chapters: &mut [Chapter]) {
    chapters.sort_by_key(|c| c.order.unwrap_or(0));
}

/// Chapters sharing a `section_id`.
#[derive(Debug, Clone)]
pub struct Section {
    pub id: String,
    pub chapters: Vec<Chapter>,
}

/// Group chapters by section. Sections keep first-seen order; chapters are
/// sorted by `order` within each section.
pub fn group_chapters_by_section(chapters: Vec<Chapter>) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    for chapter in chapters {
        let id = chapter
            .section_id
            .clone()
            .unwrap_or_else(|| UNKNOWN_SECTION.to_string());
        match sections.iter_mut().find(|s| s.id == id) {
            Some(section) => section.chapters.push(chapter),
            None => sections.push(Section {
                id,
                chapters: vec![chapter],
            }),
        }
    }
    for section in &mut sections {
        sort_by_order(&mut section.chapters);
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_chapter(dir: &Path, id: &str, section: Option<&str>, order: i64) {
        let folder = dir.join(id);
        std::fs::create_dir_all(&folder).unwrap();
        let json = serde_json::json!({
            "id": id,
            "section_id": section,
            "order": order,
            "question_bank": {"questions": []}
        });
        std::fs::write(folder.join(DEFAULT_CHAPTER_FILE), json.to_string()).unwrap();
    }

    fn chapter(id: &str, section: Option<&str>, order: Option<i64>) -> Chapter {
        serde_json::from_value(serde_json::json!({
            "id": id, "section_id": section, "order": order
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn load_chapter_by_id() {
        let dir = tempfile::tempdir().unwrap();
        write_chapter(dir.path(), "ch1", Some("s1"), 1);

        let source = FsContentSource::new(dir.path());
        let chapter = source.load_chapter("ch1").await.unwrap();
        assert_eq!(chapter.id, "ch1");
        assert_eq!(chapter.section_id.as_deref(), Some("s1"));
    }

    #[tokio::test]
    async fn missing_chapter_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsContentSource::new(dir.path());
        let err = source.load_chapter("nope").await.unwrap_err();
        assert_eq!(err.to_string(), "chapter not found: nope");
    }

    #[tokio::test]
    async fn load_all_sorts_and_skips_broken() {
        let dir = tempfile::tempdir().unwrap();
        write_chapter(dir.path(), "a", Some("s1"), 3);
        write_chapter(dir.path(), "b", Some("s1"), 1);
        write_chapter(dir.path(), "c", None, 2);
        let broken = dir.path().join("d");
        std::fs::create_dir(&broken).unwrap();
        std::fs::write(broken.join(DEFAULT_CHAPTER_FILE), "{ oops").unwrap();

        let source = FsContentSource::new(dir.path());
        let chapters = source.load_all_chapters().await.unwrap();
        let ids: Vec<&str> = chapters.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn custom_chapter_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("x");
        std::fs::create_dir(&folder).unwrap();
        std::fs::write(folder.join("chapter.json"), r#"{"id": "x"}"#).unwrap();

        let source = FsContentSource::new(dir.path()).with_chapter_file("chapter.json");
        assert_eq!(source.load_all_chapters().await.unwrap().len(), 1);
    }

    #[test]
    fn grouping_keeps_first_seen_sections() {
        let chapters = vec![
            chapter("c2", Some("s2"), Some(2)),
            chapter("c1", Some("s1"), Some(1)),
            chapter("c0", Some("s2"), Some(1)),
            chapter("c9", None, None),
        ];
        let sections = group_chapters_by_section(chapters);
        let ids: Vec<&str> = sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s2", "s1", UNKNOWN_SECTION]);
        let s2: Vec<&str> = sections[0].chapters.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(s2, vec!["c0", "c2"]);
    }
}
