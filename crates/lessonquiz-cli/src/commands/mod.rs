pub mod chapters;
pub mod init;
pub mod play;
pub mod quiz;
pub mod results;
pub mod validate;

use anyhow::Result;
use lessonquiz_core::source::FsContentSource;
use lessonquiz_store::{load_config_from, JsonFileResultStore, LessonquizConfig};

use crate::Paths;

/// Load the config file and apply command-line path overrides.
fn settings(paths: &Paths) -> Result<LessonquizConfig> {
    let mut config = load_config_from(paths.config.as_deref())?;
    if let Some(dir) = &paths.content_dir {
        config.content_dir = dir.clone();
    }
    if let Some(results) = &paths.results {
        config.results_path = results.clone();
    }
    tracing::debug!(
        content_dir = %config.content_dir.display(),
        results = %config.results_path.display(),
        "resolved paths"
    );
    Ok(config)
}

fn content_source(config: &LessonquizConfig) -> FsContentSource {
    FsContentSource::new(&config.content_dir).with_chapter_file(&config.chapter_file)
}

fn result_store(config: &LessonquizConfig) -> JsonFileResultStore {
    JsonFileResultStore::new(&config.results_path)
}
