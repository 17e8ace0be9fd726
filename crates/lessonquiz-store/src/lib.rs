//! lessonquiz-store: Durable result storage and configuration.
//!
//! Implements the `ResultStore` trait over a single JSON document, and loads
//! `lessonquiz.toml`.

pub mod config;
pub mod json_store;

pub use config::{load_config, load_config_from, LessonquizConfig};
pub use json_store::JsonFileResultStore;
