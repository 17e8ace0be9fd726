//! lessonquiz-report: Rendering of finished tests.
//!
//! Plain-text breakdowns for the terminal, a markdown summary of stored
//! results, and a self-contained HTML results page.

pub mod html;
pub mod markdown;
pub mod text;

pub use html::{generate_html, write_html_report};
pub use markdown::results_summary;
pub use text::{format_answer, render_breakdown};
