//! Reporting: the chapter narrative and its text tables.

pub mod chapters;
pub mod format;

pub use chapters::Chapter;
pub use format::{chapter_lines, format_header, format_report};
