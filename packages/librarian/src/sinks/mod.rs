//! Document sink implementations.

pub mod markdown;

pub use markdown::{sanitize_filename, MarkdownDirSink};
