//! Markdown files in a directory, one per conversation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{LibrarianError, Result};
use crate::render::render_markdown;
use crate::traits::sink::DocumentSink;
use crate::types::document::ConversationDocument;

/// Writes `{dir}/{sanitized title}.md`, optionally with a JSON sidecar.
#[derive(Debug, Clone)]
pub struct MarkdownDirSink {
    dir: PathBuf,
    write_json: bool,
}

impl MarkdownDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_json: false,
        }
    }

    /// Also write the structured document as `{title}.json`.
    pub fn with_json(mut self, enabled: bool) -> Self {
        self.write_json = enabled;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a title would be written to.
    pub fn path_for(&self, title: &str) -> PathBuf {
        self.dir.join(format!("{}.md", sanitize_filename(title)))
    }

    async fn write(&self, title: &str, path: &Path, contents: String) -> Result<()> {
        tokio::fs::write(path, contents)
            .await
            .map_err(|source| LibrarianError::Persist {
                title: title.to_string(),
                source,
            })
    }
}

#[async_trait]
impl DocumentSink for MarkdownDirSink {
    async fn persist(&self, title: &str, document: &ConversationDocument) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| LibrarianError::Persist {
                title: title.to_string(),
                source,
            })?;

        let path = self.path_for(title);
        self.write(title, &path, render_markdown(document)).await?;

        if self.write_json {
            let json = document.to_json().map_err(|e| LibrarianError::Persist {
                title: title.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            })?;
            self.write(title, &path.with_extension("json"), json).await?;
        }

        info!(path = %path.display(), "Saved chat");
        Ok(path.display().to_string())
    }

    fn name(&self) -> &str {
        "markdown_dir"
    }
}

/// Strip characters that are invalid in file names on common systems.
/// An empty result becomes `untitled`.
pub fn sanitize_filename(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|'))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "untitled".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::document::{ExtractionMode, MessageEntry, Role, StructuredBlock};

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("What is 2/3? <fast>"), "What is 23 fast");
        assert_eq!(sanitize_filename(r#"a\b*c:d"e|f"#), "abcdef");
        assert_eq!(sanitize_filename(" ??? "), "untitled");
    }

    #[tokio::test]
    async fn test_persist_creates_directory_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = MarkdownDirSink::new(tmp.path().join("ChatGPT_Downloads")).with_json(true);
        let doc = ConversationDocument::structured(
            "Plans: 2024",
            "ChatGPT",
            ExtractionMode::Attributed,
            vec![MessageEntry::new(Role::User, vec![StructuredBlock::raw("hi")])],
        );

        assert_eq!(sink.dir(), tmp.path().join("ChatGPT_Downloads"));
        let location = sink.persist("Plans: 2024", &doc).await.unwrap();
        let path = sink.dir().join("Plans 2024.md");
        assert_eq!(location, path.display().to_string());

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Plans: 2024\n\n### User\n\nhi"));
        assert!(path.with_extension("json").exists());
    }

    #[tokio::test]
    async fn test_persist_error_names_title() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        let sink = MarkdownDirSink::new(blocker.join("sub"));
        let doc = ConversationDocument::degraded("t", "Gemini", crate::types::document::FallbackTier::PageText, "x");
        let err = sink.persist("t", &doc).await.unwrap_err();
        assert!(matches!(err, LibrarianError::Persist { title, .. } if title == "t"));
    }
}
