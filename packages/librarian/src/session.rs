//! Librarian - platform, surface and sink wired into one session.

use tracing::info;

use crate::error::{LibrarianError, Result};
use crate::traits::{platform::Platform, sink::DocumentSink, surface::DocumentSurface};
use crate::types::{
    document::ConversationDocument,
    summary::{find_by_title, ChatSummary},
};

/// A download session against one chat platform.
///
/// The session owns the surface for its lifetime; summaries returned by
/// [`list`](Librarian::list) are only valid until the next navigation.
///
/// ```rust,ignore
/// let surface = CdpSurface::attach(9222).await?;
/// let sink = MarkdownDirSink::new("ChatGPT_Downloads");
/// let librarian = Librarian::new(platform_for("chatgpt")?, surface, sink);
/// librarian.open().await?;
/// let saved = librarian.download_latest().await?;
/// ```
pub struct Librarian<S: DocumentSurface, K: DocumentSink> {
    platform: Box<dyn Platform>,
    surface: S,
    sink: K,
}

impl<S: DocumentSurface, K: DocumentSink> Librarian<S, K> {
    pub fn new(platform: Box<dyn Platform>, surface: S, sink: K) -> Self {
        Self {
            platform,
            surface,
            sink,
        }
    }

    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Give back the surface, e.g. to close a browser.
    pub fn into_surface(self) -> S {
        self.surface
    }

    // =========================================================================
    // Primitives
    // =========================================================================

    /// Navigate to the platform and run its init sequence.
    pub async fn open(&self) -> Result<()> {
        info!(platform = self.platform.platform_name(), "Opening platform");
        self.surface.navigate(self.platform.platform_url()).await?;
        self.platform.initialize_after_navigation(&self.surface).await;
        Ok(())
    }

    /// List conversations, most recent first.
    pub async fn list(&self) -> Result<Vec<ChatSummary>> {
        self.platform.list_conversations(&self.surface).await
    }

    /// Open and extract one listed conversation.
    pub async fn extract(&self, summary: &ChatSummary) -> ConversationDocument {
        self.platform
            .extract_conversation(&self.surface, summary)
            .await
    }

    /// Extract and persist one listed conversation. Returns where it was
    /// written.
    pub async fn download(&self, summary: &ChatSummary) -> Result<String> {
        let document = self.extract(summary).await;
        if document.is_degraded() {
            info!(title = %summary.title, mode = ?document.mode, "Saving degraded extraction");
        }
        self.sink.persist(&summary.title, &document).await
    }

    // =========================================================================
    // High-Level API
    // =========================================================================

    /// Download the conversation whose title matches (case-insensitive).
    pub async fn download_by_title(&self, title: &str) -> Result<String> {
        let summaries = self.list().await?;
        let summary = find_by_title(&summaries, title)?;
        self.download(summary).await
    }

    /// Download the most recent conversation.
    pub async fn download_latest(&self) -> Result<String> {
        let summaries = self.list().await?;
        let latest = summaries
            .first()
            .ok_or_else(|| LibrarianError::NoConversations {
                platform: self.platform.platform_name().to_string(),
            })?;
        info!(title = %latest.title, "Downloading most recent chat");
        self.download(latest).await
    }
}
