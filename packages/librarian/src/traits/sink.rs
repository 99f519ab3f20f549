//! Output sink trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::document::ConversationDocument;

/// Destination for extracted documents.
///
/// Sinks own everything about storage: deriving and sanitizing names,
/// creating directories, choosing a text form. They return a human-readable
/// location of what they wrote.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn persist(&self, title: &str, document: &ConversationDocument) -> Result<String>;

    /// Sink name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}
