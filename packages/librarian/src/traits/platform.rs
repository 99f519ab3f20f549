//! Platform adapter trait.
//!
//! An adapter is data plus a little identity: where the app lives, which
//! selectors describe its markup, and where its downloads go. The shared
//! algorithms in [`pipeline`](crate::pipeline) do the work; the default
//! methods here wire them to the adapter's selectors.

use async_trait::async_trait;

use crate::error::Result;
use crate::pipeline::{extract, history, init};
use crate::traits::surface::DocumentSurface;
use crate::types::{
    document::ConversationDocument, selectors::PlatformSelectors, summary::ChatSummary,
};

/// A chat application the librarian can read.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Entry URL of the web app.
    fn platform_url(&self) -> &str;

    /// Display name, also used in logs and documents.
    fn platform_name(&self) -> &str;

    /// Selector sets for this platform's markup.
    fn selectors(&self) -> &PlatformSelectors;

    /// Default directory name for downloaded conversations.
    fn output_dir_name(&self) -> &str;

    /// Dismiss first-run modals and wait for the app to be usable.
    async fn initialize_after_navigation(&self, surface: &dyn DocumentSurface) {
        init::run_init_sequence(surface, &self.selectors().init, self.platform_name()).await;
    }

    /// List conversations, most recent first.
    async fn list_conversations(&self, surface: &dyn DocumentSurface) -> Result<Vec<ChatSummary>> {
        history::list_conversations(surface, &self.selectors().history, self.platform_name()).await
    }

    /// Open a listed conversation and extract it.
    async fn extract_conversation(
        &self,
        surface: &dyn DocumentSurface,
        summary: &ChatSummary,
    ) -> ConversationDocument {
        extract::extract_conversation(
            surface,
            &self.selectors().conversation,
            summary,
            self.platform_name(),
        )
        .await
    }

    /// Extract whatever conversation the surface currently shows.
    async fn extract_current(&self, surface: &dyn DocumentSurface, title: &str) -> ConversationDocument {
        extract::extract_open_conversation(
            surface,
            &self.selectors().conversation,
            title,
            self.platform_name(),
        )
        .await
    }
}
