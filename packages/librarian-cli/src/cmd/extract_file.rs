use anyhow::{Context, Result};
use chat_librarian::{DocumentSink, SnapshotSurface};
use std::path::Path;

use crate::context::AppContext;

/// Extract a conversation from a saved HTML page.
pub async fn run(ctx: &AppContext, path: &Path, title: Option<&str>) -> Result<()> {
    let surface = SnapshotSurface::from_file(path)
        .await
        .with_context(|| format!("Failed to load {}", path.display()))?;
    let platform = ctx.platform.adapter();

    let title = match title {
        Some(title) => title.to_string(),
        None => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "conversation".to_string()),
    };

    let document = platform.extract_current(&surface, &title).await;
    if document.is_degraded() {
        ctx.print_warning("No structured messages found; saved plain text instead.");
    }

    let saved = ctx.sink(platform.as_ref()).persist(&title, &document).await?;
    ctx.print_success(&format!(
        "Extracted {} messages to {}",
        document.message_count(),
        saved
    ));
    Ok(())
}
