use anyhow::Result;

use crate::context::{close_session, AppContext};

/// Download the conversation with this exact title (case-insensitive).
pub async fn run(ctx: &AppContext, title: &str) -> Result<()> {
    let session = ctx.open_session().await?;
    let saved = session.download_by_title(title).await;
    close_session(session).await?;

    ctx.print_success(&format!("Saved '{}' to {}", title, saved?));
    Ok(())
}
