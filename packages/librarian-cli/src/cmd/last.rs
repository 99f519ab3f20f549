use anyhow::Result;

use crate::context::{close_session, AppContext};

/// Download the most recent conversation.
pub async fn run(ctx: &AppContext) -> Result<()> {
    let session = ctx.open_session().await?;
    let saved = session.download_latest().await;
    close_session(session).await?;

    ctx.print_success(&format!("Saved latest chat to {}", saved?));
    Ok(())
}
