use anyhow::Result;
use dialoguer::Select;

use crate::context::{close_session, AppContext, Session};

/// Choose a conversation interactively and download it.
pub async fn run(ctx: &AppContext) -> Result<()> {
    let session = ctx.open_session().await?;
    let result = pick_and_download(ctx, &session).await;
    close_session(session).await?;

    if let Some(saved) = result? {
        ctx.print_success(&format!("Saved to {saved}"));
    }
    Ok(())
}

async fn pick_and_download(ctx: &AppContext, session: &Session) -> Result<Option<String>> {
    let chats = session.list().await?;
    let titles: Vec<&str> = chats.iter().map(|c| c.title.as_str()).collect();

    let selection = Select::with_theme(&ctx.theme())
        .with_prompt("Which chat would you like to download?")
        .items(&titles)
        .default(0)
        .interact_opt()?;

    match selection {
        Some(index) => Ok(Some(session.download(&chats[index]).await?)),
        None => {
            ctx.print_warning("Nothing selected.");
            Ok(None)
        }
    }
}
