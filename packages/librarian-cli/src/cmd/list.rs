use anyhow::Result;
use colored::Colorize;

use crate::context::{close_session, AppContext};

/// Print every conversation title, most recent first.
pub async fn run(ctx: &AppContext) -> Result<()> {
    let session = ctx.open_session().await?;
    let chats = session.list().await;
    close_session(session).await?;
    let chats = chats?;

    ctx.print_header(&format!("{} chats on {}", chats.len(), ctx.platform));
    for (i, chat) in chats.iter().enumerate() {
        println!("{:>4}  {}", (i + 1).to_string().dimmed(), chat.title);
    }
    Ok(())
}
