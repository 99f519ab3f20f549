//! Integration tests running the platform adapters against saved pages.
//!
//! These tests verify the full flow without a browser:
//! 1. List conversations from the history region
//! 2. Extract the open conversation
//! 3. Render and persist it as Markdown

use chat_librarian::{
    ChatGpt, ExtractionMode, FallbackTier, Gemini, Librarian, MarkdownDirSink, Platform, Role,
    SnapshotSurface, StructuredBlock,
};

const GEMINI_PAGE: &str = r#"<!doctype html>
<html><body>
<mat-sidenav>
  <div role="button">Hi</div>
  <div role="button">Rust   lifetimes explained</div>
  <div role="button">Weekend hiking trip</div>
</mat-sidenav>
<main>
  <div class="conversation-container">
    <div class="user-query"><div class="query-text">How do lifetimes work?</div></div>
    <div class="model-response"><div class="markdown">
      <p>Lifetimes name regions of code.</p>
      <pre><code class="language-rust">fn first&lt;'a&gt;(x: &amp;'a str) {}</code></pre>
    </div></div>
    <div class="user-query"><div class="query-text">Thanks!</div></div>
    <div class="model-response"><div class="markdown"><ul><li>Happy to help</li></ul></div></div>
  </div>
</main>
</body></html>"#;

const CHATGPT_PAGE: &str = r#"<!doctype html>
<html><body>
<div id="history">
  <a href="/c/aaa">Older thread</a>
  <a href="/c/bbb">Sorting algorithms</a>
</div>
<div data-message-author-role="user"><div class="whitespace-pre-wrap">Compare quicksort and mergesort</div></div>
<div data-message-author-role="assistant"><div class="markdown">
  <h3>Summary</h3>
  <ol><li>Quicksort is in place</li><li>Mergesort is stable</li></ol>
</div></div>
</body></html>"#;

/// Helper to pull (role, first block text) pairs out of a document.
fn transcript(doc: &chat_librarian::ConversationDocument) -> Vec<(Role, String)> {
    doc.entries
        .iter()
        .map(|e| (e.role, e.blocks[0].text()))
        .collect()
}

#[tokio::test]
async fn test_gemini_history_is_filtered_and_most_recent_first() {
    let surface = SnapshotSurface::new(GEMINI_PAGE);
    let chats = Gemini::new().list_conversations(&surface).await.unwrap();

    let titles: Vec<_> = chats.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Weekend hiking trip", "Rust lifetimes explained"]);
    assert_eq!(chats[0].ordinal_position, 2);
}

#[tokio::test]
async fn test_gemini_conversation_is_role_segregated() {
    let surface = SnapshotSurface::new(GEMINI_PAGE);
    let doc = Gemini::new().extract_current(&surface, "Rust lifetimes explained").await;

    assert_eq!(doc.mode, ExtractionMode::RoleSegregated);
    assert_eq!(
        transcript(&doc),
        vec![
            (Role::User, "How do lifetimes work?".to_string()),
            (Role::Assistant, "Lifetimes name regions of code.".to_string()),
            (Role::User, "Thanks!".to_string()),
            (Role::Assistant, "Happy to help".to_string()),
        ]
    );
    assert_eq!(
        doc.entries[1].blocks[1],
        StructuredBlock::code(Some("rust".into()), "fn first<'a>(x: &'a str) {}")
    );
}

#[tokio::test]
async fn test_chatgpt_conversation_is_attributed() {
    let surface = SnapshotSurface::new(CHATGPT_PAGE);
    let doc = ChatGpt::new().extract_current(&surface, "Sorting algorithms").await;

    assert_eq!(doc.mode, ExtractionMode::Attributed);
    assert_eq!(doc.entries[0].role, Role::User);
    assert_eq!(
        doc.entries[0].blocks,
        vec![StructuredBlock::raw("Compare quicksort and mergesort")]
    );
    assert_eq!(
        doc.entries[1].blocks,
        vec![
            StructuredBlock::heading(3, "Summary"),
            StructuredBlock::list(true, ["Quicksort is in place", "Mergesort is stable"]),
        ]
    );
}

#[tokio::test]
async fn test_gemini_without_messages_falls_back_to_region_text() {
    let page = r#"<html><body><mat-sidenav></mat-sidenav>
        <div class="conversation-container"><span>Only   plain text here</span></div></body></html>"#;
    let surface = SnapshotSurface::new(page);
    let doc = Gemini::new().extract_current(&surface, "t").await;

    assert_eq!(doc.mode, ExtractionMode::Fallback(FallbackTier::ConversationText));
    let markdown = chat_librarian::render_markdown(&doc);
    assert!(markdown.contains("### Conversation Content\n\nOnly plain text here"));
}

#[tokio::test]
async fn test_download_latest_writes_markdown() {
    let tmp = tempfile::tempdir().unwrap();
    let platform = Gemini::new();
    let sink = MarkdownDirSink::new(tmp.path().join(platform.output_dir_name()));
    let librarian = Librarian::new(Box::new(platform), SnapshotSurface::new(GEMINI_PAGE), sink);

    let location = librarian.download_latest().await.unwrap();
    assert!(location.ends_with("Weekend hiking trip.md"));

    let written = std::fs::read_to_string(&location).unwrap();
    assert!(written.starts_with("# Weekend hiking trip\n\n### User\n\nHow do lifetimes work?\n\n---\n"));
    assert!(written.contains("```rust\nfn first<'a>(x: &'a str) {}\n```"));
    assert!(written.contains("### Assistant\n\n* Happy to help\n\n---\n"));
}

#[tokio::test]
async fn test_download_unknown_title_fails_without_writing() {
    let tmp = tempfile::tempdir().unwrap();
    let sink = MarkdownDirSink::new(tmp.path().join("out"));
    let librarian = Librarian::new(Box::new(ChatGpt::new()), SnapshotSurface::new(CHATGPT_PAGE), sink);

    let err = librarian.download_by_title("Nope").await.unwrap_err();
    assert!(matches!(err, chat_librarian::LibrarianError::ChatNotFound { .. }));
    assert!(!tmp.path().join("out").exists());
}
