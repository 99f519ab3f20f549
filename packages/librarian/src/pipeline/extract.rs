//! Conversation extraction - open conversation to structured document.
//!
//! Discovery runs in order of fidelity:
//!
//! 1. Role-segregated: separate user and assistant containers, merged by
//!    on-screen vertical offset
//! 2. Attributed: one container kind carrying a role attribute, DOM order
//! 3. Fallback: conversation region text, then page text, then a placeholder
//!
//! Every step absorbs surface failures; extraction always yields a document.

use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::pipeline::convert::{collapse_whitespace, fragment_text, FragmentConverter};
use crate::traits::surface::DocumentSurface;
use crate::types::{
    document::{
        ConversationDocument, ExtractionMode, FallbackTier, MessageEntry, Role, StructuredBlock,
        PLACEHOLDER_TEXT,
    },
    selectors::{AttributedSelectors, ConversationSelectors, RoleSelectors},
    summary::{ChatSummary, ElementHandle},
};

/// Open a listed conversation and extract it.
pub async fn extract_conversation(
    surface: &dyn DocumentSurface,
    selectors: &ConversationSelectors,
    summary: &ChatSummary,
    platform: &str,
) -> ConversationDocument {
    info!(platform, title = %summary.title, "Opening chat");
    if let Err(e) = surface.click(summary.element).await {
        warn!(title = %summary.title, error = %e, "Could not open chat, reading current view");
    }
    if selectors.after_open_ms > 0 {
        surface
            .wait(std::time::Duration::from_millis(selectors.after_open_ms))
            .await;
    }
    extract_open_conversation(surface, selectors, &summary.title, platform).await
}

/// Extract the conversation currently shown on the surface.
pub async fn extract_open_conversation(
    surface: &dyn DocumentSurface,
    selectors: &ConversationSelectors,
    title: &str,
    platform: &str,
) -> ConversationDocument {
    let started = Instant::now();
    let document = discover(surface, selectors, title, platform).await;
    info!(
        platform,
        mode = ?document.mode,
        messages = document.message_count(),
        duration_ms = started.elapsed().as_millis() as u64,
        "Extraction finished"
    );
    document
}

async fn discover(
    surface: &dyn DocumentSurface,
    selectors: &ConversationSelectors,
    title: &str,
    platform: &str,
) -> ConversationDocument {
    if let Some(ready) = &selectors.ready {
        info!(platform, "Waiting for chat content to load");
        match surface.wait_for_selector(&ready.selector, ready.timeout()).await {
            Ok(_) => surface.wait(ready.settle()).await,
            Err(e) => warn!(platform, error = %e, "Chat content did not appear, extracting anyway"),
        }
    }

    let converter = FragmentConverter::with_containers(&selectors.content_containers);

    if let Some(roles) = &selectors.role_segregated {
        let entries = role_segregated(surface, roles, &converter).await;
        if !entries.is_empty() {
            info!(platform, messages = entries.len(), "Extracted messages by role");
            return ConversationDocument::structured(
                title,
                platform,
                ExtractionMode::RoleSegregated,
                entries,
            );
        }
    }

    if let Some(attributed_sel) = &selectors.attributed {
        let entries = attributed(surface, attributed_sel, &converter).await;
        if !entries.is_empty() {
            info!(platform, messages = entries.len(), "Extracted messages by attribute");
            return ConversationDocument::structured(
                title,
                platform,
                ExtractionMode::Attributed,
                entries,
            );
        }
    }

    fallback(surface, selectors, title, platform).await
}

async fn role_segregated(
    surface: &dyn DocumentSurface,
    roles: &RoleSelectors,
    converter: &FragmentConverter,
) -> Vec<MessageEntry> {
    let users = query_or_empty(surface, &roles.user).await;
    let assistants = query_or_empty(surface, &roles.assistant).await;
    info!(
        user = users.len(),
        assistant = assistants.len(),
        "Found message containers"
    );

    let tagged = users
        .into_iter()
        .map(|h| (Role::User, h))
        .chain(assistants.into_iter().map(|h| (Role::Assistant, h)));

    let mut entries = Vec::new();
    for (role, handle) in tagged {
        let Some(blocks) = read_message(surface, handle, converter).await else {
            continue;
        };
        let y = match surface.vertical_offset(handle).await {
            Ok(Some(y)) => y,
            Ok(None) => 0.0,
            Err(e) => {
                debug!(error = %e, "No position for message, placing at top");
                0.0
            }
        };
        entries.push(MessageEntry::new(role, blocks).with_vertical_position(y));
    }

    // stable: equal offsets keep discovery order
    entries.sort_by(|a, b| {
        let ay = a.vertical_position.unwrap_or(0.0);
        let by = b.vertical_position.unwrap_or(0.0);
        ay.total_cmp(&by)
    });
    entries
}

async fn attributed(
    surface: &dyn DocumentSurface,
    selectors: &AttributedSelectors,
    converter: &FragmentConverter,
) -> Vec<MessageEntry> {
    let containers = query_or_empty(surface, &selectors.container).await;
    let total = containers.len();
    info!(count = total, "Found message containers");

    let mut entries = Vec::new();
    for (i, handle) in containers.into_iter().enumerate() {
        let role_value = match surface.attribute(handle, &selectors.role_attribute).await {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "Skipping message without readable role");
                continue;
            }
        };
        let role = Role::from_attribute(role_value.as_deref());
        if let Some(blocks) = read_message(surface, handle, converter).await {
            entries.push(MessageEntry::new(role, blocks));
        }
        if (i + 1) % 5 == 0 || i + 1 == total {
            debug!(parsed = i + 1, total, "Parsed messages");
        }
    }
    entries
}

/// Convert one message container. `None` when it has no content.
async fn read_message(
    surface: &dyn DocumentSurface,
    handle: ElementHandle,
    converter: &FragmentConverter,
) -> Option<Vec<StructuredBlock>> {
    let html = match surface.inner_html(handle).await {
        Ok(html) => html,
        Err(e) => {
            debug!(error = %e, "Could not read message markup, trying text");
            return surface
                .inner_text(handle)
                .await
                .ok()
                .map(|text| collapse_whitespace(&text))
                .filter(|text| !text.is_empty())
                .map(|text| vec![StructuredBlock::raw(text)]);
        }
    };

    let blocks = converter.convert(&html);
    if !blocks.is_empty() {
        return Some(blocks);
    }

    let text = fragment_text(&html);
    (!text.is_empty()).then(|| vec![StructuredBlock::raw(text)])
}

async fn fallback(
    surface: &dyn DocumentSurface,
    selectors: &ConversationSelectors,
    title: &str,
    platform: &str,
) -> ConversationDocument {
    warn!(platform, "No structured messages found, falling back to plain text");

    if let Some(region) = &selectors.fallback_region {
        if let Some(text) = region_text(surface, region).await {
            return ConversationDocument::degraded(
                title,
                platform,
                FallbackTier::ConversationText,
                text,
            );
        }
    }

    match surface.page_text().await {
        Ok(text) if !text.trim().is_empty() => {
            return ConversationDocument::degraded(
                title,
                platform,
                FallbackTier::PageText,
                text.trim(),
            );
        }
        Ok(_) => debug!("Page text is empty"),
        Err(e) => debug!(error = %e, "Could not read page text"),
    }

    error!(platform, title, "Could not extract conversation content");
    ConversationDocument::degraded(title, platform, FallbackTier::Placeholder, PLACEHOLDER_TEXT)
}

async fn region_text(surface: &dyn DocumentSurface, selector: &str) -> Option<String> {
    let region = query_or_empty(surface, selector).await.into_iter().next()?;
    match surface.inner_text(region).await {
        Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "Could not read conversation region");
            None
        }
    }
}

async fn query_or_empty(surface: &dyn DocumentSurface, selector: &str) -> Vec<ElementHandle> {
    match surface.query(None, selector).await {
        Ok(handles) => handles,
        Err(e) => {
            debug!(selector, error = %e, "Query failed");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockElement, MockSurface, SurfaceCall};
    use crate::types::config::WaitConfig;

    fn selectors() -> ConversationSelectors {
        ConversationSelectors {
            after_open_ms: 0,
            ready: None,
            role_segregated: None,
            attributed: None,
            content_containers: vec!["div.markdown".into()],
            fallback_region: Some("main".into()),
        }
    }

    fn role_selectors() -> ConversationSelectors {
        ConversationSelectors {
            role_segregated: Some(RoleSelectors {
                user: "div.user".into(),
                assistant: "div.model".into(),
            }),
            ..selectors()
        }
    }

    fn attributed_selectors() -> ConversationSelectors {
        ConversationSelectors {
            attributed: Some(AttributedSelectors {
                container: "div[data-role]".into(),
                role_attribute: "data-role".into(),
            }),
            ..selectors()
        }
    }

    #[tokio::test]
    async fn test_role_segregated_sorted_by_offset() {
        let surface = MockSurface::new();
        let u1 = surface.add_element(MockElement::with_text("<p>later question</p>").at(40.0));
        let u2 = surface.add_element(MockElement::with_text("<p>first question</p>").at(10.0));
        let a1 = surface.add_element(MockElement::with_text("<p>answer</p>").at(25.0));
        surface.bind("div.user", &[u1, u2]);
        surface.bind("div.model", &[a1]);

        let doc = extract_open_conversation(&surface, &role_selectors(), "t", "gemini").await;
        assert_eq!(doc.mode, ExtractionMode::RoleSegregated);
        let order: Vec<_> = doc
            .entries
            .iter()
            .map(|e| (e.role, e.blocks[0].text()))
            .collect();
        assert_eq!(
            order,
            vec![
                (Role::User, "first question".to_string()),
                (Role::Assistant, "answer".to_string()),
                (Role::User, "later question".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_offset_sorts_to_top() {
        let surface = MockSurface::new();
        let u = surface.add_element(MockElement::with_text("<p>hi</p>").at(5.0));
        let a = surface.add_element(MockElement::with_text("<p>offscreen</p>"));
        surface.bind("div.user", &[u]);
        surface.bind("div.model", &[a]);

        let doc = extract_open_conversation(&surface, &role_selectors(), "t", "gemini").await;
        assert_eq!(doc.entries[0].role, Role::Assistant);
        assert_eq!(doc.entries[0].vertical_position, Some(0.0));
    }

    #[tokio::test]
    async fn test_attributed_keeps_dom_order() {
        let surface = MockSurface::new();
        let m1 = surface.add_element(
            MockElement::new()
                .html(r#"<div class="markdown"><p>question</p></div>"#)
                .attr("data-role", "user"),
        );
        let m2 = surface.add_element(
            MockElement::new()
                .html(r#"<div class="markdown"><ol><li>one</li><li>two</li></ol></div>"#)
                .attr("data-role", "assistant"),
        );
        let m3 = surface.add_element(
            MockElement::new()
                .html("<p>tool output</p>")
                .attr("data-role", "tool"),
        );
        surface.bind("div[data-role]", &[m1, m2, m3]);

        let doc = extract_open_conversation(&surface, &attributed_selectors(), "t", "chatgpt").await;
        assert_eq!(doc.mode, ExtractionMode::Attributed);
        let roles: Vec<_> = doc.entries.iter().map(|e| e.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Assistant]);
        assert_eq!(doc.entries[1].blocks, vec![StructuredBlock::list(true, ["one", "two"])]);
        assert!(doc.entries.iter().all(|e| e.vertical_position.is_none()));
    }

    #[tokio::test]
    async fn test_unrecognized_markup_becomes_raw_text() {
        let surface = MockSurface::new();
        let m = surface.add_element(
            MockElement::new()
                .html("<section><span>plain   words</span></section>")
                .attr("data-role", "user"),
        );
        surface.bind("div[data-role]", &[m]);

        let doc = extract_open_conversation(&surface, &attributed_selectors(), "t", "chatgpt").await;
        assert_eq!(doc.entries[0].blocks, vec![StructuredBlock::raw("plain words")]);
    }

    #[tokio::test]
    async fn test_empty_messages_are_skipped() {
        let surface = MockSurface::new();
        let empty = surface.add_element(MockElement::new().html("<div> </div>").attr("data-role", "user"));
        let full = surface.add_element(MockElement::new().html("<p>hi</p>").attr("data-role", "user"));
        surface.bind("div[data-role]", &[empty, full]);

        let doc = extract_open_conversation(&surface, &attributed_selectors(), "t", "chatgpt").await;
        assert_eq!(doc.message_count(), 1);
    }

    #[tokio::test]
    async fn test_fallback_to_conversation_region() {
        let surface = MockSurface::new();
        let main = surface.add_element(MockElement::with_text("  Region text  "));
        surface.bind("main", &[main]);
        surface.set_page_text("whole page");

        let doc = extract_open_conversation(&surface, &role_selectors(), "t", "gemini").await;
        assert_eq!(doc.mode, ExtractionMode::Fallback(FallbackTier::ConversationText));
        assert_eq!(
            doc.fallback.unwrap().block,
            StructuredBlock::raw("Region text")
        );
    }

    #[tokio::test]
    async fn test_fallback_to_page_text() {
        let surface = MockSurface::new();
        surface.set_page_text("whole page");

        let doc = extract_open_conversation(&surface, &attributed_selectors(), "t", "chatgpt").await;
        assert_eq!(doc.mode, ExtractionMode::Fallback(FallbackTier::PageText));
    }

    #[tokio::test]
    async fn test_fallback_placeholder_when_nothing_readable() {
        let surface = MockSurface::new();
        let doc = extract_open_conversation(&surface, &selectors(), "t", "chatgpt").await;
        assert_eq!(doc.mode, ExtractionMode::Fallback(FallbackTier::Placeholder));
        assert_eq!(doc.fallback.unwrap().block.text(), PLACEHOLDER_TEXT);
    }

    #[tokio::test]
    async fn test_ready_timeout_is_not_fatal() {
        let surface = MockSurface::new();
        let m = surface.add_element(MockElement::new().html("<p>late</p>").attr("data-role", "user"));
        surface.bind("div[data-role]", &[m]);

        let sel = ConversationSelectors {
            ready: Some(WaitConfig::new("div.never", 90_000)),
            ..attributed_selectors()
        };
        let doc = extract_open_conversation(&surface, &sel, "t", "chatgpt").await;
        assert_eq!(doc.message_count(), 1);
    }

    #[tokio::test]
    async fn test_extract_conversation_clicks_then_waits() {
        let surface = MockSurface::new();
        let link = surface.add_element(MockElement::with_text("My chat"));
        let summary = ChatSummary::new(0, "My chat", link);
        let sel = ConversationSelectors {
            after_open_ms: 3000,
            ..selectors()
        };
        surface.set_page_text("text");

        let doc = extract_conversation(&surface, &sel, &summary, "gemini").await;
        assert_eq!(doc.title, "My chat");
        let calls = surface.calls();
        assert_eq!(calls[0], SurfaceCall::Click { id: link.id() });
        assert_eq!(calls[1], SurfaceCall::Wait { ms: 3000 });
    }
}
