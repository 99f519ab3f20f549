//! Conversation listing - materialize the history sidebar and read titles.

use tracing::{info, warn};

use crate::error::{LibrarianError, Result};
use crate::pipeline::convert::collapse_whitespace;
use crate::pipeline::probe::probe_with_reveal;
use crate::pipeline::scroll::{ConvergenceScroller, ItemLocator};
use crate::traits::surface::DocumentSurface;
use crate::types::{selectors::HistorySelectors, summary::ChatSummary};

/// List every conversation in the history region, most recent first.
///
/// Waits for the region (a missing region widens the search to the whole
/// document), scrolls it to convergence, probes the item candidates and
/// keeps titles longer than `min_title_len` after whitespace collapse.
///
/// Platforms render history oldest-to-newest in document order, so the
/// discovered order is reversed.
pub async fn list_conversations(
    surface: &dyn DocumentSurface,
    history: &HistorySelectors,
    platform: &str,
) -> Result<Vec<ChatSummary>> {
    info!(platform, "Waiting for chat history to load");
    let region = match surface
        .wait_for_selector(&history.region.selector, history.region.timeout())
        .await
    {
        Ok(region) => Some(region),
        Err(e) if e.is_recoverable() => {
            warn!(
                platform,
                selector = %history.region.selector,
                error = %e,
                "History region not found, searching the whole page"
            );
            None
        }
        Err(e) => return Err(e.into()),
    };
    surface.wait(history.region.settle()).await;

    let locator = ItemLocator {
        scope: region,
        candidates: history.item_candidates.clone(),
    };
    ConvergenceScroller::new(history.scroll.clone())
        .materialize_all(surface, &locator)
        .await;

    let Some(probed) = probe_with_reveal(surface, region, &history.item_candidates, &history.probe).await
    else {
        return Err(LibrarianError::NoConversations {
            platform: platform.to_string(),
        });
    };

    let mut summaries: Vec<ChatSummary> = probed
        .elements
        .into_iter()
        .enumerate()
        .filter_map(|(position, element)| {
            let title = collapse_whitespace(&element.text);
            (!title.is_empty() && title.chars().count() > history.min_title_len)
                .then(|| ChatSummary::new(position, title, element.handle))
        })
        .collect();

    if summaries.is_empty() {
        return Err(LibrarianError::NoConversations {
            platform: platform.to_string(),
        });
    }

    summaries.reverse();
    info!(platform, count = summaries.len(), selector = %probed.selector, "Found chats");
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockElement, MockSurface};
    use crate::types::config::{ProbeConfig, ScrollConfig, WaitConfig};

    fn history(min_title_len: usize) -> HistorySelectors {
        HistorySelectors {
            region: WaitConfig::new("nav", 1000),
            item_candidates: vec!["a.chat".into()],
            min_title_len,
            scroll: ScrollConfig::new().with_max_stable_rounds(1),
            probe: ProbeConfig::new().with_reveal_retries(0),
        }
    }

    #[tokio::test]
    async fn test_titles_are_collapsed_and_reversed() {
        let surface = MockSurface::new();
        let nav = surface.add_element(MockElement::new());
        surface.bind("nav", &[nav]);
        let old = surface.add_element(MockElement::with_text("Oldest   chat"));
        let mid = surface.add_element(MockElement::with_text("Middle\n chat"));
        let new = surface.add_element(MockElement::with_text("Newest chat"));
        surface.bind_scoped(Some(nav), "a.chat", &[old, mid, new]);

        let chats = list_conversations(&surface, &history(0), "test").await.unwrap();
        let titles: Vec<_> = chats.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Newest chat", "Middle chat", "Oldest chat"]);
        assert_eq!(chats[0].ordinal_position, 2);
        assert_eq!(chats[0].element, new);
    }

    #[tokio::test]
    async fn test_short_titles_are_dropped() {
        let surface = MockSurface::new();
        let a = surface.add_element(MockElement::with_text("Hi"));
        let b = surface.add_element(MockElement::with_text("Weekly review"));
        surface.bind("a.chat", &[a, b]);

        let chats = list_conversations(&surface, &history(5), "gemini").await.unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].title, "Weekly review");
    }

    #[tokio::test]
    async fn test_missing_history_is_no_conversations() {
        let surface = MockSurface::new();
        let err = list_conversations(&surface, &history(0), "chatgpt")
            .await
            .unwrap_err();
        assert!(matches!(err, LibrarianError::NoConversations { .. }));
    }
}
