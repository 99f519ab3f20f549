//! Gemini adapter.

use crate::traits::platform::Platform;
use crate::types::{
    config::{ProbeConfig, ScrollConfig, WaitConfig},
    selectors::{
        ConversationSelectors, HistorySelectors, InitSequence, PlatformSelectors, RoleSelectors,
    },
};

pub const GEMINI_URL: &str = "https://gemini.google.com/app";

/// Gemini: history in the side navigation, user queries and model
/// responses in separate containers.
#[derive(Debug, Clone)]
pub struct Gemini {
    selectors: PlatformSelectors,
}

impl Gemini {
    pub fn new() -> Self {
        Self {
            selectors: PlatformSelectors {
                init: InitSequence {
                    dismiss_buttons: Vec::new(),
                    dismiss_timeout_ms: 0,
                    ready_signal: Some(WaitConfig::new("mat-sidenav", 10_000).with_settle_ms(2_000)),
                },
                history: HistorySelectors {
                    region: WaitConfig::new("mat-sidenav", 30_000).with_settle_ms(2_000),
                    item_candidates: vec![
                        "div[role='button']".into(),
                        "a[href*='chat']".into(),
                        "div.chat-item".into(),
                        "mat-list-item".into(),
                    ],
                    min_title_len: 5,
                    scroll: ScrollConfig::default(),
                    probe: ProbeConfig::default(),
                },
                conversation: ConversationSelectors {
                    after_open_ms: 3_000,
                    ready: Some(WaitConfig::new("div.conversation-container", 10_000).with_settle_ms(2_000)),
                    role_segregated: Some(RoleSelectors {
                        user: "div.user-query".into(),
                        assistant: "div.model-response".into(),
                    }),
                    attributed: None,
                    content_containers: vec![
                        "div.markdown".into(),
                        "div.query-text".into(),
                        "div.message-content".into(),
                    ],
                    fallback_region: Some("div.conversation-container".into()),
                },
            },
        }
    }
}

impl Default for Gemini {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for Gemini {
    fn platform_url(&self) -> &str {
        GEMINI_URL
    }

    fn platform_name(&self) -> &str {
        "Gemini"
    }

    fn selectors(&self) -> &PlatformSelectors {
        &self.selectors
    }

    fn output_dir_name(&self) -> &str {
        "Gemini_Downloads"
    }
}
