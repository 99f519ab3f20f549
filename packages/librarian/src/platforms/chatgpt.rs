//! ChatGPT adapter.

use crate::traits::platform::Platform;
use crate::types::{
    config::{ProbeConfig, ScrollConfig, WaitConfig},
    selectors::{
        AttributedSelectors, ConversationSelectors, HistorySelectors, InitSequence,
        PlatformSelectors,
    },
};

pub const CHATGPT_URL: &str = "https://chat.openai.com";

/// ChatGPT: history links under `#history`, messages tagged with
/// `data-message-author-role`.
#[derive(Debug, Clone)]
pub struct ChatGpt {
    selectors: PlatformSelectors,
}

impl ChatGpt {
    pub fn new() -> Self {
        Self {
            selectors: PlatformSelectors {
                init: InitSequence {
                    dismiss_buttons: vec!["Okay, let's go".into()],
                    dismiss_timeout_ms: 5_000,
                    ready_signal: None,
                },
                history: HistorySelectors {
                    region: WaitConfig::new("div#history", 30_000),
                    item_candidates: vec!["a[href^='/c/']".into()],
                    min_title_len: 0,
                    scroll: ScrollConfig::default(),
                    probe: ProbeConfig::default(),
                },
                conversation: ConversationSelectors {
                    after_open_ms: 0,
                    ready: Some(
                        WaitConfig::new("div[data-message-author-role]", 90_000).with_settle_ms(2_000),
                    ),
                    role_segregated: None,
                    attributed: Some(AttributedSelectors {
                        container: "div[data-message-author-role]".into(),
                        role_attribute: "data-message-author-role".into(),
                    }),
                    content_containers: vec![
                        "div.markdown".into(),
                        "div.whitespace-pre-wrap".into(),
                    ],
                    fallback_region: None,
                },
            },
        }
    }
}

impl Default for ChatGpt {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for ChatGpt {
    fn platform_url(&self) -> &str {
        CHATGPT_URL
    }

    fn platform_name(&self) -> &str {
        "ChatGPT"
    }

    fn selectors(&self) -> &PlatformSelectors {
        &self.selectors
    }

    fn output_dir_name(&self) -> &str {
        "ChatGPT_Downloads"
    }
}
