//! Selector sets that describe one platform's DOM shape.
//!
//! Adapters are data: the shared algorithms read these structs and never
//! branch on which platform they serve.

use serde::{Deserialize, Serialize};

use crate::types::config::{ProbeConfig, ScrollConfig, WaitConfig};

/// Everything the extractor needs to know about a platform's markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSelectors {
    pub init: InitSequence,
    pub history: HistorySelectors,
    pub conversation: ConversationSelectors,
}

/// Steps run once after navigating to the platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitSequence {
    /// Buttons (matched by exact text, case-insensitive) that dismiss
    /// first-run modals.
    #[serde(default)]
    pub dismiss_buttons: Vec<String>,

    /// How long to look for a dismiss button.
    #[serde(default)]
    pub dismiss_timeout_ms: u64,

    /// Element whose presence signals the app is ready.
    pub ready_signal: Option<WaitConfig>,
}

/// Where the conversation list lives and how to recognize its items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySelectors {
    /// Container the list lives in; queries are scoped to it.
    pub region: WaitConfig,

    /// Candidate item selectors, most specific first.
    pub item_candidates: Vec<String>,

    /// Titles must be strictly longer than this after whitespace collapse.
    #[serde(default)]
    pub min_title_len: usize,

    #[serde(default)]
    pub scroll: ScrollConfig,

    #[serde(default)]
    pub probe: ProbeConfig,
}

/// How to read messages out of an open conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSelectors {
    /// Wait applied right after a conversation is opened.
    #[serde(default)]
    pub after_open_ms: u64,

    /// Bounded wait for the conversation to render.
    pub ready: Option<WaitConfig>,

    /// Separate containers per role; results sorted by vertical offset.
    pub role_segregated: Option<RoleSelectors>,

    /// One container kind with a role attribute; DOM order is kept.
    pub attributed: Option<AttributedSelectors>,

    /// Candidate content containers inside one message, first match wins.
    #[serde(default)]
    pub content_containers: Vec<String>,

    /// Region whose visible text is the first fallback tier.
    pub fallback_region: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSelectors {
    pub user: String,
    pub assistant: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributedSelectors {
    pub container: String,
    pub role_attribute: String,
}
