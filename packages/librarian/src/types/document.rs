//! Structured conversation document types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One unit of converted message content.
///
/// Blocks are immutable once built; their order inside a message is the
/// source order of the markup they came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuredBlock {
    Paragraph {
        text: String,
    },
    List {
        ordered: bool,
        items: Vec<String>,
    },
    CodeBlock {
        language: Option<String>,
        text: String,
    },
    Heading {
        level: u8,
        text: String,
    },
    RawText {
        text: String,
    },
}

impl StructuredBlock {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph { text: text.into() }
    }

    pub fn raw(text: impl Into<String>) -> Self {
        Self::RawText { text: text.into() }
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::Heading {
            level: level.clamp(1, 4),
            text: text.into(),
        }
    }

    pub fn list(ordered: bool, items: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::List {
            ordered,
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    pub fn code(language: Option<String>, text: impl Into<String>) -> Self {
        Self::CodeBlock {
            language,
            text: text.into(),
        }
    }

    /// True when the block carries no visible text.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Paragraph { text }
            | Self::RawText { text }
            | Self::Heading { text, .. }
            | Self::CodeBlock { text, .. } => text.trim().is_empty(),
            Self::List { items, .. } => items.iter().all(|i| i.trim().is_empty()),
        }
    }

    /// Visible text of the block, list items joined by newlines.
    pub fn text(&self) -> String {
        match self {
            Self::Paragraph { text }
            | Self::RawText { text }
            | Self::Heading { text, .. }
            | Self::CodeBlock { text, .. } => text.clone(),
            Self::List { items, .. } => items.join("\n"),
        }
    }
}

/// Speaker of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Map a role attribute value to a role. Only `user` is a user.
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("user") => Role::User,
            _ => Role::Assistant,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single message with its converted content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub role: Role,
    pub blocks: Vec<StructuredBlock>,

    /// On-screen vertical offset. Only set by role-segregated discovery,
    /// where it is the ordering key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_position: Option<f64>,
}

impl MessageEntry {
    pub fn new(role: Role, blocks: Vec<StructuredBlock>) -> Self {
        Self {
            role,
            blocks,
            vertical_position: None,
        }
    }

    pub fn with_vertical_position(mut self, y: f64) -> Self {
        self.vertical_position = Some(y);
        self
    }
}

/// Which discovery path produced a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    RoleSegregated,
    Attributed,
    Fallback(FallbackTier),
}

/// Degraded extraction tiers, from least to most degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTier {
    /// Visible text of the conversation container
    ConversationText,
    /// Visible text of the whole page
    PageText,
    /// Nothing could be read; a literal error placeholder
    Placeholder,
}

impl FallbackTier {
    pub fn label(&self) -> &'static str {
        match self {
            FallbackTier::ConversationText => "Conversation Content",
            FallbackTier::PageText => "Full Page Content",
            FallbackTier::Placeholder => "Error",
        }
    }
}

/// Opaque content captured by the fallback tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackContent {
    pub tier: FallbackTier,
    pub block: StructuredBlock,
}

/// Text emitted when no tier could read anything.
pub const PLACEHOLDER_TEXT: &str = "Could not extract conversation content.";

/// An extracted conversation, entries in display (chronological) order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationDocument {
    pub title: String,
    pub platform: String,
    pub entries: Vec<MessageEntry>,
    pub mode: ExtractionMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackContent>,

    pub extracted_at: DateTime<Utc>,
}

impl ConversationDocument {
    /// Build a document from structured entries.
    pub fn structured(
        title: impl Into<String>,
        platform: impl Into<String>,
        mode: ExtractionMode,
        entries: Vec<MessageEntry>,
    ) -> Self {
        Self {
            title: title.into(),
            platform: platform.into(),
            entries,
            mode,
            fallback: None,
            extracted_at: Utc::now(),
        }
    }

    /// Build a degraded document holding one opaque block.
    pub fn degraded(
        title: impl Into<String>,
        platform: impl Into<String>,
        tier: FallbackTier,
        text: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            platform: platform.into(),
            entries: Vec::new(),
            mode: ExtractionMode::Fallback(tier),
            fallback: Some(FallbackContent {
                tier,
                block: StructuredBlock::raw(text),
            }),
            extracted_at: Utc::now(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.mode, ExtractionMode::Fallback(_))
    }

    pub fn message_count(&self) -> usize {
        self.entries.len()
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_emptiness() {
        assert!(StructuredBlock::paragraph("   ").is_empty());
        assert!(StructuredBlock::list(true, ["", " "]).is_empty());
        assert!(!StructuredBlock::list(false, ["", "x"]).is_empty());
        assert!(!StructuredBlock::code(None, "fn main() {}").is_empty());
    }

    #[test]
    fn test_heading_level_clamped() {
        assert_eq!(
            StructuredBlock::heading(9, "deep"),
            StructuredBlock::Heading {
                level: 4,
                text: "deep".into()
            }
        );
    }

    #[test]
    fn test_role_from_attribute() {
        assert_eq!(Role::from_attribute(Some("user")), Role::User);
        assert_eq!(Role::from_attribute(Some("assistant")), Role::Assistant);
        assert_eq!(Role::from_attribute(Some("tool")), Role::Assistant);
        assert_eq!(Role::from_attribute(None), Role::Assistant);
    }

    #[test]
    fn test_degraded_document_json() {
        let doc = ConversationDocument::degraded(
            "Broken",
            "Gemini",
            FallbackTier::Placeholder,
            PLACEHOLDER_TEXT,
        );
        assert!(doc.is_degraded());
        let json = doc.to_json().unwrap();
        assert!(json.contains("\"placeholder\""));
        assert!(json.contains(PLACEHOLDER_TEXT));
    }
}
