//! Markdown rendering of conversation documents.

use crate::types::document::{ConversationDocument, MessageEntry, StructuredBlock};

/// Render a document as Markdown.
///
/// ```text
/// # {title}
///
/// ### User
///
/// {blocks separated by blank lines}
///
/// ---
/// ```
pub fn render_markdown(document: &ConversationDocument) -> String {
    let body = match &document.fallback {
        Some(fallback) => section(fallback.tier.label(), std::slice::from_ref(&fallback.block)),
        None if document.entries.is_empty() => "No content extracted.\n".to_string(),
        None => document
            .entries
            .iter()
            .map(render_entry)
            .collect::<Vec<_>>()
            .join("\n"),
    };
    format!("# {}\n\n{}", document.title, body)
}

fn render_entry(entry: &MessageEntry) -> String {
    section(entry.role.label(), &entry.blocks)
}

fn section(heading: &str, blocks: &[StructuredBlock]) -> String {
    let content = blocks
        .iter()
        .map(render_block)
        .filter(|b| !b.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("### {heading}\n\n{content}\n\n---\n")
}

/// Render one block. Ordered list items are all numbered `1.`, which
/// Markdown renumbers.
pub fn render_block(block: &StructuredBlock) -> String {
    match block {
        StructuredBlock::Paragraph { text } | StructuredBlock::RawText { text } => text.clone(),
        StructuredBlock::Heading { level, text } => {
            format!("{} {}", "#".repeat(usize::from(*level)), text)
        }
        StructuredBlock::CodeBlock { language, text } => {
            format!("```{}\n{}\n```", language.as_deref().unwrap_or(""), text)
        }
        StructuredBlock::List { ordered, items } => {
            let marker = if *ordered { "1." } else { "*" };
            items
                .iter()
                .map(|item| format!("{marker} {item}"))
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}
