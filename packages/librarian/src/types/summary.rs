//! Session-scoped references into the live document.

use serde::Serialize;

use crate::error::{LibrarianError, Result};

/// Opaque reference to an element on a surface.
///
/// `id` indexes the surface's element registry and `epoch` records the
/// surface's navigation counter when the handle was issued. A navigation
/// bumps the epoch, so every older handle reads as detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ElementHandle {
    id: u64,
    epoch: u64,
}

impl ElementHandle {
    pub fn new(id: u64, epoch: u64) -> Self {
        Self { id, epoch }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// A conversation found in the history list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatSummary {
    /// Index in DOM discovery order (not chronological)
    pub ordinal_position: usize,
    pub title: String,
    #[serde(skip)]
    pub element: ElementHandle,
}

impl ChatSummary {
    pub fn new(ordinal_position: usize, title: impl Into<String>, element: ElementHandle) -> Self {
        Self {
            ordinal_position,
            title: title.into(),
            element,
        }
    }
}

/// Resolve a title to the first summary whose title matches it exactly,
/// ignoring case. No fuzzy matching.
pub fn find_by_title<'a>(summaries: &'a [ChatSummary], title: &str) -> Result<&'a ChatSummary> {
    let wanted = title.to_lowercase();
    summaries
        .iter()
        .find(|s| s.title.to_lowercase() == wanted)
        .ok_or_else(|| LibrarianError::ChatNotFound {
            title: title.to_string(),
        })
}
