//! Saved HTML page as a document surface.
//!
//! A snapshot has no layout and never changes: reveal actions are no-ops,
//! waits return at once, and the vertical offset of an element is its
//! position in document order. Handles are preorder element indices.
//!
//! The page is re-parsed per call, since a parsed `scraper::Html` cannot
//! be shared across tasks.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::path::Path;
use std::time::Duration;

use crate::error::{LibrarianError, SurfaceError, SurfaceResult};
use crate::pipeline::convert::collapse_whitespace;
use crate::traits::surface::DocumentSurface;
use crate::types::summary::ElementHandle;

const SURFACE_NAME: &str = "snapshot";

/// A static HTML document.
#[derive(Debug, Clone)]
pub struct SnapshotSurface {
    html: String,
}

impl SnapshotSurface {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    /// Load a saved page from disk.
    pub async fn from_file(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let path = path.as_ref();
        let html = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LibrarianError::Browser(format!("cannot read {}: {e}", path.display())))?;
        Ok(Self::new(html))
    }

    fn with_element<T>(&self, handle: ElementHandle, f: impl FnOnce(ElementRef<'_>) -> T) -> SurfaceResult<T> {
        let document = Html::parse_document(&self.html);
        element_at(&document, handle).map(f)
    }

    fn select(&self, scope: Option<ElementHandle>, selector: &str) -> SurfaceResult<Vec<ElementHandle>> {
        let parsed = Selector::parse(selector).map_err(|_| SurfaceError::InvalidSelector {
            selector: selector.to_string(),
        })?;
        let document = Html::parse_document(&self.html);
        let root = match scope {
            Some(handle) => element_at(&document, handle)?,
            None => document.root_element(),
        };

        let ids: std::collections::HashMap<_, _> = document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .enumerate()
            .map(|(i, el)| (el.id(), i as u64))
            .collect();

        let mut matches: Vec<ElementHandle> = Vec::new();
        if scope.is_none() && parsed.matches(&root) {
            matches.push(ElementHandle::new(0, 0));
        }
        matches.extend(
            root.select(&parsed)
                .filter_map(|el| ids.get(&el.id()))
                .map(|id| ElementHandle::new(*id, 0)),
        );
        Ok(matches)
    }
}

fn element_at(document: &Html, handle: ElementHandle) -> SurfaceResult<ElementRef<'_>> {
    if handle.epoch() != 0 {
        return Err(SurfaceError::Detached { id: handle.id() });
    }
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .nth(handle.id() as usize)
        .ok_or(SurfaceError::Detached { id: handle.id() })
}

/// Text a reader would see: scripts and styles skipped, whitespace collapsed.
fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| matches!(e.name(), "script" | "style" | "noscript" | "template"))
        });
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    collapse_whitespace(&out)
}

#[async_trait]
impl DocumentSurface for SnapshotSurface {
    async fn navigate(&self, _url: &str) -> SurfaceResult<()> {
        Err(SurfaceError::Unavailable {
            surface: SURFACE_NAME,
            operation: "navigate",
        })
    }

    async fn query(&self, scope: Option<ElementHandle>, selector: &str) -> SurfaceResult<Vec<ElementHandle>> {
        self.select(scope, selector)
    }

    async fn inner_text(&self, element: ElementHandle) -> SurfaceResult<String> {
        self.with_element(element, visible_text)
    }

    async fn inner_html(&self, element: ElementHandle) -> SurfaceResult<String> {
        self.with_element(element, |el| el.inner_html())
    }

    async fn attribute(&self, element: ElementHandle, name: &str) -> SurfaceResult<Option<String>> {
        self.with_element(element, |el| el.value().attr(name).map(str::to_string))
    }

    async fn vertical_offset(&self, element: ElementHandle) -> SurfaceResult<Option<f64>> {
        self.with_element(element, |_| Some(element.id() as f64))
    }

    async fn page_text(&self) -> SurfaceResult<String> {
        let document = Html::parse_document(&self.html);
        let body = Selector::parse("body").map_err(|_| SurfaceError::InvalidSelector {
            selector: "body".into(),
        })?;
        let root = document
            .select(&body)
            .next()
            .unwrap_or_else(|| document.root_element());
        Ok(visible_text(root))
    }

    async fn wait(&self, _duration: Duration) {}

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> SurfaceResult<ElementHandle> {
        self.select(None, selector)?
            .into_iter()
            .next()
            .ok_or_else(|| SurfaceError::Timeout {
                what: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
    }

    async fn scroll_by(&self, _dx: i64, _dy: i64) -> SurfaceResult<()> {
        Ok(())
    }

    async fn hover_or_focus(&self, element: ElementHandle) -> SurfaceResult<()> {
        self.with_element(element, |_| ())
    }

    async fn click(&self, element: ElementHandle) -> SurfaceResult<()> {
        self.with_element(element, |_| ())
    }

    fn name(&self) -> &str {
        SURFACE_NAME
    }
}
