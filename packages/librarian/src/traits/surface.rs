//! Document surface trait: the live page the librarian drives.
//!
//! A surface is whatever can run selector queries against a rendered page
//! and perform reveal actions on it: a CDP-controlled browser tab, a saved
//! HTML snapshot, or a scripted mock.
//!
//! # Usage
//!
//! ```rust,ignore
//! use chat_librarian::traits::surface::DocumentSurface;
//!
//! let links = surface.query(None, "a[href^='/c/']").await?;
//! for link in links {
//!     let title = surface.inner_text(link).await?;
//! }
//! ```

use async_trait::async_trait;
use std::time::Duration;

use crate::error::SurfaceResult;
use crate::types::summary::ElementHandle;

/// Capabilities the extraction core consumes from a rendered page.
///
/// Every method is a suspension point. Implementations use interior
/// mutability; a surface is still driven by one flow at a time.
///
/// Handles are only valid for the epoch they were issued in. After
/// [`navigate`](DocumentSurface::navigate) every older handle must be
/// rejected with `SurfaceError::Detached`.
#[async_trait]
pub trait DocumentSurface: Send + Sync {
    /// Load a URL, invalidating all outstanding handles.
    async fn navigate(&self, url: &str) -> SurfaceResult<()>;

    /// Run a CSS selector scoped to `scope` (or the whole document) and
    /// return matches in document order.
    async fn query(
        &self,
        scope: Option<ElementHandle>,
        selector: &str,
    ) -> SurfaceResult<Vec<ElementHandle>>;

    /// Count matches of a selector.
    async fn count(&self, scope: Option<ElementHandle>, selector: &str) -> SurfaceResult<usize> {
        Ok(self.query(scope, selector).await?.len())
    }

    /// Rendered text of an element.
    async fn inner_text(&self, element: ElementHandle) -> SurfaceResult<String>;

    /// Inner markup of an element.
    async fn inner_html(&self, element: ElementHandle) -> SurfaceResult<String>;

    /// Value of an attribute, `None` when absent.
    async fn attribute(&self, element: ElementHandle, name: &str) -> SurfaceResult<Option<String>>;

    /// Vertical offset of the element's bounding box, `None` when the
    /// element has no layout box.
    async fn vertical_offset(&self, element: ElementHandle) -> SurfaceResult<Option<f64>>;

    /// Visible text of the whole page body.
    async fn page_text(&self) -> SurfaceResult<String>;

    /// Sleep for a fixed duration.
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Wait until `selector` matches, or fail with `Timeout`.
    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> SurfaceResult<ElementHandle>;

    /// Scroll whatever is under the pointer (or the focused region).
    async fn scroll_by(&self, dx: i64, dy: i64) -> SurfaceResult<()>;

    /// Move the pointer over an element, or focus it, so that subsequent
    /// scrolls target its scroll container.
    async fn hover_or_focus(&self, element: ElementHandle) -> SurfaceResult<()>;

    /// Click an element.
    async fn click(&self, element: ElementHandle) -> SurfaceResult<()>;

    /// Surface name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}
