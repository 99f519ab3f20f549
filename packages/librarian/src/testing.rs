//! Testing utilities including mock implementations.
//!
//! These are useful for exercising the extraction algorithms without a
//! browser: a scripted [`MockSurface`] and an in-memory [`MemorySink`].

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{Result, SurfaceError, SurfaceResult};
use crate::traits::{sink::DocumentSink, surface::DocumentSurface};
use crate::types::{document::ConversationDocument, summary::ElementHandle};

/// A fake element registered on a [`MockSurface`].
#[derive(Debug, Clone, Default)]
pub struct MockElement {
    pub text: String,
    pub html: String,
    pub attributes: HashMap<String, String>,
    pub y: Option<f64>,
}

impl MockElement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Element whose text and markup are both `text`.
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            html: text.clone(),
            text,
            ..Default::default()
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = html.into();
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn at(mut self, y: f64) -> Self {
        self.y = Some(y);
        self
    }
}

/// Record of a call made to the mock surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Navigate { url: String },
    Query { selector: String },
    Count { selector: String },
    WaitFor { selector: String },
    Wait { ms: u64 },
    ScrollBy { dx: i64, dy: i64 },
    Hover { id: u64 },
    Click { id: u64 },
}

#[derive(Default)]
struct MockState {
    epoch: u64,
    elements: Vec<MockElement>,
    matches: HashMap<(Option<u64>, String), Vec<u64>>,
    count_scripts: HashMap<String, VecDeque<usize>>,
    detached: HashSet<u64>,
    invalid_selectors: HashSet<String>,
    page_text: Option<String>,
    calls: Vec<SurfaceCall>,
}

impl MockState {
    fn check(&self, handle: ElementHandle) -> SurfaceResult<&MockElement> {
        if handle.epoch() != self.epoch || self.detached.contains(&handle.id()) {
            return Err(SurfaceError::Detached { id: handle.id() });
        }
        self.elements
            .get(handle.id() as usize)
            .ok_or(SurfaceError::Detached { id: handle.id() })
    }

    fn lookup(&self, scope: Option<ElementHandle>, selector: &str) -> Vec<ElementHandle> {
        let scoped = scope.and_then(|s| self.matches.get(&(Some(s.id()), selector.to_string())));
        scoped
            .or_else(|| self.matches.get(&(None, selector.to_string())))
            .map(|ids| {
                ids.iter()
                    .map(|id| ElementHandle::new(*id, self.epoch))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A scripted document surface for tests.
///
/// Elements are registered up front and bound to selectors. Counts can be
/// scripted per selector to simulate a list that grows as it is scrolled;
/// once a script runs out its last value repeats. Waits are recorded but
/// never sleep.
///
/// # Example
///
/// ```rust
/// use chat_librarian::testing::{MockElement, MockSurface};
///
/// let surface = MockSurface::new();
/// let link = surface.add_element(MockElement::with_text("Trip Plan"));
/// surface.bind("a.chat", &[link]);
/// surface.script_counts("a.chat", [3, 5, 5]);
/// ```
#[derive(Clone, Default)]
pub struct MockSurface {
    state: Arc<RwLock<MockState>>,
}

impl MockSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element in the current epoch.
    pub fn add_element(&self, element: MockElement) -> ElementHandle {
        let mut state = self.state.write().unwrap();
        state.elements.push(element);
        ElementHandle::new((state.elements.len() - 1) as u64, state.epoch)
    }

    /// Make `selector` match `handles` anywhere in the document.
    pub fn bind(&self, selector: impl Into<String>, handles: &[ElementHandle]) {
        self.bind_scoped(None, selector, handles);
    }

    /// Make `selector` match `handles` when queried inside `scope`.
    pub fn bind_scoped(
        &self,
        scope: Option<ElementHandle>,
        selector: impl Into<String>,
        handles: &[ElementHandle],
    ) {
        self.state.write().unwrap().matches.insert(
            (scope.map(|s| s.id()), selector.into()),
            handles.iter().map(|h| h.id()).collect(),
        );
    }

    /// Script the values `count` returns for a selector.
    pub fn script_counts(&self, selector: impl Into<String>, counts: impl IntoIterator<Item = usize>) {
        self.state
            .write()
            .unwrap()
            .count_scripts
            .insert(selector.into(), counts.into_iter().collect());
    }

    /// Make every operation on `handle` fail with `Detached`. Queries keep
    /// returning it, like a node re-rendered between lookup and use.
    pub fn detach(&self, handle: ElementHandle) {
        self.state.write().unwrap().detached.insert(handle.id());
    }

    /// Make queries with `selector` fail as unparsable.
    pub fn reject_selector(&self, selector: impl Into<String>) {
        self.state
            .write()
            .unwrap()
            .invalid_selectors
            .insert(selector.into());
    }

    pub fn set_page_text(&self, text: impl Into<String>) {
        self.state.write().unwrap().page_text = Some(text.into());
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.state.read().unwrap().calls.clone()
    }

    /// Number of scroll-by reveal actions issued.
    pub fn scroll_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, SurfaceCall::ScrollBy { .. }))
            .count()
    }

    /// Selectors passed to `query`, in call order.
    pub fn queried_selectors(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SurfaceCall::Query { selector } => Some(selector),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: SurfaceCall) {
        self.state.write().unwrap().calls.push(call);
    }

    fn read<T>(&self, handle: ElementHandle, f: impl FnOnce(&MockElement) -> T) -> SurfaceResult<T> {
        let state = self.state.read().unwrap();
        state.check(handle).map(f)
    }
}

#[async_trait]
impl DocumentSurface for MockSurface {
    async fn navigate(&self, url: &str) -> SurfaceResult<()> {
        let mut state = self.state.write().unwrap();
        state.calls.push(SurfaceCall::Navigate {
            url: url.to_string(),
        });
        state.epoch += 1;
        Ok(())
    }

    async fn query(
        &self,
        scope: Option<ElementHandle>,
        selector: &str,
    ) -> SurfaceResult<Vec<ElementHandle>> {
        let mut state = self.state.write().unwrap();
        state.calls.push(SurfaceCall::Query {
            selector: selector.to_string(),
        });
        if state.invalid_selectors.contains(selector) {
            return Err(SurfaceError::InvalidSelector {
                selector: selector.to_string(),
            });
        }
        if let Some(scope) = scope {
            state.check(scope)?;
        }
        Ok(state.lookup(scope, selector))
    }

    async fn count(&self, scope: Option<ElementHandle>, selector: &str) -> SurfaceResult<usize> {
        let mut state = self.state.write().unwrap();
        state.calls.push(SurfaceCall::Count {
            selector: selector.to_string(),
        });
        if state.invalid_selectors.contains(selector) {
            return Err(SurfaceError::InvalidSelector {
                selector: selector.to_string(),
            });
        }
        if let Some(script) = state.count_scripts.get_mut(selector) {
            let next = if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().copied()
            };
            return Ok(next.unwrap_or(0));
        }
        Ok(state.lookup(scope, selector).len())
    }

    async fn inner_text(&self, element: ElementHandle) -> SurfaceResult<String> {
        self.read(element, |e| e.text.clone())
    }

    async fn inner_html(&self, element: ElementHandle) -> SurfaceResult<String> {
        self.read(element, |e| e.html.clone())
    }

    async fn attribute(&self, element: ElementHandle, name: &str) -> SurfaceResult<Option<String>> {
        self.read(element, |e| e.attributes.get(name).cloned())
    }

    async fn vertical_offset(&self, element: ElementHandle) -> SurfaceResult<Option<f64>> {
        self.read(element, |e| e.y)
    }

    async fn page_text(&self) -> SurfaceResult<String> {
        self.state
            .read()
            .unwrap()
            .page_text
            .clone()
            .ok_or_else(|| SurfaceError::NotFound {
                selector: "body".into(),
            })
    }

    async fn wait(&self, duration: Duration) {
        self.record(SurfaceCall::Wait {
            ms: duration.as_millis() as u64,
        });
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> SurfaceResult<ElementHandle> {
        let mut state = self.state.write().unwrap();
        state.calls.push(SurfaceCall::WaitFor {
            selector: selector.to_string(),
        });
        state
            .lookup(None, selector)
            .into_iter()
            .next()
            .ok_or_else(|| SurfaceError::Timeout {
                what: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
    }

    async fn scroll_by(&self, dx: i64, dy: i64) -> SurfaceResult<()> {
        self.record(SurfaceCall::ScrollBy { dx, dy });
        Ok(())
    }

    async fn hover_or_focus(&self, element: ElementHandle) -> SurfaceResult<()> {
        self.record(SurfaceCall::Hover { id: element.id() });
        self.read(element, |_| ())
    }

    async fn click(&self, element: ElementHandle) -> SurfaceResult<()> {
        self.record(SurfaceCall::Click { id: element.id() });
        self.read(element, |_| ())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// In-memory sink that keeps every persisted document.
#[derive(Clone, Default)]
pub struct MemorySink {
    documents: Arc<RwLock<Vec<(String, ConversationDocument)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all persisted (title, document) pairs.
    pub fn documents(&self) -> Vec<(String, ConversationDocument)> {
        self.documents.read().unwrap().clone()
    }
}

#[async_trait]
impl DocumentSink for MemorySink {
    async fn persist(&self, title: &str, document: &ConversationDocument) -> Result<String> {
        let mut docs = self.documents.write().unwrap();
        docs.push((title.to_string(), document.clone()));
        Ok(format!("memory://{}", docs.len() - 1))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
