//! Selector prober - ordered fallback over candidate selectors.
//!
//! Platforms change their markup; adapters carry several selectors for the
//! same thing, most specific first. The prober returns the elements of the
//! first candidate that matches anything with usable text.

use tracing::{debug, info, warn};

use crate::traits::surface::DocumentSurface;
use crate::types::{config::ProbeConfig, summary::ElementHandle};

/// An element matched by the prober, with the text it was judged on.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbedElement {
    pub handle: ElementHandle,
    pub text: String,
}

/// Result of a successful probe.
#[derive(Debug, Clone, PartialEq)]
pub struct Probed {
    /// The candidate that produced the matches
    pub selector: String,

    /// Matching elements in document order
    pub elements: Vec<ProbedElement>,
}

impl Probed {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Try each candidate in order and return the first non-empty result.
///
/// Elements are kept when their trimmed text is longer than
/// `min_text_len` characters. Failing candidates (invalid, timed out,
/// detached) are logged and skipped. Returns `None` when every candidate
/// comes up empty.
pub async fn probe(
    surface: &dyn DocumentSurface,
    scope: Option<ElementHandle>,
    candidates: &[String],
    min_text_len: usize,
) -> Option<Probed> {
    for selector in candidates {
        debug!(selector = %selector, "Trying selector");

        let handles = match surface.query(scope, selector).await {
            Ok(handles) => handles,
            Err(e) if e.is_recoverable() => {
                debug!(selector = %selector, error = %e, "Selector lookup failed");
                continue;
            }
            Err(e) => {
                warn!(selector = %selector, error = %e, "Skipping selector");
                continue;
            }
        };

        let mut elements = Vec::new();
        for handle in handles {
            match surface.inner_text(handle).await {
                Ok(text) if text.trim().chars().count() > min_text_len => {
                    elements.push(ProbedElement {
                        handle,
                        text: text.trim().to_string(),
                    });
                }
                Ok(_) => {}
                Err(e) => debug!(selector = %selector, error = %e, "Dropping unreadable element"),
            }
        }

        if !elements.is_empty() {
            info!(
                selector = %selector,
                count = elements.len(),
                "Selector found elements"
            );
            return Some(Probed {
                selector: selector.clone(),
                elements,
            });
        }
        debug!(selector = %selector, "Selector found no usable elements");
    }
    None
}

/// [`probe`] with bounded reveal-and-retry cycles.
///
/// When a full pass finds nothing, the scope (if any) is hovered, the view
/// is scrolled by `reveal_step_px`, and the surface waits `retry_delay_ms`
/// before the next pass. At most `1 + reveal_retries` passes are made.
pub async fn probe_with_reveal(
    surface: &dyn DocumentSurface,
    scope: Option<ElementHandle>,
    candidates: &[String],
    config: &ProbeConfig,
) -> Option<Probed> {
    for attempt in 0..=config.reveal_retries {
        if attempt > 0 {
            info!(attempt, "No elements yet, revealing more content before retrying");
            reveal(surface, scope, config).await;
        }
        if let Some(found) = probe(surface, scope, candidates, config.min_text_len).await {
            return Some(found);
        }
    }
    warn!(
        candidates = candidates.len(),
        "No candidate selector matched any elements"
    );
    None
}

async fn reveal(surface: &dyn DocumentSurface, scope: Option<ElementHandle>, config: &ProbeConfig) {
    if let Some(scope) = scope {
        if let Err(e) = surface.hover_or_focus(scope).await {
            debug!(error = %e, "Could not focus probe scope");
        }
    }
    if let Err(e) = surface.scroll_by(0, config.reveal_step_px).await {
        debug!(error = %e, "Reveal scroll failed");
    }
    surface.wait(config.retry_delay()).await;
}
