//! Convergence scroller - reveal a lazily loaded list until it stops growing.
//!
//! Each round brings the last item into view, scrolls by a fixed step, waits
//! for new items to mount and recounts. The loop ends after
//! `max_stable_rounds` consecutive rounds without a count change. Failed
//! rounds count as no change, so the loop always terminates.

use std::time::Instant;
use tracing::{debug, info};

use crate::error::SurfaceResult;
use crate::traits::surface::DocumentSurface;
use crate::types::{config::ScrollConfig, summary::ElementHandle};

/// How to find the items of a list.
#[derive(Debug, Clone)]
pub struct ItemLocator {
    /// Element queries are scoped to; the whole document when `None`
    pub scope: Option<ElementHandle>,

    /// Candidate item selectors; the first one with a non-zero count is used
    pub candidates: Vec<String>,
}

impl ItemLocator {
    pub fn new(scope: Option<ElementHandle>, candidates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            scope,
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }

    /// Count items using the first candidate that matches anything.
    pub async fn count(&self, surface: &dyn DocumentSurface) -> SurfaceResult<usize> {
        let mut last_error = None;
        for selector in &self.candidates {
            match surface.count(self.scope, selector).await {
                Ok(0) => {}
                Ok(n) => return Ok(n),
                Err(e) => {
                    debug!(selector = %selector, error = %e, "Item count failed, trying next candidate");
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(e) => Err(e),
            None => Ok(0),
        }
    }

    /// The last item currently rendered, if any. A failing candidate is
    /// treated like one with no matches.
    pub async fn last_item(&self, surface: &dyn DocumentSurface) -> Option<ElementHandle> {
        for selector in &self.candidates {
            match surface.query(self.scope, selector).await {
                Ok(items) => {
                    if let Some(last) = items.last() {
                        return Some(*last);
                    }
                }
                Err(e) => {
                    debug!(selector = %selector, error = %e, "Item lookup failed, trying next candidate");
                }
            }
        }
        None
    }
}

/// Result of a scroll session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOutcome {
    /// Item count when the list converged
    pub final_count: usize,

    /// Reveal rounds performed
    pub rounds: u32,
}

/// Drives a list to convergence.
#[derive(Debug, Clone, Default)]
pub struct ConvergenceScroller {
    config: ScrollConfig,
}

impl ConvergenceScroller {
    pub fn new(config: ScrollConfig) -> Self {
        Self { config }
    }

    /// Scroll until the item count is stable and return it.
    pub async fn materialize_all(&self, surface: &dyn DocumentSurface, items: &ItemLocator) -> usize {
        self.materialize(surface, items).await.final_count
    }

    /// Like [`materialize_all`](Self::materialize_all), also reporting the
    /// number of rounds.
    pub async fn materialize(&self, surface: &dyn DocumentSurface, items: &ItemLocator) -> ScrollOutcome {
        let stable_needed = self.config.max_stable_rounds.max(1);
        let started = Instant::now();

        let mut previous = match items.count(surface).await {
            Ok(n) => n,
            Err(e) => {
                debug!(error = %e, "Initial count failed, starting from zero");
                0
            }
        };
        info!(count = previous, "Scrolling to load all items");

        let mut stagnant = 0;
        let mut rounds = 0;
        while stagnant < stable_needed {
            rounds += 1;
            match self.round(surface, items).await {
                Ok(count) if count != previous => {
                    debug!(round = rounds, from = previous, to = count, "Item count changed");
                    previous = count;
                    stagnant = 0;
                }
                Ok(_) => {
                    stagnant += 1;
                    debug!(round = rounds, stagnant, count = previous, "Item count unchanged");
                }
                Err(e) => {
                    debug!(round = rounds, error = %e, "Reveal round failed");
                    stagnant += 1;
                }
            }
        }

        info!(
            count = previous,
            rounds,
            duration_ms = started.elapsed().as_millis() as u64,
            "Item count stable, list fully loaded"
        );
        ScrollOutcome {
            final_count: previous,
            rounds,
        }
    }

    async fn round(&self, surface: &dyn DocumentSurface, items: &ItemLocator) -> SurfaceResult<usize> {
        let revealed = self.reveal(surface, items).await;
        surface.wait(self.config.settle_delay()).await;
        revealed?;
        items.count(surface).await
    }

    async fn reveal(&self, surface: &dyn DocumentSurface, items: &ItemLocator) -> SurfaceResult<()> {
        match items.last_item(surface).await {
            Some(last) => surface.hover_or_focus(last).await?,
            None => {
                if let Some(scope) = items.scope {
                    surface.hover_or_focus(scope).await?;
                }
            }
        }
        surface.scroll_by(0, self.config.reveal_step_px).await
    }
}
