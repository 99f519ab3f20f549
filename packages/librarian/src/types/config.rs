//! Configuration types for scrolling, probing and waiting.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the convergence scroller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Consecutive rounds without growth before the list counts as fully
    /// revealed.
    ///
    /// Default: 5.
    pub max_stable_rounds: u32,

    /// Time given to lazy content to mount after each reveal action.
    ///
    /// Default: 1500ms.
    pub settle_delay_ms: u64,

    /// Vertical distance of one scroll-by reveal action.
    ///
    /// Default: 1000px.
    pub reveal_step_px: i64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            max_stable_rounds: 5,
            settle_delay_ms: 1500,
            reveal_step_px: 1000,
        }
    }
}

impl ScrollConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_stable_rounds(mut self, rounds: u32) -> Self {
        self.max_stable_rounds = rounds;
        self
    }

    pub fn with_settle_delay_ms(mut self, ms: u64) -> Self {
        self.settle_delay_ms = ms;
        self
    }

    pub fn with_reveal_step_px(mut self, px: i64) -> Self {
        self.reveal_step_px = px;
        self
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Configuration for the selector prober.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Elements need trimmed inner text strictly longer than this.
    ///
    /// Default: 0 (any non-empty text).
    pub min_text_len: usize,

    /// Reveal-and-retry cycles after a full pass finds nothing.
    ///
    /// Default: 1.
    pub reveal_retries: u32,

    /// Wait after the reveal action before retrying.
    ///
    /// Default: 2000ms.
    pub retry_delay_ms: u64,

    /// Vertical distance of the reveal scroll.
    ///
    /// Default: 1000px.
    pub reveal_step_px: i64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            min_text_len: 0,
            reveal_retries: 1,
            retry_delay_ms: 2000,
            reveal_step_px: 1000,
        }
    }
}

impl ProbeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_text_len(mut self, len: usize) -> Self {
        self.min_text_len = len;
        self
    }

    pub fn with_reveal_retries(mut self, retries: u32) -> Self {
        self.reveal_retries = retries;
        self
    }

    pub fn with_retry_delay_ms(mut self, ms: u64) -> Self {
        self.retry_delay_ms = ms;
        self
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// A bounded wait for a selector, followed by an optional settle delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitConfig {
    pub selector: String,
    pub timeout_ms: u64,

    /// Extra wait after the selector appeared (or the wait timed out).
    #[serde(default)]
    pub settle_ms: u64,
}

impl WaitConfig {
    pub fn new(selector: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            selector: selector.into(),
            timeout_ms,
            settle_ms: 0,
        }
    }

    pub fn with_settle_ms(mut self, ms: u64) -> Self {
        self.settle_ms = ms;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}
