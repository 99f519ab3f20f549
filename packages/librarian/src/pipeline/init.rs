//! Post-navigation setup: dismiss first-run modals, wait for readiness.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::traits::surface::DocumentSurface;
use crate::types::selectors::InitSequence;

/// Run a platform's init sequence. Never fails; a modal that is not there
/// or a ready signal that never shows is logged and skipped.
pub async fn run_init_sequence(surface: &dyn DocumentSurface, init: &InitSequence, platform: &str) {
    if !init.dismiss_buttons.is_empty() {
        dismiss_modals(surface, init, platform).await;
    }

    if let Some(ready) = &init.ready_signal {
        info!(platform, selector = %ready.selector, "Waiting for page to be ready");
        match surface.wait_for_selector(&ready.selector, ready.timeout()).await {
            Ok(_) => surface.wait(ready.settle()).await,
            Err(e) => warn!(platform, error = %e, "Ready signal not seen, continuing"),
        }
    }
}

async fn dismiss_modals(surface: &dyn DocumentSurface, init: &InitSequence, platform: &str) {
    let timeout = Duration::from_millis(init.dismiss_timeout_ms);
    if surface.wait_for_selector("button", timeout).await.is_err() {
        info!(platform, "No initial modal found. Continuing.");
        return;
    }

    let buttons = match surface.query(None, "button").await {
        Ok(buttons) => buttons,
        Err(e) => {
            debug!(error = %e, "Could not list buttons");
            return;
        }
    };

    for button in buttons {
        let Ok(text) = surface.inner_text(button).await else {
            continue;
        };
        let label = normalize_label(&text);
        if init.dismiss_buttons.iter().any(|b| normalize_label(b) == label) {
            match surface.click(button).await {
                Ok(()) => info!(platform, button = %text.trim(), "Dismissed welcome modal"),
                Err(e) => warn!(platform, error = %e, "Could not click dismiss button"),
            }
            return;
        }
    }
    info!(platform, "No initial modal found. Continuing.");
}

/// Lowercase, trimmed, typographic apostrophes folded.
fn normalize_label(s: &str) -> String {
    s.trim().replace('\u{2019}', "'").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockElement, MockSurface, SurfaceCall};
    use crate::types::config::WaitConfig;

    fn init() -> InitSequence {
        InitSequence {
            dismiss_buttons: vec!["Okay, let's go".into()],
            dismiss_timeout_ms: 5000,
            ready_signal: None,
        }
    }

    #[tokio::test]
    async fn test_clicks_matching_dismiss_button() {
        let surface = MockSurface::new();
        let other = surface.add_element(MockElement::with_text("Log in"));
        let ok = surface.add_element(MockElement::with_text("  Okay, let\u{2019}s go "));
        surface.bind("button", &[other, ok]);

        run_init_sequence(&surface, &init(), "chatgpt").await;
        let calls = surface.calls();
        assert!(calls.contains(&SurfaceCall::Click { id: ok.id() }));
        assert!(!calls.contains(&SurfaceCall::Click { id: other.id() }));
    }

    #[tokio::test]
    async fn test_missing_modal_is_fine() {
        let surface = MockSurface::new();
        run_init_sequence(&surface, &init(), "chatgpt").await;
        assert!(!surface
            .calls()
            .iter()
            .any(|c| matches!(c, SurfaceCall::Click { .. })));
    }

    #[tokio::test]
    async fn test_ready_signal_settles() {
        let surface = MockSurface::new();
        let nav = surface.add_element(MockElement::new());
        surface.bind("mat-sidenav", &[nav]);
        let init = InitSequence {
            ready_signal: Some(WaitConfig::new("mat-sidenav", 10_000).with_settle_ms(2000)),
            ..Default::default()
        };

        run_init_sequence(&surface, &init, "gemini").await;
        assert!(surface.calls().contains(&SurfaceCall::Wait { ms: 2000 }));
    }
}
