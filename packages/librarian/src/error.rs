//! Typed errors for the librarian library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can tell
//! recoverable surface conditions apart from fatal ones.

use thiserror::Error;

/// Errors raised by a [`DocumentSurface`](crate::traits::surface::DocumentSurface).
///
/// `NotFound`, `Detached` and `Timeout` are recoverable: the scroller, prober
/// and extractor absorb them into "no progress" or a fallback tier.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// A selector never matched anything
    #[error("no element matches selector: {selector}")]
    NotFound { selector: String },

    /// A previously issued element handle is no longer valid
    #[error("element handle {id} is detached")]
    Detached { id: u64 },

    /// A bounded wait expired
    #[error("timed out after {timeout_ms}ms waiting for: {what}")]
    Timeout { what: String, timeout_ms: u64 },

    /// The selector string could not be parsed
    #[error("invalid selector: {selector}")]
    InvalidSelector { selector: String },

    /// The backend failed to run a query or script
    #[error("surface script error: {0}")]
    Script(String),

    /// The operation is not available on this surface
    #[error("operation not supported by {surface}: {operation}")]
    Unavailable {
        surface: &'static str,
        operation: &'static str,
    },
}

impl SurfaceError {
    /// Whether the extraction loops may absorb this error and keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SurfaceError::NotFound { .. }
                | SurfaceError::Detached { .. }
                | SurfaceError::Timeout { .. }
        )
    }
}

/// Errors surfaced to callers of the librarian.
#[derive(Debug, Error)]
pub enum LibrarianError {
    /// Platform name not recognized by the adapter factory
    #[error("unsupported platform: {0}")]
    Unsupported(String),

    /// No listed conversation has the requested title
    #[error("no chat found with the exact title (case-insensitive): '{title}'")]
    ChatNotFound { title: String },

    /// The history list was empty after scrolling and probing
    #[error("no conversations found on {platform}")]
    NoConversations { platform: String },

    /// Surface operation failed outside a retry budget
    #[error("surface error: {0}")]
    Surface(#[from] SurfaceError),

    /// Writing the rendered document failed
    #[error("failed to persist '{title}': {source}")]
    Persist {
        title: String,
        #[source]
        source: std::io::Error,
    },

    /// Browser session could not be started or attached
    #[error("browser error: {0}")]
    Browser(String),
}

/// Result type alias for librarian operations.
pub type Result<T> = std::result::Result<T, LibrarianError>;

/// Result type alias for surface operations.
pub type SurfaceResult<T> = std::result::Result<T, SurfaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(SurfaceError::Detached { id: 3 }.is_recoverable());
        assert!(SurfaceError::Timeout {
            what: "div".into(),
            timeout_ms: 10
        }
        .is_recoverable());
        assert!(!SurfaceError::Script("boom".into()).is_recoverable());
    }

    #[test]
    fn test_chat_not_found_message() {
        let err = LibrarianError::ChatNotFound {
            title: "Trip Plan".into(),
        };
        assert!(err.to_string().contains("'Trip Plan'"));
    }
}
