//! Chat Librarian
//!
//! Extracts conversations from web chat applications (ChatGPT, Gemini)
//! into structured documents. The pages these apps render are lazy and
//! unstable: history lists load on scroll, markup shifts between releases,
//! and messages may be split across role-specific containers.
//!
//! # Design
//!
//! - Platforms are data. Adapters supply selector sets; the scrolling,
//!   probing, extraction and conversion algorithms are shared.
//! - Everything degrades. Selector lists fall back in order, scrolling stops
//!   on convergence or budget, and extraction falls back to plain text
//!   before giving up with a placeholder.
//! - The page is a trait. [`DocumentSurface`] hides the browser; the same
//!   code runs against Chrome, a saved snapshot or a scripted mock.
//!
//! # Usage
//!
//! ```rust,ignore
//! use chat_librarian::{platform_for, Librarian, MarkdownDirSink};
//! use chat_librarian::surfaces::CdpSurface;
//!
//! let surface = CdpSurface::attach(9222).await?;
//! let platform = platform_for("gemini")?;
//! let sink = MarkdownDirSink::new(platform.output_dir_name());
//!
//! let librarian = Librarian::new(platform, surface, sink);
//! librarian.open().await?;
//! let path = librarian.download_by_title("Trip planning").await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Surface, sink and platform abstractions
//! - [`types`] - Documents, summaries, selector sets and configs
//! - [`pipeline`] - Scroller, prober, converter and extractor
//! - [`platforms`] - ChatGPT and Gemini adapters
//! - [`surfaces`] - Snapshot and (feature `cdp`) browser surfaces
//! - [`sinks`] - Markdown directory sink
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod pipeline;
pub mod platforms;
pub mod render;
pub mod session;
pub mod sinks;
pub mod surfaces;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{LibrarianError, Result, SurfaceError, SurfaceResult};
pub use pipeline::{
    ConvergenceScroller, FragmentConverter, ItemLocator, Probed, ProbedElement, ScrollOutcome,
};
pub use platforms::{platform_for, ChatGpt, Gemini, PlatformKind};
pub use render::render_markdown;
pub use session::Librarian;
pub use sinks::{sanitize_filename, MarkdownDirSink};
pub use surfaces::SnapshotSurface;
pub use traits::{platform::Platform, sink::DocumentSink, surface::DocumentSurface};
pub use types::{
    config::{ProbeConfig, ScrollConfig, WaitConfig},
    document::{
        ConversationDocument, ExtractionMode, FallbackContent, FallbackTier, MessageEntry, Role,
        StructuredBlock,
    },
    selectors::{
        AttributedSelectors, ConversationSelectors, HistorySelectors, InitSequence,
        PlatformSelectors, RoleSelectors,
    },
    summary::{find_by_title, ChatSummary, ElementHandle},
};
