//! Extraction pipeline.
//!
//! - [`scroll`]: reveal a lazily loaded list until its count converges
//! - [`probe`]: ordered fallback over candidate selectors
//! - [`convert`]: message markup to structured blocks
//! - [`history`]: list conversations from the history region
//! - [`extract`]: read an open conversation into a document
//! - [`init`]: post-navigation setup

pub mod convert;
pub mod extract;
pub mod history;
pub mod init;
pub mod probe;
pub mod scroll;

pub use convert::FragmentConverter;
pub use extract::{extract_conversation, extract_open_conversation};
pub use history::list_conversations;
pub use init::run_init_sequence;
pub use probe::{probe, probe_with_reveal, Probed, ProbedElement};
pub use scroll::{ConvergenceScroller, ItemLocator, ScrollOutcome};
