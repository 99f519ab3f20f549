//! Document surface implementations.

pub mod snapshot;

#[cfg(feature = "cdp")]
pub mod cdp;

pub use snapshot::SnapshotSurface;

#[cfg(feature = "cdp")]
pub use cdp::{CdpSurface, LaunchOptions};
