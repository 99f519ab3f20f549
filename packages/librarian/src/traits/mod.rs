//! Core trait abstractions for the librarian.
//!
//! Applications plug in a page backend ([`surface::DocumentSurface`]), an
//! output destination ([`sink::DocumentSink`]) and a chat application
//! ([`platform::Platform`]).

pub mod platform;
pub mod sink;
pub mod surface;
