//! Command implementations

pub mod download;
pub mod extract_file;
pub mod last;
pub mod list;
pub mod pick;
