//! Data types shared by the extraction pipeline.

pub mod config;
pub mod document;
pub mod selectors;
pub mod summary;
