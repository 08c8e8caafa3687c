//! Data layer for the portal report pipeline.
//!
//! Detects freshly downloaded spreadsheets, loads them, and consolidates
//! their rows into a per-date summary.

pub mod detector;
pub mod loader;
pub mod summary;
pub mod table;

pub use report_core as core;
