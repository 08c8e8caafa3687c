//! Shared types for the portal report pipeline.
//!
//! Holds the domain models passed between the detector, the summary builder
//! and the runtime, plus the error type and command-line settings.

pub mod branches;
pub mod error;
pub mod models;
pub mod settings;

pub use error::{ReportError, Result};
