//! Runtime for the portal report pipeline.
//!
//! Wires the report trigger, the arrival detector and the summary builder
//! into one blocking run, and writes the result out.

pub mod orchestrator;
pub mod output;
pub mod trigger;
