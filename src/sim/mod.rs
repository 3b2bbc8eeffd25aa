//! Simulation harness.
//!
//! Drives a peripheral from recorded bus traffic instead of an emulated CPU.

/// TOML access scripts and their replay.
pub mod script;

pub use script::{Script, Step, TraceRecord};
