#![forbid(unsafe_code)]

//! Core: input events, semantic gesture classification, and interaction tuning.

pub mod classifier;
pub mod config;
pub mod event;
pub mod geometry;
pub mod logging;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, error, info, trace, trace_span, warn};
