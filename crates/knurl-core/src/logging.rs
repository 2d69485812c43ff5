#![forbid(unsafe_code)]

//! Logging and tracing support.
//!
//! Re-exports of `tracing` macros when the `tracing` feature is enabled.
//! Call sites in this workspace gate instrumentation with
//! `#[cfg(feature = "tracing")]`, so no no-op shims are needed here.

#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span, error, info, trace, trace_span, warn};
