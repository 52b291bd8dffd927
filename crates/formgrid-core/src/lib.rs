#![forbid(unsafe_code)]

//! Core: geometry and logging shared by the formgrid crates.
//!
//! # Role in formgrid
//! `formgrid-core` holds the pieces that are not specific to the layout
//! engine itself: floating-point geometry used for pointer hit-testing and a
//! logging facade that compiles down to nothing unless the `tracing` feature
//! is enabled.
//!
//! # How it fits in the system
//! `formgrid-layout` consumes [`geometry::Bounds`] and [`geometry::Point`]
//! for drop-target classification and uses the logging macros re-exported
//! here for operation diagnostics.

pub mod geometry;
pub mod logging;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, info, trace, trace_span, warn};
