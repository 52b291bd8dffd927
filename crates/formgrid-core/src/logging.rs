//! Logging facade.
//!
//! With the `tracing` feature the usual `tracing` macros are re-exported at
//! the crate root. Without it, same-named macros expand to nothing so call
//! sites never need their own `#[cfg]` guards.

#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span, info, trace, trace_span, warn};

/// Stand-in for an entered span when tracing is compiled out.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSpan;

impl NoopSpan {
    /// Mirror of `tracing::Span::entered`.
    #[inline]
    #[must_use]
    pub const fn entered(self) -> Self {
        self
    }
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! debug_span {
    ($($arg:tt)*) => {
        $crate::logging::NoopSpan
    };
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! trace_span {
    ($($arg:tt)*) => {
        $crate::logging::NoopSpan
    };
}

/// Error returned when a global subscriber could not be installed.
#[cfg(feature = "tracing-fmt")]
pub type SubscriberInitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Install a global fmt subscriber filtered by `RUST_LOG`.
///
/// `default_directive` is used when `RUST_LOG` is unset or unparsable,
/// e.g. `"formgrid_layout=debug"`.
#[cfg(feature = "tracing-fmt")]
pub fn init_subscriber(default_directive: &str) -> Result<(), SubscriberInitError> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(Into::into)
}
