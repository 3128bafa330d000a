//! Macros that are used throughout the crate.

/// Emit a `trace` record for a single free list operation.
///
/// These records are very noisy, so they are only emitted if the
/// `logging` feature is enabled.
macro_rules! step {
    ($($args:tt)+) => {
        if cfg!(feature = "logging") {
            ::log::trace!($($args)+);
        }
    };
}
