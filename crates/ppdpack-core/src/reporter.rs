//! Reporter trait for dependency injection
//!
//! Core operations report progress and skipped files through this trait
//! instead of writing to a global logger, so callers decide where
//! diagnostics end up.

/// Sink for diagnostics emitted while building an archive.
pub trait Reporter: Send + Sync {
    /// Detailed per-file progress.
    fn debug(&self, msg: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a warning message (a file was skipped, a duplicate was dropped).
    fn warning(&self, msg: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn debug(&self, msg: &str) {
        (**self).debug(msg);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
}

impl<T: Reporter + ?Sized> Reporter for &T {
    fn debug(&self, msg: &str) {
        (**self).debug(msg);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
}

/// A no-op reporter for silent operations (e.g., verification, testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn debug(&self, _: &str) {}
    fn info(&self, _: &str) {}
    fn warning(&self, _: &str) {}
}

/// Forwards every message to the matching `tracing` macro.
#[derive(Debug, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }
    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }
    fn warning(&self, msg: &str) {
        tracing::warn!("{msg}");
    }
}
