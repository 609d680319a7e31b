//! Reporter trait for dependency injection
//!
//! Lets the engine surface live progress without being coupled to a
//! terminal. Final results are never reported here; they are returned as a
//! [`crate::RunReport`].

pub trait Reporter: Send + Sync {
    /// A pipeline phase has started (e.g. "Hashing", "Resolving", "Syncing").
    fn section(&self, title: &str);

    /// A non-package entry in the package directory was ignored.
    fn ignored(&self, filename: &str);

    /// Updates the progress of a download.
    fn downloading(&self, filename: &str, current: u64, total: Option<u64>);

    /// A superseded file is being removed.
    fn removing(&self, filename: &str);

    /// A package finished syncing successfully.
    fn done(&self, filename: &str, detail: &str);

    /// A package failed to sync with a specific reason.
    fn failed(&self, filename: &str, reason: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn ignored(&self, filename: &str) {
        (**self).ignored(filename);
    }
    fn downloading(&self, filename: &str, current: u64, total: Option<u64>) {
        (**self).downloading(filename, current, total);
    }
    fn removing(&self, filename: &str) {
        (**self).removing(filename);
    }
    fn done(&self, filename: &str, detail: &str) {
        (**self).done(filename, detail);
    }
    fn failed(&self, filename: &str, reason: &str) {
        (**self).failed(filename, reason);
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn ignored(&self, _: &str) {}
    fn downloading(&self, _: &str, _: u64, _: Option<u64>) {}
    fn removing(&self, _: &str) {}
    fn done(&self, _: &str, _: &str) {}
    fn failed(&self, _: &str, _: &str) {}
}
