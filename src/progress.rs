// src/progress.rs
/// Lightweight progress reporting for a scrape run.
/// Frontends (the CLI, tests) implement this to surface status to users.
pub trait Progress {
    /// Called at the start with the number of targets.
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// One target produced its records.
    fn item_done(&mut self, _id: &str) {}

    /// One target produced an error record instead.
    fn item_failed(&mut self, _id: &str, _reason: &str) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}
