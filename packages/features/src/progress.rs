//! Progress reporting for per-record batch work.
//!
//! The buffer-count pass reports through [`ProgressCallback`] and never sees
//! the renderer. The terminal bar lives in `gehl_map_cli_utils`; tests use
//! [`NullProgress`].

/// Receives progress from a pass over the records of a table.
pub trait ProgressCallback: Send + Sync {
    /// Number of records the pass will visit.
    fn set_total(&self, total: u64);

    /// `delta` more records are done.
    fn inc(&self, delta: u64);

    fn set_message(&self, msg: String);

    /// The pass is over; `msg` replaces the running message.
    fn finish(&self, msg: String);
}

/// Discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}
