use std::time::{SystemTime, UNIX_EPOCH};

/// Supplies the wall-clock seconds a fold stamps onto its triples.
///
/// A trait rather than a bare function so tests can swap in a fixed or
/// manually-advanced clock instead of racing real time.
pub trait Clock: Send + Sync {
    fn now_seconds(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_seconds(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}
