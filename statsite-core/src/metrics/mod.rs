//! Per-kind accumulators and fold rules.
//!
//! Each kind exposes an `append` and an `emit` free function rather than a
//! trait object — the set of kinds is closed (see [`crate::sample::Kind`]),
//! so [`crate::fold::fold`] dispatches on the kind tag directly instead of
//! through dynamic dispatch.

pub mod counter;
pub mod keyvalue;
pub mod timer;

use crate::sample::Value;

/// One `(name, value, timestamp)` triple produced by a fold.
///
/// `name` is the kind-namespace-and-key part only (e.g. `counts.page.views`
/// or `timers.request.mean_90`) — the configured prefix is prepended by
/// [`crate::sink::GraphiteSink`] at serialization time, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct Triple {
    pub name: String,
    pub value: Value,
    pub timestamp: i64,
}

impl Triple {
    pub fn new(name: impl Into<String>, value: Value, timestamp: i64) -> Self {
        Self {
            name: name.into(),
            value,
            timestamp,
        }
    }
}
