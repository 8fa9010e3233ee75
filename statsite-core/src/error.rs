use std::io;
use thiserror::Error;

/// Errors that can occur while forwarding folded triples to the downstream
/// Graphite sink. Absorbed inside [`crate::sink::GraphiteSink::flush`]; never
/// propagated to the aggregator.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("write attempts exhausted ({attempts} tried)")]
    AttemptsExhausted { attempts: u32 },
}
