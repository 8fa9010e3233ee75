use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// FatalError: the only failure class that reaches the process entry point.
/// Everything else (parse, ingest, sink, fold) is absorbed inside
/// `statsite-core` and only surfaces as a log line.
#[derive(Debug, Error)]
pub enum StatsiteError {
    #[error("failed to parse config file {path}: {source}")]
    ConfigParse { path: PathBuf, source: toml::de::Error },
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },
}
