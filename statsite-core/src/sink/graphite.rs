#[cfg(any(test, feature = "test-util"))]
use std::sync::atomic::Ordering;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::error::SinkError;
use crate::metrics::Triple;

/// Forwards folded triples to a downstream Graphite-plaintext carbon line
/// receiver over a persistent TCP connection.
///
/// The connection is held across flushes and reopened lazily on first use
/// or after a write failure; a flush that still fails after exhausting its
/// retry budget is logged and dropped rather than propagated, per
/// [`SinkError`]'s contract.
pub struct GraphiteSink {
    addr: String,
    prefix: String,
    max_attempts: u32,
    conn: Mutex<Option<TcpStream>>,
    #[cfg(any(test, feature = "test-util"))]
    recorded: Mutex<Vec<Triple>>,
    #[cfg(any(test, feature = "test-util"))]
    test_mode: AtomicBoolCell,
}

#[cfg(any(test, feature = "test-util"))]
type AtomicBoolCell = std::sync::atomic::AtomicBool;

impl GraphiteSink {
    pub fn new(host: impl Into<String>, port: u16, prefix: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            addr: format!("{}:{port}", host.into()),
            prefix: prefix.into(),
            max_attempts: max_attempts.max(1),
            conn: Mutex::new(None),
            #[cfg(any(test, feature = "test-util"))]
            recorded: Mutex::new(Vec::new()),
            #[cfg(any(test, feature = "test-util"))]
            test_mode: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Builds a sink that records flushed triples in memory instead of
    /// opening a connection. For tests only — requires the `test-util`
    /// feature outside this crate.
    #[cfg(any(test, feature = "test-util"))]
    pub fn new_for_test() -> Self {
        let sink = Self::new("127.0.0.1", 0, "stats.", 3);
        sink.test_mode.store(true, Ordering::SeqCst);
        sink
    }

    #[cfg(any(test, feature = "test-util"))]
    pub fn recorded_for_test(&self) -> Vec<Triple> {
        self.recorded.try_lock().map(|g| g.clone()).unwrap_or_default()
    }

    fn line(&self, triple: &Triple) -> String {
        format!("{}{} {} {}\n", self.prefix, triple.name, triple.value, triple.timestamp)
    }

    /// Sends every triple in `triples` as one carbon line each, in order.
    /// A no-op — no connection attempt, no log line — if `triples` is empty.
    pub async fn flush(&self, triples: &[Triple]) {
        if triples.is_empty() {
            return;
        }

        #[cfg(any(test, feature = "test-util"))]
        if self.test_mode.load(Ordering::SeqCst) {
            self.recorded.lock().await.extend_from_slice(triples);
            return;
        }

        if let Err(err) = self.flush_inner(triples).await {
            error!(error = %err, attempts = self.max_attempts, "abandoning flush after exhausting retries");
        }
    }

    async fn flush_inner(&self, triples: &[Triple]) -> Result<(), SinkError> {
        let payload: String = triples.iter().map(|t| self.line(t)).collect();
        let mut last_err = None;

        for attempt in 1..=self.max_attempts {
            match self.write_payload(&payload).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!(attempt, error = %err, addr = %self.addr, "flush attempt failed, reconnecting");
                    last_err = Some(err);
                    *self.conn.lock().await = None;
                }
            }
        }

        Err(last_err.unwrap_or(SinkError::AttemptsExhausted {
            attempts: self.max_attempts,
        }))
    }

    async fn write_payload(&self, payload: &str) -> Result<(), SinkError> {
        let mut guard = self.conn.lock().await;
        if guard.is_none() {
            debug!(addr = %self.addr, "opening graphite connection");
            *guard = Some(TcpStream::connect(&self.addr).await?);
        }
        let stream = guard.as_mut().expect("just populated");
        stream.write_all(payload.as_bytes()).await?;
        stream.flush().await?;
        Ok(())
    }
}
