//! Owns the active buffer, swaps it out on every tick, and hands the frozen
//! half to a dedicated fold worker so a slow fold never stalls ingest.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::buffer::Buffer;
use crate::clock::Clock;
use crate::fold;
use crate::sample::Sample;
use crate::shutdown::Shutdown;
use crate::sink::GraphiteSink;

/// A single-slot mailbox between the tick loop and the fold worker.
///
/// Holding more than one frozen buffer would mean the worker is falling
/// behind the tick interval; rather than queue unboundedly, a late buffer
/// is abandoned in favor of the newer one, and the running fold (if any) is
/// left alone to finish.
struct FoldQueue {
    slot: Mutex<Option<Buffer>>,
    notify: Notify,
}

impl FoldQueue {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            notify: Notify::new(),
        }
    }

    fn submit(&self, buffer: Buffer) {
        let replaced = self.slot.lock().replace(buffer).is_some();
        if replaced {
            warn!("fold queue already held a pending buffer; abandoning it for the newer one");
        }
        self.notify.notify_one();
    }

    async fn take(&self) -> Buffer {
        loop {
            if let Some(buffer) = self.slot.lock().take() {
                return buffer;
            }
            self.notify.notified().await;
        }
    }
}

/// A cloneable front door for ingest tasks to hand off parsed samples.
#[derive(Clone)]
pub struct AggregatorHandle {
    tx: mpsc::UnboundedSender<Sample>,
}

impl AggregatorHandle {
    /// Queues `sample` onto the active buffer. Silently dropped if the
    /// aggregator has already shut down — ingest never blocks on, or fails
    /// because of, a draining aggregator.
    pub fn add(&self, sample: Sample) {
        let _ = self.tx.send(sample);
    }
}

/// Spawns the tick loop and its fold worker, wired to `sink` and `clock`.
///
/// Returns a handle ingest tasks use to submit samples, plus the two
/// background tasks' join handles so a caller can await a clean shutdown.
pub fn spawn(
    tick_interval: Duration,
    percentile: u32,
    sink: Arc<GraphiteSink>,
    clock: Arc<dyn Clock>,
    shutdown: Shutdown,
) -> (AggregatorHandle, JoinHandle<()>, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let queue = Arc::new(FoldQueue::new());

    let fold_worker = tokio::spawn(run_fold_worker(
        Arc::clone(&queue),
        sink,
        Arc::clone(&clock),
        percentile,
    ));
    let tick_loop = tokio::spawn(run_tick_loop(rx, queue, tick_interval, shutdown));

    (AggregatorHandle { tx }, tick_loop, fold_worker)
}

async fn run_tick_loop(
    mut rx: mpsc::UnboundedReceiver<Sample>,
    queue: Arc<FoldQueue>,
    tick_interval: Duration,
    mut shutdown: Shutdown,
) {
    let mut active = Buffer::new();
    let mut ticker = interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                debug!(dropped = active.len(), "aggregator shutting down, active buffer abandoned");
                return;
            }
            maybe_sample = rx.recv() => match maybe_sample {
                Some(sample) => active.push(sample),
                None => return,
            },
            _ = ticker.tick() => {
                let frozen = std::mem::take(&mut active);
                queue.submit(frozen);
            }
        }
    }
}

async fn run_fold_worker(
    queue: Arc<FoldQueue>,
    sink: Arc<GraphiteSink>,
    clock: Arc<dyn Clock>,
    percentile: u32,
) {
    loop {
        let buffer = queue.take().await;
        if buffer.is_empty() {
            continue;
        }
        let now = clock.now_seconds();
        let triples = fold::fold(buffer, now, percentile);
        sink.flush(&triples).await;
    }
}
