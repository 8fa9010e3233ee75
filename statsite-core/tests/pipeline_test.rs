use std::sync::Arc;
use std::time::Duration;

use statsite_core::{parse_batch, shutdown_channel, GraphiteSink, SystemClock};

/// A producer sends samples while ticks fire on a short interval; every
/// sample must appear exactly once across the union of folded outputs,
/// never duplicated and never lost across a buffer swap.
#[tokio::test(start_paused = true)]
async fn buffer_swap_is_lossless_under_fast_ticks() {
    let sink = Arc::new(GraphiteSink::new_for_test());
    let clock = Arc::new(SystemClock);
    let (shutdown_handle, shutdown) = shutdown_channel();
    let (handle, tick, fold_worker) = statsite_core::spawn(
        Duration::from_millis(10),
        90,
        Arc::clone(&sink),
        clock,
        shutdown,
    );

    const BATCHES: usize = 50;
    for _ in 0..BATCHES {
        for sample in parse_batch("requests:1|c") {
            handle.add(sample);
        }
        tokio::time::advance(Duration::from_millis(3)).await;
        tokio::task::yield_now().await;
    }
    tokio::time::advance(Duration::from_millis(50)).await;
    tokio::task::yield_now().await;

    shutdown_handle.trigger();
    tick.abort();
    fold_worker.abort();

    let flushed = sink.recorded_for_test();
    let total: f64 = flushed
        .iter()
        .filter(|t| t.name == "counts.requests")
        .map(|t| t.value.as_f64())
        .sum();
    assert_eq!(total, BATCHES as f64);
}

/// An idle window folds to nothing, and the sink must not be touched at
/// all — no connection attempt, no recorded triples.
#[tokio::test(start_paused = true)]
async fn idle_window_never_reaches_the_sink() {
    let sink = Arc::new(GraphiteSink::new_for_test());
    let clock = Arc::new(SystemClock);
    let (shutdown_handle, shutdown) = shutdown_channel();
    let (_handle, tick, fold_worker) = statsite_core::spawn(
        Duration::from_millis(10),
        90,
        Arc::clone(&sink),
        clock,
        shutdown,
    );

    tokio::time::advance(Duration::from_millis(30)).await;
    tokio::task::yield_now().await;

    shutdown_handle.trigger();
    tick.abort();
    fold_worker.abort();

    assert!(sink.recorded_for_test().is_empty());
}
