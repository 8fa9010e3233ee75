use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use statsite_core::{parse_batch, AggregatorHandle, Shutdown};

const MAX_LINE: usize = 4096;

/// Accepts connections and reads newline-delimited lines up to `MAX_LINE`
/// bytes; an oversize line is discarded and the connection survives.
pub async fn serve(listener: TcpListener, handle: AggregatorHandle, mut shutdown: Shutdown) {
    info!(addr = ?listener.local_addr().ok(), "tcp ingest listening");

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                debug!("tcp ingest shutting down");
                return;
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(err) => {
                        warn!(error = %err, "tcp accept failed");
                        continue;
                    }
                };
                let handle = handle.clone();
                let mut conn_shutdown = shutdown.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = conn_shutdown.recv() => {}
                        _ = serve_connection(stream, &handle) => {}
                    }
                    debug!(%peer, "tcp ingest connection closed");
                });
            }
        }
    }
}

async fn serve_connection(stream: TcpStream, handle: &AggregatorHandle) {
    let mut reader = BufReader::new(stream);
    loop {
        match read_bounded_line(&mut reader).await {
            Ok(Some(line)) => {
                for sample in parse_batch(&line) {
                    handle.add(sample);
                }
            }
            Ok(None) => return,
            Err(err) => {
                warn!(error = %err, "tcp read failed");
                return;
            }
        }
    }
}

/// Reads one `\n`-terminated line, capping how many bytes are held in
/// memory at `MAX_LINE` regardless of how long the unterminated line on
/// the wire actually is — the cap is enforced against the reader's own
/// fill buffer as bytes arrive, not against the finished line, so a
/// client that never sends a `\n` can't grow this past the limit.
///
/// A line whose `\n` arrives after the cap is dropped (returned as an
/// empty string, which `parse_batch` treats as a blank line) but the
/// stream is resynced to the following line rather than closing the
/// connection. Invalid UTF-8 is replaced rather than torn down, the
/// same "never abort on bad input" stance the grammar rejection path
/// takes for malformed lines.
async fn read_bounded_line(reader: &mut BufReader<TcpStream>) -> std::io::Result<Option<String>> {
    let mut line = Vec::new();
    let mut seen = 0usize;
    let mut oversize = false;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(finish_line(line, seen, oversize, false));
        }

        if let Some(pos) = available.iter().position(|&b| b == b'\n') {
            seen += pos;
            if !oversize && seen <= MAX_LINE {
                line.extend_from_slice(&available[..pos]);
            } else {
                oversize = true;
            }
            reader.consume(pos + 1);
            return Ok(finish_line(line, seen, oversize, true));
        }

        let n = available.len();
        seen += n;
        if !oversize && seen <= MAX_LINE {
            line.extend_from_slice(available);
        } else {
            oversize = true;
            line.clear();
        }
        reader.consume(n);
    }
}

/// `terminated` distinguishes a line that ended on its own `\n` from the
/// final, unterminated chunk handed back at EOF.
fn finish_line(line: Vec<u8>, seen: usize, oversize: bool, terminated: bool) -> Option<String> {
    if oversize {
        warn!(len = seen, "dropping oversize tcp line");
        return Some(String::new());
    }
    if line.is_empty() && !terminated {
        return None;
    }
    Some(String::from_utf8_lossy(&line).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpStream;

    #[tokio::test(start_paused = true)]
    async fn parses_newline_delimited_lines_across_reads() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let sink = Arc::new(statsite_core::GraphiteSink::new_for_test());
        let clock = Arc::new(statsite_core::SystemClock);
        let (shutdown_handle, shutdown) = statsite_core::shutdown_channel();
        let (handle, tick, fold_worker) =
            statsite_core::spawn(Duration::from_secs(10), 90, Arc::clone(&sink), clock, shutdown.clone());

        let ingest = tokio::spawn(serve(listener, handle, shutdown));

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(b"a:1|c\n").await.unwrap();
        client.write_all(b"b:2|c\n").await.unwrap();

        tokio::time::advance(Duration::from_millis(1)).await;
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(1)).await;
        tokio::task::yield_now().await;

        let flushed = sink.recorded_for_test();
        assert!(flushed.iter().any(|t| t.name == "counts.a"));
        assert!(flushed.iter().any(|t| t.name == "counts.b"));

        shutdown_handle.trigger();
        ingest.abort();
        tick.abort();
        fold_worker.abort();
    }
}
