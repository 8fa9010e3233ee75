use std::net::SocketAddr;

use socket2::{Domain, Socket, Type};
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use statsite_core::{parse_batch, AggregatorHandle, Shutdown};

const MAX_DATAGRAM: usize = 32 * 1024;
const RECV_BUFFER_STEPS: [usize; 4] = [4 * 1024 * 1024, 2 * 1024 * 1024, 1024 * 1024, 512 * 1024];

/// Binds a UDP socket at `addr`, raising its receive buffer toward 4 MiB and
/// stepping down through 2 MiB, 1 MiB, 512 KiB until the kernel accepts one.
pub fn bind(addr: SocketAddr) -> std::io::Result<UdpSocket> {
    let domain = if addr.is_ipv6() { Domain::IPV6 } else { Domain::IPV4 };
    let socket = Socket::new(domain, Type::DGRAM, None)?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.set_nonblocking(true)?;

    for size in RECV_BUFFER_STEPS {
        match socket.set_recv_buffer_size(size) {
            Ok(()) => {
                debug!(bytes = size, "udp receive buffer accepted");
                break;
            }
            Err(err) => warn!(bytes = size, error = %err, "udp receive buffer size rejected, stepping down"),
        }
    }

    UdpSocket::from_std(socket.into())
}

/// Reads datagrams until `shutdown` fires, parsing each payload and
/// forwarding every resulting sample to `handle`.
pub async fn serve(socket: UdpSocket, handle: AggregatorHandle, mut shutdown: Shutdown) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    info!(addr = ?socket.local_addr().ok(), "udp ingest listening");

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                debug!("udp ingest shutting down");
                return;
            }
            received = socket.recv_from(&mut buf) => {
                let (n, peer) = match received {
                    Ok(pair) => pair,
                    Err(err) => {
                        warn!(error = %err, "udp read failed, continuing");
                        continue;
                    }
                };
                let payload = String::from_utf8_lossy(&buf[..n]);
                for sample in parse_batch(&payload) {
                    handle.add(sample);
                }
                let _ = peer;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::UdpSocket as ClientSocket;

    #[tokio::test(start_paused = true)]
    async fn parses_and_forwards_every_valid_line_in_one_datagram() {
        let socket = bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = socket.local_addr().unwrap();

        let sink = Arc::new(statsite_core::GraphiteSink::new_for_test());
        let clock = Arc::new(statsite_core::SystemClock);
        let (shutdown_handle, shutdown) = statsite_core::shutdown_channel();
        let (handle, tick, fold_worker) =
            statsite_core::spawn(Duration::from_secs(10), 90, Arc::clone(&sink), clock, shutdown.clone());

        let ingest = tokio::spawn(serve(socket, handle, shutdown));

        let client = ClientSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(b"a:1|c\njunk:1|zz\nb:2|c", addr).await.unwrap();
        tokio::time::advance(Duration::from_millis(1)).await;
        tokio::task::yield_now().await;

        tokio::time::advance(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(1)).await;
        tokio::task::yield_now().await;

        let flushed = sink.recorded_for_test();
        assert!(flushed.iter().any(|t| t.name == "counts.a"));
        assert!(flushed.iter().any(|t| t.name == "counts.b"));
        assert!(!flushed.iter().any(|t| t.name.contains("junk")));

        shutdown_handle.trigger();
        ingest.abort();
        tick.abort();
        fold_worker.abort();
    }
}
