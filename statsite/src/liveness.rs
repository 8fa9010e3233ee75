use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, warn};

use statsite_core::Shutdown;

/// Answers any bytes from any client with the literal `YES`. Stateless, no
/// authentication, off by default.
pub async fn serve(listener: TcpListener, mut shutdown: Shutdown) {
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                debug!("liveness responder shutting down");
                return;
            }
            accepted = listener.accept() => {
                let (mut stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(err) => {
                        warn!(error = %err, "liveness accept failed");
                        continue;
                    }
                };
                tokio::spawn(async move {
                    let mut probe = [0u8; 1];
                    if stream.read(&mut probe).await.unwrap_or(0) == 0 {
                        return;
                    }
                    if let Err(err) = stream.write_all(b"YES").await {
                        debug!(%peer, error = %err, "liveness write failed");
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn answers_yes_to_any_probe() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (_handle, shutdown) = statsite_core::shutdown_channel();
        tokio::spawn(serve(listener, shutdown));

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(b"ping").await.unwrap();

        let mut buf = [0u8; 3];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"YES");
    }
}
