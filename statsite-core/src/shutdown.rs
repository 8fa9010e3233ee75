use tokio::sync::watch;

/// A single shutdown signal shared by the aggregator's tick loop and every
/// ingest endpoint. Mirrors a shared shutdown flag, built on a watch channel
/// so a `select!` arm can wait on it instead of polling.
#[derive(Clone)]
pub struct Shutdown(watch::Receiver<bool>);

impl Shutdown {
    /// Resolves once `trigger` is called. A no-op future if already
    /// triggered, so a `select!` loop can hold onto one `Shutdown` across
    /// iterations without re-firing on every poll.
    pub async fn recv(&mut self) {
        if *self.0.borrow() {
            return;
        }
        let _ = self.0.changed().await;
    }

    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }
}

#[derive(Clone)]
pub struct ShutdownHandle(watch::Sender<bool>);

impl ShutdownHandle {
    pub fn trigger(&self) {
        let _ = self.0.send(true);
    }
}

pub fn channel() -> (ShutdownHandle, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle(tx), Shutdown(rx))
}
