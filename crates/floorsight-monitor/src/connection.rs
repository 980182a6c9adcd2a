use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::config::ReconnectConfig;

/// Reconnection delay schedule: doubles per consecutive failed cycle,
/// capped, reset by a successful open.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    initial: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            current: initial,
            initial,
            max,
        }
    }

    pub fn from_config(config: &ReconnectConfig) -> Self {
        Self::new(
            Duration::from_millis(config.initial_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// The delay to sleep before the next attempt. Doubles the delay for the
    /// attempt after, up to the cap.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Owns the one streaming socket and its reconnect loop.
///
/// Text frames are forwarded in transport order on an unbounded channel; the
/// connected flag flips synchronously with every open/close/error. The
/// socket is receive-only. `dispose()` (or drop) cancels any pending
/// reconnect sleep and closes the socket; nothing is forwarded and no flag
/// is mutated afterward.
pub struct ConnectionManager {
    token: CancellationToken,
}

impl ConnectionManager {
    /// Connect to `url`, retrying forever. Returns the manager plus the
    /// frame stream and the connected observable.
    pub fn open(
        url: String,
        backoff: Backoff,
    ) -> (Self, mpsc::UnboundedReceiver<String>, watch::Receiver<bool>) {
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let (connected_tx, connected_rx) = watch::channel(false);
        let token = CancellationToken::new();
        tokio::spawn(run(url, backoff, frame_tx, connected_tx, token.clone()));
        (Self { token }, frame_rx, connected_rx)
    }

    /// Idempotent teardown.
    pub fn dispose(&self) {
        self.token.cancel();
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run(
    url: String,
    mut backoff: Backoff,
    frame_tx: mpsc::UnboundedSender<String>,
    connected_tx: watch::Sender<bool>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            attempt = connect_async(url.as_str()) => match attempt {
                Ok((mut stream, _)) => {
                    tracing::info!(%url, "Live stream connected");
                    let _ = connected_tx.send(true);
                    backoff.reset();
                    loop {
                        tokio::select! {
                            _ = token.cancelled() => {
                                // Disposed: close without touching the flag again.
                                let _ = stream.close(None).await;
                                return;
                            },
                            msg = stream.next() => match msg {
                                Some(Ok(Message::Text(text))) => {
                                    let _ = frame_tx.send(text.to_string());
                                },
                                Some(Ok(Message::Close(_))) | None => break,
                                Some(Ok(_)) => {},
                                Some(Err(e)) => {
                                    tracing::warn!(error = %e, "Live stream error");
                                    break;
                                },
                            },
                        }
                    }
                    let _ = connected_tx.send(false);
                },
                Err(e) => {
                    tracing::warn!(%url, error = %e, "Live stream connect failed");
                    let _ = connected_tx.send(false);
                },
            },
        }

        let delay = backoff.next_delay();
        tracing::info!(delay_ms = delay.as_millis() as u64, "Scheduling reconnect");
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(delay) => {},
        }
    }
}
