use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::SinkExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use floorsight_monitor::connection::Backoff;

/// Short backoff so reconnect tests stay fast.
pub fn test_backoff() -> Backoff {
    Backoff::new(Duration::from_millis(50), Duration::from_millis(200))
}

/// In-process streaming endpoint. Frames pushed via `push` go to every
/// currently-open connection; `kill_connections` drops them all while the
/// listener stays up, so clients can reconnect.
pub struct TestStreamServer {
    addr: SocketAddr,
    frame_tx: broadcast::Sender<String>,
    connections: Arc<AtomicUsize>,
    generation: Arc<Mutex<CancellationToken>>,
}

impl TestStreamServer {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (frame_tx, _) = broadcast::channel::<String>(64);
        let connections = Arc::new(AtomicUsize::new(0));
        let generation = Arc::new(Mutex::new(CancellationToken::new()));

        let tx = frame_tx.clone();
        let conns = Arc::clone(&connections);
        let generations = Arc::clone(&generation);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let Ok(mut ws) = accept_async(stream).await else {
                    continue;
                };
                conns.fetch_add(1, Ordering::SeqCst);
                let mut rx = tx.subscribe();
                let kill = generations.lock().unwrap().clone();
                tokio::spawn(async move {
                    loop {
                        tokio::select! {
                            _ = kill.cancelled() => {
                                let _ = ws.close(None).await;
                                break;
                            },
                            frame = rx.recv() => match frame {
                                Ok(text) => {
                                    if ws.send(Message::Text(text.into())).await.is_err() {
                                        break;
                                    }
                                },
                                Err(_) => break,
                            },
                        }
                    }
                });
            }
        });

        Self {
            addr,
            frame_tx,
            connections,
            generation,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}/ws/live", self.addr)
    }

    pub fn push(&self, frame: &str) {
        let _ = self.frame_tx.send(frame.to_string());
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Drop every open connection. The listener keeps accepting, so the
    /// client's reconnect will land on a fresh connection.
    pub fn kill_connections(&self) {
        let mut generation = self.generation.lock().unwrap();
        generation.cancel();
        *generation = CancellationToken::new();
    }
}

/// Minimal HTTP responder for the REST endpoints. Each request pops the next
/// `(status, body)` pair; the last pair repeats once the queue drains.
pub async fn spawn_api_server(responses: Vec<(&'static str, String)>) -> SocketAddr {
    assert!(!responses.is_empty());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let queue = Arc::new(Mutex::new(responses));
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let (status, body) = {
                let mut queue = queue.lock().unwrap();
                if queue.len() > 1 {
                    queue.remove(0)
                } else {
                    queue[0].clone()
                }
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    addr
}

/// Poll `cond` every 10 ms until it holds, panicking after `timeout_ms`.
pub async fn wait_for<F: FnMut() -> bool>(mut cond: F, timeout_ms: u64, what: &str) {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    while !cond() {
        if tokio::time::Instant::now() >= deadline {
            panic!("Timed out waiting for: {what}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
