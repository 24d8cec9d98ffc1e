//! UDP datagram to HTTP body relay.
//!
//! Each datagram the worker sends becomes exactly one body chunk, unchanged.
//! The datagram protocol has no end-of-stream marker, so the relay runs until
//! the body is dropped (client gone or write error), the socket fails, or the
//! server shuts down. The worker is interrupted in every one of those cases
//! because the relay owns its [`WorkerGuard`].

use std::io;
use std::net::SocketAddr;

use bytes::Bytes;
use futures::Stream;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::sessions::SessionTicket;
use crate::worker::WorkerGuard;

/// Largest possible UDP payload.
const MAX_DATAGRAM_SIZE: usize = 65_536;

/// A bound UDP listener paired with the worker feeding it.
pub struct DatagramRelay {
    socket: UdpSocket,
    worker: WorkerGuard,
    shutdown: CancellationToken,
    buf: Vec<u8>,
    session: Option<SessionTicket>,
    label: String,
}

impl DatagramRelay {
    pub fn new(socket: UdpSocket, worker: WorkerGuard, shutdown: CancellationToken) -> Self {
        let label = worker.command().to_string();
        Self {
            socket,
            worker,
            shutdown,
            buf: vec![0u8; MAX_DATAGRAM_SIZE],
            session: None,
            label,
        }
    }

    /// Keep `session` registered for as long as the relay lives.
    pub fn with_session(mut self, session: SessionTicket) -> Self {
        self.session = Some(session);
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.id())
    }

    /// Receive the next datagram. `Ok(None)` means the server is shutting down.
    async fn recv(&mut self) -> io::Result<Option<Bytes>> {
        tokio::select! {
            _ = self.shutdown.cancelled() => Ok(None),
            result = self.socket.recv_from(&mut self.buf) => {
                let (len, _remote) = result?;
                Ok(Some(Bytes::copy_from_slice(&self.buf[..len])))
            }
        }
    }

    /// Turn the relay into an HTTP body stream.
    ///
    /// A receive error is yielded once, after the worker has been
    /// interrupted, and ends the stream.
    pub fn into_stream(self) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
        futures::stream::unfold(Some(self), |state| async move {
            let mut relay = state?;
            match relay.recv().await {
                Ok(Some(chunk)) => Some((Ok(chunk), Some(relay))),
                Ok(None) => {
                    info!("Stream stopped by shutdown: {}", relay.label);
                    None
                }
                Err(e) => {
                    debug!("Stream loop excepted: {:?}", e);
                    relay.worker.terminate();
                    Some((Err(e), None))
                }
            }
        })
    }
}

impl Drop for DatagramRelay {
    fn drop(&mut self) {
        info!("Stream loop ended: {}", self.label);
    }
}
