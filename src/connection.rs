use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{ConnectError, LinkError};
use crate::reader::ReaderHandle;

/// Open a TCP stream to `addr`, giving up after `connect_timeout`.
///
/// On timeout the in-flight connect future is dropped, which closes the
/// half-open socket.
pub(crate) async fn open(addr: &str, connect_timeout: Duration) -> Result<TcpStream, ConnectError> {
    match timeout(connect_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => {
            if let Err(e) = stream.set_nodelay(true) {
                debug!(error = %e, "Could not set TCP_NODELAY");
            }
            Ok(stream)
        }
        Ok(Err(e)) => Err(ConnectError::from_io(e, addr)),
        Err(_) => Err(ConnectError::Timeout(connect_timeout)),
    }
}

/// A live connection: one socket and the single reader bound to it.
#[derive(Debug)]
pub struct ActiveConnection {
    id: u64,
    peer_addr: Option<SocketAddr>,
    reader: ReaderHandle,
}

impl ActiveConnection {
    pub(crate) fn new(id: u64, peer_addr: Option<SocketAddr>, reader: ReaderHandle) -> Self {
        Self {
            id,
            peer_addr,
            reader,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// False once the reader task has exited, whatever the reason.
    pub fn is_reading(&self) -> bool {
        self.reader.is_running()
    }

    pub(crate) fn signal_stop(&self) {
        self.reader.signal_stop();
    }

    pub(crate) async fn close(self) -> Result<(), LinkError> {
        self.reader.stop().await
    }
}
