//! Byte link plumbing shared by both nodes.
//!
//! The link is any duplex byte stream. Reads run on a background task that
//! forwards chunks to the node loop; writes happen inline, one action at a
//! time, so bytes leave in exactly the order the machine emitted them.

use std::io;

use bytes::{Bytes, BytesMut};
use doorlock_core::exchange::Outbound;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    sync::mpsc,
    task::JoinHandle,
};

use crate::NodeError;

const READ_CHUNK: usize = 64;
const INBOUND_DEPTH: usize = 64;

/// Receiving half: chunks of bytes in arrival order, `None` at end of stream.
pub struct Inbound {
    rx: mpsc::Receiver<Bytes>,
    task: JoinHandle<()>,
}

impl Inbound {
    /// Next received chunk. Cancel safe.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }
}

impl Drop for Inbound {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start forwarding everything read from `reader`.
pub fn spawn_reader<R>(mut reader: R) -> Inbound
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let (tx, rx) = mpsc::channel(INBOUND_DEPTH);
    let task = tokio::spawn(async move {
        let mut buf = BytesMut::with_capacity(READ_CHUNK);
        loop {
            buf.reserve(READ_CHUNK);
            match reader.read_buf(&mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(buf.split().freeze()).await.is_err() {
                        break;
                    }
                },
                Err(error) => {
                    tracing::warn!(%error, "link read failed");
                    break;
                },
            }
        }
    });
    Inbound { rx, task }
}

/// Write one outbound unit and flush it.
pub async fn send<W>(writer: &mut W, outbound: &Outbound) -> Result<(), NodeError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = outbound.to_bytes();
    tracing::trace!(len = bytes.len(), "link send");
    let result = async {
        writer.write_all(&bytes).await?;
        writer.flush().await
    }
    .await;

    result.map_err(|error| match error.kind() {
        io::ErrorKind::BrokenPipe
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::UnexpectedEof => NodeError::LinkClosed,
        _ => NodeError::Io(error),
    })
}
