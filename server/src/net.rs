use game_core::table::{Table, FRAME_BYTES, PROTOCOL_VERSION};
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("seat {seat} answered the handshake with protocol {version}, expected {PROTOCOL_VERSION}")]
    ProtocolMismatch { seat: usize, version: i32 },
}

/// One connected client. Frames are fixed 480-byte tables with no length
/// prefix; a partial frame survives a cancelled read in `rx`.
pub struct Endpoint {
    stream: TcpStream,
    rx: Vec<u8>,
    pub seat: usize,
    pub name: String,
}

impl Endpoint {
    /// Server side of the handshake: greet with the protocol version and the
    /// assigned seat, then read the client's profile back. A version other
    /// than 20070 fails the session.
    pub async fn handshake(mut stream: TcpStream, seat: usize) -> Result<Endpoint, NetError> {
        stream.write_all(&Table::greeting(seat).to_bytes()).await?;

        let mut endpoint = Endpoint {
            stream,
            rx: Vec::new(),
            seat,
            name: String::new(),
        };
        let profile = endpoint.recv().await?;
        let version = profile.profile_version();
        if version != PROTOCOL_VERSION {
            return Err(NetError::ProtocolMismatch { seat, version });
        }
        endpoint.name = profile
            .profile_name()
            .unwrap_or_else(|| format!("player{seat}"));
        Ok(endpoint)
    }

    pub async fn send(&mut self, table: &Table) -> Result<(), NetError> {
        self.stream.write_all(&table.to_bytes()).await?;
        Ok(())
    }

    pub async fn recv(&mut self) -> Result<Table, NetError> {
        let mut chunk = [0u8; FRAME_BYTES];
        while self.rx.len() < FRAME_BYTES {
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(NetError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed mid-frame",
                )));
            }
            self.rx.extend_from_slice(&chunk[..n]);
        }
        let mut frame = [0u8; FRAME_BYTES];
        frame.copy_from_slice(&self.rx[..FRAME_BYTES]);
        self.rx.drain(..FRAME_BYTES);
        Ok(Table::from_bytes(&frame))
    }

    /// `None` when the deadline elapses; the coordinator treats that as a
    /// pass. A frame that arrives after the deadline stays buffered and is
    /// read as the seat's next response.
    pub async fn recv_deadline(&mut self, deadline: Duration) -> Result<Option<Table>, NetError> {
        match tokio::time::timeout(deadline, self.recv()).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }
}
