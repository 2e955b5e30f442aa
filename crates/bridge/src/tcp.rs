//! Line-framed TCP transport for viewer sessions
//!
//! One message per line, UTF-8, newline terminated. The subscription
//! comes in as one line; delta batches go out the same way.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use tagbridge_push::{PushError, Transport};

pub struct LineTransport {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl LineTransport {
    pub fn new(stream: TcpStream) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        }
    }
}

#[async_trait]
impl Transport for LineTransport {
    async fn receive(&mut self) -> tagbridge_push::Result<Option<String>> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    async fn send(&mut self, message: &str) -> tagbridge_push::Result<()> {
        self.writer
            .write_all(message.as_bytes())
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;
        self.writer
            .flush()
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn close(&mut self) -> tagbridge_push::Result<()> {
        self.writer
            .shutdown()
            .await
            .map_err(|e| PushError::Transport(e.to_string()))
    }
}
