use crate::messages::wire::{FramedMessage, WireConfig, WireProtocolError};
use anyhow::{Context, Result};
use serde_json::Value;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// Minimal client speaking the framed JSON protocol, used by tooling and tests
pub struct Client {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
    framed: FramedMessage,
}

impl Client {
    pub async fn connect(addr: &str, wire_config: WireConfig) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("Failed to connect to {}", addr))?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader,
            writer,
            framed: FramedMessage::new(wire_config),
        })
    }

    pub async fn send(&mut self, message: &Value) -> Result<(), WireProtocolError> {
        self.framed
            .write_message_with_timeout(&mut self.writer, message)
            .await
    }

    /// Next server frame, or `None` once the server closes the connection
    pub async fn receive(&mut self) -> Result<Option<Value>, WireProtocolError> {
        self.framed.read_message_with_timeout(&mut self.reader).await
    }

    /// Receive frames until one of `kind` arrives, skipping others
    pub async fn receive_kind(&mut self, kind: &str) -> Result<Value> {
        loop {
            let frame = self
                .receive()
                .await?
                .with_context(|| format!("Connection closed while waiting for '{}'", kind))?;
            if frame["type"] == kind {
                return Ok(frame);
            }
        }
    }
}
