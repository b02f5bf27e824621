use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, instrument, trace, warn};

// Wire protocol constants
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024; // 64KB, control messages only
pub const LENGTH_PREFIX_SIZE: usize = 4; // 4 bytes for u32 length prefix
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for wire protocol operations including timeouts and message size limits
#[derive(Debug, Clone)]
pub struct WireConfig {
    pub max_message_size: usize,
    /// Longest a connection may stay silent before it is dropped
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

impl WireConfig {
    /// Create a new WireConfig with custom parameters
    pub fn new(max_message_size: usize, read_timeout: Duration, write_timeout: Duration) -> Self {
        Self {
            max_message_size,
            read_timeout,
            write_timeout,
        }
    }

    /// Create a WireConfig with custom message size and default timeouts
    pub fn with_max_message_size(max_message_size: usize) -> Self {
        Self {
            max_message_size,
            ..Self::default()
        }
    }
}

/// Custom error types for wire protocol operations
#[derive(Error, Debug)]
pub enum WireProtocolError {
    #[error("Message too large: {size} bytes exceeds maximum of {max_size} bytes")]
    MessageTooLarge { size: usize, max_size: usize },

    #[error("Invalid length prefix: {length}")]
    InvalidLength { length: u32 },

    #[error("Read operation timed out after {timeout:?}")]
    ReadTimeout { timeout: Duration },

    #[error("Write operation timed out after {timeout:?}")]
    WriteTimeout { timeout: Duration },

    #[error("Corrupted data: {reason}")]
    CorruptedData { reason: String },

    #[error("Unexpected end of file while reading {operation}")]
    UnexpectedEof { operation: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WireProtocolError {
    /// Whether the connection can keep going after this error.
    ///
    /// A frame whose body is not JSON was still fully consumed, so the stream is
    /// still aligned on a frame boundary.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, WireProtocolError::CorruptedData { .. })
    }
}

/// Length-prefixed JSON framing: a 4-byte big-endian body length, then the body
#[derive(Debug, Clone, Default)]
pub struct FramedMessage {
    wire_config: WireConfig,
}

impl FramedMessage {
    /// Create a new FramedMessage with custom wire protocol configuration
    pub fn new(wire_config: WireConfig) -> Self {
        Self { wire_config }
    }

    /// Get the current wire protocol configuration
    pub fn wire_config(&self) -> &WireConfig {
        &self.wire_config
    }

    /// Validate a length prefix before allocating for it
    #[instrument(level = "trace", skip(self))]
    fn validate_length(&self, length: u32) -> Result<usize, WireProtocolError> {
        if length == 0 {
            warn!("Received zero-length message prefix");
            return Err(WireProtocolError::InvalidLength { length });
        }

        let size = length as usize;
        if size > self.wire_config.max_message_size {
            error!(
                size = size,
                max_size = self.wire_config.max_message_size,
                "Message size exceeds maximum allowed size"
            );
            return Err(WireProtocolError::MessageTooLarge {
                size,
                max_size: self.wire_config.max_message_size,
            });
        }

        Ok(size)
    }

    /// Serialize and write one message, flushing the writer
    #[instrument(level = "debug", skip(self, writer, message))]
    pub async fn write_message<T: Serialize>(
        &self,
        writer: &mut (impl AsyncWrite + Unpin),
        message: &T,
    ) -> Result<(), WireProtocolError> {
        let body = serde_json::to_vec(message)?;
        if body.len() > self.wire_config.max_message_size {
            return Err(WireProtocolError::MessageTooLarge {
                size: body.len(),
                max_size: self.wire_config.max_message_size,
            });
        }

        let length = body.len() as u32;
        writer.write_all(&length.to_be_bytes()).await?;
        writer.write_all(&body).await?;
        writer.flush().await?;

        trace!("Wrote {} byte frame", body.len());
        Ok(())
    }

    /// Read one frame and parse its body as JSON.
    ///
    /// Returns `Ok(None)` when the peer closes the stream cleanly between frames.
    #[instrument(level = "debug", skip(self, reader))]
    pub async fn read_message(
        &self,
        reader: &mut (impl AsyncRead + Unpin),
    ) -> Result<Option<Value>, WireProtocolError> {
        let mut length_buffer = [0u8; LENGTH_PREFIX_SIZE];
        let mut filled = 0;
        while filled < LENGTH_PREFIX_SIZE {
            let n = reader.read(&mut length_buffer[filled..]).await?;
            if n == 0 {
                if filled == 0 {
                    debug!("Peer closed connection");
                    return Ok(None);
                }
                return Err(WireProtocolError::UnexpectedEof {
                    operation: "length prefix".to_string(),
                });
            }
            filled += n;
        }

        let length = self.validate_length(u32::from_be_bytes(length_buffer))?;

        let mut body = vec![0u8; length];
        reader.read_exact(&mut body).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                WireProtocolError::UnexpectedEof {
                    operation: format!("{length} byte message body"),
                }
            } else {
                WireProtocolError::Io(e)
            }
        })?;

        let value = serde_json::from_slice(&body).map_err(|e| {
            warn!(error = %e, "Frame body is not valid JSON");
            WireProtocolError::CorruptedData {
                reason: format!("frame body is not JSON: {e}"),
            }
        })?;

        Ok(Some(value))
    }

    /// Read a message using the configured read timeout
    pub async fn read_message_with_timeout(
        &self,
        reader: &mut (impl AsyncRead + Unpin),
    ) -> Result<Option<Value>, WireProtocolError> {
        let timeout = self.wire_config.read_timeout;
        tokio::time::timeout(timeout, self.read_message(reader))
            .await
            .map_err(|_elapsed| WireProtocolError::ReadTimeout { timeout })?
    }

    /// Write a message using the configured write timeout
    pub async fn write_message_with_timeout<T: Serialize>(
        &self,
        writer: &mut (impl AsyncWrite + Unpin),
        message: &T,
    ) -> Result<(), WireProtocolError> {
        let timeout = self.wire_config.write_timeout;
        tokio::time::timeout(timeout, self.write_message(writer, message))
            .await
            .map_err(|_elapsed| WireProtocolError::WriteTimeout { timeout })?
    }
}
