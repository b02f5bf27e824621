//! Per-connection lifecycle: a read loop feeding the dispatcher and a writer
//! task draining the connection's outbound channel.

use super::dispatch::Dispatcher;
use crate::hub::HubError;
use crate::messages::{FramedMessage, InboundMessage, OutboundMessage, WireProtocolError};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Drive one client stream until it closes, times out or breaks framing.
///
/// The connection is removed from the hub before this returns, whatever the
/// reason for closing.
#[instrument(skip(stream, dispatcher, framed), fields(connection = tracing::field::Empty))]
pub async fn serve_connection<S>(
    stream: S,
    dispatcher: Arc<Dispatcher>,
    framed: FramedMessage,
) -> Result<(), WireProtocolError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (mut reader, mut writer) = tokio::io::split(stream);
    let (tx, mut rx) = mpsc::unbounded_channel::<OutboundMessage>();

    let hub = Arc::clone(dispatcher.hub());
    let connection = hub.register(tx);
    tracing::Span::current().record("connection", connection);
    debug!("Connection registered with hub");

    let writer_framed = framed.clone();
    let writer_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = writer_framed
                .write_message_with_timeout(&mut writer, &message)
                .await
            {
                warn!(connection, error = %e, "Failed to write to client, closing writer");
                break;
            }
        }
    });

    let result = loop {
        match framed.read_message_with_timeout(&mut reader).await {
            Ok(Some(value)) => match InboundMessage::decode(&value) {
                Ok(message) => dispatcher.dispatch(connection, message),
                Err(e) => {
                    warn!(connection, code = e.code(), error = %e, "Rejected inbound message");
                    hub.send_to(connection, OutboundMessage::error(e.code(), e.to_string()));
                }
            },
            Ok(None) => {
                info!(connection, "Connection closed by peer");
                break Ok(());
            }
            Err(e) if e.is_recoverable() => {
                let rejection = HubError::Malformed(e.to_string());
                hub.send_to(
                    connection,
                    OutboundMessage::error(rejection.code(), rejection.to_string()),
                );
            }
            Err(WireProtocolError::ReadTimeout { timeout }) => {
                info!(connection, ?timeout, "Connection idle too long, closing");
                break Ok(());
            }
            Err(e) => {
                warn!(connection, error = %e, "Wire protocol failure, closing connection");
                break Err(e);
            }
        }
    };

    // Dropping the hub's sender lets the writer flush what is queued and stop
    hub.on_disconnect(connection);
    if let Err(e) = writer_task.await {
        warn!(connection, error = %e, "Writer task ended abnormally");
    }

    result
}
