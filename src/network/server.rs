use super::connection::serve_connection;
use super::dispatch::Dispatcher;
use crate::messages::wire::{FramedMessage, WireConfig, WireProtocolError};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, info, warn};

pub const DEFAULT_MAX_CONNECTIONS: usize = 1000;

pub struct Server {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    wire_config: WireConfig,
    max_connections: usize,
}

impl Server {
    pub async fn bind(
        addr: &str,
        dispatcher: Arc<Dispatcher>,
        wire_config: WireConfig,
        max_connections: usize,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind server to address: {}", addr))?;

        info!("Server successfully bound to address: {}", addr);
        debug!(
            "Wire config - max_message_size: {}, read_timeout: {:?}, write_timeout: {:?}",
            wire_config.max_message_size, wire_config.read_timeout, wire_config.write_timeout
        );

        Ok(Self {
            listener,
            dispatcher,
            wire_config,
            max_connections,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` resolves
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        info!("Starting server on address: {:?}", self.listener.local_addr()?);
        tokio::pin!(shutdown);

        let mut active_connections: HashMap<usize, JoinHandle<()>> = HashMap::new();
        let mut connection_counter = 0usize;

        loop {
            let accepted = tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, no longer accepting connections");
                    break;
                }
                accepted = self.listener.accept() => accepted,
            };

            let (stream, peer_addr) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            // Clean up completed connections
            active_connections.retain(|_, handle| !handle.is_finished());

            if active_connections.len() >= self.max_connections {
                warn!(
                    "Connection limit reached ({}), rejecting connection from {}",
                    self.max_connections, peer_addr
                );
                continue;
            }

            connection_counter += 1;
            let task_id = connection_counter;
            info!("Accepted new connection {} from {}", task_id, peer_addr);

            let dispatcher = Arc::clone(&self.dispatcher);
            let framed = FramedMessage::new(self.wire_config.clone());

            let handle = task::spawn(async move {
                match serve_connection(stream, dispatcher, framed).await {
                    Ok(()) => debug!("Connection {} from {} finished", task_id, peer_addr),
                    Err(WireProtocolError::Io(e)) => {
                        debug!("Connection {} from {} dropped: {}", task_id, peer_addr, e)
                    }
                    Err(e) => warn!("Connection {} from {} failed: {}", task_id, peer_addr, e),
                }
            });
            active_connections.insert(task_id, handle);
        }

        for (_, handle) in active_connections {
            handle.abort();
        }
        Ok(())
    }
}
