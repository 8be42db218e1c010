//! TCP Stream Connector
//!
//! Implements the `StreamConnector` port with a plain `tokio` TCP connect.
//! Timeouts are applied by the dialer around the whole connect + handshake.

use crate::ports::outbound::StreamConnector;
use async_trait::async_trait;
use tokio::net::TcpStream;

/// Connects over the operating system's TCP stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl StreamConnector for TcpConnector {
    async fn connect(&self, address: &str) -> std::io::Result<TcpStream> {
        let stream = TcpStream::connect(address).await?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}
