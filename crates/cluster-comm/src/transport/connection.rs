//! A dialed connection to a cluster member.

use rustls::pki_types::CertificateDer;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

/// A byte stream to a cluster member, TLS-protected unless TLS is disabled.
pub enum ClusterConnection {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl ClusterConnection {
    pub fn is_tls(&self) -> bool {
        matches!(self, ClusterConnection::Tls(_))
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        match self {
            ClusterConnection::Plain(stream) => stream.peer_addr(),
            ClusterConnection::Tls(stream) => stream.get_ref().0.peer_addr(),
        }
    }

    /// Certificates the server presented, leaf first. `None` over plain TCP.
    pub fn peer_certificates(&self) -> Option<&[CertificateDer<'static>]> {
        match self {
            ClusterConnection::Plain(_) => None,
            ClusterConnection::Tls(stream) => stream.get_ref().1.peer_certificates(),
        }
    }
}

impl fmt::Debug for ClusterConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterConnection")
            .field("tls", &self.is_tls())
            .field("peer_addr", &self.peer_addr().ok())
            .finish()
    }
}

impl AsyncRead for ClusterConnection {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            ClusterConnection::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            ClusterConnection::Tls(stream) => Pin::new(&mut **stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for ClusterConnection {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            ClusterConnection::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            ClusterConnection::Tls(stream) => Pin::new(&mut **stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            ClusterConnection::Plain(stream) => Pin::new(stream).poll_flush(cx),
            ClusterConnection::Tls(stream) => Pin::new(&mut **stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            ClusterConnection::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            ClusterConnection::Tls(stream) => Pin::new(&mut **stream).poll_shutdown(cx),
        }
    }
}
