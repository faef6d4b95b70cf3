//! Async UDP socket wrapper.
//!
//! Provides a segment-sized interface for sending and receiving RIVULET
//! datagrams over UDP.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;

use crate::core::MAX_SEGMENT_SIZE;

/// Default receive buffer size.
///
/// Larger than any valid segment so that oversized datagrams arrive intact
/// and fail length validation instead of being silently truncated into
/// something else.
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 2048;

/// Async UDP socket wrapper for RIVULET.
///
/// Provides convenient methods for sending/receiving segments with proper
/// buffer management.
#[derive(Debug)]
pub struct StreamSocket {
    /// The underlying UDP socket.
    socket: Arc<UdpSocket>,
    /// Receive buffer.
    recv_buffer: Vec<u8>,
}

impl StreamSocket {
    /// Create a new socket bound to the given address.
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self::from_socket(socket))
    }

    /// Create a socket from an existing UDP socket.
    pub fn from_socket(socket: UdpSocket) -> Self {
        Self {
            socket: Arc::new(socket),
            recv_buffer: vec![0u8; DEFAULT_RECV_BUFFER_SIZE],
        }
    }

    /// Get the local address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Lock the socket to a remote address.
    ///
    /// After connecting, `send` and `recv` can be used instead of
    /// `send_to` and `recv_from`.
    pub async fn connect(&self, addr: SocketAddr) -> io::Result<()> {
        self.socket.connect(addr).await
    }

    /// Send a datagram to a specific address.
    pub async fn send_to(&self, data: &[u8], addr: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(data, addr).await
    }

    /// Send a datagram to the connected address.
    pub async fn send(&self, data: &[u8]) -> io::Result<usize> {
        self.socket.send(data).await
    }

    /// Receive a datagram and return the sender's address.
    pub async fn recv_from(&mut self) -> io::Result<(&[u8], SocketAddr)> {
        let (len, addr) = self.socket.recv_from(&mut self.recv_buffer).await?;
        Ok((&self.recv_buffer[..len], addr))
    }

    /// Receive a datagram from the connected address.
    pub async fn recv(&mut self) -> io::Result<&[u8]> {
        let len = self.socket.recv(&mut self.recv_buffer).await?;
        Ok(&self.recv_buffer[..len])
    }

    /// Get a reference to the underlying socket.
    pub fn inner(&self) -> &UdpSocket {
        &self.socket
    }

    /// Get a clone of the Arc-wrapped socket.
    pub fn socket_arc(&self) -> Arc<UdpSocket> {
        Arc::clone(&self.socket)
    }

    /// Largest datagram the protocol will ever put on the wire.
    pub fn max_datagram_size(&self) -> usize {
        MAX_SEGMENT_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_socket_bind() {
        let socket = StreamSocket::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let addr = socket.local_addr().unwrap();
        assert!(addr.port() != 0);
    }

    #[tokio::test]
    async fn test_socket_send_recv() {
        let mut server = StreamSocket::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let server_addr = server.local_addr().unwrap();

        let client = StreamSocket::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();

        let data = b"hello rivulet";
        client.send_to(data, server_addr).await.unwrap();

        let (received, from) = server.recv_from().await.unwrap();
        assert_eq!(received, data);
        assert_eq!(from, client.local_addr().unwrap());
    }

    #[tokio::test]
    async fn test_socket_connected() {
        let mut server = StreamSocket::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let server_addr = server.local_addr().unwrap();

        let client = StreamSocket::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        client.connect(server_addr).await.unwrap();

        let data = b"connected send";
        client.send(data).await.unwrap();

        let (received, _) = server.recv_from().await.unwrap();
        assert_eq!(received, data);
    }

    #[tokio::test]
    async fn test_max_datagram_size() {
        let socket = StreamSocket::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(socket.max_datagram_size(), MAX_SEGMENT_SIZE);
        assert!(DEFAULT_RECV_BUFFER_SIZE > MAX_SEGMENT_SIZE);
    }
}
