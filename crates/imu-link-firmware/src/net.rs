//! embassy-net TCP sockets behind the core `Listener`/`Dialer` traits.

use core::net::SocketAddrV4;

use embassy_net::tcp::{self, AcceptError, ConnectError, TcpSocket};
use embassy_net::{IpAddress, Stack};
use embassy_time::{Duration, with_timeout};
use embedded_io_async::{ErrorKind, ErrorType, Read, Write};
use imu_link_core::net::{Connection, Dialer, Listener};
use thiserror_no_std::Error;

/// Idle limit on an established socket.
const SOCKET_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a close waits for queued bytes to drain.
const CLOSE_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetError {
    #[error("tcp transfer failed: {0:?}")]
    Transfer(tcp::Error),
    #[error("tcp accept failed: {0:?}")]
    Accept(AcceptError),
    #[error("tcp connect failed: {0:?}")]
    Connect(ConnectError),
}

impl core::error::Error for NetError {}

impl embedded_io_async::Error for NetError {
    fn kind(&self) -> ErrorKind {
        match self {
            NetError::Transfer(tcp::Error::ConnectionReset) => ErrorKind::ConnectionReset,
            NetError::Accept(AcceptError::InvalidState) => ErrorKind::NotConnected,
            NetError::Accept(AcceptError::InvalidPort) => ErrorKind::InvalidInput,
            NetError::Accept(AcceptError::ConnectionReset) => ErrorKind::ConnectionReset,
            NetError::Connect(ConnectError::InvalidState) => ErrorKind::NotConnected,
            NetError::Connect(ConnectError::ConnectionReset) => ErrorKind::ConnectionRefused,
            NetError::Connect(ConnectError::TimedOut) => ErrorKind::TimedOut,
            NetError::Connect(ConnectError::NoRoute) => ErrorKind::AddrNotAvailable,
        }
    }
}

/// An established TCP stream.
pub struct NetConnection<'a> {
    socket: TcpSocket<'a>,
}

impl ErrorType for NetConnection<'_> {
    type Error = NetError;
}

impl Read for NetConnection<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.socket.read(buf).await.map_err(NetError::Transfer)
    }
}

impl Write for NetConnection<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.socket.write(buf).await.map_err(NetError::Transfer)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.socket.flush().await.map_err(NetError::Transfer)
    }
}

impl Connection for NetConnection<'_> {
    async fn close(&mut self) {
        self.socket.close();
        let _ = with_timeout(CLOSE_TIMEOUT, self.socket.flush()).await;
    }
}

/// Accepts one connection at a time on `port`, reusing its buffers.
pub struct TcpListener<const N: usize> {
    stack: Stack<'static>,
    port: u16,
    rx_buffer: [u8; N],
    tx_buffer: [u8; N],
}

impl<const N: usize> TcpListener<N> {
    pub fn new(stack: Stack<'static>, port: u16) -> Self {
        Self {
            stack,
            port,
            rx_buffer: [0; N],
            tx_buffer: [0; N],
        }
    }
}

impl<const N: usize> Listener for TcpListener<N> {
    type Error = NetError;
    type Connection<'a> = NetConnection<'a>;

    async fn accept(&mut self) -> Result<NetConnection<'_>, NetError> {
        let mut socket = TcpSocket::new(self.stack, &mut self.rx_buffer, &mut self.tx_buffer);
        socket.set_timeout(Some(SOCKET_TIMEOUT));
        socket.accept(self.port).await.map_err(NetError::Accept)?;
        Ok(NetConnection { socket })
    }
}

/// Opens outbound connections, one at a time.
pub struct TcpDialer<const N: usize> {
    stack: Stack<'static>,
    rx_buffer: [u8; N],
    tx_buffer: [u8; N],
}

impl<const N: usize> TcpDialer<N> {
    pub fn new(stack: Stack<'static>) -> Self {
        Self {
            stack,
            rx_buffer: [0; N],
            tx_buffer: [0; N],
        }
    }
}

impl<const N: usize> Dialer for TcpDialer<N> {
    type Error = NetError;
    type Connection<'a> = NetConnection<'a>;

    async fn dial(&mut self, endpoint: SocketAddrV4) -> Result<NetConnection<'_>, NetError> {
        let mut socket = TcpSocket::new(self.stack, &mut self.rx_buffer, &mut self.tx_buffer);
        socket.set_timeout(Some(SOCKET_TIMEOUT));
        socket
            .connect((IpAddress::Ipv4(*endpoint.ip()), endpoint.port()))
            .await
            .map_err(NetError::Connect)?;
        Ok(NetConnection { socket })
    }
}
