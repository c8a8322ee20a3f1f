//! tokio sockets behind the core `Listener`/`Dialer` traits.

use std::io;
use std::net::{SocketAddr, SocketAddrV4};

use embedded_io_async::{ErrorKind, ErrorType, Read, Write};
use imu_link_core::net::{Connection, Dialer, Listener};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

fn io_kind(e: io::Error) -> ErrorKind {
    match e.kind() {
        io::ErrorKind::ConnectionRefused => ErrorKind::ConnectionRefused,
        io::ErrorKind::ConnectionReset => ErrorKind::ConnectionReset,
        io::ErrorKind::ConnectionAborted => ErrorKind::ConnectionAborted,
        io::ErrorKind::BrokenPipe => ErrorKind::BrokenPipe,
        io::ErrorKind::TimedOut => ErrorKind::TimedOut,
        io::ErrorKind::Interrupted => ErrorKind::Interrupted,
        _ => ErrorKind::Other,
    }
}

pub struct TokioConnection {
    stream: TcpStream,
}

impl ErrorType for TokioConnection {
    type Error = ErrorKind;
}

impl Read for TokioConnection {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.stream.read(buf).await.map_err(io_kind)
    }
}

impl Write for TokioConnection {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.stream.write(buf).await.map_err(io_kind)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.stream.flush().await.map_err(io_kind)
    }
}

impl Connection for TokioConnection {
    async fn close(&mut self) {
        let _ = self.stream.shutdown().await;
    }
}

pub struct TokioListener {
    listener: TcpListener,
}

impl TokioListener {
    pub async fn bind(address: SocketAddrV4) -> io::Result<Self> {
        Ok(Self {
            listener: TcpListener::bind(address).await?,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Listener for TokioListener {
    type Error = io::Error;
    type Connection<'a> = TokioConnection;

    async fn accept(&mut self) -> Result<TokioConnection, io::Error> {
        let (stream, peer) = self.listener.accept().await?;
        log::debug!("Accepted {}", peer);
        Ok(TokioConnection { stream })
    }
}

#[derive(Debug, Default)]
pub struct TokioDialer;

impl Dialer for TokioDialer {
    type Error = io::Error;
    type Connection<'a> = TokioConnection;

    async fn dial(&mut self, endpoint: SocketAddrV4) -> Result<TokioConnection, io::Error> {
        let stream = TcpStream::connect(endpoint).await?;
        Ok(TokioConnection { stream })
    }
}
