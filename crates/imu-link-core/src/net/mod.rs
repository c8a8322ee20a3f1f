//! Transport-agnostic request/response handlers for the telemetry link.
//!
//! The handlers only see the [`Listener`], [`Dialer`] and [`Connection`] traits.
//! The firmware backs them with embassy-net TCP sockets and the simulator with
//! tokio sockets.

pub mod client;
pub mod http;
pub mod server;

use core::fmt::Debug;
use core::net::SocketAddrV4;

use embedded_io_async::{Read, Write};

pub use client::{ClientError, ClientReading, TelemetryClient};
pub use http::{WELCOME_RESPONSE, respond_welcome, serve_http};
pub use server::{Exchange, ServerError, SessionState, TelemetrySession, serve_telemetry};

/// One established stream.
pub trait Connection: Read + Write {
    /// Gracefully close the stream. Errors during close are not reported.
    fn close(&mut self) -> impl Future<Output = ()>;
}

/// Source of inbound connections on a bound port.
pub trait Listener {
    type Error: Debug;
    type Connection<'a>: Connection
    where
        Self: 'a;

    /// Wait for the next peer.
    fn accept(&mut self) -> impl Future<Output = Result<Self::Connection<'_>, Self::Error>>;
}

/// Opens outbound connections.
pub trait Dialer {
    type Error: Debug;
    type Connection<'a>: Connection
    where
        Self: 'a;

    /// One connection attempt, no retries.
    fn dial(
        &mut self,
        endpoint: SocketAddrV4,
    ) -> impl Future<Output = Result<Self::Connection<'_>, Self::Error>>;
}
