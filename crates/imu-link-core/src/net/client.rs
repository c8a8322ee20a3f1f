//! Telemetry client: one request per connection, bounded by a timeout.

use core::net::SocketAddrV4;

use embassy_time::{Duration, Instant, with_deadline};
use embedded_io_async::{Error as _, ErrorKind};
use log::{debug, warn};
use thiserror_no_std::Error;

use super::{Connection, Dialer};
use crate::sensors::SensorReading;
use crate::telemetry::codec::{self, CodecError, MAX_PAYLOAD_LEN, REQUEST_COMMAND};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientError {
    #[error("could not connect to the telemetry server")]
    ConnectFailed,
    #[error("no response within the request timeout")]
    Timeout,
    #[error("sending the request failed: {0:?}")]
    SendFailed(ErrorKind),
    #[error("receiving the response failed: {0:?}")]
    ReceiveFailed(ErrorKind),
    #[error("server closed without sending a reading")]
    EmptyResponse,
    #[error("response exceeds the payload limit")]
    ResponseTooLong,
    #[error("malformed response: {0}")]
    Malformed(CodecError),
}

/// The subset of a reading the client application consumes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClientReading {
    pub accel_x: f32,
    pub accel_y: f32,
    pub accel_z: f32,
    pub temperature: f32,
}

impl From<&SensorReading> for ClientReading {
    fn from(reading: &SensorReading) -> Self {
        Self {
            accel_x: reading.accel_x,
            accel_y: reading.accel_y,
            accel_z: reading.accel_z,
            temperature: reading.temperature,
        }
    }
}

/// Response bytes of the one request in flight.
///
/// Lives only for the duration of a `fetch` and is consumed by
/// [`PendingRequest::finish`].
struct PendingRequest {
    buffer: [u8; MAX_PAYLOAD_LEN],
    filled: usize,
}

impl PendingRequest {
    fn new() -> Self {
        Self {
            buffer: [0; MAX_PAYLOAD_LEN],
            filled: 0,
        }
    }

    async fn exchange<C: Connection>(&mut self, conn: &mut C) -> Result<(), ClientError> {
        conn.write_all(REQUEST_COMMAND)
            .await
            .map_err(|e| ClientError::SendFailed(e.kind()))?;
        conn.flush()
            .await
            .map_err(|e| ClientError::SendFailed(e.kind()))?;

        // The server closes after the reading, so EOF delimits the payload.
        while self.filled < MAX_PAYLOAD_LEN {
            let received = conn
                .read(&mut self.buffer[self.filled..])
                .await
                .map_err(|e| ClientError::ReceiveFailed(e.kind()))?;
            if received == 0 {
                return Ok(());
            }
            self.filled += received;
        }

        let mut overflow = [0u8; 1];
        match conn.read(&mut overflow).await {
            Ok(0) => Ok(()),
            Ok(_) => Err(ClientError::ResponseTooLong),
            Err(e) => Err(ClientError::ReceiveFailed(e.kind())),
        }
    }

    fn finish(self) -> Result<SensorReading, ClientError> {
        if self.filled == 0 {
            return Err(ClientError::EmptyResponse);
        }
        codec::decode(&self.buffer[..self.filled]).map_err(ClientError::Malformed)
    }
}

fn timed_out(timeout: Duration) -> ClientError {
    debug!("Request timed out after {} ms", timeout.as_millis());
    ClientError::Timeout
}

pub struct TelemetryClient<D> {
    dialer: D,
    endpoint: SocketAddrV4,
    timeout: Duration,
}

impl<D: Dialer> TelemetryClient<D> {
    pub fn new(dialer: D, endpoint: SocketAddrV4) -> Self {
        Self {
            dialer,
            endpoint,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> SocketAddrV4 {
        self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Make a single connection attempt to the server.
    pub async fn connect(&mut self) -> Result<D::Connection<'_>, ClientError> {
        let endpoint = self.endpoint;
        self.dialer.dial(endpoint).await.map_err(|e| {
            warn!("Connect to {} failed: {:?}", endpoint, e);
            ClientError::ConnectFailed
        })
    }

    /// Request the latest reading with every field the server sends.
    ///
    /// Connecting, sending and receiving all share one deadline, `timeout`
    /// from now.
    pub async fn fetch(&mut self) -> Result<SensorReading, ClientError> {
        let timeout = self.timeout;
        let deadline = Instant::now() + timeout;

        let mut conn = match with_deadline(deadline, self.connect()).await {
            Ok(conn) => conn?,
            Err(_) => return Err(timed_out(timeout)),
        };

        let mut pending = PendingRequest::new();
        let exchange = with_deadline(deadline, pending.exchange(&mut conn)).await;
        conn.close().await;

        match exchange {
            Ok(Ok(())) => pending.finish(),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(timed_out(timeout)),
        }
    }

    /// Update `reading` in place with accel x/y/z and temperature.
    ///
    /// On any failure `reading` is left exactly as it was.
    pub async fn request_reading(
        &mut self,
        reading: &mut ClientReading,
    ) -> Result<(), ClientError> {
        let latest = self.fetch().await?;
        *reading = ClientReading::from(&latest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use core::net::Ipv4Addr;

    use super::*;
    use crate::net::{Exchange, TelemetrySession};
    use crate::telemetry::TelemetryStore;
    use crate::test_support::{ScriptedConnection, ScriptedDialer, init_logger};

    const SERVER: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::new(192, 168, 4, 1), 4242);

    fn prior() -> ClientReading {
        ClientReading {
            accel_x: 9.0,
            accel_y: 8.0,
            accel_z: 7.0,
            temperature: 6.0,
        }
    }

    #[tokio::test]
    async fn test_request_sends_data_and_copies_four_fields() {
        init_logger();
        let dialer = ScriptedDialer::new(ScriptedConnection::new(
            b"0.50,-0.25,1.00,10.00,20.00,30.00,23.75",
        ));
        let mut client = TelemetryClient::new(dialer, SERVER);
        let mut reading = prior();

        client.request_reading(&mut reading).await.unwrap();

        assert_eq!(
            reading,
            ClientReading {
                accel_x: 0.5,
                accel_y: -0.25,
                accel_z: 1.0,
                temperature: 23.75,
            }
        );
        let conn = client.dialer.connection();
        assert_eq!(conn.written(), b"DATA");
        assert!(conn.is_closed());
        assert_eq!(client.dialer.last_endpoint(), Some(SERVER));
    }

    #[tokio::test]
    async fn test_fetch_exposes_gyro() {
        let dialer = ScriptedDialer::new(
            ScriptedConnection::new(b"0.00,0.00,1.00,10.00,20.00,30.00,23.75").chunked(5),
        );
        let mut client = TelemetryClient::new(dialer, SERVER);

        let reading = client.fetch().await.unwrap();

        assert_eq!(reading.gyro_x, 10.0);
        assert_eq!(reading.gyro_y, 20.0);
        assert_eq!(reading.gyro_z, 30.0);
    }

    #[tokio::test]
    async fn test_timeout_leaves_reading_untouched() {
        let dialer = ScriptedDialer::new(ScriptedConnection::new(b"").stalled());
        let mut client =
            TelemetryClient::new(dialer, SERVER).with_timeout(Duration::from_millis(50));
        let mut reading = prior();

        let result = client.request_reading(&mut reading).await;

        assert_eq!(result, Err(ClientError::Timeout));
        assert_eq!(reading, prior());
        assert!(client.dialer.connection().is_closed());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_bounded_by_timeout() {
        let mut client = TelemetryClient::new(ScriptedDialer::unreachable(), SERVER)
            .with_timeout(Duration::from_millis(50));
        let mut reading = prior();

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            client.request_reading(&mut reading),
        )
        .await
        .expect("request outlived its timeout");

        assert_eq!(result, Err(ClientError::Timeout));
        assert_eq!(client.dialer.dials(), 1);
        assert_eq!(reading, prior());
    }

    #[tokio::test]
    async fn test_connect_failure_is_single_attempt() {
        let mut client = TelemetryClient::new(ScriptedDialer::refusing(), SERVER);
        let mut reading = prior();

        let result = client.request_reading(&mut reading).await;

        assert_eq!(result, Err(ClientError::ConnectFailed));
        assert_eq!(client.dialer.dials(), 1);
        assert_eq!(reading, prior());
    }

    #[tokio::test]
    async fn test_bad_responses_are_rejected() {
        let cases: [(&[u8], ClientError); 3] = [
            (b"", ClientError::EmptyResponse),
            (
                b"1.00,2.00",
                ClientError::Malformed(CodecError::FieldCount { found: 2 }),
            ),
            (&[b'0'; MAX_PAYLOAD_LEN + 1], ClientError::ResponseTooLong),
        ];

        for (response, expected) in cases {
            let dialer = ScriptedDialer::new(ScriptedConnection::new(response));
            let mut client = TelemetryClient::new(dialer, SERVER);
            let mut reading = prior();

            assert_eq!(client.request_reading(&mut reading).await, Err(expected));
            assert_eq!(reading, prior());
        }
    }

    #[tokio::test]
    async fn test_end_to_end_through_server_session() {
        let store = TelemetryStore::new();
        store.set(SensorReading {
            accel_x: 1.0,
            accel_y: 2.0,
            accel_z: 3.0,
            temperature: 25.0,
            gyro_x: 0.1,
            gyro_y: 0.2,
            gyro_z: 0.3,
        });

        let mut server_side = ScriptedConnection::new(REQUEST_COMMAND);
        let outcome = TelemetrySession::new(&store)
            .run(&mut server_side)
            .await
            .unwrap();
        assert_eq!(outcome, Exchange::Responded { bytes: 35 });
        assert_eq!(server_side.written(), b"1.00,2.00,3.00,0.10,0.20,0.30,25.00");

        let dialer = ScriptedDialer::new(ScriptedConnection::new(server_side.written()));
        let mut client = TelemetryClient::new(dialer, SERVER);
        let mut reading = ClientReading::default();

        client.request_reading(&mut reading).await.unwrap();

        assert_eq!(
            reading,
            ClientReading {
                accel_x: 1.0,
                accel_y: 2.0,
                accel_z: 3.0,
                temperature: 25.0,
            }
        );
    }
}
