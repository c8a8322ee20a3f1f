//! Telemetry server: answers any non-empty request with the latest reading.

use embassy_time::{Duration, Timer};
use embedded_io_async::{Error as _, ErrorKind};
use log::{debug, info, warn};
use thiserror_no_std::Error;

use super::{Connection, Listener};
use crate::telemetry::TelemetryStore;
use crate::telemetry::codec::{self, CodecError};

/// Pause before accepting again after the listener reported an error.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(250);

/// Inbound bytes are drained but never inspected.
const INBOUND_CHUNK: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Accepted,
    AwaitingPayload,
    Responded,
    Closed,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    Responded { bytes: usize },
    /// The peer hung up before sending anything; nothing was written.
    PeerClosed,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerError {
    #[error("receive failed: {0:?}")]
    Receive(ErrorKind),
    #[error("send failed: {0:?}")]
    Send(ErrorKind),
    #[error("encoding failed: {0}")]
    Encode(CodecError),
}

/// One accepted telemetry connection.
pub struct TelemetrySession<'s> {
    store: &'s TelemetryStore,
    state: SessionState,
}

impl<'s> TelemetrySession<'s> {
    pub fn new(store: &'s TelemetryStore) -> Self {
        Self {
            store,
            state: SessionState::Accepted,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the session to completion. The connection is always closed on
    /// return, whatever the outcome.
    pub async fn run<C: Connection>(&mut self, conn: &mut C) -> Result<Exchange, ServerError> {
        self.state = SessionState::AwaitingPayload;
        let outcome = self.exchange(conn).await;
        conn.close().await;
        self.state = SessionState::Closed;
        outcome
    }

    async fn exchange<C: Connection>(&mut self, conn: &mut C) -> Result<Exchange, ServerError> {
        let mut inbound = [0u8; INBOUND_CHUNK];
        let received = conn
            .read(&mut inbound)
            .await
            .map_err(|e| ServerError::Receive(e.kind()))?;

        if received == 0 {
            return Ok(Exchange::PeerClosed);
        }

        let payload = codec::encode(&self.store.get()).map_err(ServerError::Encode)?;

        conn.write_all(payload.as_bytes())
            .await
            .map_err(|e| ServerError::Send(e.kind()))?;
        conn.flush()
            .await
            .map_err(|e| ServerError::Send(e.kind()))?;

        self.state = SessionState::Responded;
        Ok(Exchange::Responded {
            bytes: payload.len(),
        })
    }
}

/// Accept telemetry clients forever, one session at a time.
pub async fn serve_telemetry<L: Listener>(listener: &mut L, store: &TelemetryStore) -> ! {
    info!("Telemetry server listening");

    loop {
        let mut conn = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Telemetry accept failed: {:?}", e);
                Timer::after(ACCEPT_BACKOFF).await;
                continue;
            }
        };

        let mut session = TelemetrySession::new(store);
        match session.run(&mut conn).await {
            Ok(Exchange::Responded { bytes }) => debug!("Sent {} byte reading", bytes),
            Ok(Exchange::PeerClosed) => debug!("Client closed before sending a request"),
            Err(e) => warn!("Telemetry session failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::select::select;

    use super::*;
    use crate::sensors::SensorReading;
    use crate::test_support::{ScriptedConnection, ScriptedListener, init_logger};

    fn stored() -> TelemetryStore {
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
        store
    }

    #[tokio::test]
    async fn test_any_payload_gets_reading() {
        init_logger();
        let store = stored();
        let mut conn = ScriptedConnection::new(b"hello");
        let mut session = TelemetrySession::new(&store);

        let outcome = session.run(&mut conn).await;

        assert_eq!(outcome, Ok(Exchange::Responded { bytes: 35 }));
        assert_eq!(conn.written(), b"1.00,2.00,3.00,0.10,0.20,0.30,25.00");
        assert!(conn.is_closed());
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_peer_close_gets_no_write() {
        let store = stored();
        let mut conn = ScriptedConnection::new(b"");
        let mut session = TelemetrySession::new(&store);

        let outcome = session.run(&mut conn).await;

        assert_eq!(outcome, Ok(Exchange::PeerClosed));
        assert!(conn.written().is_empty());
        assert!(conn.is_closed());
    }

    #[tokio::test]
    async fn test_zeroed_store_before_first_sample() {
        let store = TelemetryStore::new();
        let mut conn = ScriptedConnection::new(b"DATA");

        TelemetrySession::new(&store).run(&mut conn).await.unwrap();

        assert_eq!(conn.written(), b"0.00,0.00,0.00,0.00,0.00,0.00,0.00");
    }

    #[tokio::test]
    async fn test_send_failure_still_closes() {
        let store = stored();
        let mut conn = ScriptedConnection::new(b"DATA").failing_writes();

        let outcome = TelemetrySession::new(&store).run(&mut conn).await;

        assert!(matches!(outcome, Err(ServerError::Send(_))));
        assert!(conn.is_closed());
    }

    #[tokio::test]
    async fn test_serve_keeps_going_after_failures() {
        init_logger();
        let store = stored();
        let mut listener = ScriptedListener::new(vec![
            ScriptedConnection::new(b"DATA"),
            ScriptedConnection::new(b""),
            ScriptedConnection::new(b"DATA").failing_writes(),
            ScriptedConnection::new(b"DATA"),
        ])
        .failing_accepts(1);

        select(
            serve_telemetry(&mut listener, &store),
            Timer::after(Duration::from_millis(500)),
        )
        .await;

        let served = listener.connections();
        assert_eq!(listener.accepted(), 4);
        assert!(served.iter().all(ScriptedConnection::is_closed));
        assert_eq!(served[0].written(), b"1.00,2.00,3.00,0.10,0.20,0.30,25.00");
        assert!(served[1].written().is_empty());
        assert!(served[2].written().is_empty());
        assert_eq!(served[3].written(), b"1.00,2.00,3.00,0.10,0.20,0.30,25.00");
    }
}
