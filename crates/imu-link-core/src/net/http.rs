//! Minimal HTTP listener that answers every request with a static page.
//!
//! No request parsing happens: the first non-empty chunk triggers the response.

use embassy_time::{Duration, Timer};
use embedded_io_async::Error as _;
use log::{debug, info, warn};

use super::server::{Exchange, ServerError};
use super::{Connection, Listener};

pub const WELCOME_RESPONSE: &str = "HTTP/1.1 200 OK\r\n\
    Content-Type: text/html\r\n\
    \r\n\
    <html><body><h1>MPU6050 Web Server</h1></body></html>";

const ACCEPT_BACKOFF: Duration = Duration::from_millis(250);

/// Write the welcome page once after the first request bytes, then close.
pub async fn respond_welcome<C: Connection>(conn: &mut C) -> Result<Exchange, ServerError> {
    let outcome = write_welcome(conn).await;
    conn.close().await;
    outcome
}

async fn write_welcome<C: Connection>(conn: &mut C) -> Result<Exchange, ServerError> {
    let mut request = [0u8; 256];
    let received = conn
        .read(&mut request)
        .await
        .map_err(|e| ServerError::Receive(e.kind()))?;

    if received == 0 {
        return Ok(Exchange::PeerClosed);
    }

    conn.write_all(WELCOME_RESPONSE.as_bytes())
        .await
        .map_err(|e| ServerError::Send(e.kind()))?;
    conn.flush()
        .await
        .map_err(|e| ServerError::Send(e.kind()))?;

    Ok(Exchange::Responded {
        bytes: WELCOME_RESPONSE.len(),
    })
}

pub async fn serve_http<L: Listener>(listener: &mut L) -> ! {
    info!("HTTP server listening");

    loop {
        let mut conn = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("HTTP accept failed: {:?}", e);
                Timer::after(ACCEPT_BACKOFF).await;
                continue;
            }
        };

        match respond_welcome(&mut conn).await {
            Ok(Exchange::Responded { .. }) => debug!("Served welcome page"),
            Ok(Exchange::PeerClosed) => {}
            Err(e) => warn!("HTTP session failed: {}", e),
        }
    }
}
