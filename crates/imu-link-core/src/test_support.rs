//! In-memory transport doubles for the protocol handler tests.

use alloc::vec::Vec;
use core::net::SocketAddrV4;

use embedded_io_async::{ErrorKind, ErrorType, Read, Write};

use crate::net::{Connection, Dialer, Listener};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A stream with a fixed inbound script that records everything written.
pub struct ScriptedConnection {
    inbound: Vec<u8>,
    cursor: usize,
    chunk: usize,
    written: Vec<u8>,
    closed: bool,
    stall: bool,
    fail_writes: bool,
}

impl ScriptedConnection {
    /// Reads yield `inbound`, then EOF.
    pub fn new(inbound: &[u8]) -> Self {
        Self {
            inbound: inbound.to_vec(),
            cursor: 0,
            chunk: usize::MAX,
            written: Vec::new(),
            closed: false,
            stall: false,
            fail_writes: false,
        }
    }

    /// Reads never complete.
    pub fn stalled(mut self) -> Self {
        self.stall = true;
        self
    }

    /// Deliver at most `chunk` bytes per read.
    pub fn chunked(mut self, chunk: usize) -> Self {
        self.chunk = chunk;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn written(&self) -> &[u8] {
        &self.written
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl ErrorType for ScriptedConnection {
    type Error = ErrorKind;
}

impl Read for ScriptedConnection {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.stall {
            core::future::pending::<()>().await;
        }

        let remaining = &self.inbound[self.cursor..];
        let n = remaining.len().min(buf.len()).min(self.chunk);
        buf[..n].copy_from_slice(&remaining[..n]);
        self.cursor += n;
        Ok(n)
    }
}

impl Write for ScriptedConnection {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.fail_writes {
            return Err(ErrorKind::BrokenPipe);
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Connection for ScriptedConnection {
    async fn close(&mut self) {
        self.closed = true;
    }
}

impl Connection for &mut ScriptedConnection {
    async fn close(&mut self) {
        self.closed = true;
    }
}

/// Hands out queued connections in order, then waits forever.
pub struct ScriptedListener {
    connections: Vec<ScriptedConnection>,
    next: usize,
    accept_failures: usize,
}

impl ScriptedListener {
    pub fn new(connections: Vec<ScriptedConnection>) -> Self {
        Self {
            connections,
            next: 0,
            accept_failures: 0,
        }
    }

    /// The first `count` accepts fail before any connection is handed out.
    pub fn failing_accepts(mut self, count: usize) -> Self {
        self.accept_failures = count;
        self
    }

    pub fn connections(&self) -> &[ScriptedConnection] {
        &self.connections
    }

    pub fn accepted(&self) -> usize {
        self.next
    }
}

impl Listener for ScriptedListener {
    type Error = ErrorKind;
    type Connection<'a> = &'a mut ScriptedConnection;

    async fn accept(&mut self) -> Result<Self::Connection<'_>, Self::Error> {
        if self.accept_failures > 0 {
            self.accept_failures -= 1;
            return Err(ErrorKind::ConnectionAborted);
        }
        if self.next >= self.connections.len() {
            core::future::pending::<()>().await;
        }
        self.next += 1;
        Ok(&mut self.connections[self.next - 1])
    }
}

/// Always dials into the same scripted connection, refuses, or never answers.
pub struct ScriptedDialer {
    connection: ScriptedConnection,
    refuse: bool,
    hang: bool,
    dials: usize,
    last_endpoint: Option<SocketAddrV4>,
}

impl ScriptedDialer {
    pub fn new(connection: ScriptedConnection) -> Self {
        Self {
            connection,
            refuse: false,
            hang: false,
            dials: 0,
            last_endpoint: None,
        }
    }

    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::new(ScriptedConnection::new(b""))
        }
    }

    /// `dial` never completes, like a SYN to a host that is not there.
    pub fn unreachable() -> Self {
        Self {
            hang: true,
            ..Self::new(ScriptedConnection::new(b""))
        }
    }

    pub fn connection(&self) -> &ScriptedConnection {
        &self.connection
    }

    pub fn dials(&self) -> usize {
        self.dials
    }

    pub fn last_endpoint(&self) -> Option<SocketAddrV4> {
        self.last_endpoint
    }
}

impl Dialer for ScriptedDialer {
    type Error = ErrorKind;
    type Connection<'a> = &'a mut ScriptedConnection;

    async fn dial(
        &mut self,
        endpoint: SocketAddrV4,
    ) -> Result<Self::Connection<'_>, Self::Error> {
        self.dials += 1;
        self.last_endpoint = Some(endpoint);
        if self.hang {
            core::future::pending::<()>().await;
        }
        if self.refuse {
            return Err(ErrorKind::ConnectionRefused);
        }
        Ok(&mut self.connection)
    }
}
