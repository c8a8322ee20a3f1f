//! Latest-reading cache shared between the acquisition loop and the servers,
//! plus the wire codec used to ship readings to the client.

pub mod acquisition;
pub mod codec;

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::sensors::SensorReading;

pub use acquisition::{poll_once, run_acquisition};

/// Single-slot cache of the most recent successful reading.
///
/// Readings are swapped wholesale under a critical section, so a reader never
/// observes a mix of two samples. Holds [`SensorReading::ZERO`] until the first
/// `set`.
pub struct TelemetryStore {
    latest: Mutex<CriticalSectionRawMutex, Cell<SensorReading>>,
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryStore {
    pub const fn new() -> Self {
        Self {
            latest: Mutex::new(Cell::new(SensorReading::ZERO)),
        }
    }

    /// Replace the stored reading. Last writer wins.
    pub fn set(&self, reading: SensorReading) {
        self.latest.lock(|latest| latest.set(reading));
    }

    pub fn get(&self) -> SensorReading {
        self.latest.lock(Cell::get)
    }
}
