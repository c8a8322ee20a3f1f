//! Register-level stand-in for an MPU6050 on an async I2C bus.
//!
//! Behaves like the real part for the transactions the driver issues: a write
//! sets the register pointer (further bytes are stored with auto-increment) and
//! reads stream out from the pointer. Used by host tests and the desktop
//! simulator.

use alloc::vec::Vec;

use embedded_hal_async::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use super::READING_FIELDS;
use super::registers::{ACCEL_XOUT_H, DEFAULT_ADDRESS, EXPECTED_IDENTITY, WHO_AM_I};

const REGISTER_COUNT: usize = 128;

/// Produces raw counts for the burst block; called with the burst index.
pub type SampleSource = fn(u32) -> [i16; READING_FIELDS];

pub struct MockMpu6050 {
    address: u8,
    registers: [u8; REGISTER_COUNT],
    pointer: u8,
    writes: Vec<(u8, u8)>,
    source: Option<SampleSource>,
    bursts: u32,
    fail_reads: bool,
    fail_writes: bool,
}

impl Default for MockMpu6050 {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMpu6050 {
    pub fn new() -> Self {
        let mut registers = [0u8; REGISTER_COUNT];
        registers[WHO_AM_I as usize] = EXPECTED_IDENTITY;

        Self {
            address: DEFAULT_ADDRESS,
            registers,
            pointer: 0,
            writes: Vec::new(),
            source: None,
            bursts: 0,
            fail_reads: false,
            fail_writes: false,
        }
    }

    pub fn with_identity(mut self, identity: u8) -> Self {
        self.registers[WHO_AM_I as usize] = identity;
        self
    }

    /// Answer on a different address. Transactions to any other address are
    /// NACKed.
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Refresh the data block from `source` every time a burst read starts.
    pub fn with_source(mut self, source: SampleSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Load raw counts (accel x/y/z, temp, gyro x/y/z) into the data block.
    pub fn set_raw_sample(&mut self, words: [i16; READING_FIELDS]) {
        for (i, word) in words.iter().enumerate() {
            let [high, low] = word.to_be_bytes();
            let register = ACCEL_XOUT_H as usize + i * 2;
            self.registers[register] = high;
            self.registers[register + 1] = low;
        }
    }

    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Register writes seen so far as `(register, value)`.
    ///
    /// Pointer-only writes (the first half of a register read) are not listed.
    pub fn writes(&self) -> &[(u8, u8)] {
        &self.writes
    }

    pub fn register(&self, register: u8) -> u8 {
        self.registers[register as usize % REGISTER_COUNT]
    }

    fn store(&mut self, value: u8) {
        self.registers[self.pointer as usize % REGISTER_COUNT] = value;
        self.writes.push((self.pointer, value));
        self.pointer = self.pointer.wrapping_add(1);
    }

    fn load(&mut self) -> u8 {
        let value = self.registers[self.pointer as usize % REGISTER_COUNT];
        self.pointer = self.pointer.wrapping_add(1);
        value
    }
}

impl ErrorType for MockMpu6050 {
    type Error = ErrorKind;
}

impl I2c for MockMpu6050 {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != self.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    if self.fail_writes {
                        return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
                    }
                    if let Some((&register, values)) = bytes.split_first() {
                        self.pointer = register;
                        for &value in values {
                            self.store(value);
                        }
                    }
                }
                Operation::Read(buffer) => {
                    if self.fail_reads {
                        return Err(ErrorKind::Other);
                    }
                    if self.pointer == ACCEL_XOUT_H {
                        if let Some(source) = self.source {
                            self.set_raw_sample(source(self.bursts));
                        }
                        self.bursts = self.bursts.wrapping_add(1);
                    }
                    for byte in buffer.iter_mut() {
                        *byte = self.load();
                    }
                }
            }
        }

        Ok(())
    }
}
