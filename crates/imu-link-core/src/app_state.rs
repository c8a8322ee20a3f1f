//! Application-wide run state and error types for imu-link

use core::fmt::{self, Write};

use log::{error, info, warn};
use thiserror_no_std::Error;

use crate::net::{ClientError, ServerError};
use crate::retry::RetryError;
use crate::sensors::SensorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AppRunState {
    Uninitialized,
    RadioStarting,
    LinkUp,
    SensorReady,
    Serving,
    Error,
}

/// Tracks how far bring-up got, so a partial initialization is visible.
#[derive(Debug)]
pub struct AppState {
    run_state: AppRunState,
    last_error: Option<AppError>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Create a new uninitialized app state
    pub fn new() -> Self {
        Self {
            run_state: AppRunState::Uninitialized,
            last_error: None,
        }
    }

    pub fn run_state(&self) -> AppRunState {
        self.run_state
    }

    pub fn last_error(&self) -> Option<&AppError> {
        self.last_error.as_ref()
    }

    /// Move forward in the bring-up sequence. Steps may be skipped (the client
    /// has no sensor), but the state never moves backwards or leaves `Error`.
    pub fn advance(&mut self, next: AppRunState) -> bool {
        if self.run_state == AppRunState::Error || next <= self.run_state {
            warn!(
                "Ignoring run state change {:?} -> {:?}",
                self.run_state, next
            );
            return false;
        }

        info!("Run state {:?} -> {:?}", self.run_state, next);
        self.run_state = next;
        true
    }

    /// Enter the terminal error state, keeping the cause.
    pub fn fail(&mut self, cause: AppError) {
        error!("Run state {:?} -> Error: {}", self.run_state, cause);
        self.run_state = AppRunState::Error;
        self.last_error = Some(cause);
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("WiFi setup failed: {0}")]
    Wifi(heapless::String<64>),
    #[error("Sensor error: {0}")]
    Sensor(heapless::String<64>),
    #[error("Network error: {0}")]
    Network(heapless::String<64>),
    #[error("Unknown error")]
    Unknown,
}

impl AppError {
    pub fn wifi(cause: impl fmt::Display) -> Self {
        Self::Wifi(detail(cause))
    }

    pub fn network(cause: impl fmt::Display) -> Self {
        Self::Network(detail(cause))
    }
}

impl From<SensorError> for AppError {
    fn from(e: SensorError) -> Self {
        Self::Sensor(detail(e))
    }
}

impl From<RetryError> for AppError {
    fn from(e: RetryError) -> Self {
        Self::wifi(e)
    }
}

impl From<ClientError> for AppError {
    fn from(e: ClientError) -> Self {
        Self::network(e)
    }
}

impl From<ServerError> for AppError {
    fn from(e: ServerError) -> Self {
        Self::network(e)
    }
}

/// Render `cause` into a fixed-capacity string, cutting it off at capacity.
pub fn detail<const N: usize>(cause: impl fmt::Display) -> heapless::String<N> {
    let mut out = heapless::String::new();
    let _ = write!(Truncating(&mut out), "{}", cause);
    out
}

struct Truncating<'a, const N: usize>(&'a mut heapless::String<N>);

impl<const N: usize> Write for Truncating<'_, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bring_up_moves_forward_only() {
        let mut state = AppState::new();

        assert!(state.advance(AppRunState::RadioStarting));
        assert!(state.advance(AppRunState::LinkUp));
        assert!(!state.advance(AppRunState::RadioStarting));
        assert!(state.advance(AppRunState::Serving));
        assert_eq!(state.run_state(), AppRunState::Serving);
    }

    #[test]
    fn test_error_is_terminal() {
        let mut state = AppState::new();
        state.advance(AppRunState::RadioStarting);

        state.fail(RetryError::Exhausted { attempts: 10 }.into());

        assert_eq!(state.run_state(), AppRunState::Error);
        assert!(!state.advance(AppRunState::Serving));
        assert_eq!(
            state.last_error().map(|e| matches!(e, AppError::Wifi(_))),
            Some(true)
        );
    }

    #[test]
    fn test_long_detail_is_truncated() {
        let error = AppError::from(SensorError::ReadFailed {
            sensor: "MPU6050",
            operation: "burst read of data registers",
            details: "I2C communication error",
        });

        let AppError::Sensor(text) = error else {
            panic!("expected a sensor error");
        };
        assert_eq!(text.len(), 64);
        assert!(text.starts_with("MPU6050 read failed during burst read"));
    }
}
