//! Firmware-specific application state extensions
//!
//! Re-exports the hardware-independent app state from `imu_link_core` and
//! adds ESP32-specific hardware initialization and a shared run-state cell.

mod hardware;

pub use hardware::*;

// Re-export all shared app state types from imu-link-core
pub use imu_link_core::app_state::*;

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Timer};

/// Run state shared between `main` and the spawned tasks.
pub type SharedAppState = Mutex<CriticalSectionRawMutex, RefCell<AppState>>;

pub fn advance(state: &SharedAppState, next: AppRunState) {
    state.lock(|state| {
        state.borrow_mut().advance(next);
    });
}

pub fn fail(state: &SharedAppState, cause: AppError) {
    state.lock(|state| state.borrow_mut().fail(cause));
}

/// Stop making progress after a fatal bring-up error. Tasks that were
/// already spawned keep running.
pub async fn park() -> ! {
    loop {
        Timer::after(Duration::from_secs(60)).await;
    }
}
