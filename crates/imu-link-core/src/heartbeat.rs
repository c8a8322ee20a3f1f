//! Periodic liveness indicator.
//!
//! A single task owns the indicator pin and sleeps until the armed deadline.
//! Every change to the schedule happens inside one critical section, and the
//! runner is woken through a signal whenever the schedule changes, so a
//! `disable` can never race with a toggle.

use core::cell::Cell;

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use embedded_hal::digital::{OutputPin, PinState};
use log::{info, warn};

const DISABLED: Duration = Duration::from_ticks(0);

#[derive(Debug, Clone, Copy)]
struct Schedule {
    interval: Duration,
    deadline: Option<Instant>,
    level: bool,
}

pub struct Heartbeat {
    schedule: Mutex<CriticalSectionRawMutex, Cell<Schedule>>,
    rearm: Signal<CriticalSectionRawMutex, ()>,
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new()
    }
}

impl Heartbeat {
    /// A disabled heartbeat; nothing toggles until [`Heartbeat::init`].
    pub const fn new() -> Self {
        Self {
            schedule: Mutex::new(Cell::new(Schedule {
                interval: DISABLED,
                deadline: None,
                level: false,
            })),
            rearm: Signal::new(),
        }
    }

    /// Toggle every `interval_seconds`, first toggle one interval from now.
    /// Zero disables.
    pub fn init(&self, interval_seconds: u32) {
        self.arm(Duration::from_secs(interval_seconds as u64));
    }

    pub fn arm(&self, interval: Duration) {
        if interval == DISABLED {
            self.disable();
            return;
        }

        let deadline = Instant::now() + interval;
        self.schedule.lock(|schedule| {
            let mut next = schedule.get();
            next.interval = interval;
            next.deadline = Some(deadline);
            schedule.set(next);
        });
        self.rearm.signal(());
        info!("Heartbeat armed every {} ms", interval.as_millis());
    }

    /// Cancel the pending toggle and stop rescheduling.
    pub fn disable(&self) {
        self.schedule.lock(|schedule| {
            let mut next = schedule.get();
            next.interval = DISABLED;
            next.deadline = None;
            schedule.set(next);
        });
        self.rearm.signal(());
    }

    pub fn is_enabled(&self) -> bool {
        self.schedule.lock(|schedule| schedule.get().interval != DISABLED)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.schedule.lock(|schedule| schedule.get().deadline)
    }

    /// Handle an elapsed deadline observed at `now`.
    ///
    /// Returns the level to drive and re-arms at `now + interval`, or `None`
    /// when the heartbeat has been disabled in the meantime.
    pub fn fire(&self, now: Instant) -> Option<bool> {
        self.schedule.lock(|schedule| {
            let mut next = schedule.get();
            if next.interval == DISABLED {
                return None;
            }
            let level = next.level;
            next.level = !level;
            next.deadline = Some(now + next.interval);
            schedule.set(next);
            Some(level)
        })
    }

    /// Drive `indicator` from the schedule. Runs forever.
    pub async fn run<P: OutputPin>(&self, indicator: &mut P) -> ! {
        loop {
            let Some(deadline) = self.deadline() else {
                self.rearm.wait().await;
                continue;
            };

            if let Either::First(()) = select(Timer::at(deadline), self.rearm.wait()).await {
                if let Some(level) = self.fire(Instant::now()) {
                    if let Err(e) = indicator.set_state(PinState::from(level)) {
                        warn!("Heartbeat indicator write failed: {:?}", e);
                    }
                }
            }
        }
    }
}
