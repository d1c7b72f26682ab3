//! CPU/RAM severity state machine.
//!
//! Three states with a debounce counter on the way up:
//!
//! ```text
//! critical sample, not yet ALARM:
//!   streak < CRITICAL_STREAK  → WARNING, streak += 1 (no notification)
//!   streak == CRITICAL_STREAK → ALARM, notify
//! critical sample, already ALARM → stay, reset streak (already notified)
//! warning sample  → WARNING, reset streak
//! normal sample   → NORMAL, reset streak, notify iff leaving ALARM
//! ```
//!
//! A sample that straddles the bands ambiguously (e.g. exactly on a
//! threshold) maps to no band and retains the prior state.

use std::time::Duration;

use crate::config::{CpuRamConfig, IntervalTable};

/// Consecutive critical samples required before declaring ALARM.
pub const CRITICAL_STREAK: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Normal,
    Warning,
    Alarm,
}

/// Band classification of a single sample, in priority order: a critical
/// reading on either resource wins over a warning reading on the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Critical,
    Warning,
    Normal,
    /// Neither band matched (boundary equality). Treated as a no-op.
    Indeterminate,
}

pub fn classify(cpu: f64, ram: f64, config: &CpuRamConfig) -> Band {
    if cpu > config.cpu_high || ram > config.ram_high {
        Band::Critical
    } else if (config.cpu_low < cpu && cpu < config.cpu_high)
        || (config.ram_low < ram && ram < config.ram_high)
    {
        Band::Warning
    } else if cpu < config.cpu_low && ram < config.ram_low {
        Band::Normal
    } else {
        Band::Indeterminate
    }
}

#[derive(Debug, Clone)]
pub struct CpuRamState {
    status: Status,
    critical_streak: u32,
}

impl Default for CpuRamState {
    fn default() -> Self {
        CpuRamState {
            status: Status::Normal,
            critical_streak: 0,
        }
    }
}

impl CpuRamState {
    pub fn status(&self) -> Status {
        self.status
    }

    pub fn critical_streak(&self) -> u32 {
        self.critical_streak
    }

    /// Feed one sample. Returns whether a notification should fire: once on
    /// entering ALARM, once on recovering from it.
    pub fn observe(&mut self, cpu: f64, ram: f64, config: &CpuRamConfig) -> bool {
        match classify(cpu, ram, config) {
            Band::Critical => {
                if self.status == Status::Alarm {
                    self.critical_streak = 0;
                    return false;
                }

                self.critical_streak += 1;
                if self.critical_streak >= CRITICAL_STREAK {
                    self.status = Status::Alarm;
                    self.critical_streak = 0;
                    return true;
                }

                self.status = Status::Warning;
                false
            }

            Band::Warning => {
                self.status = Status::Warning;
                self.critical_streak = 0;
                false
            }

            Band::Normal => {
                let recovered = self.status == Status::Alarm;
                self.status = Status::Normal;
                self.critical_streak = 0;
                recovered
            }

            Band::Indeterminate => false,
        }
    }

    /// Poll cadence derived from the current state. Polling accelerates
    /// under stress.
    pub fn poll_interval(&self, table: &IntervalTable) -> Duration {
        let secs = match self.status {
            Status::Normal => table.normal,
            Status::Warning => table.warning,
            Status::Alarm => table.critical,
        };
        Duration::from_secs(secs)
    }
}
