//! Dual-cadence tick scheduler.
//!
//! Every tick services the inbox; only ticks that land on a measurement
//! boundary also measure and publish.  The scheduler notifies a
//! [`TickDelegate`] and knows nothing about sessions or sensors, so the
//! rate-limit gate is testable on its own.
//!
//! ```text
//!   tick ──▶ on_poll()          every tick
//!        └─▶ on_measure()       elapsed % measure_interval == 0
//!   advance: elapsed += poll_interval
//! ```
//!
//! Elapsed time is `ticks × poll_interval`, not wall-clock time, so the
//! gate stays deterministic when a tick overruns.

use crate::error::{ConfigError, Result};

/// Poll and measurement intervals, validated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    poll_interval_secs: u32,
    measure_interval_secs: u32,
}

impl Cadence {
    pub const MIN_POLL_SECS: u32 = 1;
    /// Broker rate-limit floor.
    pub const MIN_MEASURE_SECS: u32 = 30;

    pub fn new(poll_interval_secs: u32, measure_interval_secs: u32) -> core::result::Result<Self, ConfigError> {
        if poll_interval_secs < Self::MIN_POLL_SECS {
            return Err(ConfigError::PollIntervalTooShort(poll_interval_secs));
        }
        if measure_interval_secs < Self::MIN_MEASURE_SECS {
            return Err(ConfigError::MeasureIntervalTooShort(measure_interval_secs));
        }
        if measure_interval_secs % poll_interval_secs != 0 {
            return Err(ConfigError::MeasureIntervalNotMultiple {
                poll: poll_interval_secs,
                measure: measure_interval_secs,
            });
        }
        Ok(Self {
            poll_interval_secs,
            measure_interval_secs,
        })
    }

    pub fn poll_interval_secs(&self) -> u32 {
        self.poll_interval_secs
    }

    pub fn measure_interval_secs(&self) -> u32 {
        self.measure_interval_secs
    }
}

/// Callbacks the scheduler drives each tick.
pub trait TickDelegate {
    /// Service the inbox.  Runs on every tick, always first.
    fn on_poll(&mut self) -> Result<()>;

    /// Measure and publish.  Runs only on measurement ticks.
    fn on_measure(&mut self) -> Result<()>;
}

/// The rate-limit gate.
#[derive(Debug, Clone)]
pub struct Scheduler {
    cadence: Cadence,
    ticks: u64,
    elapsed_secs: u64,
}

impl Scheduler {
    pub fn new(cadence: Cadence) -> Self {
        Self {
            cadence,
            ticks: 0,
            elapsed_secs: 0,
        }
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    /// True when the current tick lands on a measurement boundary.
    pub fn measurement_due(&self) -> bool {
        self.elapsed_secs % u64::from(self.cadence.measure_interval_secs) == 0
    }

    /// Run one tick.  Returns whether the measurement path ran.
    ///
    /// A delegate error aborts the tick without advancing; the caller treats
    /// it as fatal.
    pub fn tick(&mut self, delegate: &mut dyn TickDelegate) -> Result<bool> {
        delegate.on_poll()?;

        let measured = self.measurement_due();
        if measured {
            delegate.on_measure()?;
        }

        self.ticks += 1;
        self.elapsed_secs += u64::from(self.cadence.poll_interval_secs);
        Ok(measured)
    }
}
