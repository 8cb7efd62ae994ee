//! Crash-only fault recovery.
//!
//! There is no retry policy.  Any fault that reaches the top of the main
//! loop ends here:
//!
//! 1. Log `COMPONENT :: Kind<message>`.
//! 2. Wait the grace period so the line leaves the UART.
//! 3. Log `SYSTEM :: MACHINE<Resetting>`.
//! 4. Wait again, then reset the device.
//!
//! The caller is expected to have closed the broker session and dropped the
//! link before calling [`FaultRecovery::fatal`].

use embedded_hal::delay::DelayNs;
use log::error;

use crate::app::ports::ResetPort;
use crate::error::{Component, ConfigError, Error};

pub struct FaultRecovery<R, D> {
    reset: R,
    delay: D,
    grace_secs: u32,
}

impl<R: ResetPort, D: DelayNs> FaultRecovery<R, D> {
    pub fn new(reset: R, delay: D, grace_secs: u32) -> Result<Self, ConfigError> {
        if grace_secs < 1 {
            return Err(ConfigError::GracePeriodTooShort(grace_secs));
        }
        Ok(Self { reset, delay, grace_secs })
    }

    pub fn grace_secs(&self) -> u32 {
        self.grace_secs
    }

    /// Report `fault` and reset.  On hardware this never returns.
    pub fn fatal(&mut self, fault: &Error) {
        error!("{}", diagnostic_line(fault));
        self.delay.delay_ms(self.grace_secs.saturating_mul(1000));
        error!("{} :: MACHINE<Resetting>", Component::System);
        self.delay.delay_ms(self.grace_secs.saturating_mul(1000));
        self.reset.reset();
    }

    pub fn into_parts(self) -> (R, D) {
        (self.reset, self.delay)
    }
}

/// `COMPONENT :: Kind<message>`
pub fn diagnostic_line(fault: &Error) -> String {
    format!("{} :: {}<{}>", fault.component(), fault.kind(), fault)
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF reset
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct EspReset;

#[cfg(target_os = "espidf")]
impl ResetPort for EspReset {
    fn reset(&mut self) {
        esp_idf_svc::hal::reset::restart();
    }
}
