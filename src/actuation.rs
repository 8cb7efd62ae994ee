//! Actuation dispatcher.
//!
//! The session's single dispatch slot holds an [`Actuator`]: an output pin
//! plus one of a closed set of behaviours.
//!
//! | Mode             | Payload            | Pin                              |
//! |------------------|--------------------|----------------------------------|
//! | `DirectSwitch`   | `ON` / `OFF`       | high / low, anything else ignored |
//! | `ThresholdAlert` | decimal integer    | high outside the band, low inside |
//!
//! The pin is read back before every write, so a command that matches the
//! current level is suppressed and the output never chatters.

use embedded_hal::digital::{Error as _, OutputPin, StatefulOutputPin};
use log::{debug, info};

use crate::app::ports::MessageHandler;
use crate::error::{ActuationError, ConfigError, Error, Result};

/// Inclusive band of acceptable readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeBand {
    low: i32,
    high: i32,
}

impl SafeBand {
    pub fn new(low: i32, high: i32) -> core::result::Result<Self, ConfigError> {
        if low > high {
            return Err(ConfigError::InvalidBand { low, high });
        }
        Ok(Self { low, high })
    }

    pub fn contains(&self, value: i32) -> bool {
        (self.low..=self.high).contains(&value)
    }

    pub fn low(&self) -> i32 {
        self.low
    }

    pub fn high(&self) -> i32 {
        self.high
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuationMode {
    DirectSwitch,
    ThresholdAlert(SafeBand),
}

/// Parse a threshold payload.  Surrounding whitespace is tolerated; anything
/// else that is not a decimal integer is a fault.
pub fn parse_reading(payload: &[u8]) -> core::result::Result<i32, ActuationError> {
    let text = core::str::from_utf8(payload).map_err(|_| ActuationError::NotUtf8)?;
    text.trim().parse().map_err(ActuationError::NotInteger)
}

/// Output pin driven by inbound messages.
pub struct Actuator<P> {
    pin: P,
    mode: ActuationMode,
}

impl<P: StatefulOutputPin> Actuator<P> {
    pub fn new(pin: P, mode: ActuationMode) -> Self {
        Self { pin, mode }
    }

    pub fn mode(&self) -> ActuationMode {
        self.mode
    }

    /// Drive the pin to `on`, unless it is already there.
    /// Returns whether a command was issued.
    fn drive(&mut self, on: bool) -> Result<bool> {
        let current = self.pin.is_set_high().map_err(|e| Error::Actuator(e.kind()))?;
        if current == on {
            return Ok(false);
        }
        let written = if on { self.pin.set_high() } else { self.pin.set_low() };
        written.map_err(|e| Error::Actuator(e.kind()))?;
        info!("LED: output {}", if on { "on" } else { "off" });
        Ok(true)
    }

    pub fn into_pin(self) -> P {
        self.pin
    }
}

impl<P: StatefulOutputPin> MessageHandler for Actuator<P> {
    fn execute(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        match self.mode {
            ActuationMode::DirectSwitch => match payload {
                b"ON" => self.drive(true).map(drop),
                b"OFF" => self.drive(false).map(drop),
                _ => {
                    debug!("LED: ignoring {:?} on {}", payload, topic);
                    Ok(())
                }
            },
            ActuationMode::ThresholdAlert(band) => {
                let reading = parse_reading(payload)?;
                debug!("LED: {} = {} (safe {}..={})", topic, reading, band.low, band.high);
                self.drive(!band.contains(reading)).map(drop)
            }
        }
    }
}
