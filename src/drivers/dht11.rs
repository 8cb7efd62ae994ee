//! DHT11 temperature/humidity sensor.
//!
//! The single-wire exchange (start pulse, response, 40 data bits, checksum)
//! is driven by `dht_sensor::dht11::blocking::read`; this module adapts it
//! to [`SensorPort`] and keeps the last good reading.
//!
//! The DHT11 reports whole units only.  The data pin must be open-drain
//! with a pull-up so the same driver can both pull the line low and sample
//! it, and `delay_us` must busy-wait (`Ets` on ESP-IDF).

use dht_sensor::{DhtError, dht11};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::debug;

use crate::app::ports::SensorPort;
use crate::error::SensorError;

pub struct Dht11<P, D> {
    pin: P,
    delay: D,
    temperature: i32,
    humidity: i32,
}

impl<P: InputPin + OutputPin, D: DelayNs> Dht11<P, D> {
    pub fn new(pin: P, delay: D) -> Self {
        Self {
            pin,
            delay,
            temperature: 0,
            humidity: 0,
        }
    }
}

fn sensor_error<E>(e: DhtError<E>) -> SensorError {
    match e {
        DhtError::Timeout => SensorError::Timeout,
        DhtError::ChecksumMismatch => SensorError::Checksum,
        DhtError::PinError(_) => SensorError::Pin,
    }
}

impl<P: InputPin + OutputPin, D: DelayNs> SensorPort for Dht11<P, D> {
    fn measure(&mut self) -> Result<(), SensorError> {
        let reading = dht11::blocking::read(&mut self.delay, &mut self.pin).map_err(sensor_error)?;
        self.temperature = i32::from(reading.temperature);
        self.humidity = i32::from(reading.relative_humidity);
        debug!("DHT11: {}C {}%", self.temperature, self.humidity);
        Ok(())
    }

    fn temperature(&self) -> i32 {
        self.temperature
    }

    fn humidity(&self) -> i32 {
        self.humidity
    }
}
