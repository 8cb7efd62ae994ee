//! Peripheral drivers.

pub mod dht11;
