//! Unified error types for the climanode firmware.
//!
//! A single `Error` enum that every component converts into, so the main
//! loop has exactly one thing to hand to [`FaultRecovery`](crate::recovery::FaultRecovery).
//! Each variant knows which component raised it and what kind of fault it
//! is; the recovery policy formats both into the diagnostic line.

use core::fmt;
use core::num::ParseIntError;

use embedded_hal::digital::ErrorKind as PinErrorKind;

use crate::app::ports::{ClientError, LinkStatus, RadioError};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A setup value is missing or out of range. Raised before any
    /// connection attempt.
    Config(ConfigError),
    /// The radio did not associate within the configured timeout.
    LinkTimeout { status: LinkStatus },
    /// The radio driver itself failed.
    Radio(RadioError),
    /// Broker session failure, including guarded calls while disconnected.
    Session(SessionError),
    /// The sensor could not be read.
    Sensor(SensorError),
    /// An inbound actuation payload could not be parsed.
    ActuationParse(ActuationError),
    /// The output pin rejected a read or write.
    Actuator(PinErrorKind),
    /// A platform service could not be claimed at boot. Carries its name.
    Platform(&'static str),
}

/// The component a fault is attributed to in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    System,
    Wlan,
    Mqtt,
    Dht,
    Led,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "SYSTEM"),
            Self::Wlan => write!(f, "WLAN"),
            Self::Mqtt => write!(f, "MQTT"),
            Self::Dht => write!(f, "DHT11"),
            Self::Led => write!(f, "LED"),
        }
    }
}

impl Error {
    /// Component that raised the fault.
    pub fn component(&self) -> Component {
        match self {
            Self::Config(_) | Self::Platform(_) => Component::System,
            Self::LinkTimeout { .. } | Self::Radio(_) => Component::Wlan,
            Self::Session(_) => Component::Mqtt,
            Self::Sensor(_) => Component::Dht,
            Self::ActuationParse(_) | Self::Actuator(_) => Component::Led,
        }
    }

    /// Short fault-kind tag used in the diagnostic line.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "ConfigurationError",
            Self::LinkTimeout { .. } => "LinkTimeout",
            Self::Radio(_) => "RadioError",
            Self::Session(_) => "SessionFault",
            Self::Sensor(_) => "SensorFault",
            Self::ActuationParse(_) => "ActuationParseFault",
            Self::Actuator(_) => "ActuatorFault",
            Self::Platform(_) => "PlatformError",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::LinkTimeout { status } => write!(f, "link timeout: {status}"),
            Self::Radio(e) => write!(f, "radio: {e}"),
            Self::Session(e) => write!(f, "session: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::ActuationParse(e) => write!(f, "actuation: {e}"),
            Self::Actuator(kind) => write!(f, "output pin: {kind}"),
            Self::Platform(what) => write!(f, "platform: {what} unavailable"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A required value was not supplied. Carries the variable name.
    Missing(&'static str),
    /// A value was supplied but could not be parsed. Carries the variable name.
    Invalid(&'static str),
    /// SSID must be 1-32 printable ASCII bytes.
    InvalidSsid,
    /// Password must be empty (open network) or 8-64 bytes.
    InvalidPassword,
    /// Link association timeout below the 30 s floor.
    LinkTimeoutTooShort(u32),
    /// Poll interval below 1 s.
    PollIntervalTooShort(u32),
    /// Measurement interval below the 30 s broker rate-limit floor.
    MeasureIntervalTooShort(u32),
    /// Measurement interval is not a whole number of poll intervals.
    MeasureIntervalNotMultiple { poll: u32, measure: u32 },
    /// Safe band with `low > high`.
    InvalidBand { low: i32, high: i32 },
    /// Fault grace period below 1 s.
    GracePeriodTooShort(u32),
    /// `{namespace}/f/{feed}` does not fit a topic buffer.
    TopicTooLong,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(var) => write!(f, "{var} is not set"),
            Self::Invalid(var) => write!(f, "{var} is invalid"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes, or empty for open)")
            }
            Self::LinkTimeoutTooShort(t) => write!(f, "link timeout {t}s must be at least 30s"),
            Self::PollIntervalTooShort(p) => write!(f, "poll interval {p}s must be at least 1s"),
            Self::MeasureIntervalTooShort(m) => {
                write!(f, "measure interval {m}s must be at least 30s")
            }
            Self::MeasureIntervalNotMultiple { poll, measure } => {
                write!(f, "measure interval {measure}s is not a multiple of poll interval {poll}s")
            }
            Self::InvalidBand { low, high } => write!(f, "safe band [{low},{high}] is empty"),
            Self::GracePeriodTooShort(g) => write!(f, "grace period {g}s must be at least 1s"),
            Self::TopicTooLong => write!(f, "topic exceeds buffer"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// A guarded operation ran while the session flag was clear.
    NotConnected,
    /// The underlying client failed during `op`.
    Client { op: &'static str, source: ClientError },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "Not connected"),
            Self::Client { op, source } => write!(f, "{op} failed: {source}"),
        }
    }
}

impl From<SessionError> for Error {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

impl From<RadioError> for Error {
    fn from(e: RadioError) -> Self {
        Self::Radio(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The sensor did not answer within the protocol window.
    Timeout,
    /// The frame checksum did not match.
    Checksum,
    /// The data pin rejected a read or write.
    Pin,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "read timed out"),
            Self::Checksum => write!(f, "checksum mismatch"),
            Self::Pin => write!(f, "data pin error"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActuationError {
    /// Payload is not valid UTF-8.
    NotUtf8,
    /// Payload is not a decimal integer.
    NotInteger(ParseIntError),
}

impl fmt::Display for ActuationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotUtf8 => write!(f, "payload is not UTF-8"),
            Self::NotInteger(e) => write!(f, "payload is not an integer ({e})"),
        }
    }
}

impl From<ActuationError> for Error {
    fn from(e: ActuationError) -> Self {
        Self::ActuationParse(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
