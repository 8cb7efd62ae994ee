//! Port traits: the boundary between the supervisor and the hardware.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ LinkManager / Session / Node
//! ```
//!
//! The radio driver, the MQTT client, the sensor, and the reset line are all
//! external collaborators with fixed contracts.  The supervisor consumes
//! them via generics, so the whole connectivity core runs on the host
//! against mocks.  ESP-IDF implementations live next to the component that
//! owns them and are gated on `target_os = "espidf"`.

use core::fmt;
use core::net::Ipv4Addr;

use crate::adapters::device_id::ClientId;
use crate::error::{Result, SensorError};
use crate::topics::Topic;

// ───────────────────────────────────────────────────────────────
// Radio port (station-mode WiFi interface)
// ───────────────────────────────────────────────────────────────

/// Station-mode radio driver.
pub trait Radio {
    /// Power the interface up or down.
    fn activate(&mut self, active: bool) -> core::result::Result<(), RadioError>;

    /// Begin association.  Returns as soon as the request is issued; the
    /// caller polls [`is_connected`](Self::is_connected).
    fn connect(&mut self, ssid: &str, secret: &str) -> core::result::Result<(), RadioError>;

    /// True once associated and holding an address.
    fn is_connected(&self) -> bool;

    /// Raw driver status code. See [`LinkStatus::from_code`].
    fn status(&self) -> i32;

    /// Address configuration of the interface.
    fn ifconfig(&self) -> IfConfig;

    /// Drop the association.
    fn disconnect(&mut self) -> core::result::Result<(), RadioError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// Interface could not be (de)activated.
    Activation,
    /// Driver rejected the SSID or secret.
    Credentials,
    /// Any other driver failure.
    Driver,
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Activation => write!(f, "interface activation failed"),
            Self::Credentials => write!(f, "driver rejected credentials"),
            Self::Driver => write!(f, "driver failure"),
        }
    }
}

/// Interface address configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfConfig {
    pub ip: Ipv4Addr,
    pub prefix_len: u8,
    pub gateway: Ipv4Addr,
    pub dns: Ipv4Addr,
}

impl IfConfig {
    pub const UNSPECIFIED: Self = Self {
        ip: Ipv4Addr::UNSPECIFIED,
        prefix_len: 0,
        gateway: Ipv4Addr::UNSPECIFIED,
        dns: Ipv4Addr::UNSPECIFIED,
    };
}

impl fmt::Display for IfConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ip={}/{} gw={} dns={}",
            self.ip, self.prefix_len, self.gateway, self.dns
        )
    }
}

/// Driver status table.
///
/// Codes follow the CYW43 driver convention so the same numbers show
/// up in logs regardless of which radio is underneath.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Idle,
    Connecting,
    WrongPassword,
    NoApFound,
    ConnectFail,
    GotIp,
    Unknown(i32),
}

impl LinkStatus {
    pub const IDLE: i32 = 0;
    pub const CONNECTING: i32 = 1;
    pub const WRONG_PASSWORD: i32 = -3;
    pub const NO_AP_FOUND: i32 = -2;
    pub const CONNECT_FAIL: i32 = -1;
    pub const GOT_IP: i32 = 3;

    /// Map a raw driver code. Unknown codes never fail.
    pub fn from_code(code: i32) -> Self {
        match code {
            Self::IDLE => Self::Idle,
            Self::CONNECTING => Self::Connecting,
            Self::WRONG_PASSWORD => Self::WrongPassword,
            Self::NO_AP_FOUND => Self::NoApFound,
            Self::CONNECT_FAIL => Self::ConnectFail,
            Self::GOT_IP => Self::GotIp,
            other => Self::Unknown(other),
        }
    }

    /// Human-readable reason. `Unknown` is handled by `Display`.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Idle => "No connection and no activity",
            Self::Connecting => "Connecting in progress",
            Self::WrongPassword => "Failed due to incorrect password",
            Self::NoApFound => "Failed because no access point replied",
            Self::ConnectFail => "Failed due to other problems",
            Self::GotIp => "Connection successful",
            Self::Unknown(_) => "Unknown status",
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "Unknown status: {code}"),
            known => f.write_str(known.reason()),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Pub/sub client port
// ───────────────────────────────────────────────────────────────

/// Everything the client needs to open a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub client_id: ClientId,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub secret: String,
    pub keep_alive_secs: u16,
}

/// One message taken off the broker connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: Topic,
    pub payload: heapless::Vec<u8, 128>,
}

/// Wire-level MQTT client.
///
/// The client has no callback slot of its own: [`check_msg`](Self::check_msg)
/// hands back at most one message and the session dispatches it.
pub trait PubSubClient {
    fn connect(&mut self, options: &SessionOptions) -> core::result::Result<(), ClientError>;

    fn disconnect(&mut self) -> core::result::Result<(), ClientError>;

    fn publish(&mut self, topic: &str, payload: &[u8]) -> core::result::Result<(), ClientError>;

    fn subscribe(&mut self, topic: &str) -> core::result::Result<(), ClientError>;

    /// Single non-blocking poll.  Must never wait for a message to arrive.
    fn check_msg(&mut self) -> core::result::Result<Option<InboundMessage>, ClientError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientError {
    /// Broker refused or never acknowledged the connection.
    ConnectRefused,
    /// Connection dropped underneath the client.
    ConnectionLost,
    /// Socket or driver level failure.
    Transport,
    /// Inbound message did not fit the receive buffers.
    Oversized,
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectRefused => write!(f, "connection refused"),
            Self::ConnectionLost => write!(f, "connection lost"),
            Self::Transport => write!(f, "transport error"),
            Self::Oversized => write!(f, "message too large"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Inbound message handler
// ───────────────────────────────────────────────────────────────

/// Target of the session's single dispatch slot.
pub trait MessageHandler {
    fn execute(&mut self, topic: &str, payload: &[u8]) -> Result<()>;
}

// ───────────────────────────────────────────────────────────────
// Sensor port
// ───────────────────────────────────────────────────────────────

/// Temperature/humidity sensor.  `measure()` refreshes the values returned
/// by the two getters.
pub trait SensorPort {
    fn measure(&mut self) -> core::result::Result<(), SensorError>;

    /// Last measured temperature in °C.
    fn temperature(&self) -> i32;

    /// Last measured relative humidity in %.
    fn humidity(&self) -> i32;
}

// ───────────────────────────────────────────────────────────────
// Reset port
// ───────────────────────────────────────────────────────────────

/// Full device reset.  On hardware this never returns.
pub trait ResetPort {
    fn reset(&mut self);
}
