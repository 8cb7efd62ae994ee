//! Node configuration.
//!
//! All tunable parameters for a climanode device.  Credentials and broker
//! endpoint are baked in at build time from `CLIMANODE_*` environment
//! variables; everything else has a default.  The configuration is loaded
//! once at boot and validated before any connection attempt. There is no
//! persisted state across resets.

use serde::{Deserialize, Serialize};

use crate::actuation::{ActuationMode, SafeBand};
use crate::adapters::device_id::ClientId;
use crate::adapters::wifi::{validate_password, validate_ssid};
use crate::app::ports::SessionOptions;
use crate::error::ConfigError;
use crate::pins;
use crate::scheduler::Cadence;
use crate::topics::{Feed, Feeds};

/// Minimum link association timeout.
pub const MIN_LINK_TIMEOUT_SECS: u32 = 30;

/// What the node does besides servicing its inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Measures and publishes on the slow cadence.
    Sensor,
    /// Inbox only: reacts to readings published by other nodes.
    Alert,
}

/// Inclusive safe band for threshold alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandConfig {
    pub low: i32,
    pub high: i32,
}

/// Core node configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    // --- WiFi ---
    pub wifi_ssid: String,
    /// Empty for an open network.
    pub wifi_secret: String,
    /// Association wait bound (seconds)
    pub wifi_timeout_secs: u32,

    // --- Broker ---
    pub broker_host: String,
    pub broker_port: u16,
    /// Broker user; doubles as the feed namespace.
    pub broker_user: String,
    pub broker_secret: String,
    pub keep_alive_secs: u16,

    // --- Behaviour ---
    pub role: NodeRole,
    /// `Some` selects threshold alerting on the temperature feed,
    /// `None` selects direct ON/OFF switching on the led feed.
    pub alert_band: Option<BandConfig>,
    /// Also publish a combined JSON reading on the sensor feed.
    pub publish_combined: bool,

    // --- Pins ---
    pub sensor_gpio: i32,
    pub output_gpio: i32,

    // --- Timing ---
    /// Inbox poll cadence (seconds)
    pub poll_interval_secs: u32,
    /// Measure + publish cadence (seconds)
    pub measure_interval_secs: u32,
    /// Pause before and after the reset notice (seconds)
    pub fault_grace_secs: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: String::new(),
            wifi_secret: String::new(),
            wifi_timeout_secs: 30,

            broker_host: String::new(),
            broker_port: 1883,
            broker_user: String::new(),
            broker_secret: String::new(),
            keep_alive_secs: 60,

            role: NodeRole::Sensor,
            alert_band: None,
            publish_combined: false,

            sensor_gpio: pins::DHT_DATA_GPIO,
            output_gpio: pins::OUTPUT_GPIO,

            poll_interval_secs: 1,     // 1 Hz inbox
            measure_interval_secs: 30, // broker rate limit
            fault_grace_secs: 1,
        }
    }
}

/// Raw build-time values, one per `CLIMANODE_*` variable.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildVars<'a> {
    pub wifi_ssid: Option<&'a str>,
    pub wifi_secret: Option<&'a str>,
    pub broker_host: Option<&'a str>,
    pub broker_port: Option<&'a str>,
    pub broker_user: Option<&'a str>,
    pub broker_secret: Option<&'a str>,
    pub role: Option<&'a str>,
    pub alert_band: Option<&'a str>,
}

impl NodeConfig {
    /// Load the configuration baked in at compile time.
    pub fn from_build_env() -> Result<Self, ConfigError> {
        Self::from_vars(&BuildVars {
            wifi_ssid: option_env!("CLIMANODE_WIFI_SSID"),
            wifi_secret: option_env!("CLIMANODE_WIFI_SECRET"),
            broker_host: option_env!("CLIMANODE_BROKER_HOST"),
            broker_port: option_env!("CLIMANODE_BROKER_PORT"),
            broker_user: option_env!("CLIMANODE_BROKER_USER"),
            broker_secret: option_env!("CLIMANODE_BROKER_SECRET"),
            role: option_env!("CLIMANODE_ROLE"),
            alert_band: option_env!("CLIMANODE_ALERT_BAND"),
        })
    }

    /// Build and validate a configuration from raw values.
    pub fn from_vars(vars: &BuildVars<'_>) -> Result<Self, ConfigError> {
        let required = |value: Option<&str>, name: &'static str| {
            value.map(str::to_owned).ok_or(ConfigError::Missing(name))
        };

        let mut config = Self {
            wifi_ssid: required(vars.wifi_ssid, "CLIMANODE_WIFI_SSID")?,
            wifi_secret: required(vars.wifi_secret, "CLIMANODE_WIFI_SECRET")?,
            broker_host: required(vars.broker_host, "CLIMANODE_BROKER_HOST")?,
            broker_user: required(vars.broker_user, "CLIMANODE_BROKER_USER")?,
            broker_secret: required(vars.broker_secret, "CLIMANODE_BROKER_SECRET")?,
            ..Self::default()
        };

        if let Some(port) = vars.broker_port {
            config.broker_port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("CLIMANODE_BROKER_PORT"))?;
        }
        if let Some(role) = vars.role {
            config.role = match role.trim() {
                "sensor" => NodeRole::Sensor,
                "alert" => NodeRole::Alert,
                _ => return Err(ConfigError::Invalid("CLIMANODE_ROLE")),
            };
        }
        if let Some(band) = vars.alert_band {
            config.alert_band = Some(parse_band(band)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check every invariant.  Called before anything touches the radio.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_ssid(&self.wifi_ssid)?;
        validate_password(&self.wifi_secret)?;
        if self.wifi_timeout_secs < MIN_LINK_TIMEOUT_SECS {
            return Err(ConfigError::LinkTimeoutTooShort(self.wifi_timeout_secs));
        }
        if self.broker_host.is_empty() {
            return Err(ConfigError::Missing("CLIMANODE_BROKER_HOST"));
        }
        if self.broker_user.is_empty() || self.broker_secret.is_empty() {
            return Err(ConfigError::Missing("broker credentials"));
        }
        Feeds::new(&self.broker_user)?;
        self.cadence()?;
        self.actuation_mode()?;
        if self.fault_grace_secs < 1 {
            return Err(ConfigError::GracePeriodTooShort(self.fault_grace_secs));
        }
        Ok(())
    }

    pub fn cadence(&self) -> Result<Cadence, ConfigError> {
        Cadence::new(self.poll_interval_secs, self.measure_interval_secs)
    }

    pub fn actuation_mode(&self) -> Result<ActuationMode, ConfigError> {
        match self.alert_band {
            Some(BandConfig { low, high }) => Ok(ActuationMode::ThresholdAlert(SafeBand::new(low, high)?)),
            None => Ok(ActuationMode::DirectSwitch),
        }
    }

    /// Feed the actuator listens on.
    pub fn actuation_feed(&self) -> Feed {
        if self.alert_band.is_some() {
            Feed::Temperature
        } else {
            Feed::Led
        }
    }

    pub fn session_options(&self, client_id: ClientId) -> SessionOptions {
        SessionOptions {
            client_id,
            host: self.broker_host.clone(),
            port: self.broker_port,
            user: self.broker_user.clone(),
            secret: self.broker_secret.clone(),
            keep_alive_secs: self.keep_alive_secs,
        }
    }
}

/// Parse `low,high`.
fn parse_band(raw: &str) -> Result<BandConfig, ConfigError> {
    let invalid = ConfigError::Invalid("CLIMANODE_ALERT_BAND");
    let (low, high) = raw.split_once(',').ok_or(invalid)?;
    let low = low.trim().parse().map_err(|_| invalid)?;
    let high = high.trim().parse().map_err(|_| invalid)?;
    Ok(BandConfig { low, high })
}
