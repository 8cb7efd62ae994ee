//! WiFi station-mode link manager.
//!
//! [`LinkManager`] owns a [`Radio`] and runs the link state machine:
//!
//! ```text
//!   Idle ──connect()──▶ Connecting ──is_connected──▶ Connected
//!                            │
//!                            └── elapsed > timeout ──▶ Failed (LinkTimeout)
//! ```
//!
//! ## Reconnection policy
//!
//! There is none beyond the single bounded wait.  `check_connection()` is
//! called once per scheduler tick and re-runs `connect()` if the link
//! dropped; if that wait times out the fault goes to the recovery policy
//! and the device resets.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: [`EspRadio`] wraps `esp_idf_svc::wifi::EspWifi`.
//! - **all other targets**: tests supply their own `Radio`.

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::app::ports::{LinkStatus, Radio};
use crate::config::MIN_LINK_TIMEOUT_SECS;
use crate::error::{ConfigError, Error, Result};

// ───────────────────────────────────────────────────────────────
// Link state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Connecting,
    Connected,
    Failed,
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

pub fn validate_ssid(ssid: &str) -> core::result::Result<(), ConfigError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConfigError::InvalidSsid);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> core::result::Result<(), ConfigError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConfigError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Disconnect reasons
// ───────────────────────────────────────────────────────────────

/// `wifi_err_reason_t` codes that say the credentials were refused.
const REASON_AUTH: [u16; 3] = [15, 202, 204];
/// `wifi_err_reason_t` codes that say nobody answered.
const REASON_NO_AP: [u16; 4] = [201, 210, 211, 212];

/// Map an ESP-IDF station disconnect reason onto the link status table.
pub fn status_from_disconnect_reason(reason: u16) -> i32 {
    if REASON_AUTH.contains(&reason) {
        LinkStatus::WRONG_PASSWORD
    } else if REASON_NO_AP.contains(&reason) {
        LinkStatus::NO_AP_FOUND
    } else {
        LinkStatus::CONNECT_FAIL
    }
}

// ───────────────────────────────────────────────────────────────
// Link manager
// ───────────────────────────────────────────────────────────────

pub struct LinkManager<R, D> {
    radio: R,
    delay: D,
    ssid: heapless::String<32>,
    secret: heapless::String<64>,
    timeout_secs: u32,
    state: LinkState,
    /// Seconds waited during the most recent association.
    elapsed_secs: u32,
    last_status: LinkStatus,
}

impl<R: Radio, D: DelayNs> LinkManager<R, D> {
    /// Validate credentials and timeout.  Nothing touches the radio here.
    pub fn new(radio: R, delay: D, ssid: &str, secret: &str, timeout_secs: u32) -> Result<Self> {
        if timeout_secs < MIN_LINK_TIMEOUT_SECS {
            return Err(ConfigError::LinkTimeoutTooShort(timeout_secs).into());
        }
        validate_ssid(ssid)?;
        validate_password(secret)?;

        let mut ssid_buf = heapless::String::new();
        ssid_buf.push_str(ssid).map_err(|()| ConfigError::InvalidSsid)?;
        let mut secret_buf = heapless::String::new();
        secret_buf.push_str(secret).map_err(|()| ConfigError::InvalidPassword)?;

        Ok(Self {
            radio,
            delay,
            ssid: ssid_buf,
            secret: secret_buf,
            timeout_secs,
            state: LinkState::Idle,
            elapsed_secs: 0,
            last_status: LinkStatus::Idle,
        })
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn timeout_secs(&self) -> u32 {
        self.timeout_secs
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn last_status(&self) -> LinkStatus {
        self.last_status
    }

    pub fn is_connected(&self) -> bool {
        self.radio.is_connected()
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    fn refresh_status(&mut self) -> LinkStatus {
        self.last_status = LinkStatus::from_code(self.radio.status());
        self.last_status
    }

    /// Associate, waiting at most `timeout_secs`.  No-op when already linked.
    pub fn connect(&mut self) -> Result<()> {
        if self.radio.is_connected() {
            self.state = LinkState::Connected;
            return Ok(());
        }

        let status = self.refresh_status();
        info!("WLAN: connecting to '{}' ({})", self.ssid, status);
        self.state = LinkState::Connecting;
        self.elapsed_secs = 0;

        if let Err(e) = self
            .radio
            .activate(true)
            .and_then(|()| self.radio.connect(&self.ssid, &self.secret))
        {
            self.state = LinkState::Failed;
            return Err(e.into());
        }

        while !self.radio.is_connected() {
            debug!("WLAN: connecting... ({}s)", self.elapsed_secs);
            self.delay.delay_ms(1000);
            self.elapsed_secs += 1;
            if self.elapsed_secs > self.timeout_secs {
                self.state = LinkState::Failed;
                let status = self.refresh_status();
                return Err(Error::LinkTimeout { status });
            }
        }

        self.state = LinkState::Connected;
        let status = self.refresh_status();
        info!("WLAN: {}", status);
        info!("WLAN: connected <{}>", self.radio.ifconfig());
        Ok(())
    }

    /// Lazy reconnect, called once per tick.
    pub fn check_connection(&mut self) -> Result<()> {
        if self.radio.is_connected() {
            return Ok(());
        }
        let status = self.refresh_status();
        warn!("WLAN: link lost ({}), reconnecting", status);
        self.connect()
    }

    /// Tear the link down if it is up.
    pub fn disconnect(&mut self) -> Result<()> {
        if !self.radio.is_connected() {
            return Ok(());
        }
        info!("WLAN: disconnecting");
        self.radio.disconnect()?;
        self.radio.activate(false)?;
        self.state = LinkState::Idle;
        let status = self.refresh_status();
        info!("WLAN: {}", status);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF radio
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::EspRadio;

#[cfg(target_os = "espidf")]
mod esp {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI32, Ordering};

    use esp_idf_svc::eventloop::{EspSubscription, EspSystemEventLoop, System};
    use esp_idf_svc::hal::modem::Modem;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::sys::EspError;
    use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi, WifiEvent};
    use log::{debug, warn};

    use super::status_from_disconnect_reason;
    use crate::app::ports::{IfConfig, LinkStatus, Radio, RadioError};

    /// No disconnect seen since the last `connect`.
    const NO_REASON: i32 = i32::MIN;

    /// Station interface on the ESP32 modem.
    ///
    /// ESP-IDF has no single status register like the CYW43, so the status
    /// code is synthesised from the driver flags plus the reason carried by
    /// the last `StaDisconnected` event.
    pub struct EspRadio {
        wifi: EspWifi<'static>,
        connecting: bool,
        last_failure: Arc<AtomicI32>,
        _events: EspSubscription<'static, System>,
    }

    impl EspRadio {
        pub fn new(
            modem: Modem,
            sysloop: EspSystemEventLoop,
            nvs: EspDefaultNvsPartition,
        ) -> Result<Self, EspError> {
            let last_failure = Arc::new(AtomicI32::new(NO_REASON));
            let sink = last_failure.clone();
            let events = sysloop.subscribe::<WifiEvent, _>(move |event: WifiEvent| match event {
                WifiEvent::StaDisconnected(info) => {
                    debug!("WLAN: disconnected, reason {}", info.reason());
                    sink.store(status_from_disconnect_reason(info.reason()), Ordering::Relaxed);
                }
                WifiEvent::StaConnected(_) => sink.store(NO_REASON, Ordering::Relaxed),
                _ => {}
            })?;

            Ok(Self {
                wifi: EspWifi::new(modem, sysloop, Some(nvs))?,
                connecting: false,
                last_failure,
                _events: events,
            })
        }
    }

    fn driver(e: EspError) -> RadioError {
        warn!("WLAN: driver error {}", e);
        RadioError::Driver
    }

    impl Radio for EspRadio {
        fn activate(&mut self, active: bool) -> Result<(), RadioError> {
            let result = if active { self.wifi.start() } else { self.wifi.stop() };
            result.map_err(|e| {
                warn!("WLAN: activation failed {}", e);
                RadioError::Activation
            })
        }

        fn connect(&mut self, ssid: &str, secret: &str) -> Result<(), RadioError> {
            let auth_method = if secret.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            };
            let config = Configuration::Client(ClientConfiguration {
                ssid: ssid.try_into().map_err(|_| RadioError::Credentials)?,
                password: secret.try_into().map_err(|_| RadioError::Credentials)?,
                auth_method,
                ..Default::default()
            });
            self.wifi.set_configuration(&config).map_err(driver)?;
            self.last_failure.store(NO_REASON, Ordering::Relaxed);
            self.wifi.connect().map_err(driver)?;
            self.connecting = true;
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.wifi.is_up().unwrap_or(false)
        }

        fn status(&self) -> i32 {
            if self.wifi.is_up().unwrap_or(false) {
                return LinkStatus::GOT_IP;
            }
            let failure = self.last_failure.load(Ordering::Relaxed);
            if self.connecting && failure != NO_REASON {
                failure
            } else if self.wifi.is_connected().unwrap_or(false) || self.connecting {
                LinkStatus::CONNECTING
            } else if self.wifi.is_started().unwrap_or(false) {
                LinkStatus::IDLE
            } else {
                LinkStatus::CONNECT_FAIL
            }
        }

        fn ifconfig(&self) -> IfConfig {
            match self.wifi.sta_netif().get_ip_info() {
                Ok(info) => IfConfig {
                    ip: info.ip,
                    prefix_len: info.subnet.mask.0,
                    gateway: info.subnet.gateway,
                    dns: info.dns.unwrap_or(core::net::Ipv4Addr::UNSPECIFIED),
                },
                Err(_) => IfConfig::UNSPECIFIED,
            }
        }

        fn disconnect(&mut self) -> Result<(), RadioError> {
            self.connecting = false;
            self.wifi.disconnect().map_err(driver)
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
