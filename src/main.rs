//! climanode firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  ESP-IDF adapters (outer ring)               │
//! │                                                              │
//! │  EspRadio      EspPubSub       PinDriver      EspReset       │
//! │  (Radio)       (PubSubClient)  (DHT11, LED)   (ResetPort)    │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  Node: LinkManager · Session · Actuator · Scheduler    │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  FaultRecovery (log, pause, reset)                           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use embedded_hal::digital::ErrorKind as PinErrorKind;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::{Ets, FreeRtos};
use esp_idf_svc::hal::gpio::{AnyIOPin, PinDriver, Pull};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys::EspError;
use log::{info, warn};

use climanode::actuation::Actuator;
use climanode::adapters::device_id;
use climanode::adapters::mqtt::{EspPubSub, Session};
use climanode::adapters::wifi::{EspRadio, LinkManager};
use climanode::app::node::{Node, NodeSettings};
use climanode::app::ports::RadioError;
use climanode::config::{NodeConfig, NodeRole};
use climanode::drivers::dht11::Dht11;
use climanode::error::{self, Error, SensorError};
use climanode::recovery::{EspReset, FaultRecovery};
use climanode::topics::Feeds;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  climanode v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Config, then run until the first fault ─────────────
    let (fault, grace_secs) = match NodeConfig::from_build_env() {
        Ok(config) => {
            info!("Role: {:?}, broker {}:{}", config.role, config.broker_host, config.broker_port);
            let (Ok(fault) | Err(fault)) = run_node(&config);
            (fault, config.fault_grace_secs)
        }
        Err(e) => (Error::from(e), NodeConfig::default().fault_grace_secs),
    };

    // ── 3. Crash-only recovery ────────────────────────────────
    let mut recovery = FaultRecovery::new(EspReset, FreeRtos, grace_secs)?;
    recovery.fatal(&fault);
    Ok(())
}

/// Log an ESP-IDF bring-up failure and turn it into `fault`.
fn bring_up(what: &'static str, fault: Error) -> impl FnOnce(EspError) -> Error {
    move |e| {
        warn!("BOOT: {} failed {}", what, e);
        fault
    }
}

/// Build every adapter and hand them to the node.  `Ok` carries the fault
/// that stopped the node, `Err` a fault raised while building it.
fn run_node(config: &NodeConfig) -> error::Result<Error> {
    let peripherals = Peripherals::take().map_err(bring_up("peripherals", Error::Platform("peripherals")))?;
    let sysloop = EspSystemEventLoop::take().map_err(bring_up("event loop", Error::Platform("event loop")))?;
    let nvs = EspDefaultNvsPartition::take().map_err(bring_up("nvs", Error::Platform("nvs")))?;

    // ── Link ──────────────────────────────────────────────────
    let radio = EspRadio::new(peripherals.modem, sysloop, nvs)
        .map_err(bring_up("wifi driver", RadioError::Driver.into()))?;
    let link = LinkManager::new(
        radio,
        FreeRtos,
        &config.wifi_ssid,
        &config.wifi_secret,
        config.wifi_timeout_secs,
    )?;

    // ── Session ───────────────────────────────────────────────
    let client_id = device_id::client_id(&device_id::read_mac());
    info!("Client ID: {}", client_id);
    let session = Session::new(EspPubSub::new(), config.session_options(client_id));
    let feeds = Feeds::new(&config.broker_user)?;

    // ── Output + sensor ───────────────────────────────────────
    // SAFETY: each GPIO number is claimed exactly once, here.
    let output = PinDriver::input_output(unsafe { AnyIOPin::new(config.output_gpio) })
        .map_err(bring_up("output pin", Error::Actuator(PinErrorKind::Other)))?;
    let actuator = Actuator::new(output, config.actuation_mode()?);

    let sensor = match config.role {
        NodeRole::Sensor => {
            let pin_fault = || bring_up("sensor pin", SensorError::Pin.into());
            let mut data = PinDriver::input_output_od(unsafe { AnyIOPin::new(config.sensor_gpio) })
                .map_err(pin_fault())?;
            data.set_pull(Pull::Up).map_err(pin_fault())?;
            data.set_high().map_err(pin_fault())?;
            Some(Dht11::new(data, Ets))
        }
        NodeRole::Alert => None,
    };

    // ── Node ──────────────────────────────────────────────────
    let settings = NodeSettings::from_config(config)?;
    let mut node = Node::new(link, session, actuator, sensor, feeds, settings, FreeRtos);
    Ok(node.run())
}
