//! The node main loop.
//!
//! [`Node`] composes the link manager, the broker session, the optional
//! sensor and the actuator behind the session's dispatch slot.  It owns the
//! [`Scheduler`] and is the only thing that sleeps between ticks.
//!
//! ```text
//!   start:  link.connect ─▶ session.connect ─▶ session.subscribe(feed, actuator)
//!   tick:   link.check_connection ─▶ session.update
//!           └─ gate ─▶ sensor.measure ─▶ publish humidity ─▶ publish temperature
//!   exit:   session.disconnect ─▶ link.disconnect ─▶ return fault
//! ```
//!
//! `run()` has no success path.  The fault it returns goes straight to
//! [`FaultRecovery`](crate::recovery::FaultRecovery).

use core::fmt::Write;

use embedded_hal::delay::DelayNs;
use log::{info, warn};
use serde::Serialize;

use crate::adapters::mqtt::Session;
use crate::adapters::wifi::LinkManager;
use crate::app::ports::{MessageHandler, PubSubClient, Radio, SensorPort};
use crate::config::NodeConfig;
use crate::error::{ConfigError, Error, Result};
use crate::scheduler::{Cadence, Scheduler, TickDelegate};
use crate::topics::{Feed, Feeds};

/// Combined reading published on the sensor feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reading {
    pub temperature: i32,
    pub humidity: i32,
}

/// Loop settings taken from [`NodeConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSettings {
    pub cadence: Cadence,
    /// Feed the actuator is subscribed to.
    pub actuation_feed: Feed,
    pub publish_combined: bool,
}

impl NodeSettings {
    pub fn from_config(config: &NodeConfig) -> core::result::Result<Self, ConfigError> {
        Ok(Self {
            cadence: config.cadence()?,
            actuation_feed: config.actuation_feed(),
            publish_combined: config.publish_combined,
        })
    }
}

pub struct Node<R, LD, C, H, S, D> {
    link: LinkManager<R, LD>,
    session: Session<C, H>,
    /// Handed to the session on start.
    handler: Option<H>,
    sensor: Option<S>,
    feeds: Feeds,
    settings: NodeSettings,
    scheduler: Scheduler,
    delay: D,
}

impl<R, LD, C, H, S, D> Node<R, LD, C, H, S, D>
where
    R: Radio,
    LD: DelayNs,
    C: PubSubClient,
    H: MessageHandler,
    S: SensorPort,
    D: DelayNs,
{
    /// `sensor` is `None` on an alert node; it then never measures.
    pub fn new(
        link: LinkManager<R, LD>,
        session: Session<C, H>,
        handler: H,
        sensor: Option<S>,
        feeds: Feeds,
        settings: NodeSettings,
        delay: D,
    ) -> Self {
        Self {
            link,
            session,
            handler: Some(handler),
            sensor,
            feeds,
            scheduler: Scheduler::new(settings.cadence),
            settings,
            delay,
        }
    }

    pub fn link(&self) -> &LinkManager<R, LD> {
        &self.link
    }

    pub fn session(&self) -> &Session<C, H> {
        &self.session
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Bring the link and session up and bind the actuator.
    pub fn start(&mut self) -> Result<()> {
        self.link.connect()?;
        self.session.connect()?;
        if let Some(handler) = self.handler.take() {
            let topic = self.feeds.topic(self.settings.actuation_feed);
            self.session.subscribe(topic, handler)?;
        }
        info!(
            "NODE: running (poll {}s, measure {}s, sensor {})",
            self.settings.cadence.poll_interval_secs(),
            self.settings.cadence.measure_interval_secs(),
            if self.sensor.is_some() { "yes" } else { "no" }
        );
        Ok(())
    }

    /// Run one tick without the trailing sleep.  Returns whether it measured.
    pub fn step(&mut self) -> Result<bool> {
        let mut io = NodeIo {
            link: &mut self.link,
            session: &mut self.session,
            sensor: self.sensor.as_mut(),
            feeds: &self.feeds,
            publish_combined: self.settings.publish_combined,
        };
        self.scheduler.tick(&mut io)
    }

    /// Start, then tick until something fails.  Cleans up before returning
    /// the fault.
    pub fn run(&mut self) -> Error {
        let fault = match self.start() {
            Ok(()) => self.serve(),
            Err(e) => e,
        };
        warn!("NODE: stopping on {}", fault);
        self.shutdown();
        fault
    }

    fn serve(&mut self) -> Error {
        let sleep_ms = self.settings.cadence.poll_interval_secs().saturating_mul(1000);
        loop {
            if let Err(e) = self.step() {
                return e;
            }
            self.delay.delay_ms(sleep_ms);
        }
    }

    /// Close the session, then drop the link.  Never fails.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.session.disconnect() {
            warn!("NODE: session cleanup failed: {}", e);
        }
        if let Err(e) = self.link.disconnect() {
            warn!("NODE: link cleanup failed: {}", e);
        }
    }
}

/// Disjoint borrows of the node for one scheduler tick.
struct NodeIo<'a, R, LD, C, H, S> {
    link: &'a mut LinkManager<R, LD>,
    session: &'a mut Session<C, H>,
    sensor: Option<&'a mut S>,
    feeds: &'a Feeds,
    publish_combined: bool,
}

impl<R, LD, C, H, S> TickDelegate for NodeIo<'_, R, LD, C, H, S>
where
    R: Radio,
    LD: DelayNs,
    C: PubSubClient,
    H: MessageHandler,
    S: SensorPort,
{
    fn on_poll(&mut self) -> Result<()> {
        self.link.check_connection()?;
        self.session.update()
    }

    fn on_measure(&mut self) -> Result<()> {
        let Some(sensor) = self.sensor.as_mut() else {
            return Ok(());
        };
        sensor.measure()?;
        let reading = Reading {
            temperature: sensor.temperature(),
            humidity: sensor.humidity(),
        };

        // Any i32 fits in 11 chars.
        let mut text: heapless::String<12> = heapless::String::new();
        let _ = write!(text, "{}", reading.humidity);
        self.session.publish(self.feeds.topic(Feed::Humidity), text.as_bytes())?;

        text.clear();
        let _ = write!(text, "{}", reading.temperature);
        self.session.publish(self.feeds.topic(Feed::Temperature), text.as_bytes())?;

        if self.publish_combined {
            match serde_json::to_vec(&reading) {
                Ok(json) => self.session.publish(self.feeds.topic(Feed::Sensor), &json)?,
                Err(e) => warn!("NODE: combined reading not encoded: {}", e),
            }
        }

        info!(
            "NODE: published {}C {}%",
            reading.temperature, reading.humidity
        );
        Ok(())
    }
}
