//! Feed topics.
//!
//! Every topic lives under the broker user's namespace as
//! `{namespace}/f/{feed}`.  Topics are built once at start-up and never
//! parsed at runtime.

use core::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Fixed-capacity topic string (ASCII).
pub type Topic = heapless::String<64>;

/// The fixed set of feeds this node knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feed {
    /// Direct ON/OFF actuation.
    Led,
    Humidity,
    Temperature,
    /// Combined JSON reading.
    Sensor,
}

impl Feed {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Led => "led",
            Self::Humidity => "humidity",
            Self::Temperature => "temperature",
            Self::Sensor => "sensor",
        }
    }
}

/// Build `{namespace}/f/{feed}`.
pub fn feed_topic(namespace: &str, feed: Feed) -> Result<Topic, ConfigError> {
    if namespace.is_empty() {
        return Err(ConfigError::Missing("feed namespace"));
    }
    let mut topic = Topic::new();
    write!(topic, "{}/f/{}", namespace, feed.name()).map_err(|_| ConfigError::TopicTooLong)?;
    Ok(topic)
}

/// All feed topics for one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feeds {
    led: Topic,
    humidity: Topic,
    temperature: Topic,
    sensor: Topic,
}

impl Feeds {
    pub fn new(namespace: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            led: feed_topic(namespace, Feed::Led)?,
            humidity: feed_topic(namespace, Feed::Humidity)?,
            temperature: feed_topic(namespace, Feed::Temperature)?,
            sensor: feed_topic(namespace, Feed::Sensor)?,
        })
    }

    pub fn topic(&self, feed: Feed) -> &Topic {
        match feed {
            Feed::Led => &self.led,
            Feed::Humidity => &self.humidity,
            Feed::Temperature => &self.temperature,
            Feed::Sensor => &self.sensor,
        }
    }
}
