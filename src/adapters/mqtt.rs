//! Broker session.
//!
//! [`Session`] wraps a [`PubSubClient`] with a connected flag and a single
//! dispatch slot.  `publish`, `subscribe` and `update` are guarded: while
//! the flag is clear they fail with `Not connected` and the client is never
//! touched.  `disconnect` on a closed session is a no-op.
//!
//! ```text
//!   connect() ──▶ connected ──subscribe(topic, handler)──▶ slot = (topic, handler)
//!                     │
//!                     ├── update()  ─▶ check_msg() ─▶ handler.execute(topic, payload)
//!                     ├── publish() ─▶ client.publish()
//!                     └── disconnect() ─▶ flag cleared (even if the client errors)
//! ```
//!
//! Inbound messages are only delivered from inside `update()`, on the
//! caller's thread, so the handler never runs concurrently with the loop.

use log::{debug, info};

use crate::app::ports::{MessageHandler, PubSubClient, SessionOptions};
use crate::error::{ConfigError, Result, SessionError};
use crate::topics::Topic;

/// The single dispatch slot.  A later `subscribe` replaces it.
struct CallbackBinding<H> {
    topic: Topic,
    handler: H,
}

pub struct Session<C, H> {
    client: C,
    options: SessionOptions,
    connected: bool,
    binding: Option<CallbackBinding<H>>,
}

impl<C: PubSubClient, H: MessageHandler> Session<C, H> {
    pub fn new(client: C, options: SessionOptions) -> Self {
        Self {
            client,
            options,
            connected: false,
            binding: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Topic currently bound to the dispatch slot.
    pub fn subscribed_topic(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.topic.as_str())
    }

    fn guard(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(SessionError::NotConnected.into())
        }
    }

    pub fn connect(&mut self) -> Result<()> {
        info!(
            "MQTT: connecting <{}@{}:{}>",
            self.options.client_id, self.options.host, self.options.port
        );
        self.client
            .connect(&self.options)
            .map_err(|source| SessionError::Client { op: "connect", source })?;
        self.connected = true;
        info!("MQTT: connected");
        Ok(())
    }

    /// Close the session if open; no-op otherwise.  The flag is cleared
    /// before the client is asked to disconnect, so a failing client still
    /// leaves the session closed.
    pub fn disconnect(&mut self) -> Result<()> {
        if !self.connected {
            return Ok(());
        }
        self.connected = false;
        info!("MQTT: disconnecting");
        self.client
            .disconnect()
            .map_err(|source| SessionError::Client { op: "disconnect", source }.into())
    }

    /// Subscribe and install `handler` in the dispatch slot.
    pub fn subscribe(&mut self, topic: &str, handler: H) -> Result<()> {
        self.guard()?;
        let mut bound = Topic::new();
        bound.push_str(topic).map_err(|()| ConfigError::TopicTooLong)?;
        self.client
            .subscribe(topic)
            .map_err(|source| SessionError::Client { op: "subscribe", source })?;

        if let Some(previous) = self.binding.replace(CallbackBinding { topic: bound, handler }) {
            debug!("MQTT: replacing handler for {}", previous.topic);
        }
        info!("MQTT: subscribed <{}>", topic);
        Ok(())
    }

    pub fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        self.guard()?;
        self.client
            .publish(topic, payload)
            .map_err(|source| SessionError::Client { op: "publish", source })?;
        debug!("MQTT: published {} bytes to {}", payload.len(), topic);
        Ok(())
    }

    /// Service the inbox once.  Dispatches at most one message and never
    /// blocks waiting for one.
    pub fn update(&mut self) -> Result<()> {
        self.guard()?;
        let message = self
            .client
            .check_msg()
            .map_err(|source| SessionError::Client { op: "check_msg", source })?;

        let Some(message) = message else {
            return Ok(());
        };
        match self.binding.as_mut() {
            Some(binding) => binding.handler.execute(&message.topic, &message.payload),
            None => {
                debug!("MQTT: no handler for {}", message.topic);
                Ok(())
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF client
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::EspPubSub;

#[cfg(target_os = "espidf")]
mod esp {
    use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
    use std::thread;
    use std::time::Duration;

    use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};
    use log::{debug, warn};

    use crate::app::ports::{ClientError, InboundMessage, PubSubClient, SessionOptions};
    use crate::topics::Topic;

    const CONNACK_TIMEOUT: Duration = Duration::from_secs(10);

    enum Event {
        Connected,
        Disconnected,
        Message(InboundMessage),
        Dropped,
    }

    /// `EspMqttClient` behind the poll-style port.
    ///
    /// A small thread drains the connection and forwards events over a
    /// channel; `check_msg` only ever `try_recv`s.
    #[derive(Default)]
    pub struct EspPubSub {
        client: Option<EspMqttClient<'static>>,
        events: Option<Receiver<Event>>,
    }

    impl EspPubSub {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl PubSubClient for EspPubSub {
        fn connect(&mut self, options: &SessionOptions) -> Result<(), ClientError> {
            let url = format!("mqtt://{}:{}", options.host, options.port);
            let conf = MqttClientConfiguration {
                client_id: Some(options.client_id.as_str()),
                username: Some(options.user.as_str()),
                password: Some(options.secret.as_str()),
                keep_alive_interval: Some(Duration::from_secs(u64::from(options.keep_alive_secs))),
                ..Default::default()
            };
            let (client, mut conn) = EspMqttClient::new(&url, &conf).map_err(|e| {
                warn!("MQTT: client init failed {}", e);
                ClientError::Transport
            })?;

            let (tx, rx) = mpsc::channel();
            thread::Builder::new()
                .name("mqtt-events".into())
                .stack_size(6144)
                .spawn(move || {
                    while let Ok(event) = conn.next() {
                        let forwarded = match event.payload() {
                            EventPayload::Connected(_) => Event::Connected,
                            EventPayload::Disconnected => Event::Disconnected,
                            EventPayload::Received { topic, data, .. } => {
                                let mut t = Topic::new();
                                let mut payload = heapless::Vec::new();
                                if t.push_str(topic.unwrap_or_default()).is_err()
                                    || payload.extend_from_slice(data).is_err()
                                {
                                    Event::Dropped
                                } else {
                                    Event::Message(InboundMessage { topic: t, payload })
                                }
                            }
                            other => {
                                debug!("MQTT: event {:?}", other);
                                continue;
                            }
                        };
                        if tx.send(forwarded).is_err() {
                            break;
                        }
                    }
                })
                .map_err(|_| ClientError::Transport)?;

            loop {
                match rx.recv_timeout(CONNACK_TIMEOUT) {
                    Ok(Event::Connected) => break,
                    Ok(_) => continue,
                    Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                        return Err(ClientError::ConnectRefused);
                    }
                }
            }

            self.client = Some(client);
            self.events = Some(rx);
            Ok(())
        }

        fn disconnect(&mut self) -> Result<(), ClientError> {
            self.events = None;
            // Dropping the client stops it and ends the event thread.
            match self.client.take() {
                Some(_) => Ok(()),
                None => Err(ClientError::ConnectionLost),
            }
        }

        fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), ClientError> {
            let client = self.client.as_mut().ok_or(ClientError::ConnectionLost)?;
            client
                .publish(topic, QoS::AtMostOnce, false, payload)
                .map(drop)
                .map_err(|_| ClientError::Transport)
        }

        fn subscribe(&mut self, topic: &str) -> Result<(), ClientError> {
            let client = self.client.as_mut().ok_or(ClientError::ConnectionLost)?;
            client
                .subscribe(topic, QoS::AtMostOnce)
                .map(drop)
                .map_err(|_| ClientError::Transport)
        }

        fn check_msg(&mut self) -> Result<Option<InboundMessage>, ClientError> {
            let events = self.events.as_ref().ok_or(ClientError::ConnectionLost)?;
            loop {
                match events.try_recv() {
                    Ok(Event::Message(message)) => return Ok(Some(message)),
                    Ok(Event::Connected) => continue,
                    Ok(Event::Disconnected) => return Err(ClientError::ConnectionLost),
                    Ok(Event::Dropped) => return Err(ClientError::Oversized),
                    Err(TryRecvError::Empty) => return Ok(None),
                    Err(TryRecvError::Disconnected) => return Err(ClientError::ConnectionLost),
                }
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
