//! Mock adapters for integration tests.
//!
//! Every mock records its calls into one shared [`Journal`], so tests can
//! assert on the order of operations across the radio, the broker client,
//! the sensor, the output pin and the reset line.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use climanode::actuation::{ActuationMode, Actuator};
use climanode::adapters::device_id::{client_id, read_mac};
use climanode::adapters::mqtt::Session;
use climanode::adapters::wifi::LinkManager;
use climanode::app::node::{Node, NodeSettings};
use climanode::app::ports::{
    ClientError, IfConfig, InboundMessage, LinkStatus, PubSubClient, Radio, RadioError, ResetPort,
    SensorPort, SessionOptions,
};
use climanode::config::NodeConfig;
use climanode::error::SensorError;
use climanode::scheduler::Cadence;
use climanode::topics::{Feed, Feeds, Topic};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    RadioActivate(bool),
    RadioConnect,
    RadioDisconnect,
    MqttConnect,
    MqttDisconnect,
    MqttSubscribe(String),
    MqttPublish { topic: String, payload: Vec<u8> },
    MqttCheck,
    Measure,
    PinWrite(bool),
    DelayMs(u32),
    Reset,
}

#[derive(Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<Call>>>);

#[allow(dead_code)]
impl Journal {
    pub fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    /// Calls with the delays filtered out.
    pub fn actions(&self) -> Vec<Call> {
        self.0
            .borrow()
            .iter()
            .filter(|c| !matches!(c, Call::DelayMs(_)))
            .cloned()
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().iter().filter(|c| pred(c)).count()
    }

    pub fn position(&self, call: &Call) -> Option<usize> {
        self.0.borrow().iter().position(|c| c == call)
    }

    pub fn publishes(&self) -> Vec<(String, Vec<u8>)> {
        self.0
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::MqttPublish { topic, payload } => Some((topic.clone(), payload.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

// ── MockRadio ─────────────────────────────────────────────────

pub struct MockRadio {
    journal: Journal,
    /// Shared so a test can drop the link mid-run.
    pub linked: Rc<Cell<bool>>,
    /// Whether `connect` ever results in a link.
    pub reachable: bool,
    pub status: i32,
}

#[allow(dead_code)]
impl MockRadio {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            linked: Rc::new(Cell::new(false)),
            reachable: true,
            status: LinkStatus::IDLE,
        }
    }

    pub fn unreachable(journal: &Journal, status: i32) -> Self {
        Self {
            reachable: false,
            status,
            ..Self::new(journal)
        }
    }
}

impl Radio for MockRadio {
    fn activate(&mut self, active: bool) -> Result<(), RadioError> {
        self.journal.push(Call::RadioActivate(active));
        Ok(())
    }

    fn connect(&mut self, _ssid: &str, _secret: &str) -> Result<(), RadioError> {
        self.journal.push(Call::RadioConnect);
        if self.reachable {
            self.linked.set(true);
            self.status = LinkStatus::GOT_IP;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.linked.get()
    }

    fn status(&self) -> i32 {
        self.status
    }

    fn ifconfig(&self) -> IfConfig {
        IfConfig::UNSPECIFIED
    }

    fn disconnect(&mut self) -> Result<(), RadioError> {
        self.journal.push(Call::RadioDisconnect);
        self.linked.set(false);
        self.status = LinkStatus::IDLE;
        Ok(())
    }
}

// ── MockClient ────────────────────────────────────────────────

pub struct MockClient {
    journal: Journal,
    pub inbox: Rc<RefCell<VecDeque<InboundMessage>>>,
    pub fail_disconnect: bool,
}

#[allow(dead_code)]
impl MockClient {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            inbox: Rc::new(RefCell::new(VecDeque::new())),
            fail_disconnect: false,
        }
    }
}

impl PubSubClient for MockClient {
    fn connect(&mut self, _options: &SessionOptions) -> Result<(), ClientError> {
        self.journal.push(Call::MqttConnect);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), ClientError> {
        self.journal.push(Call::MqttDisconnect);
        if self.fail_disconnect {
            Err(ClientError::ConnectionLost)
        } else {
            Ok(())
        }
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), ClientError> {
        self.journal.push(Call::MqttPublish {
            topic: topic.to_owned(),
            payload: payload.to_vec(),
        });
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), ClientError> {
        self.journal.push(Call::MqttSubscribe(topic.to_owned()));
        Ok(())
    }

    fn check_msg(&mut self) -> Result<Option<InboundMessage>, ClientError> {
        self.journal.push(Call::MqttCheck);
        Ok(self.inbox.borrow_mut().pop_front())
    }
}

pub fn message(topic: &str, payload: &[u8]) -> InboundMessage {
    let mut t = Topic::new();
    t.push_str(topic).unwrap();
    InboundMessage {
        topic: t,
        payload: heapless::Vec::from_slice(payload).unwrap(),
    }
}

// ── MockSensor ────────────────────────────────────────────────

/// Replays scripted `(temperature, humidity)` readings; repeats the last
/// one when the script runs out.
pub struct MockSensor {
    journal: Journal,
    script: VecDeque<Result<(i32, i32), SensorError>>,
    current: (i32, i32),
}

#[allow(dead_code)]
impl MockSensor {
    pub fn new(journal: &Journal, script: Vec<Result<(i32, i32), SensorError>>) -> Self {
        Self {
            journal: journal.clone(),
            script: script.into(),
            current: (0, 0),
        }
    }
}

impl SensorPort for MockSensor {
    fn measure(&mut self) -> Result<(), SensorError> {
        self.journal.push(Call::Measure);
        match self.script.pop_front() {
            Some(Ok(reading)) => {
                self.current = reading;
                Ok(())
            }
            Some(Err(e)) => Err(e),
            None => Ok(()),
        }
    }

    fn temperature(&self) -> i32 {
        self.current.0
    }

    fn humidity(&self) -> i32 {
        self.current.1
    }
}

// ── MockPin ───────────────────────────────────────────────────

pub struct MockPin {
    journal: Journal,
    pub high: Rc<Cell<bool>>,
}

#[allow(dead_code)]
impl MockPin {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            high: Rc::new(Cell::new(false)),
        }
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.journal.push(Call::PinWrite(false));
        self.high.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.journal.push(Call::PinWrite(true));
        self.high.set(true);
        Ok(())
    }
}

impl StatefulOutputPin for MockPin {
    fn is_set_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.high.get())
    }

    fn is_set_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.high.get())
    }
}

// ── MockDelay / MockReset ─────────────────────────────────────

pub struct MockDelay {
    journal: Journal,
}

#[allow(dead_code)]
impl MockDelay {
    pub fn new(journal: &Journal) -> Self {
        Self { journal: journal.clone() }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.journal.push(Call::DelayMs(ms));
    }
}

pub struct MockReset {
    journal: Journal,
}

#[allow(dead_code)]
impl MockReset {
    pub fn new(journal: &Journal) -> Self {
        Self { journal: journal.clone() }
    }
}

impl ResetPort for MockReset {
    fn reset(&mut self) {
        self.journal.push(Call::Reset);
    }
}

// ── Node assembly ─────────────────────────────────────────────

pub type MockNode = Node<MockRadio, MockDelay, MockClient, Actuator<MockPin>, MockSensor, MockDelay>;

pub const NAMESPACE: &str = "alice";

pub fn session_options() -> SessionOptions {
    let config = NodeConfig {
        broker_host: "io.adafruit.com".into(),
        broker_user: NAMESPACE.into(),
        broker_secret: "aio_key".into(),
        ..NodeConfig::default()
    };
    config.session_options(client_id(&read_mac()))
}

pub fn link(journal: &Journal, radio: MockRadio) -> LinkManager<MockRadio, MockDelay> {
    LinkManager::new(radio, MockDelay::new(journal), "HomeWiFi", "mysecret8", 30).unwrap()
}

/// Handles a test keeps after the node takes ownership of the mocks.
#[allow(dead_code)]
pub struct Handles {
    pub inbox: Rc<RefCell<VecDeque<InboundMessage>>>,
    pub linked: Rc<Cell<bool>>,
    pub pin_high: Rc<Cell<bool>>,
}

pub struct NodeBuilder {
    pub journal: Journal,
    pub radio: MockRadio,
    pub client: MockClient,
    pub mode: ActuationMode,
    pub sensor: Option<MockSensor>,
    pub publish_combined: bool,
    pub cadence: Cadence,
}

#[allow(dead_code)]
impl NodeBuilder {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            radio: MockRadio::new(journal),
            client: MockClient::new(journal),
            mode: ActuationMode::DirectSwitch,
            sensor: None,
            publish_combined: false,
            cadence: Cadence::new(1, 30).unwrap(),
        }
    }

    pub fn sensor(mut self, script: Vec<Result<(i32, i32), SensorError>>) -> Self {
        self.sensor = Some(MockSensor::new(&self.journal, script));
        self
    }

    pub fn build(self) -> (MockNode, Handles) {
        let pin = MockPin::new(&self.journal);
        let handles = Handles {
            inbox: self.client.inbox.clone(),
            linked: self.radio.linked.clone(),
            pin_high: pin.high.clone(),
        };
        let actuation_feed = match self.mode {
            ActuationMode::DirectSwitch => Feed::Led,
            ActuationMode::ThresholdAlert(_) => Feed::Temperature,
        };
        let settings = NodeSettings {
            cadence: self.cadence,
            actuation_feed,
            publish_combined: self.publish_combined,
        };
        let node = Node::new(
            link(&self.journal, self.radio),
            Session::new(self.client, session_options()),
            Actuator::new(pin, self.mode),
            self.sensor,
            Feeds::new(NAMESPACE).unwrap(),
            settings,
            MockDelay::new(&self.journal),
        );
        (node, handles)
    }
}
