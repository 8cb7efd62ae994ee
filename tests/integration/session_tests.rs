//! Broker session guard and dispatch against the journaling mock client.

use crate::mock_hw::{Call, Journal, MockClient, MockPin, message, session_options};

use climanode::actuation::{ActuationMode, Actuator};
use climanode::adapters::mqtt::Session;
use climanode::error::{Error, SessionError};

type TestSession = Session<MockClient, Actuator<MockPin>>;

fn session(journal: &Journal) -> TestSession {
    Session::new(MockClient::new(journal), session_options())
}

#[test]
fn guarded_operations_never_reach_the_client() {
    let journal = Journal::default();
    let mut s = session(&journal);
    let not_connected = Error::Session(SessionError::NotConnected);

    assert_eq!(s.publish("alice/f/humidity", b"57"), Err(not_connected.clone()));
    assert_eq!(
        s.subscribe(
            "alice/f/led",
            Actuator::new(MockPin::new(&journal), ActuationMode::DirectSwitch)
        ),
        Err(not_connected.clone())
    );
    assert_eq!(s.update(), Err(not_connected));
    assert_eq!(s.disconnect(), Ok(()), "disconnect on a closed session is a no-op");

    assert!(journal.calls().is_empty());
    assert_eq!(s.subscribed_topic(), None);
}

#[test]
fn options_carry_mac_derived_client_id() {
    let journal = Journal::default();
    let s = session(&journal);
    assert_eq!(s.options().client_id.as_str(), "deadbeefcafe");
    assert_eq!(s.options().port, 1883);
    assert_eq!(s.options().user, "alice");
}

#[test]
fn publish_round_trips_payload_bytes() {
    let journal = Journal::default();
    let mut s = session(&journal);
    s.connect().unwrap();

    s.publish("alice/f/humidity", b"57").unwrap();
    s.publish("alice/f/temperature", b"23").unwrap();

    assert_eq!(
        journal.publishes(),
        vec![
            ("alice/f/humidity".into(), b"57".to_vec()),
            ("alice/f/temperature".into(), b"23".to_vec()),
        ]
    );
}

#[test]
fn later_subscribe_replaces_the_handler() {
    let journal = Journal::default();
    let client = MockClient::new(&journal);
    let inbox = client.inbox.clone();
    let mut s: TestSession = Session::new(client, session_options());
    s.connect().unwrap();

    let first = MockPin::new(&journal);
    let first_high = first.high.clone();
    let second = MockPin::new(&journal);
    let second_high = second.high.clone();

    s.subscribe("alice/f/led", Actuator::new(first, ActuationMode::DirectSwitch)).unwrap();
    s.subscribe("alice/f/led", Actuator::new(second, ActuationMode::DirectSwitch)).unwrap();
    assert_eq!(s.subscribed_topic(), Some("alice/f/led"));

    inbox.borrow_mut().push_back(message("alice/f/led", b"ON"));
    s.update().unwrap();

    assert!(!first_high.get());
    assert!(second_high.get());
}

#[test]
fn reconnect_after_disconnect_reopens_guard() {
    let journal = Journal::default();
    let mut s = session(&journal);
    s.connect().unwrap();
    s.disconnect().unwrap();
    assert!(!s.is_connected());
    assert!(s.update().is_err());

    s.connect().unwrap();
    s.update().unwrap();
    assert_eq!(
        journal.calls(),
        vec![Call::MqttConnect, Call::MqttDisconnect, Call::MqttConnect, Call::MqttCheck]
    );
}
