//! WiFi link manager against the journaling mock radio.

use crate::mock_hw::{Call, Journal, MockRadio, link};

use climanode::adapters::wifi::LinkState;
use climanode::app::ports::LinkStatus;
use climanode::error::Error;

#[test]
fn unknown_status_code_surfaces_in_timeout() {
    let journal = Journal::default();
    let mut l = link(&journal, MockRadio::unreachable(&journal, 42));

    let err = l.connect().unwrap_err();

    assert_eq!(err, Error::LinkTimeout { status: LinkStatus::Unknown(42) });
    assert_eq!(err.to_string(), "link timeout: Unknown status: 42");
    assert_eq!(l.state(), LinkState::Failed);
}

#[test]
fn timeout_waits_in_one_second_steps() {
    let journal = Journal::default();
    let mut l = link(&journal, MockRadio::unreachable(&journal, LinkStatus::NO_AP_FOUND));

    assert!(l.connect().is_err());

    let delays = journal.count(|c| matches!(c, Call::DelayMs(_)));
    assert_eq!(delays, journal.count(|c| *c == Call::DelayMs(1000)));
    assert_eq!(delays as u32, l.timeout_secs() + 1);
}

#[test]
fn connected_link_reports_got_ip() {
    let journal = Journal::default();
    let mut l = link(&journal, MockRadio::new(&journal));

    l.connect().unwrap();

    assert_eq!(l.state(), LinkState::Connected);
    assert_eq!(l.last_status(), LinkStatus::GotIp);
    assert!(l.is_connected());
}

#[test]
fn check_connection_is_silent_while_linked() {
    let journal = Journal::default();
    let mut l = link(&journal, MockRadio::new(&journal));
    l.connect().unwrap();
    journal.clear();

    for _ in 0..5 {
        l.check_connection().unwrap();
    }

    assert!(journal.calls().is_empty());
}

#[test]
fn disconnect_drops_association_then_powers_down() {
    let journal = Journal::default();
    let mut l = link(&journal, MockRadio::new(&journal));
    l.connect().unwrap();
    journal.clear();

    l.disconnect().unwrap();

    assert_eq!(journal.calls(), vec![Call::RadioDisconnect, Call::RadioActivate(false)]);
    assert_eq!(l.state(), LinkState::Idle);
    assert!(!l.is_connected());
}
