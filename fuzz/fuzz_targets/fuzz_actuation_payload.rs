//! Fuzz target: `Actuator::execute`
//!
//! Drives arbitrary inbound payloads through both actuation modes and
//! asserts that the dispatcher never panics, that threshold mode either
//! rejects the payload or leaves the pin at "outside the band", and that
//! direct-switch mode never fails.
//!
//! cargo fuzz run fuzz_actuation_payload

#![no_main]

use core::convert::Infallible;

use climanode::actuation::{ActuationMode, Actuator, SafeBand, parse_reading};
use climanode::app::ports::MessageHandler;
use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};
use libfuzzer_sys::fuzz_target;

#[derive(Default)]
struct Pin(bool);

impl ErrorType for Pin {
    type Error = Infallible;
}

impl OutputPin for Pin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0 = false;
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0 = true;
        Ok(())
    }
}

impl StatefulOutputPin for Pin {
    fn is_set_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0)
    }
    fn is_set_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0)
    }
}

fuzz_target!(|data: &[u8]| {
    let band = match SafeBand::new(7, 9) {
        Ok(band) => band,
        Err(_) => return,
    };

    let mut alert = Actuator::new(Pin::default(), ActuationMode::ThresholdAlert(band));
    match alert.execute("fuzz/f/temperature", data) {
        Ok(()) => {
            let reading = parse_reading(data).expect("accepted payload must parse");
            assert_eq!(alert.into_pin().0, !band.contains(reading));
        }
        Err(_) => assert!(parse_reading(data).is_err()),
    }

    let mut switch = Actuator::new(Pin::default(), ActuationMode::DirectSwitch);
    assert!(switch.execute("fuzz/f/led", data).is_ok());
});
