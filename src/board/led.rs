//! Status LED on one of the three active-low board LEDs.

use airstream::config::IndicatorLed;
use airstream::Indicator;
use embassy_nrf::gpio::{AnyPin, Level, Output, OutputDrive};

pub struct StatusLed {
    pin: Output<'static>,
    // The two LEDs not chosen as indicator, held off.
    _idle: [Output<'static>; 2],
}

impl StatusLed {
    /// Pick the indicator pin once; the others are driven high (off).
    pub fn resolve(which: IndicatorLed, red: AnyPin, green: AnyPin, blue: AnyPin) -> Self {
        let (chosen, a, b) = match which {
            IndicatorLed::Red => (red, green, blue),
            IndicatorLed::Green => (green, red, blue),
            IndicatorLed::Blue => (blue, red, green),
        };

        Self {
            pin: off(chosen),
            _idle: [off(a), off(b)],
        }
    }
}

fn off(pin: AnyPin) -> Output<'static> {
    Output::new(pin, Level::High, OutputDrive::Standard)
}

impl Indicator for StatusLed {
    fn set(&mut self, on: bool) {
        // Active low.
        if on {
            self.pin.set_low();
        } else {
            self.pin.set_high();
        }
    }

    fn toggle(&mut self) {
        self.pin.toggle();
    }
}
