use std::mem;

use esp_idf_svc::hal::gpio::*;

const PIN_COUNT: usize = 24;
const DIGITAL_PINS_BOUNDS: (usize, usize) = (0, 23);

#[derive(Debug)]
pub enum PeripheralError {
    NotAPin,
}

/// Represents an esp32 peripheral, allowing to instanciate the different peripheral types
#[derive(Default)]
pub enum Peripheral {
    Pin(u8),
    #[default]
    None,
}

impl Peripheral {
    fn take(&mut self) -> Peripheral {
        mem::take(self)
    }

    /// If the Peripheral is a Pin returns the corresponding AnyIOPin.
    /// If not it returns PeripheralError::NotAPin
    pub fn into_any_io_pin(self) -> Result<AnyIOPin, PeripheralError> {
        let pin = match self {
            Peripheral::Pin(pin_num) => match pin_num {
                0 => unsafe { Gpio0::new().downgrade() },
                1 => unsafe { Gpio1::new().downgrade() },
                2 => unsafe { Gpio2::new().downgrade() },
                3 => unsafe { Gpio3::new().downgrade() },
                4 => unsafe { Gpio4::new().downgrade() },
                5 => unsafe { Gpio5::new().downgrade() },
                6 => unsafe { Gpio6::new().downgrade() },
                7 => unsafe { Gpio7::new().downgrade() },
                8 => unsafe { Gpio8::new().downgrade() },
                9 => unsafe { Gpio9::new().downgrade() },
                10 => unsafe { Gpio10::new().downgrade() },
                11 => unsafe { Gpio11::new().downgrade() },
                12 => unsafe { Gpio12::new().downgrade() },
                13 => unsafe { Gpio13::new().downgrade() },
                15 => unsafe { Gpio15::new().downgrade() },
                16 => unsafe { Gpio16::new().downgrade() },
                17 => unsafe { Gpio17::new().downgrade() },
                18 => unsafe { Gpio18::new().downgrade() },
                19 => unsafe { Gpio19::new().downgrade() },
                20 => unsafe { Gpio20::new().downgrade() },
                21 => unsafe { Gpio21::new().downgrade() },
                22 => unsafe { Gpio22::new().downgrade() },
                23 => unsafe { Gpio23::new().downgrade() },
                _ => return Err(PeripheralError::NotAPin),
            },
            _ => return Err(PeripheralError::NotAPin),
        };
        Ok(pin)
    }
}

/// Represents the available pins of the esp32C6 and provides a way to get each particular
/// pin. Subsequent gets of the same pin will return Peripheral::None, so a pin can only be
/// owned by one driver at a time.
pub struct Peripherals {
    pins: [Peripheral; PIN_COUNT],
}

impl Peripherals {
    pub fn new() -> Peripherals {
        let pins: [Peripheral; PIN_COUNT] = [
            Peripheral::Pin(0),
            Peripheral::Pin(1),
            Peripheral::Pin(2),
            Peripheral::Pin(3),
            Peripheral::Pin(4),
            Peripheral::Pin(5),
            Peripheral::Pin(6),
            Peripheral::Pin(7),
            Peripheral::Pin(8),
            Peripheral::Pin(9),
            Peripheral::Pin(10),
            Peripheral::Pin(11),
            Peripheral::Pin(12),
            Peripheral::Pin(13),
            Peripheral::None,
            Peripheral::Pin(15),
            Peripheral::Pin(16),
            Peripheral::Pin(17),
            Peripheral::Pin(18),
            Peripheral::Pin(19),
            Peripheral::Pin(20),
            Peripheral::Pin(21),
            Peripheral::Pin(22),
            Peripheral::Pin(23),
        ];
        Peripherals { pins }
    }

    pub fn get_digital_pin(&mut self, pin_num: usize) -> Peripheral {
        self.get_pin_on_bound(pin_num, DIGITAL_PINS_BOUNDS)
    }

    fn get_pin_on_bound(&mut self, pin_num: usize, bound: (usize, usize)) -> Peripheral {
        if pin_num >= bound.0 && pin_num <= bound.1 {
            return self.pins[pin_num].take();
        }
        Peripheral::None
    }
}
