use esp_idf_svc::hal::delay::FreeRtos;

use crate::{
    gpio::{DigitalIn, DigitalInError, DigitalOut, DigitalOutError},
    microcontroller_src::peripherals::Peripherals,
};

/// Primary abstraction for interacting with the microcontroller, providing access to the
/// pin peripherals required for configuring digital inputs and outputs.
///
/// - `peripherals`: An instance of `Peripherals`, representing the pins available on the microcontroller.
pub struct Microcontroller {
    peripherals: Peripherals,
}

impl Microcontroller {
    /// Creates a new Microcontroller instance
    ///
    /// # Returns
    ///
    /// The new Microcontroller
    pub fn new() -> Self {
        esp_idf_svc::sys::link_patches();

        Microcontroller {
            peripherals: Peripherals::new(),
        }
    }

    /// Creates a DigitalIn on the ESP pin with number 'pin_num' to read digital inputs.
    ///
    /// # Arguments
    ///
    /// - `pin_num`: The number of the pin on the microcontroller to configure as a digital input.
    ///
    /// # Returns
    ///
    /// A `DigitalIn` instance that can be used to read digital inputs from the specified pin.
    ///
    /// # Errors
    ///
    /// - `DigitalInError::InvalidPeripheral`: If the pin number does not exist or the pin has
    ///   already been taken by another driver.
    /// - `DigitalInError::CannotSetPinAsInput`: If the pin does not support input.
    pub fn set_pin_as_digital_in<'a>(
        &mut self,
        pin_num: usize,
    ) -> Result<DigitalIn<'a>, DigitalInError> {
        let pin_peripheral = self.peripherals.get_digital_pin(pin_num);
        DigitalIn::new(pin_peripheral)
    }

    /// Creates a DigitalOut on the ESP pin with number 'pin_num' to write digital outputs.
    ///
    /// # Arguments
    ///
    /// - `pin_num`: The number of the pin on the microcontroller to configure as a digital output.
    ///
    /// # Returns
    ///
    /// A `DigitalOut` instance that can be used to write digital outputs to the specified pin.
    ///
    /// # Errors
    ///
    /// - `DigitalOutError::InvalidPeripheral`: If the pin number does not exist or the pin has
    ///   already been taken by another driver.
    /// - `DigitalOutError::CannotSetPinAsOutput`: If the pin does not support output.
    pub fn set_pin_as_digital_out<'a>(
        &mut self,
        pin_num: usize,
    ) -> Result<DigitalOut<'a>, DigitalOutError> {
        let pin_peripheral = self.peripherals.get_digital_pin(pin_num);
        DigitalOut::new(pin_peripheral)
    }

    /// Sleeps the main task for an amount of milliseconds, letting lower priority tasks run.
    ///
    /// # Arguments
    ///
    /// - `miliseconds`: The amount of milliseconds to sleep.
    pub fn sleep(&mut self, miliseconds: u32) {
        FreeRtos::delay_ms(miliseconds);
    }
}
