use esp_idf_svc::hal::gpio::*;

use crate::microcontroller_src::peripherals::{Peripheral, PeripheralError};

/// Enums the different errors possible when working with the digital out
#[derive(Debug)]
pub enum DigitalOutError {
    CannotSetPinAsOutput,
    InvalidPin,
    InvalidPeripheral(PeripheralError),
}

/// Driver to handle a digital output for a particular Pin
/// - `pin_driver`: A PinDriver instance that handles the output signals
pub struct DigitalOut<'a> {
    pin_driver: PinDriver<'a, AnyIOPin, Output>,
}

impl<'a> DigitalOut<'a> {
    /// Creates a new `DigitalOut` for a specified pin.
    ///
    /// # Arguments
    ///
    /// - `per`: A `Peripheral` that can be transformed into an AnyIOPin.
    ///
    /// # Returns
    ///
    /// A `Result` containing the new `DigitalOut` instance, or a `DigitalOutError` if the
    /// initialization fails.
    ///
    /// # Errors
    ///
    /// - `DigitalOutError::InvalidPeripheral`: If the peripheral cannot be converted into an AnyIOPin.
    /// - `DigitalOutError::CannotSetPinAsOutput`: If the pin cannot be set as an output.
    pub(crate) fn new(per: Peripheral) -> Result<DigitalOut<'a>, DigitalOutError> {
        let gpio = per
            .into_any_io_pin()
            .map_err(DigitalOutError::InvalidPeripheral)?;
        let pin_driver =
            PinDriver::output(gpio).map_err(|_| DigitalOutError::CannotSetPinAsOutput)?;

        Ok(DigitalOut { pin_driver })
    }

    /// Sets the pin level to either `High` or `Low`.
    ///
    /// # Arguments
    ///
    /// - `level`: A Level value to set the pin to.
    ///
    /// # Returns
    ///
    /// A `Result` indicating success or a `DigitalOutError` if the operation fails.
    ///
    /// # Errors
    ///
    /// - `DigitalOutError::InvalidPin`: If the pin level cannot be set.
    pub fn set_level(&mut self, level: Level) -> Result<(), DigitalOutError> {
        self.pin_driver
            .set_level(level)
            .map_err(|_| DigitalOutError::InvalidPin)
    }

    /// Gets the current level of the pin.
    ///
    /// # Returns
    ///
    /// A `Level` indicating whether the pin is `High` or `Low`.
    pub fn get_level(&mut self) -> Level {
        if self.pin_driver.is_set_high() {
            Level::High
        } else {
            Level::Low
        }
    }

    /// Sets the pin level to `High`.
    ///
    /// # Errors
    ///
    /// - `DigitalOutError::InvalidPin`: If the pin level cannot be set.
    pub fn set_high(&mut self) -> Result<(), DigitalOutError> {
        self.set_level(Level::High)
    }

    /// Sets the pin level to `Low`.
    ///
    /// # Errors
    ///
    /// - `DigitalOutError::InvalidPin`: If the pin level cannot be set.
    pub fn set_low(&mut self) -> Result<(), DigitalOutError> {
        self.set_level(Level::Low)
    }
}
