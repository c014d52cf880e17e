pub use esp_idf_svc::hal::gpio::InterruptType;
use esp_idf_svc::hal::gpio::*;

use crate::{
    microcontroller_src::peripherals::{Peripheral, PeripheralError},
    utils::error_text_parser::map_enable_disable_errors,
};

/// Enums the different errors possible when working with the digital in
#[derive(Debug)]
pub enum DigitalInError {
    CannotSetPinAsInput,
    CannotSetPullForPin,
    InvalidPeripheral(PeripheralError),
    InvalidPin,
    StateAlreadySet,
}

/// Driver for receiving digital inputs from a particular Pin
/// - `pin_driver`: An instance of PinDriver that implements AnyIOPin
/// - `pin_num`: The gpio number of the pin, needed to rearm the interrupt from interrupt context
/// - `interrupt_type`: An InterruptType describing the subscribed edge condition, if any
pub struct DigitalIn<'a> {
    pin_driver: PinDriver<'a, AnyIOPin, Input>,
    pin_num: i32,
    interrupt_type: Option<InterruptType>,
}

impl<'a> DigitalIn<'a> {
    /// Create a new DigitalIn for a Pin, by default pull is set to Down.
    ///
    /// # Arguments
    ///
    /// - `per`: A Peripheral capable of transforming into an AnyIOPin.
    ///
    /// # Returns
    ///
    /// A `Result` containing the new `DigitalIn` instance, or a `DigitalInError` if
    /// initialization fails.
    ///
    /// # Errors
    ///
    /// - `DigitalInError::InvalidPeripheral`: If per parameter is not capable of transforming
    ///   into an AnyIOPin, or pin has already been used for another driver.
    /// - `DigitalInError::CannotSetPinAsInput`: If the per parameter does not support input.
    /// - `DigitalInError::CannotSetPullForPin`: If setting the default pull fails.
    pub(crate) fn new(per: Peripheral) -> Result<DigitalIn<'a>, DigitalInError> {
        let gpio = per
            .into_any_io_pin()
            .map_err(DigitalInError::InvalidPeripheral)?;
        let pin_num = gpio.pin();
        let pin_driver = PinDriver::input(gpio).map_err(|_| DigitalInError::CannotSetPinAsInput)?;

        let mut digital_in = DigitalIn {
            pin_driver,
            pin_num,
            interrupt_type: None,
        };

        digital_in.set_pull(Pull::Down)?;
        Ok(digital_in)
    }

    /// Set the pin Pull either to Pull Up or Down
    ///
    /// # Arguments
    ///
    /// - `pull_type`: The Pull type to set for the pin.
    ///
    /// # Errors
    ///
    /// - `DigitalInError::CannotSetPullForPin`: If the pin driver is unable to set the pull
    pub fn set_pull(&mut self, pull_type: Pull) -> Result<(), DigitalInError> {
        self.pin_driver
            .set_pull(pull_type)
            .map_err(|_| DigitalInError::CannotSetPullForPin)
    }

    /// Subscribes a callback to be executed, in interrupt context, on every level change of
    /// the pin. The interrupt is rearmed from inside the handler, since the gpio interrupt is
    /// disabled by the hal each time it fires, and both edges of a single pulse must be seen.
    ///
    /// The callback runs inside an ISR: it must be short, must not block and must not log.
    ///
    /// # Arguments
    ///
    /// - `callback`: The function to be executed on each rising or falling edge.
    ///
    /// # Returns
    ///
    /// A `Result` indicating success or a `DigitalInError` if the subscription fails.
    ///
    /// # Errors
    ///
    /// - `DigitalInError::InvalidPin`: If the pin does not support the AnyEdge interrupt.
    /// - `DigitalInError::StateAlreadySet`: If the ISR service has not been initialized.
    pub fn trigger_on_any_edge<F: FnMut() + Send + 'static>(
        &mut self,
        mut callback: F,
    ) -> Result<(), DigitalInError> {
        self.interrupt_type = Some(InterruptType::AnyEdge);
        self.pin_driver
            .set_interrupt_type(InterruptType::AnyEdge)
            .map_err(|_| DigitalInError::InvalidPin)?;

        let pin_num = self.pin_num;
        let isr_callback = move || {
            callback();
            unsafe { esp_idf_svc::sys::gpio_intr_enable(pin_num) };
        };
        unsafe {
            self.pin_driver
                .subscribe(isr_callback)
                .map_err(map_enable_disable_errors)?;
        };

        self.pin_driver
            .enable_interrupt()
            .map_err(map_enable_disable_errors)
    }

    /// Removes the subscribed callback, if any, leaving the pin as a plain input.
    ///
    /// # Errors
    ///
    /// - `DigitalInError::InvalidPin`: If the unsubscription fails.
    /// - `DigitalInError::StateAlreadySet`: If the ISR service has not been initialized.
    pub fn unsubscribe(&mut self) -> Result<(), DigitalInError> {
        if self.interrupt_type.take().is_none() {
            return Ok(());
        }
        self.pin_driver
            .unsubscribe()
            .map_err(map_enable_disable_errors)
    }

    /// Gets the current pin level
    ///
    /// # Returns
    ///
    /// The current `Level` of the pin.
    pub fn get_level(&self) -> Level {
        self.pin_driver.get_level()
    }

    /// Verifies if the pin level is High
    ///
    /// # Returns
    ///
    /// `true` if the pin level is `High`, otherwise `false`.
    pub fn is_high(&self) -> bool {
        self.pin_driver.get_level() == Level::High
    }

    /// Verifies if the pin level is Low
    ///
    /// # Returns
    ///
    /// `true` if the pin level is `Low`, otherwise `false`.
    pub fn is_low(&self) -> bool {
        self.pin_driver.get_level() == Level::Low
    }
}
