use crate::{
    gpio::{DigitalInError, DigitalOutError},
    sensors::HCSR04Error,
};

/// Enums every error the framework drivers can produce, so callers can hold a
/// single error type when combining drivers
#[derive(Debug)]
pub enum Esp32SonarError {
    DigitalIn(DigitalInError),
    DigitalOut(DigitalOutError),
    HCSR04(HCSR04Error),
}

impl From<DigitalInError> for Esp32SonarError {
    fn from(value: DigitalInError) -> Self {
        Esp32SonarError::DigitalIn(value)
    }
}

impl From<DigitalOutError> for Esp32SonarError {
    fn from(value: DigitalOutError) -> Self {
        Esp32SonarError::DigitalOut(value)
    }
}

impl From<HCSR04Error> for Esp32SonarError {
    fn from(value: HCSR04Error) -> Self {
        Esp32SonarError::HCSR04(value)
    }
}
