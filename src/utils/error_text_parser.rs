use esp_idf_svc::sys::{EspError, ESP_ERR_INVALID_STATE};

use crate::gpio::DigitalInError;

pub fn map_enable_disable_errors(err: EspError) -> DigitalInError {
    match err.code() {
        ESP_ERR_INVALID_STATE => DigitalInError::StateAlreadySet,
        _ => DigitalInError::InvalidPin,
    }
}
