pub mod esp32_sonar_error;
pub(crate) mod error_text_parser;
