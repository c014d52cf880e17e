mod utils;
mod microcontroller_src;

pub mod gpio;
pub mod sensors;

pub use microcontroller_src::Microcontroller;
pub use utils::esp32_sonar_error;
