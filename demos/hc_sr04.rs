//! Example using the HC-SR04 sensor in blocking mode. Every second it measures the
//! distance of the object in front and prints it.

use esp32sonar::sensors::HCSR04;
use esp32sonar::Microcontroller;

fn main() {
    esp_idf_svc::log::EspLogger::initialize_default();

    let mut micro = Microcontroller::new();
    let trig = micro.set_pin_as_digital_out(5).unwrap();
    let echo = micro.set_pin_as_digital_in(6).unwrap();
    let mut sensor = HCSR04::with_defaults(trig, echo).unwrap();

    loop {
        let distance = sensor.measure().unwrap();
        println!("{:?} cm", distance);
        micro.sleep(1000);
    }
}
