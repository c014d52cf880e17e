//! Example using the HC-SR04 sensor with the non blocking, interrupt driven protocol.
//! A measurement is started and the loop polls for its completion, printing the distance
//! and starting the next cycle as soon as a result is consumed.

use esp32sonar::sensors::HCSR04;
use esp32sonar::Microcontroller;

fn main() {
    esp_idf_svc::log::EspLogger::initialize_default();

    let mut micro = Microcontroller::new();
    let trig = micro.set_pin_as_digital_out(5).unwrap();
    let echo = micro.set_pin_as_digital_in(6).unwrap();
    let mut sensor = HCSR04::new(trig, echo, 20.0, 400).unwrap();

    sensor.start_interrupt_measurement().unwrap();

    loop {
        if sensor.has_new_measurement().unwrap() {
            let distance = sensor.get_new_measurement();
            println!("{:?} cm", distance);

            sensor.start_interrupt_measurement().unwrap();
        }
        micro.sleep(60);
    }
}
