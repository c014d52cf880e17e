//! Pure timing arithmetic for ultrasonic ranging: speed of sound corrected by the ambient
//! temperature, the derived echo timeout and the pulse width to distance conversion.

/// Speed of sound at 0°C in m/s.
const SOUND_SPEED_0C_M_S: f32 = 331.3;

/// Increase of the speed of sound per degree celsius, in m/s.
const SOUND_SPEED_PER_CELSIUS_M_S: f32 = 0.606;

/// Safety margin over the theoretical round trip time of the echo.
const TIMEOUT_THRESHOLD: f32 = 1.33;

const MIN_TEMPERATURE_C: f32 = 0.0;
const MAX_TEMPERATURE_C: f32 = 100.0;

pub const DEFAULT_TEMPERATURE_C: f32 = 20.0;
pub const DEFAULT_MAX_DISTANCE_CM: u16 = 400;

/// Returns the speed of sound in cm/µs for an ambient temperature in celsius. The linear
/// correction is valid between 0°C and 100°C, so the temperature is clamped to that range
/// before use.
pub fn speed_of_sound_cm_us(temperature_c: f32) -> f32 {
    let temperature_c = temperature_c.clamp(MIN_TEMPERATURE_C, MAX_TEMPERATURE_C);
    (SOUND_SPEED_0C_M_S + SOUND_SPEED_PER_CELSIUS_M_S * temperature_c) * 100.0 / 1_000_000.0
}

/// Returns the echo timeout in µs for a maximum detectable distance in centimeters, with a
/// safety margin over the theoretical round trip time. Used to bound blocking pulse reads
/// and the validity of a measured distance.
pub fn echo_timeout_us(max_distance_cm: u16, speed_of_sound_cm_us: f32) -> u32 {
    (TIMEOUT_THRESHOLD * max_distance_cm as f32 * 2.0 / speed_of_sound_cm_us) as u32
}

/// Converts an echo pulse width in µs into a distance in centimeters. The width is halved
/// because the pulse covers the round trip of the sound burst.
pub fn distance_cm(pulse_width_us: u32, speed_of_sound_cm_us: f32) -> f32 {
    pulse_width_us as f32 / 2.0 * speed_of_sound_cm_us
}

/// Configuration of an ultrasonic sensor instance.
/// - `temperature_c`: The ambient temperature in celsius, clamped to [0, 100]
/// - `max_distance_cm`: The maximum detectable distance in centimeters
/// - `speed_of_sound_cm_us` and `timeout_us` are derived and recomputed on every
///   temperature change
pub struct SensorConfig {
    temperature_c: f32,
    max_distance_cm: u16,
    speed_of_sound_cm_us: f32,
    timeout_us: u32,
}

impl SensorConfig {
    /// Creates a new config for an ambient temperature in celsius and a maximum detectable
    /// distance in centimeters, deriving the speed of sound and the echo timeout.
    pub fn new(temperature_c: f32, max_distance_cm: u16) -> SensorConfig {
        let mut config = SensorConfig {
            temperature_c: 0.0,
            max_distance_cm,
            speed_of_sound_cm_us: 0.0,
            timeout_us: 0,
        };
        config.set_temperature(temperature_c);
        config
    }

    /// Changes the ambient temperature, clamping it to the valid range and recomputing the
    /// speed of sound and the echo timeout.
    pub fn set_temperature(&mut self, temperature_c: f32) {
        self.temperature_c = temperature_c.clamp(MIN_TEMPERATURE_C, MAX_TEMPERATURE_C);
        self.speed_of_sound_cm_us = speed_of_sound_cm_us(self.temperature_c);
        self.timeout_us = echo_timeout_us(self.max_distance_cm, self.speed_of_sound_cm_us);
    }

    pub fn temperature(&self) -> f32 {
        self.temperature_c
    }

    pub fn max_distance(&self) -> u16 {
        self.max_distance_cm
    }

    pub fn speed_of_sound(&self) -> f32 {
        self.speed_of_sound_cm_us
    }

    pub fn timeout(&self) -> u32 {
        self.timeout_us
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        SensorConfig::new(DEFAULT_TEMPERATURE_C, DEFAULT_MAX_DISTANCE_CM)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test0_speed_of_sound_increases_with_temperature() {
        let mut previous = speed_of_sound_cm_us(0.0);
        for temperature in 1..=100 {
            let speed = speed_of_sound_cm_us(temperature as f32);
            assert!(speed > previous);
            previous = speed;
        }
    }

    #[test]
    fn test1_speed_of_sound_stays_in_physical_range() {
        // 331 m/s to 391 m/s expressed in cm/µs
        for temperature in 0..=100 {
            let speed = speed_of_sound_cm_us(temperature as f32);
            assert!(speed >= 0.03313);
            assert!(speed <= 0.03920);
        }
    }

    #[test]
    fn test2_temperature_is_clamped_on_both_bounds() {
        assert_eq!(speed_of_sound_cm_us(-40.0), speed_of_sound_cm_us(0.0));
        assert_eq!(speed_of_sound_cm_us(150.0), speed_of_sound_cm_us(100.0));
    }

    #[test]
    fn test3_distance_is_linear_in_pulse_width() {
        let speed = speed_of_sound_cm_us(20.0);
        assert_eq!(distance_cm(0, speed), 0.0);
        let unit = distance_cm(100, speed);
        assert!((distance_cm(300, speed) - 3.0 * unit).abs() < 1e-4);
        assert!((distance_cm(700, speed) - 7.0 * unit).abs() < 1e-4);
    }

    #[test]
    fn test4_known_distance_at_twenty_celsius() {
        let speed = speed_of_sound_cm_us(20.0);
        assert!((speed - 0.034342).abs() < 1e-5);
        let distance = distance_cm(1000, speed);
        assert!((distance - 17.17).abs() < 0.05);
    }

    #[test]
    fn test5_timeout_increases_with_max_distance() {
        let speed = speed_of_sound_cm_us(20.0);
        let mut previous = echo_timeout_us(50, speed);
        for max_distance in [100, 200, 400, 600] {
            let timeout = echo_timeout_us(max_distance, speed);
            assert!(timeout > previous);
            previous = timeout;
        }
    }

    #[test]
    fn test6_config_recomputes_derived_values_on_temperature_change() {
        let mut config = SensorConfig::new(20.0, 400);
        let cold_speed = config.speed_of_sound();
        let cold_timeout = config.timeout();

        config.set_temperature(40.0);
        assert!(config.speed_of_sound() > cold_speed);
        assert!(config.timeout() < cold_timeout);
        assert_eq!(config.max_distance(), 400);
    }

    #[test]
    fn test7_config_clamps_temperature() {
        let config = SensorConfig::new(-5.0, 400);
        assert_eq!(config.temperature(), 0.0);
        let config = SensorConfig::new(120.0, 400);
        assert_eq!(config.temperature(), 100.0);
    }
}
