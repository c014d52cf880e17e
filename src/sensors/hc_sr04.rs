use std::sync::{
    atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering},
    Arc,
};

use esp_idf_svc::{hal::delay::Delay, sys::esp_timer_get_time};
use log::{debug, warn};

use crate::{
    gpio::{DigitalIn, DigitalInError, DigitalOut, DigitalOutError},
    sensors::pulse_timer::{
        distance_cm, SensorConfig, DEFAULT_MAX_DISTANCE_CM, DEFAULT_TEMPERATURE_C,
    },
};

type AtomicMeasurementCode = AtomicU8;

/// Duration of the trigger pulse. The datasheet asks for 10µs but 5µs is enough in practice.
const TRIGGER_PULSE_US: u32 = 5;

/// Settle time after driving the trigger low on construction.
const TRIGGER_SETTLE_US: u32 = 10;

/// Distance equivalent, in centimeters, of the time an armed cycle may stay silent before a
/// missed falling edge is suspected.
const STALL_DISTANCE_CM: f32 = 1300.0;

/// Enums the different errors possible when working with the HC-SR04
#[derive(Debug)]
pub enum HCSR04Error {
    TriggerPin(DigitalOutError),
    EchoPin(DigitalInError),
}

/// Lifecycle of an interrupt driven measurement, shared between the edge handler and the
/// polling reader as a single word
#[derive(PartialEq)]
enum MeasurementStatus {
    NoPending,
    Ready,
    Consumed,
}

impl MeasurementStatus {
    /// Retrieves the status as a `u8`.
    ///
    /// # Returns
    ///
    /// A `u8` representing the code corresponding to the variant of `MeasurementStatus`.
    fn get_code(self) -> u8 {
        self as u8
    }

    /// Converts the status code into an atomic version.
    ///
    /// # Returns
    ///
    /// An `AtomicMeasurementCode` initialized with the current status code.
    fn get_atomic_code(self) -> AtomicMeasurementCode {
        AtomicMeasurementCode::new(self.get_code())
    }

    /// Creates a `MeasurementStatus` variant from a given status code.
    ///
    /// # Arguments
    ///
    /// - `code`: A `u8` representing the status code.
    ///
    /// # Returns
    ///
    /// A `MeasurementStatus` variant corresponding to the provided code.
    fn from_code(code: u8) -> Self {
        match code {
            x if x == Self::NoPending.get_code() => Self::NoPending,
            x if x == Self::Ready.get_code() => Self::Ready,
            _ => Self::Consumed,
        }
    }

    /// Converts an `AtomicMeasurementCode` into a `MeasurementStatus` variant.
    ///
    /// # Arguments
    ///
    /// - `atomic_code`: A reference to the atomic status code.
    ///
    /// # Returns
    ///
    /// A `MeasurementStatus` variant corresponding to the loaded atomic code.
    fn from_atomic_code(atomic_code: &AtomicMeasurementCode) -> Self {
        MeasurementStatus::from_code(atomic_code.load(Ordering::Acquire))
    }
}

/// State shared between the echo edge handler and the polling reader. The handler is the
/// sole writer of the timestamps and the ready status, the reader is the sole consumer.
/// Every field is a single word, so neither side can observe a torn value.
///
/// One instance exists per sensor and reaches the handler through a capturing closure, so
/// multiple sensors never collide on shared state.
/// - `rising_us`: Timestamp of the last rising echo edge, in µs since boot
/// - `falling_us`: Timestamp of the last falling echo edge, in µs since boot
/// - `level_high`: Shadow of the echo pin level, toggled on every edge, telling the handler
///   which edge it is seeing and the reader whether the line looks stuck high
/// - `status`: An `AtomicMeasurementCode` carrying the `MeasurementStatus`
struct EchoCapture {
    rising_us: AtomicU32,
    falling_us: AtomicU32,
    level_high: AtomicBool,
    status: AtomicMeasurementCode,
}

impl EchoCapture {
    fn new() -> EchoCapture {
        EchoCapture {
            rising_us: AtomicU32::new(0),
            falling_us: AtomicU32::new(0),
            level_high: AtomicBool::new(false),
            status: MeasurementStatus::Consumed.get_atomic_code(),
        }
    }

    /// Clears the ready status so the next completed pulse can be reported.
    fn arm(&self) {
        self.status
            .store(MeasurementStatus::NoPending.get_code(), Ordering::SeqCst);
    }

    /// Seeds the level shadow with the real pin level, done once when the handler is attached.
    fn set_level_shadow(&self, high: bool) {
        self.level_high.store(high, Ordering::SeqCst);
    }

    fn level_shadow(&self) -> bool {
        self.level_high.load(Ordering::Acquire)
    }

    fn has_ready(&self) -> bool {
        MeasurementStatus::from_atomic_code(&self.status) == MeasurementStatus::Ready
    }

    /// Body of the edge handler, executed in interrupt context on every level change of the
    /// echo pin. It only toggles the level shadow and captures a timestamp; the falling edge
    /// additionally publishes the ready status. Conversion and recovery happen on the
    /// reader side.
    fn record_edge(&self, now_us: u32) {
        let went_high = !self.level_high.fetch_xor(true, Ordering::SeqCst);
        if went_high {
            self.rising_us.store(now_us, Ordering::SeqCst);
        } else {
            self.falling_us.store(now_us, Ordering::SeqCst);
            self.status
                .store(MeasurementStatus::Ready.get_code(), Ordering::SeqCst);
        }
    }

    /// Consumes a completed measurement, returning the echo pulse width in µs, or None if no
    /// measurement is ready.
    ///
    /// If the falling timestamp precedes the rising one the edges got desynchronized (timer
    /// wraparound or a missed edge mid cycle): both timestamps are reset and the level
    /// shadow is flipped so the handler resynchronizes on the next edge. The returned width
    /// is then 0, which callers must treat as an invalid cycle.
    fn consume(&self) -> Option<u32> {
        if !self.has_ready() {
            return None;
        }

        let rising = self.rising_us.load(Ordering::Acquire);
        let falling = self.falling_us.load(Ordering::Acquire);

        let width = if falling < rising {
            warn!("echo edges out of order ({rising}µs -> {falling}µs), resetting capture");
            self.rising_us.store(0, Ordering::SeqCst);
            self.falling_us.store(0, Ordering::SeqCst);
            self.level_high.fetch_xor(true, Ordering::SeqCst);
            0
        } else {
            falling - rising
        };

        self.status
            .store(MeasurementStatus::Consumed.get_code(), Ordering::SeqCst);
        Some(width)
    }
}

/// Time based guess that the falling edge of an armed cycle was missed: the elapsed time
/// since the trigger already maps to a distance beyond any plausible echo while the echo
/// line still reads high.
fn stall_suspected(elapsed_us: u32, speed_of_sound_cm_us: f32, level_high: bool) -> bool {
    distance_cm(elapsed_us, speed_of_sound_cm_us) > STALL_DISTANCE_CM && level_high
}

/// Microseconds since boot, truncated to a word. The counter wraps around every ~71 minutes,
/// which every elapsed time computation tolerates through wrapping subtraction.
fn now_us() -> u32 {
    unsafe { esp_timer_get_time() as u32 }
}

/// Driver for the HC-SR04 ultrasonic distance sensor, offering a blocking measurement and a
/// non blocking, interrupt driven one.
///
/// The interrupt driven protocol is `start_interrupt_measurement` /
/// `has_new_measurement` / `get_new_measurement`. At most one measurement cycle may be in
/// flight: starting a new cycle before consuming the previous result silently overwrites
/// it. Blocking and interrupt measurements share the trigger pin and must not be
/// interleaved.
/// - `trig`: A DigitalOut connected to the trigger pin
/// - `echo`: A DigitalIn connected to the echo pin
/// - `config`: The sensor configuration, owning the derived speed of sound and timeout
/// - `capture`: The state shared with the echo edge handler
pub struct HCSR04<'a> {
    trig: DigitalOut<'a>,
    echo: DigitalIn<'a>,
    config: SensorConfig,
    capture: Arc<EchoCapture>,
    delay: Delay,
    interrupt_attached: bool,
    measuring_start_us: u32,
}

impl<'a> HCSR04<'a> {
    /// Creates a new HCSR04 driver, leaving the trigger pin low and settled.
    ///
    /// # Arguments
    ///
    /// - `trig`: A DigitalOut connected to the trigger pin.
    /// - `echo`: A DigitalIn connected to the echo pin.
    /// - `temperature_c`: The ambient temperature in celsius, clamped to [0, 100].
    /// - `max_distance_cm`: The maximum detectable distance in centimeters.
    ///
    /// # Returns
    ///
    /// A `Result` containing the new `HCSR04` instance, or an `HCSR04Error` if the trigger
    /// pin cannot be driven.
    ///
    /// # Errors
    ///
    /// - `HCSR04Error::TriggerPin`: If the trigger pin cannot be set low.
    pub fn new(
        trig: DigitalOut<'a>,
        echo: DigitalIn<'a>,
        temperature_c: f32,
        max_distance_cm: u16,
    ) -> Result<HCSR04<'a>, HCSR04Error> {
        let mut sensor = HCSR04 {
            trig,
            echo,
            config: SensorConfig::new(temperature_c, max_distance_cm),
            capture: Arc::new(EchoCapture::new()),
            delay: Delay::new_default(),
            interrupt_attached: false,
            measuring_start_us: 0,
        };

        sensor.trig.set_low().map_err(HCSR04Error::TriggerPin)?;
        sensor.delay.delay_us(TRIGGER_SETTLE_US);
        Ok(sensor)
    }

    /// Creates a new HCSR04 driver with the default configuration of 20°C and 400cm.
    ///
    /// # Arguments
    ///
    /// - `trig`: A DigitalOut connected to the trigger pin.
    /// - `echo`: A DigitalIn connected to the echo pin.
    ///
    /// # Errors
    ///
    /// - `HCSR04Error::TriggerPin`: If the trigger pin cannot be set low.
    pub fn with_defaults(
        trig: DigitalOut<'a>,
        echo: DigitalIn<'a>,
    ) -> Result<HCSR04<'a>, HCSR04Error> {
        HCSR04::new(trig, echo, DEFAULT_TEMPERATURE_C, DEFAULT_MAX_DISTANCE_CM)
    }

    /// Changes the ambient temperature, recomputing the speed of sound and the echo timeout.
    ///
    /// # Arguments
    ///
    /// - `temperature_c`: The new ambient temperature in celsius, clamped to [0, 100].
    pub fn set_temperature(&mut self, temperature_c: f32) {
        self.config.set_temperature(temperature_c);
    }

    /// Measures the distance of the object in front of the sensor, blocking until the echo
    /// pulse completes or the configured timeout elapses.
    ///
    /// # Returns
    ///
    /// A `Result` containing the distance in centimeters. A distance of 0.0 means no echo
    /// was observed within the timeout (object out of range or sensor disconnected), which
    /// is a normal result and not an error.
    ///
    /// # Errors
    ///
    /// - `HCSR04Error::TriggerPin`: If the trigger pulse cannot be emitted.
    pub fn measure(&mut self) -> Result<f32, HCSR04Error> {
        self.send_trigger_pulse()?;

        match self.pulse_in_high(self.config.timeout()) {
            Some(width) => Ok(distance_cm(width, self.config.speed_of_sound())),
            None => Ok(0.0),
        }
    }

    /// Updates the ambient temperature and then measures, so the distance is computed with
    /// a speed of sound matching the new temperature.
    ///
    /// # Arguments
    ///
    /// - `temperature_c`: The new ambient temperature in celsius, clamped to [0, 100].
    ///
    /// # Errors
    ///
    /// - `HCSR04Error::TriggerPin`: If the trigger pulse cannot be emitted.
    pub fn measure_with_temperature(&mut self, temperature_c: f32) -> Result<f32, HCSR04Error> {
        self.set_temperature(temperature_c);
        self.measure()
    }

    /// Starts a non blocking measurement: arms the capture state, attaches the echo edge
    /// handler if it is not attached yet, emits the trigger pulse and records the issue
    /// time for the stall heuristic.
    ///
    /// Starting a new cycle while a previous result was not consumed silently overwrites it.
    ///
    /// # Errors
    ///
    /// - `HCSR04Error::EchoPin`: If the edge handler cannot be attached.
    /// - `HCSR04Error::TriggerPin`: If the trigger pulse cannot be emitted.
    pub fn start_interrupt_measurement(&mut self) -> Result<(), HCSR04Error> {
        self.capture.arm();

        if !self.interrupt_attached {
            self.attach_interrupt()?;
        }

        self.send_trigger_pulse()?;
        self.measuring_start_us = now_us();
        Ok(())
    }

    /// Checks, without blocking, whether a measurement completed since the last start.
    ///
    /// If no result arrived yet and the echo line looks stuck high long past any plausible
    /// echo, the falling edge was probably missed: a trigger pulse is re-emitted as a best
    /// effort recovery. The retry does not reset the capture state and is repeated on each
    /// poll while the stall persists.
    ///
    /// # Returns
    ///
    /// A `Result` containing `true` iff a new measurement is ready to be consumed.
    ///
    /// # Errors
    ///
    /// - `HCSR04Error::TriggerPin`: If the recovery trigger pulse cannot be emitted.
    pub fn has_new_measurement(&mut self) -> Result<bool, HCSR04Error> {
        if self.capture.has_ready() {
            return Ok(true);
        }

        let elapsed_us = now_us().wrapping_sub(self.measuring_start_us);
        if stall_suspected(
            elapsed_us,
            self.config.speed_of_sound(),
            self.capture.level_shadow(),
        ) {
            warn!("echo stuck high for {elapsed_us}µs, retriggering");
            self.send_trigger_pulse()?;
        }
        Ok(false)
    }

    /// Consumes the completed measurement and converts it to a distance in centimeters.
    ///
    /// Returns 0.0 without side effects when no measurement is ready, so draining twice in
    /// a row is harmless. A zero or negative result after a ready measurement means the
    /// cycle was invalid (desynchronized edges) and must be discarded by the caller.
    pub fn get_new_measurement(&mut self) -> f32 {
        match self.capture.consume() {
            Some(width) => distance_cm(width, self.config.speed_of_sound()),
            None => 0.0,
        }
    }

    /// Detaches the echo edge handler, ending interrupt driven measurements until the next
    /// `start_interrupt_measurement`.
    ///
    /// # Errors
    ///
    /// - `HCSR04Error::EchoPin`: If the handler cannot be unsubscribed.
    pub fn end_interrupt_measurement(&mut self) -> Result<(), HCSR04Error> {
        if self.interrupt_attached {
            self.echo.unsubscribe().map_err(HCSR04Error::EchoPin)?;
            self.interrupt_attached = false;
        }
        Ok(())
    }

    /// Subscribes the edge handler on the echo pin and seeds the level shadow with the real
    /// pin level, so the handler knows which edge to expect first.
    fn attach_interrupt(&mut self) -> Result<(), HCSR04Error> {
        let capture = self.capture.clone();
        self.echo
            .trigger_on_any_edge(move || capture.record_edge(now_us()))
            .map_err(HCSR04Error::EchoPin)?;

        self.capture.set_level_shadow(self.echo.is_high());
        self.interrupt_attached = true;
        debug!("echo edge handler attached");
        Ok(())
    }

    /// Emits the short high pulse on the trigger pin that initiates an ultrasonic burst.
    fn send_trigger_pulse(&mut self) -> Result<(), HCSR04Error> {
        self.trig.set_high().map_err(HCSR04Error::TriggerPin)?;
        self.delay.delay_us(TRIGGER_PULSE_US);
        self.trig.set_low().map_err(HCSR04Error::TriggerPin)
    }

    /// Busy waits for the echo pin to go high and then low again, returning the width of
    /// the high phase in µs, or None if either transition does not happen within
    /// `timeout_us`.
    fn pulse_in_high(&self, timeout_us: u32) -> Option<u32> {
        let issued = now_us();
        while self.echo.is_low() {
            if now_us().wrapping_sub(issued) > timeout_us {
                return None;
            }
        }

        let rising = now_us();
        while self.echo.is_high() {
            if now_us().wrapping_sub(rising) > timeout_us {
                return None;
            }
        }
        Some(now_us().wrapping_sub(rising))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sensors::pulse_timer::speed_of_sound_cm_us;

    #[test]
    fn test0_full_edge_sequence_produces_one_ready() {
        let capture = EchoCapture::new();
        capture.arm();

        capture.record_edge(1_000);
        assert!(!capture.has_ready());

        capture.record_edge(2_450);
        assert!(capture.has_ready());
        assert_eq!(capture.consume(), Some(1_450));
    }

    #[test]
    fn test1_round_trip_matches_pulse_timer_arithmetic() {
        let capture = EchoCapture::new();
        capture.arm();
        capture.record_edge(5_000);
        capture.record_edge(6_000);

        let width = capture.consume().unwrap();
        let speed = speed_of_sound_cm_us(20.0);
        assert_eq!(distance_cm(width, speed), distance_cm(1_000, speed));
    }

    #[test]
    fn test2_desynchronized_edges_reset_capture_and_flip_shadow() {
        let capture = EchoCapture::new();
        capture.arm();
        capture.record_edge(9_000);
        capture.record_edge(4_000);
        assert!(capture.has_ready());

        let shadow_before = capture.level_shadow();
        assert_eq!(capture.consume(), Some(0));
        assert_eq!(capture.rising_us.load(Ordering::Acquire), 0);
        assert_eq!(capture.falling_us.load(Ordering::Acquire), 0);
        assert_eq!(capture.level_shadow(), !shadow_before);
    }

    #[test]
    fn test3_consume_is_an_idempotent_drain() {
        let capture = EchoCapture::new();
        capture.arm();
        capture.record_edge(100);
        capture.record_edge(300);

        assert_eq!(capture.consume(), Some(200));
        assert_eq!(capture.consume(), None);
        assert_eq!(capture.rising_us.load(Ordering::Acquire), 100);
        assert_eq!(capture.falling_us.load(Ordering::Acquire), 300);
    }

    #[test]
    fn test4_fresh_capture_reports_nothing_and_no_stall() {
        let capture = EchoCapture::new();
        assert!(!capture.has_ready());
        assert_eq!(capture.consume(), None);

        let speed = speed_of_sound_cm_us(20.0);
        assert!(!stall_suspected(u32::MAX, speed, capture.level_shadow()));
    }

    #[test]
    fn test5_stall_needs_high_shadow_and_elapsed_threshold() {
        let speed = speed_of_sound_cm_us(20.0);
        // 1300cm of distance equivalent is ~75.7ms at 20°C
        assert!(!stall_suspected(10_000, speed, true));
        assert!(stall_suspected(100_000, speed, true));
        assert!(!stall_suspected(100_000, speed, false));
    }

    #[test]
    fn test6_rearming_clears_a_stale_ready() {
        let capture = EchoCapture::new();
        capture.arm();
        capture.record_edge(10);
        capture.record_edge(20);
        assert!(capture.has_ready());

        capture.arm();
        assert!(!capture.has_ready());
        assert_eq!(capture.consume(), None);
    }
}
