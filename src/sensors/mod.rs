mod hc_sr04;
mod pulse_timer;

pub use {hc_sr04::*, pulse_timer::*};
