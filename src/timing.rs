//! Temperature compensated stage timing
//!
//! Cold glass needs longer drive pulses. Each waveform stage runs for the model's
//! base time scaled by a step multiplier (in tenths) picked from the panel
//! temperature.

use crate::config::PanelModel;

/// Inclusive upper temperature bounds (millidegrees Celsius) and multipliers in tenths
const MULTIPLIERS: [(i32, u32); 7] = [
    (-10_000, 170),
    (-5_000, 120),
    (5_000, 80),
    (10_000, 40),
    (15_000, 30),
    (20_000, 20),
    (40_000, 10),
];

/// Multiplier above the last bound
const HOT_MULTIPLIER: u32 = 7;

/// Stage time multiplier, in tenths, for a temperature in millidegrees Celsius
pub fn temperature_multiplier(millicelsius: i32) -> u32 {
    MULTIPLIERS
        .iter()
        .find(|&&(bound, _)| millicelsius <= bound)
        .map_or(HOT_MULTIPLIER, |&(_, multiplier)| multiplier)
}

/// Duration of one waveform stage in milliseconds, rounded up
pub fn stage_time_ms(model: PanelModel, millicelsius: i32) -> u32 {
    (model.base_stage_time_ms() * temperature_multiplier(millicelsius)).div_ceil(10)
}
