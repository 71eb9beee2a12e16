//! Gas consumption and SAC (surface air consumption) rates.
//!
//! Pure functions over plain numbers. A consumption is only defined when both
//! pressures are present and the start pressure is above the end pressure;
//! anything else yields `None` rather than a zero or negative volume.
//! Results keep full precision; round only for display.

use crate::gas::compressibility::real_gas_volume;
use crate::models::GasMix;

/// Ambient pressure in ATA at an average depth in meters.
pub fn depth_ata(avg_depth_m: f64) -> f64 {
    avg_depth_m / 10.0 + 1.0
}

fn pressure_drop(start_bar: Option<f64>, end_bar: Option<f64>) -> Option<(f64, f64)> {
    let (start, end) = (start_bar?, end_bar?);
    (start > end).then_some((start, end))
}

/// Ideal-gas consumption in liters: pressure drop times water capacity.
pub fn ideal_consumption(
    size_liters: f64,
    start_bar: Option<f64>,
    end_bar: Option<f64>,
) -> Option<f64> {
    let (start, end) = pressure_drop(start_bar, end_bar)?;
    Some((start - end) * size_liters)
}

/// Compressibility-corrected consumption in surface liters, floored at 0.
pub fn real_consumption(
    size_liters: f64,
    start_bar: Option<f64>,
    end_bar: Option<f64>,
    mix: &GasMix,
) -> Option<f64> {
    let (start, end) = pressure_drop(start_bar, end_bar)?;
    let used = real_gas_volume(size_liters, start, mix) - real_gas_volume(size_liters, end, mix);
    Some(used.max(0.0))
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// SAC rate in L/min for a consumed volume over `duration_minutes` at
/// `avg_depth_m`. Undefined when the duration or depth is missing or not
/// positive.
pub fn sac_rate(
    consumed_liters: Option<f64>,
    duration_minutes: Option<f64>,
    avg_depth_m: Option<f64>,
) -> Option<f64> {
    let duration = positive(duration_minutes)?;
    let depth = positive(avg_depth_m)?;
    Some(consumed_liters? / duration / depth_ata(depth))
}

/// Round to one decimal place for display.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Display form of a rate or volume with one decimal, e.g. `13.2`.
pub fn format_rate(value: Option<f64>) -> Option<String> {
    value.map(|v| format!("{v:.1}"))
}
