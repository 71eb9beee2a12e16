//! Functions exported to foreign callers through uniffi.
//!
//! These wrap the Rust API with the built-in tank catalog and JSON-string
//! inputs, which is what the web and mobile front ends hold.

use crate::error::GasError;
use crate::gas::{compressibility_factor, format_gas_mix, parse_gas_mix, real_gas_volume};
use crate::models::{legacy_lines, GasMix, ProfileData};
use crate::report::{DiveGasInput, GasReport};
use crate::tanks::{TankCatalog, TankSpec};

#[uniffi::export]
pub fn compute_gas_report(input: DiveGasInput) -> GasReport {
    GasReport::compute(&input, TankCatalog::builtin())
}

/// Report from raw dive-record fields. A malformed `profile_json` is logged
/// and ignored, so figures fall back to whole-dive averages.
#[uniffi::export]
pub fn gas_report(
    gas_bottles_used: Option<String>,
    profile_json: Option<String>,
    duration_minutes: Option<f64>,
    average_depth_m: Option<f64>,
) -> GasReport {
    let profile = profile_json.and_then(|raw| match ProfileData::from_json(&raw) {
        Ok(profile) => Some(profile),
        Err(e) => {
            log::warn!("ignoring profile data: {e}");
            None
        }
    });

    compute_gas_report(DiveGasInput {
        gas_bottles_used,
        profile,
        duration_minutes,
        average_depth_m,
    })
}

#[uniffi::export]
pub fn gas_report_json(
    gas_bottles_used: Option<String>,
    profile_json: Option<String>,
    duration_minutes: Option<f64>,
    average_depth_m: Option<f64>,
) -> Result<String, GasError> {
    gas_report(
        gas_bottles_used,
        profile_json,
        duration_minutes,
        average_depth_m,
    )
    .to_json()
}

#[uniffi::export]
pub fn gas_mix_label(mix: GasMix) -> String {
    format_gas_mix(&mix)
}

#[uniffi::export]
pub fn parse_gas_label(label: String) -> Result<GasMix, GasError> {
    parse_gas_mix(&label)
}

#[uniffi::export]
pub fn gas_compressibility(bar: f64, mix: GasMix) -> f64 {
    compressibility_factor(bar, &mix)
}

#[uniffi::export]
pub fn gas_volume(size_liters: f64, bar: f64, mix: GasMix) -> f64 {
    real_gas_volume(size_liters, bar, &mix)
}

#[uniffi::export]
pub fn builtin_tank_catalog() -> Vec<TankSpec> {
    TankCatalog::builtin().tanks().to_vec()
}

#[uniffi::export]
pub fn split_legacy_gas_text(text: String) -> Vec<String> {
    legacy_lines(&text)
}
