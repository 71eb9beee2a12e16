//! Gas report for a whole dive.
//!
//! Combines the decoded gas-usage record, the tank catalog and the optional
//! profile into per-cylinder figures plus a combined SAC. Nothing here fails:
//! missing or inconsistent data leaves the affected figure as `None`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::consumption::{ideal_consumption, real_consumption, sac_rate};
use crate::error::GasError;
use crate::gas::format_gas_mix;
use crate::models::{legacy_lines, GasLeg, GasUsage, ProfileData, StructuredGasUsage, TankId};
use crate::tanks::{TankCatalog, TankSpec};
use crate::usage::{cylinder_usage, CylinderUsage};

/// Everything the report needs from a dive record.
#[derive(Clone, Debug, Default, PartialEq, uniffi::Record)]
pub struct DiveGasInput {
    /// Raw `gas_bottles_used` field: structured JSON or legacy text
    pub gas_bottles_used: Option<String>,
    pub profile: Option<ProfileData>,
    /// Whole-dive duration in minutes
    pub duration_minutes: Option<f64>,
    /// Whole-dive average depth in meters
    pub average_depth_m: Option<f64>,
}

/// Figures for one cylinder.
#[derive(Clone, Debug, PartialEq, Serialize, uniffi::Record)]
pub struct LegReport {
    pub index: i32,
    pub tank_id: Option<TankId>,
    pub tank_name: Option<String>,
    pub tank_size_liters: Option<f64>,
    pub gas_label: String,
    pub start_pressure: Option<f64>,
    pub end_pressure: Option<f64>,
    pub consumed_liters: Option<f64>,
    pub real_consumed_liters: Option<f64>,
    pub ideal_sac: Option<f64>,
    pub real_sac: Option<f64>,
    /// False when the SAC uses whole-dive duration and depth because the
    /// profile had no window for this cylinder. The UI flags such figures
    /// as approximate.
    pub is_cylinder_specific: bool,
    pub used_duration: Option<f64>,
    pub used_avg_depth: Option<f64>,
}

impl LegReport {
    fn compute(
        leg: &GasLeg,
        catalog: &TankCatalog,
        windows: &BTreeMap<i32, CylinderUsage>,
        duration_minutes: Option<f64>,
        average_depth_m: Option<f64>,
    ) -> Self {
        let tank = leg.tank.as_ref().and_then(|id| lookup_tank(catalog, id));
        let size = tank.map(|t| t.size_liters);

        let consumed_liters =
            size.and_then(|s| ideal_consumption(s, leg.start_pressure, leg.end_pressure));
        let real_consumed_liters =
            size.and_then(|s| real_consumption(s, leg.start_pressure, leg.end_pressure, &leg.gas));

        let window = windows.get(&leg.index).filter(|w| w.duration_minutes > 0.0);
        let (used_duration, used_avg_depth, is_cylinder_specific) = match window {
            Some(w) => (Some(w.duration_minutes), w.avg_depth_m(), true),
            None => (duration_minutes, average_depth_m, false),
        };

        LegReport {
            index: leg.index,
            tank_id: leg.tank.clone(),
            tank_name: tank.map(|t| t.name.clone()),
            tank_size_liters: size,
            gas_label: format_gas_mix(&leg.gas),
            start_pressure: leg.start_pressure,
            end_pressure: leg.end_pressure,
            consumed_liters,
            real_consumed_liters,
            ideal_sac: sac_rate(consumed_liters, used_duration, used_avg_depth),
            real_sac: sac_rate(real_consumed_liters, used_duration, used_avg_depth),
            is_cylinder_specific,
            used_duration,
            used_avg_depth,
        }
    }

    /// Pressure drop for display, e.g. `200 → 50 bar`.
    pub fn pressure_label(&self) -> Option<String> {
        let start = self.start_pressure?;
        let end = self.end_pressure?;
        Some(format!("{start} → {end} bar"))
    }
}

fn lookup_tank<'a>(catalog: &'a TankCatalog, id: &TankId) -> Option<&'a TankSpec> {
    let tank = catalog.lookup(id);
    if tank.is_none() {
        log::warn!("unknown tank id '{}', consumption not computed", id.as_str());
    }
    tank
}

/// Consumption summed over every cylinder, normalised by whole-dive duration
/// and average depth.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, uniffi::Record)]
pub struct CombinedSac {
    pub consumed_liters: f64,
    pub real_consumed_liters: Option<f64>,
    pub ideal_sac: Option<f64>,
    pub real_sac: Option<f64>,
}

impl CombinedSac {
    /// `None` when no leg has a defined consumption. Legs without one are
    /// skipped rather than poisoning the total.
    fn compute<'a>(
        legs: impl Iterator<Item = &'a LegReport> + Clone,
        duration_minutes: Option<f64>,
        average_depth_m: Option<f64>,
    ) -> Option<Self> {
        let consumed_liters = sum_defined(legs.clone().map(|leg| leg.consumed_liters))?;
        let real_consumed_liters = sum_defined(legs.map(|leg| leg.real_consumed_liters));

        Some(CombinedSac {
            consumed_liters,
            real_consumed_liters,
            ideal_sac: sac_rate(Some(consumed_liters), duration_minutes, average_depth_m),
            real_sac: sac_rate(real_consumed_liters, duration_minutes, average_depth_m),
        })
    }
}

fn sum_defined(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    values.flatten().fold(None, |total, v| Some(total.unwrap_or(0.0) + v))
}

#[derive(Clone, Debug, PartialEq, Serialize, uniffi::Enum)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GasReport {
    /// Free-text gas record, one entry per line, shown verbatim.
    Legacy { lines: Vec<String> },
    Structured {
        back_gas: Option<LegReport>,
        stages: Vec<LegReport>,
        /// Filled whenever any leg has a defined consumption, single-cylinder
        /// dives included, where it repeats that leg's figures. Check
        /// `has_multiple_legs()` before showing it.
        combined: Option<CombinedSac>,
    },
}

impl GasReport {
    pub fn compute(input: &DiveGasInput, catalog: &TankCatalog) -> Self {
        let raw = input.gas_bottles_used.as_deref().unwrap_or_default();
        match GasUsage::parse(raw) {
            GasUsage::Legacy { text } => GasReport::Legacy {
                lines: legacy_lines(&text),
            },
            GasUsage::Structured { usage } => Self::structured(&usage, input, catalog),
        }
    }

    fn structured(
        usage: &StructuredGasUsage,
        input: &DiveGasInput,
        catalog: &TankCatalog,
    ) -> Self {
        let windows = input
            .profile
            .as_ref()
            .map(cylinder_usage)
            .unwrap_or_default();

        let leg_report = |leg: &GasLeg| {
            LegReport::compute(
                leg,
                catalog,
                &windows,
                input.duration_minutes,
                input.average_depth_m,
            )
        };
        let back_gas = usage.back_gas.as_ref().map(&leg_report);
        let stages: Vec<LegReport> = usage.stages.iter().map(&leg_report).collect();

        let combined = CombinedSac::compute(
            back_gas.iter().chain(stages.iter()),
            input.duration_minutes,
            input.average_depth_m,
        );

        GasReport::Structured {
            back_gas,
            stages,
            combined,
        }
    }

    pub fn legs(&self) -> Vec<&LegReport> {
        match self {
            GasReport::Legacy { .. } => Vec::new(),
            GasReport::Structured {
                back_gas, stages, ..
            } => back_gas.iter().chain(stages.iter()).collect(),
        }
    }

    /// Whether the combined figure is worth showing next to the per-leg ones.
    pub fn has_multiple_legs(&self) -> bool {
        self.legs().len() > 1
    }

    pub fn to_json(&self) -> Result<String, GasError> {
        serde_json::to_string(self).map_err(|e| GasError::Encode(e.to_string()))
    }
}
