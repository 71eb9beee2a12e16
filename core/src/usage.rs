//! Per-cylinder usage windows derived from a dive profile.
//!
//! Walks consecutive sample pairs and charges each interval's duration and
//! time-weighted depth to the cylinder that was active at the interval start,
//! as given by the profile's gas-change events.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{ProfileData, ProfileEvent};

/// A gas change at or before this time (minutes) selects the cylinder the
/// dive started on.
pub const INITIAL_EVENT_WINDOW_MINUTES: f64 = 0.05;

/// Slack when matching a gas-change time to an interval start (minutes).
/// The value is arbitrary: alignment of events to samples is best effort.
pub const EVENT_TIME_TOLERANCE_MINUTES: f64 = 0.001;

/// Cylinder assumed active when no gas change covers the dive start.
pub const DEFAULT_CYLINDER: i32 = 0;

/// Accumulated time and depth for one cylinder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, uniffi::Record)]
pub struct CylinderUsage {
    pub cylinder: i32,
    /// Total minutes breathed from this cylinder
    pub duration_minutes: f64,
    /// Sum of interval mean depth times interval length (m·min)
    pub depth_sum: f64,
}

impl CylinderUsage {
    /// Time-weighted average depth while this cylinder was in use.
    pub fn avg_depth_m(&self) -> Option<f64> {
        (self.duration_minutes > 0.0).then(|| self.depth_sum / self.duration_minutes)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct GasSwitch {
    time_minutes: f64,
    cylinder: i32,
}

fn gas_switches(events: &[ProfileEvent]) -> Vec<GasSwitch> {
    let mut switches: Vec<GasSwitch> = events
        .iter()
        .filter_map(|event| {
            Some(GasSwitch {
                time_minutes: event.time_minutes,
                cylinder: event.gas_change_cylinder()?,
            })
        })
        .collect();
    switches.sort_by(|a, b| a.time_minutes.total_cmp(&b.time_minutes));
    switches
}

/// Most recent switch at or before `t0`, within tolerance. `switches` is sorted.
fn active_cylinder(switches: &[GasSwitch], t0: f64) -> Option<i32> {
    switches
        .iter()
        .rev()
        .find(|s| s.time_minutes <= t0 + EVENT_TIME_TOLERANCE_MINUTES)
        .map(|s| s.cylinder)
}

/// Usage per cylinder index. Empty unless the profile has at least two
/// samples and one gas-change event.
pub fn cylinder_usage(profile: &ProfileData) -> BTreeMap<i32, CylinderUsage> {
    let mut usage = BTreeMap::new();

    let switches = gas_switches(&profile.events);
    if profile.samples.len() < 2 || switches.is_empty() {
        return usage;
    }

    let initial = switches
        .iter()
        .rev()
        .find(|s| s.time_minutes <= INITIAL_EVENT_WINDOW_MINUTES)
        .map(|s| s.cylinder)
        .unwrap_or(DEFAULT_CYLINDER);

    for pair in profile.samples.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        let dt = end.time_minutes - start.time_minutes;
        if dt.is_nan() || dt <= 0.0 {
            continue;
        }

        let cylinder = active_cylinder(&switches, start.time_minutes).unwrap_or(initial);
        let entry = usage.entry(cylinder).or_insert(CylinderUsage {
            cylinder,
            ..Default::default()
        });
        entry.duration_minutes += dt;
        entry.depth_sum += (start.depth + end.depth) / 2.0 * dt;
    }

    log::debug!(
        "derived usage windows for {} cylinder(s) from {} samples and {} gas changes",
        usage.len(),
        profile.samples.len(),
        switches.len()
    );

    usage
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProfileSample;

    fn sample(time_minutes: f64, depth: f64) -> ProfileSample {
        ProfileSample {
            time_minutes,
            depth,
        }
    }

    fn profile(samples: Vec<ProfileSample>, events: Vec<ProfileEvent>) -> ProfileData {
        ProfileData { samples, events }
    }

    #[test]
    fn test_two_cylinders_split_at_switch() {
        let data = profile(
            vec![
                sample(0.0, 0.0),
                sample(5.0, 20.0),
                sample(10.0, 20.0),
                sample(20.0, 30.0),
                sample(40.0, 0.0),
            ],
            vec![
                ProfileEvent::gas_change(10.0, 0),
                ProfileEvent::gas_change(0.0, 1),
            ],
        );

        let usage = cylinder_usage(&data);
        assert_eq!(usage.len(), 2);

        let stage = usage[&1];
        assert!((stage.duration_minutes - 10.0).abs() < 1e-9);
        assert!((stage.avg_depth_m().unwrap() - 15.0).abs() < 1e-9);

        let back = usage[&0];
        assert!((back.duration_minutes - 30.0).abs() < 1e-9);
        assert!((back.avg_depth_m().unwrap() - 550.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_initial_cylinder_defaults_to_zero() {
        let data = profile(
            vec![sample(0.0, 0.0), sample(10.0, 20.0), sample(20.0, 20.0)],
            vec![ProfileEvent::gas_change(10.0, 2)],
        );

        let usage = cylinder_usage(&data);
        assert!((usage[&0].duration_minutes - 10.0).abs() < 1e-9);
        assert!((usage[&2].duration_minutes - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_near_zero_event_sets_initial_cylinder() {
        let data = profile(
            vec![sample(0.0, 0.0), sample(10.0, 20.0)],
            vec![ProfileEvent::gas_change(0.03, 3)],
        );

        let usage = cylinder_usage(&data);
        assert_eq!(usage.keys().copied().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_event_time_tolerance() {
        let data = profile(
            vec![sample(0.0, 10.0), sample(10.0, 10.0), sample(20.0, 10.0)],
            vec![
                ProfileEvent::gas_change(0.0, 0),
                ProfileEvent::gas_change(10.0005, 1),
            ],
        );

        let usage = cylinder_usage(&data);
        assert!((usage[&0].duration_minutes - 10.0).abs() < 1e-9);
        assert!((usage[&1].duration_minutes - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_positive_intervals_skipped() {
        let data = profile(
            vec![
                sample(0.0, 0.0),
                sample(5.0, 10.0),
                sample(5.0, 12.0),
                sample(4.0, 12.0),
                sample(10.0, 10.0),
            ],
            vec![ProfileEvent::gas_change(0.0, 0)],
        );

        let usage = cylinder_usage(&data);
        // Only [0,5] and [4,10] have positive length
        assert!((usage[&0].duration_minutes - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_gas_changes_gives_no_windows() {
        let data = profile(vec![sample(0.0, 0.0), sample(10.0, 20.0)], vec![]);
        assert!(cylinder_usage(&data).is_empty());

        let bookmark = ProfileEvent {
            name: "bookmark".to_string(),
            time_minutes: 0.0,
            cylinder: Some(1),
        };
        let data = profile(vec![sample(0.0, 0.0), sample(10.0, 20.0)], vec![bookmark]);
        assert!(cylinder_usage(&data).is_empty());
    }

    #[test]
    fn test_no_samples_gives_no_windows() {
        let data = profile(vec![], vec![ProfileEvent::gas_change(0.0, 1)]);
        assert!(cylinder_usage(&data).is_empty());
    }

    #[test]
    fn test_avg_depth_undefined_without_duration() {
        assert_eq!(CylinderUsage::default().avg_depth_m(), None);
    }
}
