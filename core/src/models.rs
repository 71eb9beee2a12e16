//! Input value types for gas-usage computation.
//!
//! Everything here is read-only view data decoded from a dive record. JSON
//! decoding is deliberately forgiving: numeric fields accept numbers or
//! numeric strings, and anything that does not decode as a structured record
//! is kept as legacy free text instead of failing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GasError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TankId(pub String);

uniffi::custom_newtype!(TankId, String);

impl TankId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TankId {
    fn from(id: &str) -> Self {
        TankId(id.to_string())
    }
}

/// Breathing gas as O2 and He percentages; nitrogen is the remainder.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, uniffi::Record)]
pub struct GasMix {
    /// Oxygen percentage (0-100)
    pub o2: f64,
    /// Helium percentage (0-100)
    pub he: f64,
}

impl GasMix {
    pub const AIR: GasMix = GasMix { o2: 21.0, he: 0.0 };

    /// Build a mix, rejecting fractions outside 0-100% or summing above 100%.
    pub fn new(o2: f64, he: f64) -> Result<Self, GasError> {
        let in_range = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
        if !in_range(o2) || !in_range(he) || o2 + he > 100.0 {
            return Err(GasError::InvalidFraction { o2, he });
        }
        Ok(GasMix { o2, he })
    }

    pub fn n2(&self) -> f64 {
        100.0 - self.o2 - self.he
    }
}

impl Default for GasMix {
    fn default() -> Self {
        GasMix::AIR
    }
}

/// One cylinder's usage record.
#[derive(Clone, Debug, PartialEq, Serialize, uniffi::Record)]
pub struct GasLeg {
    pub tank: Option<TankId>,
    pub gas: GasMix,
    /// Fill pressure at the start of the dive (bar)
    pub start_pressure: Option<f64>,
    /// Remaining pressure at the end of the dive (bar)
    pub end_pressure: Option<f64>,
    /// Cylinder identity, matched against profile gas-change events
    pub index: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, uniffi::Record)]
pub struct StructuredGasUsage {
    pub back_gas: Option<GasLeg>,
    pub stages: Vec<GasLeg>,
}

impl StructuredGasUsage {
    /// Back gas first, then stages in record order.
    pub fn legs(&self) -> impl Iterator<Item = &GasLeg> {
        self.back_gas.iter().chain(self.stages.iter())
    }

    pub fn leg_count(&self) -> usize {
        self.back_gas.iter().count() + self.stages.len()
    }
}

/// Decoded `gas_bottles_used` field.
#[derive(Clone, Debug, PartialEq, uniffi::Enum)]
pub enum GasUsage {
    /// Free text that is shown as-is and never computed on.
    Legacy { text: String },
    Structured { usage: StructuredGasUsage },
}

impl GasUsage {
    pub const STRUCTURED_MODE: &'static str = "structured";

    /// Decode a raw `gas_bottles_used` value.
    ///
    /// The structured variant is chosen only when the text parses as a JSON
    /// object with `mode: "structured"` whose legs decode; every other input,
    /// including malformed JSON, is legacy text.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return GasUsage::Legacy {
                text: String::new(),
            };
        }

        let legacy = || GasUsage::Legacy {
            text: raw.to_string(),
        };

        let value = match serde_json::from_str::<Value>(raw) {
            Ok(value) => value,
            Err(e) => {
                log::debug!("gas usage is not JSON ({e}), treating as legacy text");
                return legacy();
            }
        };

        let is_structured = match &value {
            Value::Object(fields) => {
                fields.get("mode").and_then(Value::as_str) == Some(Self::STRUCTURED_MODE)
            }
            _ => false,
        };
        if !is_structured {
            log::debug!("gas usage JSON is not a structured object, treating as legacy text");
            return legacy();
        }

        match serde_json::from_value::<RawGasUsage>(value) {
            Ok(record) => GasUsage::Structured {
                usage: record.into_structured(),
            },
            Err(e) => {
                log::debug!("structured gas usage failed to decode ({e}), treating as legacy text");
                legacy()
            }
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, GasUsage::Structured { .. })
    }
}

/// Split legacy gas text into display lines, verbatim.
pub fn legacy_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n').map(str::to_string).collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, uniffi::Record)]
pub struct ProfileSample {
    pub time_minutes: f64,
    /// Depth in meters
    pub depth: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, uniffi::Record)]
pub struct ProfileEvent {
    pub name: String,
    pub time_minutes: f64,
    pub cylinder: Option<i32>,
}

impl ProfileEvent {
    pub const GAS_CHANGE: &'static str = "gaschange";

    pub fn gas_change(time_minutes: f64, cylinder: i32) -> Self {
        ProfileEvent {
            name: Self::GAS_CHANGE.to_string(),
            time_minutes,
            cylinder: Some(cylinder),
        }
    }

    /// Cylinder switched to, if this is a usable gas-change event.
    pub fn gas_change_cylinder(&self) -> Option<i32> {
        if self.name == Self::GAS_CHANGE {
            self.cylinder
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, uniffi::Record)]
pub struct ProfileData {
    pub samples: Vec<ProfileSample>,
    pub events: Vec<ProfileEvent>,
}

impl ProfileData {
    /// Decode `profile_data` JSON. Samples or events missing their time (or a
    /// sample missing its depth) are dropped rather than rejected.
    pub fn from_json(raw: &str) -> Result<Self, GasError> {
        let raw: RawProfile =
            serde_json::from_str(raw).map_err(|e| GasError::Profile(e.to_string()))?;
        Ok(raw.into())
    }

    pub fn has_gas_changes(&self) -> bool {
        self.events.iter().any(|e| e.gas_change_cylinder().is_some())
    }
}

// ============================================================================
// Wire decoding
// ============================================================================

#[derive(Deserialize)]
struct RawGasUsage {
    #[serde(default, deserialize_with = "lenient::object")]
    back_gas: Option<RawGasLeg>,
    #[serde(default, deserialize_with = "lenient::objects")]
    stages: Option<Vec<RawGasLeg>>,
}

impl RawGasUsage {
    fn into_structured(self) -> StructuredGasUsage {
        StructuredGasUsage {
            back_gas: self.back_gas.map(|leg| leg.into_leg(0)),
            stages: self
                .stages
                .unwrap_or_default()
                .into_iter()
                .enumerate()
                .map(|(position, leg)| leg.into_leg(position as i32 + 1))
                .collect(),
        }
    }
}

#[derive(Deserialize)]
struct RawGasLeg {
    #[serde(default, deserialize_with = "lenient::tank_id")]
    tank: Option<TankId>,
    #[serde(default, deserialize_with = "lenient::object")]
    gas: Option<RawGasMix>,
    #[serde(default, deserialize_with = "lenient::number")]
    start_pressure: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pressure: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    end_pressure: Option<f64>,
    #[serde(default, deserialize_with = "lenient::integer")]
    index: Option<i32>,
}

impl RawGasLeg {
    fn into_leg(self, default_index: i32) -> GasLeg {
        GasLeg {
            tank: self.tank,
            gas: self.gas.map(GasMix::from).unwrap_or_default(),
            start_pressure: self.start_pressure.or(self.pressure),
            end_pressure: self.end_pressure,
            index: self.index.unwrap_or(default_index),
        }
    }
}

#[derive(Deserialize)]
struct RawGasMix {
    #[serde(default, deserialize_with = "lenient::number")]
    o2: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    he: Option<f64>,
}

impl From<RawGasMix> for GasMix {
    fn from(raw: RawGasMix) -> Self {
        GasMix {
            o2: raw.o2.unwrap_or(GasMix::AIR.o2),
            he: raw.he.unwrap_or(0.0),
        }
    }
}

#[derive(Deserialize)]
struct RawProfile {
    #[serde(default)]
    samples: Option<Vec<RawSample>>,
    #[serde(default)]
    events: Option<Vec<RawEvent>>,
}

#[derive(Deserialize)]
struct RawSample {
    #[serde(default, deserialize_with = "lenient::number")]
    time_minutes: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    depth: Option<f64>,
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    time_minutes: Option<f64>,
    #[serde(default, deserialize_with = "lenient::integer")]
    cylinder: Option<i32>,
}

impl From<RawProfile> for ProfileData {
    fn from(raw: RawProfile) -> Self {
        let samples = raw
            .samples
            .unwrap_or_default()
            .into_iter()
            .filter_map(|s| {
                Some(ProfileSample {
                    time_minutes: s.time_minutes?,
                    depth: s.depth?,
                })
            })
            .collect();
        let events = raw
            .events
            .unwrap_or_default()
            .into_iter()
            .filter_map(|e| {
                Some(ProfileEvent {
                    name: e.name.unwrap_or_default(),
                    time_minutes: e.time_minutes?,
                    cylinder: e.cylinder,
                })
            })
            .collect();
        ProfileData { samples, events }
    }
}

mod lenient {
    use serde::de::{DeserializeOwned, Error, IgnoredAny};
    use serde::{Deserialize, Deserializer};
    use serde_json::{Map, Value};

    use super::TankId;

    /// Any JSON value; booleans, arrays and objects land in `Other` and
    /// decode as missing.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Number(f64),
        Text(String),
        #[allow(dead_code)]
        Other(IgnoredAny),
    }

    impl Scalar {
        fn as_f64(&self) -> Option<f64> {
            let value = match self {
                Scalar::Number(n) => *n,
                Scalar::Text(s) => s.trim().parse().ok()?,
                Scalar::Other(_) => return None,
            };
            value.is_finite().then_some(value)
        }
    }

    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Scalar>::deserialize(deserializer)?.and_then(|s| s.as_f64()))
    }

    pub fn integer<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(number(deserializer)?
            .filter(|v| v.fract() == 0.0 && *v >= i32::MIN as f64 && *v <= i32::MAX as f64)
            .map(|v| v as i32))
    }

    pub fn tank_id<'de, D>(deserializer: D) -> Result<Option<TankId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(
            Option::<Scalar>::deserialize(deserializer)?.and_then(|s| match s {
                Scalar::Text(text) => {
                    let text = text.trim();
                    (!text.is_empty()).then(|| TankId(text.to_string()))
                }
                Scalar::Number(n) if n.fract() == 0.0 => Some(TankId(format!("{}", n as i64))),
                Scalar::Number(n) => Some(TankId(n.to_string())),
                Scalar::Other(_) => None,
            }),
        )
    }

    /// Decode only from a JSON object; derived struct impls would otherwise
    /// also accept an array and fill fields by position.
    pub fn object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Option::<Map<String, Value>>::deserialize(deserializer)?
            .map(|fields| serde_json::from_value(Value::Object(fields)).map_err(D::Error::custom))
            .transpose()
    }

    pub fn objects<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Option::<Vec<Map<String, Value>>>::deserialize(deserializer)?
            .map(|entries| {
                entries
                    .into_iter()
                    .map(|fields| {
                        serde_json::from_value(Value::Object(fields)).map_err(D::Error::custom)
                    })
                    .collect()
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gas_mix_new_validates() {
        assert!(GasMix::new(32.0, 0.0).is_ok());
        assert!(GasMix::new(18.0, 45.0).is_ok());
        assert!(GasMix::new(100.0, 0.0).is_ok());
        assert_eq!(
            GasMix::new(80.0, 30.0),
            Err(GasError::InvalidFraction { o2: 80.0, he: 30.0 })
        );
        assert!(GasMix::new(-1.0, 0.0).is_err());
        assert!(GasMix::new(21.0, f64::NAN).is_err());
    }

    #[test]
    fn test_gas_mix_n2() {
        let mix = GasMix { o2: 18.0, he: 45.0 };
        assert!((mix.n2() - 37.0).abs() < f64::EPSILON);
        assert_eq!(GasMix::default(), GasMix::AIR);
    }

    #[test]
    fn test_parse_structured() {
        let raw = r#"{
            "mode": "structured",
            "back_gas": {"tank": "al80", "gas": {"o2": 32, "he": 0}, "start_pressure": 200, "end_pressure": 50, "index": 0},
            "stages": [
                {"tank": "al40", "gas": {"o2": 50}, "start_pressure": 200, "end_pressure": 120, "index": 1}
            ]
        }"#;

        let usage = match GasUsage::parse(raw) {
            GasUsage::Structured { usage } => usage,
            other => panic!("expected structured usage, got {other:?}"),
        };

        let back = usage.back_gas.as_ref().unwrap();
        assert_eq!(back.tank, Some(TankId::from("al80")));
        assert_eq!(back.gas, GasMix { o2: 32.0, he: 0.0 });
        assert_eq!(back.start_pressure, Some(200.0));
        assert_eq!(back.end_pressure, Some(50.0));
        assert_eq!(back.index, 0);

        assert_eq!(usage.stages.len(), 1);
        assert_eq!(usage.stages[0].gas, GasMix { o2: 50.0, he: 0.0 });
        assert_eq!(usage.stages[0].index, 1);
        assert_eq!(usage.leg_count(), 2);
    }

    #[test]
    fn test_parse_pressure_alias_and_string_numbers() {
        let raw = r#"{"mode":"structured","back_gas":{"tank":"12","gas":{"o2":"21","he":""},"pressure":"210","end_pressure":"60"}}"#;

        let usage = match GasUsage::parse(raw) {
            GasUsage::Structured { usage } => usage,
            other => panic!("expected structured usage, got {other:?}"),
        };

        let back = usage.back_gas.unwrap();
        assert_eq!(back.start_pressure, Some(210.0));
        assert_eq!(back.end_pressure, Some(60.0));
        assert_eq!(back.gas, GasMix::AIR);
        assert!(usage.stages.is_empty());
    }

    #[test]
    fn test_parse_numeric_tank_id_and_default_indices() {
        let raw = r#"{"mode":"structured","back_gas":{"tank":7},"stages":[{"tank":"al40"},{"tank":"al40"}]}"#;

        let usage = match GasUsage::parse(raw) {
            GasUsage::Structured { usage } => usage,
            other => panic!("expected structured usage, got {other:?}"),
        };

        assert_eq!(usage.back_gas.as_ref().unwrap().tank, Some(TankId::from("7")));
        let indices: Vec<i32> = usage.legs().map(|leg| leg.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_parse_legacy_text() {
        let raw = "12L Air\n200->50 bar";
        let usage = GasUsage::parse(raw);
        assert_eq!(
            usage,
            GasUsage::Legacy {
                text: raw.to_string()
            }
        );
        assert_eq!(legacy_lines(raw), vec!["12L Air", "200->50 bar"]);
    }

    #[test]
    fn test_parse_json_without_structured_mode_is_legacy() {
        let raw = r#"{"mode":"simple","back_gas":{"tank":"al80"}}"#;
        assert!(!GasUsage::parse(raw).is_structured());

        let raw = r#"{"back_gas":{"tank":"al80"}}"#;
        assert!(!GasUsage::parse(raw).is_structured());

        let raw = r#"[1, 2, 3]"#;
        assert!(!GasUsage::parse(raw).is_structured());
    }

    #[test]
    fn test_parse_json_array_is_legacy() {
        for raw in [
            r#"["structured"]"#,
            r#"["structured", {"index": 3}, []]"#,
            r#"{"mode":"structured","back_gas":["al80", {"o2": 21}, 200, 50, 0]}"#,
            r#"{"mode":"structured","stages":[["al40", {"o2": 50}, 200, 100, 1]]}"#,
            r#"{"mode":"structured","back_gas":{"tank":"al80","gas":[32, 0]}}"#,
        ] {
            assert_eq!(
                GasUsage::parse(raw),
                GasUsage::Legacy {
                    text: raw.to_string()
                },
                "{raw} should stay legacy text"
            );
        }
    }

    #[test]
    fn test_parse_wrongly_typed_field_only_drops_that_field() {
        let raw = r#"{"mode":"structured",
            "back_gas":{"tank":"al80","gas":{"o2":{"x":1},"he":false},"start_pressure":true,"end_pressure":50,"index":[0]},
            "stages":[{"tank":true,"start_pressure":200,"end_pressure":100}]}"#;

        let usage = match GasUsage::parse(raw) {
            GasUsage::Structured { usage } => usage,
            other => panic!("expected structured usage, got {other:?}"),
        };

        let back = usage.back_gas.unwrap();
        assert_eq!(back.tank, Some(TankId::from("al80")));
        assert_eq!(back.gas, GasMix::AIR);
        assert_eq!(back.start_pressure, None);
        assert_eq!(back.end_pressure, Some(50.0));
        assert_eq!(back.index, 0);

        assert_eq!(usage.stages[0].tank, None);
        assert_eq!(usage.stages[0].start_pressure, Some(200.0));
        assert_eq!(usage.stages[0].index, 1);
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(
            GasUsage::parse("   "),
            GasUsage::Legacy {
                text: String::new()
            }
        );
        assert!(legacy_lines("").is_empty());
    }

    #[test]
    fn test_legacy_lines_are_verbatim() {
        assert_eq!(legacy_lines("a\r\nb\r\n"), vec!["a\r", "b\r", ""]);
        assert_eq!(legacy_lines("  EAN32 \n\n15L"), vec!["  EAN32 ", "", "15L"]);
    }

    #[test]
    fn test_profile_from_json_drops_incomplete_entries() {
        let raw = r#"{
            "samples": [
                {"time_minutes": 0, "depth": 0},
                {"time_minutes": 1.5},
                {"time_minutes": "2", "depth": "12.5"}
            ],
            "events": [
                {"name": "gaschange", "time_minutes": 10, "cylinder": 1},
                {"name": "gaschange", "cylinder": 2},
                {"name": "bookmark", "time_minutes": 12}
            ]
        }"#;

        let profile = ProfileData::from_json(raw).unwrap();
        assert_eq!(
            profile.samples,
            vec![
                ProfileSample {
                    time_minutes: 0.0,
                    depth: 0.0
                },
                ProfileSample {
                    time_minutes: 2.0,
                    depth: 12.5
                },
            ]
        );
        assert_eq!(profile.events.len(), 2);
        assert_eq!(profile.events[0].gas_change_cylinder(), Some(1));
        assert_eq!(profile.events[1].gas_change_cylinder(), None);
        assert!(profile.has_gas_changes());
    }

    #[test]
    fn test_profile_from_json_invalid() {
        assert!(matches!(
            ProfileData::from_json("not json"),
            Err(GasError::Profile(_))
        ));
    }
}
