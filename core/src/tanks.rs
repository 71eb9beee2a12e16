//! Tank catalog: maps a tank id to its display name and water capacity.
//!
//! The built-in table is loaded once and never mutated. Deployments with a
//! different cylinder list can load a JSON catalog and merge it over the
//! built-in one.

use std::collections::HashSet;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::GasError;
use crate::models::TankId;

#[derive(Clone, Debug, PartialEq, Serialize, uniffi::Record)]
pub struct TankSpec {
    pub id: TankId,
    pub name: String,
    /// Water capacity in liters
    pub size_liters: f64,
}

/// id, display name, size in liters
const BUILTIN_TANKS: &[(&str, &str, f64)] = &[
    ("al40", "AL40 (5.7L)", 5.7),
    ("al63", "AL63 (9.0L)", 9.0),
    ("al80", "AL80 (11.1L)", 11.1),
    ("al100", "AL100 (13.0L)", 13.0),
    ("hp80", "HP80 (10.0L)", 10.0),
    ("hp100", "HP100 (12.9L)", 12.9),
    ("hp120", "HP120 (15.3L)", 15.3),
    ("lp85", "LP85 (13.0L)", 13.0),
    ("s3", "3 liter", 3.0),
    ("s5", "5 liter", 5.0),
    ("s7", "7 liter", 7.0),
    ("s10", "10 liter", 10.0),
    ("s12", "12 liter", 12.0),
    ("s15", "15 liter", 15.0),
    ("s18", "18 liter", 18.0),
    ("d7", "Double 7 liter (14L)", 14.0),
    ("d12", "Double 12 liter (24L)", 24.0),
];

static BUILTIN: LazyLock<TankCatalog> = LazyLock::new(|| TankCatalog {
    tanks: BUILTIN_TANKS
        .iter()
        .map(|&(id, name, size_liters)| TankSpec {
            id: TankId::from(id),
            name: name.to_string(),
            size_liters,
        })
        .collect(),
});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TankCatalog {
    tanks: Vec<TankSpec>,
}

#[derive(Deserialize)]
struct RawTankSpec {
    id: String,
    name: String,
    #[serde(alias = "size_liters")]
    size: f64,
}

impl TankCatalog {
    pub fn builtin() -> &'static TankCatalog {
        &BUILTIN
    }

    /// Build a catalog, rejecting empty ids, duplicate ids and non-positive sizes.
    pub fn new(tanks: Vec<TankSpec>) -> Result<Self, GasError> {
        let mut seen = HashSet::new();
        for tank in &tanks {
            if tank.id.as_str().trim().is_empty() {
                return Err(GasError::Catalog("empty tank id".to_string()));
            }
            if !(tank.size_liters.is_finite() && tank.size_liters > 0.0) {
                return Err(GasError::Catalog(format!(
                    "tank {} has invalid size {}",
                    tank.id.as_str(),
                    tank.size_liters
                )));
            }
            if !seen.insert(tank.id.clone()) {
                return Err(GasError::Catalog(format!(
                    "duplicate tank id {}",
                    tank.id.as_str()
                )));
            }
        }
        Ok(TankCatalog { tanks })
    }

    /// Load a catalog from a JSON array of `{ "id", "name", "size" }` objects.
    pub fn from_json(raw: &str) -> Result<Self, GasError> {
        let entries: Vec<RawTankSpec> =
            serde_json::from_str(raw).map_err(|e| GasError::Catalog(e.to_string()))?;
        Self::new(
            entries
                .into_iter()
                .map(|e| TankSpec {
                    id: TankId(e.id),
                    name: e.name,
                    size_liters: e.size,
                })
                .collect(),
        )
    }

    /// Entries of `overrides` replace same-id entries here; new ids are appended.
    pub fn merged(&self, overrides: &TankCatalog) -> TankCatalog {
        let mut tanks: Vec<TankSpec> = self
            .tanks
            .iter()
            .map(|tank| overrides.lookup(&tank.id).unwrap_or(tank).clone())
            .collect();
        for tank in &overrides.tanks {
            if self.lookup(&tank.id).is_none() {
                tanks.push(tank.clone());
            }
        }
        TankCatalog { tanks }
    }

    pub fn lookup(&self, id: &TankId) -> Option<&TankSpec> {
        self.tanks.iter().find(|tank| &tank.id == id)
    }

    pub fn size_liters(&self, id: &TankId) -> Option<f64> {
        self.lookup(id).map(|tank| tank.size_liters)
    }

    pub fn tanks(&self) -> &[TankSpec] {
        &self.tanks
    }
}
