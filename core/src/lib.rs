pub mod api;
pub mod consumption;
pub mod error;
pub mod gas;
pub mod models;
pub mod report;
pub mod tanks;
pub mod usage;

uniffi::setup_scaffolding!("divelog_gas");

pub use error::GasError;
pub use models::{
    legacy_lines, GasLeg, GasMix, GasUsage, ProfileData, ProfileEvent, ProfileSample,
    StructuredGasUsage, TankId,
};
pub use report::{CombinedSac, DiveGasInput, GasReport, LegReport};
pub use tanks::{TankCatalog, TankSpec};
pub use usage::{cylinder_usage, CylinderUsage};
