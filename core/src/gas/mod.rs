//! Breathing gas helpers: display labels, label parsing and the real-gas
//! compressibility model.
//!
//! # Labels
//!
//! - `he > 0` formats as `Tx {o2}/{he}`
//! - `o2 == 21` formats as `Air`
//! - anything else formats as `EAN{o2}`
//!
//! # Example
//!
//! ```
//! use divelog_gas::gas::{format_gas_mix, parse_gas_mix};
//! use divelog_gas::GasMix;
//!
//! let mix = parse_gas_mix("Tx 18/45").expect("label should parse");
//! assert_eq!(mix, GasMix { o2: 18.0, he: 45.0 });
//! assert_eq!(format_gas_mix(&mix), "Tx 18/45");
//! assert_eq!(format_gas_mix(&GasMix::AIR), "Air");
//! ```

pub mod compressibility;
pub mod parser;

pub use compressibility::{compressibility_factor, real_gas_volume, ATM_BAR};
pub use parser::parse_gas_mix;

use crate::models::GasMix;

/// Short display label for a gas mix.
pub fn format_gas_mix(mix: &GasMix) -> String {
    if mix.he > 0.0 {
        format!("Tx {}/{}", format_percent(mix.o2), format_percent(mix.he))
    } else if mix.o2 == 21.0 {
        "Air".to_string()
    } else {
        format!("EAN{}", format_percent(mix.o2))
    }
}

fn format_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}
