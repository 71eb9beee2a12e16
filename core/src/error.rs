use thiserror::Error;

/// Error type for the fallible edges of the gas core: label parsing,
/// catalog loading and profile decoding. Consumption math never errors.
#[derive(Error, Debug, Clone, PartialEq, uniffi::Error)]
#[uniffi(flat_error)]
pub enum GasError {
    #[error("invalid gas mix '{label}': {message}")]
    InvalidMix { label: String, message: String },

    #[error("invalid gas fractions: o2 {o2}%, he {he}%")]
    InvalidFraction { o2: f64, he: f64 },

    #[error("invalid tank catalog: {0}")]
    Catalog(String),

    #[error("invalid profile data: {0}")]
    Profile(String),

    #[error("failed to encode report: {0}")]
    Encode(String),
}
