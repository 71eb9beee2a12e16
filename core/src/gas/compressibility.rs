//! Real-gas compressibility from a third-order virial expansion.
//!
//! Coefficients match Subsurface's gas model so volumes agree with what
//! divers see in that tool. Fractions are applied in permille.

use crate::models::GasMix;

/// One standard atmosphere (bar).
pub const ATM_BAR: f64 = 1.01325;

/// Working pressures are clamped to `[0, MAX_VIRIAL_PRESSURE_BAR]` before
/// evaluating the polynomial.
pub const MAX_VIRIAL_PRESSURE_BAR: f64 = 500.0;

const O2_COEFFICIENTS: [f64; 3] = [-7.18092073703e-4, 2.81852572808e-6, -1.50290620492e-9];
const N2_COEFFICIENTS: [f64; 3] = [-2.19260353292e-4, 2.92844845532e-6, -2.07613482075e-9];
const HE_COEFFICIENTS: [f64; 3] = [4.87320026468e-4, -8.83632921053e-8, 5.33304543646e-11];

fn virial(coefficients: &[f64; 3], p: f64) -> f64 {
    let p2 = p * p;
    let p3 = p2 * p;
    coefficients[0] * p + coefficients[1] * p2 + coefficients[2] * p3
}

/// Compressibility factor Z of `mix` at `bar`.
pub fn compressibility_factor(bar: f64, mix: &GasMix) -> f64 {
    let p = bar.clamp(0.0, MAX_VIRIAL_PRESSURE_BAR);

    let o2_permille = mix.o2 * 10.0;
    let he_permille = mix.he * 10.0;
    let n2_permille = 1000.0 - o2_permille - he_permille;

    let z_minus_1 = virial(&O2_COEFFICIENTS, p) * o2_permille
        + virial(&HE_COEFFICIENTS, p) * he_permille
        + virial(&N2_COEFFICIENTS, p) * n2_permille;

    z_minus_1 * 0.001 + 1.0
}

/// Surface-equivalent (1 atm) gas volume in liters held by a cylinder of
/// `size_liters` water capacity at `bar`.
pub fn real_gas_volume(size_liters: f64, bar: f64, mix: &GasMix) -> f64 {
    size_liters * (bar / ATM_BAR) / compressibility_factor(bar, mix)
}
