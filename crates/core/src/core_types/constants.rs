//! Physical constants (SI, CODATA 2018) used by the derivation engine.
//!
//! # References
//! - CODATA 2018 recommended values, NIST SP 961.
//! - NRL Plasma Formulary (2019) for the Coulomb logarithm conventions.

/// Boltzmann constant (J/K). Exact since the 2019 SI redefinition.
pub const BOLTZMANN: f64 = 1.380649e-23;

/// Vacuum magnetic permeability μ₀ (N/A²).
pub const MU_0: f64 = 1.25663706212e-6;

/// Vacuum electric permittivity ε₀ (F/m).
pub const EPSILON_0: f64 = 8.8541878128e-12;

/// Elementary charge (C). Exact since the 2019 SI redefinition.
pub const ELEMENTARY_CHARGE: f64 = 1.602176634e-19;

/// Proton mass (kg).
pub const PROTON_MASS: f64 = 1.67262192369e-27;

/// Electron mass (kg).
pub const ELECTRON_MASS: f64 = 9.1093837015e-31;

/// Alpha particle mass (kg).
pub const ALPHA_MASS: f64 = 6.6446573357e-27;

/// Astronomical unit (m). IAU 2012 exact definition.
pub const ASTRONOMICAL_UNIT: f64 = 1.495978707e11;

/// Polytropic index for a monatomic ideal gas, used by the specific entropy
/// diagnostic `S = p · ρ^(−γ)`.
pub const GAMMA: f64 = 5.0 / 3.0;

#[cfg(test)]
mod tests {
    use super::*;

    /// Thermal speed convention check: `m·w² = 2·k_B·T` must invert cleanly.
    /// A 1e5 K proton population has w = sqrt(2·k_B·T/m) ≈ 40.6 km/s.
    #[test]
    fn test_thermal_speed_convention_magnitude() {
        let t = 1e5;
        let w = (2.0 * BOLTZMANN * t / PROTON_MASS).sqrt();
        assert!(
            (w - 40.6e3).abs() < 0.2e3,
            "proton thermal speed at 1e5 K should be ~40.6 km/s, got {:.1} km/s",
            w / 1e3
        );
    }

    /// The alpha mass should be close to (but below) four proton masses due
    /// to nuclear binding energy.
    #[test]
    fn test_alpha_mass_vs_four_protons() {
        let ratio = ALPHA_MASS / PROTON_MASS;
        assert!(
            ratio > 3.9 && ratio < 4.0,
            "alpha/proton mass ratio should be just under 4, got {ratio:.4}"
        );
    }

    /// μ₀·ε₀·c² = 1 ties the electromagnetic constants together.
    #[test]
    fn test_electromagnetic_constant_consistency() {
        const SPEED_OF_LIGHT: f64 = 2.99792458e8;
        let product = MU_0 * EPSILON_0 * SPEED_OF_LIGHT * SPEED_OF_LIGHT;
        assert!(
            (product - 1.0).abs() < 1e-9,
            "mu0 * eps0 * c^2 should be 1, got {product}"
        );
    }
}
