//! Centralized display ↔ SI unit conversion table.
//!
//! Measurement columns and derivation results are stored in the conventional
//! solar-wind display units (densities in cm⁻³, speeds in km/s, magnetic
//! field in nT, pressures in pPa). Every formula converts its inputs to SI at
//! the boundary, evaluates, and converts the result back to the quantity's
//! own display unit. Keeping all scale factors in one table makes unit bugs
//! fixable in one place and testable independently of the physics.

use crate::core_types::constants::PROTON_MASS;

/// Physical quantity kinds known to the conversion layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    /// Number density, displayed in cm⁻³.
    NumberDensity,
    /// Bulk velocity, displayed in km/s.
    Velocity,
    /// Thermal speed, displayed in km/s.
    ThermalSpeed,
    /// Magnetic field, displayed in nT.
    MagneticField,
    /// Mass density, displayed in proton masses per cm³.
    MassDensity,
    /// Pressure (thermal or dynamic), displayed in pPa.
    Pressure,
    /// Temperature, displayed in K.
    Temperature,
    /// Plasma beta, dimensionless.
    Beta,
    /// Alfvén speed, displayed in km/s.
    AlfvenSpeed,
    /// Coulomb logarithm, dimensionless.
    CoulombLog,
    /// Collision frequency, displayed in Hz.
    CollisionRate,
    /// Coulomb number, dimensionless.
    CoulombNumber,
    /// Parallel heat flux, displayed in W/m².
    HeatFlux,
    /// Specific entropy proxy p·ρ^(−5/3), kept in SI.
    SpecificEntropy,
    /// Distance, displayed in km.
    Distance,
    /// Anything already dimensionless (anisotropy, VDF ratio).
    Dimensionless,
}

impl Quantity {
    /// Multiplier taking a value in display units to SI.
    pub fn si_scale(self) -> f64 {
        match self {
            Quantity::NumberDensity => 1e6,
            Quantity::Velocity | Quantity::ThermalSpeed | Quantity::AlfvenSpeed => 1e3,
            Quantity::MagneticField => 1e-9,
            Quantity::MassDensity => PROTON_MASS * 1e6,
            Quantity::Pressure => 1e-12,
            Quantity::Distance => 1e3,
            Quantity::Temperature
            | Quantity::Beta
            | Quantity::CoulombLog
            | Quantity::CollisionRate
            | Quantity::CoulombNumber
            | Quantity::HeatFlux
            | Quantity::SpecificEntropy
            | Quantity::Dimensionless => 1.0,
        }
    }

    /// Display unit label for log output and plots.
    pub fn label(self) -> &'static str {
        match self {
            Quantity::NumberDensity => "cm^-3",
            Quantity::Velocity | Quantity::ThermalSpeed | Quantity::AlfvenSpeed => "km/s",
            Quantity::MagneticField => "nT",
            Quantity::MassDensity => "m_p cm^-3",
            Quantity::Pressure => "pPa",
            Quantity::Temperature => "K",
            Quantity::CollisionRate => "Hz",
            Quantity::HeatFlux => "W m^-2",
            Quantity::Distance => "km",
            Quantity::SpecificEntropy => "SI",
            Quantity::Beta
            | Quantity::CoulombLog
            | Quantity::CoulombNumber
            | Quantity::Dimensionless => "-",
        }
    }

    /// Convert a single display-unit value to SI.
    #[inline]
    pub fn to_si(self, value: f64) -> f64 {
        value * self.si_scale()
    }

    /// Convert a single SI value back to display units.
    #[inline]
    pub fn from_si(self, value: f64) -> f64 {
        value / self.si_scale()
    }
}

/// Convert a whole series from display units to SI.
pub fn series_to_si(quantity: Quantity, values: &[f64]) -> Vec<f64> {
    let scale = quantity.si_scale();
    values.iter().map(|v| v * scale).collect()
}

/// Convert a whole series from SI back to display units.
pub fn series_from_si(quantity: Quantity, values: &[f64]) -> Vec<f64> {
    let scale = quantity.si_scale();
    values.iter().map(|v| v / scale).collect()
}
