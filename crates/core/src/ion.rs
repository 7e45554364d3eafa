//! Single-species view over the measurement frame.
//!
//! An [`Ion`] is derived state, not separately persisted: the owning
//! [`crate::Plasma`] rebuilds its ions whenever the underlying frame is
//! replaced. It exposes the measured columns of one population (density,
//! velocity, thermal speed) and the first-order quantities derived from them
//! alone — mass density, thermal pressure, temperature, anisotropy.

use crate::core_types::constants::BOLTZMANN;
use crate::core_types::{attributes, Quantity, SpeciesAttributes, SpeciesToken, Tensor, Vector};
use crate::error::{PlasmaError, Result};
use crate::table::{MeasurementFrame, MeasurementType};

/// Tokens the attribute catalog recognizes, for error reporting.
const KNOWN_SPECIES: [&str; 7] = ["a", "a1", "a2", "e", "p", "p1", "p2"];

/// A read-only single-species slice of the plasma's core table plus its
/// physical attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Ion {
    token: SpeciesToken,
    attrs: SpeciesAttributes,
    density: Vec<f64>,
    velocity: Vector,
    thermal_speed: Tensor,
}

impl Ion {
    /// Extract the species' columns from a frame.
    ///
    /// Fails with [`PlasmaError::UnavailableSpecies`] when the token is not
    /// in the attribute catalog or the frame lacks its columns.
    pub fn from_frame(frame: &MeasurementFrame, token: &SpeciesToken) -> Result<Self> {
        let Some(attrs) = attributes(token) else {
            return Err(PlasmaError::UnavailableSpecies {
                requested: vec![token.as_str().to_string()],
                available: KNOWN_SPECIES.iter().map(ToString::to_string).collect(),
                unavailable: vec![token.as_str().to_string()],
            });
        };
        let missing = || PlasmaError::UnavailableSpecies {
            requested: vec![token.as_str().to_string()],
            available: frame
                .species_vocabulary()
                .iter()
                .map(|t| t.as_str().to_string())
                .collect(),
            unavailable: vec![token.as_str().to_string()],
        };
        let density = frame
            .scalar(MeasurementType::NumberDensity, token)
            .ok_or_else(missing)?
            .to_vec();
        let velocity = frame
            .vector(MeasurementType::Velocity, Some(token))
            .ok_or_else(missing)?;
        let thermal_speed = frame
            .tensor(MeasurementType::ThermalSpeed, token)
            .ok_or_else(missing)?;
        Ok(Ion {
            token: token.clone(),
            attrs,
            density,
            velocity,
            thermal_speed,
        })
    }

    /// Assemble an ion directly from component series, used by the electron
    /// estimate which has no measured columns to slice.
    pub(crate) fn from_parts(
        token: SpeciesToken,
        attrs: SpeciesAttributes,
        density: Vec<f64>,
        velocity: Vector,
        thermal_speed: Tensor,
    ) -> Self {
        Ion {
            token,
            attrs,
            density,
            velocity,
            thermal_speed,
        }
    }

    /// The population this ion views.
    pub fn token(&self) -> &SpeciesToken {
        &self.token
    }

    /// Physical attributes (mass, charge state).
    pub fn attrs(&self) -> SpeciesAttributes {
        self.attrs
    }

    /// Measured number density (cm⁻³).
    pub fn density(&self) -> &[f64] {
        &self.density
    }

    /// Measured bulk velocity (km/s).
    pub fn velocity(&self) -> &Vector {
        &self.velocity
    }

    /// Measured thermal speed tensor (km/s), including the derived scalar.
    pub fn thermal_speed(&self) -> &Tensor {
        &self.thermal_speed
    }

    /// Alias for [`Ion::thermal_speed`]: under the `m·w² = 2·k_B·T`
    /// convention the thermal speed is the most probable speed of the
    /// bi-Maxwellian.
    pub fn most_probable_speed(&self) -> &Tensor {
        &self.thermal_speed
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.density.len()
    }

    /// True when the view holds no samples.
    pub fn is_empty(&self) -> bool {
        self.density.is_empty()
    }

    /// Mass density ρ = n·m, displayed in proton masses per cm³.
    pub fn mass_density(&self) -> Vec<f64> {
        let n_scale = Quantity::NumberDensity.si_scale();
        let rho_scale = Quantity::MassDensity.si_scale();
        self.density
            .iter()
            .map(|n| n * n_scale * self.attrs.mass / rho_scale)
            .collect()
    }

    /// Thermal pressure tensor p = ½·n·m·w² per component (pPa).
    pub fn pressure(&self) -> Tensor {
        let press = |w: &[f64]| -> Vec<f64> {
            self.density
                .iter()
                .zip(w)
                .map(|(n, w)| {
                    let n_si = Quantity::NumberDensity.to_si(*n);
                    let w_si = Quantity::ThermalSpeed.to_si(*w);
                    Quantity::Pressure.from_si(0.5 * n_si * self.attrs.mass * w_si * w_si)
                })
                .collect()
        };
        // Component lengths already validated at construction.
        Tensor::new(
            press(self.thermal_speed.par()),
            press(self.thermal_speed.per()),
            press(self.thermal_speed.scalar()),
        )
        .unwrap_or_else(|_| unreachable!("ion component lengths are uniform"))
    }

    /// Temperature tensor T = ½·m·w²/k_B per component (K), following the
    /// thermal speed convention m·w² = 2·k_B·T.
    pub fn temperature(&self) -> Tensor {
        let temp = |w: &[f64]| -> Vec<f64> {
            w.iter()
                .map(|w| {
                    let w_si = Quantity::ThermalSpeed.to_si(*w);
                    0.5 * self.attrs.mass * w_si * w_si / BOLTZMANN
                })
                .collect()
        };
        Tensor::new(
            temp(self.thermal_speed.par()),
            temp(self.thermal_speed.per()),
            temp(self.thermal_speed.scalar()),
        )
        .unwrap_or_else(|_| unreachable!("ion component lengths are uniform"))
    }

    /// Temperature anisotropy (w_per/w_par)² = T_per/T_par, dimensionless.
    pub fn anisotropy(&self) -> Vec<f64> {
        self.thermal_speed
            .per()
            .iter()
            .zip(self.thermal_speed.par())
            .map(|(per, par)| (per / par) * (per / par))
            .collect()
    }

    /// Number density in SI (m⁻³).
    pub(crate) fn density_si(&self) -> Vec<f64> {
        let scale = Quantity::NumberDensity.si_scale();
        self.density.iter().map(|n| n * scale).collect()
    }

    /// Mass density in SI (kg/m³).
    pub(crate) fn mass_density_si(&self) -> Vec<f64> {
        let scale = Quantity::NumberDensity.si_scale();
        self.density
            .iter()
            .map(|n| n * scale * self.attrs.mass)
            .collect()
    }
}
