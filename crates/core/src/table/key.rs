//! Strongly-typed composite column keys.
//!
//! The source data convention keys every column by a three-part label
//! `(measurement type, component, species)`. Here that convention becomes a
//! typed [`ColumnKey`] so lookups never go through runtime string dispatch:
//! the key order is fixed by the struct field order and the sort order is the
//! derived lexicographic ordering, which makes column iteration
//! deterministic.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core_types::SpeciesToken;

/// The measurement types the model understands. Everything else that arrives
/// in a raw table is carried through as auxiliary data, untouched.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum MeasurementType {
    /// Spacecraft position, species-independent.
    Position,
    /// Magnetic field, species-independent.
    MagneticField,
    /// Number density of one population.
    NumberDensity,
    /// Bulk velocity of one population.
    Velocity,
    /// Thermal speed of one population.
    ThermalSpeed,
}

impl MeasurementType {
    /// Parse the loader-facing short label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "pos" => Some(MeasurementType::Position),
            "b" => Some(MeasurementType::MagneticField),
            "n" => Some(MeasurementType::NumberDensity),
            "v" => Some(MeasurementType::Velocity),
            "w" => Some(MeasurementType::ThermalSpeed),
            _ => None,
        }
    }

    /// The loader-facing short label.
    pub fn label(self) -> &'static str {
        match self {
            MeasurementType::Position => "pos",
            MeasurementType::MagneticField => "b",
            MeasurementType::NumberDensity => "n",
            MeasurementType::Velocity => "v",
            MeasurementType::ThermalSpeed => "w",
        }
    }

    /// True for quantities that never carry a species (field, position).
    pub fn is_species_independent(self) -> bool {
        matches!(
            self,
            MeasurementType::Position | MeasurementType::MagneticField
        )
    }
}

/// Component slot of a column: empty for scalars, Cartesian for vectors,
/// gyrotropic for thermal-speed-like tensors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Component {
    /// Scalar quantity, no component.
    None,
    /// Cartesian x.
    X,
    /// Cartesian y.
    Y,
    /// Cartesian z.
    Z,
    /// Parallel to the magnetic field.
    Par,
    /// Perpendicular to the magnetic field.
    Per,
    /// Isotropic-equivalent scalar of a gyrotropic tensor.
    Scalar,
}

impl Component {
    /// Parse the loader-facing label; the empty string is the scalar slot.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "" => Some(Component::None),
            "x" => Some(Component::X),
            "y" => Some(Component::Y),
            "z" => Some(Component::Z),
            "par" => Some(Component::Par),
            "per" => Some(Component::Per),
            "scalar" => Some(Component::Scalar),
            _ => None,
        }
    }

    /// The loader-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Component::None => "",
            Component::X => "x",
            Component::Y => "y",
            Component::Z => "z",
            Component::Par => "par",
            Component::Per => "per",
            Component::Scalar => "scalar",
        }
    }
}

/// The canonical three-part column key, in fixed order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnKey {
    /// What was measured.
    pub measurement: MeasurementType,
    /// Which component of it.
    pub component: Component,
    /// Which population, `None` for species-independent quantities.
    pub species: Option<SpeciesToken>,
}

impl ColumnKey {
    /// Assemble a key, checking the component/species vocabulary for the
    /// measurement type. Returns `None` when the combination is not part of
    /// the core model (such columns become auxiliary data).
    pub fn checked(
        measurement: MeasurementType,
        component: Component,
        species: Option<SpeciesToken>,
    ) -> Option<Self> {
        let component_ok = match measurement {
            MeasurementType::Position | MeasurementType::MagneticField
            | MeasurementType::Velocity => {
                matches!(component, Component::X | Component::Y | Component::Z)
            }
            MeasurementType::NumberDensity => matches!(component, Component::None),
            MeasurementType::ThermalSpeed => {
                matches!(component, Component::Par | Component::Per | Component::Scalar)
            }
        };
        let species_ok = measurement.is_species_independent() == species.is_none();
        if component_ok && species_ok {
            Some(ColumnKey {
                measurement,
                component,
                species,
            })
        } else {
            None
        }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let species = self.species.as_ref().map_or("", SpeciesToken::as_str);
        write!(
            f,
            "({}, {}, {})",
            self.measurement.label(),
            self.component.label(),
            species
        )
    }
}
