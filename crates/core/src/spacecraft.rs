//! Spacecraft ephemeris collaborator.
//!
//! The core consumes a single series from the ephemeris: the heliocentric
//! distance, aligned to the plasma's timestamp axis. Only the Coulomb-number
//! diagnostic depends on it; a plasma without an attached spacecraft simply
//! has that formula family disabled.

use serde::{Deserialize, Serialize};

use crate::core_types::constants::ASTRONOMICAL_UNIT;
use crate::core_types::Quantity;

/// Minimal spacecraft ephemeris view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spacecraft {
    /// Spacecraft name, for log and error messages.
    pub name: String,
    /// Heliocentric distance (km), one sample per plasma timestamp.
    pub distance_to_sun: Vec<f64>,
}

impl Spacecraft {
    /// Build an ephemeris view from a distance series in km.
    pub fn new(name: &str, distance_to_sun: Vec<f64>) -> Self {
        Spacecraft {
            name: name.to_string(),
            distance_to_sun,
        }
    }

    /// Build from a distance series in astronomical units.
    pub fn from_au(name: &str, distance_au: Vec<f64>) -> Self {
        let km_per_au = Quantity::Distance.from_si(ASTRONOMICAL_UNIT);
        Spacecraft {
            name: name.to_string(),
            distance_to_sun: distance_au.iter().map(|d| d * km_per_au).collect(),
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.distance_to_sun.len()
    }

    /// True when the ephemeris holds no samples.
    pub fn is_empty(&self) -> bool {
        self.distance_to_sun.is_empty()
    }
}
