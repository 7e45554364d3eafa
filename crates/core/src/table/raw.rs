//! Loader-facing raw table.
//!
//! A [`RawTable`] is what the external table loader hands to
//! [`crate::Plasma::new`]: a shared timestamp axis plus columns keyed by the
//! three-part string convention `(measurement, component, species)`. The
//! exactly-three-part key shape is encoded in the [`RawColumn`] type itself;
//! vocabulary checks happen later, during frame construction, where unknown
//! keys degrade to auxiliary data instead of failing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One raw column with its three-part string key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawColumn {
    /// Measurement label, e.g. `"n"`, `"v"`, `"w"`, `"b"`, `"pos"`.
    pub measurement: String,
    /// Component label: `""`, `"x"`/`"y"`/`"z"`, or `"par"`/`"per"`/`"scalar"`.
    pub component: String,
    /// Species token, `""` for species-independent quantities.
    pub species: String,
    /// Sample values aligned to the table epoch; NaN marks missing data.
    pub values: Vec<f64>,
}

/// A raw time-indexed table as delivered by a loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    /// Shared timestamp axis; must be strictly increasing.
    pub epoch: Vec<DateTime<Utc>>,
    /// Columns in loader order. Duplicate keys are resolved first-wins
    /// during frame construction.
    pub columns: Vec<RawColumn>,
}

impl RawTable {
    /// Start a table from its timestamp axis.
    pub fn new(epoch: Vec<DateTime<Utc>>) -> Self {
        RawTable {
            epoch,
            columns: Vec::new(),
        }
    }

    /// Number of samples on the time axis.
    pub fn len(&self) -> usize {
        self.epoch.len()
    }

    /// True when the time axis is empty.
    pub fn is_empty(&self) -> bool {
        self.epoch.is_empty()
    }

    /// Append one column.
    pub fn push(
        &mut self,
        measurement: &str,
        component: &str,
        species: &str,
        values: Vec<f64>,
    ) -> &mut Self {
        self.columns.push(RawColumn {
            measurement: measurement.to_string(),
            component: component.to_string(),
            species: species.to_string(),
            values,
        });
        self
    }

    /// Append a species-bound scalar column (e.g. number density).
    pub fn push_scalar(&mut self, measurement: &str, species: &str, values: Vec<f64>) -> &mut Self {
        self.push(measurement, "", species, values)
    }

    /// Append the three Cartesian components of a vector quantity.
    pub fn push_vector(
        &mut self,
        measurement: &str,
        species: &str,
        x: Vec<f64>,
        y: Vec<f64>,
        z: Vec<f64>,
    ) -> &mut Self {
        self.push(measurement, "x", species, x)
            .push(measurement, "y", species, y)
            .push(measurement, "z", species, z)
    }

    /// Append the par/per components of a thermal-speed tensor. The scalar
    /// component is derived during frame construction.
    pub fn push_thermal_speed(&mut self, species: &str, par: Vec<f64>, per: Vec<f64>) -> &mut Self {
        self.push("w", "par", species, par)
            .push("w", "per", species, per)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_builder_key_shapes() {
        let epoch: Vec<DateTime<Utc>> = (0..2)
            .map(|i| Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, i).unwrap())
            .collect();
        let mut raw = RawTable::new(epoch);
        raw.push_scalar("n", "p1", vec![5.0, 5.5]);
        raw.push_vector("b", "", vec![5.0; 2], vec![0.0; 2], vec![0.0; 2]);
        raw.push_thermal_speed("p1", vec![20.0; 2], vec![25.0; 2]);

        assert_eq!(raw.columns.len(), 6);
        assert_eq!(raw.columns[0].component, "");
        assert_eq!(raw.columns[1].species, "");
        assert_eq!(raw.columns[4].component, "par");
        assert_eq!(raw.len(), 2);
    }
}
