//! The hierarchical measurement frame and its construction algorithm.
//!
//! [`MeasurementFrame`] owns the core columns — the measurement types the
//! model understands — sorted by [`ColumnKey`] for deterministic iteration,
//! with a hash index from key to column offset. Everything a raw table
//! carries beyond the core vocabulary lands unchanged in an
//! [`AuxiliaryFrame`]. Construction also derives the scalar thermal speed
//! `w_scalar = sqrt((2·w_per² + w_par²)/3)` for every species present.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core_types::{SpeciesToken, Tensor, Vector};
use crate::error::{PlasmaError, Result};
use crate::table::key::{ColumnKey, Component, MeasurementType};
use crate::table::raw::{RawColumn, RawTable};

/// NaN-aware sample equality used by frame value comparison.
fn series_eq(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| (x.is_nan() && y.is_nan()) || x == y)
}

/// One typed core column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// The canonical three-part key.
    pub key: ColumnKey,
    /// Sample values aligned to the frame epoch; NaN marks missing data.
    pub values: Vec<f64>,
}

/// The core time-indexed table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementFrame {
    epoch: Vec<DateTime<Utc>>,
    columns: Vec<Column>,
    /// Key → column offset. Rebuilt by [`MeasurementFrame::reindex`] after
    /// deserialization; never persisted.
    #[serde(skip)]
    index: FxHashMap<ColumnKey, usize>,
}

impl PartialEq for MeasurementFrame {
    fn eq(&self, other: &Self) -> bool {
        self.epoch == other.epoch
            && self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(a, b)| a.key == b.key && series_eq(&a.values, &b.values))
    }
}

/// Passthrough columns that are not part of the core model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuxiliaryFrame {
    epoch: Vec<DateTime<Utc>>,
    columns: Vec<RawColumn>,
}

impl AuxiliaryFrame {
    /// Build from an epoch and raw columns, deduplicating keys first-wins.
    pub fn new(epoch: Vec<DateTime<Utc>>, columns: Vec<RawColumn>) -> Self {
        let mut seen: Vec<(String, String, String)> = Vec::new();
        let mut kept = Vec::new();
        for col in columns {
            let key = (
                col.measurement.clone(),
                col.component.clone(),
                col.species.clone(),
            );
            if seen.contains(&key) {
                warn!(
                    measurement = %col.measurement,
                    component = %col.component,
                    species = %col.species,
                    "dropping duplicate auxiliary column"
                );
                continue;
            }
            seen.push(key);
            kept.push(col);
        }
        AuxiliaryFrame {
            epoch,
            columns: kept,
        }
    }

    /// The shared timestamp axis.
    pub fn epoch(&self) -> &[DateTime<Utc>] {
        &self.epoch
    }

    /// All auxiliary columns.
    pub fn columns(&self) -> &[RawColumn] {
        &self.columns
    }

    /// Look up one auxiliary column by its raw key.
    pub fn get(&self, measurement: &str, component: &str, species: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| {
                c.measurement == measurement && c.component == component && c.species == species
            })
            .map(|c| c.values.as_slice())
    }

    /// True when no auxiliary columns are present.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl MeasurementFrame {
    /// Partition a raw table into the core frame and auxiliary data.
    ///
    /// Core selection keeps only columns whose measurement type, component,
    /// and species all belong to the known vocabularies (the species
    /// vocabulary being the declared `species` list). Everything else is
    /// best-effort auxiliary data. Malformed table shape — empty axis,
    /// non-monotonic timestamps, column length mismatch — is fatal.
    pub fn from_raw(
        raw: &RawTable,
        species: &[SpeciesToken],
    ) -> Result<(MeasurementFrame, AuxiliaryFrame)> {
        if raw.epoch.is_empty() {
            return Err(PlasmaError::StructuralViolation(
                "cannot build a measurement frame from an empty table".into(),
            ));
        }
        for pair in raw.epoch.windows(2) {
            if pair[1] <= pair[0] {
                return Err(PlasmaError::StructuralViolation(format!(
                    "timestamp axis must be strictly increasing: {} !< {}",
                    pair[0], pair[1]
                )));
            }
        }
        for col in &raw.columns {
            if col.values.len() != raw.epoch.len() {
                return Err(PlasmaError::StructuralViolation(format!(
                    "column ({}, {}, {}) has {} samples, expected {}",
                    col.measurement,
                    col.component,
                    col.species,
                    col.values.len(),
                    raw.epoch.len()
                )));
            }
        }

        let mut core: Vec<Column> = Vec::new();
        let mut auxiliary: Vec<RawColumn> = Vec::new();
        for col in &raw.columns {
            match Self::core_key(col, species) {
                Some(key) => core.push(Column {
                    key,
                    values: col.values.clone(),
                }),
                None => auxiliary.push(col.clone()),
            }
        }

        // Canonical order, then first-wins deduplication.
        core.sort_by(|a, b| a.key.cmp(&b.key));
        let mut deduped: Vec<Column> = Vec::with_capacity(core.len());
        for col in core {
            if deduped.last().is_some_and(|prev| prev.key == col.key) {
                warn!(key = %col.key, "dropping duplicate core column");
                continue;
            }
            deduped.push(col);
        }

        let mut frame = MeasurementFrame {
            epoch: raw.epoch.clone(),
            columns: deduped,
            index: FxHashMap::default(),
        };
        frame.reindex();
        frame.derive_scalar_thermal_speed(species);

        debug!(
            rows = frame.len(),
            core_columns = frame.columns.len(),
            auxiliary_columns = auxiliary.len(),
            "partitioned raw table"
        );
        Ok((frame, AuxiliaryFrame::new(raw.epoch.clone(), auxiliary)))
    }

    /// Classify one raw column against the core vocabulary.
    fn core_key(col: &RawColumn, species: &[SpeciesToken]) -> Option<ColumnKey> {
        let measurement = MeasurementType::from_label(&col.measurement)?;
        let component = Component::from_label(&col.component)?;
        let token = if col.species.is_empty() {
            None
        } else {
            let token = SpeciesToken::new(&col.species).ok()?;
            if !species.contains(&token) {
                return None;
            }
            Some(token)
        };
        ColumnKey::checked(measurement, component, token)
    }

    /// Append `w_scalar` for every species that has par/per thermal speeds
    /// but no scalar column yet. Rows with a missing component stay missing.
    fn derive_scalar_thermal_speed(&mut self, species: &[SpeciesToken]) {
        for token in species {
            let scalar_key = ColumnKey {
                measurement: MeasurementType::ThermalSpeed,
                component: Component::Scalar,
                species: Some(token.clone()),
            };
            if self.index.contains_key(&scalar_key) {
                continue;
            }
            let par_key = ColumnKey {
                component: Component::Par,
                ..scalar_key.clone()
            };
            let per_key = ColumnKey {
                component: Component::Per,
                ..scalar_key.clone()
            };
            let (Some(par), Some(per)) = (self.get(&par_key), self.get(&per_key)) else {
                continue;
            };
            let values: Vec<f64> = par
                .iter()
                .zip(per)
                .map(|(wpar, wper)| ((2.0 * wper * wper + wpar * wpar) / 3.0).sqrt())
                .collect();
            debug!(species = %token, "derived scalar thermal speed");
            self.columns.push(Column {
                key: scalar_key,
                values,
            });
            self.columns.sort_by(|a, b| a.key.cmp(&b.key));
            self.reindex();
        }
    }

    /// Rebuild the key → offset index. Must be called after deserialization.
    pub fn reindex(&mut self) {
        self.index = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.key.clone(), i))
            .collect();
    }

    /// The timestamp axis.
    pub fn epoch(&self) -> &[DateTime<Utc>] {
        &self.epoch
    }

    /// Number of samples on the time axis.
    pub fn len(&self) -> usize {
        self.epoch.len()
    }

    /// True when the frame holds no samples.
    pub fn is_empty(&self) -> bool {
        self.epoch.is_empty()
    }

    /// The core columns in canonical order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up one column.
    pub fn get(&self, key: &ColumnKey) -> Option<&[f64]> {
        self.index.get(key).map(|&i| self.columns[i].values.as_slice())
    }

    /// Convenience lookup for a species-bound scalar column.
    pub fn scalar(&self, measurement: MeasurementType, species: &SpeciesToken) -> Option<&[f64]> {
        self.get(&ColumnKey {
            measurement,
            component: Component::None,
            species: Some(species.clone()),
        })
    }

    /// Assemble a Cartesian vector quantity for one species (`None` for the
    /// species-independent field and position).
    pub fn vector(
        &self,
        measurement: MeasurementType,
        species: Option<&SpeciesToken>,
    ) -> Option<Vector> {
        let fetch = |component| {
            self.get(&ColumnKey {
                measurement,
                component,
                species: species.cloned(),
            })
            .map(<[f64]>::to_vec)
        };
        Vector::new(fetch(Component::X)?, fetch(Component::Y)?, fetch(Component::Z)?).ok()
    }

    /// Assemble the gyrotropic thermal-speed tensor for one species.
    pub fn tensor(&self, measurement: MeasurementType, species: &SpeciesToken) -> Option<Tensor> {
        let fetch = |component| {
            self.get(&ColumnKey {
                measurement,
                component,
                species: Some(species.clone()),
            })
            .map(<[f64]>::to_vec)
        };
        Tensor::new(
            fetch(Component::Par)?,
            fetch(Component::Per)?,
            fetch(Component::Scalar)?,
        )
        .ok()
    }

    /// Every species token appearing in the frame's species-bound columns,
    /// sorted and deduplicated.
    pub fn species_vocabulary(&self) -> Vec<SpeciesToken> {
        let mut tokens: Vec<SpeciesToken> = self
            .columns
            .iter()
            .filter_map(|c| c.key.species.clone())
            .collect();
        tokens.sort();
        tokens.dedup();
        tokens
    }

    /// A new frame with every column of `token` removed.
    pub fn without_species(&self, token: &SpeciesToken) -> MeasurementFrame {
        let columns: Vec<Column> = self
            .columns
            .iter()
            .filter(|c| c.key.species.as_ref() != Some(token))
            .cloned()
            .collect();
        let mut frame = MeasurementFrame {
            epoch: self.epoch.clone(),
            columns,
            index: FxHashMap::default(),
        };
        frame.reindex();
        frame
    }
}
