//! The multi-species plasma aggregator.
//!
//! A [`Plasma`] owns exactly one core [`MeasurementFrame`], an
//! [`AuxiliaryFrame`] for everything the model does not understand, one
//! [`Ion`] per declared species, the species-independent magnetic-field
//! vector, and optionally a [`Spacecraft`] ephemeris. It is built once from a
//! raw table and a species list; afterwards it mutates only through
//! whole-table replacement (`set_data`), auxiliary/spacecraft attachment, or
//! species removal. Two plasmas are equal iff their core frames are
//! value-equal.
//!
//! The cross-species derivation engine lives in [`derive`] as a second
//! `impl Plasma` block.

pub mod derive;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core_types::{SpeciesToken, Vector};
use crate::error::{PlasmaError, Result};
use crate::ion::Ion;
use crate::spacecraft::Spacecraft;
use crate::table::{
    AuxiliaryFrame, ColumnKey, Component, MeasurementFrame, MeasurementType, RawColumn, RawTable,
};

/// On-disk layout of the binary keyed store: the two named record slots.
#[derive(Serialize, Deserialize)]
struct SavedPlasma {
    plasma: MeasurementFrame,
    auxiliary_data: AuxiliaryFrame,
}

/// Multi-species measurement model and derivation engine host.
#[derive(Debug, Clone)]
pub struct Plasma {
    frame: MeasurementFrame,
    auxiliary: AuxiliaryFrame,
    species: Vec<SpeciesToken>,
    ions: FxHashMap<SpeciesToken, Ion>,
    bfield: Vector,
    spacecraft: Option<Spacecraft>,
}

impl PartialEq for Plasma {
    fn eq(&self, other: &Self) -> bool {
        self.frame == other.frame
    }
}

impl Plasma {
    /// Build a plasma from a raw table and the species it should model.
    pub fn new(raw: &RawTable, species: &[&str]) -> Result<Self> {
        if species.is_empty() {
            return Err(PlasmaError::InsufficientSpecies(
                "a plasma needs at least one species".into(),
            ));
        }
        let mut tokens = species
            .iter()
            .map(|s| SpeciesToken::new(s))
            .collect::<Result<Vec<_>>>()?;
        tokens.sort();
        tokens.dedup();

        let (frame, auxiliary) = MeasurementFrame::from_raw(raw, &tokens)?;
        Self::assemble(frame, auxiliary, tokens, None)
    }

    /// Rebuild ions and the field vector from an already-partitioned frame.
    fn assemble(
        frame: MeasurementFrame,
        auxiliary: AuxiliaryFrame,
        species: Vec<SpeciesToken>,
        spacecraft: Option<Spacecraft>,
    ) -> Result<Self> {
        let mut ions = FxHashMap::default();
        for token in &species {
            ions.insert(token.clone(), Ion::from_frame(&frame, token)?);
        }
        let bfield = frame
            .vector(MeasurementType::MagneticField, None)
            .ok_or_else(|| {
                PlasmaError::StructuralViolation(
                    "magnetic field columns (b, x/y/z) are required".into(),
                )
            })?;
        if let Some(sc) = &spacecraft {
            if sc.len() != frame.len() {
                return Err(PlasmaError::StructuralViolation(format!(
                    "spacecraft ephemeris has {} samples, frame has {}",
                    sc.len(),
                    frame.len()
                )));
            }
        }
        info!(
            species = %species
                .iter()
                .map(SpeciesToken::as_str)
                .collect::<Vec<_>>()
                .join(","),
            rows = frame.len(),
            "assembled plasma"
        );
        Ok(Plasma {
            frame,
            auxiliary,
            species,
            ions,
            bfield,
            spacecraft,
        })
    }

    /// Replace the whole table. The species list, auxiliary partitioning, and
    /// every ion are rebuilt; an attached spacecraft must still align.
    pub fn set_data(&mut self, raw: &RawTable) -> Result<()> {
        let (frame, auxiliary) = MeasurementFrame::from_raw(raw, &self.species)?;
        let rebuilt = Self::assemble(
            frame,
            auxiliary,
            self.species.clone(),
            self.spacecraft.clone(),
        )?;
        *self = rebuilt;
        Ok(())
    }

    /// Attach auxiliary data. Auxiliary columns must never shadow a core
    /// column; an overlap is a programming error, not a request to merge.
    pub fn set_auxiliary_data(&mut self, auxiliary: AuxiliaryFrame) -> Result<()> {
        if auxiliary.epoch() != self.frame.epoch() {
            return Err(PlasmaError::StructuralViolation(
                "auxiliary data must share the plasma's timestamp axis".into(),
            ));
        }
        for col in auxiliary.columns() {
            if self.is_core_shaped(col) {
                return Err(PlasmaError::StructuralViolation(format!(
                    "auxiliary column ({}, {}, {}) overlaps the core table",
                    col.measurement, col.component, col.species
                )));
            }
        }
        self.auxiliary = auxiliary;
        Ok(())
    }

    /// True when a raw column's key would classify as core under this
    /// plasma's declared species.
    fn is_core_shaped(&self, col: &RawColumn) -> bool {
        let Some(measurement) = MeasurementType::from_label(&col.measurement) else {
            return false;
        };
        let Some(component) = Component::from_label(&col.component) else {
            return false;
        };
        let token = if col.species.is_empty() {
            None
        } else {
            match SpeciesToken::new(&col.species) {
                Ok(token) if self.species.contains(&token) => Some(token),
                _ => return false,
            }
        };
        ColumnKey::checked(measurement, component, token).is_some()
    }

    /// The auxiliary (non-core) columns.
    pub fn auxiliary_data(&self) -> &AuxiliaryFrame {
        &self.auxiliary
    }

    /// Attach or detach the spacecraft ephemeris. Detaching disables exactly
    /// the Coulomb-number formula family; everything else still works.
    pub fn set_spacecraft(&mut self, spacecraft: Option<Spacecraft>) -> Result<()> {
        if let Some(sc) = &spacecraft {
            if sc.len() != self.frame.len() {
                return Err(PlasmaError::StructuralViolation(format!(
                    "spacecraft ephemeris has {} samples, frame has {}",
                    sc.len(),
                    self.frame.len()
                )));
            }
        }
        self.spacecraft = spacecraft;
        Ok(())
    }

    /// The attached spacecraft, if any.
    pub fn spacecraft(&self) -> Option<&Spacecraft> {
        self.spacecraft.as_ref()
    }

    /// Remove one species and its columns. A plasma must keep at least one
    /// species; dropping the last one fails.
    pub fn drop_species(&mut self, token: &str) -> Result<()> {
        let token = SpeciesToken::new(token)?;
        if !self.species.contains(&token) {
            return Err(PlasmaError::UnavailableSpecies {
                requested: vec![token.as_str().to_string()],
                available: self
                    .species
                    .iter()
                    .map(|t| t.as_str().to_string())
                    .collect(),
                unavailable: vec![token.as_str().to_string()],
            });
        }
        if self.species.len() == 1 {
            return Err(PlasmaError::InsufficientSpecies(format!(
                "cannot drop {token}: a plasma must keep at least one species"
            )));
        }
        self.frame = self.frame.without_species(&token);
        self.species.retain(|t| t != &token);
        self.ions.remove(&token);
        info!(species = %token, "dropped species");
        Ok(())
    }

    /// The declared species, sorted.
    pub fn species(&self) -> &[SpeciesToken] {
        &self.species
    }

    /// The ion view for one species.
    pub fn ion(&self, token: &SpeciesToken) -> Option<&Ion> {
        self.ions.get(token)
    }

    /// The core measurement frame.
    pub fn frame(&self) -> &MeasurementFrame {
        &self.frame
    }

    /// The species-independent magnetic field (nT).
    pub fn bfield(&self) -> &Vector {
        &self.bfield
    }

    /// Number of samples on the time axis.
    pub fn len(&self) -> usize {
        self.frame.len()
    }

    /// True when the plasma holds no samples.
    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }

    /// Write the core and auxiliary frames to the binary keyed store.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())
            .map_err(|e| PlasmaError::Persistence(format!("create: {e}")))?;
        let saved = SavedPlasma {
            plasma: self.frame.clone(),
            auxiliary_data: self.auxiliary.clone(),
        };
        bincode::serialize_into(BufWriter::new(file), &saved)
            .map_err(|e| PlasmaError::Persistence(format!("serialize: {e}")))
    }

    /// Read a plasma back from the binary keyed store.
    ///
    /// When `species` is `None`, the species list is inferred from the
    /// species vocabulary of the stored frame.
    pub fn load<P: AsRef<Path>>(path: P, species: Option<&[&str]>) -> Result<Self> {
        let file = File::open(path.as_ref())
            .map_err(|e| PlasmaError::Persistence(format!("open: {e}")))?;
        let mut saved: SavedPlasma = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| PlasmaError::Persistence(format!("deserialize: {e}")))?;
        saved.plasma.reindex();

        let tokens = match species {
            Some(list) => {
                let mut tokens = list
                    .iter()
                    .map(|s| SpeciesToken::new(s))
                    .collect::<Result<Vec<_>>>()?;
                tokens.sort();
                tokens.dedup();
                tokens
            }
            None => saved.plasma.species_vocabulary(),
        };
        Self::assemble(saved.plasma, saved.auxiliary_data, tokens, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::RawColumn;
    use chrono::{DateTime, TimeZone, Utc};

    fn epoch(n: usize) -> Vec<DateTime<Utc>> {
        (0..n)
            .map(|i| {
                Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, u32::try_from(i).unwrap())
                    .unwrap()
            })
            .collect()
    }

    fn two_species_raw() -> RawTable {
        let mut raw = RawTable::new(epoch(3));
        raw.push_scalar("n", "p1", vec![5.0; 3]);
        raw.push_vector("v", "p1", vec![400.0; 3], vec![0.0; 3], vec![0.0; 3]);
        raw.push_thermal_speed("p1", vec![20.0; 3], vec![25.0; 3]);
        raw.push_scalar("n", "a", vec![0.2; 3]);
        raw.push_vector("v", "a", vec![420.0; 3], vec![0.0; 3], vec![0.0; 3]);
        raw.push_thermal_speed("a", vec![30.0; 3], vec![30.0; 3]);
        raw.push_vector("b", "", vec![5.0; 3], vec![0.0; 3], vec![0.0; 3]);
        raw
    }

    #[test]
    fn test_construction_builds_one_ion_per_species() {
        let plasma = Plasma::new(&two_species_raw(), &["p1", "a"]).unwrap();
        assert_eq!(plasma.species().len(), 2);
        assert!(plasma.ion(&SpeciesToken::new("p1").unwrap()).is_some());
        assert!(plasma.ion(&SpeciesToken::new("a").unwrap()).is_some());
        assert_eq!(plasma.bfield().x()[0], 5.0);
    }

    #[test]
    fn test_missing_field_is_fatal() {
        let mut raw = RawTable::new(epoch(3));
        raw.push_scalar("n", "p1", vec![5.0; 3]);
        raw.push_vector("v", "p1", vec![400.0; 3], vec![0.0; 3], vec![0.0; 3]);
        raw.push_thermal_speed("p1", vec![20.0; 3], vec![25.0; 3]);
        assert!(matches!(
            Plasma::new(&raw, &["p1"]),
            Err(PlasmaError::StructuralViolation(_))
        ));
    }

    #[test]
    fn test_equality_is_core_frame_equality() {
        let a = Plasma::new(&two_species_raw(), &["p1", "a"]).unwrap();
        let mut b = Plasma::new(&two_species_raw(), &["p1", "a"]).unwrap();
        assert_eq!(a, b);
        // Spacecraft attachment does not affect value equality.
        b.set_spacecraft(Some(Spacecraft::new("psp", vec![1.5e8; 3])))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_drop_species_keeps_at_least_one() {
        let mut plasma = Plasma::new(&two_species_raw(), &["p1", "a"]).unwrap();
        plasma.drop_species("a").unwrap();
        assert_eq!(plasma.species().len(), 1);
        assert!(plasma.ion(&SpeciesToken::new("a").unwrap()).is_none());
        let err = plasma.drop_species("p1").unwrap_err();
        assert!(matches!(err, PlasmaError::InsufficientSpecies(_)));
    }

    #[test]
    fn test_drop_unknown_species() {
        let mut plasma = Plasma::new(&two_species_raw(), &["p1", "a"]).unwrap();
        assert!(matches!(
            plasma.drop_species("p2"),
            Err(PlasmaError::UnavailableSpecies { .. })
        ));
    }

    #[test]
    fn test_auxiliary_overlap_is_fatal() {
        let mut plasma = Plasma::new(&two_species_raw(), &["p1", "a"]).unwrap();
        let overlap = AuxiliaryFrame::new(
            plasma.frame().epoch().to_vec(),
            vec![RawColumn {
                measurement: "n".into(),
                component: String::new(),
                species: "p1".into(),
                values: vec![1.0; 3],
            }],
        );
        assert!(matches!(
            plasma.set_auxiliary_data(overlap),
            Err(PlasmaError::StructuralViolation(_))
        ));

        let fine = AuxiliaryFrame::new(
            plasma.frame().epoch().to_vec(),
            vec![RawColumn {
                measurement: "flux".into(),
                component: String::new(),
                species: "p1".into(),
                values: vec![1.0; 3],
            }],
        );
        plasma.set_auxiliary_data(fine).unwrap();
        assert!(!plasma.auxiliary_data().is_empty());
    }

    #[test]
    fn test_spacecraft_alignment() {
        let mut plasma = Plasma::new(&two_species_raw(), &["p1", "a"]).unwrap();
        assert!(matches!(
            plasma.set_spacecraft(Some(Spacecraft::new("psp", vec![1.5e8; 2]))),
            Err(PlasmaError::StructuralViolation(_))
        ));
        plasma
            .set_spacecraft(Some(Spacecraft::new("psp", vec![1.5e8; 3])))
            .unwrap();
        assert!(plasma.spacecraft().is_some());
        plasma.set_spacecraft(None).unwrap();
        assert!(plasma.spacecraft().is_none());
    }

    #[test]
    fn test_set_data_rebuilds() {
        let mut plasma = Plasma::new(&two_species_raw(), &["p1", "a"]).unwrap();
        let mut raw = two_species_raw();
        raw.columns[0].values = vec![7.0; 3];
        plasma.set_data(&raw).unwrap();
        let p1 = plasma.ion(&SpeciesToken::new("p1").unwrap()).unwrap();
        assert_eq!(p1.density()[0], 7.0);
    }
}
