//! Solar wind plasma analysis core.
//!
//! The crate models in-situ solar wind measurements as a hierarchical
//! multi-species table and derives the standard plasma quantities from it:
//! thermal pressure and temperature, Alfvén speeds, plasma beta, differential
//! flows, Coulomb collision rates and collisional age, parallel heat flux,
//! and the quasi-neutrality electron estimate.
//!
//! The entry point is [`Plasma`]: build one from a [`RawTable`] delivered by
//! a loader plus the list of species it should model, then call the
//! derivation methods with species expressions (`"p1"`, `"a+p1"`). Columns
//! the core vocabulary does not cover ride along untouched as auxiliary data.
//!
//! Measured and derived series stay in the conventional display units of the
//! field (cm⁻³, km/s, nT, pPa); each formula converts to SI internally.
//! Missing samples are NaN and propagate through every derivation.

pub mod core_types;
pub mod error;
pub mod ion;
pub mod math;
pub mod plasma;
pub mod spacecraft;
pub mod table;

pub use core_types::{
    Quantity, SeriesLike, SpeciesExpr, SpeciesRequest, SpeciesToken, Tensor, Vector,
};
pub use error::{PlasmaError, Result};
pub use ion::Ion;
pub use plasma::Plasma;
pub use spacecraft::Spacecraft;
pub use table::{AuxiliaryFrame, MeasurementFrame, RawColumn, RawTable};
