//! Core value types: physical constants, the unit conversion table, species
//! tokens and expressions, and the Vector/Tensor measurement containers.

pub mod constants;
pub mod species;
pub mod units;
pub mod vector;

pub use species::{
    attributes, canonicalize, validate, SpeciesAttributes, SpeciesExpr, SpeciesRequest,
    SpeciesToken, CORE_PROTON_TOKENS,
};
pub use units::Quantity;
pub use vector::{SeriesLike, Tensor, Vector};
