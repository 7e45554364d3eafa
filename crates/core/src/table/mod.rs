//! The hierarchical time-indexed measurement table.
//!
//! Raw loader tables come in with string-keyed columns; this module types the
//! keys ([`key`]), validates and partitions the data ([`frame`]), and keeps
//! whatever the core model does not understand as untouched auxiliary data.

pub mod frame;
pub mod key;
pub mod raw;

pub use frame::{AuxiliaryFrame, Column, MeasurementFrame};
pub use key::{ColumnKey, Component, MeasurementType};
pub use raw::{RawColumn, RawTable};
