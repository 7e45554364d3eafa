//! Error taxonomy for the plasma analysis core.
//!
//! Every fallible operation in this crate returns [`PlasmaError`]. Validation
//! errors are raised eagerly, before any numeric work begins, and name the
//! offending species or quantity so a caller can correct the request without
//! digging through a traceback.

use std::fmt;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PlasmaError>;

/// Errors surfaced by species resolution, table construction, and the
/// derivation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlasmaError {
    /// Malformed species token or expression: a stray `,`, an empty token,
    /// or inconsistent mixing of `+`-sums with plain tokens in one request.
    InvalidSpeciesSyntax(String),

    /// Well-formed expression referencing species not present in this plasma.
    /// Carries the requested, available, and unavailable token sets.
    UnavailableSpecies {
        /// Tokens the caller asked for.
        requested: Vec<String>,
        /// Tokens actually present.
        available: Vec<String>,
        /// The subset of `requested` that is missing.
        unavailable: Vec<String>,
    },

    /// The formula intentionally forbids summing across species, e.g. a
    /// combined thermal speed is physically ambiguous.
    AmbiguousCombination(String),

    /// The formula requires at least two species and got fewer.
    InsufficientSpecies(String),

    /// The formula needs an attached collaborator (spacecraft) that is absent.
    MissingCollaborator(String),

    /// Malformed table shape: empty data, mismatched column lengths, or a
    /// non-monotonic timestamp axis. Fatal, not user-recoverable.
    StructuralViolation(String),

    /// Differential flow of a species expression against itself.
    ZeroDifferentialFlow(String),

    /// A geometric operation received an operand type it is not defined for,
    /// e.g. projecting onto something that is not a vector series.
    NotImplementedMethod(String),

    /// Save/load failure in the binary keyed store.
    Persistence(String),
}

impl fmt::Display for PlasmaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlasmaError::InvalidSpeciesSyntax(msg) => {
                write!(f, "invalid species syntax: {msg}")
            }
            PlasmaError::UnavailableSpecies {
                requested,
                available,
                unavailable,
            } => write!(
                f,
                "unavailable species: requested [{}], available [{}], missing [{}]",
                requested.join(", "),
                available.join(", "),
                unavailable.join(", ")
            ),
            PlasmaError::AmbiguousCombination(msg) => {
                write!(f, "ambiguous combination: {msg}")
            }
            PlasmaError::InsufficientSpecies(msg) => {
                write!(f, "insufficient species: {msg}")
            }
            PlasmaError::MissingCollaborator(msg) => {
                write!(f, "missing collaborator: {msg}")
            }
            PlasmaError::StructuralViolation(msg) => {
                write!(f, "structural violation: {msg}")
            }
            PlasmaError::ZeroDifferentialFlow(msg) => {
                write!(f, "zero differential flow: {msg}")
            }
            PlasmaError::NotImplementedMethod(msg) => {
                write!(f, "method not implemented for operand: {msg}")
            }
            PlasmaError::Persistence(msg) => write!(f, "persistence failure: {msg}"),
        }
    }
}

impl std::error::Error for PlasmaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_species_names_all_sets() {
        let err = PlasmaError::UnavailableSpecies {
            requested: vec!["p1".into(), "a".into()],
            available: vec!["p1".into()],
            unavailable: vec!["a".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("requested [p1, a]"), "got: {msg}");
        assert!(msg.contains("available [p1]"), "got: {msg}");
        assert!(msg.contains("missing [a]"), "got: {msg}");
    }

    #[test]
    fn test_display_prefixes_are_distinct() {
        let errors = [
            PlasmaError::InvalidSpeciesSyntax("x".into()),
            PlasmaError::AmbiguousCombination("x".into()),
            PlasmaError::InsufficientSpecies("x".into()),
            PlasmaError::MissingCollaborator("x".into()),
            PlasmaError::StructuralViolation("x".into()),
            PlasmaError::ZeroDifferentialFlow("x".into()),
            PlasmaError::NotImplementedMethod("x".into()),
            PlasmaError::Persistence("x".into()),
        ];
        let mut prefixes: Vec<String> = errors
            .iter()
            .map(|e| e.to_string().split(':').next().unwrap_or_default().to_string())
            .collect();
        prefixes.sort();
        prefixes.dedup();
        assert_eq!(prefixes.len(), errors.len(), "error prefixes must be unique");
    }
}
