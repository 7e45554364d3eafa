//! Species tokens, expressions, and the request resolver.
//!
//! A species token identifies one particle population (`p1` proton core, `p2`
//! proton beam, `a` alphas, `e` electrons). Tokens combine into expressions:
//! a single token, or a `+`-joined sum meaning "mass-density-weighted
//! combination of these populations". Sums are canonical — tokens sorted and
//! deduplicated — so `"p1+a"` and `"a+p1"` resolve to the same expression.
//!
//! The resolver here is invoked by every derivation method before dispatch,
//! which makes its error taxonomy the single source of "bad species" failures
//! across the whole engine.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core_types::constants::{ALPHA_MASS, ELECTRON_MASS, PROTON_MASS};
use crate::error::{PlasmaError, Result};

/// Characters reserved by the expression grammar; never valid inside a token.
const RESERVED: [char; 2] = ['+', ','];

/// An immutable, validated identifier for one particle population.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesToken(String);

impl SpeciesToken {
    /// Validate and wrap a raw token. Rejects empty tokens and the reserved
    /// grammar characters `+` and `,`.
    pub fn new(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(PlasmaError::InvalidSpeciesSyntax(
                "empty species token".into(),
            ));
        }
        if raw.chars().any(|c| RESERVED.contains(&c)) {
            return Err(PlasmaError::InvalidSpeciesSyntax(format!(
                "token {raw:?} contains a reserved character (`+` or `,`)"
            )));
        }
        Ok(SpeciesToken(raw.to_string()))
    }

    /// The raw token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpeciesToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Physical attributes of a known particle population.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciesAttributes {
    /// Particle mass (kg).
    pub mass: f64,
    /// Charge state in units of the elementary charge (signed).
    pub charge_state: i32,
    /// Mass in proton masses, used by the NRL Coulomb logarithm.
    pub mass_in_proton_units: f64,
}

/// Look up the attributes for a token. Population suffixes (`p1`, `p2`, `a2`)
/// share the attributes of their base particle.
pub fn attributes(token: &SpeciesToken) -> Option<SpeciesAttributes> {
    let base = match token.as_str() {
        "p" | "p1" | "p2" => (PROTON_MASS, 1),
        "a" | "a1" | "a2" => (ALPHA_MASS, 2),
        "e" => (ELECTRON_MASS, -1),
        _ => return None,
    };
    Some(SpeciesAttributes {
        mass: base.0,
        charge_state: base.1,
        mass_in_proton_units: base.0 / PROTON_MASS,
    })
}

/// Tokens designating the core proton population, the reference species for
/// the electron estimate. Exactly one of these may be present in a plasma
/// when electrons are estimated.
pub const CORE_PROTON_TOKENS: [&str; 2] = ["p1", "p"];

/// A canonical species expression: one token, or a sorted sum of tokens.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpeciesExpr {
    /// A single population.
    Single(SpeciesToken),
    /// A mass-density-weighted combination. Always holds ≥ 2 distinct tokens;
    /// parsing collapses a one-element sum to `Single`.
    Sum(BTreeSet<SpeciesToken>),
}

impl SpeciesExpr {
    /// Parse `"p1"` or `"a+p1"` into canonical form. A `,` anywhere is a
    /// syntax error: commas separate the sides of pairwise requests and are
    /// never part of a single expression.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.contains(',') {
            return Err(PlasmaError::InvalidSpeciesSyntax(format!(
                "{raw:?} contains `,`; commas separate request sides, not species"
            )));
        }
        if raw.is_empty() {
            return Err(PlasmaError::InvalidSpeciesSyntax(
                "empty species expression".into(),
            ));
        }
        let tokens = raw
            .split('+')
            .map(SpeciesToken::new)
            .collect::<Result<BTreeSet<_>>>()?;
        Ok(Self::from_tokens(tokens))
    }

    fn from_tokens(tokens: BTreeSet<SpeciesToken>) -> Self {
        if tokens.len() == 1 {
            let token = tokens.into_iter().next().unwrap();
            SpeciesExpr::Single(token)
        } else {
            SpeciesExpr::Sum(tokens)
        }
    }

    /// Constituent tokens in canonical (sorted) order.
    pub fn tokens(&self) -> Vec<&SpeciesToken> {
        match self {
            SpeciesExpr::Single(t) => vec![t],
            SpeciesExpr::Sum(set) => set.iter().collect(),
        }
    }

    /// Number of distinct constituent populations.
    pub fn len(&self) -> usize {
        match self {
            SpeciesExpr::Single(_) => 1,
            SpeciesExpr::Sum(set) => set.len(),
        }
    }

    /// Always false: parsing rejects the empty expression, so every
    /// expression names at least one population.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// True for the `Single` form.
    pub fn is_single(&self) -> bool {
        matches!(self, SpeciesExpr::Single(_))
    }
}

impl fmt::Display for SpeciesExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeciesExpr::Single(t) => f.write_str(t.as_str()),
            SpeciesExpr::Sum(set) => {
                let joined = set
                    .iter()
                    .map(SpeciesToken::as_str)
                    .collect::<Vec<_>>()
                    .join("+");
                f.write_str(&joined)
            }
        }
    }
}

/// The argument shapes a derivation method can receive, made explicit.
///
/// Passing several separate expressions (`Each`) means "one independent
/// result per item"; a single sum (`One`) means "the combined result"; `Pair`
/// carries the two sides of a binary request such as differential flow. The
/// shapes are never interchangeable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeciesRequest {
    /// One expression: a single population or one combined sum.
    One(SpeciesExpr),
    /// Several expressions evaluated independently.
    Each(Vec<SpeciesExpr>),
    /// Two sides of a pairwise formula.
    Pair(SpeciesExpr, SpeciesExpr),
}

/// Canonicalize a variadic token/expression list.
///
/// Each item is parsed to canonical form and the list is sorted. Mixing a
/// `+`-sum with plain sibling tokens in one call is ambiguous (is the caller
/// asking for a combination or a per-species table?) and is rejected.
pub fn canonicalize(items: &[&str]) -> Result<Vec<SpeciesExpr>> {
    if items.is_empty() {
        return Err(PlasmaError::InvalidSpeciesSyntax(
            "no species requested".into(),
        ));
    }
    let exprs = items
        .iter()
        .map(|raw| SpeciesExpr::parse(raw))
        .collect::<Result<Vec<_>>>()?;
    if exprs.len() > 1 {
        let sums = exprs.iter().filter(|e| !e.is_single()).count();
        if sums != 0 && sums != exprs.len() {
            return Err(PlasmaError::InvalidSpeciesSyntax(format!(
                "cannot mix `+`-sums with plain tokens in one request: [{}]",
                items.join(", ")
            )));
        }
    }
    let mut sorted = exprs;
    sorted.sort();
    Ok(sorted)
}

/// Expand every sum into its constituents and check each against the species
/// actually present. On failure, names exactly which requested, available,
/// and unavailable tokens were involved.
pub fn validate(exprs: &[SpeciesExpr], available: &[SpeciesToken]) -> Result<()> {
    let mut requested: Vec<String> = Vec::new();
    let mut unavailable: Vec<String> = Vec::new();
    for expr in exprs {
        for token in expr.tokens() {
            requested.push(token.as_str().to_string());
            if !available.contains(token) {
                unavailable.push(token.as_str().to_string());
            }
        }
    }
    if unavailable.is_empty() {
        Ok(())
    } else {
        Err(PlasmaError::UnavailableSpecies {
            requested,
            available: available.iter().map(|t| t.as_str().to_string()).collect(),
            unavailable,
        })
    }
}
