//! Vector and Tensor measurement containers.
//!
//! A [`Vector`] wraps a Cartesian (x, y, z) triple of time series; a
//! [`Tensor`] wraps a gyrotropic (par, per, scalar) triple. Both are
//! immutable once constructed and compare structurally: same concrete type
//! and same numeric content, with missing samples (NaN) equal to missing
//! samples at the same position.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{PlasmaError, Result};

/// NaN-aware sample equality: two series are value-equal when every pair of
/// samples is either numerically equal or missing in both.
fn series_eq(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| (x.is_nan() && y.is_nan()) || x == y)
}

/// Downcast seam for geometric operations.
///
/// `project` and `cos_theta` accept any series container but are only defined
/// when the operand is a Cartesian vector; everything else is rejected at
/// runtime with [`PlasmaError::NotImplementedMethod`].
pub trait SeriesLike {
    /// The operand viewed as a Cartesian vector series, when it is one.
    fn as_vector(&self) -> Option<&Vector>;

    /// Human-readable operand kind for error messages.
    fn kind(&self) -> &'static str;
}

/// A Cartesian (x, y, z) series with derived geometric operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vector {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
}

impl PartialEq for Vector {
    fn eq(&self, other: &Self) -> bool {
        series_eq(&self.x, &other.x) && series_eq(&self.y, &other.y) && series_eq(&self.z, &other.z)
    }
}

impl Vector {
    /// Build from three equal-length component series.
    pub fn new(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Result<Self> {
        if x.len() != y.len() || x.len() != z.len() {
            return Err(PlasmaError::StructuralViolation(format!(
                "vector components differ in length: x={}, y={}, z={}",
                x.len(),
                y.len(),
                z.len()
            )));
        }
        Ok(Vector { x, y, z })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// True when the series holds no samples.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// The x component series.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// The y component series.
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// The z component series.
    pub fn z(&self) -> &[f64] {
        &self.z
    }

    /// Sample at row `i` as a nalgebra vector.
    #[inline]
    pub fn row(&self, i: usize) -> Vector3<f64> {
        Vector3::new(self.x[i], self.y[i], self.z[i])
    }

    /// Map a per-row closure over the samples.
    pub fn map_rows<F: Fn(Vector3<f64>) -> f64>(&self, f: F) -> Vec<f64> {
        (0..self.len()).map(|i| f(self.row(i))).collect()
    }

    /// Euclidean magnitude `sqrt(x² + y² + z²)` per sample.
    pub fn magnitude(&self) -> Vec<f64> {
        self.map_rows(|v| v.norm())
    }

    /// Cylindrical radius `sqrt(x² + y²)` per sample.
    pub fn rho(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| self.x[i].hypot(self.y[i]))
            .collect()
    }

    /// Colatitude in degrees: the angle from the +z axis, `atan2(rho, z)`.
    pub fn colatitude(&self) -> Vec<f64> {
        let rho = self.rho();
        (0..self.len())
            .map(|i| rho[i].atan2(self.z[i]).to_degrees())
            .collect()
    }

    /// Longitude in degrees in the x-y plane, `atan2(y, x)`.
    pub fn longitude(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| self.y[i].atan2(self.x[i]).to_degrees())
            .collect()
    }

    /// Per-sample unit vector. Zero-magnitude samples become NaN.
    pub fn unit_vector(&self) -> Vector {
        let mut x = Vec::with_capacity(self.len());
        let mut y = Vec::with_capacity(self.len());
        let mut z = Vec::with_capacity(self.len());
        for i in 0..self.len() {
            let v = self.row(i);
            let norm = v.norm();
            if norm == 0.0 {
                x.push(f64::NAN);
                y.push(f64::NAN);
                z.push(f64::NAN);
            } else {
                x.push(v.x / norm);
                y.push(v.y / norm);
                z.push(v.z / norm);
            }
        }
        Vector { x, y, z }
    }

    /// Decompose this vector into components parallel and perpendicular to
    /// `other`'s unit vector, per sample.
    ///
    /// Projecting a vector onto itself yields `(magnitude, 0)` exactly, with
    /// no floating-point residue in the perpendicular part.
    pub fn project(&self, other: &dyn SeriesLike) -> Result<(Vec<f64>, Vec<f64>)> {
        let Some(target) = other.as_vector() else {
            return Err(PlasmaError::NotImplementedMethod(format!(
                "project is only defined against a vector series, got {}",
                other.kind()
            )));
        };
        if target.len() != self.len() {
            return Err(PlasmaError::StructuralViolation(format!(
                "project: operand has {} samples, expected {}",
                target.len(),
                self.len()
            )));
        }
        if self == target {
            let par = self.magnitude();
            let per = vec![0.0; self.len()];
            return Ok((par, per));
        }
        let mut par = Vec::with_capacity(self.len());
        let mut per = Vec::with_capacity(self.len());
        for i in 0..self.len() {
            let v = self.row(i);
            let b = target.row(i);
            let norm = b.norm();
            if norm == 0.0 {
                par.push(f64::NAN);
                per.push(f64::NAN);
                continue;
            }
            let bhat = b / norm;
            let p = v.dot(&bhat);
            par.push(p);
            per.push((v - bhat * p).norm());
        }
        Ok((par, per))
    }

    /// Cosine of the angle between this vector and `other`'s unit vector,
    /// per sample.
    pub fn cos_theta(&self, other: &dyn SeriesLike) -> Result<Vec<f64>> {
        let Some(target) = other.as_vector() else {
            return Err(PlasmaError::NotImplementedMethod(format!(
                "cos_theta is only defined against a vector series, got {}",
                other.kind()
            )));
        };
        if target.len() != self.len() {
            return Err(PlasmaError::StructuralViolation(format!(
                "cos_theta: operand has {} samples, expected {}",
                target.len(),
                self.len()
            )));
        }
        let mut out = Vec::with_capacity(self.len());
        for i in 0..self.len() {
            let v = self.row(i);
            let b = target.row(i);
            let denom = v.norm() * b.norm();
            out.push(if denom == 0.0 {
                f64::NAN
            } else {
                v.dot(&b) / denom
            });
        }
        Ok(out)
    }
}

impl SeriesLike for Vector {
    fn as_vector(&self) -> Option<&Vector> {
        Some(self)
    }

    fn kind(&self) -> &'static str {
        "vector"
    }
}

/// A gyrotropic (par, per, scalar) series. Component access only; the scalar
/// component is the isotropic equivalent `sqrt((2·per² + par²)/3)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tensor {
    par: Vec<f64>,
    per: Vec<f64>,
    scalar: Vec<f64>,
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        series_eq(&self.par, &other.par)
            && series_eq(&self.per, &other.per)
            && series_eq(&self.scalar, &other.scalar)
    }
}

impl Tensor {
    /// Build from three equal-length component series.
    pub fn new(par: Vec<f64>, per: Vec<f64>, scalar: Vec<f64>) -> Result<Self> {
        if par.len() != per.len() || par.len() != scalar.len() {
            return Err(PlasmaError::StructuralViolation(format!(
                "tensor components differ in length: par={}, per={}, scalar={}",
                par.len(),
                per.len(),
                scalar.len()
            )));
        }
        Ok(Tensor { par, per, scalar })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.par.len()
    }

    /// True when the series holds no samples.
    pub fn is_empty(&self) -> bool {
        self.par.is_empty()
    }

    /// The parallel component series.
    pub fn par(&self) -> &[f64] {
        &self.par
    }

    /// The perpendicular component series.
    pub fn per(&self) -> &[f64] {
        &self.per
    }

    /// The scalar (isotropic-equivalent) component series.
    pub fn scalar(&self) -> &[f64] {
        &self.scalar
    }
}

impl SeriesLike for Tensor {
    fn as_vector(&self) -> Option<&Vector> {
        None
    }

    fn kind(&self) -> &'static str {
        "tensor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_vector() -> Vector {
        Vector::new(vec![3.0, 0.0], vec![4.0, 5.0], vec![0.0, 12.0]).unwrap()
    }

    #[test]
    fn test_magnitude_and_rho() {
        let v = sample_vector();
        assert_eq!(v.magnitude(), vec![5.0, 13.0]);
        assert_eq!(v.rho(), vec![5.0, 5.0]);
    }

    #[test]
    fn test_angles() {
        let v = Vector::new(vec![1.0], vec![1.0], vec![0.0]).unwrap();
        assert_relative_eq!(v.longitude()[0], 45.0);
        // In the x-y plane the colatitude from +z is 90 degrees.
        assert_relative_eq!(v.colatitude()[0], 90.0);
    }

    #[test]
    fn test_unit_vector_has_unit_norm() {
        let v = sample_vector();
        let unit = v.unit_vector();
        for m in unit.magnitude() {
            assert_relative_eq!(m, 1.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_project_onto_self_is_exact() {
        let v = sample_vector();
        let (par, per) = v.project(&v).unwrap();
        assert_eq!(par, v.magnitude(), "parallel part must equal the magnitude");
        assert_eq!(per, vec![0.0, 0.0], "perpendicular part must be exactly zero");
    }

    #[test]
    fn test_project_decomposition() {
        let v = Vector::new(vec![1.0], vec![1.0], vec![0.0]).unwrap();
        let along_x = Vector::new(vec![2.0], vec![0.0], vec![0.0]).unwrap();
        let (par, per) = v.project(&along_x).unwrap();
        assert_relative_eq!(par[0], 1.0);
        assert_relative_eq!(per[0], 1.0);
        // Pythagoras: par² + per² = |v|²
        assert_relative_eq!(par[0].powi(2) + per[0].powi(2), 2.0, epsilon = 1e-14);
    }

    #[test]
    fn test_project_rejects_non_vector_operand() {
        let v = sample_vector();
        let t = Tensor::new(vec![1.0, 1.0], vec![1.0, 1.0], vec![1.0, 1.0]).unwrap();
        let err = v.project(&t).unwrap_err();
        assert!(
            matches!(err, PlasmaError::NotImplementedMethod(_)),
            "expected NotImplementedMethod, got {err:?}"
        );
        assert!(matches!(
            v.cos_theta(&t),
            Err(PlasmaError::NotImplementedMethod(_))
        ));
    }

    #[test]
    fn test_cos_theta() {
        let v = Vector::new(vec![1.0], vec![0.0], vec![0.0]).unwrap();
        let w = Vector::new(vec![1.0], vec![1.0], vec![0.0]).unwrap();
        let cos = v.cos_theta(&w).unwrap();
        assert_relative_eq!(cos[0], std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-14);
    }

    #[test]
    fn test_structural_equality_with_nan() {
        let a = Vector::new(vec![1.0, f64::NAN], vec![0.0; 2], vec![0.0; 2]).unwrap();
        let b = Vector::new(vec![1.0, f64::NAN], vec![0.0; 2], vec![0.0; 2]).unwrap();
        let c = Vector::new(vec![1.0, 2.0], vec![0.0; 2], vec![0.0; 2]).unwrap();
        assert_eq!(a, b, "NaN at the same position counts as equal");
        assert_ne!(a, c);
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        assert!(matches!(
            Vector::new(vec![1.0], vec![1.0, 2.0], vec![1.0]),
            Err(PlasmaError::StructuralViolation(_))
        ));
        assert!(matches!(
            Tensor::new(vec![1.0], vec![1.0, 2.0], vec![1.0]),
            Err(PlasmaError::StructuralViolation(_))
        ));
    }
}
