//! Scalar special functions used by the collision formulas.

/// Error function erf(x).
///
/// Horner-form rational approximation (Abramowitz & Stegun 7.1.26), maximum
/// absolute error ~1.5e-7, extended to negative arguments by oddness.
pub fn erf(x: f64) -> f64 {
    if x < 0.0 {
        return -erf(-x);
    }
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = t
        * (0.254829592
            + t * (-0.284496736
                + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    1.0 - poly * (-x * x).exp()
}

/// Normalized slowing-down diffusion factor used by the collision rate:
///
/// ```text
/// Φ(x) = (3·√π/4) · [erf(x) − (2x/√π)·e^(−x²)] / x³
/// ```
///
/// Φ(0) = 1 and Φ decreases monotonically as the drift grows relative to the
/// combined thermal spread. Small arguments use the series limit
/// `1 − (3/5)x²` where the closed form loses all significant digits.
pub fn slowing_down_factor(x: f64) -> f64 {
    const SERIES_CUTOFF: f64 = 1e-4;
    let x = x.abs();
    if x < SERIES_CUTOFF {
        return 1.0 - 0.6 * x * x;
    }
    let sqrt_pi = std::f64::consts::PI.sqrt();
    let bracket = erf(x) - (2.0 * x / sqrt_pi) * (-x * x).exp();
    (3.0 * sqrt_pi / 4.0) * bracket / (x * x * x)
}
