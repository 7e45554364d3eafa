//! Cross-species derivation engine.
//!
//! Every method here takes species expressions in their raw string form
//! (`"p1"`, `"a+p1"`), resolves them through the canonical expression
//! grammar, validates the constituents against the plasma's declared species,
//! and only then dispatches the physics. Inputs are converted from display
//! units to SI at the formula boundary and results converted back, so the
//! formula bodies read like the textbook expressions they implement.
//!
//! Multi-species combinations are mass-density weighted throughout. Formulas
//! that are only meaningful per species (thermal speed) or only pairwise
//! between single populations (Coulomb logarithm, collision rate, VDF ratio)
//! reject other shapes explicitly rather than guessing.

use nalgebra::Vector3;
use tracing::debug;

use crate::core_types::constants::{
    ELECTRON_MASS, ELEMENTARY_CHARGE, EPSILON_0, GAMMA, MU_0, PROTON_MASS,
};
use crate::core_types::{
    attributes, canonicalize, validate, Quantity, SpeciesExpr, SpeciesRequest, SpeciesToken,
    Tensor, Vector, CORE_PROTON_TOKENS,
};
use crate::error::{PlasmaError, Result};
use crate::ion::Ion;
use crate::math::slowing_down_factor;
use crate::plasma::Plasma;

impl Plasma {
    /// Parse and validate a raw request: one expression, or a comma-separated
    /// pair for binary formulas.
    pub fn request(&self, raw: &str) -> Result<SpeciesRequest> {
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        let request = match parts.as_slice() {
            [one] => SpeciesRequest::One(SpeciesExpr::parse(one)?),
            [a, b] => SpeciesRequest::Pair(SpeciesExpr::parse(a)?, SpeciesExpr::parse(b)?),
            _ => {
                return Err(PlasmaError::InvalidSpeciesSyntax(format!(
                    "{raw:?} has {} comma-separated parts, at most 2 are meaningful",
                    parts.len()
                )))
            }
        };
        let exprs: Vec<SpeciesExpr> = match &request {
            SpeciesRequest::One(e) => vec![e.clone()],
            SpeciesRequest::Pair(a, b) => vec![a.clone(), b.clone()],
            SpeciesRequest::Each(list) => list.clone(),
        };
        validate(&exprs, &self.species)?;
        Ok(request)
    }

    /// Parse and validate a variadic item list into an independent-results
    /// request. The list is canonicalized as a whole, so mixing `+`-sums
    /// with plain tokens is rejected up front, exactly as for a single call.
    pub fn request_each(&self, items: &[&str]) -> Result<SpeciesRequest> {
        let exprs = canonicalize(items)?;
        validate(&exprs, &self.species)?;
        Ok(SpeciesRequest::Each(exprs))
    }

    /// Evaluate a formula independently for each expression of a request.
    ///
    /// A `One` request yields a single-element result; a `Pair` has no
    /// independent per-item meaning and is rejected.
    pub fn each<T, F>(&self, request: &SpeciesRequest, f: F) -> Result<Vec<T>>
    where
        F: Fn(&Self, &str) -> Result<T>,
    {
        let exprs: Vec<&SpeciesExpr> = match request {
            SpeciesRequest::One(e) => vec![e],
            SpeciesRequest::Each(list) => list.iter().collect(),
            SpeciesRequest::Pair(a, b) => {
                return Err(PlasmaError::InvalidSpeciesSyntax(format!(
                    "pairwise request ({a}, {b}) has no independent per-item evaluation"
                )))
            }
        };
        exprs.iter().map(|e| f(self, &e.to_string())).collect()
    }

    /// Resolve an expression to its constituent ion views, in canonical
    /// token order.
    fn constituents(&self, expr: &SpeciesExpr) -> Result<Vec<&Ion>> {
        validate(std::slice::from_ref(expr), &self.species)?;
        expr.tokens()
            .into_iter()
            .map(|token| {
                self.ions.get(token).ok_or_else(|| {
                    PlasmaError::StructuralViolation(format!(
                        "no ion view for declared species {token}"
                    ))
                })
            })
            .collect()
    }

    /// Resolve a raw expression that must name exactly one population.
    fn single_ion(&self, raw: &str, formula: &str) -> Result<&Ion> {
        let expr = SpeciesExpr::parse(raw)?;
        if !expr.is_single() {
            return Err(PlasmaError::InvalidSpeciesSyntax(format!(
                "{formula} is defined between single populations, got {expr:?} ({expr})"
            )));
        }
        Ok(self.constituents(&expr)?[0])
    }

    /// Magnetic field magnitude in SI (T), per sample.
    fn bmag_si(&self) -> Vec<f64> {
        let scale = Quantity::MagneticField.si_scale();
        self.bfield.magnitude().iter().map(|b| b * scale).collect()
    }

    /// Mass-density-weighted bulk velocity in SI, with the total mass
    /// density, per sample.
    fn com_velocity_si(ions: &[&Ion]) -> (Vec<Vector3<f64>>, Vec<f64>) {
        let rows = ions.first().map_or(0, |i| i.len());
        let rhos: Vec<Vec<f64>> = ions.iter().map(|i| i.mass_density_si()).collect();
        let v_scale = Quantity::Velocity.si_scale();
        let mut vcom = Vec::with_capacity(rows);
        let mut rho_tot = Vec::with_capacity(rows);
        for i in 0..rows {
            let mut rho_sum = 0.0;
            let mut momentum = Vector3::zeros();
            for (ion, rho) in ions.iter().zip(&rhos) {
                rho_sum += rho[i];
                momentum += ion.velocity().row(i) * v_scale * rho[i];
            }
            vcom.push(momentum / rho_sum);
            rho_tot.push(rho_sum);
        }
        (vcom, rho_tot)
    }

    /// Component-wise sum of per-ion gyrotropic tensors.
    fn tensor_sum(tensors: &[Tensor]) -> Tensor {
        let rows = tensors.first().map_or(0, Tensor::len);
        let mut par = vec![0.0; rows];
        let mut per = vec![0.0; rows];
        let mut scalar = vec![0.0; rows];
        for t in tensors {
            for i in 0..rows {
                par[i] += t.par()[i];
                per[i] += t.per()[i];
                scalar[i] += t.scalar()[i];
            }
        }
        Tensor::new(par, per, scalar)
            .unwrap_or_else(|_| unreachable!("summed tensors share the frame axis"))
    }

    /// Total mass density of an expression, in proton masses per cm³.
    pub fn mass_density(&self, species: &str) -> Result<Vec<f64>> {
        let ions = self.constituents(&SpeciesExpr::parse(species)?)?;
        let rows = ions[0].len();
        let mut out = vec![0.0; rows];
        for ion in &ions {
            for (acc, rho) in out.iter_mut().zip(ion.mass_density()) {
                *acc += rho;
            }
        }
        Ok(out)
    }

    /// Bulk velocity of an expression (km/s). A sum is the mass-density
    /// weighted (center-of-mass) velocity of its constituents.
    pub fn velocity(&self, species: &str) -> Result<Vector> {
        let expr = SpeciesExpr::parse(species)?;
        let ions = self.constituents(&expr)?;
        if let [ion] = ions.as_slice() {
            return Ok(ion.velocity().clone());
        }
        let (vcom, _) = Self::com_velocity_si(&ions);
        let scale = Quantity::Velocity.si_scale();
        let mut x = Vec::with_capacity(vcom.len());
        let mut y = Vec::with_capacity(vcom.len());
        let mut z = Vec::with_capacity(vcom.len());
        for v in vcom {
            x.push(v.x / scale);
            y.push(v.y / scale);
            z.push(v.z / scale);
        }
        Vector::new(x, y, z)
    }

    /// Differential flow `v(a) − v(b)` (km/s).
    ///
    /// Requesting the flow of an expression relative to itself is identically
    /// zero for every sample and therefore rejected as a degenerate request.
    pub fn dv(&self, a: &str, b: &str) -> Result<Vector> {
        let ea = SpeciesExpr::parse(a)?;
        let eb = SpeciesExpr::parse(b)?;
        if ea == eb {
            return Err(PlasmaError::ZeroDifferentialFlow(format!(
                "dv({ea}, {eb}) is identically zero"
            )));
        }
        let va = self.velocity(&ea.to_string())?;
        let vb = self.velocity(&eb.to_string())?;
        let diff = |p: &[f64], q: &[f64]| p.iter().zip(q).map(|(x, y)| x - y).collect();
        Vector::new(
            diff(va.x(), vb.x()),
            diff(va.y(), vb.y()),
            diff(va.z(), vb.z()),
        )
    }

    /// Differential flow scaled by the square root of the mass-to-charge
    /// ratio of `a` over `b`, `dv·sqrt((m_a/z_a)/(m_b/z_b))` (km/s).
    ///
    /// The scaling is undefined for combined populations, which have no
    /// single mass-to-charge ratio, so both sides must be single species.
    pub fn dv_m2q(&self, a: &str, b: &str) -> Result<Vector> {
        let ion_a = self.single_ion(a, "dv_m2q")?;
        let ion_b = self.single_ion(b, "dv_m2q")?;
        let m2q = |ion: &Ion| ion.attrs().mass / f64::from(ion.attrs().charge_state).abs();
        let scale = (m2q(ion_a) / m2q(ion_b)).sqrt();
        let dv = self.dv(a, b)?;
        let scaled = |s: &[f64]| s.iter().map(|v| v * scale).collect();
        Vector::new(scaled(dv.x()), scaled(dv.y()), scaled(dv.z()))
    }

    /// Thermal speed tensor of one population (km/s).
    ///
    /// There is no physically meaningful thermal speed of a combined
    /// population without a model for its velocity distribution, so sums are
    /// rejected; request each species separately, or ask for the combined
    /// temperature or pressure instead.
    pub fn thermal_speed(&self, species: &str) -> Result<Tensor> {
        let expr = SpeciesExpr::parse(species)?;
        if !expr.is_single() {
            validate(std::slice::from_ref(&expr), &self.species)?;
            return Err(PlasmaError::AmbiguousCombination(format!(
                "thermal speed of a combined population ({expr})"
            )));
        }
        Ok(self.constituents(&expr)?[0].thermal_speed().clone())
    }

    /// Thermal pressure tensor (pPa). A sum is the component-wise total over
    /// its constituents.
    pub fn pressure(&self, species: &str) -> Result<Tensor> {
        let ions = self.constituents(&SpeciesExpr::parse(species)?)?;
        let tensors: Vec<Tensor> = ions.iter().map(|i| i.pressure()).collect();
        Ok(Self::tensor_sum(&tensors))
    }

    /// Temperature tensor (K), combined the same way as pressure.
    pub fn temperature(&self, species: &str) -> Result<Tensor> {
        let ions = self.constituents(&SpeciesExpr::parse(species)?)?;
        let tensors: Vec<Tensor> = ions.iter().map(|i| i.temperature()).collect();
        Ok(Self::tensor_sum(&tensors))
    }

    /// Temperature anisotropy, dimensionless. For a sum, the product of the
    /// per-species `p_per/p_par` ratios.
    pub fn anisotropy(&self, species: &str) -> Result<Vec<f64>> {
        let ions = self.constituents(&SpeciesExpr::parse(species)?)?;
        let rows = ions[0].len();
        let mut out = vec![1.0; rows];
        for ion in &ions {
            let p = ion.pressure();
            for i in 0..rows {
                out[i] *= p.per()[i] / p.par()[i];
            }
        }
        Ok(out)
    }

    /// Plasma beta tensor `2·μ₀·p / B²` per component, dimensionless.
    pub fn beta(&self, species: &str) -> Result<Tensor> {
        let p = self.pressure(species)?;
        let bmag = self.bmag_si();
        let p_scale = Quantity::Pressure.si_scale();
        let component = |values: &[f64]| -> Vec<f64> {
            values
                .iter()
                .zip(&bmag)
                .map(|(p, b)| 2.0 * MU_0 * p * p_scale / (b * b))
                .collect()
        };
        Tensor::new(component(p.par()), component(p.per()), component(p.scalar()))
    }

    /// Alfvén speed `C_A = B / sqrt(μ₀·ρ)` (km/s), with ρ the total mass
    /// density of the expression.
    pub fn alfven_speed(&self, species: &str) -> Result<Vec<f64>> {
        let ions = self.constituents(&SpeciesExpr::parse(species)?)?;
        let (_, rho_tot) = Self::com_velocity_si(&ions);
        let bmag = self.bmag_si();
        Ok(bmag
            .iter()
            .zip(&rho_tot)
            .map(|(b, rho)| Quantity::AlfvenSpeed.from_si(b / (MU_0 * rho).sqrt()))
            .collect())
    }

    /// Anisotropy correction factor for the Alfvén speed,
    /// `1 + μ₀·Σᵢ(p_perᵢ − p_parᵢ)/B²`, dimensionless.
    pub fn afsq(&self, species: &str) -> Result<Vec<f64>> {
        let ions = self.constituents(&SpeciesExpr::parse(species)?)?;
        let bmag = self.bmag_si();
        let p_scale = Quantity::Pressure.si_scale();
        let rows = ions[0].len();
        let mut out = Vec::with_capacity(rows);
        for i in 0..rows {
            let dp: f64 = ions
                .iter()
                .map(|ion| {
                    let p = ion.pressure();
                    (p.per()[i] - p.par()[i]) * p_scale
                })
                .sum();
            out.push(1.0 + MU_0 * dp / (bmag[i] * bmag[i]));
        }
        Ok(out)
    }

    /// Alfvén speed corrected for pressure anisotropy,
    /// `C_A·sqrt(AFSQ)` (km/s).
    pub fn alfven_speed_anisotropic(&self, species: &str) -> Result<Vec<f64>> {
        let ca = self.alfven_speed(species)?;
        let afsq = self.afsq(species)?;
        Ok(ca
            .iter()
            .zip(&afsq)
            .map(|(ca, f)| ca * f.sqrt())
            .collect())
    }

    /// Dynamic pressure of the differential flows about the center of mass,
    /// `½·Σᵢ ρᵢ·|vᵢ − v_com|²` (pPa).
    ///
    /// With a single population every flow is zero by construction, so at
    /// least two constituent species are required.
    pub fn dynamic_pressure(&self, species: &str) -> Result<Vec<f64>> {
        let expr = SpeciesExpr::parse(species)?;
        let ions = self.constituents(&expr)?;
        if ions.len() < 2 {
            return Err(PlasmaError::InsufficientSpecies(format!(
                "dynamic pressure needs at least two species, got {expr}"
            )));
        }
        let (vcom, _) = Self::com_velocity_si(&ions);
        let rhos: Vec<Vec<f64>> = ions.iter().map(|i| i.mass_density_si()).collect();
        let v_scale = Quantity::Velocity.si_scale();
        let rows = vcom.len();
        let mut out = Vec::with_capacity(rows);
        for i in 0..rows {
            let p: f64 = ions
                .iter()
                .zip(&rhos)
                .map(|(ion, rho)| {
                    let u = ion.velocity().row(i) * v_scale - vcom[i];
                    0.5 * rho[i] * u.norm_squared()
                })
                .sum();
            out.push(Quantity::Pressure.from_si(p));
        }
        Ok(out)
    }

    /// Field-parallel heat flux carried by the differential flows,
    /// `Σᵢ ρᵢ·(u∥ᵢ³ + 1.5·u∥ᵢ·w∥ᵢ²)` with `u∥ᵢ` the flow of species `i`
    /// about the center of mass projected on the field (W/m²).
    pub fn heat_flux_par(&self, species: &str) -> Result<Vec<f64>> {
        let expr = SpeciesExpr::parse(species)?;
        let ions = self.constituents(&expr)?;
        if ions.len() < 2 {
            return Err(PlasmaError::InsufficientSpecies(format!(
                "parallel heat flux needs at least two species, got {expr}"
            )));
        }
        let (vcom, _) = Self::com_velocity_si(&ions);
        let rhos: Vec<Vec<f64>> = ions.iter().map(|i| i.mass_density_si()).collect();
        let bhat = self.bfield.unit_vector();
        let v_scale = Quantity::Velocity.si_scale();
        let w_scale = Quantity::ThermalSpeed.si_scale();
        let rows = vcom.len();
        let mut out = Vec::with_capacity(rows);
        for i in 0..rows {
            let b = bhat.row(i);
            let q: f64 = ions
                .iter()
                .zip(&rhos)
                .map(|(ion, rho)| {
                    let u_par = (ion.velocity().row(i) * v_scale - vcom[i]).dot(&b);
                    let w_par = ion.thermal_speed().par()[i] * w_scale;
                    rho[i] * (u_par.powi(3) + 1.5 * u_par * w_par * w_par)
                })
                .sum();
            out.push(q);
        }
        Ok(out)
    }

    /// Coulomb logarithm for ion-ion collisions between two single
    /// populations (NRL Plasma Formulary), dimensionless:
    ///
    /// ```text
    /// lnΛ = 29.9 − ln[ z_a·z_b·(μ_a+μ_b) / (μ_a·T_b + μ_b·T_a)
    ///                  · sqrt(n_a·z_a²/T_a + n_b·z_b²/T_b) ]
    /// ```
    ///
    /// with T in eV, n in m⁻³ (29.9 is the m⁻³ form of the formulary's
    /// cm⁻³ constant 23), and μ the mass in proton units.
    pub fn lnlambda(&self, a: &str, b: &str) -> Result<Vec<f64>> {
        let ion_a = self.single_ion(a, "lnlambda")?;
        let ion_b = self.single_ion(b, "lnlambda")?;
        let na_si = ion_a.density_si();
        let nb_si = ion_b.density_si();
        let temp_ev = |ion: &Ion, i: usize| {
            let w = Quantity::ThermalSpeed.to_si(ion.thermal_speed().scalar()[i]);
            0.5 * ion.attrs().mass * w * w / ELEMENTARY_CHARGE
        };
        let za = f64::from(ion_a.attrs().charge_state).abs();
        let zb = f64::from(ion_b.attrs().charge_state).abs();
        let mu_a = ion_a.attrs().mass_in_proton_units;
        let mu_b = ion_b.attrs().mass_in_proton_units;
        let rows = ion_a.len();
        let mut out = Vec::with_capacity(rows);
        for i in 0..rows {
            let ta = temp_ev(ion_a, i);
            let tb = temp_ev(ion_b, i);
            let na = na_si[i];
            let nb = nb_si[i];
            let arg = za * zb * (mu_a + mu_b) / (mu_a * tb + mu_b * ta)
                * (na * za * za / ta + nb * zb * zb / tb).sqrt();
            out.push(29.9 - arg.ln());
        }
        Ok(out)
    }

    /// Coulomb collision rate of species `a` on species `b` (Hz):
    ///
    /// ```text
    /// ν = z_a²·z_b²·e⁴·n_b·lnΛ / (12·π^1.5·ε₀²·m_a·μ_ab·w_ab³) · Φ(Δv/w_ab)
    /// ```
    ///
    /// with `w_ab = sqrt(w_a² + w_b²)` the combined scalar thermal speed,
    /// `μ_ab` the reduced mass, and Φ the slowing-down factor. With
    /// `both_species` the rate is scaled by `(1 + ρ_a/ρ_b)` to account for
    /// the back-reaction on `b`.
    pub fn collision_rate(&self, a: &str, b: &str, both_species: bool) -> Result<Vec<f64>> {
        let ion_a = self.single_ion(a, "collision_rate")?;
        let ion_b = self.single_ion(b, "collision_rate")?;
        let lnlambda = self.lnlambda(a, b)?;

        let ma = ion_a.attrs().mass;
        let mb = ion_b.attrs().mass;
        let mu_ab = ma * mb / (ma + mb);
        let qa = f64::from(ion_a.attrs().charge_state).abs() * ELEMENTARY_CHARGE;
        let qb = f64::from(ion_b.attrs().charge_state).abs() * ELEMENTARY_CHARGE;
        let prefactor_const =
            qa * qa * qb * qb / (12.0 * std::f64::consts::PI.powf(1.5) * EPSILON_0 * EPSILON_0);

        let w_scale = Quantity::ThermalSpeed.si_scale();
        let v_scale = Quantity::Velocity.si_scale();
        let nb_si = ion_b.density_si();
        let rows = ion_a.len();
        let mut out = Vec::with_capacity(rows);
        for i in 0..rows {
            let wa = ion_a.thermal_speed().scalar()[i] * w_scale;
            let wb = ion_b.thermal_speed().scalar()[i] * w_scale;
            let w_ab = wa.hypot(wb);
            let dv = (ion_a.velocity().row(i) - ion_b.velocity().row(i)).norm() * v_scale;
            let nu0 = prefactor_const * nb_si[i] * lnlambda[i] / (ma * mu_ab * w_ab.powi(3));
            let mut nu = nu0 * slowing_down_factor(dv / w_ab);
            if both_species {
                let rho_ratio = ma * ion_a.density()[i] / (mb * ion_b.density()[i]);
                nu *= 1.0 + rho_ratio;
            }
            out.push(nu);
        }
        debug!(a, b, both_species, "derived collision rate");
        Ok(out)
    }

    /// Coulomb number: collisional age `ν·d/|v_com|` accumulated over the
    /// transit from the Sun, dimensionless. Needs an attached spacecraft for
    /// the heliocentric distance.
    pub fn coulomb_number(&self, a: &str, b: &str, both_species: bool) -> Result<Vec<f64>> {
        let Some(spacecraft) = &self.spacecraft else {
            return Err(PlasmaError::MissingCollaborator(
                "coulomb number needs an attached spacecraft for the heliocentric distance"
                    .into(),
            ));
        };
        let nu = self.collision_rate(a, b, both_species)?;
        let ion_a = self.single_ion(a, "coulomb_number")?;
        let ion_b = self.single_ion(b, "coulomb_number")?;
        let (vcom, _) = Self::com_velocity_si(&[ion_a, ion_b]);
        let d_scale = Quantity::Distance.si_scale();
        Ok(nu
            .iter()
            .zip(&vcom)
            .zip(&spacecraft.distance_to_sun)
            .map(|((nu, v), d)| nu * d * d_scale / v.norm())
            .collect())
    }

    /// Specific entropy proxy `p_scalar·ρ^(−5/3)` of the expression's total
    /// scalar pressure and mass density, in SI.
    pub fn specific_entropy(&self, species: &str) -> Result<Vec<f64>> {
        let ions = self.constituents(&SpeciesExpr::parse(species)?)?;
        let p = Self::tensor_sum(&ions.iter().map(|i| i.pressure()).collect::<Vec<_>>());
        let (_, rho_tot) = Self::com_velocity_si(&ions);
        let p_scale = Quantity::Pressure.si_scale();
        Ok(p.scalar()
            .iter()
            .zip(&rho_tot)
            .map(|(p, rho)| p * p_scale * rho.powf(-GAMMA))
            .collect())
    }

    /// Estimate the electron population from quasi-neutrality.
    ///
    /// Density is the charge-weighted ion total `n_e = Σᵢ nᵢ·zᵢ`, velocity
    /// the charge-flux-weighted mean, and the thermal speed is isotropic,
    /// scaled from the core proton population by
    /// `w_e = w_p·sqrt((n_p/n_e)·(m_p/m_e))` (equal core temperatures).
    ///
    /// Exactly one core proton token (`p1` or `p`) must be declared: zero
    /// leaves the scaling without a reference, two make it ambiguous.
    pub fn estimate_electrons(&self) -> Result<Ion> {
        let core: Vec<&SpeciesToken> = self
            .species
            .iter()
            .filter(|t| CORE_PROTON_TOKENS.contains(&t.as_str()))
            .collect();
        let proton = match core.as_slice() {
            [one] => self.ions.get(*one).ok_or_else(|| {
                PlasmaError::StructuralViolation(format!("no ion view for declared species {one}"))
            })?,
            [] => {
                return Err(PlasmaError::UnavailableSpecies {
                    requested: CORE_PROTON_TOKENS.iter().map(ToString::to_string).collect(),
                    available: self
                        .species
                        .iter()
                        .map(|t| t.as_str().to_string())
                        .collect(),
                    unavailable: CORE_PROTON_TOKENS.iter().map(ToString::to_string).collect(),
                })
            }
            _ => {
                return Err(PlasmaError::AmbiguousCombination(
                    "both p and p1 are declared; the electron estimate needs one core proton \
                     population"
                        .into(),
                ))
            }
        };

        let positive: Vec<&Ion> = self
            .species
            .iter()
            .filter_map(|t| self.ions.get(t))
            .filter(|ion| ion.attrs().charge_state > 0)
            .collect();
        let rows = self.frame.len();
        let mut density = vec![0.0; rows];
        let mut vx = vec![0.0; rows];
        let mut vy = vec![0.0; rows];
        let mut vz = vec![0.0; rows];
        for ion in &positive {
            let z = f64::from(ion.attrs().charge_state);
            for i in 0..rows {
                let nz = ion.density()[i] * z;
                density[i] += nz;
                let v = ion.velocity().row(i);
                vx[i] += nz * v.x;
                vy[i] += nz * v.y;
                vz[i] += nz * v.z;
            }
        }
        for i in 0..rows {
            vx[i] /= density[i];
            vy[i] /= density[i];
            vz[i] /= density[i];
        }

        let w: Vec<f64> = (0..rows)
            .map(|i| {
                let wp = proton.thermal_speed().scalar()[i];
                let np = proton.density()[i];
                wp * (np / density[i] * (PROTON_MASS / ELECTRON_MASS)).sqrt()
            })
            .collect();

        let token = SpeciesToken::new("e")?;
        let attrs = attributes(&token).ok_or_else(|| {
            PlasmaError::StructuralViolation("electron attributes missing from the catalog".into())
        })?;
        Ok(Ion::from_parts(
            token,
            attrs,
            density,
            Vector::new(vx, vy, vz)?,
            Tensor::new(w.clone(), w.clone(), w)?,
        ))
    }

    /// Log of the bi-Maxwellian phase-space density ratio `f_b/f_c`,
    /// evaluated at the beam velocity, dimensionless:
    ///
    /// ```text
    /// ln(f_b/f_c) = ln[ n_b·w∥c·w⊥c² / (n_c·w∥b·w⊥b²) ]
    ///               + Δv∥²/w∥c² + Δv⊥²/w⊥c²
    /// ```
    ///
    /// with Δv the beam-core drift decomposed about the magnetic field.
    pub fn vdf_ratio(&self, beam: &str, core: &str) -> Result<Vec<f64>> {
        let ion_b = self.single_ion(beam, "vdf_ratio")?;
        let ion_c = self.single_ion(core, "vdf_ratio")?;
        let bhat = self.bfield.unit_vector();
        let rows = ion_b.len();
        let mut out = Vec::with_capacity(rows);
        for i in 0..rows {
            let b = bhat.row(i);
            let dv = ion_b.velocity().row(i) - ion_c.velocity().row(i);
            let dv_par = dv.dot(&b);
            let dv_per = (dv - b * dv_par).norm();

            let (nb, nc) = (ion_b.density()[i], ion_c.density()[i]);
            let (wb_par, wb_per) = (
                ion_b.thermal_speed().par()[i],
                ion_b.thermal_speed().per()[i],
            );
            let (wc_par, wc_per) = (
                ion_c.thermal_speed().par()[i],
                ion_c.thermal_speed().per()[i],
            );
            let amplitude = (nb * wc_par * wc_per * wc_per) / (nc * wb_par * wb_per * wb_per);
            out.push(amplitude.ln() + dv_par * dv_par / (wc_par * wc_par)
                + dv_per * dv_per / (wc_per * wc_per));
        }
        Ok(out)
    }
}
