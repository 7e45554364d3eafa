//! End-to-end derivation scenarios over a realistic two-proton-plus-alpha
//! plasma, exercising the public API the way an analysis script would.

use approx::assert_relative_eq;
use chrono::{DateTime, TimeZone, Utc};
use solar_wind_core::{Plasma, PlasmaError, RawTable, SpeciesToken};

fn epoch(n: usize) -> Vec<DateTime<Utc>> {
    (0..n)
        .map(|i| {
            Utc.with_ymd_and_hms(2021, 11, 21, 0, 0, u32::try_from(i).unwrap())
                .unwrap()
        })
        .collect()
}

fn solar_wind_raw() -> RawTable {
    let mut raw = RawTable::new(epoch(4));
    raw.push_scalar("n", "p1", vec![5.0, 5.5, 6.0, 5.8]);
    raw.push_vector(
        "v",
        "p1",
        vec![400.0, 405.0, 398.0, 402.0],
        vec![-10.0, -12.0, -9.0, -11.0],
        vec![5.0, 4.0, 6.0, 5.0],
    );
    raw.push_thermal_speed("p1", vec![20.0, 21.0, 19.5, 20.5], vec![25.0, 26.0, 24.0, 25.5]);
    raw.push_scalar("n", "p2", vec![0.5, 0.6, 0.4, 0.5]);
    raw.push_vector(
        "v",
        "p2",
        vec![450.0, 455.0, 448.0, 452.0],
        vec![-8.0, -10.0, -7.0, -9.0],
        vec![3.0, 2.0, 4.0, 3.0],
    );
    raw.push_thermal_speed("p2", vec![30.0, 31.0, 29.0, 30.5], vec![35.0, 36.0, 34.0, 35.5]);
    raw.push_scalar("n", "a", vec![0.2, 0.25, 0.18, 0.22]);
    raw.push_vector(
        "v",
        "a",
        vec![420.0, 425.0, 418.0, 422.0],
        vec![-9.0, -11.0, -8.0, -10.0],
        vec![4.0, 3.0, 5.0, 4.0],
    );
    raw.push_thermal_speed("a", vec![28.0, 29.0, 27.0, 28.5], vec![28.0, 29.0, 27.0, 28.5]);
    raw.push_vector(
        "b",
        "",
        vec![4.0, 4.2, 3.9, 4.1],
        vec![-3.0, -3.1, -2.9, -3.0],
        vec![1.0, 1.1, 0.9, 1.0],
    );
    // Not in the core vocabulary: carried through as auxiliary data.
    raw.push_scalar("epsilon", "p1", vec![0.1, 0.2, 0.15, 0.12]);
    raw
}

#[test]
fn weighted_velocity_matches_hand_computation() {
    let plasma = Plasma::new(&solar_wind_raw(), &["p1", "p2", "a"]).unwrap();
    let v = plasma.velocity("p1+p2").unwrap();
    // Equal proton masses, so the weights are the densities.
    let expected = (5.0 * 400.0 + 0.5 * 450.0) / 5.5;
    assert_relative_eq!(v.x()[0], expected, max_relative = 1e-12);
}

#[test]
fn auxiliary_columns_survive_untouched() {
    let plasma = Plasma::new(&solar_wind_raw(), &["p1", "p2", "a"]).unwrap();
    let aux = plasma.auxiliary_data().get("epsilon", "", "p1").unwrap();
    assert_eq!(aux, &[0.1, 0.2, 0.15, 0.12]);
}

#[test]
fn error_taxonomy_is_stable_across_the_api() {
    let plasma = Plasma::new(&solar_wind_raw(), &["p1", "p2", "a"]).unwrap();

    assert!(matches!(
        plasma.velocity("p1,p2"),
        Err(PlasmaError::InvalidSpeciesSyntax(_))
    ));
    assert!(matches!(
        plasma.velocity("he2"),
        Err(PlasmaError::UnavailableSpecies { .. })
    ));
    assert!(matches!(
        plasma.thermal_speed("p1+p2"),
        Err(PlasmaError::AmbiguousCombination(_))
    ));
    assert!(matches!(
        plasma.dv("a+p1", "p1+a"),
        Err(PlasmaError::ZeroDifferentialFlow(_))
    ));
    assert!(matches!(
        plasma.dynamic_pressure("a"),
        Err(PlasmaError::InsufficientSpecies(_))
    ));
    assert!(matches!(
        plasma.coulomb_number("p1", "a", true),
        Err(PlasmaError::MissingCollaborator(_))
    ));
    assert!(matches!(
        plasma.lnlambda("p1+p2", "a"),
        Err(PlasmaError::InvalidSpeciesSyntax(_))
    ));
}

#[test]
fn derived_quantities_are_physically_consistent() {
    let plasma = Plasma::new(&solar_wind_raw(), &["p1", "p2", "a"]).unwrap();

    // Projection of the total pressure: per > par here (w_per > w_par).
    let p = plasma.pressure("p1+p2+a").unwrap();
    assert!(p.per()[0] > p.par()[0]);

    // Beta scales linearly with pressure.
    let beta_p1 = plasma.beta("p1").unwrap();
    let beta_all = plasma.beta("p1+p2+a").unwrap();
    assert!(beta_all.scalar()[0] > beta_p1.scalar()[0]);

    // Anisotropic Alfvén speed exceeds the isotropic one when p_per > p_par.
    let ca = plasma.alfven_speed("p1+p2+a").unwrap();
    let caa = plasma.alfven_speed_anisotropic("p1+p2+a").unwrap();
    assert!(caa[0] > ca[0]);

    // The beam is hotter and faster, so the proton heat flux is field-aligned
    // and nonzero.
    let q = plasma.heat_flux_par("p1+p2").unwrap();
    assert!(q[0].abs() > 0.0);

    // Collisional age over a 1 au transit is far below unity out here.
    let mut plasma = plasma;
    plasma
        .set_spacecraft(Some(solar_wind_core::Spacecraft::from_au(
            "wind",
            vec![1.0; 4],
        )))
        .unwrap();
    let nc = plasma.coulomb_number("p1", "a", true).unwrap();
    assert!(nc[0] > 0.0 && nc[0] < 1.0, "Nc should be in (0, 1), got {}", nc[0]);
}

#[test]
fn electron_estimate_closes_the_charge_balance() {
    let plasma = Plasma::new(&solar_wind_raw(), &["p1", "p2", "a"]).unwrap();
    let e = plasma.estimate_electrons().unwrap();
    // n_e = n_p1 + n_p2 + 2 n_a
    assert_relative_eq!(e.density()[0], 5.0 + 0.5 + 2.0 * 0.2, max_relative = 1e-12);
    // Electrons are far faster thermally than the protons they neutralize.
    let p1 = plasma.ion(&SpeciesToken::new("p1").unwrap()).unwrap();
    assert!(e.thermal_speed().scalar()[0] > 10.0 * p1.thermal_speed().scalar()[0]);
}

#[test]
fn drop_species_narrows_the_engine() {
    let mut plasma = Plasma::new(&solar_wind_raw(), &["p1", "p2", "a"]).unwrap();
    plasma.drop_species("p2").unwrap();
    assert!(matches!(
        plasma.velocity("p2"),
        Err(PlasmaError::UnavailableSpecies { .. })
    ));
    // The remaining species still derive.
    assert!(plasma.velocity("a+p1").is_ok());
}

#[test]
fn missing_samples_propagate_not_poison() {
    let mut raw = solar_wind_raw();
    for col in &mut raw.columns {
        if col.species == "p1" && col.measurement == "n" {
            col.values[2] = f64::NAN;
        }
    }
    let plasma = Plasma::new(&raw, &["p1", "p2", "a"]).unwrap();
    let rho = plasma.mass_density("p1+a").unwrap();
    assert!(rho[2].is_nan(), "NaN input must give NaN output");
    assert!(rho[0].is_finite(), "other samples must stay finite");
}
