//! Integration tests for the layered-earth forward operator.

use approx::assert_relative_eq;
use ndarray::{array, Array1};
use vesinv::forward::{DataType, Simulation1d};
use vesinv::utils::finite_difference;
use vesinv::{LayeredModel, LogMap, Survey};

/// Classical image-series apparent resistivity for a Wenner array over a
/// two-layer earth with top-layer thickness `t`.
fn wenner_two_layer_analytic(rho1: f64, rho2: f64, t: f64, a: f64) -> f64 {
    let k = (rho2 - rho1) / (rho2 + rho1);
    let mut sum = 0.0;
    for n in 1..200 {
        let kn = k.powi(n);
        let x = 2.0 * n as f64 * t / a;
        sum += kn * (1.0 / (1.0 + x * x).sqrt() - 1.0 / (4.0 + x * x).sqrt());
    }
    rho1 * (1.0 + 4.0 * sum)
}

#[test]
fn test_homogeneous_half_space_is_exact() {
    let spacings = [1.0, 3.0, 10.0, 30.0, 100.0, 300.0];
    let survey = Survey::wenner(&spacings).unwrap();
    let sim = Simulation1d::new(survey, DataType::ApparentResistivity, 1).unwrap();

    for rho in [1.0, 50.0, 1000.0] {
        let model = LayeredModel::new(array![rho], Array1::zeros(0)).unwrap();
        let d = sim.dpred(&model).unwrap();
        for v in d.iter() {
            assert_relative_eq!(*v, rho, max_relative = 1e-10);
        }
    }
}

#[test]
fn test_two_layer_wenner_matches_image_series() {
    let spacings = [2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 200.0];
    let survey = Survey::wenner(&spacings).unwrap();
    let sim = Simulation1d::new(survey, DataType::ApparentResistivity, 2).unwrap();

    let (rho1, rho2, t) = (100.0, 10.0, 20.0);
    let model = LayeredModel::new(array![rho1, rho2], array![t]).unwrap();
    let d = sim.dpred(&model).unwrap();

    for (v, a) in d.iter().zip(spacings.iter()) {
        let expected = wenner_two_layer_analytic(rho1, rho2, t, *a);
        assert_relative_eq!(*v, expected, max_relative = 0.01);
    }
}

#[test]
fn test_resistive_basement_two_layer() {
    let spacings = [5.0, 15.0, 50.0, 150.0];
    let survey = Survey::wenner(&spacings).unwrap();
    let sim = Simulation1d::new(survey, DataType::ApparentResistivity, 2).unwrap();

    let (rho1, rho2, t) = (20.0, 500.0, 10.0);
    let model = LayeredModel::new(array![rho1, rho2], array![t]).unwrap();
    let d = sim.dpred(&model).unwrap();

    for (v, a) in d.iter().zip(spacings.iter()) {
        let expected = wenner_two_layer_analytic(rho1, rho2, t, *a);
        assert_relative_eq!(*v, expected, max_relative = 0.01);
    }
    // Apparent resistivity climbs toward the basement at wide spacings.
    assert!(d[3] > d[0]);
}

#[test]
fn test_forward_is_deterministic() {
    let survey = Survey::wenner(&[10.0, 20.0, 40.0, 80.0]).unwrap();
    let sim = Simulation1d::new(survey, DataType::ApparentResistivity, 3).unwrap();
    let model = LayeredModel::new(array![100.0, 10.0, 100.0], array![20.0, 20.0]).unwrap();

    let d1 = sim.dpred(&model).unwrap();
    let d2 = sim.dpred(&model).unwrap();
    assert_eq!(d1, d2);
}

#[test]
fn test_voltage_and_apparent_resistivity_are_consistent() {
    let spacings = [10.0, 20.0, 40.0];
    let survey_v = Survey::wenner(&spacings).unwrap();
    let survey_a = Survey::wenner(&spacings).unwrap();
    let factors = survey_a.geometric_factors();

    let sim_v = Simulation1d::new(survey_v, DataType::Voltage, 2).unwrap();
    let sim_a = Simulation1d::new(survey_a, DataType::ApparentResistivity, 2).unwrap();
    let model = LayeredModel::new(array![100.0, 10.0], array![20.0]).unwrap();

    let dv = sim_v.dpred(&model).unwrap();
    let da = sim_a.dpred(&model).unwrap();
    for ((v, a), g) in dv.iter().zip(da.iter()).zip(factors.iter()) {
        assert_relative_eq!(
            *a,
            2.0 * std::f64::consts::PI * v / g,
            max_relative = 1e-12
        );
    }
}

#[test]
fn test_analytic_jacobian_matches_finite_differences() {
    let survey = Survey::wenner(&[10.0, 20.0, 40.0, 80.0]).unwrap();
    let n_layers = 3;
    let sim = Simulation1d::new(survey, DataType::ApparentResistivity, n_layers).unwrap();
    let mapping = LogMap::new(n_layers).unwrap();

    let model = LayeredModel::new(array![100.0, 10.0, 100.0], array![20.0, 20.0]).unwrap();
    let m = mapping.invert(&model).unwrap();

    // Jacobian in physical parameters, chain-ruled to log space by hand for
    // comparison against a log-space finite difference.
    let j_phys = sim.jacobian(&model).unwrap();
    let deriv = mapping.deriv(&m).unwrap();
    let j_log = &j_phys * &deriv;

    let sim_ref = &sim;
    let mapping_ref = &mapping;
    let j_fd = finite_difference::jacobian(
        |x| sim_ref.dpred(&mapping_ref.apply(x)?),
        &m,
        Some(1e-6),
    )
    .unwrap();

    for (a, b) in j_log.iter().zip(j_fd.iter()) {
        assert_relative_eq!(*a, *b, max_relative = 1e-4, epsilon = 1e-8);
    }
}

#[test]
fn test_layer_count_mismatch_is_rejected() {
    let survey = Survey::wenner(&[10.0, 20.0]).unwrap();
    let sim = Simulation1d::new(survey, DataType::ApparentResistivity, 3).unwrap();
    let model = LayeredModel::new(array![100.0, 10.0], array![20.0]).unwrap();
    assert!(sim.dpred(&model).is_err());
}
