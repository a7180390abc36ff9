//! Synthetic data generation for testing and survey design.
//!
//! Mirrors the usual sounding workflow: predict clean data from a known
//! model, assign relative uncertainties, and optionally contaminate the data
//! with Gaussian noise scaled by those uncertainties.

use ndarray::Array1;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{Result, VesInvError};
use crate::forward::Simulation1d;
use crate::model::LayeredModel;

/// Assign per-datum uncertainties as a fraction of the datum magnitude.
///
/// A tiny absolute floor keeps uncertainties strictly positive when a datum
/// is exactly zero (possible for voltage data with sign-changing geometry).
pub fn assign_uncertainties(d: &Array1<f64>, relative_error: f64) -> Result<Array1<f64>> {
    if !relative_error.is_finite() || relative_error <= 0.0 {
        return Err(VesInvError::Configuration(format!(
            "relative_error must be positive, got {}",
            relative_error
        )));
    }
    let max_abs = d.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    if max_abs == 0.0 {
        return Err(VesInvError::Configuration(
            "cannot assign relative uncertainties to an all-zero data vector".to_string(),
        ));
    }
    let floor = 1e-12 * max_abs;
    Ok(d.mapv(|v| (relative_error * v.abs()).max(floor)))
}

/// Generate a noisy synthetic dataset from a known model.
///
/// Returns `(d_obs, uncertainties)` where the noise on each datum is drawn
/// from `N(0, σ_i)` with `σ_i = relative_error · |d_clean_i|`.
pub fn make_synthetic_data<R: Rng + ?Sized>(
    simulation: &Simulation1d,
    model: &LayeredModel,
    relative_error: f64,
    rng: &mut R,
) -> Result<(Array1<f64>, Array1<f64>)> {
    let d_clean = simulation.dpred(model)?;
    let sigma = assign_uncertainties(&d_clean, relative_error)?;

    let standard_normal = Normal::new(0.0, 1.0).expect("unit normal is well-formed");
    let mut d_obs = d_clean;
    for (di, si) in d_obs.iter_mut().zip(sigma.iter()) {
        *di += si * standard_normal.sample(rng);
    }
    Ok((d_obs, sigma))
}
