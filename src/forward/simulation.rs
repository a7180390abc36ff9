//! 1D DC resistivity forward simulation.
//!
//! Maps a layered model to predicted data for a fixed survey. Each datum is
//! the superposition of four point-source surface potentials; the
//! homogeneous part of the kernel is handled analytically, so only the
//! anomalous kernel `T(λ) - ρ₁` goes through the Hankel filter and a
//! homogeneous model is reproduced exactly.

use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{Result, VesInvError};
use crate::forward::filter::HankelFilter;
use crate::forward::kernel;
use crate::model::LayeredModel;
use crate::survey::{ElectrodeConfiguration, Survey};

/// Unit convention of predicted data (and therefore of residuals).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Potential difference in volts for unit current.
    Voltage,
    /// Apparent resistivity in Ohm-metres.
    #[default]
    ApparentResistivity,
}

/// Forward operator for a fixed survey and layer count.
#[derive(Debug, Clone)]
pub struct Simulation1d {
    survey: Survey,
    data_type: DataType,
    n_layers: usize,
}

impl Simulation1d {
    pub fn new(survey: Survey, data_type: DataType, n_layers: usize) -> Result<Self> {
        if n_layers == 0 {
            return Err(VesInvError::Configuration(
                "simulation requires at least one layer".to_string(),
            ));
        }
        Ok(Self {
            survey,
            data_type,
            n_layers,
        })
    }

    pub fn survey(&self) -> &Survey {
        &self.survey
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn n_layers(&self) -> usize {
        self.n_layers
    }

    pub fn n_data(&self) -> usize {
        self.survey.n_data()
    }

    /// Number of physical parameters: `2L - 1`.
    pub fn n_params(&self) -> usize {
        2 * self.n_layers - 1
    }

    fn check_model(&self, model: &LayeredModel) -> Result<()> {
        if model.n_layers() != self.n_layers {
            return Err(VesInvError::Configuration(format!(
                "simulation expects {} layers, model has {}",
                self.n_layers,
                model.n_layers()
            )));
        }
        Ok(())
    }

    /// Predict the data vector for a layered model.
    ///
    /// Deterministic and side-effect free; identical inputs always produce
    /// identical outputs.
    pub fn dpred(&self, model: &LayeredModel) -> Result<Array1<f64>> {
        self.check_model(model)?;
        let filter = HankelFilter::j0();

        let data: Vec<f64> = self
            .survey
            .flat_geometry()
            .par_iter()
            .map(|config| predict_datum(config, model, self.data_type, filter))
            .collect();

        for (i, &d) in data.iter().enumerate() {
            if !d.is_finite() {
                return Err(VesInvError::Numerical(format!(
                    "predicted datum {} is non-finite",
                    i
                )));
            }
        }
        Ok(Array1::from_vec(data))
    }

    /// Analytic Jacobian with respect to the physical parameters
    /// `[ρ_1..ρ_L, t_1..t_{L-1}]`.
    ///
    /// The bottom layer is a half-space: it has no thickness parameter and no
    /// thickness column.
    pub fn jacobian(&self, model: &LayeredModel) -> Result<Array2<f64>> {
        Ok(self.dpred_with_jacobian(model)?.1)
    }

    /// Predicted data and Jacobian in a single pass over the survey.
    pub fn dpred_with_jacobian(&self, model: &LayeredModel) -> Result<(Array1<f64>, Array2<f64>)> {
        self.check_model(model)?;
        let filter = HankelFilter::j0();
        let n_params = self.n_params();

        let rows: Vec<(f64, Vec<f64>)> = self
            .survey
            .flat_geometry()
            .par_iter()
            .map(|config| predict_datum_with_row(config, model, self.data_type, filter))
            .collect();

        let mut data = Array1::zeros(rows.len());
        let mut jac = Array2::zeros((rows.len(), n_params));
        for (i, (d, row)) in rows.into_iter().enumerate() {
            if !d.is_finite() || row.iter().any(|v| !v.is_finite()) {
                return Err(VesInvError::Numerical(format!(
                    "predicted datum {} or its sensitivities are non-finite",
                    i
                )));
            }
            data[i] = d;
            for (k, v) in row.into_iter().enumerate() {
                jac[[i, k]] = v;
            }
        }
        Ok((data, jac))
    }
}

/// Surface potential of a unit point current source at separation `r`.
///
/// `ψ(r) = ρ₁/r + ∫ (T(λ) - ρ₁) J0(λr) dλ`, up to the `1/2π` factor applied
/// by the caller.
fn potential(model: &LayeredModel, r: f64, filter: &HankelFilter) -> f64 {
    let rho1 = model.resistivities()[0];
    let anomalous = filter.convolve(r, |lambda| kernel::transform(model, lambda) - rho1);
    rho1 / r + anomalous
}

fn predict_datum(
    config: &ElectrodeConfiguration,
    model: &LayeredModel,
    data_type: DataType,
    filter: &HankelFilter,
) -> f64 {
    let [am, an, bm, bn] = config.separations();
    let signed = [(am, 1.0), (an, -1.0), (bm, -1.0), (bn, 1.0)];

    let mut v = 0.0;
    for (r, sign) in signed {
        v += sign * potential(model, r, filter);
    }
    v /= 2.0 * PI;

    match data_type {
        DataType::Voltage => v,
        DataType::ApparentResistivity => 2.0 * PI * v / config.geometric_factor(),
    }
}

fn predict_datum_with_row(
    config: &ElectrodeConfiguration,
    model: &LayeredModel,
    data_type: DataType,
    filter: &HankelFilter,
) -> (f64, Vec<f64>) {
    let n_layers = model.n_layers();
    let n_params = 2 * n_layers - 1;
    let rho1 = model.resistivities()[0];

    let [am, an, bm, bn] = config.separations();
    let signed = [(am, 1.0), (an, -1.0), (bm, -1.0), (bn, 1.0)];

    let mut v = 0.0;
    let mut row = vec![0.0; n_params];
    for (r, sign) in signed {
        // Analytic half-space contribution and its ρ₁ sensitivity.
        v += sign * rho1 / r;
        row[0] += sign / r;

        // Anomalous kernel and sensitivities through the same filter. The
        // anomaly is T - ρ₁, so the ρ₁ column picks up an extra -1.
        for (b, w) in filter.base().iter().zip(filter.weights().iter()) {
            let lambda = b / r;
            let sens = kernel::transform_with_sensitivities(model, lambda);
            let scale = sign * w / r;
            v += scale * (sens.value - rho1);
            row[0] += scale * (sens.d_rho[0] - 1.0);
            for i in 1..n_layers {
                row[i] += scale * sens.d_rho[i];
            }
            for j in 0..n_layers - 1 {
                row[n_layers + j] += scale * sens.d_thick[j];
            }
        }
    }

    let two_pi = 2.0 * PI;
    v /= two_pi;
    for entry in row.iter_mut() {
        *entry /= two_pi;
    }

    match data_type {
        DataType::Voltage => (v, row),
        DataType::ApparentResistivity => {
            let g = config.geometric_factor();
            for entry in row.iter_mut() {
                *entry *= two_pi / g;
            }
            (two_pi * v / g, row)
        }
    }
}
