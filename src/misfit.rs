//! Weighted least-squares data misfit.
//!
//! `φ_d(m) = || W (d_pred(m) − d_obs) ||²` with `W = diag(1/σ)` fixed at
//! construction from the assigned data uncertainties. The gradient and the
//! Gauss-Newton Hessian `2 Jᵀ W² J` are chain-ruled through the log
//! parameter transform, so the misfit is a function of the optimizer-space
//! model vector.

use ndarray::{Array1, Array2};

use crate::error::{Result, VesInvError};
use crate::forward::Simulation1d;
use crate::objective::{ObjectiveTerm, TermEval};
use crate::transform::LogMap;

/// Data misfit term of the inversion objective.
#[derive(Debug, Clone)]
pub struct DataMisfit {
    simulation: Simulation1d,
    mapping: LogMap,
    d_obs: Array1<f64>,
    /// Diagonal of W, i.e. 1/σ per datum.
    weights: Array1<f64>,
}

impl DataMisfit {
    /// Create a data misfit, validating shapes and uncertainties.
    ///
    /// # Errors
    ///
    /// * `Configuration` if the mapping layer count disagrees with the
    ///   simulation.
    /// * `DimensionMismatch` if observed data or uncertainties do not match
    ///   the survey length.
    /// * `InvalidUncertainty` if any uncertainty is non-positive or
    ///   non-finite.
    pub fn new(
        simulation: Simulation1d,
        mapping: LogMap,
        d_obs: Array1<f64>,
        uncertainties: Array1<f64>,
    ) -> Result<Self> {
        if mapping.n_layers() != simulation.n_layers() {
            return Err(VesInvError::Configuration(format!(
                "mapping has {} layers but simulation has {}",
                mapping.n_layers(),
                simulation.n_layers()
            )));
        }
        let n = simulation.n_data();
        if d_obs.len() != n {
            return Err(VesInvError::DimensionMismatch(format!(
                "survey predicts {} data, observed vector has {}",
                n,
                d_obs.len()
            )));
        }
        if uncertainties.len() != n {
            return Err(VesInvError::DimensionMismatch(format!(
                "survey predicts {} data, uncertainty vector has {}",
                n,
                uncertainties.len()
            )));
        }
        for (i, &sigma) in uncertainties.iter().enumerate() {
            if !sigma.is_finite() || sigma <= 0.0 {
                return Err(VesInvError::InvalidUncertainty(format!(
                    "datum {} has sigma = {}",
                    i, sigma
                )));
            }
        }
        let weights = uncertainties.mapv(|s| 1.0 / s);
        Ok(Self {
            simulation,
            mapping,
            d_obs,
            weights,
        })
    }

    pub fn n_data(&self) -> usize {
        self.d_obs.len()
    }

    pub fn simulation(&self) -> &Simulation1d {
        &self.simulation
    }

    pub fn mapping(&self) -> &LogMap {
        &self.mapping
    }

    /// Predicted data at an optimizer-space model vector.
    pub fn dpred(&self, m: &Array1<f64>) -> Result<Array1<f64>> {
        let model = self.mapping.apply(m)?;
        self.simulation.dpred(&model)
    }

    /// Raw (unweighted) residual `d_pred(m) − d_obs`.
    pub fn residual(&self, m: &Array1<f64>) -> Result<Array1<f64>> {
        Ok(self.dpred(m)? - &self.d_obs)
    }
}

impl ObjectiveTerm for DataMisfit {
    fn n_params(&self) -> usize {
        self.mapping.n_params()
    }

    fn evaluate(&self, m: &Array1<f64>) -> Result<TermEval> {
        let model = self.mapping.apply(m)?;
        let (dpred, jac_phys) = self.simulation.dpred_with_jacobian(&model)?;

        // Chain rule through the exponential transform: the derivative is
        // diagonal and equals the transformed vector itself.
        let chain = self.mapping.deriv(m)?;
        let n_data = dpred.len();
        let n_params = self.n_params();
        let mut wj = Array2::<f64>::zeros((n_data, n_params));
        for i in 0..n_data {
            for k in 0..n_params {
                wj[[i, k]] = self.weights[i] * jac_phys[[i, k]] * chain[k];
            }
        }

        let wr = (&dpred - &self.d_obs) * &self.weights;
        let value = wr.iter().map(|r| r * r).sum();
        let gradient = 2.0 * wj.t().dot(&wr);
        let hessian = 2.0 * wj.t().dot(&wj);

        Ok(TermEval {
            value,
            gradient,
            hessian,
        })
    }

    fn value(&self, m: &Array1<f64>) -> Result<f64> {
        let r = self.residual(m)?;
        Ok(r.iter()
            .zip(self.weights.iter())
            .map(|(ri, wi)| (ri * wi) * (ri * wi))
            .sum())
    }
}
