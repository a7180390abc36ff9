//! The inversion controller: outer-iteration orchestration, beta scheduling,
//! and termination.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VesInvError};
use crate::forward::Simulation1d;
use crate::inversion::InversionConfig;
use crate::misfit::DataMisfit;
use crate::model::LayeredModel;
use crate::objective::ObjectiveTerm;
use crate::optimizer::InexactGaussNewton;
use crate::regularization::Regularization;
use crate::survey::Survey;
use crate::transform::LogMap;

/// Why the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationStatus {
    /// The target misfit `φ_d ≤ χ · N_d` was reached.
    Converged,
    /// The outer-iteration budget ran out before reaching the target.
    MaxIterations,
    /// The line search failed twice in a row even after reducing beta.
    LineSearchFailure,
    /// A forward evaluation failed mid-run; the last valid model is returned.
    NumericalFailure,
}

impl TerminationStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, TerminationStatus::Converged)
    }
}

/// Snapshot recorded after each outer iteration, for inspection and plotting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: usize,
    pub beta: f64,
    pub phi_d: f64,
    pub phi_m: f64,
    pub model: Array1<f64>,
}

/// Result of an inversion run.
///
/// Every termination path yields a usable model; the status distinguishes
/// "stopped early but usable" from "unrecoverable". Beta is a run-internal
/// trade-off and appears only in the trace.
#[derive(Debug, Clone)]
pub struct InversionOutcome {
    /// Recovered model in physical units.
    pub model: LayeredModel,
    /// Recovered model in optimizer (log) space.
    pub model_vector: Array1<f64>,
    pub status: TerminationStatus,
    /// Outer iterations consumed.
    pub iterations: usize,
    /// Data misfit at the returned model.
    pub phi_d: f64,
    pub trace: Vec<IterationRecord>,
}

impl InversionOutcome {
    pub fn is_converged(&self) -> bool {
        self.status.is_converged()
    }

    /// Serialize the per-iteration trace to JSON.
    pub fn trace_to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.trace)?)
    }
}

/// Orchestrates the regularized Gauss-Newton inversion.
#[derive(Debug, Clone)]
pub struct Inversion {
    config: InversionConfig,
    mapping: LogMap,
    misfit: DataMisfit,
    reg: Regularization,
    optimizer: InexactGaussNewton,
    reference_set: bool,
}

impl Inversion {
    /// Wire up the inversion from survey, observed data, and uncertainties.
    ///
    /// All configuration and uncertainty validation happens here, before any
    /// iteration runs; a malformed run never partially executes.
    pub fn new(
        config: InversionConfig,
        survey: Survey,
        d_obs: Array1<f64>,
        uncertainties: Array1<f64>,
        n_layers: usize,
    ) -> Result<Self> {
        config.validate()?;
        let simulation = Simulation1d::new(survey, config.data_type, n_layers)?;
        let mapping = LogMap::new(n_layers)?;
        let misfit = DataMisfit::new(simulation, mapping, d_obs, uncertainties)?;
        let reg = Regularization::layered(
            n_layers,
            config.alpha_s_rho,
            config.alpha_x_rho,
            config.alpha_s_t,
            config.alpha_x_t,
        )?;
        let optimizer = InexactGaussNewton::new(config.max_cg_iters);
        Ok(Self {
            config,
            mapping,
            misfit,
            reg,
            optimizer,
            reference_set: false,
        })
    }

    pub fn config(&self) -> &InversionConfig {
        &self.config
    }

    pub fn misfit(&self) -> &DataMisfit {
        &self.misfit
    }

    /// Use an explicit reference model instead of the starting model.
    pub fn set_reference_model(&mut self, m_ref: &Array1<f64>) -> Result<()> {
        self.reg.set_reference(m_ref)?;
        self.reference_set = true;
        Ok(())
    }

    /// Target data misfit `χ · N_d`.
    pub fn target_misfit(&self) -> f64 {
        self.config.chi_factor * self.misfit.n_data() as f64
    }

    /// Run the inversion from a starting model vector (log space).
    ///
    /// Returns `Ok` for every termination status; `Err` only for a malformed
    /// starting model or a failure before the first iteration.
    pub fn run(&mut self, m0: Array1<f64>) -> Result<InversionOutcome> {
        if m0.len() != self.mapping.n_params() {
            return Err(VesInvError::DimensionMismatch(format!(
                "expected starting model of length {}, got {}",
                self.mapping.n_params(),
                m0.len()
            )));
        }
        if !self.reference_set {
            self.reg.set_reference(&m0)?;
        }

        let target = self.target_misfit();
        let mut m = m0;
        let mut phi_d = self.misfit.value(&m)?;
        let mut trace = Vec::new();

        // Stop before the first iteration if the start already fits the data
        // to within its assigned noise level.
        if phi_d <= target {
            let model = self.mapping.apply(&m)?;
            return Ok(InversionOutcome {
                model,
                model_vector: m,
                status: TerminationStatus::Converged,
                iterations: 0,
                phi_d,
                trace,
            });
        }

        let mut beta = self.estimate_beta0(&m)?;
        let mut status = TerminationStatus::MaxIterations;
        let mut iterations = 0;
        let mut cooled_after_failure = false;

        for k in 1..=self.config.max_outer_iters {
            match self.optimizer.step(&self.misfit, &self.reg, beta, &m) {
                Ok(step) => {
                    m = step.model;
                    phi_d = step.phi_d;
                    iterations = k;
                    cooled_after_failure = false;
                    trace.push(IterationRecord {
                        iteration: k,
                        beta,
                        phi_d: step.phi_d,
                        phi_m: step.phi_m,
                        model: m.clone(),
                    });
                    if phi_d <= target {
                        status = TerminationStatus::Converged;
                        break;
                    }
                    if k % self.config.cooling_rate == 0 {
                        beta /= self.config.cooling_factor;
                    }
                }
                Err(VesInvError::LineSearchFailure(_)) => {
                    iterations = k;
                    if cooled_after_failure {
                        status = TerminationStatus::LineSearchFailure;
                        break;
                    }
                    // Recoverable: relax the regularization once and retry.
                    cooled_after_failure = true;
                    beta /= self.config.cooling_factor;
                }
                Err(VesInvError::Numerical(_)) => {
                    iterations = k;
                    status = TerminationStatus::NumericalFailure;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        let model = self.mapping.apply(&m)?;
        Ok(InversionOutcome {
            model,
            model_vector: m,
            status,
            iterations,
            phi_d,
            trace,
        })
    }

    /// Estimate the initial beta from the ratio of the largest eigenvalues of
    /// the misfit and regularization Hessians, scaled by `beta0_ratio`.
    fn estimate_beta0(&self, m: &Array1<f64>) -> Result<f64> {
        let de = self.misfit.evaluate(m)?;
        let re = self.reg.evaluate(m)?;

        let mut rng = StdRng::seed_from_u64(0);
        let lam_d = max_eigenvalue(&de.hessian, 50, &mut rng);
        let lam_m = max_eigenvalue(&re.hessian, 50, &mut rng);

        let beta = self.config.beta0_ratio * lam_d / lam_m;
        if !beta.is_finite() || beta <= 0.0 {
            return Err(VesInvError::Numerical(format!(
                "initial beta estimate is {} (eigenvalues {:.3e} / {:.3e})",
                beta, lam_d, lam_m
            )));
        }
        Ok(beta)
    }
}

/// Largest-eigenvalue estimate of a symmetric PSD matrix by power iteration.
fn max_eigenvalue<R: Rng + ?Sized>(h: &Array2<f64>, iters: usize, rng: &mut R) -> f64 {
    let n = h.nrows();
    let mut x = Array1::from_shape_fn(n, |_| rng.gen_range(0.1..1.0f64));
    let norm = x.dot(&x).sqrt();
    x.mapv_inplace(|v| v / norm);

    for _ in 0..iters {
        let y = h.dot(&x);
        let norm = y.dot(&y).sqrt();
        if norm == 0.0 || !norm.is_finite() {
            return 0.0;
        }
        x = y / norm;
    }
    x.dot(&h.dot(&x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_max_eigenvalue_diagonal() {
        let h = array![[3.0, 0.0], [0.0, 1.0]];
        let mut rng = StdRng::seed_from_u64(7);
        let lam = max_eigenvalue(&h, 100, &mut rng);
        assert_relative_eq!(lam, 3.0, max_relative = 1e-6);
    }

    #[test]
    fn test_max_eigenvalue_zero_matrix() {
        let h = Array2::zeros((3, 3));
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(max_eigenvalue(&h, 10, &mut rng), 0.0);
    }

    #[test]
    fn test_status_serialization_names() {
        let json = serde_json::to_string(&TerminationStatus::NumericalFailure).unwrap();
        assert_eq!(json, "\"numerical_failure\"");
        let json = serde_json::to_string(&TerminationStatus::Converged).unwrap();
        assert_eq!(json, "\"converged\"");
    }
}
