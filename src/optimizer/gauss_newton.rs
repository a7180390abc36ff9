//! Inexact Gauss-Newton outer step.
//!
//! One step: assemble the combined gradient and Gauss-Newton Hessian of
//! `Φ(m) = φ_d(m) + β φ_m(m)`, solve for a search direction with truncated
//! conjugate gradients, then pick a step length by backtracking line search
//! under the Armijo sufficient-decrease condition. An accepted step never
//! increases `Φ`.

use ndarray::Array1;

use crate::error::{Result, VesInvError};
use crate::objective::ObjectiveTerm;
use crate::optimizer::cg;

/// Configuration of the inexact Gauss-Newton step.
#[derive(Debug, Clone)]
pub struct InexactGaussNewton {
    /// Inner CG iteration budget. Default: 30
    pub max_cg_iters: usize,

    /// Relative-residual tolerance for the CG solve. Default: 1e-3
    pub cg_tol: f64,

    /// Armijo sufficient-decrease constant. Default: 1e-4
    pub armijo_c: f64,

    /// Step-length shrink factor for backtracking. Default: 0.5
    pub backtrack_factor: f64,

    /// Smallest step length tried before the line search gives up.
    /// Default: 2^-20
    pub min_step: f64,
}

impl Default for InexactGaussNewton {
    fn default() -> Self {
        Self {
            max_cg_iters: 30,
            cg_tol: 1e-3,
            armijo_c: 1e-4,
            backtrack_factor: 0.5,
            min_step: 2f64.powi(-20),
        }
    }
}

/// An accepted Gauss-Newton step.
#[derive(Debug, Clone)]
pub struct GnStep {
    /// Updated model vector `m + t p`.
    pub model: Array1<f64>,
    /// Data misfit at the updated model.
    pub phi_d: f64,
    /// Regularization value at the updated model.
    pub phi_m: f64,
    /// Combined objective `φ_d + β φ_m` at the updated model.
    pub phi: f64,
    /// Accepted step length `t`.
    pub step_length: f64,
    /// Inner CG iterations used for the direction.
    pub cg_iterations: usize,
}

impl InexactGaussNewton {
    pub fn new(max_cg_iters: usize) -> Self {
        Self {
            max_cg_iters,
            ..Self::default()
        }
    }

    /// Take one damped Gauss-Newton step from `m`.
    ///
    /// # Errors
    ///
    /// * `LineSearchFailure` if no step length down to `min_step` satisfies
    ///   sufficient decrease (recoverable by the caller).
    /// * `Numerical` if the objective cannot be evaluated at `m` itself.
    pub fn step(
        &self,
        misfit: &dyn ObjectiveTerm,
        reg: &dyn ObjectiveTerm,
        beta: f64,
        m: &Array1<f64>,
    ) -> Result<GnStep> {
        let de = misfit.evaluate(m)?;
        let re = reg.evaluate(m)?;

        let phi_0 = de.value + beta * re.value;
        let gradient = &de.gradient + &(beta * &re.gradient);
        let hessian = &de.hessian + &(beta * &re.hessian);

        let rhs = gradient.mapv(|g| -g);
        let cg_solution = cg::solve(&hessian, &rhs, self.max_cg_iters, self.cg_tol);
        let mut direction = cg_solution.direction;

        // The CG direction is a descent direction for SPD systems; fall back
        // to steepest descent if rounding broke that.
        let mut slope = gradient.dot(&direction);
        if slope >= 0.0 || !slope.is_finite() {
            direction = rhs;
            slope = gradient.dot(&direction);
        }
        if slope >= 0.0 {
            return Err(VesInvError::LineSearchFailure(
                "no descent direction at the current model (gradient is zero)".to_string(),
            ));
        }

        // Backtracking line search with Armijo sufficient decrease. A trial
        // objective that fails to evaluate (e.g. log-parameter overflow at a
        // long step) counts as insufficient decrease and is backtracked.
        let mut t = 1.0;
        while t >= self.min_step {
            let trial = m + &(t * &direction);
            if let Some((phi_d, phi_m)) = trial_values(misfit, reg, &trial) {
                let phi = phi_d + beta * phi_m;
                if phi.is_finite() && phi <= phi_0 + self.armijo_c * t * slope {
                    return Ok(GnStep {
                        model: trial,
                        phi_d,
                        phi_m,
                        phi,
                        step_length: t,
                        cg_iterations: cg_solution.iterations,
                    });
                }
            }
            t *= self.backtrack_factor;
        }

        Err(VesInvError::LineSearchFailure(format!(
            "no sufficient decrease for any step length down to {:.2e}",
            self.min_step
        )))
    }
}

/// Evaluate the trial objective, mapping evaluation failures to `None` so the
/// line search can back off instead of aborting.
fn trial_values(
    misfit: &dyn ObjectiveTerm,
    reg: &dyn ObjectiveTerm,
    trial: &Array1<f64>,
) -> Option<(f64, f64)> {
    let phi_d = misfit.value(trial).ok()?;
    let phi_m = reg.value(trial).ok()?;
    Some((phi_d, phi_m))
}
