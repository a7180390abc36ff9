//! Composite-objective seam between the inversion terms and the optimizer.
//!
//! The combined objective `Φ(m) = φ_d(m) + β φ_m(m)` is a weighted sum of
//! terms that each expose a value, gradient, and (Gauss-Newton) Hessian over
//! the shared model vector. The optimizer only sees this trait.

use ndarray::{Array1, Array2};

use crate::error::Result;

/// Value, gradient, and Hessian of one objective term at a model vector.
#[derive(Debug, Clone)]
pub struct TermEval {
    pub value: f64,
    pub gradient: Array1<f64>,
    pub hessian: Array2<f64>,
}

/// One additive term of the inversion objective.
pub trait ObjectiveTerm {
    /// Number of model parameters the term is defined over.
    fn n_params(&self) -> usize;

    /// Evaluate value, gradient, and Hessian in one pass.
    fn evaluate(&self, m: &Array1<f64>) -> Result<TermEval>;

    /// Evaluate only the value. Used by the line search, where derivatives
    /// are not needed; implementors should override this when the value is
    /// much cheaper than a full evaluation.
    fn value(&self, m: &Array1<f64>) -> Result<f64> {
        Ok(self.evaluate(m)?.value)
    }
}
