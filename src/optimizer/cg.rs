//! Truncated conjugate-gradient solver for the Gauss-Newton system.
//!
//! Solves `H p = b` approximately, where `H` is the (positive-semidefinite
//! plus regularized) Gauss-Newton Hessian. The solve is truncated by an
//! inner-iteration budget; that truncation is what makes the outer method an
//! *inexact* Gauss-Newton.

use ndarray::{Array1, Array2};

/// Result of a truncated CG solve.
#[derive(Debug, Clone)]
pub struct CgSolution {
    /// Approximate solution of `H p = b`.
    pub direction: Array1<f64>,
    /// Inner iterations performed.
    pub iterations: usize,
    /// Final residual norm relative to `‖b‖`.
    pub relative_residual: f64,
}

/// Solve `H p = b` by conjugate gradients, truncated at `max_iters` or at a
/// relative residual of `tol`.
///
/// Starting from `p = 0` the first iterate is the steepest-descent direction,
/// so any truncation point still yields a descent direction for the objective
/// whose gradient is `-b`. A non-positive-curvature direction (possible only
/// through rounding, since `H` is assembled PSD) truncates the solve; if that
/// happens on the first iteration the raw right-hand side is returned.
pub fn solve(h: &Array2<f64>, b: &Array1<f64>, max_iters: usize, tol: f64) -> CgSolution {
    let n = b.len();
    debug_assert_eq!(h.nrows(), n);
    debug_assert_eq!(h.ncols(), n);

    let b_norm = b.dot(b).sqrt();
    let mut p = Array1::<f64>::zeros(n);
    if b_norm == 0.0 {
        return CgSolution {
            direction: p,
            iterations: 0,
            relative_residual: 0.0,
        };
    }

    let mut r = b.clone();
    let mut d = b.clone();
    let mut rs = r.dot(&r);

    let mut iterations = 0;
    for i in 0..max_iters {
        let hd = h.dot(&d);
        let curvature = d.dot(&hd);
        if curvature <= 0.0 || !curvature.is_finite() {
            if i == 0 {
                p = b.clone();
            }
            break;
        }

        let alpha = rs / curvature;
        p.scaled_add(alpha, &d);
        r.scaled_add(-alpha, &hd);
        iterations = i + 1;

        let rs_new = r.dot(&r);
        if rs_new.sqrt() <= tol * b_norm {
            rs = rs_new;
            break;
        }
        d = &r + &(d * (rs_new / rs));
        rs = rs_new;
    }

    CgSolution {
        relative_residual: rs.sqrt() / b_norm,
        direction: p,
        iterations,
    }
}
