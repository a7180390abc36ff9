//! Finite-difference derivatives for validating analytic gradients and
//! Jacobians in tests.

use ndarray::{Array1, Array2};

use crate::error::Result;

/// Default relative step size for finite differences.
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Central-difference gradient of a scalar function.
///
/// # Arguments
///
/// * `f` - Function mapping a parameter vector to a scalar
/// * `x` - Point at which to evaluate the gradient
/// * `epsilon` - Step size (defaults to `DEFAULT_EPSILON`)
pub fn gradient<F>(f: F, x: &Array1<f64>, epsilon: Option<f64>) -> Result<Array1<f64>>
where
    F: Fn(&Array1<f64>) -> Result<f64>,
{
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let n = x.len();
    let mut grad = Array1::zeros(n);

    for i in 0..n {
        let h = eps * x[i].abs().max(1.0);
        let mut xp = x.clone();
        let mut xm = x.clone();
        xp[i] += h;
        xm[i] -= h;
        grad[i] = (f(&xp)? - f(&xm)?) / (2.0 * h);
    }
    Ok(grad)
}

/// Central-difference Jacobian of a vector function.
///
/// Returns an `n_out × n` matrix where row `k` holds the partial derivatives
/// of output `k` with respect to each parameter.
pub fn jacobian<F>(f: F, x: &Array1<f64>, epsilon: Option<f64>) -> Result<Array2<f64>>
where
    F: Fn(&Array1<f64>) -> Result<Array1<f64>>,
{
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let n = x.len();
    let f0 = f(x)?;
    let n_out = f0.len();
    let mut jac = Array2::zeros((n_out, n));

    for i in 0..n {
        let h = eps * x[i].abs().max(1.0);
        let mut xp = x.clone();
        let mut xm = x.clone();
        xp[i] += h;
        xm[i] -= h;
        let fp = f(&xp)?;
        let fm = f(&xm)?;
        for k in 0..n_out {
            jac[[k, i]] = (fp[k] - fm[k]) / (2.0 * h);
        }
    }
    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_gradient_of_quadratic() {
        let f = |x: &Array1<f64>| Ok(x[0] * x[0] + 3.0 * x[1]);
        let x = array![2.0, -1.0];
        let g = gradient(f, &x, None).unwrap();
        assert_relative_eq!(g[0], 4.0, max_relative = 1e-6);
        assert_relative_eq!(g[1], 3.0, max_relative = 1e-6);
    }

    #[test]
    fn test_jacobian_of_linear_map() {
        let f = |x: &Array1<f64>| Ok(array![2.0 * x[0] + x[1], -x[0] + 4.0 * x[1]]);
        let x = array![1.0, 2.0];
        let j = jacobian(f, &x, None).unwrap();
        assert_relative_eq!(j[[0, 0]], 2.0, max_relative = 1e-6);
        assert_relative_eq!(j[[0, 1]], 1.0, max_relative = 1e-6);
        assert_relative_eq!(j[[1, 0]], -1.0, max_relative = 1e-6);
        assert_relative_eq!(j[[1, 1]], 4.0, max_relative = 1e-6);
    }

    #[test]
    fn test_gradient_of_exponential() {
        let f = |x: &Array1<f64>| Ok(x[0].exp());
        let x = array![0.5];
        let g = gradient(f, &x, None).unwrap();
        assert_relative_eq!(g[0], 0.5f64.exp(), max_relative = 1e-6);
    }
}
