//! Resistivity transform kernel for a layered half-space.
//!
//! The kernel `T(λ)` is built by the Pekeris downward recursion over the
//! layer stack, starting from the basement half-space:
//!
//! ```text
//! T_L     = ρ_L
//! T_i     = (T_{i+1} + ρ_i tanh(λ t_i)) / (1 + T_{i+1} tanh(λ t_i) / ρ_i)
//! ```
//!
//! `T(λ) = T_1(λ)` tends to ρ_1 as λ → ∞ and to ρ_L as λ → 0. The same sweep
//! accumulates the analytic sensitivities `∂T/∂ρ_i` and `∂T/∂t_i` by forward
//! propagation through the recursion; the basement carries no thickness, so
//! no sensitivity exists (or is indexed) for it.

use ndarray::Array1;

use crate::model::LayeredModel;

/// Kernel value with its analytic parameter sensitivities.
#[derive(Debug, Clone)]
pub struct KernelSensitivity {
    /// T(λ).
    pub value: f64,
    /// ∂T/∂ρ_i for each of the L layers.
    pub d_rho: Array1<f64>,
    /// ∂T/∂t_i for the top L-1 layers.
    pub d_thick: Array1<f64>,
}

/// Evaluate the resistivity transform `T(λ)`.
pub fn transform(model: &LayeredModel, lambda: f64) -> f64 {
    let rho = model.resistivities();
    let thick = model.thicknesses();
    let n = rho.len();

    let mut t = rho[n - 1];
    for i in (0..n - 1).rev() {
        let tau = (lambda * thick[i]).tanh();
        let den = 1.0 + t * tau / rho[i];
        t = (t + rho[i] * tau) / den;
    }
    t
}

/// Evaluate `T(λ)` together with `∂T/∂ρ` and `∂T/∂t`.
///
/// Each layer's parameters enter the recursion exactly once, so one upward
/// sweep with chain-rule accumulation yields all sensitivities in O(L).
pub fn transform_with_sensitivities(model: &LayeredModel, lambda: f64) -> KernelSensitivity {
    let rho = model.resistivities();
    let thick = model.thicknesses();
    let n = rho.len();

    let mut d_rho = Array1::<f64>::zeros(n);
    let mut d_thick = Array1::<f64>::zeros(n - 1);

    let mut t = rho[n - 1];
    d_rho[n - 1] = 1.0;

    for i in (0..n - 1).rev() {
        let u = t;
        let tau = (lambda * thick[i]).tanh();
        let den = 1.0 + u * tau / rho[i];
        t = (u + rho[i] * tau) / den;

        // Chain deeper-layer sensitivities through ∂T_i/∂T_{i+1}; entries for
        // layer i and shallower are still zero, so scaling the whole arrays
        // is safe.
        let dt_du = (1.0 - t * tau / rho[i]) / den;
        d_rho.mapv_inplace(|v| v * dt_du);
        d_thick.mapv_inplace(|v| v * dt_du);

        d_rho[i] = (tau + t * u * tau / (rho[i] * rho[i])) / den;
        let sech2 = 1.0 - tau * tau;
        d_thick[i] = lambda * sech2 * (rho[i] - t * u / rho[i]) / den;
    }

    KernelSensitivity {
        value: t,
        d_rho,
        d_thick,
    }
}
