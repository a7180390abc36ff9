//! Digital linear filter for the J0 Hankel transform.
//!
//! Surface potentials over a layered half-space require integrals of the form
//! `∫ f(λ) J0(λr) dλ` where `f` is the (anomalous part of the) resistivity
//! transform kernel. On log-spaced abscissae this becomes a discrete
//! convolution with a fixed set of filter weights.
//!
//! The weights are designed once at startup by least-squares collocation on
//! the analytic transform pair `∫ exp(-cλ) J0(λr) dλ = 1/sqrt(r² + c²)`.
//! The layered-earth kernel anomaly expands into a series of decaying
//! exponentials in λ (image series), so the design basis matches exactly the
//! class of functions the filter is applied to. The resulting table is a
//! process-wide immutable lookup, never mutated after initialization.

use std::sync::OnceLock;

use ndarray::{Array1, Array2};

/// Number of filter abscissae.
const FILTER_LENGTH: usize = 61;

/// Log-spacing between abscissae.
const FILTER_SPACING: f64 = 0.25;

/// Number of collocation targets used in the weight design.
const DESIGN_POINTS: usize = 121;

/// Decay-constant range (log10) covered by the collocation targets.
const DESIGN_LOG10_MIN: f64 = -3.0;
const DESIGN_LOG10_MAX: f64 = 3.0;

/// A J0 Hankel-transform digital filter: `∫ f(λ) J0(λr) dλ ≈ (1/r) Σ_j w_j f(b_j / r)`.
#[derive(Debug, Clone)]
pub struct HankelFilter {
    base: Vec<f64>,
    weights: Vec<f64>,
}

static J0_FILTER: OnceLock<HankelFilter> = OnceLock::new();

impl HankelFilter {
    /// The process-wide J0 filter table, designed on first use.
    pub fn j0() -> &'static HankelFilter {
        J0_FILTER.get_or_init(HankelFilter::design_j0)
    }

    /// Base abscissae `b_j`; the evaluation points for argument `r` are `b_j / r`.
    pub fn base(&self) -> &[f64] {
        &self.base
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    /// Evaluate `∫ f(λ) J0(λr) dλ` for a kernel sampled at the filter nodes.
    pub fn convolve<F>(&self, r: f64, f: F) -> f64
    where
        F: Fn(f64) -> f64,
    {
        debug_assert!(r > 0.0 && r.is_finite());
        let mut acc = 0.0;
        for (b, w) in self.base.iter().zip(self.weights.iter()) {
            acc += w * f(b / r);
        }
        acc / r
    }

    /// Design the J0 filter weights by collocation on exponential kernels.
    fn design_j0() -> HankelFilter {
        let half = (FILTER_LENGTH as f64 - 1.0) / 2.0;
        let base: Vec<f64> = (0..FILTER_LENGTH)
            .map(|j| (FILTER_SPACING * (j as f64 - half)).exp())
            .collect();

        // Collocation matrix: rows are decay constants c_k, columns are
        // exp(-c_k * b_j); targets are the exact transforms at r = 1.
        let mut a = Array2::<f64>::zeros((DESIGN_POINTS, FILTER_LENGTH));
        let mut y = Array1::<f64>::zeros(DESIGN_POINTS);
        for k in 0..DESIGN_POINTS {
            let log10_c = DESIGN_LOG10_MIN
                + (DESIGN_LOG10_MAX - DESIGN_LOG10_MIN) * (k as f64)
                    / (DESIGN_POINTS as f64 - 1.0);
            let c = 10f64.powf(log10_c);
            for j in 0..FILTER_LENGTH {
                a[[k, j]] = (-c * base[j]).exp();
            }
            y[k] = 1.0 / (1.0 + c * c).sqrt();
        }

        // Normal equations with a small ridge; the ridge pins weights that no
        // collocation row constrains to zero instead of leaving them free.
        let at = a.t();
        let g = at.dot(&a);
        let rhs = at.dot(&y);

        let max_diag = (0..FILTER_LENGTH)
            .map(|i| g[[i, i]])
            .fold(0.0f64, f64::max);
        let mut mu = 1e-11 * max_diag;

        // Retry with a stronger ridge if the factorization loses positive
        // definiteness to rounding.
        let weights = loop {
            let mut gm = g.clone();
            for i in 0..FILTER_LENGTH {
                gm[[i, i]] += mu;
            }
            match solve_spd(&gm, &rhs) {
                Some(w) => break w,
                None => {
                    mu *= 100.0;
                    assert!(
                        mu < max_diag,
                        "Hankel filter design failed: collocation system is degenerate"
                    );
                }
            }
        };

        HankelFilter {
            base,
            weights: weights.to_vec(),
        }
    }
}

/// Solve a symmetric positive-definite system by Cholesky factorization.
///
/// Returns `None` if a non-positive pivot is encountered.
fn solve_spd(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    debug_assert_eq!(a.ncols(), n);
    debug_assert_eq!(b.len(), n);

    // Lower-triangular factor, built in place.
    let mut l = Array2::<f64>::zeros((n, n));
    for k in 0..n {
        let mut akk = a[[k, k]];
        for j in 0..k {
            akk -= l[[k, j]] * l[[k, j]];
        }
        if akk <= 0.0 || !akk.is_finite() {
            return None;
        }
        let lkk = akk.sqrt();
        l[[k, k]] = lkk;
        for i in (k + 1)..n {
            let mut v = a[[i, k]];
            for j in 0..k {
                v -= l[[i, j]] * l[[k, j]];
            }
            l[[i, k]] = v / lkk;
        }
    }

    // Forward substitution: L y = b.
    let mut y = b.clone();
    for i in 0..n {
        for j in 0..i {
            let yj = y[j];
            y[i] -= l[[i, j]] * yj;
        }
        y[i] /= l[[i, i]];
    }

    // Backward substitution: L^T x = y.
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut v = y[i];
        for j in (i + 1)..n {
            v -= l[[j, i]] * x[j];
        }
        x[i] = v / l[[i, i]];
    }

    Some(x)
}
